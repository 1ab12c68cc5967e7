//! Stripe card-confirmation handshake.
//!
//! Confirms backend-minted payment intents against Stripe's REST API using
//! the publishable key. The intent id is recovered from the client secret
//! (`pi_..._secret_...`), which is how Stripe's own browser SDK addresses
//! the confirm endpoint from the client side.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::StripeConfig;
use crate::payments::{Confirmation, PaymentError, PaymentProcessor, Result};

pub struct StripeProcessor {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeProcessor {
    pub fn new(config: StripeConfig) -> Self {
        #[cfg(test)]
        crate::ensure_crypto_provider();
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn confirm_url(&self, intent_id: &str) -> std::result::Result<Url, PaymentError> {
        self.config
            .base_url
            .join(&format!("v1/payment_intents/{intent_id}/confirm"))
            .map_err(|e| PaymentError::InvalidData(format!("bad intent id: {e}")))
    }
}

/// The intent id is the part of the client secret before `_secret`.
fn intent_id_from_secret(client_secret: &str) -> std::result::Result<&str, PaymentError> {
    client_secret
        .split_once("_secret")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PaymentError::InvalidData("client secret is not in pi_..._secret_... form".to_string()))
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    status: String,
    last_payment_error: Option<IntentError>,
}

#[derive(Debug, Deserialize)]
struct IntentError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    /// "card_error" declines are outcomes; everything else is an API error
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    #[instrument(skip_all)]
    async fn confirm_card_payment(&self, client_secret: &str, payment_token: &str) -> Result<Confirmation> {
        let intent_id = intent_id_from_secret(client_secret)?;
        let url = self.confirm_url(intent_id)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.publishable_key)
            .form(&[("payment_method", payment_token), ("client_secret", client_secret)])
            .send()
            .await
            .map_err(|e| PaymentError::ProviderApi(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let intent: IntentResponse = response
                .json()
                .await
                .map_err(|e| PaymentError::ProviderApi(format!("malformed intent response: {e}")))?;
            debug!(intent = %intent.id, status = %intent.status, "intent confirmed");
            if intent.status == "succeeded" {
                Ok(Confirmation::Succeeded {
                    transaction_id: intent.id,
                })
            } else {
                let message = intent
                    .last_payment_error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| format!("payment not completed (status {})", intent.status));
                Ok(Confirmation::Declined { message })
            }
        } else {
            let body: ApiErrorBody = response.json().await.unwrap_or(ApiErrorBody { error: None });
            let detail = body.error.unwrap_or(ApiErrorDetail {
                message: None,
                kind: None,
            });
            let message = detail.message.unwrap_or_else(|| format!("processor returned {status}"));
            if detail.kind.as_deref() == Some("card_error") {
                Ok(Confirmation::Declined { message })
            } else {
                Err(PaymentError::ProviderApi(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn processor_for(server: &MockServer) -> StripeProcessor {
        StripeProcessor::new(StripeConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            publishable_key: "pk_test_123".to_string(),
        })
    }

    #[test]
    fn intent_id_extraction() {
        assert_eq!(intent_id_from_secret("pi_abc_secret_xyz").unwrap(), "pi_abc");
        assert!(intent_id_from_secret("garbage").is_err());
        assert!(intent_id_from_secret("_secret_xyz").is_err());
    }

    #[test_log::test(tokio::test)]
    async fn succeeded_intent_yields_the_transaction_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_abc/confirm"))
            .and(body_string_contains("payment_method=tok_visa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_abc",
                "status": "succeeded"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let processor = processor_for(&server);
        let confirmation = processor.confirm_card_payment("pi_abc_secret_xyz", "tok_visa").await.unwrap();
        assert_eq!(
            confirmation,
            Confirmation::Succeeded {
                transaction_id: "pi_abc".to_string()
            }
        );
    }

    #[test_log::test(tokio::test)]
    async fn card_error_is_a_decline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_abc/confirm"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "type": "card_error", "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let processor = processor_for(&server);
        let confirmation = processor.confirm_card_payment("pi_abc_secret_xyz", "tok_chargeDeclined").await.unwrap();
        assert_eq!(
            confirmation,
            Confirmation::Declined {
                message: "Your card was declined.".to_string()
            }
        );
    }

    #[test_log::test(tokio::test)]
    async fn api_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_abc/confirm"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "type": "invalid_request_error", "message": "Invalid API Key" }
            })))
            .mount(&server)
            .await;

        let processor = processor_for(&server);
        let err = processor.confirm_card_payment("pi_abc_secret_xyz", "tok_visa").await.unwrap_err();
        assert!(matches!(err, PaymentError::ProviderApi(_)));
    }
}
