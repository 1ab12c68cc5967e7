//! Hosted identity provider reached over HTTPS.
//!
//! The wire surface follows the hosted-identity REST convention the original
//! deployment used: account operations are POSTs to `accounts:<verb>`
//! endpoints keyed by a project API key, and credential refresh goes through
//! a separate token endpoint. Provider failures arrive as a JSON body with a
//! machine-readable message code, which is mapped onto [`AuthError`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::HttpIdentityConfig;
use crate::errors::AuthError;
use crate::identity::{Credential, IdentityProvider, ProfilePatch, ProviderProfile, Result};

pub struct HttpProvider {
    config: HttpIdentityConfig,
    http: reqwest::Client,
}

impl HttpProvider {
    pub fn new(config: HttpIdentityConfig) -> Self {
        #[cfg(test)]
        crate::ensure_crypto_provider();
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn accounts_url(&self, verb: &str) -> Url {
        let mut url = self.config.base_url.clone();
        url.set_path(&format!("/v1/accounts:{verb}"));
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        url
    }

    fn token_url(&self, verb: &str) -> Url {
        let mut url = self
            .config
            .token_base_url
            .clone()
            .unwrap_or_else(|| self.config.base_url.clone());
        url.set_path(&format!("/v1/token{verb}"));
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        url
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, url: Url, body: &B) -> Result<R> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<R>()
                .await
                .map_err(|e| AuthError::Provider {
                    message: format!("malformed provider response: {e}"),
                })
        } else {
            let body = response
                .json::<ProviderErrorBody>()
                .await
                .unwrap_or_default();
            Err(map_provider_error(status, body.error.message))
        }
    }
}

/// Map the provider's machine-readable message codes onto the auth taxonomy.
fn map_provider_error(status: StatusCode, message: String) -> AuthError {
    let code = message.split_whitespace().next().unwrap_or("");
    match code {
        "EMAIL_EXISTS" => AuthError::DuplicateAccount,
        "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_REFRESH_TOKEN" => {
            AuthError::InvalidCredentials
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword {
            reason: message
                .split_once(':')
                .map(|(_, reason)| reason.trim().to_string())
                .unwrap_or_else(|| "password is too weak".to_string()),
        },
        _ if message.is_empty() => AuthError::Provider {
            message: format!("identity provider returned {status}"),
        },
        _ => AuthError::Provider { message },
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: ProviderErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: Option<String>,
    /// Seconds until expiry, serialized as a decimal string
    expires_in: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl AccountResponse {
    fn into_profile(self) -> ProviderProfile {
        let expires_at = self
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        ProviderProfile {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.photo_url,
            credential: Credential::new(self.id_token, self.refresh_token, expires_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[async_trait]
impl IdentityProvider for HttpProvider {
    #[instrument(skip(self, password))]
    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderProfile> {
        let response: AccountResponse = self
            .post(
                self.accounts_url("signUp"),
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        debug!(uid = %response.local_id, "account created");
        Ok(response.into_profile())
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderProfile> {
        let response: AccountResponse = self
            .post(
                self.accounts_url("signInWithPassword"),
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(response.into_profile())
    }

    #[instrument(skip_all)]
    async fn sign_in_with_oauth(&self, assertion: &str) -> Result<ProviderProfile> {
        let response: AccountResponse = self
            .post(
                self.accounts_url("signInWithIdp"),
                &serde_json::json!({
                    "postBody": assertion,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(response.into_profile())
    }

    #[instrument(skip_all)]
    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential> {
        let response: TokenResponse = self
            .post(
                self.token_url(""),
                &serde_json::json!({
                    "grant_type": "refresh_token",
                    "refresh_token": refresh_token,
                }),
            )
            .await?;
        let expires_at = response
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Ok(Credential::new(
            response.id_token,
            response.refresh_token.or_else(|| Some(refresh_token.to_string())),
            expires_at,
        ))
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, credential: &Credential) -> Result<ProviderProfile> {
        let response: LookupResponse = self
            .post(
                self.accounts_url("lookup"),
                &serde_json::json!({ "idToken": credential.bearer() }),
            )
            .await?;
        let user = response.users.into_iter().next().ok_or_else(|| AuthError::Provider {
            message: "provider returned no account for this credential".to_string(),
        })?;
        Ok(ProviderProfile {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.photo_url,
            credential: credential.clone(),
        })
    }

    #[instrument(skip_all)]
    async fn update_profile(&self, credential: &Credential, patch: &ProfilePatch) -> Result<()> {
        let mut body = serde_json::json!({
            "idToken": credential.bearer(),
            "returnSecureToken": false,
        });
        if let Some(name) = &patch.display_name {
            body["displayName"] = serde_json::json!(name);
        }
        if let Some(url) = &patch.avatar_url {
            body["photoUrl"] = serde_json::json!(url);
        }
        let _: serde_json::Value = self.post(self.accounts_url("update"), &body).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                self.accounts_url("sendOobCode"),
                &serde_json::json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email,
                }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, credential: &Credential) -> Result<()> {
        let Some(refresh_token) = credential.refresh_token() else {
            // Nothing to revoke; the credential will simply age out.
            return Ok(());
        };
        let result: Result<serde_json::Value> = self
            .post(
                self.token_url(":revoke"),
                &serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "provider sign-out failed");
            return Err(e);
        }
        Ok(())
    }
}
