//! Dummy payment processor implementation.
//!
//! Approves every confirmation (or declines every one, when configured to)
//! without talking to anything. Development and tests only.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::config::DummyPaymentConfig;
use crate::payments::{Confirmation, PaymentProcessor, Result};

pub struct DummyProcessor {
    config: DummyPaymentConfig,
    counter: AtomicU64,
}

impl DummyProcessor {
    pub fn new(config: DummyPaymentConfig) -> Self {
        Self {
            config,
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaymentProcessor for DummyProcessor {
    async fn confirm_card_payment(&self, _client_secret: &str, _payment_token: &str) -> Result<Confirmation> {
        if let Some(message) = &self.config.decline_with {
            return Ok(Confirmation::Declined {
                message: message.clone(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let transaction_id = format!("dummy_txn_{n}");
        info!(%transaction_id, "dummy processor approved payment");
        Ok(Confirmation::Succeeded { transaction_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn approves_by_default_with_unique_ids() {
        let processor = DummyProcessor::new(DummyPaymentConfig::default());
        let first = processor.confirm_card_payment("pi_a_secret_b", "tok").await.unwrap();
        let second = processor.confirm_card_payment("pi_a_secret_b", "tok").await.unwrap();
        assert_ne!(first, second);
        assert!(matches!(first, Confirmation::Succeeded { .. }));
    }

    #[tokio::test]
    async fn declines_when_configured() {
        let processor = DummyProcessor::new(DummyPaymentConfig {
            decline_with: Some("no".to_string()),
        });
        let confirmation = processor.confirm_card_payment("pi_a_secret_b", "tok").await.unwrap();
        assert_eq!(
            confirmation,
            Confirmation::Declined {
                message: "no".to_string()
            }
        );
    }
}
