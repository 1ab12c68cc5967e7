//! Payment processor abstraction layer.
//!
//! This module defines the [`PaymentProcessor`] trait which abstracts the
//! client-side confirmation handshake with the external payment processor.
//! The client never sees raw card data: the embedding shell's card element
//! produces a processor-issued payment token, and everything here works in
//! terms of that token and the backend-minted intent's client secret.
//!
//! [`checkout`] runs the whole membership-fee flow: mint intent, confirm
//! with the processor, record the settled payment on the backend. Zero-fee
//! memberships skip the processor entirely.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::backend::Backend;
use crate::backend::models::clubs::Club;
use crate::backend::models::payments::{FREE_PAYMENT, PaymentIntentRequest, PaymentRecord};
use crate::config::PaymentConfig;
use crate::errors::RequestError;
use crate::notify::Notifier;

pub mod dummy;
pub mod stripe;

/// Create a payment processor from configuration.
///
/// The single point where config becomes a processor instance; adding a
/// processor means adding a match arm here.
pub fn create_processor(config: &PaymentConfig) -> Arc<dyn PaymentProcessor> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProcessor::new(stripe_config.clone())),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProcessor::new(dummy_config.clone())),
    }
}

/// Result type for payment processor operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment processor API error: {0}")]
    ProviderApi(String),

    #[error(transparent)]
    Backend(#[from] RequestError),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),
}

/// Outcome of a confirmation handshake with the processor.
///
/// A decline is a normal outcome (the shell navigates to the payment-failed
/// view), not an error; errors mean the handshake itself could not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Succeeded {
        /// Processor transaction id, recorded on the backend
        transaction_id: String,
    },
    Declined {
        message: String,
    },
}

/// Abstract payment processor interface.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Confirm a backend-minted intent with a processor-issued payment
    /// token.
    async fn confirm_card_payment(&self, client_secret: &str, payment_token: &str) -> Result<Confirmation>;
}

/// Outcome of the full checkout flow, for the shell to navigate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Success { transaction_id: String },
    Failed { message: String },
}

/// Run the membership-fee checkout for a club.
///
/// A zero fee records a `FREE_PAYMENT` transaction straight away. Otherwise:
/// mint an intent on the backend, confirm it with the processor, and record
/// the settled payment. Failures are surfaced as notifications here (this is
/// a mutating action); the returned outcome drives navigation only.
#[instrument(skip_all, fields(club = %club.id, amount = club.membership_fee))]
pub async fn checkout(
    backend: &Backend,
    processor: &dyn PaymentProcessor,
    notifier: &Notifier,
    club: &Club,
    member_email: &str,
    payment_token: &str,
) -> Result<CheckoutOutcome> {
    let amount = club.membership_fee;

    if amount == 0.0 {
        let record = PaymentRecord {
            club_id: club.id.clone(),
            amount,
            transaction_id: FREE_PAYMENT.to_string(),
            email: member_email.to_string(),
        };
        if let Err(e) = backend.payments().record(&record).await {
            notifier.error("Payment could not be recorded");
            return Err(e.into());
        }
        notifier.success("Payment successful! (Free)");
        return Ok(CheckoutOutcome::Success {
            transaction_id: FREE_PAYMENT.to_string(),
        });
    }

    let intent = match backend
        .payments()
        .create_intent(&PaymentIntentRequest {
            amount,
            club_id: club.id.clone(),
        })
        .await
    {
        Ok(intent) => intent,
        Err(e) => {
            notifier.error("Payment could not be started");
            return Err(e.into());
        }
    };

    match processor.confirm_card_payment(&intent.client_secret, payment_token).await {
        Ok(Confirmation::Succeeded { transaction_id }) => {
            let record = PaymentRecord {
                club_id: club.id.clone(),
                amount,
                transaction_id: transaction_id.clone(),
                email: member_email.to_string(),
            };
            if let Err(e) = backend.payments().record(&record).await {
                // The charge went through; the record is what failed. Keep
                // the transaction id in the log for reconciliation.
                warn!(%transaction_id, error = %e, "payment settled but could not be recorded");
                notifier.error("Payment went through, but could not be recorded");
                return Err(e.into());
            }
            info!(%transaction_id, "payment successful");
            notifier.success("Payment successful!");
            Ok(CheckoutOutcome::Success { transaction_id })
        }
        Ok(Confirmation::Declined { message }) => {
            notifier.error(format!("Payment failed: {message}"));
            Ok(CheckoutOutcome::Failed { message })
        }
        Err(e) => {
            notifier.error("Payment failed");
            Err(e)
        }
    }
}
