//! Payment boundary models.
//!
//! The backend mints payment intents (it holds the processor's secret key);
//! the client only ever sees the intent's client secret and the processor's
//! confirmation result.

use serde::{Deserialize, Serialize};

use crate::types::ClubId;

/// Transaction id recorded for zero-fee memberships, which skip the
/// processor entirely.
pub const FREE_PAYMENT: &str = "FREE_PAYMENT";

/// Ask the backend to mint a payment intent with the processor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Membership fee in dollars
    pub amount: f64,
    pub club_id: ClubId,
}

/// The minted intent. The client secret is handed to the processor's
/// confirmation handshake and is never logged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

/// Record of a settled payment, written back to the backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub club_id: ClubId,
    pub amount: f64,
    pub transaction_id: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_camel_case() {
        let record = PaymentRecord {
            club_id: "club1".to_string(),
            amount: 25.0,
            transaction_id: FREE_PAYMENT.to_string(),
            email: "member@x.com".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["clubId"], "club1");
        assert_eq!(json["transactionId"], "FREE_PAYMENT");
    }
}
