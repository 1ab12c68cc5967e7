//! Payment endpoints on the backend side of the boundary.
//!
//! The backend holds the processor's secret key and mints intents; the
//! client records settled payments back. Confirmation itself happens against
//! the processor (see the `payments` module at the crate root).

use crate::backend::Backend;
use crate::backend::models::payments::{PaymentIntent, PaymentIntentRequest, PaymentRecord};
use crate::errors::RequestError;

pub struct Payments<'a> {
    pub(crate) backend: &'a Backend,
}

impl Payments<'_> {
    /// Ask the backend to mint a payment intent with the processor.
    pub async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, RequestError> {
        self.backend.secure.post_json("/create-payment-intent", request).await
    }

    /// Record a settled payment.
    pub async fn record(&self, record: &PaymentRecord) -> Result<(), RequestError> {
        self.backend.secure.post_unit("/payments", record).await
    }
}
