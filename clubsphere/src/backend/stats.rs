//! Aggregate statistics endpoints.

use crate::backend::Backend;
use crate::backend::models::stats::{AnalyticsStats, HomeStats};
use crate::errors::RequestError;

pub struct Stats<'a> {
    pub(crate) backend: &'a Backend,
}

impl Stats<'_> {
    /// Headline numbers for the public home page.
    pub async fn home(&self) -> Result<HomeStats, RequestError> {
        self.backend.public.get_json("/home/stats", &[]).await
    }

    /// Admin analytics aggregates.
    pub async fn analytics(&self) -> Result<AnalyticsStats, RequestError> {
        self.backend.secure.get_json("/analytics/stats", &[]).await
    }
}
