//! Aggregate statistics models.

use serde::Deserialize;

/// Headline numbers for the public home page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    #[serde(default)]
    pub total_clubs: u64,
    #[serde(default)]
    pub total_members: u64,
    #[serde(default)]
    pub total_reviews: u64,
}

/// Aggregates for the admin analytics dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_clubs: u64,
    #[serde(default)]
    pub total_applications: u64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub total_revenue: f64,
    /// Applications per status, as (status, count) pairs
    #[serde(default)]
    pub applications_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}
