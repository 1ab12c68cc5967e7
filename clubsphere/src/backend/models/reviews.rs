//! Club review models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ClubId, ReviewId};

/// A review as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub club_id: ClubId,
    #[serde(default)]
    pub club_name: String,
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar_url: Option<String>,
    /// 1-5 stars
    pub rating_point: u8,
    pub review_comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating or editing a review (member action).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpsert {
    pub club_id: ClubId,
    pub club_name: String,
    pub user_email: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_avatar_url: Option<String>,
    pub rating_point: u8,
    pub review_comment: String,
}
