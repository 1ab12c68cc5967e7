//! Membership application models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, ClubId};

/// Lifecycle state of an application. Moderators move applications from
/// `Pending` to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A membership application as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: ApplicationId,
    pub club_id: ClubId,
    pub club_name: String,
    /// Applicant's email
    pub applicant: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub fees: f64,
    pub status: ApplicationStatus,
    /// Moderator feedback shown to the applicant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_date: Option<DateTime<Utc>>,
    /// Payment marker recorded when the membership fee was settled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<String>,
}

/// Payload for submitting an application after a successful payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCreate {
    pub club_id: ClubId,
    pub club_name: String,
    pub applicant: String,
    pub user_name: String,
    pub fees: f64,
    pub status: ApplicationStatus,
    pub payment: String,
}

/// Member edit of their own pending application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Moderator decision payload.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_strings() {
        assert_eq!(serde_json::to_string(&ApplicationStatus::Pending).unwrap(), r#""pending""#);
        assert!(serde_json::from_str::<ApplicationStatus>(r#""Approved""#).is_err());
    }

    #[test]
    fn application_deserializes_with_optional_fields_absent() {
        let json = r#"{
            "_id": "app1",
            "clubId": "club1",
            "clubName": "Chess Circle",
            "applicant": "member@x.com",
            "status": "pending"
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(app.feedback.is_none());
        assert_eq!(app.fees, 0.0);
    }
}
