//! Backend user records and role types.

use serde::{Deserialize, Serialize};

use crate::types::UserRecordId;

/// The closed set of roles the backend stores per user.
///
/// Guards match on this exhaustively, so adding a role is a compile-time
/// visible change everywhere access decisions are made. Wire strings are the
/// exact lowercase values the backend stores; deserialization of anything
/// else fails rather than defaulting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Moderator,
    Admin,
}

/// A user record as the backend returns it. Server-owned: the client
/// re-fetches it per navigation and never caches it authoritatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserRecordId>,
    pub name: String,
    pub email: String,
    /// Avatar URL; the backend's field name predates the rename
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: Role,
    /// Email of the admin who deputized this moderator, when there is one
    #[serde(rename = "moderatorFor", default, skip_serializing_if = "Option::is_none")]
    pub moderator_for: Option<String>,
}

/// Payload for creating a user record (registration and social-login
/// ensure-exists).
#[derive(Debug, Clone, Serialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Admin action: change a user's role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Admin action: deputize a moderator under the acting admin.
#[derive(Debug, Clone, Serialize)]
pub struct ModeratorAssignment {
    #[serde(rename = "moderatorFor")]
    pub moderator_for: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_strings_are_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), r#""member""#);
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), r#""moderator""#);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
    }

    #[test]
    fn role_match_is_case_sensitive() {
        // "Admin" is not a valid wire value; only the exact lowercase string
        // deserializes.
        assert!(serde_json::from_str::<Role>(r#""Admin""#).is_err());
        assert_eq!(serde_json::from_str::<Role>(r#""admin""#).unwrap(), Role::Admin);
    }

    #[test]
    fn user_record_roundtrip() {
        let json = r#"{
            "_id": "665f1",
            "name": "Mod Erator",
            "email": "mod@x.com",
            "image": "https://img.example/mod.png",
            "role": "moderator",
            "moderatorFor": "admin@x.com"
        }"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.role, Role::Moderator);
        assert_eq!(record.moderator_for.as_deref(), Some("admin@x.com"));
        assert_eq!(record.avatar_url.as_deref(), Some("https://img.example/mod.png"));
    }

    #[test]
    fn moderator_for_defaults_to_absent() {
        let json = r#"{"name": "M", "email": "m@x.com", "role": "moderator"}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert!(record.moderator_for.is_none());
        assert!(record.id.is_none());
    }
}
