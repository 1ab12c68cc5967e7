//! Common type definitions shared across the crate.
//!
//! Backend entity IDs are opaque strings minted by the backend (the client
//! never derives or parses them), so they are plain `String` aliases rather
//! than structured types.

use serde::{Deserialize, Serialize};

// Type aliases for backend-minted IDs
pub type ClubId = String;
pub type ApplicationId = String;
pub type ReviewId = String;
pub type UserRecordId = String;

/// UI theme. Local render-tree concern only; never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// The other theme. Used by the theme toggle.
    pub fn flipped(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}
