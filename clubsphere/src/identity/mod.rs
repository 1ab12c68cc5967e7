//! Identity provider abstraction layer.
//!
//! This module defines the [`IdentityProvider`] trait which abstracts the
//! external identity provider the client delegates authentication to. The
//! client never implements authentication itself: it consumes sign-up,
//! sign-in, federated sign-in, profile update, password reset, and sign-out,
//! and receives an opaque time-limited credential in return.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::IdentityConfig;
use crate::errors::AuthError;

pub mod dummy;
pub mod http;

/// Create an identity provider from configuration.
///
/// This is the single point where config becomes a provider instance; adding
/// a provider kind means adding a match arm here.
pub fn create_provider(config: &IdentityConfig) -> Arc<dyn IdentityProvider> {
    match config {
        IdentityConfig::Http(http_config) => Arc::new(http::HttpProvider::new(http_config.clone())),
        IdentityConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::new(dummy_config.clone())),
    }
}

/// Result type for identity provider operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// The opaque, time-limited bearer token issued by the identity provider.
///
/// The client never inspects the token's contents; it only forwards it and
/// tracks the provider-reported expiry so the secure request client knows
/// when a refresh is due. `Debug` is redacted - credentials must never reach
/// logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: String, refresh_token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token,
            refresh_token,
            expires_at,
        }
    }

    /// The raw bearer token, for the `Authorization` header.
    pub fn bearer(&self) -> &str {
        &self.token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Whether the credential expires within `margin` from now. Credentials
    /// without a reported expiry are treated as fresh.
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let margin = chrono::Duration::from_std(margin).unwrap_or_else(|_| chrono::Duration::seconds(60));
                Utc::now() + margin >= expires_at
            }
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The profile the provider reports for an authenticated account.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Provider-assigned stable identifier
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub credential: Credential,
}

/// Fields a profile patch may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Abstract identity provider interface.
///
/// Every operation either returns a provider profile / unit or an
/// [`AuthError`] carrying the provider's human-readable message. Callers own
/// user-visible messaging.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a new account from email + password.
    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderProfile>;

    /// Sign in with email + password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderProfile>;

    /// Federated sign-in. `assertion` is the token the embedding shell
    /// obtained from the social provider's own flow.
    async fn sign_in_with_oauth(&self, assertion: &str) -> Result<ProviderProfile>;

    /// Exchange a refresh token for a fresh credential.
    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential>;

    /// Look up the profile behind a credential. Used by session restore.
    async fn fetch_profile(&self, credential: &Credential) -> Result<ProviderProfile>;

    /// Push profile field changes for the authenticated account.
    async fn update_profile(&self, credential: &Credential, patch: &ProfilePatch) -> Result<()>;

    /// Ask the provider to email a password-reset link.
    async fn send_password_reset(&self, email: &str) -> Result<()>;

    /// Invalidate the session on the provider side. Best effort: callers
    /// clear local state regardless of the outcome.
    async fn sign_out(&self, credential: &Credential) -> Result<()>;
}
