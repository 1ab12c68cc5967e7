//! The backend REST boundary.
//!
//! Every data operation in the application is a thin HTTP call issued
//! through one of two clients: the public client (no credential) or the
//! secure client (attaches the session's bearer credential). Components
//! consume the typed resource wrappers here, never raw transport.

pub mod applications;
pub mod client;
pub mod clubs;
pub mod models;
pub mod payments;
pub mod reviews;
pub mod stats;
pub mod users;

use crate::backend::client::{CredentialRefresher, PublicClient, RequestCore, SecureClient};
use crate::config::BackendConfig;
use crate::session::SessionContext;

/// Handle to the backend API, cheap to clone.
#[derive(Clone)]
pub struct Backend {
    pub(crate) public: PublicClient,
    pub(crate) secure: SecureClient,
}

impl Backend {
    /// Build both clients over one transport. `refresher` enables
    /// transparent credential refresh on the secure client; pass `None` when
    /// the identity provider issues non-expiring credentials.
    pub fn new(config: &BackendConfig, ctx: SessionContext, refresher: Option<CredentialRefresher>) -> anyhow::Result<Self> {
        let core = RequestCore::new(config)?;
        Ok(Self {
            public: PublicClient::new(core.clone()),
            secure: SecureClient::new(core, ctx, refresher),
        })
    }

    pub fn users(&self) -> users::Users<'_> {
        users::Users { backend: self }
    }

    pub fn clubs(&self) -> clubs::Clubs<'_> {
        clubs::Clubs { backend: self }
    }

    pub fn applications(&self) -> applications::Applications<'_> {
        applications::Applications { backend: self }
    }

    pub fn reviews(&self) -> reviews::Reviews<'_> {
        reviews::Reviews { backend: self }
    }

    pub fn stats(&self) -> stats::Stats<'_> {
        stats::Stats { backend: self }
    }

    pub fn payments(&self) -> payments::Payments<'_> {
        payments::Payments { backend: self }
    }
}
