//! # clubsphere: Client Core for the ClubSphere Membership Platform
//!
//! `clubsphere` is the headless application core of the ClubSphere client:
//! members browse clubs, apply, pay membership fees, and write reviews; club
//! moderators manage clubs, applications, and reviews; admins manage users
//! and view analytics. Every data operation is a thin HTTP call to an
//! external backend API, authentication is delegated to an external identity
//! provider, and card payments are delegated to an external payment
//! processor. This crate owns the part with real invariants: the session /
//! role-based access-control layer that decides who can see what, and how
//! session state stays consistent across the app.
//!
//! ## Overview
//!
//! The crate is organized around four collaborating pieces:
//!
//! The **session layer** ([`session`]) holds the current principal, the
//! locally-cached profile projection, and the UI theme in an explicit,
//! injectable context owned by the application root. All mutations go
//! through [`session::SessionStore`], which delegates the actual
//! authentication work to the configured [`identity`] provider.
//!
//! The **request clients** ([`backend::client`]) are the only transport in
//! the application. The public client serves anonymous reads; the secure
//! client reads the session's bearer credential on every call (refreshing it
//! transparently near expiry) and still issues credential-less requests for
//! anonymous sessions - the backend, not the client, is the enforcement
//! point.
//!
//! The **access-control layer** ([`roles`], [`guards`], [`router`]) re-fetches
//! the backend user record per navigation, matches its closed role enum
//! exhaustively, and produces one of render / redirect / loading per
//! navigation. Unauthorized access redirects silently; a pending lookup
//! shows loading rather than flash-redirecting.
//!
//! The **external boundaries** ([`identity`], [`payments`], [`backend`])
//! are traits plus config-selected implementations (hosted HTTP or in-process
//! dummy), so the whole application assembles against fakes in tests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clubsphere::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     clubsphere::telemetry::init_telemetry()?;
//!
//!     let (app, mut notifications) = App::new(Config::default())?;
//!
//!     // Resolve the initial session check, then drive the app.
//!     app.session.restore_session(None).await;
//!     app.session.login_with_credentials("member@x.com", "hunter2").await?;
//!     let outcome = app.navigator.navigate("/dashboard/my-applications").await;
//!     println!("{outcome:?}");
//!
//!     for note in notifications.drain() {
//!         println!("[{:?}] {}", note.level, note.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod guards;
pub mod identity;
pub mod notify;
pub mod payments;
pub mod roles;
pub mod router;
pub mod session;
pub mod telemetry;
pub mod types;

use bon::Builder;
use std::sync::Arc;

pub use config::Config;
pub use errors::{Error, Result};

use crate::backend::Backend;
use crate::backend::client::CredentialRefresher;
use crate::backend::models::clubs::Club;
use crate::config::IdentityConfig;
use crate::notify::{NotificationQueue, Notifier};
use crate::payments::{CheckoutOutcome, PaymentProcessor};
use crate::roles::RoleResolver;
use crate::router::Navigator;
use crate::session::{SessionContext, SessionStore};

/// The application root: owns the session context and every boundary
/// collaborator, wired from one [`Config`].
///
/// Cheap to clone; clones share all underlying state. Tests that need a
/// custom collaborator (a stub provider, a declining processor) assemble one
/// via the builder instead of [`App::new`].
#[derive(Clone, Builder)]
pub struct App {
    pub config: Config,
    pub session: SessionStore,
    pub backend: Backend,
    pub navigator: Navigator,
    pub payments: Option<Arc<dyn PaymentProcessor>>,
    pub notifier: Notifier,
}

impl App {
    /// Assemble the application from configuration.
    ///
    /// Returns the app plus the notification queue the embedding shell
    /// drains for transient toasts.
    pub fn new(config: Config) -> anyhow::Result<(Self, NotificationQueue)> {
        let provider = identity::create_provider(&config.identity);

        // Only the hosted provider issues expiring credentials worth
        // refreshing mid-session.
        let refresher = match &config.identity {
            IdentityConfig::Http(http) => Some(CredentialRefresher {
                provider: provider.clone(),
                margin: http.refresh_margin,
            }),
            IdentityConfig::Dummy(_) => None,
        };

        let ctx = SessionContext::new(config.ui.theme);
        let backend = Backend::new(&config.backend, ctx.clone(), refresher)?;
        let (notifier, queue) = Notifier::channel();
        let session = SessionStore::new(ctx.clone(), provider, backend.clone(), notifier.clone());
        let navigator = Navigator::new(ctx, RoleResolver::new(backend.clone()));
        let processor = config.payment.as_ref().map(payments::create_processor);

        let app = App::builder()
            .config(config)
            .session(session)
            .backend(backend)
            .navigator(navigator)
            .maybe_payments(processor)
            .notifier(notifier)
            .build();
        Ok((app, queue))
    }

    /// Run the membership-fee checkout for a club with the configured
    /// processor.
    pub async fn checkout(&self, club: &Club, member_email: &str, payment_token: &str) -> payments::Result<CheckoutOutcome> {
        let processor = self.payments.as_deref().ok_or_else(|| {
            payments::PaymentError::InvalidData("no payment processor configured".to_string())
        })?;
        payments::checkout(&self.backend, processor, &self.notifier, club, member_email, payment_token).await
    }
}

/// Install the process-wide rustls crypto provider for tests.
///
/// Production installs this once in `main`; unit tests build TLS clients
/// without going through `main`, so this idempotent helper stands in. The
/// `install_default` error (provider already set) is intentionally ignored.
#[cfg(test)]
pub(crate) fn ensure_crypto_provider() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}
