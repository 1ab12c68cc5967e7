//! Session state and the operations that mutate it.
//!
//! [`SessionContext`] is the single source of truth for "who is using the
//! app right now" and "what does the UI look like". It is an explicit,
//! injectable handle owned by the application root and passed to the
//! subtrees that need it - there is no ambient singleton, so tests construct
//! sessions in isolation. Reads are lock-free snapshots; the secure request
//! client reads the current credential on every call without contention.
//!
//! [`SessionStore`] is the only component that writes session state. All
//! authentication work is delegated to the external identity provider; the
//! store's job is to keep the local projection consistent with what the
//! provider reported. Concurrent mutators are not deduplicated: the last
//! write observed by the store wins.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::backend::Backend;
use crate::backend::models::users::{Role, UserCreate};
use crate::errors::{AuthError, ProfileUpdateError};
use crate::identity::{Credential, IdentityProvider, ProfilePatch, ProviderProfile};
use crate::notify::Notifier;
use crate::types::Theme;

/// The authenticated identity as reported by the identity provider.
#[derive(Debug, Clone)]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub credential: Credential,
}

/// What a route guard (or any other consumer) sees when it reads the
/// session.
///
/// `Pending` means the provider's initial session check has not resolved
/// yet; guards must render a loading placeholder rather than redirecting.
/// The transient in-flight state of a login attempt is deliberately NOT
/// observable here - until the provider reports a result, the previous
/// state stands.
#[derive(Debug, Clone)]
pub enum SessionRead {
    Pending,
    Anonymous,
    Authenticated(Principal),
}

/// One immutable snapshot of session state.
///
/// `display_name`/`avatar_url` are a locally-cached projection of the
/// principal's profile fields; profile edits update them without
/// re-authenticating.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub resolved: bool,
    pub principal: Option<Principal>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub theme: Theme,
}

impl SessionState {
    fn fresh(theme: Theme) -> Self {
        Self {
            resolved: false,
            principal: None,
            display_name: None,
            avatar_url: None,
            theme,
        }
    }
}

/// Cheap-clone handle to the shared session state.
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<ArcSwap<SessionState>>,
}

impl SessionContext {
    pub fn new(theme: Theme) -> Self {
        Self {
            state: Arc::new(ArcSwap::from_pointee(SessionState::fresh(theme))),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    /// The three-way read guards consume.
    pub fn read(&self) -> SessionRead {
        let state = self.state.load();
        if !state.resolved {
            return SessionRead::Pending;
        }
        match &state.principal {
            Some(principal) => SessionRead::Authenticated(principal.clone()),
            None => SessionRead::Anonymous,
        }
    }

    /// The current credential, if any. Read by the secure client on every
    /// outgoing request.
    pub fn credential(&self) -> Option<Credential> {
        self.state.load().principal.as_ref().map(|p| p.credential.clone())
    }

    pub fn theme(&self) -> Theme {
        self.state.load().theme
    }

    fn mutate(&self, f: impl Fn(&SessionState) -> SessionState) {
        self.state.rcu(|current| Arc::new(f(current)));
    }

    pub(crate) fn set_authenticated(&self, profile: &ProviderProfile) {
        let principal = Principal {
            uid: profile.uid.clone(),
            email: profile.email.clone(),
            credential: profile.credential.clone(),
        };
        let display_name = profile.display_name.clone();
        let avatar_url = profile.avatar_url.clone();
        self.mutate(move |state| SessionState {
            resolved: true,
            principal: Some(principal.clone()),
            display_name: display_name.clone(),
            avatar_url: avatar_url.clone(),
            theme: state.theme,
        });
    }

    pub(crate) fn set_anonymous(&self) {
        self.mutate(|state| SessionState {
            resolved: true,
            principal: None,
            display_name: None,
            avatar_url: None,
            theme: state.theme,
        });
    }

    pub(crate) fn set_display_name(&self, name: &str) {
        let name = name.to_string();
        self.mutate(move |state| {
            let mut next = state.clone();
            next.display_name = Some(name.clone());
            next
        });
    }

    pub(crate) fn set_avatar_url(&self, url: &str) {
        let url = url.to_string();
        self.mutate(move |state| {
            let mut next = state.clone();
            next.avatar_url = Some(url.clone());
            next
        });
    }

    pub(crate) fn toggle_theme(&self) {
        self.mutate(|state| {
            let mut next = state.clone();
            next.theme = state.theme.flipped();
            next
        });
    }

    /// Swap in a refreshed credential for the current principal. A no-op if
    /// the session went anonymous in the meantime.
    pub(crate) fn replace_credential(&self, credential: &Credential) {
        self.mutate(move |state| {
            let mut next = state.clone();
            if let Some(principal) = &mut next.principal {
                principal.credential = credential.clone();
            }
            next
        });
    }
}

/// The operation surface over session state.
///
/// Every mutating action catches its own failure and surfaces it as a
/// transient notification in addition to returning the error, so callers
/// only add navigation/rendering on top.
#[derive(Clone)]
pub struct SessionStore {
    ctx: SessionContext,
    provider: Arc<dyn IdentityProvider>,
    backend: Backend,
    notifier: Notifier,
}

impl SessionStore {
    pub fn new(ctx: SessionContext, provider: Arc<dyn IdentityProvider>, backend: Backend, notifier: Notifier) -> Self {
        Self {
            ctx,
            provider,
            backend,
            notifier,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Resolve the provider's initial session check.
    ///
    /// `saved_refresh_token` is whatever the embedding shell persisted from
    /// a previous run. Either way the check resolves: a missing or stale
    /// token resolves to anonymous rather than an error.
    #[instrument(skip_all)]
    pub async fn restore_session(&self, saved_refresh_token: Option<&str>) {
        let Some(refresh_token) = saved_refresh_token else {
            self.ctx.set_anonymous();
            return;
        };
        let restored = async {
            let credential = self.provider.refresh_credential(refresh_token).await?;
            self.provider.fetch_profile(&credential).await
        }
        .await;
        match restored {
            Ok(profile) => {
                info!(email = %profile.email, "session restored");
                self.ctx.set_authenticated(&profile);
            }
            Err(e) => {
                debug!(error = %e, "saved session could not be restored");
                self.ctx.set_anonymous();
            }
        }
    }

    /// Sign in with email + password.
    #[instrument(skip(self, password))]
    pub async fn login_with_credentials(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.provider.sign_in(email, password).await {
            Ok(profile) => {
                info!(email = %profile.email, "logged in");
                self.ctx.set_authenticated(&profile);
                Ok(())
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Federated sign-in.
    ///
    /// On success, a backend user record is ensured to exist with the
    /// default `member` role. The backend enforces uniqueness: a conflict
    /// response means the record already existed, which is success here.
    /// The ensure step is best effort and does not fail the login.
    #[instrument(skip_all)]
    pub async fn login_with_social_provider(&self, assertion: &str) -> Result<(), AuthError> {
        let profile = match self.provider.sign_in_with_oauth(assertion).await {
            Ok(profile) => profile,
            Err(e) => {
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };
        info!(email = %profile.email, "logged in via social provider");
        self.ctx.set_authenticated(&profile);

        let record = UserCreate {
            name: profile.display_name.clone().unwrap_or_else(|| profile.email.clone()),
            email: profile.email.clone(),
            role: Role::Member,
            avatar_url: profile.avatar_url.clone(),
        };
        match self.backend.users().create(&record).await {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                debug!(email = %profile.email, "backend user record already exists");
            }
            Err(e) => {
                warn!(error = %e, "could not ensure backend user record");
                self.notifier.error("Signed in, but your member record could not be created");
            }
        }
        Ok(())
    }

    /// Create a provider account, push its profile fields, and create the
    /// matching backend user record.
    ///
    /// Uniqueness is enforced by the provider and the backend (conflict
    /// responses), not by a prior read here.
    #[instrument(skip(self, password))]
    pub async fn register_with_credentials(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        avatar_url: Option<&str>,
    ) -> Result<(), AuthError> {
        let profile = match self.provider.create_account(email, password).await {
            Ok(profile) => profile,
            Err(e) => {
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };

        // Authenticate immediately so the profile patch and the backend
        // record creation run with this session's credential.
        self.ctx.set_authenticated(&profile);

        let patch = ProfilePatch {
            display_name: Some(name.to_string()),
            avatar_url: avatar_url.map(str::to_string),
        };
        match self.provider.update_profile(&profile.credential, &patch).await {
            Ok(()) => {
                self.ctx.set_display_name(name);
                if let Some(url) = avatar_url {
                    self.ctx.set_avatar_url(url);
                }
            }
            Err(e) => warn!(error = %e, "profile fields could not be set during registration"),
        }

        let record = UserCreate {
            name: name.to_string(),
            email: email.to_string(),
            role,
            avatar_url: avatar_url.map(str::to_string),
        };
        match self.backend.users().create(&record).await {
            Ok(_) => {
                info!(%email, "registered");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                let err = AuthError::DuplicateAccount;
                self.notifier.error(err.to_string());
                Err(err)
            }
            Err(e) => {
                let err = AuthError::Provider {
                    message: format!("account created, but the member record failed: {e}"),
                };
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }

    /// Clear the session.
    ///
    /// Local state is cleared unconditionally - a failed provider call must
    /// not leave a stuck session behind.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let credential = self.ctx.credential();
        self.ctx.set_anonymous();
        if let Some(credential) = credential {
            if let Err(e) = self.provider.sign_out(&credential).await {
                warn!(error = %e, "provider sign-out failed; local session cleared anyway");
            }
        }
        info!("logged out");
    }

    /// Flip the theme. No side effect beyond the local render tree.
    pub fn toggle_theme(&self) {
        self.ctx.toggle_theme();
    }

    /// Push a display-name patch to the provider; update the local cache
    /// only on success.
    #[instrument(skip(self))]
    pub async fn update_display_name(&self, name: &str) -> Result<(), ProfileUpdateError> {
        self.update_profile_field(ProfilePatch {
            display_name: Some(name.to_string()),
            avatar_url: None,
        })
        .await
    }

    /// Push an avatar patch to the provider; update the local cache only on
    /// success.
    #[instrument(skip(self))]
    pub async fn update_avatar(&self, url: &str) -> Result<(), ProfileUpdateError> {
        self.update_profile_field(ProfilePatch {
            display_name: None,
            avatar_url: Some(url.to_string()),
        })
        .await
    }

    async fn update_profile_field(&self, patch: ProfilePatch) -> Result<(), ProfileUpdateError> {
        let Some(credential) = self.ctx.credential() else {
            let err = ProfileUpdateError {
                message: "not signed in".to_string(),
            };
            self.notifier.error(err.to_string());
            return Err(err);
        };
        match self.provider.update_profile(&credential, &patch).await {
            Ok(()) => {
                if let Some(name) = &patch.display_name {
                    self.ctx.set_display_name(name);
                }
                if let Some(url) = &patch.avatar_url {
                    self.ctx.set_avatar_url(url);
                }
                Ok(())
            }
            Err(e) => {
                let err = ProfileUpdateError { message: e.to_string() };
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }

    /// Ask the provider to send a password-reset email.
    #[instrument(skip(self))]
    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        match self.provider.send_password_reset(email).await {
            Ok(()) => {
                self.notifier.success("Password reset email sent");
                Ok(())
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::errors::AuthError;
    use crate::identity::Result as IdResult;
    use async_trait::async_trait;

    /// Provider whose every operation fails with a provider outage.
    struct OutageProvider;

    #[async_trait]
    impl IdentityProvider for OutageProvider {
        async fn create_account(&self, _: &str, _: &str) -> IdResult<ProviderProfile> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn sign_in(&self, _: &str, _: &str) -> IdResult<ProviderProfile> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn sign_in_with_oauth(&self, _: &str) -> IdResult<ProviderProfile> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn refresh_credential(&self, _: &str) -> IdResult<Credential> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn fetch_profile(&self, _: &Credential) -> IdResult<ProviderProfile> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn update_profile(&self, _: &Credential, _: &ProfilePatch) -> IdResult<()> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn send_password_reset(&self, _: &str) -> IdResult<()> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
        async fn sign_out(&self, _: &Credential) -> IdResult<()> {
            Err(AuthError::Provider {
                message: "outage".into(),
            })
        }
    }

    fn store_with(provider: Arc<dyn IdentityProvider>) -> (SessionStore, crate::notify::NotificationQueue) {
        let ctx = SessionContext::new(Theme::Light);
        let backend = Backend::new(&BackendConfig::default(), ctx.clone(), None).expect("backend");
        let (notifier, queue) = Notifier::channel();
        (SessionStore::new(ctx, provider, backend, notifier), queue)
    }

    fn dummy_provider() -> Arc<dyn IdentityProvider> {
        Arc::new(crate::identity::dummy::DummyProvider::new(Default::default()))
    }

    #[tokio::test]
    async fn fresh_session_is_pending_until_restored() {
        let (store, _queue) = store_with(dummy_provider());
        assert!(matches!(store.context().read(), SessionRead::Pending));

        store.restore_session(None).await;
        assert!(matches!(store.context().read(), SessionRead::Anonymous));
    }

    #[tokio::test]
    async fn failed_restore_resolves_to_anonymous() {
        let (store, _queue) = store_with(Arc::new(OutageProvider));
        store.restore_session(Some("stale-token")).await;
        assert!(matches!(store.context().read(), SessionRead::Anonymous));
    }

    #[tokio::test]
    async fn failed_login_leaves_session_anonymous_and_notifies() {
        let (store, mut queue) = store_with(dummy_provider());
        store.restore_session(None).await;

        // The dummy provider rejects empty passwords.
        let err = store.login_with_credentials("a@b.c", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(matches!(store.context().read(), SessionRead::Anonymous));

        let notifications = queue.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, crate::notify::Level::Error);
    }

    #[tokio::test]
    async fn logout_clears_locally_even_when_provider_rejects() {
        // Log in through a working provider first, then swap in an outage
        // provider for the logout call.
        let ctx = SessionContext::new(Theme::Light);
        let backend = Backend::new(&BackendConfig::default(), ctx.clone(), None).expect("backend");
        let (notifier, _queue) = Notifier::channel();

        let working = SessionStore::new(ctx.clone(), dummy_provider(), backend.clone(), notifier.clone());
        working.login_with_credentials("a@b.c", "hunter2").await.unwrap();
        assert!(matches!(ctx.read(), SessionRead::Authenticated(_)));

        let failing = SessionStore::new(ctx.clone(), Arc::new(OutageProvider), backend, notifier);
        failing.logout().await;
        assert!(matches!(ctx.read(), SessionRead::Anonymous));
    }

    #[tokio::test]
    async fn theme_toggle_is_local_only() {
        let (store, _queue) = store_with(dummy_provider());
        assert_eq!(store.context().theme(), Theme::Light);
        store.toggle_theme();
        assert_eq!(store.context().theme(), Theme::Dark);
        store.toggle_theme();
        assert_eq!(store.context().theme(), Theme::Light);
    }

    #[tokio::test]
    async fn failed_profile_update_leaves_local_state_unchanged() {
        let ctx = SessionContext::new(Theme::Light);
        let backend = Backend::new(&BackendConfig::default(), ctx.clone(), None).expect("backend");
        let (notifier, mut queue) = Notifier::channel();

        let working = SessionStore::new(ctx.clone(), dummy_provider(), backend.clone(), notifier.clone());
        working.login_with_credentials("a@b.c", "hunter2").await.unwrap();
        working.update_display_name("Before").await.unwrap();

        let failing = SessionStore::new(ctx.clone(), Arc::new(OutageProvider), backend, notifier);
        let err = failing.update_display_name("After").await.unwrap_err();
        assert!(err.message.contains("outage"));
        assert_eq!(ctx.snapshot().display_name.as_deref(), Some("Before"));
        assert!(!queue.drain().is_empty());
    }

    #[tokio::test]
    async fn profile_update_and_concurrent_reads_settle_on_last_write() {
        let (store, _queue) = store_with(dummy_provider());
        store.login_with_credentials("a@b.c", "hunter2").await.unwrap();

        // Two racing updates: whichever resolves last is what the snapshot
        // shows. Resolve them in a known order and assert the final state.
        store.update_display_name("first").await.unwrap();
        store.update_display_name("second").await.unwrap();
        assert_eq!(store.context().snapshot().display_name.as_deref(), Some("second"));
    }
}
