//! Dummy identity provider implementation.
//!
//! Accepts any well-formed email and non-empty password, issues opaque
//! in-process credentials, and remembers accounts it created so duplicate
//! registration still fails the way the hosted provider would. Development
//! and tests only.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::DummyIdentityConfig;
use crate::errors::AuthError;
use crate::identity::{Credential, IdentityProvider, ProfilePatch, ProviderProfile, Result};

#[derive(Debug, Clone)]
struct DummyAccount {
    uid: String,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

pub struct DummyProvider {
    config: DummyIdentityConfig,
    accounts: Mutex<HashSet<String>>,
    /// token -> account behind it, for `fetch_profile`/`update_profile`
    sessions: Mutex<HashMap<String, DummyAccount>>,
    counter: AtomicU64,
}

impl DummyProvider {
    pub fn new(config: DummyIdentityConfig) -> Self {
        Self {
            config,
            accounts: Mutex::new(HashSet::new()),
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    fn issue(&self, email: &str, display_name: Option<String>, avatar_url: Option<String>) -> ProviderProfile {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let token = format!("dummy-token-{n}");
        let uid = format!("dummy-uid-{}", email.replace('@', "-at-"));
        let expires_at = self
            .config
            .credential_ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);

        let account = DummyAccount {
            uid: uid.clone(),
            email: email.to_string(),
            display_name: display_name.clone(),
            avatar_url: avatar_url.clone(),
        };
        self.sessions
            .lock()
            .expect("dummy provider session table poisoned")
            .insert(token.clone(), account);

        ProviderProfile {
            uid,
            email: email.to_string(),
            display_name,
            avatar_url,
            credential: Credential::new(token, Some(format!("dummy-refresh-{n}")), expires_at),
        }
    }

    fn check_well_formed(email: &str, password: &str) -> Result<()> {
        if !email.contains('@') {
            return Err(AuthError::Provider {
                message: format!("'{email}' is not an email address"),
            });
        }
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for DummyProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<ProviderProfile> {
        Self::check_well_formed(email, password)?;
        if password.len() < 6 {
            return Err(AuthError::WeakPassword {
                reason: "password should be at least 6 characters".to_string(),
            });
        }
        let mut accounts = self.accounts.lock().expect("dummy provider account table poisoned");
        if !accounts.insert(email.to_string()) {
            return Err(AuthError::DuplicateAccount);
        }
        drop(accounts);
        Ok(self.issue(email, None, None))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderProfile> {
        Self::check_well_formed(email, password)?;
        Ok(self.issue(email, None, None))
    }

    async fn sign_in_with_oauth(&self, assertion: &str) -> Result<ProviderProfile> {
        // The assertion doubles as the federated account's email for tests.
        let email = if assertion.contains('@') {
            assertion.to_string()
        } else {
            format!("{assertion}@social.example")
        };
        self.accounts
            .lock()
            .expect("dummy provider account table poisoned")
            .insert(email.clone());
        Ok(self.issue(&email, Some("Social User".to_string()), None))
    }

    async fn refresh_credential(&self, refresh_token: &str) -> Result<Credential> {
        if !refresh_token.starts_with("dummy-refresh-") {
            return Err(AuthError::InvalidCredentials);
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let expires_at = self
            .config
            .credential_ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        Ok(Credential::new(
            format!("dummy-token-{n}"),
            Some(refresh_token.to_string()),
            expires_at,
        ))
    }

    async fn fetch_profile(&self, credential: &Credential) -> Result<ProviderProfile> {
        let sessions = self.sessions.lock().expect("dummy provider session table poisoned");
        let account = sessions.get(credential.bearer()).ok_or(AuthError::InvalidCredentials)?;
        Ok(ProviderProfile {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            avatar_url: account.avatar_url.clone(),
            credential: credential.clone(),
        })
    }

    async fn update_profile(&self, credential: &Credential, patch: &ProfilePatch) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("dummy provider session table poisoned");
        let account = sessions
            .get_mut(credential.bearer())
            .ok_or(AuthError::InvalidCredentials)?;
        if let Some(name) = &patch.display_name {
            account.display_name = Some(name.clone());
        }
        if let Some(url) = &patch.avatar_url {
            account.avatar_url = Some(url.clone());
        }
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<()> {
        Ok(())
    }

    async fn sign_out(&self, credential: &Credential) -> Result<()> {
        self.sessions
            .lock()
            .expect("dummy provider session table poisoned")
            .remove(credential.bearer());
        Ok(())
    }
}
