//! The two request-issuing clients every component goes through.
//!
//! [`PublicClient`] issues requests with no credential and serves the reads
//! available to anonymous visitors. [`SecureClient`] is identical except it
//! attaches the session's current bearer credential to every request,
//! refreshing it through the identity provider when it is close to expiry.
//!
//! If no principal is present when a secure call is made, the call is still
//! issued without a credential: the backend, not the client, is the
//! enforcement point for rejecting it. UI-level gating is the user-facing
//! control; the backend is the security boundary.
//!
//! All failures surface as a single [`RequestError`]; retry policy is a
//! per-call decision, never a client-wide one.

use rand::prelude::RngExt;
use rand::rng;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{BackendConfig, RetryConfig};
use crate::errors::RequestError;
use crate::identity::IdentityProvider;
use crate::session::SessionContext;

/// How many times a single call may be attempted, and how long to wait
/// between attempts. Only transport failures and 5xx responses are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// No retries: one attempt, failures are final.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Up to `n` attempts (clamped to 1-3) with the given base backoff.
    pub fn attempts(n: u32, backoff: Duration) -> Self {
        Self {
            attempts: n.clamp(1, 3),
            backoff,
        }
    }

    fn delay(&self) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        // Jitter up to half the base backoff to spread out retry storms.
        let jitter_ms = rng().random_range(0..=self.backoff.as_millis() as u64 / 2);
        self.backoff + Duration::from_millis(jitter_ms)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::attempts(config.attempts, config.backoff)
    }
}

/// Refresh collaboration for the secure client: which provider to refresh
/// through and how close to expiry a credential may get before a refresh is
/// due.
#[derive(Clone)]
pub struct CredentialRefresher {
    pub provider: Arc<dyn IdentityProvider>,
    pub margin: Duration,
}

/// Shared transport: base URL joining, body/query handling, retry loop,
/// error mapping.
#[derive(Clone)]
pub(crate) struct RequestCore {
    http: reqwest::Client,
    base_url: Url,
    default_retry: RetryPolicy,
}

impl RequestCore {
    pub(crate) fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        #[cfg(test)]
        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        let mut base_url = config.base_url.clone();
        // A trailing slash makes Url::join treat the base path as a prefix.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self {
            http,
            base_url,
            default_retry: RetryPolicy::from(&config.retry),
        })
    }

    pub(crate) fn default_retry(&self) -> RetryPolicy {
        self.default_retry.clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RequestError::transport(format!("invalid request path '{path}': {e}")))
    }

    #[instrument(skip(self, query, body, bearer, retry))]
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        bearer: Option<&str>,
        retry: &RetryPolicy,
    ) -> Result<reqwest::Response, RequestError> {
        let url = self.endpoint(path)?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut request = self.http.request(method.clone(), url.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let message = read_error_message(response).await;
                    RequestError::status(status, message)
                }
                Err(e) => RequestError::transport(e.to_string()),
            };

            if attempt >= retry.attempts || !error.is_retryable() {
                return Err(error);
            }
            debug!(attempt, error = %error, "retrying request");
            tokio::time::sleep(retry.delay()).await;
        }
    }

    async fn execute_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        bearer: Option<&str>,
        retry: &RetryPolicy,
    ) -> Result<T, RequestError> {
        let response = self.execute(method, path, query, body, bearer, retry).await?;
        let status = response.status();
        response
            .json::<T>()
            .await
            .map_err(|e| RequestError::status(status, format!("malformed response body: {e}")))
    }
}

/// Pull a human-readable message out of an error response. The backend
/// returns `{"message": "..."}` for expected failures and plain text
/// otherwise.
async fn read_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if let Ok(body) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        text
    }
}

/// Client for reads available to anonymous visitors. Never attaches a
/// credential.
#[derive(Clone)]
pub struct PublicClient {
    core: RequestCore,
}

impl PublicClient {
    pub(crate) fn new(core: RequestCore) -> Self {
        Self { core }
    }

    /// GET with the configured default retry policy (reads opt into
    /// retries).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, RequestError> {
        let retry = self.core.default_retry();
        self.core
            .execute_json::<(), T>(Method::GET, path, query, None, None, &retry)
            .await
    }

    /// POST with no retries (mutations are never retried automatically).
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RequestError> {
        self.core
            .execute_json(Method::POST, path, &[], Some(body), None, &RetryPolicy::once())
            .await
    }

    /// POST where the response body does not matter.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RequestError> {
        self.core
            .execute(Method::POST, path, &[], Some(body), None, &RetryPolicy::once())
            .await?;
        Ok(())
    }
}

/// Client that carries the current session's credential.
#[derive(Clone)]
pub struct SecureClient {
    core: RequestCore,
    ctx: SessionContext,
    refresher: Option<CredentialRefresher>,
}

impl SecureClient {
    pub(crate) fn new(core: RequestCore, ctx: SessionContext, refresher: Option<CredentialRefresher>) -> Self {
        Self { core, ctx, refresher }
    }

    /// The bearer token for the next request, refreshed through the
    /// identity provider if it is about to expire. `None` when the session
    /// is anonymous - the request still goes out and the backend rejects it.
    async fn bearer(&self) -> Option<String> {
        let credential = self.ctx.credential()?;
        if let Some(refresher) = &self.refresher {
            if credential.expires_within(refresher.margin) {
                if let Some(refresh_token) = credential.refresh_token() {
                    match refresher.provider.refresh_credential(refresh_token).await {
                        Ok(fresh) => {
                            self.ctx.replace_credential(&fresh);
                            return Some(fresh.bearer().to_string());
                        }
                        Err(e) => {
                            // Send the stale token; the backend's rejection
                            // is the authoritative signal.
                            warn!(error = %e, "credential refresh failed");
                        }
                    }
                }
            }
        }
        Some(credential.bearer().to_string())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, RequestError> {
        let bearer = self.bearer().await;
        let retry = self.core.default_retry();
        self.core
            .execute_json::<(), T>(Method::GET, path, query, None, bearer.as_deref(), &retry)
            .await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RequestError> {
        let bearer = self.bearer().await;
        self.core
            .execute_json(Method::POST, path, &[], Some(body), bearer.as_deref(), &RetryPolicy::once())
            .await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, RequestError> {
        let bearer = self.bearer().await;
        self.core
            .execute_json(Method::PUT, path, &[], Some(body), bearer.as_deref(), &RetryPolicy::once())
            .await
    }

    /// POST where the response body does not matter.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RequestError> {
        let bearer = self.bearer().await;
        self.core
            .execute(Method::POST, path, &[], Some(body), bearer.as_deref(), &RetryPolicy::once())
            .await?;
        Ok(())
    }

    /// PUT where the response body does not matter.
    pub async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RequestError> {
        let bearer = self.bearer().await;
        self.core
            .execute(Method::PUT, path, &[], Some(body), bearer.as_deref(), &RetryPolicy::once())
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), RequestError> {
        let bearer = self.bearer().await;
        self.core
            .execute::<()>(Method::DELETE, path, &[], None, bearer.as_deref(), &RetryPolicy::once())
            .await?;
        Ok(())
    }
}
