//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` and can be set via the
//! `-f` flag or the `CLUBSPHERE_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `CLUBSPHERE_`
//!
//! Nested values use double underscores: `CLUBSPHERE_BACKEND__BASE_URL=...`
//! sets `backend.base_url`.
//!
//! ## Configuration Structure
//!
//! - **Backend**: `backend.base_url`, `backend.request_timeout`,
//!   `backend.retry` - the external REST API the client calls
//! - **Identity**: `identity.http` or `identity.dummy` plus provider
//!   credentials - the external identity provider
//! - **Payment**: `payment.stripe` or `payment.dummy` - the external
//!   payment processor; optional, payment routes are inert without it
//! - **UI**: `ui.theme` - default theme for a fresh session

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::types::Theme;

/// Simple CLI args - config file selection plus validate-and-exit.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CLUBSPHERE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without doing anything else.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<crate::cli::Command>,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables; every field has a default so
/// a missing config file still produces a usable development setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Payment processor configuration (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentConfig>,
    /// UI defaults
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            identity: IdentityConfig::default(),
            payment: None,
            ui: UiConfig::default(),
        }
    }
}

/// Backend REST API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the backend API
    pub base_url: Url,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Default retry policy for calls that opt into retries
    pub retry: RetryConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            // Default matches the backend's local development port.
            base_url: Url::parse("http://localhost:5000").expect("static URL"),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

/// Default retry behavior for request clients.
///
/// Retries apply to transport failures and 5xx responses only; 4xx responses
/// are final. Individual call sites may override the attempt count (1-3).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per call, including the first (clamped to 1-3)
    pub attempts: u32,
    /// Base backoff between attempts; actual delay is jittered
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Identity provider configuration.
///
/// Credentials should be set via environment variables, e.g.
/// `CLUBSPHERE_IDENTITY__HTTP__API_KEY`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityConfig {
    /// Hosted identity provider reached over HTTPS
    Http(HttpIdentityConfig),
    /// In-process provider that accepts any credentials. Development and
    /// tests only.
    Dummy(DummyIdentityConfig),
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig::Dummy(DummyIdentityConfig::default())
    }
}

/// Hosted identity provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpIdentityConfig {
    /// Base URL for account operations
    pub base_url: Url,
    /// Base URL for credential refresh (defaults to `base_url` if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_base_url: Option<Url>,
    /// Project API key sent with every provider call
    pub api_key: String,
    /// Refresh the credential when it is within this margin of expiry
    #[serde(default = "default_refresh_margin", with = "humantime_serde")]
    pub refresh_margin: Duration,
}

fn default_refresh_margin() -> Duration {
    Duration::from_secs(60)
}

/// Dummy identity provider settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DummyIdentityConfig {
    /// Lifetime of credentials the dummy provider issues
    #[serde(with = "humantime_serde")]
    pub credential_ttl: Option<Duration>,
}

/// Payment processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentConfig {
    /// Stripe-style card confirmation over HTTPS.
    /// Set credentials via `CLUBSPHERE_PAYMENT__STRIPE__PUBLISHABLE_KEY`.
    Stripe(StripeConfig),
    /// Dummy processor that approves everything. Tests and development only.
    Dummy(DummyPaymentConfig),
}

/// Stripe payment configuration.
///
/// Only the publishable key lives on the client; the secret key stays with
/// the backend, which mints payment intents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StripeConfig {
    /// Processor API base URL
    pub base_url: Url,
    /// Publishable key (starts with pk_)
    pub publishable_key: String,
}

/// Dummy payment configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DummyPaymentConfig {
    /// When set, every confirmation fails with this message. Lets tests
    /// exercise the declined-card path.
    pub decline_with: Option<String>,
}

/// UI defaults applied to a fresh session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Theme for a session that has never toggled
    pub theme: Theme,
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CLUBSPHERE_").split("__"))
    }

    /// Validate the configuration for consistency and required fields.
    pub fn validate(&self) -> Result<(), String> {
        if let IdentityConfig::Http(http) = &self.identity {
            if http.api_key.is_empty() {
                return Err("identity.http.api_key must be set when identity.mode is http \
                     (set CLUBSPHERE_IDENTITY__HTTP__API_KEY)"
                    .to_string());
            }
        }
        if let Some(PaymentConfig::Stripe(stripe)) = &self.payment {
            if !stripe.publishable_key.starts_with("pk_") {
                return Err("payment.stripe.publishable_key must be a publishable key (pk_...); \
                     never put a secret key in client configuration"
                    .to_string());
            }
        }
        if !(1..=3).contains(&self.backend.retry.attempts) {
            return Err(format!(
                "backend.retry.attempts must be between 1 and 3, got {}",
                self.backend.retry.attempts
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.retry.attempts, 1);
        assert_eq!(config.ui.theme, Theme::Light);
        assert!(matches!(config.identity, IdentityConfig::Dummy(_)));
    }

    #[test]
    fn env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
backend:
  base_url: "https://api.clubsphere.example"
ui:
  theme: dark
"#,
            )?;
            jail.set_env("CLUBSPHERE_BACKEND__REQUEST_TIMEOUT", "5s");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
                command: None,
            };
            let config = Config::load(&args).expect("config should load");
            assert_eq!(config.backend.base_url.as_str(), "https://api.clubsphere.example/");
            assert_eq!(config.backend.request_timeout, Duration::from_secs(5));
            assert_eq!(config.ui.theme, Theme::Dark);
            Ok(())
        });
    }

    #[test]
    fn http_identity_requires_api_key() {
        let mut config = Config::default();
        config.identity = IdentityConfig::Http(HttpIdentityConfig {
            base_url: Url::parse("https://identity.example").unwrap(),
            token_base_url: None,
            api_key: String::new(),
            refresh_margin: Duration::from_secs(60),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn stripe_rejects_secret_keys() {
        let mut config = Config::default();
        config.payment = Some(PaymentConfig::Stripe(StripeConfig {
            base_url: Url::parse("https://api.stripe.example").unwrap(),
            publishable_key: "sk_live_oops".to_string(),
        }));
        assert!(config.validate().is_err());

        config.payment = Some(PaymentConfig::Stripe(StripeConfig {
            base_url: Url::parse("https://api.stripe.example").unwrap(),
            publishable_key: "pk_test_ok".to_string(),
        }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn retry_attempts_are_bounded() {
        let mut config = Config::default();
        config.backend.retry.attempts = 5;
        assert!(config.validate().is_err());
        config.backend.retry.attempts = 0;
        assert!(config.validate().is_err());
        config.backend.retry.attempts = 3;
        assert!(config.validate().is_ok());
    }
}
