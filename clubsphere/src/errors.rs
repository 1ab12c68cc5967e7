//! Crate-wide error taxonomy.
//!
//! Three failure families cross module boundaries and are worth distinct
//! types: identity-provider failures ([`AuthError`]), backend/transport
//! failures ([`RequestError`]), and profile-patch failures
//! ([`ProfileUpdateError`]). The top-level [`Error`] aggregates them for the
//! binary and for call sites that do not care which boundary failed.
//!
//! Propagation policy: mutating actions catch their own failures and surface
//! them as a transient notification; read queries hand the error back to the
//! consuming view to render inline. Route guards never display errors at all
//! - an unresolved or failed role lookup is "not authorized" and redirects.

use reqwest::StatusCode;
use thiserror::Error as ThisError;

/// Failure of an identity-provider operation (login, registration, social
/// login, password reset).
#[derive(ThisError, Debug)]
pub enum AuthError {
    /// The provider rejected the email/password pair
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// An account already exists for this email
    #[error("An account with this email address already exists")]
    DuplicateAccount,

    /// The provider rejected the password as too weak
    #[error("Password rejected by the identity provider: {reason}")]
    WeakPassword { reason: String },

    /// Any other provider-defined failure, carrying the provider's own
    /// human-readable message
    #[error("Identity provider error: {message}")]
    Provider { message: String },

    /// The provider could not be reached at all
    #[error("Could not reach the identity provider: {0}")]
    Network(String),
}

/// Failure of a backend request issued through either request client.
///
/// Transport failures (timeout, connection refused) have no status; non-2xx
/// responses carry the status the backend returned. Callers decide retry
/// policy per call site.
#[derive(Debug)]
pub struct RequestError {
    pub status: Option<StatusCode>,
    pub message: String,
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "Request failed ({status}): {}", self.message),
            None => write!(f, "Request failed: {}", self.message),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    /// A transport-level failure with no HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// A non-2xx response from the backend.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Whether the backend reported a conflict (duplicate resource).
    pub fn is_conflict(&self) -> bool {
        self.status == Some(StatusCode::CONFLICT)
    }

    /// Whether the backend reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }

    /// Whether a retry could plausibly succeed: transport failures and
    /// server-side (5xx) responses only. Client errors (4xx) are final.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status.is_server_error(),
        }
    }
}

/// Failure while pushing a profile patch (display name / avatar) to the
/// identity provider. Local session state is left untouched when this is
/// returned.
#[derive(ThisError, Debug)]
#[error("Profile update failed: {message}")]
pub struct ProfileUpdateError {
    pub message: String,
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    ProfileUpdate(#[from] ProfileUpdateError),

    /// Requested resource not found (e.g. no user record for a principal)
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns a message suitable for a user-facing notification, without
    /// leaking transport details.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(e) => e.to_string(),
            Error::Request(e) => match e.status {
                Some(status) if status.is_client_error() => e.message.clone(),
                _ => "Something went wrong talking to the server".to_string(),
            },
            Error::ProfileUpdate(e) => e.to_string(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::Other(_) => "Something went wrong".to_string(),
        }
    }
}

/// Type alias for crate operation results
pub type Result<T> = std::result::Result<T, Error>;
