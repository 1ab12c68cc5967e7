//! Role resolution for the current principal.
//!
//! The backend user record is the authority on roles. It is re-fetched per
//! navigation/mount - never cached across navigations - so an admin-side
//! role change takes effect on the user's next navigation rather than at
//! some cache expiry.

use tracing::{debug, instrument};

use crate::backend::Backend;
use crate::backend::models::users::{Role, UserRecord};
use crate::errors::RequestError;

/// Outcome of a completed role lookup.
///
/// `NotFound` is a normal outcome, not an error: guards treat it as
/// insufficient privilege.
#[derive(Debug, Clone)]
pub enum RoleLookup {
    NotFound,
    Found(UserRecord),
}

impl RoleLookup {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleLookup::NotFound => None,
            RoleLookup::Found(record) => Some(record.role),
        }
    }
}

/// The states a role query moves through from a guard's point of view.
#[derive(Debug, Clone)]
pub enum RoleQuery {
    /// Query in flight; guards render loading rather than redirecting
    Pending,
    Resolved(RoleLookup),
    /// Query failed; guards treat this as "not authorized"
    Failed,
}

impl RoleQuery {
    pub fn from_result(result: Result<RoleLookup, RequestError>) -> Self {
        match result {
            Ok(lookup) => RoleQuery::Resolved(lookup),
            Err(_) => RoleQuery::Failed,
        }
    }
}

/// Resolves the backend user record keyed by the principal's email.
#[derive(Clone)]
pub struct RoleResolver {
    backend: Backend,
}

impl RoleResolver {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// One fresh lookup. Errors are returned to the caller; guards convert
    /// them to "not authorized" while other consumers may surface them.
    #[instrument(skip(self))]
    pub async fn resolve(&self, email: &str) -> Result<RoleLookup, RequestError> {
        match self.backend.users().get_by_email(email).await? {
            Some(record) => {
                debug!(role = ?record.role, "role resolved");
                Ok(RoleLookup::Found(record))
            }
            None => {
                debug!("no user record for principal");
                Ok(RoleLookup::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::session::SessionContext;
    use crate::types::Theme;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolver_for(server: &MockServer) -> RoleResolver {
        let mut config = BackendConfig::default();
        config.base_url = Url::parse(&server.uri()).unwrap();
        let ctx = SessionContext::new(Theme::Light);
        ctx.set_anonymous();
        RoleResolver::new(Backend::new(&config, ctx, None).unwrap())
    }

    #[test_log::test(tokio::test)]
    async fn resolves_a_moderator_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/mod@x.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Mod", "email": "mod@x.com", "role": "moderator"
            })))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server).await;
        let lookup = resolver.resolve("mod@x.com").await.unwrap();
        assert_eq!(lookup.role(), Some(Role::Moderator));
    }

    #[test_log::test(tokio::test)]
    async fn missing_record_is_not_found_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/ghost@x.com"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server).await;
        let lookup = resolver.resolve("ghost@x.com").await.unwrap();
        assert!(matches!(lookup, RoleLookup::NotFound));
        assert_eq!(lookup.role(), None);
    }

    #[test_log::test(tokio::test)]
    async fn backend_failure_becomes_failed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/mod@x.com"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server).await;
        let query = RoleQuery::from_result(resolver.resolve("mod@x.com").await);
        assert!(matches!(query, RoleQuery::Failed));
    }
}
