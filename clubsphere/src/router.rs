//! The application's route surface.
//!
//! A static path table maps every route to the view that renders there and
//! the gate (if any) protecting it. Views are opaque identifiers here -
//! rendering is the embedding shell's concern; this module decides *what*
//! may mount, not how it looks.
//!
//! [`Navigator`] evaluates a navigation end-to-end: match the path, consult
//! the session, run the role query for role-gated routes, and produce one of
//! render / redirect / loading. A navigation that is superseded before its
//! role query resolves discards the late result instead of applying it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

use crate::guards::{self, Gate, GuardDecision, HOME_ROUTE};
use crate::roles::{RoleQuery, RoleResolver};
use crate::session::{SessionContext, SessionRead};

/// Every view the application can mount. Role-gated dashboard views carry
/// the backend id they operate on where the route has a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    // Public
    Home,
    AllClubs,
    AllEvents,
    About,
    ClubDetails(String),
    Login,
    Register,
    ForgotPassword,
    // Authenticated-only
    Payment,
    PaymentSuccess,
    PaymentFailed,
    Profile,
    DashboardHome,
    // Admin
    ManageUsers,
    Analytics,
    // Moderator
    AddClub,
    ManageClubs,
    UpdateClub(String),
    ManageApplications,
    AllReviews,
    // Member
    MyApplications,
    MyReviews,
    EditApplication(String),
    /// Unmatched path; renders a link home
    NotFound,
}

/// What a path resolves to before guards run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    View { view: View, gate: Option<Gate> },
    /// Bare `/dashboard` forwards to its home tab
    Redirect(&'static str),
}

/// Resolve a path against the route table.
pub fn match_path(path: &str) -> RouteMatch {
    let path = path.trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    let (view, gate) = match path {
        "/" => (View::Home, None),
        "/all-clubs" => (View::AllClubs, None),
        "/all-events" => (View::AllEvents, None),
        "/about" => (View::About, None),
        "/login" => (View::Login, None),
        "/register" => (View::Register, None),
        "/forgot" => (View::ForgotPassword, None),
        "/payment" => (View::Payment, Some(Gate::Authenticated)),
        "/payment-success" => (View::PaymentSuccess, Some(Gate::Authenticated)),
        "/payment-failed" => (View::PaymentFailed, Some(Gate::Authenticated)),
        "/profile" => (View::Profile, Some(Gate::Authenticated)),
        "/dashboard" => return RouteMatch::Redirect("/dashboard/home"),
        "/dashboard/home" => (View::DashboardHome, Some(Gate::Authenticated)),
        "/dashboard/manage-users" => (View::ManageUsers, Some(Gate::Admin)),
        "/dashboard/analytics" => (View::Analytics, Some(Gate::Admin)),
        "/dashboard/add" => (View::AddClub, Some(Gate::Moderator)),
        "/dashboard/manage-clubs" => (View::ManageClubs, Some(Gate::Moderator)),
        "/dashboard/manage-applications" => (View::ManageApplications, Some(Gate::Moderator)),
        "/dashboard/all-reviews" => (View::AllReviews, Some(Gate::Moderator)),
        "/dashboard/my-applications" => (View::MyApplications, Some(Gate::Member)),
        "/dashboard/my-reviews" => (View::MyReviews, Some(Gate::Member)),
        _ => {
            if let Some(id) = path.strip_prefix("/club-details/") {
                if !id.is_empty() && !id.contains('/') {
                    return RouteMatch::View {
                        view: View::ClubDetails(id.to_string()),
                        gate: None,
                    };
                }
            }
            if let Some(id) = path.strip_prefix("/dashboard/update-club/") {
                if !id.is_empty() && !id.contains('/') {
                    return RouteMatch::View {
                        view: View::UpdateClub(id.to_string()),
                        gate: Some(Gate::Moderator),
                    };
                }
            }
            if let Some(id) = path.strip_prefix("/dashboard/edit-application/") {
                if !id.is_empty() && !id.contains('/') {
                    return RouteMatch::View {
                        view: View::EditApplication(id.to_string()),
                        gate: Some(Gate::Member),
                    };
                }
            }
            (View::NotFound, None)
        }
    };
    RouteMatch::View { view, gate }
}

/// Outcome of one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Render(View),
    Redirect(String),
    /// The initial session check has not resolved; show the loading
    /// placeholder and navigate again once it has
    Loading,
    /// A newer navigation started before this one's role query resolved;
    /// apply nothing
    Superseded,
}

/// Evaluates navigations against the session and role state.
///
/// Cheap to clone; clones share the generation counter, so a navigation
/// started on any clone supersedes pending ones everywhere.
#[derive(Clone)]
pub struct Navigator {
    ctx: SessionContext,
    resolver: RoleResolver,
    generation: Arc<AtomicU64>,
}

impl Navigator {
    pub fn new(ctx: SessionContext, resolver: RoleResolver) -> Self {
        Self {
            ctx,
            resolver,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Evaluate one navigation.
    ///
    /// The role query for a role-gated route is issued fresh here, per
    /// navigation. If another navigation starts while that query is in
    /// flight, the late result is discarded and `Superseded` returned.
    #[instrument(skip(self))]
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (view, gate) = match match_path(path) {
            RouteMatch::Redirect(to) => return NavigationOutcome::Redirect(to.to_string()),
            RouteMatch::View { view, gate: None } => return NavigationOutcome::Render(view),
            RouteMatch::View { view, gate: Some(gate) } => (view, gate),
        };

        let session = self.ctx.read();
        let decision = match gate.required_role() {
            None => guards::authenticated_only(&session),
            Some(required) => match &session {
                SessionRead::Pending => GuardDecision::Loading,
                SessionRead::Anonymous => GuardDecision::Redirect(HOME_ROUTE),
                SessionRead::Authenticated(principal) => {
                    let role = RoleQuery::from_result(self.resolver.resolve(&principal.email).await);
                    if self.generation.load(Ordering::SeqCst) != my_generation {
                        debug!("navigation superseded; discarding role result");
                        return NavigationOutcome::Superseded;
                    }
                    guards::role_only(required, &session, &role)
                }
            },
        };

        match decision {
            GuardDecision::Render => NavigationOutcome::Render(view),
            GuardDecision::Redirect(to) => NavigationOutcome::Redirect(to.to_string()),
            GuardDecision::Loading => NavigationOutcome::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::BackendConfig;
    use crate::guards::LOGIN_ROUTE;
    use crate::identity::Credential;
    use crate::session::Principal;
    use crate::types::Theme;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn public_routes_have_no_gate() {
        for route in ["/", "/all-clubs", "/all-events", "/about", "/login", "/register", "/forgot"] {
            match match_path(route) {
                RouteMatch::View { gate: None, .. } => {}
                other => panic!("{route} should be public, got {other:?}"),
            }
        }
    }

    #[test]
    fn parameterized_routes_capture_the_id() {
        assert_eq!(
            match_path("/club-details/abc123"),
            RouteMatch::View {
                view: View::ClubDetails("abc123".to_string()),
                gate: None,
            }
        );
        assert_eq!(
            match_path("/dashboard/update-club/c9"),
            RouteMatch::View {
                view: View::UpdateClub("c9".to_string()),
                gate: Some(Gate::Moderator),
            }
        );
        assert_eq!(
            match_path("/dashboard/edit-application/a1"),
            RouteMatch::View {
                view: View::EditApplication("a1".to_string()),
                gate: Some(Gate::Member),
            }
        );
    }

    #[test]
    fn dashboard_root_redirects_to_home_tab() {
        assert_eq!(match_path("/dashboard"), RouteMatch::Redirect("/dashboard/home"));
        assert_eq!(match_path("/dashboard/"), RouteMatch::Redirect("/dashboard/home"));
    }

    #[test]
    fn unmatched_paths_fall_through_to_not_found() {
        for route in ["/nope", "/club-details/", "/dashboard/unknown", "/club-details/a/b"] {
            match match_path(route) {
                RouteMatch::View { view: View::NotFound, gate: None } => {}
                other => panic!("{route} should be NotFound, got {other:?}"),
            }
        }
    }

    #[test]
    fn role_gates_cover_the_dashboard_subtree() {
        let expectations = [
            ("/dashboard/manage-users", Gate::Admin),
            ("/dashboard/analytics", Gate::Admin),
            ("/dashboard/add", Gate::Moderator),
            ("/dashboard/manage-clubs", Gate::Moderator),
            ("/dashboard/manage-applications", Gate::Moderator),
            ("/dashboard/all-reviews", Gate::Moderator),
            ("/dashboard/my-applications", Gate::Member),
            ("/dashboard/my-reviews", Gate::Member),
        ];
        for (route, expected) in expectations {
            match match_path(route) {
                RouteMatch::View { gate: Some(gate), .. } => assert_eq!(gate, expected, "{route}"),
                other => panic!("{route} should be gated, got {other:?}"),
            }
        }
    }

    fn navigator_for(server: &MockServer, ctx: SessionContext) -> Navigator {
        let mut config = BackendConfig::default();
        config.base_url = Url::parse(&server.uri()).unwrap();
        let backend = Backend::new(&config, ctx.clone(), None).unwrap();
        Navigator::new(ctx, RoleResolver::new(backend))
    }

    fn moderator_ctx() -> SessionContext {
        let ctx = SessionContext::new(Theme::Light);
        ctx.set_authenticated(&crate::identity::ProviderProfile {
            uid: "uid-mod".to_string(),
            email: "mod@x.com".to_string(),
            display_name: Some("Mod".to_string()),
            avatar_url: None,
            credential: Credential::new("tok".to_string(), None, None),
        });
        ctx
    }

    async fn mount_moderator_record(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/mod@x.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Mod", "email": "mod@x.com", "role": "moderator"
            })))
            .mount(server)
            .await;
    }

    #[test_log::test(tokio::test)]
    async fn anonymous_visitor_is_redirected_off_gated_routes() {
        let server = MockServer::start().await;
        let ctx = SessionContext::new(Theme::Light);
        ctx.set_anonymous();
        let navigator = navigator_for(&server, ctx);

        assert_eq!(
            navigator.navigate("/profile").await,
            NavigationOutcome::Redirect(LOGIN_ROUTE.to_string())
        );
        assert_eq!(
            navigator.navigate("/dashboard/manage-users").await,
            NavigationOutcome::Redirect(HOME_ROUTE.to_string())
        );
        // No role query was ever issued for the anonymous visitor.
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn unresolved_session_check_yields_loading_not_redirect() {
        let server = MockServer::start().await;
        let ctx = SessionContext::new(Theme::Light); // never resolved
        let navigator = navigator_for(&server, ctx);

        assert_eq!(navigator.navigate("/profile").await, NavigationOutcome::Loading);
        assert_eq!(
            navigator.navigate("/dashboard/my-reviews").await,
            NavigationOutcome::Loading
        );
    }

    #[test_log::test(tokio::test)]
    async fn moderator_reaches_moderator_routes_but_not_admin_ones() {
        let server = MockServer::start().await;
        mount_moderator_record(&server).await;
        let navigator = navigator_for(&server, moderator_ctx());

        assert_eq!(
            navigator.navigate("/dashboard/manage-applications").await,
            NavigationOutcome::Render(View::ManageApplications)
        );
        assert_eq!(
            navigator.navigate("/dashboard/manage-users").await,
            NavigationOutcome::Redirect(HOME_ROUTE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn role_is_refetched_on_every_navigation() {
        let server = MockServer::start().await;
        mount_moderator_record(&server).await;
        let navigator = navigator_for(&server, moderator_ctx());

        navigator.navigate("/dashboard/manage-clubs").await;
        navigator.navigate("/dashboard/all-reviews").await;
        // One role lookup per navigation - no caching across navigations.
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn superseded_navigation_discards_the_late_role_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/mod@x.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(250))
                    .set_body_json(json!({
                        "name": "Mod", "email": "mod@x.com", "role": "moderator"
                    })),
            )
            .mount(&server)
            .await;

        let navigator = navigator_for(&server, moderator_ctx());

        // Start a gated navigation whose role query is slow, then navigate
        // away before it resolves.
        let slow = tokio::spawn({
            let navigator = navigator.clone();
            async move { navigator.navigate("/dashboard/manage-applications").await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(navigator.navigate("/about").await, NavigationOutcome::Render(View::About));

        assert_eq!(slow.await.unwrap(), NavigationOutcome::Superseded);
    }
}
