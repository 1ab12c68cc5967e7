//! Route guards: who gets to see what.
//!
//! Four gates share one contract shape: given the current session read (and,
//! for role gates, the state of the role query), decide whether to render
//! the protected view, redirect, or show a loading placeholder.
//!
//! Two policies are deliberate and load-bearing:
//!
//! - While the session check or a role query is unresolved, the decision is
//!   `Loading`, never a redirect. A slow role fetch must not flash-redirect
//!   a legitimate user.
//! - Role gates redirect silently to home on any non-matching, absent, or
//!   failed lookup. There is no forbidden page: from the outside,
//!   unauthorized is indistinguishable from nonexistent. If that policy
//!   ever changes, this module is the single place to change it.

use crate::backend::models::users::Role;
use crate::roles::{RoleLookup, RoleQuery};
use crate::session::SessionRead;

/// Where the authenticated-only gate sends anonymous visitors.
pub const LOGIN_ROUTE: &str = "/login";

/// Where role gates send everyone they turn away.
pub const HOME_ROUTE: &str = "/";

/// The three-way outcome every gate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected children
    Render,
    /// Silently navigate elsewhere, before any protected content shows
    Redirect(&'static str),
    /// A required input has not resolved yet; show the loading placeholder
    Loading,
}

/// The four gate variants the route table attaches to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Authenticated,
    Admin,
    Moderator,
    Member,
}

impl Gate {
    /// The role a role gate demands; `None` for the authenticated-only gate.
    pub fn required_role(self) -> Option<Role> {
        match self {
            Gate::Authenticated => None,
            Gate::Admin => Some(Role::Admin),
            Gate::Moderator => Some(Role::Moderator),
            Gate::Member => Some(Role::Member),
        }
    }
}

/// Authenticated-only gate: no principal and the initial session check has
/// resolved means `/login`; an unresolved check means loading.
pub fn authenticated_only(session: &SessionRead) -> GuardDecision {
    match session {
        SessionRead::Pending => GuardDecision::Loading,
        SessionRead::Anonymous => GuardDecision::Redirect(LOGIN_ROUTE),
        SessionRead::Authenticated(_) => GuardDecision::Render,
    }
}

/// Role gate: render only when the resolved role matches exactly; redirect
/// home otherwise, including for anonymous visitors, absent records, and
/// failed lookups.
pub fn role_only(required: Role, session: &SessionRead, role: &RoleQuery) -> GuardDecision {
    match session {
        SessionRead::Pending => GuardDecision::Loading,
        SessionRead::Anonymous => GuardDecision::Redirect(HOME_ROUTE),
        SessionRead::Authenticated(_) => match role {
            RoleQuery::Pending => GuardDecision::Loading,
            RoleQuery::Failed => GuardDecision::Redirect(HOME_ROUTE),
            RoleQuery::Resolved(RoleLookup::NotFound) => GuardDecision::Redirect(HOME_ROUTE),
            RoleQuery::Resolved(RoleLookup::Found(record)) => match (required, record.role) {
                (Role::Admin, Role::Admin) | (Role::Moderator, Role::Moderator) | (Role::Member, Role::Member) => {
                    GuardDecision::Render
                }
                _ => GuardDecision::Redirect(HOME_ROUTE),
            },
        },
    }
}

/// Evaluate any gate. The role query is ignored by the authenticated-only
/// gate.
pub fn evaluate(gate: Gate, session: &SessionRead, role: &RoleQuery) -> GuardDecision {
    match gate.required_role() {
        None => authenticated_only(session),
        Some(required) => role_only(required, session, role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::users::UserRecord;
    use crate::identity::Credential;
    use crate::session::Principal;

    fn authenticated() -> SessionRead {
        SessionRead::Authenticated(Principal {
            uid: "uid-1".to_string(),
            email: "someone@x.com".to_string(),
            credential: Credential::new("tok".to_string(), None, None),
        })
    }

    fn resolved(role: Role) -> RoleQuery {
        RoleQuery::Resolved(RoleLookup::Found(UserRecord {
            id: None,
            name: "Someone".to_string(),
            email: "someone@x.com".to_string(),
            avatar_url: None,
            role,
            moderator_for: None,
        }))
    }

    #[test]
    fn anonymous_visitors_never_see_protected_content() {
        let session = SessionRead::Anonymous;
        assert_eq!(authenticated_only(&session), GuardDecision::Redirect(LOGIN_ROUTE));
        for gate in [Gate::Admin, Gate::Moderator, Gate::Member] {
            assert_eq!(
                evaluate(gate, &session, &RoleQuery::Pending),
                GuardDecision::Redirect(HOME_ROUTE)
            );
        }
    }

    #[test]
    fn unresolved_session_check_is_loading_everywhere() {
        let session = SessionRead::Pending;
        assert_eq!(authenticated_only(&session), GuardDecision::Loading);
        assert_eq!(evaluate(Gate::Admin, &session, &RoleQuery::Pending), GuardDecision::Loading);
    }

    #[test]
    fn authenticated_gate_renders_for_any_principal() {
        assert_eq!(authenticated_only(&authenticated()), GuardDecision::Render);
    }

    #[test]
    fn pending_role_query_never_redirects() {
        // The no-flash-redirect rule: a slow role fetch shows loading.
        let session = authenticated();
        for gate in [Gate::Admin, Gate::Moderator, Gate::Member] {
            assert_eq!(evaluate(gate, &session, &RoleQuery::Pending), GuardDecision::Loading);
        }
    }

    #[test]
    fn member_is_turned_away_from_admin_and_moderator_gates() {
        let session = authenticated();
        let role = resolved(Role::Member);
        assert_eq!(evaluate(Gate::Admin, &session, &role), GuardDecision::Redirect(HOME_ROUTE));
        assert_eq!(evaluate(Gate::Moderator, &session, &role), GuardDecision::Redirect(HOME_ROUTE));
        assert_eq!(evaluate(Gate::Member, &session, &role), GuardDecision::Render);
    }

    #[test]
    fn roles_do_not_imply_each_other() {
        // Admin is not a super-moderator: matches are exact.
        let session = authenticated();
        assert_eq!(
            evaluate(Gate::Moderator, &session, &resolved(Role::Admin)),
            GuardDecision::Redirect(HOME_ROUTE)
        );
        assert_eq!(
            evaluate(Gate::Member, &session, &resolved(Role::Admin)),
            GuardDecision::Redirect(HOME_ROUTE)
        );
        assert_eq!(evaluate(Gate::Admin, &session, &resolved(Role::Admin)), GuardDecision::Render);
    }

    #[test]
    fn absent_record_means_insufficient_privilege() {
        let session = authenticated();
        let role = RoleQuery::Resolved(RoleLookup::NotFound);
        assert_eq!(evaluate(Gate::Member, &session, &role), GuardDecision::Redirect(HOME_ROUTE));
    }

    #[test]
    fn failed_lookup_redirects_rather_than_erroring() {
        let session = authenticated();
        assert_eq!(
            evaluate(Gate::Admin, &session, &RoleQuery::Failed),
            GuardDecision::Redirect(HOME_ROUTE)
        );
    }
}
