//! Route guard predicates.
//!
//! Pure functions over session facts; `Router` applies them on every
//! navigation and the gateway uses `login_redirect` when a refresh fails.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::models::User;

pub const LOGIN_PATH: &str = "/auth/login";

/// Query parameter carrying the post-login return target
pub const REDIRECT_PARAM: &str = "redirectUrl";

/// Where a successful login lands when no return target is given
pub const DEFAULT_LANDING: &str = "/dashboard";

/// Characters escaped in a `redirectUrl` value. `/` stays literal.
const REDIRECT_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Access requirement of a route subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Requires an authenticated session
    Protected,
    /// Login area; optionally closed to authenticated users
    PublicOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Send authenticated users away from `PublicOnly` routes. Off by default.
    pub redirect_authenticated_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Decide whether `requested` (path plus optional query) may be entered.
pub fn evaluate(
    access: RouteAccess,
    authenticated: bool,
    requested: &str,
    policy: &GuardPolicy,
) -> GuardDecision {
    match access {
        RouteAccess::Protected if !authenticated => GuardDecision::Redirect(login_redirect(requested)),
        RouteAccess::PublicOnly if authenticated => match &policy.redirect_authenticated_to {
            Some(landing) => GuardDecision::Redirect(landing.clone()),
            None => GuardDecision::Allow,
        },
        _ => GuardDecision::Allow,
    }
}

/// `/auth/login?redirectUrl=<return_to>`
pub fn login_redirect(return_to: &str) -> String {
    format!(
        "{}?{}={}",
        LOGIN_PATH,
        REDIRECT_PARAM,
        utf8_percent_encode(return_to, REDIRECT_VALUE)
    )
}

/// Split a location into its path and optional query, dropping any fragment
pub fn split_location(location: &str) -> (&str, Option<&str>) {
    let without_fragment = location.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

/// Extract a safe `redirectUrl` from a login location, if one is present
pub fn redirect_target(location: &str) -> Option<String> {
    let (_, query) = split_location(location);
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REDIRECT_PARAM)
        .and_then(|(_, value)| sanitize_redirect(&value).map(str::to_string))
}

/// Only local absolute paths are followed after login; `//host` and
/// `/\host` would leave the site.
pub fn sanitize_redirect(target: &str) -> Option<&str> {
    let target = target.trim();
    let local = target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\");
    local.then_some(target)
}

/// Permission check used by routes and components.
///
/// The elevated role passes every check; no user passes none.
pub fn has_permission(user: Option<&User>, permission: &str, elevated_role: &str) -> bool {
    let Some(user) = user else {
        return false;
    };
    if !elevated_role.is_empty() && user.role == elevated_role {
        return true;
    }
    user.permissions.contains(permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, permissions: &[&str]) -> User {
        let json = serde_json::json!({"id": "1", "role": role, "permissions": permissions});
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_protected_redirects_anonymous() {
        let decision = evaluate(
            RouteAccess::Protected,
            false,
            "/dashboard",
            &GuardPolicy::default(),
        );
        assert_eq!(
            decision,
            GuardDecision::Redirect("/auth/login?redirectUrl=/dashboard".to_string())
        );
    }

    #[test]
    fn test_protected_allows_authenticated() {
        let decision = evaluate(RouteAccess::Protected, true, "/dashboard", &GuardPolicy::default());
        assert_eq!(decision, GuardDecision::Allow);
    }

    #[test]
    fn test_public_always_allowed() {
        for authenticated in [true, false] {
            assert_eq!(
                evaluate(RouteAccess::Public, authenticated, "/", &GuardPolicy::default()),
                GuardDecision::Allow
            );
        }
    }

    #[test]
    fn test_public_only_redirect_is_opt_in() {
        assert_eq!(
            evaluate(RouteAccess::PublicOnly, true, "/auth/login", &GuardPolicy::default()),
            GuardDecision::Allow
        );

        let policy = GuardPolicy {
            redirect_authenticated_to: Some("/dashboard".to_string()),
        };
        assert_eq!(
            evaluate(RouteAccess::PublicOnly, true, "/auth/login", &policy),
            GuardDecision::Redirect("/dashboard".to_string())
        );
        assert_eq!(
            evaluate(RouteAccess::PublicOnly, false, "/auth/login", &policy),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_login_redirect_encodes_query_delimiters() {
        assert_eq!(
            login_redirect("/dashboard?tab=orders&page=2"),
            "/auth/login?redirectUrl=/dashboard%3Ftab%3Dorders%26page%3D2"
        );
    }

    #[test]
    fn test_redirect_target_roundtrip() {
        let location = login_redirect("/dashboard?tab=orders&page=2");
        assert_eq!(
            redirect_target(&location).as_deref(),
            Some("/dashboard?tab=orders&page=2")
        );
        assert_eq!(redirect_target("/auth/login"), None);
        assert_eq!(redirect_target("/auth/login?redirectUrl="), None);
    }

    #[test]
    fn test_redirect_target_rejects_offsite() {
        assert_eq!(redirect_target("/auth/login?redirectUrl=https://evil.example"), None);
        assert_eq!(redirect_target("/auth/login?redirectUrl=//evil.example"), None);
        assert_eq!(sanitize_redirect("/\\evil.example"), None);
        assert_eq!(sanitize_redirect("/dashboard"), Some("/dashboard"));
    }

    #[test]
    fn test_split_location() {
        assert_eq!(split_location("/dashboard"), ("/dashboard", None));
        assert_eq!(split_location("/a?b=1#frag"), ("/a", Some("b=1")));
        assert_eq!(split_location("/a#frag"), ("/a", None));
    }

    #[test]
    fn test_has_permission_without_user() {
        assert!(!has_permission(None, "orders:read", "super_admin"));
        assert!(!has_permission(None, "", "super_admin"));
    }

    #[test]
    fn test_has_permission_elevated_role() {
        let admin = user("super_admin", &[]);
        for permission in ["orders:read", "anything", ""] {
            assert!(has_permission(Some(&admin), permission, "super_admin"));
        }
    }

    #[test]
    fn test_has_permission_exact_membership() {
        let baker = user("user", &["orders:read"]);
        assert!(has_permission(Some(&baker), "orders:read", "super_admin"));
        assert!(!has_permission(Some(&baker), "orders", "super_admin"));
        assert!(!has_permission(Some(&baker), "orders:read:all", "super_admin"));
    }

    #[test]
    fn test_empty_elevated_role_grants_nothing_extra() {
        let nobody = user("", &[]);
        assert!(!has_permission(Some(&nobody), "orders:read", ""));
    }
}
