//! # Navigation Module
//!
//! Dashboard route table, route authorization and the navigation menu
//! offered to each privilege level.

use serde::Serialize;

use crate::auth::SessionState;

/// Public route unauthenticated visitors are sent to
pub const FALLBACK_PATH: &str = "/";

/// Where authenticated visitors land after login
pub const LANDING_PATH: &str = "/gifts";

/// Who may open a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Gifts,
    Accounts,
    History,
    AdminUsers,
    AdminAccounts,
    AdminHistory,
    Logout,
}

impl Route {
    /// Menu order
    pub const ALL: [Route; 8] = [
        Route::Login,
        Route::Gifts,
        Route::AdminUsers,
        Route::AdminAccounts,
        Route::Accounts,
        Route::AdminHistory,
        Route::History,
        Route::Logout,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Gifts => "/gifts",
            Route::Accounts => "/fortniteaccounts",
            Route::History => "/transactionshistory",
            Route::AdminUsers => "/usersadminaccounts",
            Route::AdminAccounts => "/fortniteadminaccounts",
            Route::AdminHistory => "/transactionsadminhistory",
            Route::Logout => "/logout",
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Route::Login => Access::Public,
            Route::AdminUsers | Route::AdminAccounts | Route::AdminHistory => Access::AdminOnly,
            Route::Gifts | Route::Accounts | Route::History | Route::Logout => Access::Protected,
        }
    }

    /// Menu label; the login route is never listed
    pub const fn label(self) -> Option<&'static str> {
        match self {
            Route::Login => None,
            Route::Gifts => Some("Gifts"),
            Route::Accounts => Some("Fortnite Accounts"),
            Route::History => Some("History"),
            Route::AdminUsers => Some("Users (Admin)"),
            Route::AdminAccounts => Some("Fortnite Accounts (Admin)"),
            Route::AdminHistory => Some("History (Admin)"),
            Route::Logout => Some("Log Out"),
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }
}

/// Outcome of authorizing a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
    /// Neutral placeholder instead of a redirect (pending session, or a
    /// redirect that would point at the current route)
    Placeholder,
    Forbidden,
}

/// Decide whether `path` may be rendered for `session`.
///
/// Unknown paths are treated as protected.
pub fn authorize(path: &str, session: &SessionState) -> Decision {
    if session.is_loading() {
        return Decision::Placeholder;
    }

    let access = Route::from_path(path)
        .map(Route::access)
        .unwrap_or(Access::Protected);

    match access {
        Access::Public if session.is_authenticated() => redirect_unless_here(path, LANDING_PATH),
        Access::Public => Decision::Allow,
        _ if !session.is_authenticated() => redirect_unless_here(path, FALLBACK_PATH),
        Access::AdminOnly if !session.is_admin() => Decision::Forbidden,
        _ => Decision::Allow,
    }
}

fn redirect_unless_here(path: &str, target: &'static str) -> Decision {
    if Route::from_path(path).map(Route::path) == Some(target) {
        Decision::Placeholder
    } else {
        Decision::Redirect(target)
    }
}

/// One entry of the dashboard menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

/// Menu entries for a session; admin routes are only offered to admins
/// and nothing is offered without a session.
pub fn navigation(session: &SessionState) -> Vec<NavItem> {
    if !session.is_authenticated() {
        return Vec::new();
    }

    Route::ALL
        .into_iter()
        .filter(|route| match route.access() {
            Access::Public => false,
            Access::Protected => true,
            Access::AdminOnly => session.is_admin(),
        })
        .filter_map(|route| {
            route.label().map(|name| NavItem {
                name,
                href: route.path(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    const ADMIN: SessionState = SessionState::authenticated(Role::Admin);
    const USER: SessionState = SessionState::authenticated(Role::User);
    const ANON: SessionState = SessionState::UNAUTHENTICATED;

    #[test]
    fn anonymous_visitors_go_to_login() {
        assert_eq!(authorize("/gifts", &ANON), Decision::Redirect("/"));
        assert_eq!(authorize("/usersadminaccounts", &ANON), Decision::Redirect("/"));
        assert_eq!(authorize("/", &ANON), Decision::Allow);
    }

    #[test]
    fn no_redirect_loop_on_fallback() {
        for path in Route::ALL.map(Route::path) {
            assert_ne!(authorize(path, &ANON), Decision::Redirect(path));
        }
        assert_eq!(redirect_unless_here("/", FALLBACK_PATH), Decision::Placeholder);
    }

    #[test]
    fn admin_routes_need_admin_even_by_direct_navigation() {
        for route in [Route::AdminUsers, Route::AdminAccounts, Route::AdminHistory] {
            assert_eq!(authorize(route.path(), &USER), Decision::Forbidden);
            assert_eq!(authorize(route.path(), &ADMIN), Decision::Allow);
        }
    }

    #[test]
    fn signed_in_visitors_skip_login() {
        assert_eq!(authorize("/", &USER), Decision::Redirect("/gifts"));
        assert_eq!(authorize("/gifts", &USER), Decision::Allow);
    }

    #[test]
    fn pending_sessions_render_placeholder() {
        assert_eq!(authorize("/gifts", &SessionState::LOADING), Decision::Placeholder);
    }

    #[test]
    fn unknown_paths_fail_closed() {
        assert_eq!(authorize("/secret", &ANON), Decision::Redirect("/"));
        assert_eq!(authorize("/secret", &USER), Decision::Allow);
    }

    #[test]
    fn trailing_slashes_match_routes() {
        assert_eq!(Route::from_path("/gifts/"), Some(Route::Gifts));
        assert_eq!(Route::from_path(""), Some(Route::Login));
    }

    #[test]
    fn menu_hides_admin_entries_from_users() {
        let user_menu = navigation(&USER);
        assert!(user_menu.iter().all(|item| !item.href.contains("admin")));
        assert_eq!(user_menu.len(), 4);

        let admin_menu = navigation(&ADMIN);
        assert_eq!(admin_menu.len(), 7);
        assert_eq!(admin_menu[0].href, "/gifts");

        assert!(navigation(&ANON).is_empty());
    }
}
