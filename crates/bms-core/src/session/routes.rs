use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Views the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    ApplyLoan,
    Account,
}

/// Where a signed-in user lands when a guest-only route is requested.
pub const DEFAULT_LANDING: Route = Route::Dashboard;

/// Where everybody else is sent.
pub const LOGIN_ENTRY: Route = Route::Login;

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::ApplyLoan,
        Route::Account,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::ApplyLoan => "/apply-loan",
            Route::Account => "/account",
        }
    }

    /// Parse a location path; query strings, fragments and a trailing slash are ignored.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(&['?', '#'][..]).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Requires an authenticated session.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Dashboard | Route::ApplyLoan | Route::Account)
    }

    /// Only meaningful while signed out.
    pub fn is_guest_only(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::from_path(s).ok_or_else(|| format!("unknown route '{s}'"))
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "route", rename_all = "lowercase")]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

/// Decide whether `route` renders or redirects. Pure; no network access.
pub fn resolve(route: Route, authenticated: bool) -> RouteDecision {
    match route {
        Route::Root if authenticated => RouteDecision::Redirect(DEFAULT_LANDING),
        Route::Root => RouteDecision::Redirect(LOGIN_ENTRY),
        r if r.is_protected() && !authenticated => RouteDecision::Redirect(LOGIN_ENTRY),
        r if r.is_guest_only() && authenticated => RouteDecision::Redirect(DEFAULT_LANDING),
        r => RouteDecision::Render(r),
    }
}

pub fn is_reachable(route: Route, authenticated: bool) -> bool {
    matches!(resolve(route, authenticated), RouteDecision::Render(_))
}
