//! Navigation model for the dashboard.
//!
//! A `Router` keeps an in-memory history of `Location`s. A location may carry
//! a `NavigationIntent`: the path a user tried to open before being sent to
//! the login page. The intent lives only in router state and is consumed once
//! by the login flow.

use tracing::debug;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Known routes of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Sentiment,
    Keywords,
    Summary,
    Similarity,
    History,
    Stats,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::Dashboard,
        Route::Sentiment,
        Route::Keywords,
        Route::Summary,
        Route::Similarity,
        Route::History,
        Route::Stats,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => LOGIN_PATH,
            Route::Register => REGISTER_PATH,
            Route::Dashboard => DEFAULT_LANDING_PATH,
            Route::Sentiment => "/dashboard/sentiment",
            Route::Keywords => "/dashboard/keywords",
            Route::Summary => "/dashboard/summary",
            Route::Similarity => "/dashboard/similarity",
            Route::History => "/dashboard/history",
            Route::Stats => "/dashboard/stats",
        }
    }

    /// Match a path (query string and trailing slash ignored).
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Everything under `/dashboard` sits behind the session guard.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Root | Route::Login | Route::Register)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Root => "Home",
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
            Route::Sentiment => "Sentiment Analysis",
            Route::Keywords => "Keyword Extraction",
            Route::Summary => "Summary Generation",
            Route::Similarity => "Similarity Calculation",
            Route::History => "History",
            Route::Stats => "Statistics",
        }
    }
}

/// Where the user was headed before a forced login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub intent: Option<NavigationIntent>,
}

impl Location {
    fn new(pathname: impl Into<String>, intent: Option<NavigationIntent>) -> Self {
        Self {
            pathname: pathname.into(),
            intent,
        }
    }

    pub fn route(&self) -> Option<Route> {
        Route::parse(&self.pathname)
    }
}

pub struct Router {
    history: Vec<Location>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Root.path())
    }
}

impl Router {
    pub fn new(initial: &str) -> Self {
        Self {
            history: vec![Location::new(Self::resolve(initial), None)],
        }
    }

    /// `/` is an index redirect to the dashboard.
    fn resolve(path: &str) -> &str {
        if Route::parse(path) == Some(Route::Root) {
            DEFAULT_LANDING_PATH
        } else {
            path
        }
    }

    pub fn current(&self) -> &Location {
        // history always holds at least the initial location
        &self.history[self.history.len() - 1]
    }

    pub fn current_route(&self) -> Option<Route> {
        self.current().route()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn push(&mut self, path: &str) {
        let path = Self::resolve(path);
        debug!(path, "Navigate (push)");
        self.history.push(Location::new(path, None));
    }

    /// Replace the current entry so it does not stay in back-history.
    pub fn replace(&mut self, path: &str, intent: Option<NavigationIntent>) {
        let path = Self::resolve(path);
        debug!(path, from = ?intent.as_ref().map(|i| i.from.as_str()), "Navigate (replace)");
        let last = self.history.len() - 1;
        self.history[last] = Location::new(path, intent);
    }

    /// Pop one entry. Returns false when already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.history.len() > 1 {
            self.history.pop();
            true
        } else {
            false
        }
    }

    /// Consume the intent attached to the current location, if any.
    pub fn take_intent(&mut self) -> Option<NavigationIntent> {
        let last = self.history.len() - 1;
        self.history[last].intent.take()
    }

    /// Path to land on after login: the recorded intent or the dashboard.
    pub fn take_return_path(&mut self) -> String {
        self.take_intent()
            .map(|intent| intent.from)
            .filter(|from| !from.is_empty())
            .unwrap_or_else(|| DEFAULT_LANDING_PATH.to_string())
    }
}
