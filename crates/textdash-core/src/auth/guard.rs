//! Gate in front of every protected route.
//!
//! The guard only checks that a credential is stored. Whether the server
//! still accepts it is learned later, when the API client sees a 422 and
//! clears the store; the next guard check then redirects.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{SessionState, SessionStore};
use crate::router::{NavigationIntent, Router, LOGIN_PATH};

/// Result of rendering through the guard.
#[derive(Debug, PartialEq)]
pub enum Guarded<V> {
    /// Check not done yet; show a non-interactive loading indicator.
    Loading,
    /// Authenticated; the protected view.
    Protected(V),
    /// Unauthenticated; the router was sent to the login page.
    Redirected,
}

impl<V> Guarded<V> {
    pub fn into_view(self) -> Option<V> {
        match self {
            Guarded::Protected(view) => Some(view),
            _ => None,
        }
    }
}

pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    state: SessionState,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: SessionState::Unknown,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// One-time credential check. Later calls on the same guard keep the
    /// first answer.
    pub fn on_mount(&mut self) -> SessionState {
        if self.state != SessionState::Unknown {
            return self.state;
        }

        let credential = match self.store.credential() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        };
        self.state = SessionState::from_credential(credential.as_ref());
        debug!(state = ?self.state, "Session checked");
        self.state
    }

    /// Render the protected view, or redirect to login remembering the
    /// current path. `view` is only invoked when authenticated. Rendering
    /// again after the redirect leaves the stored intent alone.
    pub fn render<V>(&self, router: &mut Router, view: impl FnOnce() -> V) -> Guarded<V> {
        match self.state {
            SessionState::Unknown => Guarded::Loading,
            SessionState::Authenticated => Guarded::Protected(view()),
            SessionState::Unauthenticated if router.current().pathname == LOGIN_PATH => Guarded::Redirected,
            SessionState::Unauthenticated => {
                let from = router.current().pathname.clone();
                debug!(from = %from, "Not authenticated, redirecting to login");
                router.replace(LOGIN_PATH, Some(NavigationIntent { from }));
                Guarded::Redirected
            }
        }
    }

    /// Mount and render in one step.
    pub fn activate<V>(&mut self, router: &mut Router, view: impl FnOnce() -> V) -> Guarded<V> {
        self.on_mount();
        self.render(router, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, MemorySessionStore, UserProfile};
    use crate::router::{Route, DEFAULT_LANDING_PATH};

    fn signed_in(token: &str) -> Arc<dyn SessionStore> {
        let credential = Credential::new(token).expect("non-empty token");
        Arc::new(MemorySessionStore::with_session(credential, UserProfile::new("alice")))
    }

    #[test]
    fn test_loading_before_mount_never_renders_view() {
        let guard = SessionGuard::new(signed_in("tok123"));
        let mut router = Router::new("/dashboard/stats");
        let mut rendered = false;

        let result = guard.render(&mut router, || rendered = true);

        assert_eq!(result, Guarded::Loading);
        assert!(!rendered);
        assert_eq!(router.current().pathname, "/dashboard/stats");
    }

    #[test]
    fn test_authenticated_renders_view() {
        let mut guard = SessionGuard::new(signed_in("tok123"));
        let mut router = Router::new("/dashboard");

        assert_eq!(guard.on_mount(), SessionState::Authenticated);
        let result = guard.render(&mut router, || "dashboard");

        assert_eq!(result, Guarded::Protected("dashboard"));
        assert_eq!(router.current_route(), Some(Route::Dashboard));
    }

    #[test]
    fn test_unauthenticated_redirects_with_intent() {
        let mut guard = SessionGuard::new(Arc::new(MemorySessionStore::new()));
        let mut router = Router::new(DEFAULT_LANDING_PATH);
        router.push("/dashboard/history");
        let depth = router.depth();
        let mut rendered = false;

        let result = guard.activate(&mut router, || rendered = true);

        assert_eq!(result, Guarded::Redirected);
        assert!(!rendered);
        assert_eq!(router.current().pathname, LOGIN_PATH);
        assert_eq!(router.depth(), depth);
        assert_eq!(
            router.current().intent,
            Some(NavigationIntent { from: "/dashboard/history".to_string() })
        );
    }

    #[test]
    fn test_render_after_redirect_keeps_intent() {
        let mut guard = SessionGuard::new(Arc::new(MemorySessionStore::new()));
        let mut router = Router::new(DEFAULT_LANDING_PATH);
        router.push("/dashboard/history");
        let depth = router.depth();

        assert_eq!(guard.activate(&mut router, || ()), Guarded::Redirected);
        assert_eq!(guard.render(&mut router, || ()), Guarded::Redirected);
        assert_eq!(guard.render(&mut router, || ()), Guarded::Redirected);

        assert_eq!(router.current().pathname, LOGIN_PATH);
        assert_eq!(router.depth(), depth);
        assert_eq!(router.take_return_path(), "/dashboard/history");
    }

    #[test]
    fn test_check_runs_once_per_mount() {
        let store = signed_in("tok123");
        let mut guard = SessionGuard::new(store.clone());
        assert_eq!(guard.on_mount(), SessionState::Authenticated);

        // Cleared after mount: this guard keeps its answer, a new one does not
        store.clear().expect("clear");
        assert_eq!(guard.on_mount(), SessionState::Authenticated);

        let mut fresh = SessionGuard::new(store);
        assert_eq!(fresh.on_mount(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_guard_does_not_touch_store() {
        let store = signed_in("tok123");
        let mut guard = SessionGuard::new(store.clone());
        let mut router = Router::new("/dashboard");
        guard.activate(&mut router, || ());

        assert_eq!(store.credential().expect("read").map(|c| c.as_str().to_string()), Some("tok123".to_string()));
        assert!(store.profile().expect("read").is_some());
    }
}
