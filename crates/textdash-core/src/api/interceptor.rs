//! Request/response interceptors run by `ApiClient` around every call.
//!
//! Request interceptors run in order just before dispatch and may edit the
//! outgoing request. Response interceptors run in order on every response,
//! success or failure, before the client decides what to hand back.

use std::sync::Arc;

use reqwest::{header, Request, StatusCode, Url};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::SessionStore;

/// Status the service answers with when it cannot decode the bearer token
pub const INVALIDATION_STATUS: StatusCode = StatusCode::UNPROCESSABLE_ENTITY;

/// Endpoints whose failures say nothing about an existing session
pub const AUTH_ENDPOINTS: [&str; 2] = ["/api/login", "/api/register"];

pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut Request) -> Result<(), ApiError>;
}

pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, url: &Url, status: StatusCode);
}

/// Ordered interceptor lists.
#[derive(Clone, Default)]
pub struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer attachment plus invalidation handling, both backed by `store`.
    pub fn session(store: Arc<dyn SessionStore>) -> Self {
        Self::new()
            .with_request(BearerAuth::new(store.clone()))
            .with_response(InvalidateOnStatus::new(store))
    }

    pub fn with_request(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Arc::new(interceptor));
        self
    }

    pub fn with_response(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Arc::new(interceptor));
        self
    }

    pub fn apply_request(&self, request: &mut Request) -> Result<(), ApiError> {
        for interceptor in &self.request {
            interceptor.on_request(request)?;
        }
        Ok(())
    }

    pub fn apply_response(&self, url: &Url, status: StatusCode) {
        for interceptor in &self.response {
            interceptor.on_response(url, status);
        }
    }
}

// ============================================================================
// Bearer credential attachment
// ============================================================================

/// Sets `Authorization: Bearer <token>` from the store at dispatch time.
pub struct BearerAuth {
    store: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
        let credential = match self.store.credential() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential, sending request without it");
                None
            }
        };

        if let Some(credential) = credential {
            let value = header::HeaderValue::from_str(&credential.bearer())
                .map_err(|e| ApiError::InvalidResponse(format!("Stored credential is not a valid header: {}", e)))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }
}

// ============================================================================
// Invalidation handling
// ============================================================================

/// Clears the stored session when a non-auth endpoint answers with the
/// invalidation status. Does not navigate.
pub struct InvalidateOnStatus {
    store: Arc<dyn SessionStore>,
    status: StatusCode,
    exempt: Vec<String>,
}

impl InvalidateOnStatus {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            status: INVALIDATION_STATUS,
            exempt: AUTH_ENDPOINTS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Exempt endpoints match at the end of the path so a base URL mounted
    /// under a prefix (`http://host/svc`) still exempts `/svc/api/login`.
    /// Entries start with `/`, so matches stay on a segment boundary.
    fn is_exempt(&self, url: &Url) -> bool {
        let path = url.path().trim_end_matches('/');
        self.exempt.iter().any(|exempt| path.ends_with(exempt.as_str()))
    }
}

impl ResponseInterceptor for InvalidateOnStatus {
    fn on_response(&self, url: &Url, status: StatusCode) {
        if status != self.status || self.is_exempt(url) {
            return;
        }

        debug!(path = url.path(), status = status.as_u16(), "Credential rejected, clearing session");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session after invalidation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, MemorySessionStore, UserProfile};
    use reqwest::{Client, Method};

    const BASE: &str = "http://localhost:5001";

    fn signed_in(token: &str) -> Arc<dyn SessionStore> {
        let credential = Credential::new(token).expect("non-empty token");
        Arc::new(MemorySessionStore::with_session(credential, UserProfile::new("alice")))
    }

    fn request(path: &str) -> Request {
        Client::new()
            .request(Method::GET, format!("{}{}", BASE, path))
            .build()
            .expect("build request")
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("{}{}", BASE, path)).expect("parse url")
    }

    #[test]
    fn test_bearer_attached_when_credential_present() {
        let interceptors = Interceptors::session(signed_in("tok123"));
        let mut req = request("/api/stats");
        interceptors.apply_request(&mut req).expect("apply");

        assert_eq!(
            req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer tok123")
        );
    }

    #[test]
    fn test_no_header_without_credential() {
        let interceptors = Interceptors::session(Arc::new(MemorySessionStore::new()));
        let mut req = request("/api/stats");
        interceptors.apply_request(&mut req).expect("apply");

        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_header_value_rejects_request() {
        let interceptors = Interceptors::session(signed_in("bad\ntoken"));
        let mut req = request("/api/stats");
        assert!(interceptors.apply_request(&mut req).is_err());
    }

    #[test]
    fn test_invalidation_clears_session() {
        let store = signed_in("expired");
        let interceptors = Interceptors::session(store.clone());

        interceptors.apply_response(&url("/api/keywords"), StatusCode::UNPROCESSABLE_ENTITY);

        assert!(store.credential().expect("read").is_none());
        assert!(store.profile().expect("read").is_none());
    }

    #[test]
    fn test_auth_endpoints_are_exempt() {
        let store = signed_in("tok123");
        let interceptors = Interceptors::session(store.clone());

        interceptors.apply_response(&url("/api/login"), StatusCode::UNPROCESSABLE_ENTITY);
        interceptors.apply_response(&url("/api/register/"), StatusCode::UNPROCESSABLE_ENTITY);

        assert!(store.has_credential());
        assert!(store.profile().expect("read").is_some());
    }

    #[test]
    fn test_auth_endpoints_exempt_under_base_prefix() {
        let store = signed_in("tok123");
        let interceptors = Interceptors::session(store.clone());

        for path in ["http://host/svc/api/login", "http://host/svc/v2/api/register/"] {
            let url = Url::parse(path).expect("parse url");
            interceptors.apply_response(&url, StatusCode::UNPROCESSABLE_ENTITY);
        }
        assert!(store.has_credential());

        interceptors.apply_response(&url("/api/login-history"), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!store.has_credential());
    }

    #[test]
    fn test_other_statuses_leave_session() {
        let store = signed_in("tok123");
        let interceptors = Interceptors::session(store.clone());

        for status in [StatusCode::OK, StatusCode::UNAUTHORIZED, StatusCode::INTERNAL_SERVER_ERROR] {
            interceptors.apply_response(&url("/api/stats"), status);
        }
        assert!(store.has_credential());
    }

    #[test]
    fn test_invalidation_on_empty_store_is_noop() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let interceptors = Interceptors::session(store.clone());

        interceptors.apply_response(&url("/api/history"), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!store.has_credential());
    }

    #[test]
    fn test_request_interceptors_run_in_order() {
        struct SetHeader(&'static str);

        impl RequestInterceptor for SetHeader {
            fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
                request
                    .headers_mut()
                    .insert("x-order", header::HeaderValue::from_static(self.0));
                Ok(())
            }
        }

        let interceptors = Interceptors::new()
            .with_request(SetHeader("first"))
            .with_request(SetHeader("second"));
        let mut req = request("/api/stats");
        interceptors.apply_request(&mut req).expect("apply");

        assert_eq!(req.headers().get("x-order").and_then(|v| v.to_str().ok()), Some("second"));
    }
}
