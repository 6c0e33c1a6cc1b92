//! REST API client module for the text-analysis service.
//!
//! This module provides the `ApiClient` for submitting text to the analysis
//! endpoints and reading history and statistics.
//!
//! The service uses JWT bearer authentication. The token is read from the
//! session store on every request by the interceptor pipeline in
//! `interceptor`.

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{
    BearerAuth, InvalidateOnStatus, Interceptors, RequestInterceptor, ResponseInterceptor,
    AUTH_ENDPOINTS, INVALIDATION_STATUS,
};
