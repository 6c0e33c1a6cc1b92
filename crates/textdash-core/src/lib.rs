//! Core library for textdash.
//!
//! Holds everything the dashboard front ends share:
//!
//! - `auth`: session store, session guard, login/logout flow
//! - `api`: the authenticated HTTP client and its interceptor pipeline
//! - `router`: navigation model with return-path state
//! - `models`: typed request/response shapes of the analysis service
//! - `config`: base URL resolution and the persisted user config

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, SessionGuard, SessionState, SessionStore, UserProfile};
pub use config::{ApiConfig, Config};
pub use router::{NavigationIntent, Route, Router};
