//! Authentication module: who is logged in and who may see what.
//!
//! This module provides:
//! - `SessionStore`: durable slot for the credential and user profile, with
//!   memory, file and OS-keyring backends
//! - `SessionGuard`: the gate in front of protected routes
//! - `flow`: login, registration and logout
//!
//! Sessions never expire client-side; the server's 422 answer is the only
//! signal that a stored credential has gone stale.

pub mod credentials;
pub mod flow;
pub mod guard;
pub mod session;
pub mod store;

pub use credentials::{KeyringSessionStore, KeyringSlots, SecretSlots};
pub use flow::LoginOutcome;
pub use guard::{Guarded, SessionGuard};
pub use session::{Credential, SessionState, UserProfile};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
