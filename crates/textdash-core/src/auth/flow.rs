use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::{Credential, SessionStore, UserProfile};
use crate::api::{ApiClient, ApiError};
use crate::router::{Router, LOGIN_PATH};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    /// Where the router was sent after login.
    pub destination: String,
}

/// Log in and return the user to where they were headed.
///
/// On success the credential and profile are stored together, the pending
/// navigation intent is consumed, and the router replaces the login page with
/// the intended path (or the dashboard). On failure nothing is stored and the
/// router is left on the login page.
pub async fn login(
    api: &ApiClient,
    store: &dyn SessionStore,
    router: &mut Router,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let response = api.login(username, password).await?;

    let credential = Credential::new(response.access_token).ok_or_else(|| {
        anyhow!(ApiError::InvalidResponse(
            "Login response carried an empty access token".to_string()
        ))
    })?;
    store
        .set(&credential, &response.user)
        .context("Failed to save session")?;

    let destination = router.take_return_path();
    router.replace(&destination, None);
    info!(username = %response.user.username, destination = %destination, "Logged in");

    Ok(LoginOutcome {
        profile: response.user,
        destination,
    })
}

/// Create an account, then send the user to the login page.
pub async fn register(
    api: &ApiClient,
    router: &mut Router,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Option<String>> {
    let response = api.register(username, email, password).await?;
    info!(username, "Registered");
    router.push(LOGIN_PATH);
    Ok(response.message)
}

/// Forget the session and go to the login page.
pub fn logout(store: &dyn SessionStore, router: &mut Router) -> Result<()> {
    store.clear().context("Failed to clear session")?;
    router.push(LOGIN_PATH);
    info!("Logged out");
    Ok(())
}
