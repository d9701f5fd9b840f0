use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use super::{
    profile::{UserProfile, cache_profile, clear_cached_profile},
    session::Session,
};
use crate::{Client, http::FetchError};

const LOGIN_PATH: &str = "/auth/login/";

#[derive(Deserialize, Debug)]
struct LoginResponse {
    access: String,
    refresh: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// The server refused the credentials. `detail` is the server's explanation.
    #[error("Invalid username or password")]
    InvalidCredentials { detail: Value },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub(crate) async fn login(
    client: &Client,
    username: &str,
    password: &str,
) -> Result<Option<UserProfile>, LoginError> {
    let body = json!({ "username": username, "password": password });

    let response = match client
        .fetcher()
        .request_public(Method::POST, LOGIN_PATH, Some(&body))
        .await
    {
        Err(FetchError::Http { status, body })
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED =>
        {
            return Err(LoginError::InvalidCredentials { detail: body });
        }
        result => result?,
    };

    let response: LoginResponse =
        serde_json::from_value(response.unwrap_or(Value::Null)).map_err(FetchError::from)?;

    client
        .session()
        .set(Session::new(response.access, response.refresh))
        .await;
    match &response.user {
        Some(user) => cache_profile(client, user).await,
        None => clear_cached_profile(client).await,
    }

    info!(username, "Logged in");
    Ok(response.user)
}

pub(crate) async fn logout(client: &Client) {
    client.session().clear().await;
    clear_cached_profile(client).await;
    info!("Logged out");
}
