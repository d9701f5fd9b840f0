use reqwest::Method;
use serde::{Deserialize, Serialize};
use storefront_state::register_setting_key;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Client, NotAuthenticatedError, http::FetchError};

const PROFILE_PATH: &str = "/auth/profile/";

register_setting_key!(pub(crate) const USER_PROFILE: UserProfile = "user_profile");

/// The authenticated user's account details.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial update of a [`UserProfile`]. Only the fields that are set are sent.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    NotAuthenticated(#[from] NotAuthenticatedError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e).into()
    }
}

pub(crate) async fn get_profile(client: &Client) -> Result<UserProfile, ProfileError> {
    if !client.session().is_authenticated() {
        return Err(NotAuthenticatedError.into());
    }

    let profile: UserProfile = client
        .fetcher()
        .request_json(Method::GET, PROFILE_PATH, None)
        .await?;
    cache_profile(client, &profile).await;
    Ok(profile)
}

pub(crate) async fn update_profile(
    client: &Client,
    update: &ProfileUpdate,
) -> Result<UserProfile, ProfileError> {
    if !client.session().is_authenticated() {
        return Err(NotAuthenticatedError.into());
    }

    let body = serde_json::to_value(update)?;
    let profile: UserProfile = client
        .fetcher()
        .request_json(Method::PATCH, PROFILE_PATH, Some(&body))
        .await?;
    cache_profile(client, &profile).await;
    debug!("Profile updated");
    Ok(profile)
}

pub(crate) async fn cached_profile(client: &Client) -> Option<UserProfile> {
    client
        .setting(USER_PROFILE)
        .get()
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to load cached profile: {e}");
            None
        })
}

pub(crate) async fn cache_profile(client: &Client, profile: &UserProfile) {
    if let Err(e) = client.setting(USER_PROFILE).update(profile.clone()).await {
        warn!("Failed to cache profile: {e}");
    }
}

pub(crate) async fn clear_cached_profile(client: &Client) {
    if let Err(e) = client.setting(USER_PROFILE).delete().await {
        warn!("Failed to clear cached profile: {e}");
    }
}
