use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use storefront_api_base::Configuration;
use thiserror::Error;

const REFRESH_PATH: &str = "/auth/token/refresh/";

#[derive(Serialize, Debug)]
struct RenewTokenRequest<'a> {
    refresh: &'a str,
}

/// Token pair returned by the refresh endpoint. The refresh token is only present when the server
/// rotates it.
#[derive(Deserialize, Debug)]
pub struct RenewTokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Why a renewal attempt failed. All variants end the session.
#[derive(Debug, Clone, Error)]
pub enum RenewError {
    #[error("No refresh token available")]
    MissingRefreshToken,
    #[error("Token refresh was rejected with status {0}")]
    Rejected(StatusCode),
    #[error("Failed to reach the token endpoint: {0}")]
    Network(String),
    #[error("Invalid token refresh response: {0}")]
    InvalidResponse(String),
    #[error("The session was cleared while renewing")]
    SessionCleared,
}

/// Exchange `refresh_token` for a new access token.
///
/// `config` must not carry the session middleware, otherwise a rejected refresh would try to
/// renew itself.
pub async fn renew_access_token(
    config: &Configuration,
    refresh_token: &str,
) -> Result<RenewTokenResponse, RenewError> {
    let response = config
        .client
        .post(config.url(REFRESH_PATH))
        .json(&RenewTokenRequest {
            refresh: refresh_token,
        })
        .send()
        .await
        .map_err(|e| RenewError::Network(storefront_api_base::Error::from(e).to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RenewError::Rejected(status));
    }

    response
        .json::<RenewTokenResponse>()
        .await
        .map_err(|e| RenewError::InvalidResponse(e.to_string()))
}
