use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use storefront_api_base::{AuthRequired, Configuration};
use thiserror::Error;
use tracing::instrument;

use super::middleware::SessionExpiredError;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server couldn't be reached or the transfer failed midway.
    #[error(transparent)]
    Network(#[from] storefront_api_base::Error),
    /// The server answered with a non-success status.
    #[error("Request failed with status {status}: {body}")]
    Http {
        #[allow(missing_docs)]
        status: StatusCode,
        /// Response body, parsed as JSON when possible, otherwise the raw text as a string.
        body: Value,
    },
    /// The access token was rejected and could not be renewed. The session has been cleared.
    #[error("The session has expired, please log in again")]
    SessionExpired,
    /// A success response didn't have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status of an [`FetchError::Http`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest_middleware::Error> for FetchError {
    fn from(e: reqwest_middleware::Error) -> Self {
        if let reqwest_middleware::Error::Middleware(inner) = &e {
            if inner.downcast_ref::<SessionExpiredError>().is_some() {
                return FetchError::SessionExpired;
            }
        }
        FetchError::Network(e.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.into())
    }
}

/// Issues JSON requests against the storefront API.
///
/// Authenticated calls are marked with [`AuthRequired::Bearer`] and rely on the
/// [`SessionMiddleware`](super::SessionMiddleware) installed on the configuration's client for
/// token attachment and renewal.
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: Configuration,
}

impl Fetcher {
    #[allow(missing_docs)]
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    #[allow(missing_docs)]
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Perform an authenticated request.
    ///
    /// Resolves to `None` for `204 No Content` and empty success bodies.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, FetchError> {
        self.send(method, path, body, true).await
    }

    /// Perform a request without credentials, e.g. the login call.
    pub async fn request_public(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, FetchError> {
        self.send(method, path, body, false).await
    }

    /// Perform an authenticated request and decode the response into `T`. An empty body decodes
    /// from `null`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, FetchError> {
        let value = self.request(method, path, body).await?;
        Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
    }

    #[instrument(skip(self, body), fields(base_path = %self.config.base_path), err(level = "debug"))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Option<Value>, FetchError> {
        let mut request = self.config.client.request(method, self.config.url(path));
        if authenticated {
            request = request.with_extension(AuthRequired::Bearer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&content).unwrap_or(Value::String(content));
            return Err(FetchError::Http { status, body });
        }

        if status == StatusCode::NO_CONTENT || content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use storefront_test::start_api_mock;
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;

    #[tokio::test]
    async fn parses_json_response() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("GET"))
            .and(path("/cart/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))])
        .await;

        let value = Fetcher::new(config)
            .request(Method::GET, "/cart/", None)
            .await
            .unwrap();
        assert_eq!(value, Some(json!({ "items": [] })));
    }

    #[tokio::test]
    async fn no_content_resolves_to_none() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("POST"))
            .and(path("/cart/clear/"))
            .respond_with(ResponseTemplate::new(204))])
        .await;

        let value = Fetcher::new(config)
            .request(Method::POST, "/cart/clear/", None)
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn empty_success_body_resolves_to_none() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("DELETE"))
            .and(path("/favorites/7/"))
            .respond_with(ResponseTemplate::new(200))])
        .await;

        let value = Fetcher::new(config)
            .request(Method::DELETE, "/favorites/7/", None)
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn sends_json_body() {
        let (server, config) = start_api_mock(vec![Mock::given(method("POST"))
            .and(path("/cart/add_item/"))
            .and(body_json(json!({ "item_type": "product", "item_id": "7", "quantity": 1 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "items": [] })))
            .expect(1)])
        .await;

        Fetcher::new(config)
            .request(
                Method::POST,
                "/cart/add_item/",
                Some(&json!({ "item_type": "product", "item_id": "7", "quantity": 1 })),
            )
            .await
            .unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn error_status_carries_json_body() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("POST"))
            .and(path("/cart/update_item/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "quantity": ["Out of stock"] })),
            )])
        .await;

        let err = Fetcher::new(config)
            .request(Method::POST, "/cart/update_item/", Some(&json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        let FetchError::Http { body, .. } = err else {
            panic!("expected http error");
        };
        assert_eq!(body, json!({ "quantity": ["Out of stock"] }));
    }

    #[tokio::test]
    async fn error_status_keeps_raw_text_body() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("GET"))
            .and(path("/cart/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))])
        .await;

        let err = Fetcher::new(config)
            .request(Method::GET, "/cart/", None)
            .await
            .unwrap_err();

        let FetchError::Http { status, body } = err else {
            panic!("expected http error");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, Value::String("Internal Server Error".to_string()));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let (_server, config) = start_api_mock(vec![Mock::given(method("GET"))
            .and(path("/cart/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))])
        .await;

        let err = Fetcher::new(config)
            .request(Method::GET, "/cart/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn request_json_decodes_typed_response() {
        #[derive(Deserialize)]
        struct Profile {
            username: String,
        }

        let (_server, config) = start_api_mock(vec![Mock::given(method("GET"))
            .and(path("/auth/profile/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "ana" })))])
        .await;

        let profile: Profile = Fetcher::new(config)
            .request_json(Method::GET, "/auth/profile/", None)
            .await
            .unwrap();
        assert_eq!(profile.username, "ana");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let config = Configuration::new("http://127.0.0.1:1", reqwest::Client::new().into());

        let err = Fetcher::new(config)
            .request(Method::GET, "/cart/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
