use std::sync::Arc;

use reqwest::StatusCode;
use reqwest_middleware::{Middleware, Next};
use storefront_api_base::AuthRequired;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{
    renew::RenewError,
    renewal::RenewalCoordinator,
    session::SessionStore,
};

/// Raised through the middleware chain when a rejected request could not be retried because the
/// session could not be renewed. The session has been cleared by the time this is observed.
#[derive(Debug, Error)]
#[error("The session has expired")]
pub struct SessionExpiredError(#[source] pub RenewError);

/// Attaches the session's bearer token to requests marked with [`AuthRequired::Bearer`].
///
/// A `401` response triggers a renewal through the shared [`RenewalCoordinator`] followed by
/// exactly one retry with the renewed token. The retry's response is returned as is, so a second
/// `401` reaches the caller unchanged.
#[derive(Debug, Clone)]
pub struct SessionMiddleware {
    session: Arc<SessionStore>,
    renewal: Arc<RenewalCoordinator>,
}

impl SessionMiddleware {
    #[allow(missing_docs)]
    pub fn new(session: Arc<SessionStore>, renewal: Arc<RenewalCoordinator>) -> Self {
        Self { session, renewal }
    }
}

fn attach_token(req: &mut reqwest::Request, token: &str) {
    match format!("Bearer {}", token).parse() {
        Ok(header_value) => {
            req.headers_mut()
                .insert(http::header::AUTHORIZATION, header_value);
        }
        Err(e) => {
            warn!("Failed to parse auth token for header: {e}");
        }
    }
}

#[async_trait::async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(
        &self,
        mut req: reqwest::Request,
        ext: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<reqwest::Response, reqwest_middleware::Error> {
        match ext.get::<AuthRequired>() {
            Some(AuthRequired::Bearer) => (),
            None => return next.run(req, ext).await,
        }

        let token = self.session.access_token();
        let Some(token) = token else {
            // Nothing to renew, a 401 here is the server's final answer.
            return next.run(req, ext).await;
        };
        attach_token(&mut req, &token);

        let retry = req.try_clone();
        let response = next.clone().run(req, ext).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut retry) = retry else {
            warn!("Request body can't be replayed, returning 401 without renewal");
            return Ok(response);
        };

        debug!(url = %response.url(), "Request rejected, renewing access token");
        let renewed = self
            .renewal
            .renew(Some(&token))
            .await
            .map_err(|e| reqwest_middleware::Error::middleware(SessionExpiredError(e)))?;

        attach_token(&mut retry, &renewed);
        next.run(retry, ext).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use storefront_api_base::Configuration;
    use storefront_state::SettingItem;
    use storefront_test::MemoryRepository;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;
    use crate::auth::session::Session;

    async fn setup(
        server: &MockServer,
        session: Option<Session>,
    ) -> (Arc<SessionStore>, reqwest_middleware::ClientWithMiddleware) {
        let store = Arc::new(SessionStore::new(Arc::new(
            MemoryRepository::<SettingItem>::default(),
        )));
        if let Some(session) = session {
            store.set(session).await;
        }
        let renewal = RenewalCoordinator::new(
            store.clone(),
            Configuration::new(server.uri(), reqwest::Client::new().into()),
        );
        let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
            .with(SessionMiddleware::new(store.clone(), renewal))
            .build();
        (store, client)
    }

    fn refresh_mock(access: &str) -> Mock {
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": access })))
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_auth_required() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let (_, client) = setup(&server, Some(Session::new("A", "R"))).await;

        client
            .get(format!("{}/cart/", server.uri()))
            .with_extension(AuthRequired::Bearer)
            .send()
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0]
                .headers
                .get("Authorization")
                .map(|v| v.to_str().unwrap()),
            Some("Bearer A")
        );
    }

    #[tokio::test]
    async fn does_not_attach_token_without_auth_required() {
        let server = MockServer::start().await;
        Mock::given(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let (_, client) = setup(&server, Some(Session::new("A", "R"))).await;

        client
            .post(format!("{}/auth/login/", server.uri()))
            .send()
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].headers.get("Authorization"), None);
    }

    #[tokio::test]
    async fn renews_and_retries_once_on_401() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .and(header("Authorization", "Bearer A"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/cart/"))
            .and(header("Authorization", "Bearer B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(1)
            .mount(&server)
            .await;
        refresh_mock("B").expect(1).mount(&server).await;
        let (store, client) = setup(&server, Some(Session::new("A", "R"))).await;

        let response = client
            .get(format!("{}/cart/", server.uri()))
            .with_extension(AuthRequired::Bearer)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.access_token().as_deref(), Some("B"));
        server.verify().await;
    }

    #[tokio::test]
    async fn second_401_is_returned_without_another_renewal() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        refresh_mock("B").expect(1).mount(&server).await;
        let (store, client) = setup(&server, Some(Session::new("A", "R"))).await;

        let response = client
            .get(format!("{}/cart/", server.uri()))
            .with_extension(AuthRequired::Bearer)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.access_token().as_deref(), Some("B"));
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_renewal_surfaces_session_expired() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/auth/token/refresh/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let (store, client) = setup(&server, Some(Session::new("A", "R"))).await;

        let err = client
            .get(format!("{}/cart/", server.uri()))
            .with_extension(AuthRequired::Bearer)
            .send()
            .await
            .unwrap_err();

        let reqwest_middleware::Error::Middleware(err) = err else {
            panic!("expected middleware error, got {err:?}");
        };
        assert!(err.downcast_ref::<SessionExpiredError>().is_some());
        assert!(!store.is_authenticated());
        server.verify().await;
    }

    #[tokio::test]
    async fn concurrent_401s_share_one_renewal() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .and(header("Authorization", "Bearer A"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(path("/cart/"))
            .and(header("Authorization", "Bearer B"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access": "B" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (_, client) = setup(&server, Some(Session::new("A", "R"))).await;

        let send = || {
            client
                .get(format!("{}/cart/", server.uri()))
                .with_extension(AuthRequired::Bearer)
                .send()
        };
        let (first, second) = tokio::join!(send(), send());

        assert_eq!(first.unwrap().status(), StatusCode::OK);
        assert_eq!(second.unwrap().status(), StatusCode::OK);
        server.verify().await;
    }

    #[tokio::test]
    async fn unauthenticated_401_is_not_renewed() {
        let server = MockServer::start().await;
        Mock::given(path("/cart/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        refresh_mock("B").expect(0).mount(&server).await;
        let (_, client) = setup(&server, None).await;

        let response = client
            .get(format!("{}/cart/", server.uri()))
            .with_extension(AuthRequired::Bearer)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        server.verify().await;
    }
}
