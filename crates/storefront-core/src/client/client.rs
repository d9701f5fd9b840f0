use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use storefront_api_base::Configuration;
use storefront_state::{Key, Setting, SettingItem, repository::Repository};

use super::internal::InternalClient;
use crate::{
    auth::{AuthClient, renewal::RenewalCoordinator, session::SessionStore},
    client::ClientSettings,
    http::{Fetcher, SessionMiddleware},
};

/// The main struct to interact with the storefront SDK.
#[derive(Debug, Clone)]
pub struct Client {
    // Clones must share the same session and fetcher, so all state lives behind the Arc.
    #[doc(hidden)]
    pub internal: Arc<InternalClient>,
}

impl Client {
    /// Create a new client persisting its state into `state`.
    ///
    /// The client starts unauthenticated; call [`SessionStore::restore`] on
    /// [`Client::session`] to pick up a previously persisted session.
    pub fn new(settings: Option<ClientSettings>, state: Arc<dyn Repository<SettingItem>>) -> Self {
        let settings = settings.unwrap_or_default();

        let http_client = reqwest::Client::builder()
            .default_headers(build_default_headers(&settings))
            .timeout(settings.request_timeout())
            .build()
            .expect("HTTP Client build should not fail");

        let session = Arc::new(SessionStore::new(Arc::clone(&state)));

        // Token refreshes go through a client without the session middleware.
        let renewal = RenewalCoordinator::new(
            Arc::clone(&session),
            Configuration::new(&settings.api_url, http_client.clone().into()),
        );

        let api_client = reqwest_middleware::ClientBuilder::new(http_client)
            .with(SessionMiddleware::new(Arc::clone(&session), renewal))
            .build();
        let fetcher = Fetcher::new(Configuration::new(&settings.api_url, api_client));

        Self {
            internal: Arc::new(InternalClient {
                settings,
                session,
                fetcher,
                state,
            }),
        }
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> &ClientSettings {
        &self.internal.settings
    }

    /// The session shared by every request made through this client.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.internal.session
    }

    #[allow(missing_docs)]
    pub fn fetcher(&self) -> &Fetcher {
        &self.internal.fetcher
    }

    /// The key-value store backing the session and cached collections.
    pub fn state(&self) -> Arc<dyn Repository<SettingItem>> {
        Arc::clone(&self.internal.state)
    }

    /// A typed handle to a single persisted value.
    pub fn setting<T>(&self, key: Key<T>) -> Setting<T> {
        Setting::new(self.state(), key)
    }

    /// Login, logout and profile operations.
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.clone())
    }
}

fn build_default_headers(settings: &ClientSettings) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();

    match HeaderValue::from_str(&settings.user_agent) {
        Ok(value) => {
            headers.append(header::USER_AGENT, value);
        }
        Err(e) => {
            tracing::warn!("Ignoring invalid user agent: {e}");
        }
    }

    headers
}
