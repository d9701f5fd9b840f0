//! Single-flight coordination of access token renewal.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use storefront_api_base::Configuration;
use tracing::{debug, info, warn};

use super::{
    renew::{RenewError, renew_access_token},
    session::SessionStore,
};

type RenewalFuture = Shared<BoxFuture<'static, Result<String, RenewError>>>;

/// Ensures at most one token renewal is in flight. Callers arriving while a renewal is running
/// await the same outcome instead of starting their own.
pub struct RenewalCoordinator {
    session: Arc<SessionStore>,
    config: Configuration,
    in_flight: Mutex<Option<RenewalFuture>>,
}

impl std::fmt::Debug for RenewalCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalCoordinator")
            .field("base_path", &self.config.base_path)
            .finish_non_exhaustive()
    }
}

impl RenewalCoordinator {
    /// `config` is used for the refresh call and must not route through the session middleware.
    pub fn new(session: Arc<SessionStore>, config: Configuration) -> Arc<Self> {
        Arc::new(Self {
            session,
            config,
            in_flight: Mutex::new(None),
        })
    }

    /// Get a token to retry a request that was rejected while carrying `stale_token`.
    ///
    /// Joins the running renewal if there is one. If the session already holds a different token,
    /// a renewal finished after the request was sent and that token is returned as is.
    pub async fn renew(self: &Arc<Self>, stale_token: Option<&str>) -> Result<String, RenewError> {
        let renewal = {
            let mut slot = self.in_flight.lock().expect("Mutex is not poisoned");
            match slot.as_ref() {
                Some(renewal) => {
                    debug!("Joining in-flight token renewal");
                    renewal.clone()
                }
                None => {
                    if let Some(current) = self.session.access_token() {
                        if stale_token != Some(current.as_str()) {
                            return Ok(current);
                        }
                    }

                    let this = Arc::clone(self);
                    let renewal = async move {
                        let result = this.perform().await;
                        this.in_flight.lock().expect("Mutex is not poisoned").take();
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(renewal.clone());
                    renewal
                }
            }
        };

        renewal.await
    }

    async fn perform(&self) -> Result<String, RenewError> {
        let result = match self.session.refresh_token() {
            Some(refresh_token) => renew_access_token(&self.config, &refresh_token).await,
            None => Err(RenewError::MissingRefreshToken),
        };

        match result {
            Ok(response) => {
                if !self
                    .session
                    .rotate(response.access.clone(), response.refresh)
                    .await
                {
                    return Err(RenewError::SessionCleared);
                }
                info!("Access token renewed");
                Ok(response.access)
            }
            Err(e) => {
                warn!("Token renewal failed, ending session: {e}");
                self.session.clear().await;
                Err(e)
            }
        }
    }
}
