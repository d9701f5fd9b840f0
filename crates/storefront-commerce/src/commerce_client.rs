use std::sync::Arc;

use storefront_core::Client;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    cart::{Cart, CartManager},
    error::ResourceError,
    favorites::{Favorites, FavoritesManager},
    merge::MergeReconciler,
    unload::UnloadSync,
};

/// Subclient owning the cart and favorites state.
///
/// Cloning shares the managers.
#[derive(Debug, Clone)]
pub struct CommerceClient {
    client: Client,
    cart: Arc<CartManager>,
    favorites: Arc<FavoritesManager>,
}

impl CommerceClient {
    /// Constructs a new `CommerceClient` with empty collections on top of `client`.
    pub fn new(client: Client) -> Self {
        Self {
            cart: Arc::new(CartManager::new(client.clone(), Cart)),
            favorites: Arc::new(FavoritesManager::new(client.clone(), Favorites)),
            client,
        }
    }

    #[allow(missing_docs)]
    pub fn cart(&self) -> &Arc<CartManager> {
        &self.cart
    }

    #[allow(missing_docs)]
    pub fn favorites(&self) -> &Arc<FavoritesManager> {
        &self.favorites
    }

    /// Seed both collections from storage.
    pub async fn load_persisted(&self) -> Result<(), ResourceError> {
        self.cart.load_persisted().await?;
        self.favorites.load_persisted().await?;
        Ok(())
    }

    /// Bring both collections in line with the account that just logged in: favorites collected
    /// while logged out are merged in, the cart is replaced by the server's.
    ///
    /// Returns the handle of the merged favorites push, if one was started.
    pub async fn on_login(&self) -> Result<Option<JoinHandle<()>>, ResourceError> {
        let push = MergeReconciler::new(Arc::clone(&self.favorites))
            .reconcile()
            .await?;
        self.cart.refresh().await?;
        Ok(push)
    }

    /// Forget both collections.
    pub async fn on_logout(&self) {
        self.cart.reset().await;
        self.favorites.reset().await;
    }

    /// Run [`CommerceClient::on_login`] and [`CommerceClient::on_logout`] on every session
    /// transition. A logout immediately followed by a login runs both, even when the signal only
    /// reported the final state. The task holds the client alive; abort the returned handle to
    /// stop it.
    pub fn watch_session(&self) -> JoinHandle<()> {
        let mut signal = self.client.session().subscribe();
        let this = self.clone();

        tokio::spawn(async move {
            let mut authenticated = *signal.borrow_and_update();
            let mut generation = this.client.session().generation();
            while signal.changed().await.is_ok() {
                let now = *signal.borrow_and_update();
                let current = this.client.session().generation();
                let switched = authenticated && now && current != generation;

                if authenticated && (!now || switched) {
                    info!("Session ended, clearing collections");
                    this.on_logout().await;
                }
                if now && (!authenticated || switched) {
                    info!("Session started, reconciling collections");
                    if let Err(e) = this.on_login().await {
                        warn!("Failed to reconcile collections after login: {e}");
                    }
                }

                authenticated = now;
                generation = current;
            }
        })
    }

    /// Shutdown hook pushing the favorites to the server.
    pub fn unload(&self) -> UnloadSync {
        UnloadSync::new(
            Arc::clone(&self.favorites),
            self.client.settings().unload_sync_timeout(),
        )
    }
}
