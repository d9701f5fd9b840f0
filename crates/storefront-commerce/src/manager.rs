//! Generic optimistic state for a server-owned collection.

use std::{future::Future, sync::Arc};

use storefront_core::{Client, NotAuthenticatedError, http::FetchError};
use storefront_state::Setting;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::{
    error::ResourceError,
    item::{ItemKey, ResourceItem},
    resource::{Resource, UnauthenticatedPolicy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Remote,
    Local,
}

/// Holds the local copy of one [`Resource`] and keeps it consistent with the server.
///
/// - Successful calls replace the local collection with the collection the server returned.
/// - Failed calls restore the collection as it was before the call started.
/// - Every change is mirrored to storage under [`Resource::STORAGE_KEY`].
///
/// Independent calls are not serialized. When two calls on the same item overlap, the response
/// that arrives last determines the final state.
pub struct ResourceStateManager<R: Resource> {
    resource: R,
    client: Client,
    items: watch::Sender<Arc<[ResourceItem]>>,
}

impl<R: Resource> std::fmt::Debug for ResourceStateManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStateManager")
            .field("resource", &R::NAME)
            .field("items", &self.items.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceStateManager<R> {
    /// Create a manager with an empty collection. Call
    /// [`ResourceStateManager::load_persisted`] to pick up the stored copy.
    pub fn new(client: Client, resource: R) -> Self {
        let empty: Arc<[ResourceItem]> = Arc::from(Vec::new());
        let (items, _) = watch::channel(empty);
        Self {
            resource,
            client,
            items,
        }
    }

    #[allow(missing_docs)]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// The current collection.
    pub fn items(&self) -> Arc<[ResourceItem]> {
        Arc::clone(&self.items.borrow())
    }

    /// Observe every published collection, optimistic and authoritative alike.
    pub fn subscribe(&self) -> watch::Receiver<Arc<[ResourceItem]>> {
        self.items.subscribe()
    }

    #[allow(missing_docs)]
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.borrow().iter().any(|item| item.key == *key)
    }

    /// Sum of all item subtotals.
    pub fn total(&self) -> f64 {
        self.items.borrow().iter().map(ResourceItem::subtotal).sum()
    }

    /// Seed the collection from storage.
    pub async fn load_persisted(&self) -> Result<Arc<[ResourceItem]>, ResourceError> {
        let items: Arc<[ResourceItem]> = self.setting().get().await?.unwrap_or_default().into();
        self.items.send_replace(Arc::clone(&items));
        debug!(resource = R::NAME, count = items.len(), "Loaded persisted collection");
        Ok(items)
    }

    /// Replace the collection with the server's.
    ///
    /// Without a session, local-only resources return the local collection. Resources that fall
    /// back on read failure keep and return the local collection when the read fails for any
    /// reason other than an expired session.
    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn refresh(&self) -> Result<Arc<[ResourceItem]>, ResourceError> {
        if self.mode()? == Mode::Local {
            return Ok(self.items());
        }

        match self.resource.fetch(self.client.fetcher()).await {
            Ok(items) => Ok(self.publish(items).await),
            Err(FetchError::SessionExpired) => Err(ResourceError::SessionExpired),
            Err(e) if R::FALLBACK_ON_READ_FAILURE => {
                warn!("Failed to read {}, keeping local copy: {e}", R::NAME);
                Ok(self.items())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Add an item. Nothing changes locally until the server confirms, as the resulting quantity
    /// is computed server-side.
    #[instrument(skip_all, fields(resource = R::NAME, key = %item.key))]
    pub async fn add(&self, item: ResourceItem) -> Result<(), ResourceError> {
        if self.mode()? == Mode::Local {
            self.publish(with_item(&self.items(), item)).await;
            return Ok(());
        }

        let server = self.resource.add(self.client.fetcher(), &item).await?;
        let items = server.unwrap_or_else(|| with_item(&self.items(), item));
        self.publish(items).await;
        Ok(())
    }

    /// Set the quantity of an item. A quantity of zero or less removes it.
    #[instrument(skip_all, fields(resource = R::NAME, %key, quantity))]
    pub async fn set_quantity(&self, key: &ItemKey, quantity: i64) -> Result<(), ResourceError> {
        if quantity <= 0 {
            return self.remove(key).await;
        }
        if !R::SUPPORTS_QUANTITY {
            return Err(ResourceError::Unsupported {
                resource: R::NAME,
                operation: "quantity changes",
            });
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let apply = |items: &[ResourceItem]| {
            items
                .iter()
                .cloned()
                .map(|mut item| {
                    if item.key == *key {
                        item.quantity = quantity;
                    }
                    item
                })
                .collect()
        };

        match self.mode()? {
            Mode::Local => self.apply_locally(apply).await,
            Mode::Remote => {
                let call = self
                    .resource
                    .update_quantity(self.client.fetcher(), key, quantity);
                self.mutate(apply, call).await
            }
        }
    }

    #[allow(missing_docs)]
    #[instrument(skip_all, fields(resource = R::NAME, %key))]
    pub async fn remove(&self, key: &ItemKey) -> Result<(), ResourceError> {
        let apply = |items: &[ResourceItem]| {
            items
                .iter()
                .filter(|item| item.key != *key)
                .cloned()
                .collect()
        };

        match self.mode()? {
            Mode::Local => self.apply_locally(apply).await,
            Mode::Remote => {
                let call = self.resource.remove(self.client.fetcher(), key);
                self.mutate(apply, call).await
            }
        }
    }

    /// Empty the collection. On success the persisted copy is dropped.
    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn clear(&self) -> Result<(), ResourceError> {
        if self.mode()? == Mode::Remote {
            let fetcher = self.client.fetcher();
            let call = async { self.resource.clear(fetcher).await.map(|()| None) };
            self.mutate(|_| Vec::new(), call).await?;
        } else {
            self.items.send_replace(Arc::from(Vec::new()));
        }

        self.delete_persisted().await;
        Ok(())
    }

    /// Overwrite the server's collection with the local one and adopt the server's answer.
    #[instrument(skip_all, fields(resource = R::NAME))]
    pub async fn sync(&self) -> Result<(), ResourceError> {
        if !self.client.session().is_authenticated() {
            return Err(NotAuthenticatedError.into());
        }

        let items = self.items();
        if let Some(server) = self.push(&items).await? {
            self.publish(server).await;
        }
        Ok(())
    }

    /// Forget the collection, in memory and in storage.
    pub async fn reset(&self) {
        self.items.send_replace(Arc::from(Vec::new()));
        self.delete_persisted().await;
    }

    /// Send `items` through the resource's bulk endpoint without touching the local collection.
    pub(crate) async fn push(
        &self,
        items: &[ResourceItem],
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        self.resource.sync(self.client.fetcher(), items).await
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Publish `items` as the current collection and persist it.
    pub(crate) async fn publish(&self, items: Vec<ResourceItem>) -> Arc<[ResourceItem]> {
        let items: Arc<[ResourceItem]> = items.into();
        self.items.send_replace(Arc::clone(&items));
        if let Err(e) = self.setting().update(items.to_vec()).await {
            warn!("Failed to persist {}: {e}", R::NAME);
        }
        items
    }

    fn mode(&self) -> Result<Mode, ResourceError> {
        if self.client.session().is_authenticated() {
            return Ok(Mode::Remote);
        }
        match R::UNAUTHENTICATED {
            UnauthenticatedPolicy::Reject => Err(NotAuthenticatedError.into()),
            UnauthenticatedPolicy::LocalOnly => Ok(Mode::Local),
        }
    }

    async fn apply_locally(
        &self,
        apply: impl FnOnce(&[ResourceItem]) -> Vec<ResourceItem>,
    ) -> Result<(), ResourceError> {
        let items = apply(&self.items());
        self.publish(items).await;
        Ok(())
    }

    /// Apply a change optimistically, then settle it with the outcome of `call`.
    async fn mutate(
        &self,
        apply: impl FnOnce(&[ResourceItem]) -> Vec<ResourceItem>,
        call: impl Future<Output = Result<Option<Vec<ResourceItem>>, FetchError>>,
    ) -> Result<(), ResourceError> {
        let snapshot = self.items();
        self.publish(apply(&snapshot)).await;

        match call.await {
            Ok(Some(server)) => {
                self.publish(server).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("{} mutation failed, restoring previous state: {e}", R::NAME);
                self.publish(snapshot.to_vec()).await;
                Err(e.into())
            }
        }
    }

    fn setting(&self) -> Setting<Vec<ResourceItem>> {
        self.client.setting(R::STORAGE_KEY)
    }

    async fn delete_persisted(&self) {
        if let Err(e) = self.setting().delete().await {
            warn!("Failed to delete persisted {}: {e}", R::NAME);
        }
    }
}

/// `items` with `item` appended, unless an item with the same key is already present.
fn with_item(items: &[ResourceItem], item: ResourceItem) -> Vec<ResourceItem> {
    let mut items = items.to_vec();
    if !items.iter().any(|existing| existing.key == item.key) {
        items.push(item);
    }
    items
}
