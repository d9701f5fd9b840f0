use storefront_core::http::{FetchError, Fetcher};
use storefront_state::Key;

use crate::item::{ItemKey, ResourceItem};

/// How a manager behaves while there is no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedPolicy {
    /// Operations fail with [`ResourceError::Unauthenticated`](crate::ResourceError) before any
    /// network call.
    Reject,
    /// Mutations apply to the local collection only and are merged into the account on login.
    LocalOnly,
}

/// A server-owned collection managed by a [`ResourceStateManager`](crate::ResourceStateManager).
///
/// Mutation methods return the server's collection after the change when the response carries
/// one, `None` otherwise.
#[async_trait::async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Used in logs and errors.
    const NAME: &'static str;
    /// Storage key of the persisted copy.
    const STORAGE_KEY: Key<Vec<ResourceItem>>;
    #[allow(missing_docs)]
    const UNAUTHENTICATED: UnauthenticatedPolicy;
    /// Whether quantities above one can be set.
    const SUPPORTS_QUANTITY: bool;
    /// Whether a failed read keeps the local collection instead of surfacing the error.
    const FALLBACK_ON_READ_FAILURE: bool;

    /// Read the full collection.
    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<ResourceItem>, FetchError>;

    #[allow(missing_docs)]
    async fn add(
        &self,
        fetcher: &Fetcher,
        item: &ResourceItem,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError>;

    /// Only called when [`Resource::SUPPORTS_QUANTITY`] is set.
    async fn update_quantity(
        &self,
        fetcher: &Fetcher,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError>;

    #[allow(missing_docs)]
    async fn remove(
        &self,
        fetcher: &Fetcher,
        key: &ItemKey,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError>;

    #[allow(missing_docs)]
    async fn clear(&self, fetcher: &Fetcher) -> Result<(), FetchError>;

    /// Replace the server's collection with `items`. Resources without a bulk endpoint do nothing.
    async fn sync(
        &self,
        _fetcher: &Fetcher,
        _items: &[ResourceItem],
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        Ok(None)
    }
}
