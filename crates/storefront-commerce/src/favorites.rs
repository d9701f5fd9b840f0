use reqwest::Method;
use serde_json::json;
use storefront_api_base::encode_path_segment;
use storefront_core::http::{FetchError, Fetcher};
use storefront_state::{Key, register_setting_key};

use crate::{
    item::{CollectionPayload, ItemKey, ResourceItem},
    manager::ResourceStateManager,
    resource::{Resource, UnauthenticatedPolicy},
};

register_setting_key!(const FAVORITES: Vec<ResourceItem> = "favorites");

/// The favorites list.
///
/// Works without a session: items are kept locally and merged into the account on login. Reads
/// that fail keep showing the local list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Favorites;

/// Favorites state manager.
pub type FavoritesManager = ResourceStateManager<Favorites>;

#[async_trait::async_trait]
impl Resource for Favorites {
    const NAME: &'static str = "favorites";
    const STORAGE_KEY: Key<Vec<ResourceItem>> = FAVORITES;
    const UNAUTHENTICATED: UnauthenticatedPolicy = UnauthenticatedPolicy::LocalOnly;
    const SUPPORTS_QUANTITY: bool = false;
    const FALLBACK_ON_READ_FAILURE: bool = true;

    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<ResourceItem>, FetchError> {
        let payload: CollectionPayload = fetcher
            .request_json(Method::GET, "/favorites/", None)
            .await?;
        Ok(payload.into_items())
    }

    async fn add(
        &self,
        fetcher: &Fetcher,
        item: &ResourceItem,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        let body = json!({
            "item_type": item.key.kind.as_str(),
            "item_id": item.key.id,
        });
        let response = fetcher
            .request(Method::POST, "/favorites/", Some(&body))
            .await?;
        Ok(CollectionPayload::from_response(response)?)
    }

    async fn update_quantity(
        &self,
        _fetcher: &Fetcher,
        _key: &ItemKey,
        _quantity: u32,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        Ok(None)
    }

    async fn remove(
        &self,
        fetcher: &Fetcher,
        key: &ItemKey,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        let path = format!(
            "/favorites/{}/?item_type={}",
            encode_path_segment(&key.id),
            key.kind.as_str()
        );
        let response = fetcher.request(Method::DELETE, &path, None).await?;
        Ok(CollectionPayload::from_response(response)?)
    }

    /// There is no clear endpoint; syncing an empty list has the same effect.
    async fn clear(&self, fetcher: &Fetcher) -> Result<(), FetchError> {
        self.sync(fetcher, &[]).await?;
        Ok(())
    }

    async fn sync(
        &self,
        fetcher: &Fetcher,
        items: &[ResourceItem],
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        let keys: Vec<_> = items
            .iter()
            .map(|item| json!({ "item_type": item.key.kind.as_str(), "item_id": item.key.id }))
            .collect();
        let response = fetcher
            .request(Method::POST, "/favorites/sync/", Some(&json!({ "items": keys })))
            .await?;
        Ok(CollectionPayload::from_response(response)?)
    }
}
