use reqwest::Method;
use serde_json::json;
use storefront_core::http::{FetchError, Fetcher};
use storefront_state::{Key, register_setting_key};

use crate::{
    item::{CollectionPayload, ItemKey, ResourceItem},
    manager::ResourceStateManager,
    resource::{Resource, UnauthenticatedPolicy},
};

register_setting_key!(const CART: Vec<ResourceItem> = "cart");

/// The shopping cart. Requires a session for every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cart;

/// Cart state manager.
pub type CartManager = ResourceStateManager<Cart>;

#[async_trait::async_trait]
impl Resource for Cart {
    const NAME: &'static str = "cart";
    const STORAGE_KEY: Key<Vec<ResourceItem>> = CART;
    const UNAUTHENTICATED: UnauthenticatedPolicy = UnauthenticatedPolicy::Reject;
    const SUPPORTS_QUANTITY: bool = true;
    const FALLBACK_ON_READ_FAILURE: bool = false;

    async fn fetch(&self, fetcher: &Fetcher) -> Result<Vec<ResourceItem>, FetchError> {
        let payload: CollectionPayload = fetcher.request_json(Method::GET, "/cart/", None).await?;
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
            "quantity": item.quantity,
        });
        let response = fetcher
            .request(Method::POST, "/cart/add_item/", Some(&body))
            .await?;
        Ok(CollectionPayload::from_response(response)?)
    }

    async fn update_quantity(
        &self,
        fetcher: &Fetcher,
        key: &ItemKey,
        quantity: u32,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        let body = json!({
            "item_type": key.kind.as_str(),
            "item_id": key.id,
            "quantity": quantity,
        });
        let response = fetcher
            .request(Method::POST, "/cart/update_item/", Some(&body))
            .await?;
        Ok(CollectionPayload::from_response(response)?)
    }

    async fn remove(
        &self,
        fetcher: &Fetcher,
        key: &ItemKey,
    ) -> Result<Option<Vec<ResourceItem>>, FetchError> {
        let body = json!({
            "item_type": key.kind.as_str(),
            "item_id": key.id,
        });
        let response = fetcher
            .request(Method::DELETE, "/cart/remove_item/", Some(&body))
            .await?;
        Ok(CollectionPayload::from_response(response)?)
    }

    async fn clear(&self, fetcher: &Fetcher) -> Result<(), FetchError> {
        fetcher.request(Method::POST, "/cart/clear/", None).await?;
        Ok(())
    }
}
