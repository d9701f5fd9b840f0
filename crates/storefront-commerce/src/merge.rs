//! Merging local-only items into the account's collection on login.

use std::{collections::HashSet, sync::Arc};

use storefront_core::{NotAuthenticatedError, http::FetchError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::ResourceError,
    item::ResourceItem,
    manager::ResourceStateManager,
    resource::Resource,
};

/// Server items first, followed by the local items whose key the server doesn't have, in local
/// order. Each key appears once, so merging an already merged collection changes nothing.
pub fn merge_collections(server: &[ResourceItem], local: &[ResourceItem]) -> Vec<ResourceItem> {
    let mut seen = HashSet::new();
    server
        .iter()
        .chain(local)
        .filter(|item| seen.insert(&item.key))
        .cloned()
        .collect()
}

/// Folds the items collected before login into the collection of the account that just logged
/// in.
pub struct MergeReconciler<R: Resource> {
    manager: Arc<ResourceStateManager<R>>,
}

impl<R: Resource> MergeReconciler<R> {
    #[allow(missing_docs)]
    pub fn new(manager: Arc<ResourceStateManager<R>>) -> Self {
        Self { manager }
    }

    /// Merge the local collection with the server's and adopt the result.
    ///
    /// The merged collection is pushed back to the server on a spawned task whose handle is
    /// returned; a failed push is logged and otherwise ignored. If the server collection can't be
    /// read the local collection is kept and `None` is returned.
    pub async fn reconcile(&self) -> Result<Option<JoinHandle<()>>, ResourceError> {
        if !self.manager.is_authenticated() {
            return Err(NotAuthenticatedError.into());
        }

        let local = self.manager.items();
        let fetcher = self.manager.client().fetcher();
        let server = match self.manager.resource().fetch(fetcher).await {
            Ok(server) => server,
            Err(FetchError::SessionExpired) => return Err(ResourceError::SessionExpired),
            Err(e) => {
                warn!("Failed to read {} for merging, keeping local copy: {e}", R::NAME);
                return Ok(None);
            }
        };

        let merged = merge_collections(&server, &local);
        info!(
            resource = R::NAME,
            server = server.len(),
            local = local.len(),
            merged = merged.len(),
            "Merged local items into account"
        );
        let merged = self.manager.publish(merged).await;

        let manager = Arc::clone(&self.manager);
        Ok(Some(tokio::spawn(async move {
            match manager.push(&merged).await {
                Ok(_) => debug!("Pushed merged {} to server", R::NAME),
                Err(e) => warn!("Failed to push merged {}: {e}", R::NAME),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use storefront_core::{Client, ClientSettings, auth::Session};
    use storefront_state::SettingItem;
    use storefront_test::MemoryRepository;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::{Favorites, item::ItemKey};

    fn favorite(id: &str) -> ResourceItem {
        ResourceItem::new(ItemKey::product(id), format!("Product {id}"), 10.0)
    }

    fn wire_favorite(id: &str) -> serde_json::Value {
        json!({
            "item_type": "product",
            "item_id": id,
            "name": format!("Product {id}"),
            "price": "10.00",
        })
    }

    #[test]
    fn server_wins_on_overlap_and_local_extras_follow() {
        let mut local_three = favorite("3");
        local_three.display_name = "stale name".to_string();

        let merged = merge_collections(
            &[favorite("3"), favorite("9")],
            &[favorite("5"), local_three, favorite("1")],
        );

        assert_eq!(merged, vec![favorite("3"), favorite("9"), favorite("5"), favorite("1")]);
    }

    #[test]
    fn duplicate_local_keys_collapse() {
        let merged = merge_collections(&[], &[favorite("3"), favorite("3"), favorite("4")]);
        assert_eq!(merged, vec![favorite("3"), favorite("4")]);

        assert_eq!(merge_collections(&merged, &merged), merged);
    }

    #[test]
    fn kinds_are_part_of_the_key() {
        let bundle = ResourceItem::new(ItemKey::bundle("3"), "Bundle 3", 30.0);
        let merged = merge_collections(&[favorite("3")], &[bundle.clone()]);
        assert_eq!(merged, vec![favorite("3"), bundle]);
    }

    async fn favorites_manager(server: &MockServer) -> Arc<ResourceStateManager<Favorites>> {
        let client = Client::new(
            Some(ClientSettings {
                api_url: server.uri(),
                ..Default::default()
            }),
            Arc::new(MemoryRepository::<SettingItem>::default()),
        );
        Arc::new(ResourceStateManager::new(client, Favorites))
    }

    #[tokio::test]
    async fn local_favorites_merge_into_account_on_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favorites/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([wire_favorite("3"), wire_favorite("9")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/favorites/sync/"))
            .and(body_json(json!({ "items": [
                { "item_type": "product", "item_id": "3" },
                { "item_type": "product", "item_id": "9" },
            ] })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let manager = favorites_manager(&server).await;
        manager.add(favorite("3")).await.unwrap();
        manager
            .client()
            .session()
            .set(Session::new("A", "R"))
            .await;

        let push = MergeReconciler::new(manager.clone()).reconcile().await.unwrap();
        push.unwrap().await.unwrap();

        assert_eq!(&*manager.items(), &[favorite("3"), favorite("9")]);
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_read_keeps_local_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favorites/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/favorites/sync/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let manager = favorites_manager(&server).await;
        manager.add(favorite("5")).await.unwrap();
        manager
            .client()
            .session()
            .set(Session::new("A", "R"))
            .await;

        let push = MergeReconciler::new(manager.clone()).reconcile().await.unwrap();

        assert!(push.is_none());
        assert_eq!(&*manager.items(), &[favorite("5")]);
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_push_is_not_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favorites/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([wire_favorite("9")])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/favorites/sync/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let manager = favorites_manager(&server).await;
        manager.add(favorite("5")).await.unwrap();
        manager
            .client()
            .session()
            .set(Session::new("A", "R"))
            .await;

        let push = MergeReconciler::new(manager.clone()).reconcile().await.unwrap();
        push.unwrap().await.unwrap();

        assert_eq!(&*manager.items(), &[favorite("9"), favorite("5")]);
    }

    #[tokio::test]
    async fn requires_session() {
        let server = MockServer::start().await;
        let manager = favorites_manager(&server).await;

        let err = MergeReconciler::new(manager).reconcile().await.unwrap_err();

        assert!(matches!(err, ResourceError::Unauthenticated(_)));
    }
}
