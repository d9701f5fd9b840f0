use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use storefront_commerce::{CommerceClient, ItemKey, ResourceItem};
use storefront_core::{Client, ClientSettings, auth::Session};
use storefront_state::{DatabaseConfiguration, SdkManagedState, SettingItem, repository::Repository};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn wire_item(kind: &str, id: &str, quantity: u32) -> Value {
    json!({
        "item_type": kind,
        "item_id": id,
        "name": format!("{kind} {id}"),
        "price": "5.00",
        "quantity": quantity,
    })
}

fn item(key: ItemKey, quantity: u32) -> ResourceItem {
    let name = format!("{} {}", key.kind, key.id);
    ResourceItem::new(key, name, 5.0).with_quantity(quantity)
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "A",
            "refresh": "R",
            "user": { "id": 1, "username": "ana", "email": "ana@example.com" },
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favorites/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            wire_item("product", "3", 1),
            wire_item("product", "9", 1),
        ])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/favorites/sync/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [wire_item("bundle", "2", 2)],
        })))
        .mount(server)
        .await;
}

async fn state() -> Arc<dyn Repository<SettingItem>> {
    SdkManagedState::initialize(DatabaseConfiguration::InMemory)
        .await
        .unwrap()
        .settings()
}

fn client(server: &MockServer, state: Arc<dyn Repository<SettingItem>>) -> Client {
    Client::new(
        Some(ClientSettings {
            api_url: server.uri(),
            ..Default::default()
        }),
        state,
    )
}

#[tokio::test]
async fn login_merges_favorites_and_loads_cart() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let client = client(&server, state().await);
    let commerce = CommerceClient::new(client.clone());

    commerce
        .favorites()
        .add(item(ItemKey::product("3"), 1))
        .await
        .unwrap();
    commerce
        .favorites()
        .add(item(ItemKey::product("4"), 1))
        .await
        .unwrap();

    client.auth().login("ana", "hunter2").await.unwrap();
    let push = commerce.on_login().await.unwrap();
    push.unwrap().await.unwrap();

    assert_eq!(
        &*commerce.favorites().items(),
        &[
            item(ItemKey::product("3"), 1),
            item(ItemKey::product("9"), 1),
            item(ItemKey::product("4"), 1),
        ]
    );
    assert_eq!(
        &*commerce.cart().items(),
        &[item(ItemKey::bundle("2"), 2)]
    );
    assert_eq!(commerce.cart().total(), 10.0);
}

#[tokio::test]
async fn session_watcher_reacts_to_login_and_logout() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let client = client(&server, state().await);
    let commerce = CommerceClient::new(client.clone());
    let watcher = commerce.watch_session();
    let mut cart = commerce.cart().subscribe();

    client.auth().login("ana", "hunter2").await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), cart.wait_for(|items| !items.is_empty()))
        .await
        .unwrap()
        .unwrap();

    client.auth().logout().await;
    tokio::time::timeout(Duration::from_secs(5), cart.wait_for(|items| items.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert!(commerce.favorites().items().is_empty());

    watcher.abort();
}

#[tokio::test]
async fn session_watcher_handles_logout_and_login_between_polls() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let client = client(&server, state().await);
    let commerce = CommerceClient::new(client.clone());
    commerce
        .favorites()
        .add(item(ItemKey::product("4"), 1))
        .await
        .unwrap();
    client.session().set(Session::new("A", "R")).await;

    let watcher = commerce.watch_session();
    let mut favorites = commerce.favorites().subscribe();
    tokio::task::yield_now().await;

    // Both writes land before the watcher is polled again, so it only observes `true`.
    client.session().clear().await;
    client.session().set(Session::new("B", "R2")).await;

    tokio::time::timeout(
        Duration::from_secs(5),
        favorites.wait_for(|items| items.len() == 2),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(
        &*commerce.favorites().items(),
        &[item(ItemKey::product("3"), 1), item(ItemKey::product("9"), 1)]
    );
    tokio::time::timeout(
        Duration::from_secs(5),
        commerce.cart().subscribe().wait_for(|items| !items.is_empty()),
    )
    .await
    .unwrap()
    .unwrap();

    watcher.abort();
}

#[tokio::test]
async fn collections_and_session_survive_a_restart() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let state = state().await;

    {
        let client = client(&server, Arc::clone(&state));
        let commerce = CommerceClient::new(client.clone());
        client.auth().login("ana", "hunter2").await.unwrap();
        commerce.on_login().await.unwrap();
    }

    let client = client(&server, state);
    let commerce = CommerceClient::new(client.clone());
    assert!(client.session().restore().await.is_some());
    commerce.load_persisted().await.unwrap();

    assert_eq!(
        &*commerce.cart().items(),
        &[item(ItemKey::bundle("2"), 2)]
    );
    assert_eq!(commerce.favorites().items().len(), 2);
    assert_eq!(
        client.auth().cached_profile().await.map(|p| p.username).as_deref(),
        Some("ana")
    );
}
