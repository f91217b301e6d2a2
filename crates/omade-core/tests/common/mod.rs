#![allow(dead_code)]

use std::sync::Arc;

use omade_core::auth::{MemoryStorage, Storage};
use omade_core::config::{Config, StorageKind, DEFAULT_STORAGE_KEY};
use omade_core::{AppContext, LoginCredentials};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn config_for(server: &MockServer) -> Config {
    Config {
        api_base_url: server.uri(),
        storage: StorageKind::Memory,
        ..Config::default()
    }
}

pub fn context(server: &MockServer) -> (AppContext, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = AppContext::new(config_for(server), storage.clone()).unwrap();
    (ctx, storage)
}

pub fn stored_envelope(storage: &MemoryStorage) -> Option<Value> {
    storage
        .get_item(DEFAULT_STORAGE_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

pub fn auth_body(access: &str, refresh: &str) -> Value {
    json!({
        "user": {"id": "1", "email": "a@b.com", "name": "Ada", "role": "user", "permissions": []},
        "accessToken": access,
        "refreshToken": refresh
    })
}

pub fn credentials() -> LoginCredentials {
    LoginCredentials::new("a@b.com", "secret1")
}

pub async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(access, refresh)))
        .mount(server)
        .await;
}

/// Context logged in as AT1/RT1
pub async fn logged_in(server: &MockServer) -> (AppContext, Arc<MemoryStorage>) {
    mount_login(server, "AT1", "RT1").await;
    let (ctx, storage) = context(server);
    ctx.session().login(&credentials()).await.unwrap();
    (ctx, storage)
}
