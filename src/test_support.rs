//! 测试共用的客户端构造

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::request::MockHttpClient;
use crate::session::SessionStore;
use crate::storage::MemoryStorage;

pub type TestClient = ApiClient<MockHttpClient, MemoryStorage>;

pub fn url(path: &str) -> String {
    ClientConfig::default().endpoint(path)
}

pub fn signed_in_client() -> TestClient {
    let config = ClientConfig::default();
    let storage = MemoryStorage::with_entries([
        ("token", "test-token"),
        ("user", r#"{"id":1,"first_name":"Ada","role":"admin"}"#),
    ]);
    let session = Arc::new(SessionStore::restore(storage, &config));
    ApiClient::new(MockHttpClient::new(), session, config)
}

pub fn anonymous_client() -> TestClient {
    let config = ClientConfig::default();
    let session = Arc::new(SessionStore::new(MemoryStorage::new(), &config));
    ApiClient::new(MockHttpClient::new(), session, config)
}
