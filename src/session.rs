//! 会话存储
//!
//! 令牌与用户资料在内存和持久化存储中始终成对写入、成对清除。
//! 状态机：
//! - Anonymous → Authenticated：仅通过成功的 `login`
//! - Authenticated → Anonymous：`logout` 或 401/419 触发的 `invalidate`

use libris_shared::{LoginRequest, LoginResponse, Role, UserProfile};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::observe::{Observable, SubscriptionId};
use crate::storage::KeyValueStorage;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// 令牌存在且非空
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }

    pub fn auth_state(&self) -> AuthState {
        if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// 认证接口（登录/登出端点）
#[async_trait::async_trait(?Send)]
pub trait AuthGateway {
    async fn login(&self, credentials: &LoginRequest) -> ApiResult<LoginResponse>;
    async fn logout(&self) -> ApiResult<()>;
}

pub struct SessionStore<S: KeyValueStorage> {
    storage: S,
    token_key: String,
    user_key: String,
    state: Observable<SessionState>,
}

impl<S: KeyValueStorage> SessionStore<S> {
    /// 空会话，不读取存储
    pub fn new(storage: S, config: &ClientConfig) -> Self {
        Self {
            storage,
            token_key: config.token_key.clone(),
            user_key: config.user_key.clone(),
            state: Observable::new(SessionState::default()),
        }
    }

    /// 从持久化存储恢复会话
    ///
    /// 令牌与用户资料缺一不可；不完整或损坏的记录会被清除。
    pub fn restore(storage: S, config: &ClientConfig) -> Self {
        let store = Self::new(storage, config);

        let token = store
            .storage
            .get(&store.token_key)
            .filter(|t| !t.trim().is_empty());
        let raw_user = store.storage.get(&store.user_key);

        match (token, raw_user) {
            (Some(token), Some(raw)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => {
                    info!(user = %user.display_name(), "session restored");
                    store.state.set(SessionState {
                        user: Some(user),
                        token: Some(token),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    warn!(error = %e, "stored user profile is corrupt, clearing session");
                    store.clear_storage();
                }
            },
            (None, None) => {}
            _ => {
                warn!("incomplete stored session, clearing");
                store.clear_storage();
            }
        }

        store
    }

    // --- Accessors ---

    pub fn snapshot(&self) -> SessionState {
        self.state.get()
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .with(|s| s.token.clone())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.with(|s| s.user.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.state.with(SessionState::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(SessionState::is_authenticated)
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.with(SessionState::auth_state)
    }

    pub fn subscribe(&self, f: impl Fn(&SessionState) + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.unsubscribe(id);
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // --- Transitions ---

    /// 登录；失败时保留原有会话，仅记录错误消息
    #[tracing::instrument(name = "session.login", skip(self, gateway, password))]
    pub async fn login<G>(&self, gateway: &G, email: &str, password: &str) -> ApiResult<UserProfile>
    where
        G: AuthGateway + ?Sized,
    {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let credentials = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let result = gateway
            .login(&credentials)
            .await
            .and_then(accept_login);

        match result {
            Ok((token, user)) => {
                self.persist(&token, &user);
                info!(user = %user.display_name(), "signed in");
                self.state.set(SessionState {
                    user: Some(user.clone()),
                    token: Some(token),
                    loading: false,
                    error: None,
                });
                Ok(user)
            }
            Err(e) => {
                let e = e.in_op("session.login");
                warn!(error = %e, "sign in failed");
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(e.message().to_string());
                });
                Err(e)
            }
        }
    }

    /// 登出：服务端失败只记录日志，本地会话总是被清除
    #[tracing::instrument(name = "session.logout", skip_all)]
    pub async fn logout<G>(&self, gateway: &G)
    where
        G: AuthGateway + ?Sized,
    {
        if self.is_authenticated() {
            self.state.update(|s| s.loading = true);
            if let Err(e) = gateway.logout().await {
                warn!(error = %e, "server logout failed, clearing local session anyway");
            }
        }
        self.clear();
        info!("signed out");
    }

    /// 认证失败（401/419）时由 HTTP 层调用
    pub fn invalidate(&self) {
        if self.is_authenticated() {
            warn!("session rejected by server, clearing");
        }
        self.clear();
    }

    /// 资料编辑后同步当前用户
    pub fn update_user(&self, user: UserProfile) {
        if !self.is_authenticated() {
            return;
        }
        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.user_key, &raw) {
                    warn!(error = %e, "failed to persist user profile");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode user profile"),
        }
        self.state.update(|s| s.user = Some(user));
    }

    pub fn refresh_token(&self, token: &str) {
        if !self.is_authenticated() || token.trim().is_empty() {
            return;
        }
        if let Err(e) = self.storage.set(&self.token_key, token) {
            warn!(error = %e, "failed to persist refreshed token");
        }
        self.state.update(|s| s.token = Some(token.to_string()));
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    fn clear(&self) {
        self.clear_storage();
        self.state.set(SessionState::default());
    }

    fn clear_storage(&self) {
        for key in [&self.token_key, &self.user_key] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key = %key, error = %e, "failed to remove session key");
            }
        }
    }

    /// 令牌和用户资料要么一起写入，要么都不留下
    fn persist(&self, token: &str, user: &UserProfile) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode user profile");
                self.clear_storage();
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.token_key, token) {
            warn!(error = %e, "failed to persist token");
            self.clear_storage();
            return;
        }
        if let Err(e) = self.storage.set(&self.user_key, &raw) {
            warn!(error = %e, "failed to persist user profile, rolling back token");
            self.clear_storage();
        }
    }
}

fn accept_login(resp: LoginResponse) -> ApiResult<(String, UserProfile)> {
    match resp.token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok((token, resp.user.unwrap_or_default())),
        None => Err(ApiError::server(
            resp.message
                .unwrap_or_else(|| "Login failed: no token was returned.".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::sync::Arc;

    struct FakeGateway {
        login_result: RefCell<Option<ApiResult<LoginResponse>>>,
        logout_fails: bool,
        logout_calls: Cell<u32>,
    }

    impl FakeGateway {
        fn new(login_result: ApiResult<LoginResponse>) -> Self {
            Self {
                login_result: RefCell::new(Some(login_result)),
                logout_fails: false,
                logout_calls: Cell::new(0),
            }
        }
    }

    #[async_trait::async_trait(?Send)]
    impl AuthGateway for FakeGateway {
        async fn login(&self, _credentials: &LoginRequest) -> ApiResult<LoginResponse> {
            self.login_result
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(ApiError::server("unexpected")))
        }

        async fn logout(&self) -> ApiResult<()> {
            self.logout_calls.set(self.logout_calls.get() + 1);
            if self.logout_fails {
                Err(ApiError::server("boom").with_status(500))
            } else {
                Ok(())
            }
        }
    }

    fn ok_login() -> ApiResult<LoginResponse> {
        Ok(serde_json::from_value(json!({
            "token": "tok-1",
            "user": { "id": 1, "first_name": "Ada", "role": "admin" }
        }))
        .unwrap())
    }

    fn store() -> SessionStore<Arc<MemoryStorage>> {
        SessionStore::new(Arc::new(MemoryStorage::new()), &ClientConfig::default())
    }

    #[tokio::test]
    async fn login_persists_token_and_user_together() {
        let store = store();
        let user = store
            .login(&FakeGateway::new(ok_login()), "ada@example.com", "secret123")
            .await
            .unwrap();

        assert_eq!(user.role, Some(Role::Admin));
        assert!(store.is_authenticated());
        assert_eq!(store.storage().get("token").as_deref(), Some("tok-1"));
        let persisted: UserProfile =
            serde_json::from_str(&store.storage().get("user").unwrap()).unwrap();
        assert_eq!(persisted, user);
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn failed_login_keeps_prior_state() {
        let store = store();
        let gateway = FakeGateway::new(Err(ApiError::unauthenticated("Invalid credentials")));
        let err = store.login(&gateway, "a@b.c", "wrong").await.unwrap_err();

        assert_eq!(err.message(), "Invalid credentials");
        let state = store.snapshot();
        assert!(!state.is_authenticated());
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert!(store.storage().is_empty());

        store.clear_error();
        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test]
    async fn login_without_token_is_an_error() {
        let store = store();
        let gateway = FakeGateway::new(Ok(LoginResponse {
            message: Some("Account not verified".into()),
            ..Default::default()
        }));
        let err = store.login(&gateway, "a@b.c", "password").await.unwrap_err();
        assert_eq!(err.message(), "Account not verified");
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let store = store();
        store
            .login(&FakeGateway::new(ok_login()), "ada@example.com", "secret123")
            .await
            .unwrap();

        let gateway = FakeGateway {
            logout_fails: true,
            ..FakeGateway::new(ok_login())
        };
        store.logout(&gateway).await;

        assert_eq!(gateway.logout_calls.get(), 1);
        assert_eq!(store.auth_state(), AuthState::Anonymous);
        assert!(store.storage().get("token").is_none());
        assert!(store.storage().get("user").is_none());
    }

    #[test]
    fn restore_requires_both_keys() {
        let config = ClientConfig::default();
        let full = SessionStore::restore(
            MemoryStorage::with_entries([("token", "t"), ("user", r#"{"id":3,"role":"librarian"}"#)]),
            &config,
        );
        assert!(full.is_authenticated());
        assert_eq!(full.role(), Some(Role::Librarian));

        let partial = SessionStore::restore(MemoryStorage::with_entries([("user", "{}")]), &config);
        assert!(!partial.is_authenticated());
        assert!(partial.storage().is_empty());

        let corrupt = SessionStore::restore(
            MemoryStorage::with_entries([("token", "t"), ("user", "{not json")]),
            &config,
        );
        assert!(!corrupt.is_authenticated());
        assert!(corrupt.storage().is_empty());
    }

    #[test]
    fn invalidate_notifies_subscribers() {
        let config = ClientConfig::default();
        let store = SessionStore::restore(
            MemoryStorage::with_entries([("token", "t"), ("user", "{}")]),
            &config,
        );
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s| sink.lock().unwrap().push(s.auth_state()));

        store.invalidate();
        assert_eq!(*seen.lock().unwrap(), vec![AuthState::Anonymous]);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn profile_edits_and_token_refresh_are_persisted() {
        let config = ClientConfig::default();
        let store = SessionStore::restore(
            MemoryStorage::with_entries([("token", "t"), ("user", "{}")]),
            &config,
        );
        store.update_user(UserProfile {
            first_name: Some("Grace".into()),
            ..Default::default()
        });
        store.refresh_token("t2");

        assert_eq!(store.user().unwrap().display_name(), "Grace");
        assert_eq!(store.storage().get("token").as_deref(), Some("t2"));
        assert!(store.storage().get("user").unwrap().contains("Grace"));
    }

    struct ReadOnlyStorage;

    impl KeyValueStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    /// 拒绝写入用户资料的存储
    struct NoUserStorage(MemoryStorage);

    impl KeyValueStorage for NoUserStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == "user" {
                return Err(StorageError::Write("quota exceeded".into()));
            }
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[tokio::test]
    async fn half_written_session_is_rolled_back() {
        let store = SessionStore::new(NoUserStorage(MemoryStorage::new()), &ClientConfig::default());
        store
            .login(&FakeGateway::new(ok_login()), "ada@example.com", "secret123")
            .await
            .unwrap();

        assert!(store.is_authenticated());
        assert!(store.storage().get("token").is_none());
        assert!(store.storage().get("user").is_none());
    }

    #[tokio::test]
    async fn storage_failures_do_not_block_login() {
        let store = SessionStore::new(ReadOnlyStorage, &ClientConfig::default());
        store
            .login(&FakeGateway::new(ok_login()), "ada@example.com", "secret123")
            .await
            .unwrap();
        assert!(store.is_authenticated());
    }
}
