use std::sync::{Arc, Mutex};

use libris_shared::protocol::{ApiEnvelope, EncodedPayload, endpoints};
use libris_shared::{
    DashboardStats, FileAttachment, ListResponse, LoginRequest, LoginResponse, MultipartForm,
    NewsPost, UserProfile,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::observe::lock;
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::session::{AuthGateway, SessionStore};
use crate::storage::KeyValueStorage;

// =========================================================
// 常量定义
// =========================================================

pub const SIGN_IN_REQUIRED_MESSAGE: &str = "You must be signed in to do that.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";
/// 纯文本错误体超过此长度时不直接展示
const MAX_PLAIN_MESSAGE_LEN: usize = 200;

/// 请求是否必须携带令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// 无令牌时本地直接失败，不发出请求
    Authenticated,
    /// 有令牌则附带，无令牌照常发送
    Public,
    /// 从不附带令牌（登录）
    Anonymous,
}

pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

// =========================================================
// ApiClient
// =========================================================

/// HTTP 包装层
///
/// - 出站：会话中存在令牌时附加 `Authorization: Bearer <token>`
/// - 入站：401/419 清除会话并触发 `on_unauthorized`（跳转登录），请求本身仍然失败
/// - 其他非 2xx：提取服务端消息，单次尝试，不重试
pub struct ApiClient<C, S: KeyValueStorage> {
    http: C,
    session: Arc<SessionStore<S>>,
    config: ClientConfig,
    on_unauthorized: Mutex<Option<UnauthorizedHook>>,
}

impl<C: HttpClient, S: KeyValueStorage> ApiClient<C, S> {
    pub fn new(http: C, session: Arc<SessionStore<S>>, config: ClientConfig) -> Self {
        Self {
            http,
            session,
            config,
            on_unauthorized: Mutex::new(None),
        }
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 注册认证失败回调（通常用于跳转登录页）
    pub fn set_on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        *lock(&self.on_unauthorized) = Some(Arc::new(hook));
    }

    pub fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    fn prepare(&self, req: HttpRequest, access: Access) -> ApiResult<HttpRequest> {
        match (self.session.token(), access) {
            (_, Access::Anonymous) => Ok(req),
            (Some(token), _) => Ok(req.with_bearer(&token)),
            (None, Access::Public) => Ok(req),
            (None, Access::Authenticated) => Err(ApiError::unauthenticated(SIGN_IN_REQUIRED_MESSAGE)),
        }
    }

    /// 发送请求并按状态码分类错误
    #[tracing::instrument(name = "api.send", skip(self, req), fields(method = req.method.as_str(), url = %req.url))]
    pub async fn send(&self, req: HttpRequest, access: Access) -> ApiResult<HttpResponse> {
        let op = format!("{} {}", req.method.as_str(), req.url);
        let req = self
            .prepare(req, access)
            .map_err(|e| e.in_op_with("api.send", op.as_str()))?;
        let carried_token = req.has_bearer();

        debug!("issuing request");
        let resp = self
            .http
            .send(req)
            .await
            .map_err(|e| ApiError::from(e).in_op_with("api.send", op.as_str()))?;
        debug!(status = resp.status, "response received");

        self.check(resp, carried_token)
            .map_err(|e| e.in_op_with("api.send", op.as_str()))
    }

    fn check(&self, resp: HttpResponse, carried_token: bool) -> ApiResult<HttpResponse> {
        let status = resp.status;

        if status == 401 || status == 419 {
            if carried_token {
                self.handle_unauthorized();
                return Err(ApiError::unauthenticated(SESSION_EXPIRED_MESSAGE).with_status(status));
            }
            let message = server_message(&resp.body)
                .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
            return Err(ApiError::unauthenticated(message).with_status(status));
        }

        if !resp.is_success() {
            let message = server_message(&resp.body).unwrap_or_else(|| fallback_message(status));
            let err = if status == 422 {
                ApiError::validation(message)
            } else {
                ApiError::server(message)
            };
            return Err(err.with_status(status));
        }

        if let Some(message) = rejection_message(&resp.body) {
            return Err(ApiError::server(message).with_status(status));
        }

        Ok(resp)
    }

    fn handle_unauthorized(&self) {
        warn!("authentication rejected, clearing session");
        self.session.invalidate();
        // 回调在锁外执行
        let hook = lock(&self.on_unauthorized).clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    // --- Convenience ---

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, access: Access) -> ApiResult<T> {
        let req = HttpRequest::new(&self.url(path), HttpMethod::Get);
        let resp = self.send(req, access).await?;
        resp.json()
            .map_err(|e| ApiError::from(e).in_op_with("api.decode", path))
    }

    pub async fn send_payload(
        &self,
        method: HttpMethod,
        path: &str,
        payload: EncodedPayload,
        access: Access,
    ) -> ApiResult<HttpResponse> {
        let req = HttpRequest::new(&self.url(path), method);
        let req = match payload {
            EncodedPayload::Json(body) => req.with_json(&body),
            EncodedPayload::Multipart(form) => req.with_multipart(form),
        };
        self.send(req, access).await
    }

    pub async fn delete(&self, path: &str, access: Access) -> ApiResult<HttpResponse> {
        let req = HttpRequest::new(&self.url(path), HttpMethod::Delete);
        self.send(req, access).await
    }

    // --- Auth ---

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile> {
        self.session.login(self, email, password).await
    }

    pub async fn logout(&self) {
        self.session.logout(self).await;
    }

    // --- Endpoints ---

    /// 仪表盘统计，响应为 `{ status, data, message }`
    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        let envelope: ApiEnvelope<DashboardStats> = self
            .get_json(endpoints::DASHBOARD_STATS, Access::Authenticated)
            .await?;
        envelope.data.ok_or_else(|| {
            ApiError::server("No stats returned from server").in_op("api.dashboard_stats")
        })
    }

    /// 首页新闻（公开接口）
    pub async fn landing_news(&self, limit: u32) -> ApiResult<Vec<NewsPost>> {
        let path = format!("{}?limit={}", endpoints::NEWS_LANDING, limit);
        let list: ListResponse<NewsPost> = self.get_json(&path, Access::Public).await?;
        Ok(list.into_page(1, limit).items)
    }

    /// 批量导入图书，返回服务端消息
    pub async fn import_books(&self, file: FileAttachment) -> ApiResult<Option<String>> {
        let form = MultipartForm::new().file("file", file);
        let resp = self
            .send_payload(
                HttpMethod::Post,
                endpoints::BOOK_IMPORT,
                EncodedPayload::Multipart(form),
                Access::Authenticated,
            )
            .await?;
        let body: Value = resp
            .json()
            .map_err(|e| ApiError::from(e).in_op("api.import_books"))?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, S: KeyValueStorage> AuthGateway for ApiClient<C, S> {
    async fn login(&self, credentials: &LoginRequest) -> ApiResult<LoginResponse> {
        let body = serde_json::to_value(credentials)?;
        let req = HttpRequest::new(&self.url(endpoints::LOGIN), HttpMethod::Post).with_json(&body);
        let resp = self.send(req, Access::Anonymous).await?;
        Ok(resp.json()?)
    }

    async fn logout(&self) -> ApiResult<()> {
        let req = HttpRequest::new(&self.url(endpoints::LOGOUT), HttpMethod::Post);
        self.send(req, Access::Authenticated).await?;
        Ok(())
    }
}

// =========================================================
// 错误消息提取
// =========================================================

/// 依次尝试 `message`、`error`、`errors` 中的第一条，最后是简短的纯文本
pub(crate) fn server_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            for key in ["message", "error"] {
                if let Some(text) = map.get(key).and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
            map.get("errors").and_then(first_error)
        }
        Ok(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Ok(_) => None,
        Err(_) => {
            let text = body.trim();
            let looks_like_markup = text.starts_with('<');
            if text.is_empty() || looks_like_markup || text.len() > MAX_PLAIN_MESSAGE_LEN {
                None
            } else {
                Some(text.to_string())
            }
        }
    }
}

/// Laravel 校验错误：`{ "errors": { "field": ["msg", ...] } }`
fn first_error(errors: &Value) -> Option<String> {
    match errors {
        Value::Object(fields) => fields.values().find_map(first_error),
        Value::Array(items) => items.iter().find_map(first_error),
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// 2xx 响应中的 `{ status: false, message }`
fn rejection_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("status") {
        Some(Value::Bool(false)) => Some(
            value
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("The server rejected the request.")
                .to_string(),
        ),
        _ => None,
    }
}

fn fallback_message(status: u16) -> String {
    match status {
        403 => "You do not have permission to do that.".to_string(),
        404 => "The requested record was not found.".to_string(),
        500..=599 => "The server is currently unavailable. Please try again later.".to_string(),
        _ => format!("Request failed (HTTP {}). Please try again.", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::request::{HttpBody, TransportError};
    use crate::test_support::{anonymous_client, signed_in_client, url};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let api = signed_in_client();
        api.http()
            .mock_response(HttpMethod::Get, &url("/books"), 200, json!([]));
        let _: Value = api.get_json("/books", Access::Authenticated).await.unwrap();

        let req = api.http().last_request().unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer test-token"));
    }

    #[tokio::test]
    async fn missing_token_fails_without_network() {
        let api = anonymous_client();
        let err = api
            .get_json::<Value>("/books", Access::Authenticated)
            .await
            .unwrap_err();
        assert!(err.is_unauthenticated());
        assert_eq!(api.http().request_count(), 0);
    }

    #[tokio::test]
    async fn expired_session_is_cleared_and_hook_fires() {
        let api = signed_in_client();
        let redirects = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&redirects);
        api.set_on_unauthorized(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        api.http().mock_response(
            HttpMethod::Get,
            &url("/users"),
            419,
            json!({ "message": "CSRF token mismatch." }),
        );

        let err = api
            .get_json::<Value>("/users", Access::Authenticated)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ApiErrorKind::Unauthenticated);
        assert_eq!(err.status(), Some(419));
        assert_eq!(redirects.load(Ordering::SeqCst), 1);
        assert!(!api.session().is_authenticated());
        assert!(api.session().storage().get("token").is_none());
        assert!(api.session().storage().get("user").is_none());
        // 不重试
        assert_eq!(api.http().request_count(), 1);
    }

    #[tokio::test]
    async fn bad_credentials_do_not_trigger_redirect() {
        let api = anonymous_client();
        let redirects = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&redirects);
        api.set_on_unauthorized(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        api.http().mock_response(
            HttpMethod::Post,
            &url("/login"),
            401,
            json!({ "message": "Invalid login details" }),
        );

        let err = api.login("a@b.c", "password1").await.unwrap_err();
        assert_eq!(err.message(), "Invalid login details");
        assert_eq!(redirects.load(Ordering::SeqCst), 0);

        let req = api.http().last_request().unwrap();
        assert!(!req.has_bearer());
        assert_eq!(
            req.body,
            HttpBody::Json(json!({ "email": "a@b.c", "password": "password1" }).to_string())
        );
    }

    #[tokio::test]
    async fn failed_relogin_keeps_existing_session() {
        let api = signed_in_client();
        let redirects = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&redirects);
        api.set_on_unauthorized(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        api.http().mock_response(
            HttpMethod::Post,
            &url("/login"),
            401,
            json!({ "message": "Invalid login details" }),
        );

        let err = api.login("a@b.c", "wrong-password").await.unwrap_err();

        assert_eq!(err.message(), "Invalid login details");
        assert_eq!(redirects.load(Ordering::SeqCst), 0);
        assert!(!api.http().last_request().unwrap().has_bearer());
        assert!(api.session().is_authenticated());
        assert_eq!(api.session().token().as_deref(), Some("test-token"));
        assert_eq!(api.session().storage().get("token").as_deref(), Some("test-token"));
        assert!(api.session().storage().get("user").is_some());
    }

    #[tokio::test]
    async fn successful_login_through_client() {
        let api = anonymous_client();
        api.http().mock_response(
            HttpMethod::Post,
            &url("/login"),
            200,
            json!({ "token": "fresh", "user": { "id": 2, "role": "librarian" } }),
        );
        let user = api.login(" lib@example.com ", "password1").await.unwrap();
        assert_eq!(user.id, Some(2));
        assert_eq!(api.session().token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn logout_survives_server_error() {
        let api = signed_in_client();
        api.http()
            .mock_response(HttpMethod::Post, &url("/logout"), 500, json!({}));
        api.logout().await;
        assert!(!api.session().is_authenticated());
        assert_eq!(api.http().calls(), vec![format!("POST {}", url("/logout"))]);
    }

    #[tokio::test]
    async fn server_messages_pass_through_verbatim() {
        let api = signed_in_client();
        api.http().mock_response(
            HttpMethod::Get,
            &url("/a"),
            422,
            json!({ "errors": { "title": ["The title field is required."] } }),
        );
        api.http()
            .mock_text(HttpMethod::Get, &url("/b"), 502, "<html>Bad Gateway</html>");
        api.http().mock_response(
            HttpMethod::Get,
            &url("/c"),
            200,
            json!({ "status": false, "message": "Duplicate ISBN" }),
        );

        let a = api.get_json::<Value>("/a", Access::Authenticated).await.unwrap_err();
        assert_eq!(a.message(), "The title field is required.");
        assert_eq!(a.status(), Some(422));
        assert_eq!(a.kind(), ApiErrorKind::Validation);

        let b = api.get_json::<Value>("/b", Access::Authenticated).await.unwrap_err();
        assert_eq!(b.message(), fallback_message(502));

        let c = api.get_json::<Value>("/c", Access::Authenticated).await.unwrap_err();
        assert_eq!(c.kind(), ApiErrorKind::Server);
        assert_eq!(c.message(), "Duplicate ISBN");
    }

    #[tokio::test]
    async fn transport_failures_are_network_errors() {
        let api = signed_in_client();
        api.http().mock_failure(
            HttpMethod::Get,
            &url("/books"),
            TransportError::Network("Failed to fetch".into()),
        );
        let err = api
            .get_json::<Value>("/books", Access::Authenticated)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Network);
        assert!(api.session().is_authenticated());
    }

    #[tokio::test]
    async fn dashboard_stats_unwraps_envelope() {
        let api = signed_in_client();
        api.http().mock_response(
            HttpMethod::Get,
            &url("/dashboard/stats"),
            200,
            json!({ "status": true, "data": { "total_books": 40, "deactivated_users": 2 } }),
        );
        let stats = api.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_books, 40);
        assert_eq!(stats.deactivated_users, 2);

        api.http().mock_response(
            HttpMethod::Get,
            &url("/dashboard/stats"),
            200,
            json!({ "status": true }),
        );
        let err = api.dashboard_stats().await.unwrap_err();
        assert_eq!(err.message(), "No stats returned from server");
    }

    #[tokio::test]
    async fn landing_news_is_public() {
        let api = anonymous_client();
        api.http().mock_response(
            HttpMethod::Get,
            &url("/news/landing?limit=3"),
            200,
            json!({ "data": [
                { "id": 1, "title": "A" }, { "id": 2, "title": "B" },
                { "id": 3, "title": "C" }, { "id": 4, "title": "D" }
            ] }),
        );
        let posts = api.landing_news(3).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert!(!api.http().last_request().unwrap().has_bearer());
    }

    #[test]
    fn plain_text_messages_are_used_when_short() {
        assert_eq!(server_message("Too many requests").as_deref(), Some("Too many requests"));
        assert_eq!(server_message(&"x".repeat(500)), None);
        assert_eq!(server_message(""), None);
        assert_eq!(
            server_message(r#"{"error":"Unauthorised"}"#).as_deref(),
            Some("Unauthorised")
        );
    }
}
