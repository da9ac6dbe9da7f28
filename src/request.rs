use libris_shared::{HEADER_AUTHORIZATION, MultipartForm};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub use libris_shared::protocol::HttpMethod;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::time::Duration;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Empty,
    Json(String),
    /// 由具体客户端翻译为浏览器 `FormData`，不设置 Content-Type
    Multipart(MultipartForm),
}

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: HttpBody,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: HttpBody::Empty,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = HttpBody::Json(body.to_string());
        self
    }

    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.body = HttpBody::Multipart(form);
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token))
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn has_bearer(&self) -> bool {
        self.header(HEADER_AUTHORIZATION)
            .is_some_and(|v| v.starts_with("Bearer "))
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输层错误（未拿到 HTTP 响应）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request could not be built: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request aborted")]
    Aborted,
}

/// HTTP 客户端特性 (Trait)
/// (?Send) 是因为浏览器环境下的 future 不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
#[derive(Clone)]
enum MockReply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(TransportError),
}

#[cfg(test)]
pub struct MockHttpClient {
    // ("METHOD url", reply)
    responses: RefCell<HashMap<String, MockReply>>,
    // 记录发出的请求
    pub requests: RefCell<Vec<HttpRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn key(method: HttpMethod, url: &str) -> String {
        format!("{} {}", method.as_str(), url)
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.mock_delayed(method, url, status, body, Duration::ZERO);
    }

    pub fn mock_delayed(
        &self,
        method: HttpMethod,
        url: &str,
        status: u16,
        body: serde_json::Value,
        delay: Duration,
    ) {
        self.responses.borrow_mut().insert(
            Self::key(method, url),
            MockReply::Respond {
                status,
                body: body.to_string(),
                delay,
            },
        );
    }

    pub fn mock_text(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
        self.responses.borrow_mut().insert(
            Self::key(method, url),
            MockReply::Respond {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            },
        );
    }

    pub fn mock_failure(&self, method: HttpMethod, url: &str, error: TransportError) {
        self.responses
            .borrow_mut()
            .insert(Self::key(method, url), MockReply::Fail(error));
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    /// 按顺序列出发出的 "METHOD url"
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| Self::key(r.method, &r.url))
            .collect()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = Self::key(req.method, &req.url);
        self.requests.borrow_mut().push(req);

        // 不跨 await 持有借用
        let reply = self.responses.borrow().get(&key).cloned();
        match reply {
            Some(MockReply::Respond {
                status,
                body,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse { status, body })
            }
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_sets_content_type() {
        let req = HttpRequest::new("http://x/books", HttpMethod::Post).with_json(&json!({ "a": 1 }));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.body, HttpBody::Json("{\"a\":1}".to_string()));
        assert!(!req.has_bearer());
        assert!(req.with_bearer("t").has_bearer());
    }

    #[tokio::test]
    async fn mock_replays_by_method_and_url() {
        let mock = MockHttpClient::new();
        mock.mock_response(HttpMethod::Get, "http://x/a", 200, json!({ "ok": true }));
        mock.mock_failure(HttpMethod::Delete, "http://x/a", TransportError::Network("down".into()));

        let ok = mock
            .send(HttpRequest::new("http://x/a", HttpMethod::Get))
            .await
            .unwrap();
        assert!(ok.is_success());

        let err = mock
            .send(HttpRequest::new("http://x/a", HttpMethod::Delete))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Network("down".into()));

        let missing = mock
            .send(HttpRequest::new("http://x/b", HttpMethod::Get))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(mock.calls(), vec!["GET http://x/a", "DELETE http://x/a", "GET http://x/b"]);
    }
}
