//! Libris 客户端核心
//!
//! 与平台无关的业务层，浏览器相关的实现（fetch、LocalStorage、定时器）
//! 由前端 crate 通过 trait 注入：
//! - `request::HttpClient`: 发送 HTTP 请求
//! - `storage::KeyValueStorage`: 持久化会话
//! - `debounce::Sleeper`: 延时
//!
//! 数据流：列表视图 → `ResourceList` → `ApiClient`（附加令牌）→ 远程 API。

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod forms;
pub mod list_view;
pub mod loader;
pub mod observe;
pub mod request;
pub mod resource;
pub mod session;
pub mod storage;
pub mod upload;

#[cfg(test)]
mod test_support;

pub use api::{Access, ApiClient};
pub use config::ClientConfig;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use list_view::{ListView, TableView};
pub use observe::Observable;
pub use resource::{FetchOutcome, ListState, ResourceList};
pub use session::{AuthGateway, AuthState, SessionState, SessionStore};

pub use libris_shared as shared;
