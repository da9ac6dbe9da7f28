use crate::form_data::MultipartForm;
use crate::{Book, BookPayload, Member, MemberRegistration, MemberUpdate, NewsPayload, NewsPost};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

// =========================================================
// Endpoint Definitions
// =========================================================

pub mod endpoints {
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const DASHBOARD_STATS: &str = "/dashboard/stats";
    pub const NEWS_LANDING: &str = "/news/landing";
    pub const BOOK_IMPORT: &str = "/books/import";
}

// =========================================================
// Response Envelopes
// =========================================================

fn default_status() -> bool {
    true
}

/// `{ status, data, message }` 形式的响应信封
///
/// 缺省的 `status` 视为成功。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 单条记录响应：`{ data: {...} }`（或 `News`/`user`/`book` 键）与裸对象皆可
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ItemResponse<T> {
    Wrapped {
        #[serde(alias = "News", alias = "news", alias = "user", alias = "book")]
        data: T,
    },
    Bare(T),
}

impl<T> ItemResponse<T> {
    pub fn into_inner(self) -> T {
        match self {
            ItemResponse::Wrapped { data } | ItemResponse::Bare(data) => data,
        }
    }
}

// =========================================================
// Resource Protocol
// =========================================================

/// 编码后的请求体
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedPayload {
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// 可提交的创建/更新载荷
///
/// 带有二进制附件时以 multipart 发送，否则为 JSON。
pub trait ResourcePayload: Serialize + Clone + Send + Sync + 'static {
    fn has_attachment(&self) -> bool;

    fn to_multipart(&self) -> MultipartForm;

    /// 接口只接受 multipart 时返回 true
    fn always_multipart(&self) -> bool {
        false
    }

    fn encode(&self) -> Result<EncodedPayload, serde_json::Error> {
        if self.always_multipart() || self.has_attachment() {
            Ok(EncodedPayload::Multipart(self.to_multipart()))
        } else {
            Ok(EncodedPayload::Json(serde_json::to_value(self)?))
        }
    }
}

/// 分页资源的描述：路径、载荷类型与主键
pub trait Resource: Send + Sync + 'static {
    type Item: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static;
    type Create: ResourcePayload;
    type Update: ResourcePayload;

    /// 用于日志与错误信息
    const NAME: &'static str;
    const COLLECTION: &'static str;
    /// multipart 更新改用 POST 并附带 `_method=PUT`
    const SPOOF_MULTIPART_PUT: bool = false;

    fn id(item: &Self::Item) -> u64;

    fn create_path() -> String {
        Self::COLLECTION.to_string()
    }

    fn item_path(id: u64) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }

    fn update_path(id: u64) -> String {
        Self::item_path(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Books;

impl Resource for Books {
    type Item = Book;
    type Create = BookPayload;
    type Update = BookPayload;
    const NAME: &'static str = "book";
    const COLLECTION: &'static str = "/books";

    fn id(item: &Book) -> u64 {
        item.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewsPosts;

impl Resource for NewsPosts {
    type Item = NewsPost;
    type Create = NewsPayload;
    type Update = NewsPayload;
    const NAME: &'static str = "news";
    const COLLECTION: &'static str = "/news";
    const SPOOF_MULTIPART_PUT: bool = true;

    fn id(item: &NewsPost) -> u64 {
        item.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Members;

impl Resource for Members {
    type Item = Member;
    type Create = MemberRegistration;
    type Update = MemberUpdate;
    const NAME: &'static str = "user";
    const COLLECTION: &'static str = "/users";
    const SPOOF_MULTIPART_PUT: bool = true;

    fn id(item: &Member) -> u64 {
        item.id
    }

    fn create_path() -> String {
        "/register".to_string()
    }

    fn update_path(id: u64) -> String {
        format!("/updateProfile/{}", id)
    }
}

// =========================================================
// Helpers
// =========================================================

/// 查询参数的百分号编码（保留 RFC 3986 unreserved 字符）
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_paths_differ_from_collection() {
        assert_eq!(Members::create_path(), "/register");
        assert_eq!(Members::update_path(4), "/updateProfile/4");
        assert_eq!(Members::item_path(4), "/users/4");
        assert_eq!(Books::update_path(9), "/books/9");
    }

    #[test]
    fn envelope_defaults_to_success() {
        let env: ApiEnvelope<u32> = serde_json::from_value(json!({ "data": 3 })).unwrap();
        assert!(env.status);
        assert_eq!(env.data, Some(3));

        let failed: ApiEnvelope<u32> =
            serde_json::from_value(json!({ "status": false, "message": "nope" })).unwrap();
        assert!(!failed.status);
        assert_eq!(failed.data, None);
    }

    #[test]
    fn item_response_unwraps_known_keys() {
        let wrapped: ItemResponse<Vec<u8>> =
            serde_json::from_value(json!({ "News": [1] })).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1]);
        let bare: ItemResponse<Vec<u8>> = serde_json::from_value(json!([2])).unwrap();
        assert_eq!(bare.into_inner(), vec![2]);
    }

    #[test]
    fn encodes_non_ascii_and_reserved() {
        assert_eq!(encode_component("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_component("é"), "%C3%A9");
        assert_eq!(encode_component("x-y_z.~"), "x-y_z.~");
    }
}
