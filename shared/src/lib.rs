use serde::{Deserialize, Deserializer, Serialize};

pub mod barcode;
pub mod catalog;
pub mod dashboard;
pub mod date;
pub mod form_data;
pub mod member;
pub mod news;
pub mod pagination;
pub mod protocol;

pub use catalog::{Author, Book, BookPayload, Category, Genre};
pub use dashboard::DashboardStats;
pub use form_data::{FileAttachment, FormValue, MultipartForm};
pub use member::{Member, MemberRegistration, MemberUpdate};
pub use news::{NewsPayload, NewsPost};
pub use pagination::{ListResponse, Page, PageRequest, Paginated};
pub use protocol::{Books, Members, NewsPosts, Resource, ResourcePayload};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 持久化会话令牌使用的存储键
pub const TOKEN_KEY: &str = "token";
/// 持久化用户资料使用的存储键
pub const USER_KEY: &str = "user";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
/// multipart 请求中模拟 PUT 的字段名
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

// =========================================================
// 角色与用户资料 (Roles & Profile)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "administrator")]
    Admin,
    Librarian,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Librarian, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::User => "user",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Librarian => "Librarian",
            Role::User => "User",
        }
    }

    /// 宽松解析：忽略大小写，接受 "administrator"
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Some(Role::Admin),
            "librarian" => Some(Role::Librarian),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// 服务端的 role 字段有两种形态：字符串或 `{ id, role_type }` 对象
#[derive(Deserialize)]
#[serde(untagged)]
enum RoleField {
    Name(String),
    Object { role_type: Option<String> },
}

pub(crate) fn deserialize_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<RoleField>::deserialize(deserializer)?;
    Ok(match field {
        Some(RoleField::Name(name)) => Role::parse(&name),
        Some(RoleField::Object { role_type }) => role_type.as_deref().and_then(Role::parse),
        None => None,
    })
}

/// 服务端布尔值可能以 0/1 形式返回
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        Some(Flag::Text(s)) => matches!(s.as_str(), "1" | "true"),
        None => false,
    })
}

/// 当前登录用户的资料（会话的一部分）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub verified: bool,
    #[serde(default)]
    pub profile: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.email.clone().unwrap_or_else(|| "Unknown user".to_string())
        } else {
            name
        }
    }
}

// =========================================================
// 认证协议 (Auth Protocol)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_accepts_string_and_object_shapes() {
        let a: UserProfile = serde_json::from_value(json!({ "role": "administrator" })).unwrap();
        assert_eq!(a.role, Some(Role::Admin));

        let b: UserProfile =
            serde_json::from_value(json!({ "role": { "id": 2, "role_type": "Librarian" } }))
                .unwrap();
        assert_eq!(b.role, Some(Role::Librarian));

        let c: UserProfile = serde_json::from_value(json!({ "role": "janitor" })).unwrap();
        assert_eq!(c.role, None);
    }

    #[test]
    fn profile_survives_storage_round_trip() {
        let profile = UserProfile {
            id: Some(7),
            first_name: Some("Ada".into()),
            role: Some(Role::Admin),
            verified: true,
            ..Default::default()
        };
        let stored = serde_json::to_string(&profile).unwrap();
        let restored: UserProfile = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn verified_flag_accepts_integers() {
        let p: UserProfile = serde_json::from_value(json!({ "verified": 1 })).unwrap();
        assert!(p.verified);
        let q: UserProfile = serde_json::from_value(json!({ "verified": null })).unwrap();
        assert!(!q.verified);
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let p = UserProfile {
            email: Some("a@b.c".into()),
            ..Default::default()
        };
        assert_eq!(p.display_name(), "a@b.c");
    }
}
