//! 读者/馆员账号模型

use crate::form_data::{FileAttachment, MultipartForm};
use crate::protocol::ResourcePayload;
use crate::{Role, deserialize_flag, deserialize_role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "birthDate", alias = "birth_date", default)]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Option<Role>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub id_photo_path: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub verified: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn role_label(&self) -> &'static str {
        self.role.map(|r| r.label()).unwrap_or("Unassigned")
    }

    pub fn status_label(&self) -> &'static str {
        if self.verified { "Active" } else { "Deactivated" }
    }
}

/// `POST /register` 的载荷
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MemberRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip)]
    pub id_photo: Option<FileAttachment>,
    #[serde(skip)]
    pub profile_photo: Option<FileAttachment>,
}

impl ResourcePayload for MemberRegistration {
    fn has_attachment(&self) -> bool {
        self.id_photo.is_some() || self.profile_photo.is_some()
    }

    fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text("first_name", self.first_name.trim())
            .text("last_name", self.last_name.trim())
            .text("email", self.email.trim())
            .text("password", self.password.as_str())
            .text("birthDate", self.birth_date.as_str())
            .text("address", self.address.trim())
            .text_opt("role", self.role.map(|r| r.as_str()))
            .file_opt("id_photo", self.id_photo.as_ref())
            .file_opt("profile", self.profile_photo.as_ref())
    }
}

/// `PUT /updateProfile/{id}` 的载荷，只发送被设置的字段
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip)]
    pub profile_photo: Option<FileAttachment>,
    #[serde(skip)]
    pub id_photo: Option<FileAttachment>,
}

impl MemberUpdate {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn verified(verified: bool) -> Self {
        Self {
            verified: Some(verified),
            ..Default::default()
        }
    }
}

impl ResourcePayload for MemberUpdate {
    fn has_attachment(&self) -> bool {
        self.profile_photo.is_some() || self.id_photo.is_some()
    }

    fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text_opt("first_name", self.first_name.clone())
            .text_opt("last_name", self.last_name.clone())
            .text_opt("email", self.email.clone())
            .text_opt("birthDate", self.birth_date.clone())
            .text_opt("address", self.address.clone())
            .text_opt("role", self.role.map(|r| r.as_str()))
            .text_opt("verified", self.verified.map(|v| if v { "1" } else { "0" }))
            .file_opt("profile", self.profile_photo.as_ref())
            .file_opt("id_photo_path", self.id_photo.as_ref())
    }
}
