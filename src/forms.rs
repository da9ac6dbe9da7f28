//! 表单草稿与提交
//!
//! 每个编辑页面持有一个草稿（纯数据，不持久化）。
//! 提交时先做本地必填校验，校验失败以 `SubmitOutcome::Invalid` 返回且不发出任何请求；
//! 网络或服务端错误以 `Err` 返回，由页面决定如何提示。

use libris_shared::date::{from_input_value, is_valid_date, to_input_value};
use libris_shared::news::slugify;
use libris_shared::protocol::Resource;
use libris_shared::{
    Book, BookPayload, FileAttachment, LoginRequest, Member, MemberRegistration, MemberUpdate,
    NewsPayload, NewsPost, Role, UserProfile,
};
use tracing::debug;

use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;
use crate::resource::ResourceList;
use crate::storage::KeyValueStorage;

pub const MIN_PASSWORD_LEN: usize = 8;

// =========================================================
// 校验结果
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T = ()> {
    Saved(T),
    Invalid(ValidationError),
}

impl<T> SubmitOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved(_))
    }
}

/// 草稿到请求载荷的转换
pub trait Draft {
    type Payload;

    fn validate(&self) -> Result<Self::Payload, ValidationError>;
}

fn required(field: &'static str, value: &str, message: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::new(field, message))
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn whole_number(field: &'static str, value: &str, message: &str) -> Result<Option<u32>, ValidationError> {
    match optional(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::new(field, message)),
    }
}

/// "Ada Lovelace, Alan Turing" → ["Ada Lovelace", "Alan Turing"]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =========================================================
// 提交
// =========================================================

pub async fn submit_create<R, C, S, D>(
    list: &ResourceList<R, C, S>,
    draft: &D,
) -> ApiResult<SubmitOutcome>
where
    R: Resource,
    C: HttpClient,
    S: KeyValueStorage,
    D: Draft<Payload = R::Create>,
{
    let payload = match draft.validate() {
        Ok(payload) => payload,
        Err(invalid) => {
            debug!(field = invalid.field, "draft rejected before submit");
            return Ok(SubmitOutcome::Invalid(invalid));
        }
    };
    list.create(&payload).await?;
    Ok(SubmitOutcome::Saved(()))
}

pub async fn submit_update<R, C, S, D>(
    list: &ResourceList<R, C, S>,
    id: u64,
    draft: &D,
) -> ApiResult<SubmitOutcome>
where
    R: Resource,
    C: HttpClient,
    S: KeyValueStorage,
    D: Draft<Payload = R::Update>,
{
    let payload = match draft.validate() {
        Ok(payload) => payload,
        Err(invalid) => {
            debug!(field = invalid.field, "draft rejected before submit");
            return Ok(SubmitOutcome::Invalid(invalid));
        }
    };
    list.update(id, &payload).await?;
    Ok(SubmitOutcome::Saved(()))
}

pub async fn submit_login<C, S>(
    api: &ApiClient<C, S>,
    draft: &LoginDraft,
) -> ApiResult<SubmitOutcome<UserProfile>>
where
    C: HttpClient,
    S: KeyValueStorage,
{
    let credentials = match draft.validate() {
        Ok(credentials) => credentials,
        Err(invalid) => return Ok(SubmitOutcome::Invalid(invalid)),
    };
    let user = api.login(&credentials.email, &credentials.password).await?;
    Ok(SubmitOutcome::Saved(user))
}

// =========================================================
// 登录
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginDraft {
    pub email: String,
    pub password: String,
}

impl Draft for LoginDraft {
    type Payload = LoginRequest;

    fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let email = required("email", &self.email, "Email is required.")?;
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "Password is required."));
        }
        Ok(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }
}

// =========================================================
// 图书
// =========================================================

/// 图书表单；数字字段以输入框原文保存
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub isbn: String,
    pub publisher: String,
    pub publication_date: String,
    pub accession_number: String,
    pub category: String,
    pub authors: String,
    pub genres: String,
    pub from_org_name: String,
    pub from_type: String,
    pub shelf_name: String,
    pub shelf_number: String,
    pub copies: String,
    pub cover_image: Option<FileAttachment>,
}

impl BookDraft {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            publisher: book.publisher.clone().unwrap_or_default(),
            publication_date: book.publication_date.clone().unwrap_or_default(),
            accession_number: book.accession_number.clone().unwrap_or_default(),
            category: book.category_name().unwrap_or_default().to_string(),
            authors: book.author_names(),
            genres: book.genre_names(),
            from_org_name: book.from_org_name.clone().unwrap_or_default(),
            from_type: book.from_type.clone().unwrap_or_default(),
            shelf_name: book.shelf_name.clone().unwrap_or_default(),
            shelf_number: book.shelf_number.map(|n| n.to_string()).unwrap_or_default(),
            copies: book.copies.map(|n| n.to_string()).unwrap_or_default(),
            cover_image: None,
        }
    }
}

impl Draft for BookDraft {
    type Payload = BookPayload;

    fn validate(&self) -> Result<BookPayload, ValidationError> {
        let title = required("title", &self.title, "Title is required.")?;
        let isbn = required("isbn", &self.isbn, "ISBN is required.")?;

        let publication_date = optional(&self.publication_date);
        if let Some(date) = &publication_date {
            if !is_valid_date(date) {
                return Err(ValidationError::new(
                    "publication_date",
                    "Publication date must be a valid date.",
                ));
            }
        }

        let copies = whole_number("copies", &self.copies, "Copies must be a whole number.")?;
        let shelf_number = whole_number(
            "shelf_number",
            &self.shelf_number,
            "Shelf number must be a whole number.",
        )?;

        Ok(BookPayload {
            title,
            isbn,
            publisher: optional(&self.publisher),
            publication_date,
            accession_number: optional(&self.accession_number),
            category: optional(&self.category),
            authors: split_list(&self.authors),
            genres: split_list(&self.genres),
            cover_image: self.cover_image.clone(),
            from_org_name: optional(&self.from_org_name),
            from_type: optional(&self.from_type),
            shelf_name: optional(&self.shelf_name),
            shelf_number,
            copies,
        })
    }
}

// =========================================================
// 新闻
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub is_published: bool,
    /// `datetime-local` 输入框的值
    pub published_at: String,
    pub featured_image: Option<FileAttachment>,
}

impl NewsDraft {
    pub fn from_post(post: &NewsPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            content: post.content.clone(),
            is_published: post.is_published,
            published_at: post
                .published_at
                .as_deref()
                .map(to_input_value)
                .unwrap_or_default(),
            featured_image: None,
        }
    }

    /// slug 为空时由标题生成
    pub fn fill_slug(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
    }
}

impl Draft for NewsDraft {
    type Payload = NewsPayload;

    fn validate(&self) -> Result<NewsPayload, ValidationError> {
        let title = required("title", &self.title, "Title is required.")?;
        let slug = required("slug", &self.slug, "Slug is required.")?;
        let content = required("content", &self.content, "Content is required.")?;

        let published_at = match optional(&self.published_at) {
            None => None,
            Some(raw) => Some(from_input_value(&raw).ok_or_else(|| {
                ValidationError::new("published_at", "Publish date is not a valid date and time.")
            })?),
        };

        Ok(NewsPayload {
            title,
            slug,
            excerpt: optional(&self.excerpt),
            content,
            is_published: self.is_published,
            published_at,
            featured_image: self.featured_image.clone(),
        })
    }
}

// =========================================================
// 用户
// =========================================================

/// 新用户注册
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub birth_date: String,
    pub address: String,
    pub role: Option<Role>,
    pub id_photo: Option<FileAttachment>,
    pub profile_photo: Option<FileAttachment>,
}

impl Draft for MemberDraft {
    type Payload = MemberRegistration;

    fn validate(&self) -> Result<MemberRegistration, ValidationError> {
        const NAME_MESSAGE: &str = "First and last name are required.";
        let first_name = required("first_name", &self.first_name, NAME_MESSAGE)?;
        let last_name = required("last_name", &self.last_name, NAME_MESSAGE)?;
        let email = required("email", &self.email, "Email is required.")?;

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                "Password is required and must be at least 8 characters.",
            ));
        }
        if self.password != self.password_confirmation {
            return Err(ValidationError::new(
                "password_confirmation",
                "Passwords do not match",
            ));
        }

        let birth_date = required("birth_date", &self.birth_date, "Birth date is required.")?;
        let address = required("address", &self.address, "Address is required.")?;
        if self.id_photo.is_none() {
            return Err(ValidationError::new("id_photo", "ID photo is required."));
        }

        Ok(MemberRegistration {
            first_name,
            last_name,
            email,
            password: self.password.clone(),
            birth_date,
            address,
            role: self.role,
            id_photo: self.id_photo.clone(),
            profile_photo: self.profile_photo.clone(),
        })
    }
}

/// 编辑用户资料
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberEditDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: String,
    pub address: String,
    pub profile_photo: Option<FileAttachment>,
}

impl MemberEditDraft {
    pub fn from_member(member: &Member) -> Self {
        Self {
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            email: member.email.clone(),
            birth_date: member.birth_date.clone().unwrap_or_default(),
            address: member.address.clone().unwrap_or_default(),
            profile_photo: None,
        }
    }
}

impl Draft for MemberEditDraft {
    type Payload = MemberUpdate;

    fn validate(&self) -> Result<MemberUpdate, ValidationError> {
        const NAME_MESSAGE: &str = "First and last name are required.";
        let first_name = required("first_name", &self.first_name, NAME_MESSAGE)?;
        let last_name = required("last_name", &self.last_name, NAME_MESSAGE)?;
        let email = required("email", &self.email, "Email is required.")?;

        let birth_date = optional(&self.birth_date);
        if let Some(date) = &birth_date {
            if !is_valid_date(date) {
                return Err(ValidationError::new(
                    "birth_date",
                    "Birth date must be a valid date.",
                ));
            }
        }

        Ok(MemberUpdate {
            first_name: Some(first_name),
            last_name: Some(last_name),
            email: Some(email),
            birth_date,
            address: optional(&self.address),
            profile_photo: self.profile_photo.clone(),
            ..Default::default()
        })
    }
}

/// 修改用户角色
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleDraft {
    pub role: Option<Role>,
}

impl RoleDraft {
    pub fn from_member(member: &Member) -> Self {
        Self { role: member.role }
    }
}

impl Draft for RoleDraft {
    type Payload = MemberUpdate;

    fn validate(&self) -> Result<MemberUpdate, ValidationError> {
        self.role
            .map(MemberUpdate::role)
            .ok_or_else(|| ValidationError::new("role", "Please select a role."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Access;
    use crate::request::{HttpBody, HttpMethod};
    use crate::test_support::{anonymous_client, signed_in_client, url};
    use libris_shared::protocol::{Books, Members, NewsPosts};
    use serde_json::json;
    use std::sync::Arc;

    fn photo() -> FileAttachment {
        FileAttachment::new("id.png", "image/png", vec![1, 2, 3])
    }

    fn valid_member() -> MemberDraft {
        MemberDraft {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            password: "cobol1959".into(),
            password_confirmation: "cobol1959".into(),
            birth_date: "1906-12-09".into(),
            address: "Arlington".into(),
            role: Some(Role::Librarian),
            id_photo: Some(photo()),
            profile_photo: None,
        }
    }

    #[test]
    fn member_registration_messages() {
        let cases: [(fn(&mut MemberDraft), &str); 7] = [
            (|d| d.last_name.clear(), "First and last name are required."),
            (|d| d.email = "  ".into(), "Email is required."),
            (
                |d| d.password = "short".into(),
                "Password is required and must be at least 8 characters.",
            ),
            (|d| d.password_confirmation = "cobol1960".into(), "Passwords do not match"),
            (|d| d.birth_date.clear(), "Birth date is required."),
            (|d| d.address.clear(), "Address is required."),
            (|d| d.id_photo = None, "ID photo is required."),
        ];

        for (mutate, expected) in cases {
            let mut draft = valid_member();
            mutate(&mut draft);
            assert_eq!(draft.validate().unwrap_err().message, expected);
        }

        let reg = valid_member().validate().unwrap();
        assert_eq!(reg.role, Some(Role::Librarian));
    }

    #[test]
    fn book_draft_builds_payload() {
        let draft = BookDraft {
            title: " Kill ".into(),
            isbn: "9788417563114".into(),
            authors: "Ada Lovelace, , Alan Turing".into(),
            copies: "4".into(),
            ..Default::default()
        };
        let payload = draft.validate().unwrap();
        assert_eq!(payload.title, "Kill");
        assert_eq!(payload.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(payload.copies, Some(4));
        assert_eq!(payload.publisher, None);

        let bad = BookDraft {
            copies: "four".into(),
            ..draft.clone()
        };
        assert_eq!(bad.validate().unwrap_err().field, "copies");

        let untitled = BookDraft {
            title: String::new(),
            ..draft
        };
        assert_eq!(untitled.validate().unwrap_err().message, "Title is required.");
    }

    #[test]
    fn news_draft_requires_title_slug_content() {
        let mut draft = NewsDraft {
            title: "Summer Reading Club".into(),
            content: "Join us.".into(),
            published_at: "2024-06-01T09:30".into(),
            ..Default::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "slug");

        draft.fill_slug();
        assert_eq!(draft.slug, "summer-reading-club");
        let payload = draft.validate().unwrap();
        assert_eq!(payload.published_at.as_deref(), Some("2024-06-01 09:30:00"));

        draft.content = "   ".into();
        assert_eq!(draft.validate().unwrap_err().message, "Content is required.");
    }

    #[test]
    fn role_draft_needs_selection() {
        assert!(RoleDraft::default().validate().is_err());
        assert_eq!(
            RoleDraft { role: Some(Role::Admin) }.validate().unwrap(),
            MemberUpdate::role(Role::Admin)
        );
    }

    #[tokio::test]
    async fn invalid_draft_makes_no_request() {
        let list: ResourceList<NewsPosts, _, _> =
            ResourceList::new(Arc::new(signed_in_client()), Access::Authenticated, 10);

        let outcome = submit_create(&list, &NewsDraft::default()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Invalid(ref e) if e.field == "title"));
        assert_eq!(list.api().http().request_count(), 0);
    }

    #[tokio::test]
    async fn submit_create_posts_and_refetches() {
        let list: ResourceList<Books, _, _> =
            ResourceList::new(Arc::new(signed_in_client()), Access::Authenticated, 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Post, &url("/books"), 201, json!({ "status": true }));
        http.mock_response(
            HttpMethod::Get,
            &url("/books?page=1&per_page=10"),
            200,
            json!({ "data": [], "current_page": 1, "last_page": 1, "total": 0 }),
        );

        let draft = BookDraft {
            title: "Kill".into(),
            isbn: "9788417563114".into(),
            copies: "4".into(),
            ..Default::default()
        };
        let outcome = submit_create(&list, &draft).await.unwrap();

        assert!(outcome.is_saved());
        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn server_rejection_is_an_error() {
        let list: ResourceList<Members, _, _> =
            ResourceList::new(Arc::new(signed_in_client()), Access::Authenticated, 10);
        list.api().http().mock_response(
            HttpMethod::Post,
            &url("/register"),
            422,
            json!({ "errors": { "email": ["The email has already been taken."] } }),
        );

        let err = submit_create(&list, &valid_member()).await.unwrap_err();
        assert_eq!(err.message(), "The email has already been taken.");

        let req = list.api().http().last_request().unwrap();
        let HttpBody::Multipart(form) = req.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.get_text("birthDate"), Some("1906-12-09"));
        assert!(form.has_files());
    }

    #[tokio::test]
    async fn login_draft_validates_before_calling_server() {
        let api = anonymous_client();
        let outcome = submit_login(&api, &LoginDraft::default()).await.unwrap();
        assert!(!outcome.is_saved());
        assert_eq!(api.http().request_count(), 0);

        api.http().mock_response(
            HttpMethod::Post,
            &url("/login"),
            200,
            json!({ "token": "t-1", "user": { "id": 9, "first_name": "Lin", "role": "librarian" } }),
        );
        let draft = LoginDraft {
            email: "lin@example.com".into(),
            password: "hunter22".into(),
        };
        let SubmitOutcome::Saved(user) = submit_login(&api, &draft).await.unwrap() else {
            panic!("expected login to succeed");
        };
        assert_eq!(user.role, Some(Role::Librarian));
        assert!(api.session().is_authenticated());
    }
}
