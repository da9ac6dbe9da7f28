//! 新闻/公告模型

use crate::deserialize_flag;
use crate::form_data::{FileAttachment, MultipartForm};
use crate::protocol::ResourcePayload;
use serde::{Deserialize, Serialize};

/// 阅读时长估算使用的每分钟字数
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsPost {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl NewsPost {
    /// 摘要缺失时截取正文开头
    pub fn summary(&self, max_chars: usize) -> String {
        if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
            return excerpt.to_string();
        }
        let text = self.content.trim();
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }

    pub fn reading_minutes(&self) -> usize {
        reading_minutes(&self.content)
    }
}

/// 创建/更新新闻的载荷
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NewsPayload {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub is_published: bool,
    pub published_at: Option<String>,
    #[serde(skip)]
    pub featured_image: Option<FileAttachment>,
}

impl ResourcePayload for NewsPayload {
    fn has_attachment(&self) -> bool {
        self.featured_image.is_some()
    }

    fn always_multipart(&self) -> bool {
        true
    }

    fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text("title", self.title.trim())
            .text("slug", self.slug.trim())
            .text_opt("excerpt", self.excerpt.clone())
            .text("content", self.content.as_str())
            // 服务端的 boolean 校验只接受 1/0
            .text("is_published", if self.is_published { "1" } else { "0" })
            .text_opt("published_at", self.published_at.clone())
            .file_opt("featured_image", self.featured_image.as_ref())
    }
}

impl From<&NewsPost> for NewsPayload {
    fn from(post: &NewsPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
            is_published: post.is_published,
            published_at: post.published_at.clone(),
            featured_image: None,
        }
    }
}

/// 由标题生成 URL slug
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// 至少一分钟
pub fn reading_minutes(content: &str) -> usize {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
