//! 馆藏图书模型

use crate::form_data::{FileAttachment, MultipartForm};
use crate::protocol::ResourcePayload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<u64>,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default)]
    pub id: Option<u64>,
    pub genre_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: Option<u64>,
    pub category_name: String,
}

/// 服务端返回的图书记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    #[serde(rename = "ISBN", alias = "isbn", default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub accession_number: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub from_org_name: Option<String>,
    #[serde(default)]
    pub from_type: Option<String>,
    #[serde(default)]
    pub shelf_name: Option<String>,
    #[serde(default)]
    pub shelf_number: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub available_copies: Option<u32>,
    #[serde(default)]
    pub copies: Option<u32>,
}

impl Book {
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.author_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.genre_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.category_name.as_str())
    }

    /// "3 / 4" 形式的库存描述
    pub fn availability(&self) -> String {
        match (self.available_copies, self.copies) {
            (Some(available), Some(total)) => format!("{} / {}", available, total),
            (None, Some(total)) => total.to_string(),
            (Some(available), None) => available.to_string(),
            (None, None) => "-".to_string(),
        }
    }
}

/// 创建/更新图书的载荷，接口只接受 multipart
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BookPayload {
    pub title: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub publisher: Option<String>,
    pub publication_date: Option<String>,
    pub accession_number: Option<String>,
    pub category: Option<String>,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    #[serde(skip)]
    pub cover_image: Option<FileAttachment>,
    pub from_org_name: Option<String>,
    pub from_type: Option<String>,
    pub shelf_name: Option<String>,
    pub shelf_number: Option<u32>,
    pub copies: Option<u32>,
}

impl ResourcePayload for BookPayload {
    fn has_attachment(&self) -> bool {
        self.cover_image.is_some()
    }

    fn always_multipart(&self) -> bool {
        true
    }

    fn to_multipart(&self) -> MultipartForm {
        MultipartForm::new()
            .text("title", self.title.trim())
            .text("ISBN", self.isbn.trim())
            .text_opt("publisher", self.publisher.clone())
            .text_opt("publication_date", self.publication_date.clone())
            .text_opt("accession_number", self.accession_number.clone())
            .text_opt("category", self.category.clone())
            .list("authors", self.authors.iter().map(String::as_str))
            .list("genres", self.genres.iter().map(String::as_str))
            .file_opt("cover_image", self.cover_image.as_ref())
            .text_opt("from_org_name", self.from_org_name.clone())
            .text_opt("from_type", self.from_type.clone())
            .text_opt("shelf_name", self.shelf_name.clone())
            .text_opt("shelf_number", self.shelf_number.map(|n| n.to_string()))
            .text_opt("copies", self.copies.map(|n| n.to_string()))
    }
}

impl From<&Book> for BookPayload {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            publisher: book.publisher.clone(),
            publication_date: book.publication_date.clone(),
            accession_number: book.accession_number.clone(),
            category: book.category_name().map(str::to_string),
            authors: book.authors.iter().map(|a| a.author_name.clone()).collect(),
            genres: book.genres.iter().map(|g| g.genre_name.clone()).collect(),
            cover_image: None,
            from_org_name: book.from_org_name.clone(),
            from_type: book.from_type.clone(),
            shelf_name: book.shelf_name.clone(),
            shelf_number: book.shelf_number,
            copies: book.copies,
        }
    }
}
