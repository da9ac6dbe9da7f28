//! multipart 表单模型
//!
//! 与平台无关的表单描述，由具体的 HTTP 客户端翻译为浏览器 `FormData`
//! 或其他实现。

use std::fmt;

/// 二进制附件（封面、头像、新闻配图、导入文件）
#[derive(Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 小写扩展名（不含点）
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

// 字节内容不打印
impl fmt::Debug for FileAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAttachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileAttachment),
}

/// 有序的 multipart 字段列表，允许重复键（如 `authors[]`）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartForm {
    fields: Vec<(String, FormValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((name.to_string(), FormValue::Text(value.into())));
        self
    }

    /// 仅在值存在且非空时追加
    pub fn text_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(v) if !v.trim().is_empty() => self.text(name, v),
            _ => self,
        }
    }

    /// 以 `name[]` 形式追加列表
    pub fn list<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = format!("{}[]", name);
        for value in values {
            self.fields
                .push((key.clone(), FormValue::Text(value.into())));
        }
        self
    }

    pub fn file(mut self, name: &str, file: FileAttachment) -> Self {
        self.fields.push((name.to_string(), FormValue::File(file)));
        self
    }

    pub fn file_opt(self, name: &str, file: Option<&FileAttachment>) -> Self {
        match file {
            Some(f) => self.file(name, f.clone()),
            None => self,
        }
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub fn has_files(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, v)| matches!(v, FormValue::File(_)))
    }

    /// 第一个同名文本字段
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(k, v)| match v {
            FormValue::Text(t) if k == name => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn get_all_text(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|(k, v)| match v {
                FormValue::Text(t) if k == name => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }
}
