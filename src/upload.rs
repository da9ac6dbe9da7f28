//! 图书批量导入上传
//!
//! 上传前检查文件类型与大小；上传过程可由用户取消。
//! 失败时把底层错误翻译成面向用户的提示，并附带排查建议。

use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use libris_shared::FileAttachment;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, ApiErrorKind};
use crate::observe::{Observable, SubscriptionId, lock};
use crate::request::HttpClient;
use crate::storage::KeyValueStorage;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];
/// `<input accept=...>` 的值
pub const ACCEPT_ATTRIBUTE: &str = ".xlsx,.xls,.csv";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";
pub const UPLOAD_CANCELLED_MESSAGE: &str = "Upload was cancelled.";

const NETWORK_TIPS: &[&str] = &[
    "Check your internet connection",
    "Try again in a few moments",
    "If using Wi-Fi, verify you're connected",
];
const OVERSIZE_TIPS: &[&str] = &[
    "Compress the file if possible",
    "Split data across multiple files",
    "Remove unnecessary data from the file",
];
const UNSUPPORTED_TIPS: &[&str] = &[
    "Save the spreadsheet as .xlsx, .xls or .csv",
    "Make sure the file extension matches its contents",
];
const SERVER_TIPS: &[&str] = &[
    "Wait a few minutes and try again",
    "Contact an administrator if the problem persists",
];

// =========================================================
// 文件检查
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("Please select a file first")]
    Missing,
    #[error("Please select a supported file type (.xlsx,.xls,.csv)")]
    UnsupportedType,
    #[error("File size is too large. Please select a file under 10MB.")]
    TooLarge,
}

impl UploadRejection {
    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            UploadRejection::Missing => &[],
            UploadRejection::UnsupportedType => UNSUPPORTED_TIPS,
            UploadRejection::TooLarge => OVERSIZE_TIPS,
        }
    }
}

/// 只凭文件名和大小检查（浏览器端在读取内容前调用）
pub fn check_file_meta(file_name: &str, size: u64) -> Result<(), UploadRejection> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadRejection::UnsupportedType);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    Ok(())
}

pub fn check_file(file: Option<&FileAttachment>) -> Result<&FileAttachment, UploadRejection> {
    let file = file.ok_or(UploadRejection::Missing)?;
    check_file_meta(&file.file_name, file.size())?;
    Ok(file)
}

// =========================================================
// 错误提示
// =========================================================

pub fn friendly_message(error: &ApiError) -> String {
    match (error.kind(), error.status()) {
        (ApiErrorKind::Aborted, _) => UPLOAD_CANCELLED_MESSAGE.to_string(),
        (ApiErrorKind::Network, _) => {
            "Network connection failed. Please check your internet connection and try again."
                .to_string()
        }
        (ApiErrorKind::Decode, _) => {
            "Received an invalid response from the server. Please try again.".to_string()
        }
        (ApiErrorKind::Unauthenticated, _) => error.message().to_string(),
        (_, Some(413)) => "The file is too large. Please select a smaller file.".to_string(),
        (_, Some(415)) => "Unsupported file type. Please use a different format.".to_string(),
        (_, Some(500..=599)) => {
            "The server is currently unavailable. Please try again later.".to_string()
        }
        (_, Some(status)) => format!("Server error ({}). Please try again.", status),
        _ => "Something went wrong during the upload. Please try again.".to_string(),
    }
}

pub fn troubleshooting_tips(error: &ApiError) -> &'static [&'static str] {
    match (error.kind(), error.status()) {
        (ApiErrorKind::Network, _) => NETWORK_TIPS,
        (_, Some(413)) => OVERSIZE_TIPS,
        (_, Some(415)) => UNSUPPORTED_TIPS,
        (_, Some(500..=599)) => SERVER_TIPS,
        _ => &[],
    }
}

// =========================================================
// 上传状态
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading { file_name: String },
    Succeeded(String),
    Failed {
        message: String,
        tips: &'static [&'static str],
    },
    Cancelled,
}

impl UploadStatus {
    fn rejected(rejection: &UploadRejection) -> Self {
        UploadStatus::Failed {
            message: rejection.to_string(),
            tips: rejection.tips(),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            UploadStatus::Idle => None,
            UploadStatus::Uploading { file_name } => Some(format!("Uploading {}...", file_name)),
            UploadStatus::Succeeded(message) => Some(message.clone()),
            UploadStatus::Failed { message, .. } => Some(message.clone()),
            UploadStatus::Cancelled => Some(UPLOAD_CANCELLED_MESSAGE.to_string()),
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadStatus::Uploading { .. })
    }
}

// =========================================================
// Uploader
// =========================================================

pub struct Uploader<C, S: KeyValueStorage> {
    api: Arc<ApiClient<C, S>>,
    status: Observable<UploadStatus>,
    abort: Mutex<Option<AbortHandle>>,
}

impl<C: HttpClient, S: KeyValueStorage> Uploader<C, S> {
    pub fn new(api: Arc<ApiClient<C, S>>) -> Self {
        Self {
            api,
            status: Observable::new(UploadStatus::Idle),
            abort: Mutex::new(None),
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status.get()
    }

    pub fn subscribe(&self, f: impl Fn(&UploadStatus) + Send + Sync + 'static) -> SubscriptionId {
        self.status.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.status.unsubscribe(id);
    }

    /// 选择文件后立即检查，不合格时直接显示原因
    pub fn select(&self, file_name: &str, size: u64) -> Result<(), UploadRejection> {
        match check_file_meta(file_name, size) {
            Ok(()) => {
                self.status.set(UploadStatus::Idle);
                Ok(())
            }
            Err(rejection) => {
                self.status.set(UploadStatus::rejected(&rejection));
                Err(rejection)
            }
        }
    }

    /// 上传并返回最终状态
    #[tracing::instrument(name = "upload.import_books", skip_all)]
    pub async fn upload(&self, file: Option<FileAttachment>) -> UploadStatus {
        let checked = check_file(file.as_ref()).map(|_| ());
        let file = match (checked, file) {
            (Ok(()), Some(file)) => file,
            (Err(rejection), _) => return self.reject(&rejection),
            (Ok(()), None) => return self.reject(&UploadRejection::Missing),
        };

        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = lock(&self.abort).replace(handle) {
            previous.abort();
        }
        self.status.set(UploadStatus::Uploading {
            file_name: file.file_name.clone(),
        });

        let result = Abortable::new(self.api.import_books(file), registration).await;
        lock(&self.abort).take();

        let status = match result {
            Err(_aborted) => {
                info!("upload cancelled by user");
                UploadStatus::Cancelled
            }
            Ok(Ok(message)) => {
                UploadStatus::Succeeded(message.unwrap_or_else(|| UPLOAD_SUCCESS_MESSAGE.to_string()))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "upload failed");
                UploadStatus::Failed {
                    message: friendly_message(&e),
                    tips: troubleshooting_tips(&e),
                }
            }
        };
        self.status.set(status.clone());
        status
    }

    fn reject(&self, rejection: &UploadRejection) -> UploadStatus {
        let status = UploadStatus::rejected(rejection);
        self.status.set(status.clone());
        status
    }

    /// 取消正在进行的上传；没有上传时返回 false
    pub fn cancel(&self) -> bool {
        match lock(&self.abort).take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn reset(&self) {
        self.cancel();
        self.status.set(UploadStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HttpMethod, TransportError};
    use crate::test_support::{TestClient, signed_in_client, url};
    use serde_json::json;
    use std::time::Duration;

    fn sheet() -> FileAttachment {
        FileAttachment::new("books.xlsx", "application/vnd.ms-excel", vec![0; 128])
    }

    fn uploader() -> Uploader<crate::request::MockHttpClient, crate::storage::MemoryStorage> {
        let api: TestClient = signed_in_client();
        Uploader::new(Arc::new(api))
    }

    #[test]
    fn rejects_bad_files_before_upload() {
        assert_eq!(check_file(None).unwrap_err(), UploadRejection::Missing);
        assert_eq!(
            check_file_meta("notes.txt", 10).unwrap_err().to_string(),
            "Please select a supported file type (.xlsx,.xls,.csv)"
        );
        assert_eq!(
            check_file_meta("books.CSV", MAX_UPLOAD_BYTES + 1).unwrap_err().to_string(),
            "File size is too large. Please select a file under 10MB."
        );
        assert!(check_file_meta("books.CSV", MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn status_codes_map_to_friendly_text() {
        let server = |status| ApiError::server("raw").with_status(status);
        assert_eq!(
            friendly_message(&server(413)),
            "The file is too large. Please select a smaller file."
        );
        assert_eq!(
            friendly_message(&server(415)),
            "Unsupported file type. Please use a different format."
        );
        assert_eq!(
            friendly_message(&server(502)),
            "The server is currently unavailable. Please try again later."
        );
        assert_eq!(friendly_message(&server(422)), "Server error (422). Please try again.");
        assert_eq!(friendly_message(&ApiError::aborted()), UPLOAD_CANCELLED_MESSAGE);
        assert_eq!(troubleshooting_tips(&server(413)), OVERSIZE_TIPS);
    }

    #[tokio::test]
    async fn successful_upload_reports_server_message() {
        let uploader = uploader();
        uploader.api.http().mock_response(
            HttpMethod::Post,
            &url("/books/import"),
            200,
            json!({ "message": "42 books imported" }),
        );

        let status = uploader.upload(Some(sheet())).await;
        assert_eq!(status, UploadStatus::Succeeded("42 books imported".to_string()));

        let req = uploader.api.http().last_request().unwrap();
        assert!(req.has_bearer());
    }

    #[tokio::test]
    async fn network_failure_carries_tips() {
        let uploader = uploader();
        uploader.api.http().mock_failure(
            HttpMethod::Post,
            &url("/books/import"),
            TransportError::Network("Failed to fetch".into()),
        );

        let UploadStatus::Failed { message, tips } = uploader.upload(Some(sheet())).await else {
            panic!("expected failure");
        };
        assert!(message.starts_with("Network connection failed"));
        assert_eq!(tips, NETWORK_TIPS);
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let uploader = uploader();
        uploader
            .api
            .http()
            .mock_text(HttpMethod::Post, &url("/books/import"), 200, "<html>ok</html>");

        let status = uploader.upload(Some(sheet())).await;
        assert_eq!(
            status.message().as_deref(),
            Some("Received an invalid response from the server. Please try again.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn upload_can_be_cancelled() {
        let uploader = uploader();
        uploader.api.http().mock_delayed(
            HttpMethod::Post,
            &url("/books/import"),
            200,
            json!({ "message": "done" }),
            Duration::from_secs(5),
        );

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(uploader.status().is_uploading());
            uploader.cancel()
        };
        let (status, cancelled) = futures::join!(uploader.upload(Some(sheet())), cancel);

        assert!(cancelled);
        assert_eq!(status, UploadStatus::Cancelled);
        assert!(!uploader.cancel());
    }

    #[tokio::test]
    async fn rejected_file_makes_no_request() {
        let uploader = uploader();
        let status = uploader
            .upload(Some(FileAttachment::new("cover.png", "image/png", vec![1])))
            .await;
        assert!(matches!(status, UploadStatus::Failed { .. }));
        assert_eq!(uploader.api.http().request_count(), 0);
        assert!(uploader.select("books.xls", 1).is_ok());
        assert_eq!(uploader.status(), UploadStatus::Idle);
    }
}
