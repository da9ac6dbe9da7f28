//! HTTP 客户端实现
//!
//! 基于 `web_sys::fetch` 实现核心层的 `HttpClient`，
//! JSON 以字符串发送，multipart 表单翻译为浏览器 `FormData`。

use async_trait::async_trait;
use libris::request::{HttpBody, HttpClient, HttpRequest, HttpResponse, TransportError};
use libris::shared::{FileAttachment, FormValue, MultipartForm};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Headers, Request, RequestInit, Response};

fn build_error(context: &str, e: JsValue) -> TransportError {
    TransportError::Build(format!("{}: {:?}", context, e))
}

fn network_error(e: JsValue) -> TransportError {
    TransportError::Network(format!("{:?}", e))
}

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let headers = Headers::new().map_err(|e| build_error("创建 Headers 失败", e))?;
        headers
            .set("Accept", "application/json")
            .map_err(|e| build_error("设置 Header 失败", e))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| build_error("设置 Header 失败", e))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());

        // multipart 不设置 Content-Type，由浏览器生成 boundary
        match &req.body {
            HttpBody::Empty => {}
            HttpBody::Json(body) => opts.set_body(&JsValue::from_str(body)),
            HttpBody::Multipart(form) => opts.set_body(&to_form_data(form)?.into()),
        }

        let request = Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| build_error("构建请求失败", e))?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::Network("无法获取 window 对象".to_string()))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network_error)?;

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| TransportError::Network(format!("Response 类型转换失败: {:?}", e)))?;

        let status = response.status();
        let promise = response.text().map_err(network_error)?;
        let body = JsFuture::from(promise)
            .await
            .map_err(network_error)?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}

fn to_form_data(form: &MultipartForm) -> Result<FormData, TransportError> {
    let data = FormData::new().map_err(|e| build_error("创建 FormData 失败", e))?;
    for (name, value) in form.fields() {
        match value {
            FormValue::Text(text) => data
                .append_with_str(name, text)
                .map_err(|e| build_error("写入表单字段失败", e))?,
            FormValue::File(file) => {
                let blob = to_blob(file)?;
                data.append_with_blob_and_filename(name, &blob, &file.file_name)
                    .map_err(|e| build_error("写入文件字段失败", e))?
            }
        }
    }
    Ok(data)
}

fn to_blob(file: &FileAttachment) -> Result<Blob, TransportError> {
    let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
    let parts = js_sys::Array::of1(&bytes);
    let props = BlobPropertyBag::new();
    props.set_type(&file.mime_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &props)
        .map_err(|e| build_error("创建 Blob 失败", e))
}
