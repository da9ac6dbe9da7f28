//! DOM 工具函数
//!
//! 确认框、文件读取与下载，全部集中在这里，组件层不直接接触 `web_sys`。

use libris::shared::FileAttachment;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, File, HtmlAnchorElement, HtmlInputElement};

/// 浏览器原生确认框；无法弹出时视为取消
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 从 `<input type="file">` 的 change 事件中取出第一个文件
pub fn selected_file(ev: &Event) -> Option<File> {
    let input: HtmlInputElement = ev.target()?.dyn_into().ok()?;
    input.files()?.get(0)
}

/// 读取文件内容
pub async fn read_file(file: &File) -> Result<FileAttachment, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("读取文件失败: {:?}", e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();

    let mime_type = match file.type_() {
        t if t.is_empty() => "application/octet-stream".to_string(),
        t => t,
    };
    Ok(FileAttachment::new(file.name(), mime_type, bytes))
}

/// 通过临时 `<a download>` 触发下载
pub fn download(href: &str, file_name: &str) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "无法获取 document 对象".to_string())?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| format!("{:?}", e))?
        .dyn_into()
        .map_err(|_| "元素类型转换失败".to_string())?;

    anchor.set_href(href);
    anchor.set_download(file_name);
    anchor.click();
    Ok(())
}
