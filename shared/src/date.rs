//! 日期时间辅助
//!
//! 服务端返回的时间有几种形态：
//! - RFC 3339: `2025-03-01T08:30:00.000000Z`
//! - Laravel 默认: `2025-03-01 08:30:00`
//! - 纯日期: `2025-03-01`
//!
//! 表单中的 `datetime-local` 输入使用 `2025-03-01T08:30`。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const SERVER_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

// =========================================================
// 解析 (Parsing)
// =========================================================

/// 解析服务端时间戳（无时区的按 UTC 处理）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in SERVER_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// 解析纯日期，也接受带时间部分的字符串
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

pub fn is_valid_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).is_ok()
}

// =========================================================
// 格式化 (Formatting)
// =========================================================

/// 列表与详情页的展示格式，如 `Mar 1, 2025`
pub fn display_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// 带时间的展示格式，如 `Mar 1, 2025 08:30`
pub fn display_datetime(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%b %-d, %Y %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// 转换为 `datetime-local` 输入框的值
pub fn to_input_value(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

/// 将 `datetime-local` 输入值转换为服务端格式
pub fn from_input_value(raw: &str) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), INPUT_FORMAT).ok()?;
    Some(naive.format("%Y-%m-%d %H:%M:%S").to_string())
}
