use libris_shared::{TOKEN_KEY, USER_KEY};
use std::time::Duration;

// =========================================================
// 运行时配置 (Client Configuration)
// =========================================================

/// 这些是默认值，如果构建环境中没有定义对应变量，则使用这些值
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];
pub const DEFAULT_LANDING_LIMIT: u32 = 3;
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_API_URL: &str = "LIBRIS_API_URL";
pub const ENV_DEBOUNCE_MS: &str = "LIBRIS_DEBOUNCE_MS";
pub const ENV_PAGE_SIZE: &str = "LIBRIS_PAGE_SIZE";
pub const ENV_LOG: &str = "LIBRIS_LOG";

/// 客户端配置
///
/// 负责从变量中读取覆盖值，读不到或无法解析时使用默认值
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub debounce: Duration,
    pub page_size: u32,
    pub page_size_options: Vec<u32>,
    pub token_key: String,
    pub user_key: String,
    pub landing_limit: u32,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            token_key: TOKEN_KEY.to_string(),
            user_key: USER_KEY.to_string(),
            landing_limit: DEFAULT_LANDING_LIMIT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// 通过查找函数构建配置（测试或非浏览器宿主注入环境）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup(ENV_API_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let debounce = parse_number::<u64>(&lookup, ENV_DEBOUNCE_MS)
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);

        let page_size = parse_number::<u32>(&lookup, ENV_PAGE_SIZE)
            .filter(|size| *size > 0)
            .unwrap_or(defaults.page_size);

        let mut page_size_options = defaults.page_size_options;
        if !page_size_options.contains(&page_size) {
            page_size_options.push(page_size);
            page_size_options.sort_unstable();
        }

        let log_filter = lookup(ENV_LOG)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Self {
            api_url,
            debounce,
            page_size,
            page_size_options,
            log_filter,
            ..Self::default()
        }
    }

    /// 读取构建时注入的变量（浏览器环境没有运行时环境变量）
    pub fn from_build_env() -> Self {
        Self::from_lookup(|key| {
            let value = match key {
                ENV_API_URL => option_env!("LIBRIS_API_URL"),
                ENV_DEBOUNCE_MS => option_env!("LIBRIS_DEBOUNCE_MS"),
                ENV_PAGE_SIZE => option_env!("LIBRIS_PAGE_SIZE"),
                ENV_LOG => option_env!("LIBRIS_LOG"),
                _ => None,
            };
            value.map(str::to_string)
        })
    }

    /// 拼接 API 地址，`path` 以 `/` 开头
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.api_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

fn parse_number<N: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<N> {
    let raw = lookup(key)?;
    match raw.trim().parse::<N>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}
