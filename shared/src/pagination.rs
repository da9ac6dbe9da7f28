//! 分页模型与分页计算
//!
//! - `Paginated<T>`: 服务端分页器信封 (`data`, `current_page`, `last_page`, `total` ...)
//! - `ListResponse<T>`: 列表接口可能返回的所有形态
//! - `Page<T>`: 归一化后的单页结果，保证 `items.len() <= page_size`

use serde::{Deserialize, Serialize};

use crate::protocol::encode_component;

/// 分页器窗口：当前页左右各显示的页数
pub const PAGE_WINDOW_DELTA: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    pub total: u64,
}

/// 列表接口的响应形态
///
/// 顺序即匹配优先级：分页器 → 包裹的分页器 → 带键的数组 → 裸数组。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated(Paginated<T>),
    Wrapped {
        data: Paginated<T>,
    },
    Keyed {
        #[serde(alias = "books", alias = "users", alias = "news")]
        data: Vec<T>,
    },
    Bare(Vec<T>),
}

/// 归一化后的单页
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
}

impl<T> ListResponse<T> {
    /// 将响应归一化为请求的那一页
    ///
    /// 分页器响应以服务端的 `total`/`last_page` 为准；
    /// 未分页的数组在本地切片，使单页不变式仍然成立。
    pub fn into_page(self, page: u32, page_size: u32) -> Page<T> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        match self {
            ListResponse::Paginated(p) | ListResponse::Wrapped { data: p } => {
                let mut items = p.data;
                // 服务端可能不理会 per_page
                items.truncate(page_size as usize);
                Page {
                    items,
                    current_page: page,
                    last_page: p.last_page.max(1),
                    total: p.total,
                }
            }
            ListResponse::Keyed { data } | ListResponse::Bare(data) => {
                let total = data.len() as u64;
                let start = (page as usize - 1).saturating_mul(page_size as usize);
                let items = data
                    .into_iter()
                    .skip(start)
                    .take(page_size as usize)
                    .collect();
                Page {
                    items,
                    current_page: page,
                    last_page: last_page(total, page_size),
                    total,
                }
            }
        }
    }
}

/// 最后一页的页码（至少为 1）
pub fn last_page(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total.div_ceil(size);
    pages.clamp(1, u64::from(u32::MAX)) as u32
}

pub fn clamp_page(page: u32, last: u32) -> u32 {
    page.clamp(1, last.max(1))
}

/// 删除一条记录后应当请求的页码
///
/// `total` 为删除前的总数。若当前页在删除后超出范围，则退回到最后一个有效页。
pub fn page_after_removal(current: u32, total: u64, page_size: u32) -> u32 {
    let remaining = total.saturating_sub(1);
    clamp_page(current, last_page(remaining, page_size))
}

/// 分页器显示的页码：首页、末页以及当前页 ±2，去重且有序
pub fn page_window(current: u32, last: u32) -> Vec<u32> {
    let last = last.max(1);
    let current = clamp_page(current, last);
    let start = current.saturating_sub(PAGE_WINDOW_DELTA).max(1);
    let end = current.saturating_add(PAGE_WINDOW_DELTA).min(last);

    let mut pages: Vec<u32> = (start..=end).collect();
    pages.push(1);
    pages.push(last);
    pages.sort_unstable();
    pages.dedup();
    pages
}

/// "Showing 11–20 of 42"
pub fn range_summary(current: u32, page_size: u32, shown: usize, total: u64) -> String {
    if total == 0 || shown == 0 {
        return "No results".to_string();
    }
    let first = u64::from(current.max(1) - 1) * u64::from(page_size.max(1)) + 1;
    let last = first + shown as u64 - 1;
    format!("Showing {}–{} of {}", first, last, total)
}

/// 列表请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    pub query: String,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32, query: impl Into<String>) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            query: query.into(),
        }
    }

    /// `page=2&per_page=10&q=...`，空查询不发送 `q`
    pub fn to_query_string(&self) -> String {
        let mut qs = format!("page={}&per_page={}", self.page, self.per_page);
        let query = self.query.trim();
        if !query.is_empty() {
            qs.push_str("&q=");
            qs.push_str(&encode_component(query));
        }
        qs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paginator_envelope_is_authoritative() {
        let resp: ListResponse<u32> = serde_json::from_value(json!({
            "data": [1, 2, 3],
            "current_page": 2,
            "last_page": 5,
            "per_page": 3,
            "total": 14
        }))
        .unwrap();
        let page = resp.into_page(2, 3);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, 14);
        assert_eq!(page.last_page, 5);
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn wrapped_and_keyed_shapes_are_accepted() {
        let wrapped: ListResponse<u32> = serde_json::from_value(json!({
            "status": true,
            "data": { "data": [9], "current_page": 1, "last_page": 1, "total": 1 }
        }))
        .unwrap();
        assert!(matches!(wrapped, ListResponse::Wrapped { .. }));

        let keyed: ListResponse<u32> =
            serde_json::from_value(json!({ "status": true, "users": [1, 2] })).unwrap();
        assert!(matches!(keyed, ListResponse::Keyed { .. }));

        let bare: ListResponse<u32> = serde_json::from_value(json!([4, 5])).unwrap();
        assert!(matches!(bare, ListResponse::Bare(_)));
    }

    #[test]
    fn unpaginated_lists_are_sliced_locally() {
        let resp = ListResponse::Bare((1..=7).collect::<Vec<u32>>());
        let page = resp.into_page(3, 3);
        assert_eq!(page.items, vec![7]);
        assert_eq!(page.total, 7);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn oversized_server_pages_are_truncated() {
        let resp = ListResponse::Paginated(Paginated {
            data: vec![1, 2, 3, 4],
            current_page: 1,
            last_page: 1,
            per_page: Some(15),
            total: 4,
        });
        assert_eq!(resp.into_page(1, 2).items.len(), 2);
    }

    #[test]
    fn last_page_never_drops_below_one() {
        assert_eq!(last_page(0, 10), 1);
        assert_eq!(last_page(10, 10), 1);
        assert_eq!(last_page(11, 10), 2);
    }

    #[test]
    fn removal_clamps_to_last_valid_page() {
        // 第 3 页唯一的一条被删除
        assert_eq!(page_after_removal(3, 3, 1), 2);
        // 删除后当前页仍有数据
        assert_eq!(page_after_removal(2, 25, 10), 2);
        assert_eq!(page_after_removal(3, 21, 10), 2);
        assert_eq!(page_after_removal(1, 1, 10), 1);
    }

    #[test]
    fn window_includes_edges_and_neighbours() {
        assert_eq!(page_window(5, 10), vec![1, 3, 4, 5, 6, 7, 10]);
        assert_eq!(page_window(1, 3), vec![1, 2, 3]);
        assert_eq!(page_window(10, 10), vec![1, 8, 9, 10]);
        assert_eq!(page_window(1, 1), vec![1]);
    }

    #[test]
    fn query_string_encodes_search_terms() {
        let req = PageRequest::new(1, 10, "war & peace");
        assert_eq!(req.to_query_string(), "page=1&per_page=10&q=war%20%26%20peace");
        assert_eq!(PageRequest::new(0, 10, "  ").to_query_string(), "page=1&per_page=10");
    }

    #[test]
    fn summary_describes_visible_range() {
        assert_eq!(range_summary(2, 10, 10, 42), "Showing 11–20 of 42");
        assert_eq!(range_summary(1, 10, 0, 0), "No results");
    }
}
