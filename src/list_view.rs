//! 列表视图模型
//!
//! 把搜索框、页大小选择器、分页器和表格状态绑定到一个 `ResourceList` 上。
//! UI 层只负责把事件转发到这里，再根据 `table()` / `pages()` 渲染。

use std::sync::Arc;

use libris_shared::pagination::{clamp_page, page_window, range_summary};
use libris_shared::protocol::Resource;
use tracing::debug;

use crate::config::ClientConfig;
use crate::debounce::{Debouncer, Sleeper};
use crate::error::ApiResult;
use crate::request::HttpClient;
use crate::resource::{FetchOutcome, ListState, ResourceList};
use crate::storage::KeyValueStorage;

pub const NO_RESULTS_MESSAGE: &str = "No results found.";

/// 表格区域应该显示什么
#[derive(Debug, Clone, PartialEq)]
pub enum TableView<T> {
    Loading,
    Error(String),
    Empty(String),
    Rows(Vec<T>),
}

/// 纯粹由列表状态推导出的展示数据，UI 层可以直接在自己的响应式快照上调用
impl<T: Clone> ListState<T> {
    pub fn table(&self) -> TableView<T> {
        if self.loading {
            TableView::Loading
        } else if let Some(error) = &self.error {
            TableView::Error(error.message().to_string())
        } else if self.items.is_empty() {
            TableView::Empty(NO_RESULTS_MESSAGE.to_string())
        } else {
            TableView::Rows(self.items.clone())
        }
    }

    pub fn pages(&self) -> Vec<u32> {
        page_window(self.current_page, self.last_page)
    }

    pub fn summary(&self) -> String {
        range_summary(self.current_page, self.page_size, self.items.len(), self.total)
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

pub struct ListView<R: Resource, C, S: KeyValueStorage, Z> {
    list: Arc<ResourceList<R, C, S>>,
    debouncer: Debouncer<Z>,
    page_size_options: Vec<u32>,
}

impl<R, C, S, Z> ListView<R, C, S, Z>
where
    R: Resource,
    C: HttpClient,
    S: KeyValueStorage,
    Z: Sleeper,
{
    pub fn new(list: Arc<ResourceList<R, C, S>>, sleeper: Z, config: &ClientConfig) -> Self {
        Self {
            list,
            debouncer: Debouncer::new(sleeper, config.debounce),
            page_size_options: config.page_size_options.clone(),
        }
    }

    pub fn list(&self) -> &Arc<ResourceList<R, C, S>> {
        &self.list
    }

    pub fn page_size_options(&self) -> &[u32] {
        &self.page_size_options
    }

    /// 首次挂载时加载当前页
    pub async fn load(&self) -> FetchOutcome {
        self.list.refresh().await
    }

    // --- Search ---

    /// 搜索框输入
    ///
    /// 防抖窗口内被后续输入覆盖的调用返回 `None`；
    /// 落定的查询与当前查询相同时也不会发出请求。
    pub async fn search_input(&self, text: &str) -> Option<FetchOutcome> {
        let query = self.debouncer.settle(text.trim().to_string()).await?;

        let unchanged = self
            .list
            .with_state(|s| s.query == query && s.error.is_none());
        if unchanged {
            debug!(query = %query, "query unchanged, skipping fetch");
            return None;
        }
        Some(self.list.set_query(&query).await)
    }

    /// 立即提交查询（回车或清空按钮），并丢弃等待中的输入
    pub async fn submit_search(&self, text: &str) -> FetchOutcome {
        self.debouncer.cancel();
        self.list.set_query(text).await
    }

    // --- Paging ---

    pub async fn select_page_size(&self, page_size: u32) -> FetchOutcome {
        self.list.set_page_size(page_size).await
    }

    /// 跳转到指定页，页码夹紧到 `1..=last_page`；已在该页时返回 `None`
    pub async fn goto_page(&self, page: u32) -> Option<FetchOutcome> {
        let (current, last) = self.list.with_state(|s| (s.current_page, s.last_page));
        let target = clamp_page(page, last);
        if target == current {
            return None;
        }
        Some(self.list.set_page(target).await)
    }

    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let current = self.list.with_state(|s| s.current_page);
        self.goto_page(current.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> Option<FetchOutcome> {
        let current = self.list.with_state(|s| s.current_page);
        self.goto_page(current.saturating_sub(1)).await
    }

    pub fn has_prev(&self) -> bool {
        self.list.with_state(ListState::has_prev)
    }

    pub fn has_next(&self) -> bool {
        self.list.with_state(ListState::has_next)
    }

    /// 分页器显示的页码
    pub fn pages(&self) -> Vec<u32> {
        self.list.with_state(ListState::pages)
    }

    /// "Showing 11–20 of 42"
    pub fn summary(&self) -> String {
        self.list.with_state(ListState::summary)
    }

    // --- Table ---

    pub fn table(&self) -> TableView<R::Item> {
        self.list.with_state(ListState::table)
    }

    /// 行操作：删除（确认由 UI 负责）
    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        self.list.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Access;
    use crate::debounce::TokioSleeper;
    use crate::request::{HttpMethod, MockHttpClient};
    use crate::storage::MemoryStorage;
    use crate::test_support::{signed_in_client, url};
    use libris_shared::pagination::PageRequest;
    use libris_shared::protocol::Books;
    use serde_json::{Value, json};
    use std::time::Duration;

    type BookView = ListView<Books, MockHttpClient, MemoryStorage, TokioSleeper>;

    fn view(page_size: u32) -> BookView {
        let config = ClientConfig::default();
        let list = Arc::new(ResourceList::new(
            Arc::new(signed_in_client()),
            Access::Authenticated,
            page_size,
        ));
        ListView::new(list, TokioSleeper, &config)
    }

    fn http(view: &BookView) -> &MockHttpClient {
        view.list().api().http()
    }

    fn list_url(page: u32, per_page: u32, q: &str) -> String {
        url(&format!(
            "/books?{}",
            PageRequest::new(page, per_page, q).to_query_string()
        ))
    }

    fn paginator(count: u64, current: u32, last: u32, total: u64) -> Value {
        let data: Vec<Value> = (1..=count)
            .map(|id| json!({ "id": id, "title": format!("Book {}", id), "ISBN": "9780306406157" }))
            .collect();
        json!({ "data": data, "current_page": current, "last_page": last, "total": total })
    }

    #[tokio::test(start_paused = true)]
    async fn typing_within_window_fetches_once() {
        let view = view(10);
        http(&view).mock_response(HttpMethod::Get, &list_url(1, 10, "abc"), 200, paginator(1, 1, 1, 1));

        let typing = async {
            let a = view.search_input("a");
            let ab = async {
                tokio::time::sleep(Duration::from_millis(120)).await;
                view.search_input("ab").await
            };
            let abc = async {
                tokio::time::sleep(Duration::from_millis(240)).await;
                view.search_input("abc").await
            };
            futures::join!(a, ab, abc)
        };
        let (a, ab, abc) = typing.await;

        assert_eq!((a, ab), (None, None));
        assert_eq!(abc, Some(FetchOutcome::Applied));
        assert_eq!(http(&view).calls(), vec![format!("GET {}", list_url(1, 10, "abc"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_resets_to_first_page() {
        let view = view(10);
        let http = http(&view);
        http.mock_response(HttpMethod::Get, &list_url(3, 10, ""), 200, paginator(10, 3, 4, 35));
        http.mock_response(HttpMethod::Get, &list_url(1, 10, "rust"), 200, paginator(2, 1, 1, 2));

        view.list().fetch_list(3, 10, "").await;
        assert_eq!(view.search_input("rust").await, Some(FetchOutcome::Applied));
        assert_eq!(view.list().state().current_page, 1);

        // 查询未变化不再请求
        assert_eq!(view.search_input(" rust ").await, None);
        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn paging_is_clamped() {
        let view = view(10);
        let http = http(&view);
        http.mock_response(HttpMethod::Get, &list_url(1, 10, ""), 200, paginator(10, 1, 3, 25));
        http.mock_response(HttpMethod::Get, &list_url(3, 10, ""), 200, paginator(5, 3, 3, 25));
        http.mock_response(HttpMethod::Get, &list_url(2, 10, ""), 200, paginator(10, 2, 3, 25));

        view.load().await;
        assert!(!view.has_prev());
        assert_eq!(view.prev_page().await, None);

        assert_eq!(view.goto_page(99).await, Some(FetchOutcome::Applied));
        assert_eq!(view.list().state().current_page, 3);
        assert!(!view.has_next());
        assert_eq!(view.next_page().await, None);

        assert_eq!(view.prev_page().await, Some(FetchOutcome::Applied));
        assert_eq!(view.list().state().current_page, 2);
        assert_eq!(view.pages(), vec![1, 2, 3]);
        assert_eq!(view.summary(), "Showing 11–20 of 25");
    }

    #[tokio::test]
    async fn page_size_change_goes_to_first_page() {
        let view = view(10);
        let http = http(&view);
        http.mock_response(HttpMethod::Get, &list_url(2, 10, ""), 200, paginator(10, 2, 3, 25));
        http.mock_response(HttpMethod::Get, &list_url(1, 25, ""), 200, paginator(25, 1, 1, 25));

        view.list().fetch_list(2, 10, "").await;
        view.select_page_size(25).await;

        let state = view.list().state();
        assert_eq!((state.current_page, state.page_size), (1, 25));
        assert_eq!(view.page_size_options(), &[10, 25, 50, 100]);
    }

    #[tokio::test]
    async fn table_reflects_state() {
        let view = view(10);
        let http = http(&view);
        http.mock_response(HttpMethod::Get, &list_url(1, 10, ""), 200, paginator(0, 1, 1, 0));
        http.mock_response(
            HttpMethod::Get,
            &list_url(1, 10, "boom"),
            500,
            json!({ "message": "Search index unavailable" }),
        );
        http.mock_response(HttpMethod::Get, &list_url(1, 10, "ok"), 200, paginator(2, 1, 1, 2));

        view.load().await;
        assert_eq!(view.table(), TableView::Empty(NO_RESULTS_MESSAGE.to_string()));
        assert_eq!(view.summary(), "No results");

        view.submit_search("boom").await;
        assert_eq!(view.table(), TableView::Error("Search index unavailable".to_string()));

        view.submit_search("ok").await;
        let TableView::Rows(rows) = view.table() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
    }
}
