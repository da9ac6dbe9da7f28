//! 通用分页资源
//!
//! 一个 `ResourceList<R>` 对应一个列表界面，持有该资源当前页的数据与分页元信息。
//! - 成功的 fetch 整体替换 items 与分页信息
//! - 失败的 fetch 保留旧数据（stale-but-available），只记录错误
//! - 重叠的 fetch 由递增序号保护，只有最后发出的请求能写入状态
//! - create/update 成功后重新拉取提交前所在的页
//! - remove 先乐观移除，再按删除后的总数夹紧页码并重新拉取

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use libris_shared::METHOD_OVERRIDE_FIELD;
use libris_shared::pagination::{ListResponse, PageRequest, last_page, page_after_removal};
use libris_shared::protocol::{EncodedPayload, ItemResponse, Resource, ResourcePayload};
use tracing::{debug, info, warn};

use crate::api::{Access, ApiClient};
use crate::error::{ApiError, ApiResult};
use crate::observe::{Observable, SubscriptionId};
use crate::request::{HttpClient, HttpMethod};
use crate::storage::KeyValueStorage;

// =========================================================
// 列表状态
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub page_size: u32,
    pub total: u64,
    pub last_page: u32,
    pub query: String,
    pub loading: bool,
    /// 最近一次 fetch 的错误
    pub error: Option<ApiError>,
    /// 正在执行 create/update/remove
    pub saving: bool,
    /// 最近一次 create/update/remove 的错误
    pub action_error: Option<ApiError>,
}

impl<T> ListState<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            page_size: page_size.max(1),
            total: 0,
            last_page: 1,
            query: String::new(),
            loading: false,
            error: None,
            saving: false,
            action_error: None,
        }
    }
}

/// fetch 的结果；错误本身记录在状态中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// 有更新的请求已经发出，本次响应被丢弃
    Superseded,
    Failed,
}

/// 提交前所在的列表位置
#[derive(Debug, Clone)]
struct Position {
    page: u32,
    page_size: u32,
    query: String,
    total: u64,
}

// =========================================================
// ResourceList
// =========================================================

pub struct ResourceList<R: Resource, C, S: KeyValueStorage> {
    api: Arc<ApiClient<C, S>>,
    access: Access,
    state: Observable<ListState<R::Item>>,
    seq: AtomicU64,
    _resource: PhantomData<fn() -> R>,
}

impl<R, C, S> ResourceList<R, C, S>
where
    R: Resource,
    C: HttpClient,
    S: KeyValueStorage,
{
    pub fn new(api: Arc<ApiClient<C, S>>, access: Access, page_size: u32) -> Self {
        Self {
            api,
            access,
            state: Observable::new(ListState::new(page_size)),
            seq: AtomicU64::new(0),
            _resource: PhantomData,
        }
    }

    pub fn api(&self) -> &Arc<ApiClient<C, S>> {
        &self.api
    }

    pub fn state(&self) -> ListState<R::Item> {
        self.state.get()
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&ListState<R::Item>) -> T) -> T {
        self.state.with(f)
    }

    pub fn subscribe(
        &self,
        f: impl Fn(&ListState<R::Item>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.unsubscribe(id);
    }

    fn position(&self) -> Position {
        self.state.with(|s| Position {
            page: s.current_page,
            page_size: s.page_size,
            query: s.query.clone(),
            total: s.total,
        })
    }

    // --- Fetching ---

    /// 拉取指定页
    ///
    /// 页码、页大小与查询在发出请求时即写入状态。
    #[tracing::instrument(name = "resource.fetch_list", skip(self), fields(resource = R::NAME))]
    pub async fn fetch_list(&self, page: u32, page_size: u32, query: &str) -> FetchOutcome {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let query = query.trim().to_string();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.update(|s| {
            s.loading = true;
            s.error = None;
            s.current_page = page;
            s.page_size = page_size;
            s.query = query.clone();
        });

        let path = format!(
            "{}?{}",
            R::COLLECTION,
            PageRequest::new(page, page_size, query.as_str()).to_query_string()
        );
        debug!(seq, path = %path, "fetching page");
        let result = self
            .api
            .get_json::<ListResponse<R::Item>>(&path, self.access)
            .await;

        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "discarding superseded response");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(list) => {
                let data = list.into_page(page, page_size);
                self.state.update(|s| {
                    s.items = data.items;
                    s.total = data.total;
                    s.last_page = data.last_page;
                    s.current_page = page;
                    s.loading = false;
                    s.error = None;
                });
                FetchOutcome::Applied
            }
            Err(e) => {
                let e = e.in_op_with(format!("{}.fetch_list", R::NAME), format!("page {}", page));
                warn!(error = %e, "list fetch failed, keeping previous items");
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(e);
                });
                FetchOutcome::Failed
            }
        }
    }

    /// 以当前页、页大小与查询重新拉取
    pub async fn refresh(&self) -> FetchOutcome {
        let pos = self.position();
        self.fetch_list(pos.page, pos.page_size, &pos.query).await
    }

    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let pos = self.position();
        self.fetch_list(page, pos.page_size, &pos.query).await
    }

    /// 修改页大小会回到第 1 页
    pub async fn set_page_size(&self, page_size: u32) -> FetchOutcome {
        let pos = self.position();
        self.fetch_list(1, page_size, &pos.query).await
    }

    /// 修改查询会回到第 1 页
    pub async fn set_query(&self, query: &str) -> FetchOutcome {
        let pos = self.position();
        self.fetch_list(1, pos.page_size, query).await
    }

    /// 单条记录（编辑页、详情页）；错误直接返回
    pub async fn fetch_one(&self, id: u64) -> ApiResult<R::Item> {
        let item: ItemResponse<R::Item> = self
            .api
            .get_json(&R::item_path(id), self.access)
            .await
            .map_err(|e| e.in_op_with(format!("{}.fetch_one", R::NAME), id.to_string()))?;
        Ok(item.into_inner())
    }

    // --- Mutations ---

    /// 创建；成功后重新拉取提交前所在的页
    #[tracing::instrument(name = "resource.create", skip_all, fields(resource = R::NAME))]
    pub async fn create(&self, payload: &R::Create) -> ApiResult<()> {
        let pos = self.position();
        let encoded = self.encode(payload, "create")?;

        self.run_mutation(HttpMethod::Post, &R::create_path(), encoded, "create")
            .await?;
        info!("created {}", R::NAME);

        self.fetch_list(pos.page, pos.page_size, &pos.query).await;
        Ok(())
    }

    /// 更新；multipart 载荷按资源约定可能改用 POST + `_method=PUT`
    #[tracing::instrument(name = "resource.update", skip(self, payload), fields(resource = R::NAME))]
    pub async fn update(&self, id: u64, payload: &R::Update) -> ApiResult<()> {
        let pos = self.position();
        let encoded = self.encode(payload, "update")?;

        let (method, encoded) = match encoded {
            EncodedPayload::Multipart(form) if R::SPOOF_MULTIPART_PUT => (
                HttpMethod::Post,
                EncodedPayload::Multipart(form.text(METHOD_OVERRIDE_FIELD, "PUT")),
            ),
            other => (HttpMethod::Put, other),
        };

        self.run_mutation(method, &R::update_path(id), encoded, "update")
            .await?;
        info!("updated {} {}", R::NAME, id);

        self.fetch_list(pos.page, pos.page_size, &pos.query).await;
        Ok(())
    }

    /// 删除
    ///
    /// 先从当前页移除该条目，失败时回滚；成功后按删除后的总数夹紧页码再拉取。
    #[tracing::instrument(name = "resource.remove", skip(self), fields(resource = R::NAME))]
    pub async fn remove(&self, id: u64) -> ApiResult<()> {
        let pos = self.position();

        let snapshot = self.state.update(|s| {
            let before = (s.items.clone(), s.total, s.last_page);
            let len = s.items.len();
            s.items.retain(|item| R::id(item) != id);
            if s.items.len() < len {
                s.total = s.total.saturating_sub(1);
                s.last_page = last_page(s.total, s.page_size);
            }
            s.saving = true;
            s.action_error = None;
            before
        });

        let result = self
            .api
            .delete(&R::item_path(id), Access::Authenticated)
            .await
            .map(|_| ());

        if let Err(e) = result {
            let e = e.in_op_with(format!("{}.remove", R::NAME), id.to_string());
            warn!(error = %e, "delete failed, restoring row");
            let (items, total, last) = snapshot;
            self.state.update(|s| {
                s.items = items;
                s.total = total;
                s.last_page = last;
                s.saving = false;
                s.action_error = Some(e.clone());
            });
            return Err(e);
        }

        self.state.update(|s| s.saving = false);
        info!("deleted {} {}", R::NAME, id);

        let target = page_after_removal(pos.page, pos.total, pos.page_size);
        self.fetch_list(target, pos.page_size, &pos.query).await;
        Ok(())
    }

    fn encode<P: ResourcePayload>(&self, payload: &P, op: &str) -> ApiResult<EncodedPayload> {
        payload.encode().map_err(|e| {
            let e = ApiError::from(e).in_op(format!("{}.{}", R::NAME, op));
            self.state.update(|s| s.action_error = Some(e.clone()));
            e
        })
    }

    async fn run_mutation(
        &self,
        method: HttpMethod,
        path: &str,
        payload: EncodedPayload,
        op: &str,
    ) -> ApiResult<()> {
        self.state.update(|s| {
            s.saving = true;
            s.action_error = None;
        });

        let result = self
            .api
            .send_payload(method, path, payload, Access::Authenticated)
            .await;

        match result {
            Ok(_) => {
                self.state.update(|s| s.saving = false);
                Ok(())
            }
            Err(e) => {
                let e = e.in_op(format!("{}.{}", R::NAME, op));
                warn!(error = %e, "mutation failed");
                self.state.update(|s| {
                    s.saving = false;
                    s.action_error = Some(e.clone());
                });
                Err(e)
            }
        }
    }

    pub fn clear_action_error(&self) {
        self.state.update(|s| s.action_error = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::request::HttpBody;
    use crate::test_support::{TestClient, anonymous_client, signed_in_client, url};
    use libris_shared::protocol::{Books, Members, NewsPosts};
    use libris_shared::{BookPayload, MemberUpdate, NewsPayload, Role};
    use serde_json::{Value, json};
    use std::time::Duration;

    type BookList = ResourceList<Books, crate::request::MockHttpClient, crate::storage::MemoryStorage>;

    fn books(api: TestClient, page_size: u32) -> BookList {
        ResourceList::new(Arc::new(api), Access::Authenticated, page_size)
    }

    fn book(id: u64) -> Value {
        json!({ "id": id, "title": format!("Book {}", id), "ISBN": "9780306406157" })
    }

    fn paginator(ids: &[u64], current: u32, last: u32, total: u64) -> Value {
        json!({
            "data": ids.iter().map(|id| book(*id)).collect::<Vec<_>>(),
            "current_page": current,
            "last_page": last,
            "total": total
        })
    }

    fn list_url(page: u32, per_page: u32, q: &str) -> String {
        url(&format!(
            "/books?{}",
            PageRequest::new(page, per_page, q).to_query_string()
        ))
    }

    #[tokio::test]
    async fn successful_fetch_replaces_page() {
        let list = books(signed_in_client(), 2);
        list.api().http().mock_response(
            HttpMethod::Get,
            &list_url(2, 2, ""),
            200,
            paginator(&[3, 4], 2, 3, 5),
        );

        assert_eq!(list.fetch_list(2, 2, "").await, FetchOutcome::Applied);
        let state = list.state();
        assert_eq!(state.current_page, 2);
        assert!(state.items.len() <= 2);
        assert_eq!(state.total, 5);
        assert_eq!(state.last_page, 3);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_items() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Get, &list_url(1, 10, ""), 200, paginator(&[1, 2], 1, 1, 2));
        http.mock_response(
            HttpMethod::Get,
            &list_url(1, 10, "x"),
            500,
            json!({ "message": "Database offline" }),
        );

        list.fetch_list(1, 10, "").await;
        assert_eq!(list.fetch_list(1, 10, "x").await, FetchOutcome::Failed);

        let state = list.state();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.error.as_ref().map(ApiError::message), Some("Database offline"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn no_token_means_no_request() {
        let list = books(anonymous_client(), 10);
        assert_eq!(list.fetch_list(1, 10, "").await, FetchOutcome::Failed);
        let err = list.state().error.unwrap();
        assert_eq!(err.kind(), ApiErrorKind::Unauthenticated);

        let create = list.create(&BookPayload::default()).await.unwrap_err();
        assert_eq!(create.kind(), ApiErrorKind::Unauthenticated);
        assert_eq!(list.api().http().request_count(), 0);
    }

    #[tokio::test]
    async fn public_lists_work_without_token() {
        let list: BookList = ResourceList::new(Arc::new(anonymous_client()), Access::Public, 10);
        list.api().http().mock_response(
            HttpMethod::Get,
            &list_url(1, 10, ""),
            200,
            json!({ "books": [book(1), book(2)] }),
        );
        assert_eq!(list.fetch_list(1, 10, "").await, FetchOutcome::Applied);
        assert_eq!(list.state().total, 2);
        assert!(!list.api().http().last_request().unwrap().has_bearer());
    }

    #[tokio::test(start_paused = true)]
    async fn late_responses_are_discarded() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_delayed(
            HttpMethod::Get,
            &list_url(1, 10, "a"),
            200,
            paginator(&[1, 2, 3], 1, 1, 3),
            Duration::from_millis(300),
        );
        http.mock_delayed(
            HttpMethod::Get,
            &list_url(1, 10, "ab"),
            200,
            paginator(&[2], 1, 1, 1),
            Duration::from_millis(10),
        );

        let (first, second) = tokio::join!(list.fetch_list(1, 10, "a"), list.fetch_list(1, 10, "ab"));

        assert_eq!(first, FetchOutcome::Superseded);
        assert_eq!(second, FetchOutcome::Applied);
        let state = list.state();
        assert_eq!(state.query, "ab");
        assert_eq!(state.total, 1);
    }

    #[tokio::test]
    async fn query_and_page_size_changes_reset_to_first_page() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Get, &list_url(3, 10, ""), 200, paginator(&[21], 3, 3, 21));
        http.mock_response(HttpMethod::Get, &list_url(1, 10, "dune"), 200, paginator(&[1], 1, 1, 1));
        http.mock_response(HttpMethod::Get, &list_url(1, 25, "dune"), 200, paginator(&[1], 1, 1, 1));

        list.fetch_list(3, 10, "").await;
        list.set_query("dune").await;
        assert_eq!(list.state().current_page, 1);

        list.fetch_list(1, 10, "dune").await;
        list.set_page_size(25).await;
        let state = list.state();
        assert_eq!((state.current_page, state.page_size), (1, 25));
        assert_eq!(
            http.calls().last().cloned(),
            Some(format!("GET {}", list_url(1, 25, "dune")))
        );
    }

    #[tokio::test]
    async fn create_refetches_the_page_active_before_submission() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Get, &list_url(2, 10, ""), 200, paginator(&[11], 2, 2, 11));
        http.mock_response(HttpMethod::Post, &url("/books"), 200, json!({ "status": true }));

        list.fetch_list(2, 10, "").await;
        let payload = BookPayload {
            title: "Kill".into(),
            isbn: "9788417563114".into(),
            copies: Some(4),
            ..Default::default()
        };
        list.create(&payload).await.unwrap();

        let calls = http.calls();
        assert_eq!(
            calls,
            vec![
                format!("GET {}", list_url(2, 10, "")),
                format!("POST {}", url("/books")),
                format!("GET {}", list_url(2, 10, "")),
            ]
        );
        let post = http.requests.borrow()[1].clone();
        let HttpBody::Multipart(ref form) = post.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.get_text("title"), Some("Kill"));
        assert_eq!(form.get_text("ISBN"), Some("9788417563114"));
        assert_eq!(form.get_text("copies"), Some("4"));
        assert!(post.has_bearer());
    }

    #[tokio::test]
    async fn failed_create_surfaces_error_without_refetch() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_response(
            HttpMethod::Post,
            &url("/books"),
            422,
            json!({ "message": "The ISBN has already been taken." }),
        );

        let err = list
            .create(&BookPayload {
                title: "Dup".into(),
                isbn: "1".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.message(), "The ISBN has already been taken.");
        let state = list.state();
        assert_eq!(state.action_error, Some(err));
        assert!(!state.saving);
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn deleting_last_row_of_last_page_moves_back() {
        let list = books(signed_in_client(), 1);
        let http = list.api().http();
        http.mock_response(HttpMethod::Get, &list_url(3, 1, ""), 200, paginator(&[3], 3, 3, 3));
        http.mock_response(HttpMethod::Delete, &url("/books/3"), 200, json!({ "status": true }));
        http.mock_response(HttpMethod::Get, &list_url(2, 1, ""), 200, paginator(&[2], 2, 2, 2));

        list.fetch_list(3, 1, "").await;
        list.remove(3).await.unwrap();

        let state = list.state();
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total, 2);
        assert_eq!(Books::id(&state.items[0]), 2);
        assert_eq!(
            http.calls().last().cloned(),
            Some(format!("GET {}", list_url(2, 1, "")))
        );
    }

    #[tokio::test]
    async fn failed_delete_restores_row() {
        let list = books(signed_in_client(), 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Get, &list_url(1, 10, ""), 200, paginator(&[1, 2], 1, 1, 2));
        http.mock_response(
            HttpMethod::Delete,
            &url("/books/2"),
            403,
            json!({ "message": "Forbidden" }),
        );

        list.fetch_list(1, 10, "").await;
        let err = list.remove(2).await.unwrap_err();

        assert_eq!(err.message(), "Forbidden");
        let state = list.state();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.total, 2);
        assert!(state.action_error.is_some());
    }

    #[tokio::test]
    async fn news_update_spoofs_put_over_post() {
        let api = Arc::new(signed_in_client());
        let list: ResourceList<NewsPosts, _, _> = ResourceList::new(api, Access::Authenticated, 10);
        let http = list.api().http();
        http.mock_response(HttpMethod::Post, &url("/news/7"), 200, json!({ "News": {} }));

        list.update(
            7,
            &NewsPayload {
                title: "Open day".into(),
                slug: "open-day".into(),
                content: "Doors open at nine.".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let req = http.requests.borrow()[0].clone();
        assert_eq!(req.method, HttpMethod::Post);
        let HttpBody::Multipart(ref form) = req.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.get_text("_method"), Some("PUT"));
    }

    #[tokio::test]
    async fn member_role_change_is_json_put() {
        let api = Arc::new(signed_in_client());
        let list: ResourceList<Members, _, _> = ResourceList::new(api, Access::Authenticated, 10);
        let http = list.api().http();
        http.mock_response(
            HttpMethod::Put,
            &url("/updateProfile/5"),
            200,
            json!({ "status": true, "user": {} }),
        );

        list.update(5, &MemberUpdate::role(Role::Librarian)).await.unwrap();

        let req = http.requests.borrow()[0].clone();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.body, HttpBody::Json(json!({ "role": "librarian" }).to_string()));
    }

    #[tokio::test]
    async fn fetch_one_unwraps_envelopes() {
        let list = books(signed_in_client(), 10);
        list.api().http().mock_response(
            HttpMethod::Get,
            &url("/books/4"),
            200,
            json!({ "data": book(4) }),
        );
        let item = list.fetch_one(4).await.unwrap();
        assert_eq!(item.title, "Book 4");

        let missing = list.fetch_one(99).await.unwrap_err();
        assert_eq!(missing.status(), Some(404));
    }
}
