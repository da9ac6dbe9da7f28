//! 列表页公共部件
//!
//! `ListHandle` 把核心层的 `ListView` 与一个 Leptos 信号绑定：
//! 核心层状态变化时通过订阅同步快照，UI 事件通过 `spawn_local` 转发回去。

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::shared::{Books, Members, NewsPosts, Resource};
use libris::{Access, ListState, ListView, ResourceList, TableView};
use tracing::warn;

use crate::auth::AuthContext;
use crate::web::{FetchHttpClient, LocalStorage, TimeoutSleeper, dom};

pub type AppList<R> = ResourceList<R, FetchHttpClient, LocalStorage>;
pub type AppListView<R> = ListView<R, FetchHttpClient, LocalStorage, TimeoutSleeper>;

pub struct ListHandle<R: Resource> {
    view: StoredValue<Arc<AppListView<R>>>,
    state: RwSignal<ListState<R::Item>>,
}

impl<R: Resource> Clone for ListHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Resource> Copy for ListHandle<R> {}

impl<R: Resource> ListHandle<R> {
    pub fn new(auth: AuthContext, access: Access) -> Self {
        let api = auth.api();
        let config = api.config().clone();
        let list = Arc::new(ResourceList::new(api, access, config.page_size));

        let state = RwSignal::new(list.state());
        list.subscribe(move |snapshot| {
            let _ = state.try_set(snapshot.clone());
        });

        let view = ListView::new(list, TimeoutSleeper, &config);
        Self {
            view: StoredValue::new(Arc::new(view)),
            state,
        }
    }

    pub fn state(&self) -> RwSignal<ListState<R::Item>> {
        self.state
    }

    pub fn view(&self) -> Arc<AppListView<R>> {
        self.view.get_value()
    }

    pub fn list(&self) -> Arc<AppList<R>> {
        self.view.with_value(|v| Arc::clone(v.list()))
    }

    pub fn page_size_options(&self) -> Vec<u32> {
        self.view.with_value(|v| v.page_size_options().to_vec())
    }

    /// 以当前页码、页大小与查询重新加载
    pub fn reload(&self) {
        let view = self.view();
        spawn_local(async move {
            view.load().await;
        });
    }

    pub fn search(&self, text: String) {
        let view = self.view();
        spawn_local(async move {
            view.search_input(&text).await;
        });
    }

    pub fn submit(&self, text: String) {
        let view = self.view();
        spawn_local(async move {
            view.submit_search(&text).await;
        });
    }

    pub fn goto(&self, page: u32) {
        let view = self.view();
        spawn_local(async move {
            view.goto_page(page).await;
        });
    }

    pub fn prev(&self) {
        let view = self.view();
        spawn_local(async move {
            view.prev_page().await;
        });
    }

    pub fn next(&self) {
        let view = self.view();
        spawn_local(async move {
            view.next_page().await;
        });
    }

    pub fn page_size(&self, page_size: u32) {
        let view = self.view();
        spawn_local(async move {
            view.select_page_size(page_size).await;
        });
    }

    /// 确认后删除；失败时核心层已回滚并记录 `action_error`
    pub fn delete(&self, id: u64, prompt: &str) {
        if !dom::confirm(prompt) {
            return;
        }
        let view = self.view();
        spawn_local(async move {
            if let Err(e) = view.delete(id).await {
                warn!(resource = R::NAME, id, error = %e, "delete failed");
            }
        });
    }

    pub fn clear_action_error(&self) {
        self.view.with_value(|v| v.list().clear_action_error());
    }
}

// ============================================================================
// 全局列表
// ============================================================================

/// 应用级列表实例
///
/// 放在 App 层而不是页面内，从表单页返回时仍保留提交前的页码与查询。
#[derive(Clone, Copy)]
pub struct Lists {
    pub books: ListHandle<Books>,
    pub news: ListHandle<NewsPosts>,
    pub users: ListHandle<Members>,
    /// 公开目录
    pub catalog: ListHandle<Books>,
    /// 公开新闻
    pub bulletins: ListHandle<NewsPosts>,
}

pub fn provide_lists(auth: AuthContext) {
    provide_context(Lists {
        books: ListHandle::new(auth, Access::Authenticated),
        news: ListHandle::new(auth, Access::Authenticated),
        users: ListHandle::new(auth, Access::Authenticated),
        catalog: ListHandle::new(auth, Access::Public),
        bulletins: ListHandle::new(auth, Access::Public),
    });
}

pub fn use_lists() -> Lists {
    use_context::<Lists>().expect("Lists should be provided")
}

// ============================================================================
// UI 部件
// ============================================================================

/// 搜索框与页大小选择器
pub fn list_toolbar<R: Resource>(handle: ListHandle<R>, placeholder: &'static str) -> impl IntoView {
    let state = handle.state();
    let (text, set_text) = signal(state.with_untracked(|s| s.query.clone()));

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        handle.submit(text.get_untracked());
    };

    let options = handle
        .page_size_options()
        .into_iter()
        .map(|size| view! { <option value=size.to_string()>{size}" / page"</option> })
        .collect_view();

    view! {
        <div class="flex flex-col md:flex-row gap-2 md:items-center justify-between p-4">
            <form class="join w-full md:max-w-md" on:submit=on_submit>
                <input
                    type="search"
                    class="input input-bordered input-sm join-item w-full"
                    placeholder=placeholder
                    prop:value=text
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        set_text.set(value.clone());
                        handle.search(value);
                    }
                />
                <button type="submit" class="btn btn-sm join-item">"Search"</button>
            </form>
            <select
                class="select select-bordered select-sm"
                prop:value=move || state.with(|s| s.page_size.to_string())
                on:change=move |ev| {
                    if let Ok(size) = event_target_value(&ev).parse() {
                        handle.page_size(size);
                    }
                }
            >
                {options}
            </select>
        </div>
    }
}

/// 范围摘要与分页器
pub fn list_pager<R: Resource>(handle: ListHandle<R>) -> impl IntoView {
    let state = handle.state();

    let pages = move || {
        let current = state.with(|s| s.current_page);
        state
            .with(ListState::pages)
            .into_iter()
            .map(|page| {
                let class = if page == current {
                    "join-item btn btn-sm btn-active"
                } else {
                    "join-item btn btn-sm"
                };
                view! { <button class=class on:click=move |_| handle.goto(page)>{page}</button> }
            })
            .collect_view()
    };

    view! {
        <div class="flex flex-col md:flex-row gap-2 items-center justify-between p-4">
            <span class="text-sm text-base-content/70">{move || state.with(ListState::summary)}</span>
            <div class="join">
                <button
                    class="join-item btn btn-sm"
                    disabled=move || !state.with(ListState::has_prev)
                    on:click=move |_| handle.prev()
                >
                    "«"
                </button>
                {pages}
                <button
                    class="join-item btn btn-sm"
                    disabled=move || !state.with(ListState::has_next)
                    on:click=move |_| handle.next()
                >
                    "»"
                </button>
            </div>
        </div>
    }
}

/// 表格主体：加载 > 错误 > 空 > 数据行
pub fn table_body<R, V>(
    handle: ListHandle<R>,
    columns: usize,
    row: impl Fn(R::Item) -> V + Clone + Send + Sync + 'static,
) -> impl IntoView
where
    R: Resource,
    V: IntoView + 'static,
{
    let state = handle.state();
    let colspan = columns.to_string();

    move || match state.with(ListState::table) {
        TableView::Loading => view! {
            <tr>
                <td colspan=colspan.clone() class="text-center py-8">
                    <span class="loading loading-spinner text-primary"></span>
                </td>
            </tr>
        }
        .into_any(),
        TableView::Error(message) => view! {
            <tr>
                <td colspan=colspan.clone() class="text-center py-8 text-error">{message}</td>
            </tr>
        }
        .into_any(),
        TableView::Empty(message) => view! {
            <tr>
                <td colspan=colspan.clone() class="text-center py-8 text-base-content/50">{message}</td>
            </tr>
        }
        .into_any(),
        TableView::Rows(items) => items.into_iter().map(row.clone()).collect_view().into_any(),
    }
}

/// 最近一次增删改失败的提示
pub fn action_error<R: Resource>(handle: ListHandle<R>) -> impl IntoView {
    let state = handle.state();
    let message = move || {
        state.with(|s| s.action_error.as_ref().map(|e| e.message().to_string()))
    };

    view! {
        <Show when=move || message().is_some()>
            <div role="alert" class="alert alert-error text-sm mx-4">
                <span>{move || message().unwrap_or_default()}</span>
                <button class="btn btn-ghost btn-xs" on:click=move |_| handle.clear_action_error()>
                    "✕"
                </button>
            </div>
        </Show>
    }
}
