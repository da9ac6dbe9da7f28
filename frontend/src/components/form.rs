//! 表单公共部件与提交流程

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::ApiResult;
use libris::forms::{Draft, SubmitOutcome, submit_create, submit_update};
use libris::shared::{FileAttachment, Resource};
use tracing::warn;

use super::list::AppList;
use crate::web::dom;
use crate::web::route::AppRoute;
use crate::web::router::{RouterService, use_router};

/// 表单提交状态；校验失败或请求失败都停留在表单页
#[derive(Clone, Copy)]
pub struct FormStatus {
    pub error: RwSignal<Option<String>>,
    pub saving: RwSignal<bool>,
    router: RouterService,
}

impl FormStatus {
    pub fn new() -> Self {
        Self {
            error: RwSignal::new(None),
            saving: RwSignal::new(false),
            router: use_router(),
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.error.set(Some(message.into()));
    }

    pub fn begin(&self) {
        self.saving.set(true);
        self.error.set(None);
    }

    pub fn finish(&self, result: ApiResult<SubmitOutcome>, done: AppRoute) {
        self.saving.set(false);
        match result {
            Ok(SubmitOutcome::Saved(())) => self.router.go(done),
            Ok(SubmitOutcome::Invalid(invalid)) => self.fail(invalid.message),
            Err(e) => self.fail(e.message()),
        }
    }
}

pub fn save_create<R, D>(status: FormStatus, list: Arc<AppList<R>>, draft: D, done: AppRoute)
where
    R: Resource,
    D: Draft<Payload = R::Create> + 'static,
{
    status.begin();
    spawn_local(async move {
        let result = submit_create(&list, &draft).await;
        status.finish(result, done);
    });
}

pub fn save_update<R, D>(status: FormStatus, list: Arc<AppList<R>>, id: u64, draft: D, done: AppRoute)
where
    R: Resource,
    D: Draft<Payload = R::Update> + 'static,
{
    status.begin();
    spawn_local(async move {
        let result = submit_update(&list, id, &draft).await;
        status.finish(result, done);
    });
}

/// 编辑页加载单条记录
pub fn load_item<R, F>(status: FormStatus, list: Arc<AppList<R>>, id: u64, apply: F)
where
    R: Resource,
    F: FnOnce(R::Item) + 'static,
{
    spawn_local(async move {
        match list.fetch_one(id).await {
            Ok(item) => apply(item),
            Err(e) => status.fail(e.message()),
        }
    });
}

// ============================================================================
// 字段
// ============================================================================

/// 把草稿信号的一个字符串字段绑定到输入框
macro_rules! draft_field {
    ($draft:ident, $label:literal, $kind:literal, $field:ident) => {
        $crate::components::form::text_field(
            $label,
            $kind,
            move || $draft.with(|d| d.$field.clone()),
            move |v| $draft.update(|d| d.$field = v),
        )
    };
}
pub(crate) use draft_field;

pub fn text_field(
    label: &'static str,
    kind: &'static str,
    value: impl Fn() -> String + Send + Sync + 'static,
    on_input: impl Fn(String) + 'static,
) -> impl IntoView {
    view! {
        <label class="form-control w-full">
            <div class="label">
                <span class="label-text">{label}</span>
            </div>
            <input
                type=kind
                class="input input-bordered w-full"
                prop:value=value
                on:input=move |ev| on_input(event_target_value(&ev))
            />
        </label>
    }
}

pub fn text_area(
    label: &'static str,
    rows: u32,
    value: impl Fn() -> String + Send + Sync + 'static,
    on_input: impl Fn(String) + 'static,
) -> impl IntoView {
    view! {
        <label class="form-control w-full">
            <div class="label">
                <span class="label-text">{label}</span>
            </div>
            <textarea
                class="textarea textarea-bordered w-full"
                rows=rows.to_string()
                prop:value=value
                on:input=move |ev| on_input(event_target_value(&ev))
            ></textarea>
        </label>
    }
}

pub fn checkbox(
    label: &'static str,
    checked: impl Fn() -> bool + Send + Sync + 'static,
    on_toggle: impl Fn(bool) + 'static,
) -> impl IntoView {
    view! {
        <label class="label cursor-pointer justify-start gap-3">
            <input
                type="checkbox"
                class="checkbox checkbox-primary"
                prop:checked=checked
                on:change=move |ev| on_toggle(event_target_checked(&ev))
            />
            <span class="label-text">{label}</span>
        </label>
    }
}

/// 文件字段：选择后读入内存，读取失败写入表单错误
pub fn file_field(
    label: &'static str,
    accept: &'static str,
    status: FormStatus,
    on_file: Callback<Option<FileAttachment>>,
) -> impl IntoView {
    let on_change = move |ev: leptos::ev::Event| {
        let Some(file) = dom::selected_file(&ev) else {
            on_file.run(None);
            return;
        };
        spawn_local(async move {
            match dom::read_file(&file).await {
                Ok(attachment) => on_file.run(Some(attachment)),
                Err(e) => {
                    warn!(error = %e, "failed to read selected file");
                    status.fail(e);
                }
            }
        });
    };

    view! {
        <label class="form-control w-full">
            <div class="label">
                <span class="label-text">{label}</span>
            </div>
            <input
                type="file"
                accept=accept
                class="file-input file-input-bordered w-full"
                on:change=on_change
            />
        </label>
    }
}

/// 校验或提交失败的提示
pub fn form_alert(status: FormStatus) -> impl IntoView {
    let error = status.error;
    view! {
        <Show when=move || error.get().is_some()>
            <div role="alert" class="alert alert-error text-sm py-2">
                <span>{move || error.get().unwrap_or_default()}</span>
            </div>
        </Show>
    }
}

/// 提交与取消按钮
pub fn form_actions(status: FormStatus, cancel: AppRoute) -> impl IntoView {
    let saving = status.saving;
    let router = status.router;
    view! {
        <div class="flex justify-end gap-2 mt-6">
            <button type="button" class="btn btn-ghost" on:click=move |_| router.go(cancel)>
                "Cancel"
            </button>
            <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                {move || if saving.get() {
                    view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                } else {
                    "Save".into_any()
                }}
            </button>
        </div>
    }
}
