//! 批量导入图书

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::shared::FileAttachment;
use libris::upload::{ACCEPT_ATTRIBUTE, MAX_UPLOAD_BYTES, UploadStatus, Uploader};
use tracing::warn;

use super::list::use_lists;
use crate::auth::use_auth;
use crate::web::route::AppRoute;
use crate::web::router::Link;
use crate::web::{FetchHttpClient, LocalStorage, dom};

type AppUploader = Uploader<FetchHttpClient, LocalStorage>;

fn status_class(status: &UploadStatus) -> &'static str {
    match status {
        UploadStatus::Idle => "hidden",
        UploadStatus::Uploading { .. } => "alert alert-info",
        UploadStatus::Succeeded(_) => "alert alert-success",
        UploadStatus::Failed { .. } => "alert alert-error",
        UploadStatus::Cancelled => "alert alert-warning",
    }
}

#[component]
pub fn ImportPage() -> impl IntoView {
    let auth = use_auth();
    let books = use_lists().books;

    let uploader = Arc::new(AppUploader::new(auth.api()));
    let status = RwSignal::new(uploader.status());
    let id = uploader.subscribe(move |snapshot| {
        let _ = status.try_set(snapshot.clone());
    });
    let uploader = StoredValue::new(uploader);
    on_cleanup(move || {
        uploader.with_value(|u| {
            u.cancel();
            u.unsubscribe(id);
        });
    });

    let file = RwSignal::new(Option::<FileAttachment>::None);

    let on_change = move |ev: leptos::ev::Event| {
        file.set(None);
        let Some(selected) = dom::selected_file(&ev) else {
            uploader.with_value(|u| u.reset());
            return;
        };
        // 浏览器给出的大小是 f64
        let size = selected.size() as u64;
        if uploader.with_value(|u| u.select(&selected.name(), size)).is_err() {
            return;
        }
        spawn_local(async move {
            match dom::read_file(&selected).await {
                Ok(attachment) => file.set(Some(attachment)),
                Err(e) => warn!(error = %e, "failed to read import file"),
            }
        });
    };

    let on_upload = move |_| {
        let uploader = uploader.get_value();
        let selected = file.get_untracked();
        spawn_local(async move {
            if let UploadStatus::Succeeded(_) = uploader.upload(selected).await {
                books.reload();
            }
        });
    };

    let on_cancel = move |_| {
        uploader.with_value(|u| u.cancel());
    };

    let uploading = move || status.with(UploadStatus::is_uploading);
    let tips = move || match status.get() {
        UploadStatus::Failed { tips, .. } => tips
            .iter()
            .map(|tip| view! { <li>{*tip}</li> })
            .collect_view()
            .into_any(),
        _ => ().into_any(),
    };
    let limit = format!(
        "Accepted: {} · up to {} MB",
        ACCEPT_ATTRIBUTE,
        MAX_UPLOAD_BYTES / (1024 * 1024)
    );

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between">
                    <h3 class="card-title">"Import books"</h3>
                    <Link to=AppRoute::Books class="btn btn-ghost btn-sm">"← Books"</Link>
                </div>
                <p class="text-sm text-base-content/70">{limit}</p>
                <input
                    type="file"
                    accept=ACCEPT_ATTRIBUTE
                    class="file-input file-input-bordered w-full max-w-md"
                    disabled=uploading
                    on:change=on_change
                />
                <div role="alert" class=move || status.with(status_class)>
                    {move || {
                        if uploading() {
                            view! { <span class="loading loading-spinner loading-sm"></span> }.into_any()
                        } else {
                            ().into_any()
                        }
                    }}
                    <div>
                        <span>{move || status.with(UploadStatus::message).unwrap_or_default()}</span>
                        <ul class="list-disc ml-4 text-sm">{tips}</ul>
                    </div>
                </div>
                <div class="flex justify-end gap-2">
                    <Show when=uploading>
                        <button class="btn btn-ghost" on:click=on_cancel>"Cancel"</button>
                    </Show>
                    <button
                        class="btn btn-primary"
                        disabled=move || uploading() || file.with(Option::is_none)
                        on:click=on_upload
                    >
                        "Upload"
                    </button>
                </div>
            </div>
        </div>
    }
}
