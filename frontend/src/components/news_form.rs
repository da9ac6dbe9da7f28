//! 新建/编辑新闻

use leptos::prelude::*;
use libris::forms::NewsDraft;

use super::form::{
    FormStatus, checkbox, draft_field, file_field, form_actions, form_alert, load_item, save_create,
    save_update, text_area,
};
use super::list::use_lists;
use crate::web::route::AppRoute;

#[component]
pub fn NewsFormPage(#[prop(optional)] id: Option<u64>) -> impl IntoView {
    let news = use_lists().news;
    let status = FormStatus::new();
    let draft = RwSignal::new(NewsDraft::default());

    if let Some(id) = id {
        load_item(status, news.list(), id, move |post| {
            draft.set(NewsDraft::from_post(&post));
        });
    }

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        draft.update(NewsDraft::fill_slug);
        let current = draft.get_untracked();
        match id {
            Some(id) => save_update(status, news.list(), id, current, AppRoute::AdminNews),
            None => save_create(status, news.list(), current, AppRoute::AdminNews),
        }
    };

    let on_image = Callback::new(move |file| draft.update(|d| d.featured_image = file));
    let heading = if id.is_some() { "Edit post" } else { "New post" };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">{heading}</h3>
                {form_alert(status)}
                <div on:focusout=move |_| draft.update(NewsDraft::fill_slug)>
                    {draft_field!(draft, "Title", "text", title)}
                </div>
                {draft_field!(draft, "Slug", "text", slug)}
                {text_area(
                    "Excerpt",
                    2,
                    move || draft.with(|d| d.excerpt.clone()),
                    move |v| draft.update(|d| d.excerpt = v),
                )}
                {text_area(
                    "Content",
                    10,
                    move || draft.with(|d| d.content.clone()),
                    move |v| draft.update(|d| d.content = v),
                )}
                <div class="grid grid-cols-1 md:grid-cols-2 gap-x-4 items-end">
                    {draft_field!(draft, "Publish at", "datetime-local", published_at)}
                    {checkbox(
                        "Published",
                        move || draft.with(|d| d.is_published),
                        move |on| draft.update(|d| d.is_published = on),
                    )}
                </div>
                {file_field("Featured image", "image/*", status, on_image)}
                {form_actions(status, AppRoute::AdminNews)}
            </form>
        </div>
    }
}
