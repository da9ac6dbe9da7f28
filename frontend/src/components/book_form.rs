//! 新建/编辑图书

use leptos::prelude::*;
use libris::forms::BookDraft;

use super::form::{
    FormStatus, draft_field, file_field, form_actions, form_alert, load_item, save_create,
    save_update,
};
use super::list::use_lists;
use crate::web::route::AppRoute;

#[component]
pub fn BookFormPage(#[prop(optional)] id: Option<u64>) -> impl IntoView {
    let books = use_lists().books;
    let status = FormStatus::new();
    let draft = RwSignal::new(BookDraft::default());

    if let Some(id) = id {
        load_item(status, books.list(), id, move |book| {
            draft.set(BookDraft::from_book(&book));
        });
    }

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let current = draft.get_untracked();
        match id {
            Some(id) => save_update(status, books.list(), id, current, AppRoute::Books),
            None => save_create(status, books.list(), current, AppRoute::Books),
        }
    };

    let on_cover = Callback::new(move |file| draft.update(|d| d.cover_image = file));
    let title = if id.is_some() { "Edit book" } else { "Add book" };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">{title}</h3>
                {form_alert(status)}
                <div class="grid grid-cols-1 md:grid-cols-2 gap-x-4">
                    {draft_field!(draft, "Title", "text", title)}
                    {draft_field!(draft, "ISBN", "text", isbn)}
                    {draft_field!(draft, "Publisher", "text", publisher)}
                    {draft_field!(draft, "Publication date", "date", publication_date)}
                    {draft_field!(draft, "Accession number", "text", accession_number)}
                    {draft_field!(draft, "Category", "text", category)}
                    {draft_field!(draft, "Authors (comma separated)", "text", authors)}
                    {draft_field!(draft, "Genres (comma separated)", "text", genres)}
                    {draft_field!(draft, "Donor / source", "text", from_org_name)}
                    {draft_field!(draft, "Acquisition type", "text", from_type)}
                    {draft_field!(draft, "Shelf name", "text", shelf_name)}
                    {draft_field!(draft, "Shelf number", "number", shelf_number)}
                    {draft_field!(draft, "Copies", "number", copies)}
                    {file_field("Cover image", "image/*", status, on_cover)}
                </div>
                {form_actions(status, AppRoute::Books)}
            </form>
        </div>
    }
}
