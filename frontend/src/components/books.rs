//! 图书管理列表

use leptos::prelude::*;
use libris::shared::{Book, Books};
use libris::shared::barcode::{BarcodeStyle, download_file_name, svg_data_uri};
use tracing::warn;

use super::list::{ListHandle, action_error, list_pager, list_toolbar, table_body, use_lists};
use crate::web::dom;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};

const BARCODE_STYLE: BarcodeStyle = BarcodeStyle {
    module_width: 1.5,
    bar_height: 40.0,
    font_size: 11.0,
};

fn barcode_cell(isbn: String) -> impl IntoView {
    match svg_data_uri(&isbn, BARCODE_STYLE) {
        Ok(src) => {
            let href = src.clone();
            let file_name = download_file_name(&isbn);
            let on_download = move |_| {
                if let Err(e) = dom::download(&href, &file_name) {
                    warn!(error = %e, "barcode download failed");
                }
            };
            view! {
                <div class="flex items-center gap-2">
                    <img src=src alt="barcode" class="h-12" />
                    <button class="btn btn-ghost btn-xs" on:click=on_download>"Download"</button>
                </div>
            }
            .into_any()
        }
        Err(e) => view! { <span class="text-xs text-error">{e.to_string()}</span> }.into_any(),
    }
}

fn book_row(books: ListHandle<Books>, book: Book) -> impl IntoView {
    let id = book.id;
    let authors = book.author_names();
    let category = book.category_name().unwrap_or("-").to_string();
    let availability = book.availability();
    let status = book.status.clone().unwrap_or_default();

    view! {
        <tr>
            <td>
                <div class="font-medium">{book.title}</div>
                <div class="text-xs text-base-content/60">{authors}</div>
            </td>
            <td class="hidden md:table-cell">{category}</td>
            <td class="hidden lg:table-cell">{barcode_cell(book.isbn)}</td>
            <td>{availability}</td>
            <td class="hidden md:table-cell">{status}</td>
            <td class="text-right whitespace-nowrap">
                <Link to=AppRoute::BookDetail(id) class="btn btn-ghost btn-xs">"View"</Link>
                <Link to=AppRoute::BookEdit(id) class="btn btn-ghost btn-xs">"Edit"</Link>
                <button
                    class="btn btn-ghost btn-xs text-error"
                    on:click=move |_| books.delete(id, "Delete this book?")
                >
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

#[component]
pub fn BooksPage() -> impl IntoView {
    let books = use_lists().books;
    let router = use_router();
    books.reload();

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <h3 class="card-title">"Books"</h3>
                    <div class="flex gap-2">
                        <button class="btn btn-outline btn-sm" on:click=move |_| router.go(AppRoute::Import)>
                            "Import"
                        </button>
                        <button class="btn btn-primary btn-sm" on:click=move |_| router.go(AppRoute::BookNew)>
                            "Add book"
                        </button>
                    </div>
                </div>
                {list_toolbar(books, "Search by title, author or ISBN")}
                {action_error(books)}
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Title"</th>
                                <th class="hidden md:table-cell">"Category"</th>
                                <th class="hidden lg:table-cell">"Barcode"</th>
                                <th>"Copies"</th>
                                <th class="hidden md:table-cell">"Status"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>{table_body(books, 6, move |book| book_row(books, book))}</tbody>
                    </table>
                </div>
                {list_pager(books)}
            </div>
        </div>
    }
}
