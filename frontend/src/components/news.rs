//! 新闻管理列表

use leptos::prelude::*;
use libris::shared::date::display_date;
use libris::shared::{NewsPost, NewsPosts};

use super::list::{ListHandle, action_error, list_pager, list_toolbar, table_body, use_lists};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};

fn news_row(news: ListHandle<NewsPosts>, post: NewsPost) -> impl IntoView {
    let id = post.id;
    let published = post.published_at.as_deref().map(display_date).unwrap_or_default();
    let badge = if post.is_published {
        view! { <span class="badge badge-success">"Published"</span> }.into_any()
    } else {
        view! { <span class="badge badge-ghost">"Draft"</span> }.into_any()
    };

    view! {
        <tr>
            <td>
                <div class="font-medium">{post.title}</div>
                <div class="text-xs text-base-content/60">{post.slug}</div>
            </td>
            <td>{badge}</td>
            <td class="hidden md:table-cell">{published}</td>
            <td class="text-right whitespace-nowrap">
                <Link to=AppRoute::NewsDetail(id) class="btn btn-ghost btn-xs">"View"</Link>
                <Link to=AppRoute::NewsEdit(id) class="btn btn-ghost btn-xs">"Edit"</Link>
                <button
                    class="btn btn-ghost btn-xs text-error"
                    on:click=move |_| news.delete(id, "Delete this post?")
                >
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

#[component]
pub fn AdminNewsPage() -> impl IntoView {
    let news = use_lists().news;
    let router = use_router();
    news.reload();

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <h3 class="card-title">"News"</h3>
                    <button class="btn btn-primary btn-sm" on:click=move |_| router.go(AppRoute::NewsNew)>
                        "New post"
                    </button>
                </div>
                {list_toolbar(news, "Search posts")}
                {action_error(news)}
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Title"</th>
                                <th>"Status"</th>
                                <th class="hidden md:table-cell">"Published"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>{table_body(news, 4, move |post| news_row(news, post))}</tbody>
                    </table>
                </div>
                {list_pager(news)}
            </div>
        </div>
    }
}
