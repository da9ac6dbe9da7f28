//! 公开页面：首页、馆藏目录、新闻

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::shared::barcode::{BarcodeStyle, svg_data_uri};
use libris::shared::date::{display_date, display_datetime};
use libris::shared::{Book, NewsPost};

use super::list::{list_pager, list_toolbar, table_body, use_lists};
use super::load::{LoadHandle, load_view};
use crate::auth::{logout, use_auth};
use crate::web::route::AppRoute;
use crate::web::router::Link;

/// 首页新闻摘要长度
const SUMMARY_CHARS: usize = 160;

#[component]
pub fn PublicLayout(children: Children) -> impl IntoView {
    let auth = use_auth();
    let is_authenticated = auth.is_authenticated_signal();
    let role = auth.role_signal();
    let is_staff = move || is_authenticated.get() && AppRoute::Dashboard.allows(role.get());
    let on_logout = move |_| spawn_local(logout(auth));

    view! {
        <div class="min-h-screen bg-base-200">
            <div class="navbar bg-base-100 shadow">
                <div class="flex-1">
                    <Link to=AppRoute::Home class="btn btn-ghost text-xl">"Libris"</Link>
                </div>
                <div class="flex-none gap-2">
                    <Link to=AppRoute::Catalog class="btn btn-ghost btn-sm">"Catalog"</Link>
                    <Link to=AppRoute::News class="btn btn-ghost btn-sm">"News"</Link>
                    {move || if is_staff() {
                        view! { <Link to=AppRoute::Dashboard class="btn btn-primary btn-sm">"Dashboard"</Link> }.into_any()
                    } else if is_authenticated.get() {
                        view! { <button class="btn btn-outline btn-sm" on:click=on_logout>"Sign out"</button> }.into_any()
                    } else {
                        view! { <Link to=AppRoute::Login class="btn btn-primary btn-sm">"Sign in"</Link> }.into_any()
                    }}
                </div>
            </div>
            <main class="max-w-6xl mx-auto p-4 md:p-8 space-y-6">{children()}</main>
        </div>
    }
}

fn news_card(post: NewsPost) -> impl IntoView {
    let published = post.published_at.as_deref().map(display_date).unwrap_or_default();
    let minutes = post.reading_minutes();
    let summary = post.summary(SUMMARY_CHARS);

    view! {
        <div class="card bg-base-100 shadow">
            <div class="card-body">
                <h3 class="card-title">
                    <Link to=AppRoute::NewsDetail(post.id) class="link link-hover">{post.title}</Link>
                </h3>
                <p class="text-xs text-base-content/60">{published}" · "{minutes}" min read"</p>
                <p>{summary}</p>
            </div>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = use_auth();
    let landing = LoadHandle::<Vec<NewsPost>>::new();

    let api = auth.api();
    let limit = api.config().landing_limit;
    landing.load(async move { api.landing_news(limit).await });

    view! {
        <PublicLayout>
            <div class="hero bg-base-100 rounded-box shadow">
                <div class="hero-content text-center py-12">
                    <div class="max-w-md">
                        <h1 class="text-4xl font-bold">"Welcome to the library"</h1>
                        <p class="py-4 text-base-content/70">"Browse the catalog and catch up on the latest news."</p>
                        <Link to=AppRoute::Catalog class="btn btn-primary">"Browse catalog"</Link>
                    </div>
                </div>
            </div>
            <h2 class="text-2xl font-bold">"Latest news"</h2>
            {load_view(landing, |posts: Vec<NewsPost>| {
                if posts.is_empty() {
                    view! { <p class="text-base-content/60">"No news yet."</p> }.into_any()
                } else {
                    view! {
                        <div class="grid gap-4 md:grid-cols-3">
                            {posts.into_iter().map(news_card).collect_view()}
                        </div>
                    }
                    .into_any()
                }
            })}
        </PublicLayout>
    }
}

fn catalog_row(book: Book) -> impl IntoView {
    let authors = book.author_names();
    let category = book.category_name().unwrap_or("-").to_string();
    let availability = book.availability();

    view! {
        <tr>
            <td>
                <Link to=AppRoute::BookDetail(book.id) class="link link-hover font-medium">{book.title}</Link>
            </td>
            <td>{authors}</td>
            <td class="hidden md:table-cell">{category}</td>
            <td>{availability}</td>
        </tr>
    }
}

#[component]
pub fn CatalogPage() -> impl IntoView {
    let catalog = use_lists().catalog;
    catalog.reload();

    view! {
        <PublicLayout>
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <h2 class="card-title p-6 pb-0">"Catalog"</h2>
                    {list_toolbar(catalog, "Search by title, author or ISBN")}
                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Title"</th>
                                    <th>"Authors"</th>
                                    <th class="hidden md:table-cell">"Category"</th>
                                    <th>"Available"</th>
                                </tr>
                            </thead>
                            <tbody>{table_body(catalog, 4, catalog_row)}</tbody>
                        </table>
                    </div>
                    {list_pager(catalog)}
                </div>
            </div>
        </PublicLayout>
    }
}

fn book_details(book: Book) -> impl IntoView {
    let barcode = svg_data_uri(&book.isbn, BarcodeStyle::default()).ok();
    let rows = [
        ("ISBN", book.isbn.clone()),
        ("Authors", book.author_names()),
        ("Genres", book.genre_names()),
        ("Category", book.category_name().unwrap_or("-").to_string()),
        ("Publisher", book.publisher.clone().unwrap_or_default()),
        (
            "Published",
            book.publication_date.as_deref().map(display_date).unwrap_or_default(),
        ),
        ("Shelf", book.shelf_name.clone().unwrap_or_default()),
        ("Available", book.availability()),
    ];

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h2 class="card-title text-2xl">{book.title}</h2>
                <dl class="grid grid-cols-1 md:grid-cols-2 gap-2">
                    {rows
                        .into_iter()
                        .map(|(label, value)| view! {
                            <div>
                                <dt class="text-sm text-base-content/60">{label}</dt>
                                <dd>{value}</dd>
                            </div>
                        })
                        .collect_view()}
                </dl>
                {barcode.map(|src| view! { <img class="mt-4 w-64" src=src alt="ISBN barcode" /> })}
            </div>
        </div>
    }
}

#[component]
pub fn BookDetailPage(id: u64) -> impl IntoView {
    let list = use_lists().catalog.list();
    let book = LoadHandle::<Book>::new();
    book.load(async move { list.fetch_one(id).await });

    view! {
        <PublicLayout>
            <Link to=AppRoute::Catalog class="btn btn-ghost btn-sm">"← Back to catalog"</Link>
            {load_view(book, book_details)}
        </PublicLayout>
    }
}

#[component]
pub fn NewsListPage() -> impl IntoView {
    let bulletins = use_lists().bulletins;
    bulletins.reload();
    let state = bulletins.state();

    let cards = move || {
        state.with(|s| {
            if s.loading {
                view! { <span class="loading loading-spinner text-primary"></span> }.into_any()
            } else if let Some(e) = &s.error {
                view! { <div role="alert" class="alert alert-error"><span>{e.message().to_string()}</span></div> }
                    .into_any()
            } else {
                s.items.iter().cloned().map(news_card).collect_view().into_any()
            }
        })
    };

    view! {
        <PublicLayout>
            <h2 class="text-2xl font-bold">"News"</h2>
            <div class="grid gap-4">{cards}</div>
            {list_pager(bulletins)}
        </PublicLayout>
    }
}

fn news_article(post: NewsPost) -> impl IntoView {
    let published = post.published_at.as_deref().map(display_datetime).unwrap_or_default();
    view! {
        <article class="card bg-base-100 shadow-xl">
            {post.featured_image.map(|src| view! { <figure><img src=src alt="" /></figure> })}
            <div class="card-body">
                <h2 class="card-title text-3xl">{post.title}</h2>
                <p class="text-sm text-base-content/60">{published}</p>
                <div class="whitespace-pre-line">{post.content}</div>
            </div>
        </article>
    }
}

#[component]
pub fn NewsDetailPage(id: u64) -> impl IntoView {
    let list = use_lists().bulletins.list();
    let post = LoadHandle::<NewsPost>::new();
    post.load(async move { list.fetch_one(id).await });

    view! {
        <PublicLayout>
            <Link to=AppRoute::News class="btn btn-ghost btn-sm">"← All news"</Link>
            {load_view(post, news_article)}
        </PublicLayout>
    }
}
