//! Libris 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 认证状态管理
//! - `components`: UI 组件层
//!
//! 业务逻辑全部在 `libris` 核心 crate 中，这里只负责浏览器适配与渲染。

mod auth;
pub mod logging;
mod components {
    pub mod book_form;
    pub mod books;
    pub mod dashboard;
    pub mod form;
    pub mod import;
    pub mod list;
    pub mod load;
    pub mod login;
    pub mod news;
    pub mod news_form;
    pub mod public;
    pub mod shell;
    pub mod user_form;
    pub mod users;
}

use crate::auth::AuthContext;
use crate::components::book_form::BookFormPage;
use crate::components::books::BooksPage;
use crate::components::dashboard::DashboardPage;
use crate::components::import::ImportPage;
use crate::components::list::provide_lists;
use crate::components::login::LoginPage;
use crate::components::news::AdminNewsPage;
use crate::components::news_form::NewsFormPage;
use crate::components::public::{
    BookDetailPage, CatalogPage, HomePage, NewsDetailPage, NewsListPage, PublicLayout,
};
use crate::components::shell::AdminShell;
use crate::components::user_form::{RoleFormPage, UserEditPage, UserNewPage};
use crate::components::users::UsersPage;

use leptos::prelude::*;
use libris::ClientConfig;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    pub mod dom;
    mod http;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use http::FetchHttpClient;
    pub use storage::LocalStorage;
    pub use timer::TimeoutSleeper;
}

use web::route::AppRoute;
use web::router::{Link, Router, RouterOutlet};

/// 后台页面统一包裹在 `AdminShell` 中
fn admin(page: AnyView) -> AnyView {
    view! { <AdminShell>{page}</AdminShell> }.into_any()
}

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Catalog => view! { <CatalogPage /> }.into_any(),
        AppRoute::BookDetail(id) => view! { <BookDetailPage id=id /> }.into_any(),
        AppRoute::News => view! { <NewsListPage /> }.into_any(),
        AppRoute::NewsDetail(id) => view! { <NewsDetailPage id=id /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => admin(view! { <DashboardPage /> }.into_any()),
        AppRoute::Books => admin(view! { <BooksPage /> }.into_any()),
        AppRoute::BookNew => admin(view! { <BookFormPage /> }.into_any()),
        AppRoute::BookEdit(id) => admin(view! { <BookFormPage id=id /> }.into_any()),
        AppRoute::Import => admin(view! { <ImportPage /> }.into_any()),
        AppRoute::AdminNews => admin(view! { <AdminNewsPage /> }.into_any()),
        AppRoute::NewsNew => admin(view! { <NewsFormPage /> }.into_any()),
        AppRoute::NewsEdit(id) => admin(view! { <NewsFormPage id=id /> }.into_any()),
        AppRoute::Users => admin(view! { <UsersPage /> }.into_any()),
        AppRoute::UserNew => admin(view! { <UserNewPage /> }.into_any()),
        AppRoute::UserEdit(id) => admin(view! { <UserEditPage id=id /> }.into_any()),
        AppRoute::UserRole(id) => admin(view! { <RoleFormPage id=id /> }.into_any()),
        AppRoute::NotFound => view! {
            <PublicLayout>
                <div class="text-center py-16">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to=AppRoute::Home class="btn btn-primary mt-6">"Go home"</Link>
                </div>
            </PublicLayout>
        }
        .into_any(),
    }
}

#[component]
pub fn App(config: ClientConfig) -> impl IntoView {
    // 1. 创建认证上下文（从 LocalStorage 恢复会话）
    let auth_ctx = AuthContext::new(config);
    provide_context(auth_ctx);

    // 2. 应用级列表，跨页面保留分页位置
    provide_lists(auth_ctx);

    // 3. 获取认证与角色信号，用于注入路由服务（解耦！）
    let is_authenticated = auth_ctx.is_authenticated_signal();
    let role = auth_ctx.role_signal();

    view! {
        // 4. 路由器组件：注入认证信号实现守卫
        <Router is_authenticated=is_authenticated role=role>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
