//! 后台布局：侧边导航按角色过滤

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::{logout, use_auth};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};

const NAV: [(AppRoute, &str); 5] = [
    (AppRoute::Dashboard, "Dashboard"),
    (AppRoute::Books, "Books"),
    (AppRoute::Import, "Import"),
    (AppRoute::AdminNews, "News"),
    (AppRoute::Users, "Users"),
];

#[component]
pub fn AdminShell(children: Children) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let role = auth.role_signal();
    let current = router.current_route();

    let user_name = move || auth.session.with(|s| s.user.as_ref().map(|u| u.display_name()));
    let role_label = move || role.get().map(|r| r.label()).unwrap_or_default();

    let nav = move || {
        let role = role.get();
        let active = current.get();
        NAV.iter()
            .filter(|(route, _)| route.allows(role))
            .map(|&(route, label)| {
                let class = if route == active { "active" } else { "" };
                view! {
                    <li>
                        <Link to=route class=class>{label}</Link>
                    </li>
                }
            })
            .collect_view()
    };

    let on_logout = move |_| spawn_local(logout(auth));

    view! {
        <div class="min-h-screen bg-base-200 font-sans">
            <div class="navbar bg-base-100 shadow-xl">
                <div class="flex-1 gap-2">
                    <Link to=AppRoute::Dashboard class="btn btn-ghost text-xl">"Libris Admin"</Link>
                    <Link to=AppRoute::Home class="btn btn-ghost btn-sm">"View site"</Link>
                </div>
                <div class="flex-none gap-2">
                    <span class="hidden md:inline text-sm">{user_name}</span>
                    <span class="badge badge-neutral">{role_label}</span>
                    <button on:click=on_logout class="btn btn-outline btn-error btn-sm">"Sign out"</button>
                </div>
            </div>
            <div class="flex flex-col md:flex-row gap-4 p-4 md:p-8 max-w-7xl mx-auto">
                <ul class="menu bg-base-100 rounded-box shadow w-full md:w-56 h-fit">{nav}</ul>
                <main class="flex-1 space-y-6 min-w-0">{children()}</main>
            </div>
        </div>
    }
}
