use leptos::prelude::*;
use libris::shared::DashboardStats;

use super::load::{LoadHandle, load_view};
use crate::auth::use_auth;

fn stat_cards(stats: DashboardStats) -> impl IntoView {
    let cards = stats
        .cards()
        .into_iter()
        .map(|(title, value)| {
            view! {
                <div class="stat">
                    <div class="stat-title">{title}</div>
                    <div class="stat-value text-primary">{value}</div>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="stats shadow w-full stats-vertical lg:stats-horizontal bg-base-100 flex-wrap">
            {cards}
        </div>
        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
            <div class="stat">
                <div class="stat-title">"Active books"</div>
                <div class="stat-value text-success">{stats.active_books()}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Active users"</div>
                <div class="stat-value text-success">{stats.active_users()}</div>
            </div>
        </div>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let stats = LoadHandle::<DashboardStats>::new();

    let load = move || {
        let api = auth.api();
        stats.load(async move { api.dashboard_stats().await });
    };
    load();

    let loading = move || stats.state().with(|s| s.loading);
    let greeting = move || {
        auth.user()
            .map(|u| format!("Welcome back, {}", u.display_name()))
            .unwrap_or_default()
    };

    view! {
        <div class="flex items-center justify-between">
            <div>
                <h2 class="text-2xl font-bold">"Dashboard"</h2>
                <p class="text-base-content/70 text-sm">{greeting}</p>
            </div>
            <button on:click=move |_| load() disabled=loading class="btn btn-ghost btn-sm">
                "Refresh"
            </button>
        </div>
        {load_view(stats, stat_cards)}
    }
}
