//! 用户管理列表（仅管理员）

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::shared::{Member, MemberUpdate, Members};
use tracing::warn;

use super::list::{ListHandle, action_error, list_pager, list_toolbar, table_body, use_lists};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};

/// 激活或停用账号
fn set_verified(users: ListHandle<Members>, id: u64, verified: bool) {
    let list = users.list();
    spawn_local(async move {
        if let Err(e) = list.update(id, &MemberUpdate::verified(verified)).await {
            warn!(id, verified, error = %e, "failed to change account status");
        }
    });
}

fn user_row(users: ListHandle<Members>, member: Member) -> impl IntoView {
    let id = member.id;
    let verified = member.verified;
    let name = member.full_name();
    let role = member.role_label();
    let status = member.status_label();
    let status_class = if verified { "badge badge-success" } else { "badge badge-warning" };
    let toggle_label = if verified { "Deactivate" } else { "Activate" };

    view! {
        <tr>
            <td>
                <div class="font-medium">{name}</div>
                <div class="text-xs text-base-content/60">{member.email}</div>
            </td>
            <td>{role}</td>
            <td>
                <span class=status_class>{status}</span>
            </td>
            <td class="text-right whitespace-nowrap">
                <button class="btn btn-ghost btn-xs" on:click=move |_| set_verified(users, id, !verified)>
                    {toggle_label}
                </button>
                <Link to=AppRoute::UserRole(id) class="btn btn-ghost btn-xs">"Role"</Link>
                <Link to=AppRoute::UserEdit(id) class="btn btn-ghost btn-xs">"Edit"</Link>
                <button
                    class="btn btn-ghost btn-xs text-error"
                    on:click=move |_| users.delete(id, "Delete this user?")
                >
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

#[component]
pub fn UsersPage() -> impl IntoView {
    let users = use_lists().users;
    let router = use_router();
    users.reload();

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <h3 class="card-title">"Users"</h3>
                    <button class="btn btn-primary btn-sm" on:click=move |_| router.go(AppRoute::UserNew)>
                        "Add user"
                    </button>
                </div>
                {list_toolbar(users, "Search by name or email")}
                {action_error(users)}
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Name"</th>
                                <th>"Role"</th>
                                <th>"Status"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>{table_body(users, 4, move |member| user_row(users, member))}</tbody>
                    </table>
                </div>
                {list_pager(users)}
            </div>
        </div>
    }
}
