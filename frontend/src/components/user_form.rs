//! 新建用户、编辑资料、修改角色

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::forms::{MemberDraft, MemberEditDraft, RoleDraft, SubmitOutcome, submit_update};
use libris::shared::{Role, UserProfile};

use super::form::{
    FormStatus, draft_field, file_field, form_actions, form_alert, load_item, save_create,
    save_update,
};
use super::list::use_lists;
use crate::auth::{AuthContext, use_auth};
use crate::web::route::AppRoute;

fn role_select(
    value: impl Fn() -> Option<Role> + Send + Sync + 'static,
    on_change: impl Fn(Option<Role>) + 'static,
) -> impl IntoView {
    let options = Role::ALL
        .iter()
        .map(|role| view! { <option value=role.as_str()>{role.label()}</option> })
        .collect_view();

    view! {
        <label class="form-control w-full">
            <div class="label">
                <span class="label-text">"Role"</span>
            </div>
            <select
                class="select select-bordered w-full"
                prop:value=move || value().map(|r| r.as_str()).unwrap_or_default()
                on:change=move |ev| on_change(Role::parse(&event_target_value(&ev)))
            >
                <option value="">"Select a role"</option>
                {options}
            </select>
        </label>
    }
}

#[component]
pub fn UserNewPage() -> impl IntoView {
    let users = use_lists().users;
    let status = FormStatus::new();
    let draft = RwSignal::new(MemberDraft::default());

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        save_create(status, users.list(), draft.get_untracked(), AppRoute::Users);
    };

    let on_id_photo = Callback::new(move |file| draft.update(|d| d.id_photo = file));
    let on_profile_photo = Callback::new(move |file| draft.update(|d| d.profile_photo = file));

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">"Add user"</h3>
                {form_alert(status)}
                <div class="grid grid-cols-1 md:grid-cols-2 gap-x-4">
                    {draft_field!(draft, "First name", "text", first_name)}
                    {draft_field!(draft, "Last name", "text", last_name)}
                    {draft_field!(draft, "Email", "email", email)}
                    {draft_field!(draft, "Birth date", "date", birth_date)}
                    {draft_field!(draft, "Password", "password", password)}
                    {draft_field!(draft, "Confirm password", "password", password_confirmation)}
                    {draft_field!(draft, "Address", "text", address)}
                    {role_select(
                        move || draft.with(|d| d.role),
                        move |role| draft.update(|d| d.role = role),
                    )}
                    {file_field("ID photo", "image/*", status, on_id_photo)}
                    {file_field("Profile photo", "image/*", status, on_profile_photo)}
                </div>
                {form_actions(status, AppRoute::Users)}
            </form>
        </div>
    }
}

/// 编辑的是当前登录用户时，同步会话中的资料
fn sync_own_profile(auth: AuthContext, id: u64, draft: &MemberEditDraft) {
    let session = auth.api().session().clone();
    let Some(user) = session.user().filter(|u| u.id == Some(id)) else {
        return;
    };
    session.update_user(UserProfile {
        first_name: Some(draft.first_name.trim().to_string()),
        last_name: Some(draft.last_name.trim().to_string()),
        email: Some(draft.email.trim().to_string()),
        ..user
    });
}

#[component]
pub fn UserEditPage(id: u64) -> impl IntoView {
    let auth = use_auth();
    let users = use_lists().users;
    let status = FormStatus::new();
    let draft = RwSignal::new(MemberEditDraft::default());

    load_item(status, users.list(), id, move |member| {
        draft.set(MemberEditDraft::from_member(&member));
    });

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let current = draft.get_untracked();
        let list = users.list();
        status.begin();
        spawn_local(async move {
            let result = submit_update(&list, id, &current).await;
            if let Ok(SubmitOutcome::Saved(())) = &result {
                sync_own_profile(auth, id, &current);
            }
            status.finish(result, AppRoute::Users);
        });
    };

    let on_profile_photo = Callback::new(move |file| draft.update(|d| d.profile_photo = file));

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">"Edit user"</h3>
                {form_alert(status)}
                <div class="grid grid-cols-1 md:grid-cols-2 gap-x-4">
                    {draft_field!(draft, "First name", "text", first_name)}
                    {draft_field!(draft, "Last name", "text", last_name)}
                    {draft_field!(draft, "Email", "email", email)}
                    {draft_field!(draft, "Birth date", "date", birth_date)}
                    {draft_field!(draft, "Address", "text", address)}
                    {file_field("Profile photo", "image/*", status, on_profile_photo)}
                </div>
                {form_actions(status, AppRoute::Users)}
            </form>
        </div>
    }
}

#[component]
pub fn RoleFormPage(id: u64) -> impl IntoView {
    let users = use_lists().users;
    let status = FormStatus::new();
    let draft = RwSignal::new(RoleDraft::default());
    let name = RwSignal::new(String::new());

    load_item(status, users.list(), id, move |member| {
        name.set(member.full_name());
        draft.set(RoleDraft::from_member(&member));
    });

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        save_update(status, users.list(), id, draft.get_untracked(), AppRoute::Users);
    };

    view! {
        <div class="card bg-base-100 shadow-xl max-w-lg">
            <form class="card-body" on:submit=on_submit>
                <h3 class="card-title">"Change role"</h3>
                <p class="text-base-content/70">{name}</p>
                {form_alert(status)}
                {role_select(
                    move || draft.with(|d| d.role),
                    move |role| draft.update(|d| d.role = role),
                )}
                {form_actions(status, AppRoute::Users)}
            </form>
        </div>
    }
}
