use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::forms::{LoginDraft, SubmitOutcome};

use crate::auth::{login, use_auth};
use crate::components::form::text_field;
use crate::web::route::AppRoute;
use crate::web::router::Link;

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let notice = auth.notice;

    let draft = RwSignal::new(LoginDraft::default());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    // 登录成功后的跳转由路由守卫根据角色完成
    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        set_is_submitting.set(true);
        set_error_msg.set(None);

        let current = draft.get_untracked();
        spawn_local(async move {
            match login(auth, current).await {
                Ok(SubmitOutcome::Saved(_)) => {}
                Ok(SubmitOutcome::Invalid(invalid)) => set_error_msg.set(Some(invalid.message)),
                Err(e) => set_error_msg.set(Some(e.message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Libris"</h1>
                    <p class="text-base-content/70">"Sign in to manage the library"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || notice.get().is_some()>
                            <div role="alert" class="alert alert-warning text-sm py-2">
                                <span>{move || notice.get().unwrap_or_default()}</span>
                            </div>
                        </Show>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        {text_field(
                            "Email",
                            "email",
                            move || draft.with(|d| d.email.clone()),
                            move |v| draft.update(|d| d.email = v),
                        )}
                        {text_field(
                            "Password",
                            "password",
                            move || draft.with(|d| d.password.clone()),
                            move |v| draft.update(|d| d.password = v),
                        )}

                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    "Sign in".into_any()
                                }}
                            </button>
                        </div>
                        <Link to=AppRoute::Home class="link link-hover text-sm text-center mt-2">
                            "Back to the catalog"
                        </Link>
                    </form>
                </div>
            </div>
        </div>
    }
}
