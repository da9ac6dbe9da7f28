//! 认证模块
//!
//! 管理会话状态，与路由系统解耦。
//! 核心层的 `SessionStore` 是唯一数据源，这里只把它的快照同步到 Leptos 信号，
//! 路由服务通过注入的认证/角色信号执行守卫。

use std::sync::Arc;

use leptos::prelude::*;
use libris::api::SESSION_EXPIRED_MESSAGE;
use libris::forms::{LoginDraft, SubmitOutcome, submit_login};
use libris::shared::{Role, UserProfile};
use libris::{ApiClient, ApiResult, ClientConfig, SessionState, SessionStore};
use tracing::warn;

use crate::web::{FetchHttpClient, LocalStorage};

/// 浏览器环境下的 API 客户端
pub type AppApi = ApiClient<FetchHttpClient, LocalStorage>;

/// 认证上下文
///
/// 通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    api: StoredValue<Arc<AppApi>>,
    /// 会话快照（只读）
    pub session: ReadSignal<SessionState>,
    /// 会话过期等提示，由登录页展示
    pub notice: RwSignal<Option<String>>,
}

impl AuthContext {
    /// 从 LocalStorage 恢复会话并创建 API 客户端
    pub fn new(config: ClientConfig) -> Self {
        let store = Arc::new(SessionStore::restore(LocalStorage, &config));
        let (session, set_session) = signal(store.snapshot());
        store.subscribe(move |state| set_session.set(state.clone()));

        let notice = RwSignal::new(None);
        let api = ApiClient::new(FetchHttpClient, store, config);
        api.set_on_unauthorized(move || {
            warn!("request rejected as unauthenticated, returning to sign in");
            notice.set(Some(SESSION_EXPIRED_MESSAGE.to_string()));
        });

        Self {
            api: StoredValue::new(Arc::new(api)),
            session,
            notice,
        }
    }

    pub fn api(&self) -> Arc<AppApi> {
        self.api.get_value()
    }

    /// 获取认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(SessionState::is_authenticated))
    }

    /// 获取角色信号（用于路由服务注入）
    pub fn role_signal(&self) -> Signal<Option<Role>> {
        let session = self.session;
        Signal::derive(move || session.with(SessionState::role))
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.with(|s| s.user.clone())
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 登录
///
/// 成功后的跳转由路由服务监听认证状态自动完成。
pub async fn login(ctx: AuthContext, draft: LoginDraft) -> ApiResult<SubmitOutcome<UserProfile>> {
    ctx.notice.set(None);
    let api = ctx.api();
    submit_login(&api, &draft).await
}

/// 注销并清除状态
///
/// 不需要手动导航，路由服务会监听认证状态变化并自动重定向。
pub async fn logout(ctx: AuthContext) {
    ctx.api().logout().await;
}
