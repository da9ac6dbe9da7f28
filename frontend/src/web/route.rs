//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由、路径解析以及认证/角色守卫规则。

use std::fmt::Display;

use libris::shared::Role;

const STAFF: &[Role] = &[Role::Admin, Role::Librarian];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    // --- 公开页面 ---
    #[default]
    Home,
    Catalog,
    BookDetail(u64),
    News,
    NewsDetail(u64),
    Login,

    // --- 管理后台 (需要认证) ---
    Dashboard,
    Books,
    BookNew,
    BookEdit(u64),
    Import,
    AdminNews,
    NewsNew,
    NewsEdit(u64),
    Users,
    UserNew,
    UserEdit(u64),
    UserRole(u64),

    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let id = |raw: &str| raw.parse::<u64>().ok();

        match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["catalog"] => Self::Catalog,
            ["catalog", raw] => id(raw).map_or(Self::NotFound, Self::BookDetail),
            ["news"] => Self::News,
            ["news", raw] => id(raw).map_or(Self::NotFound, Self::NewsDetail),

            ["admin"] => Self::Dashboard,
            ["admin", "books"] => Self::Books,
            ["admin", "books", "new"] => Self::BookNew,
            ["admin", "books", "import"] => Self::Import,
            ["admin", "books", raw, "edit"] => id(raw).map_or(Self::NotFound, Self::BookEdit),
            ["admin", "news"] => Self::AdminNews,
            ["admin", "news", "new"] => Self::NewsNew,
            ["admin", "news", raw, "edit"] => id(raw).map_or(Self::NotFound, Self::NewsEdit),
            ["admin", "users"] => Self::Users,
            ["admin", "users", "new"] => Self::UserNew,
            ["admin", "users", raw, "edit"] => id(raw).map_or(Self::NotFound, Self::UserEdit),
            ["admin", "users", raw, "role"] => id(raw).map_or(Self::NotFound, Self::UserRole),
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Catalog => "/catalog".to_string(),
            Self::BookDetail(id) => format!("/catalog/{}", id),
            Self::News => "/news".to_string(),
            Self::NewsDetail(id) => format!("/news/{}", id),
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/admin".to_string(),
            Self::Books => "/admin/books".to_string(),
            Self::BookNew => "/admin/books/new".to_string(),
            Self::BookEdit(id) => format!("/admin/books/{}/edit", id),
            Self::Import => "/admin/books/import".to_string(),
            Self::AdminNews => "/admin/news".to_string(),
            Self::NewsNew => "/admin/news/new".to_string(),
            Self::NewsEdit(id) => format!("/admin/news/{}/edit", id),
            Self::Users => "/admin/users".to_string(),
            Self::UserNew => "/admin/users/new".to_string(),
            Self::UserEdit(id) => format!("/admin/users/{}/edit", id),
            Self::UserRole(id) => format!("/admin/users/{}/role", id),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        self.allowed_roles().is_some()
    }

    /// 允许访问的角色；`None` 表示公开页面
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Self::Home
            | Self::Catalog
            | Self::BookDetail(_)
            | Self::News
            | Self::NewsDetail(_)
            | Self::Login
            | Self::NotFound => None,
            Self::Users | Self::UserNew | Self::UserEdit(_) | Self::UserRole(_) => Some(ADMIN_ONLY),
            Self::Dashboard
            | Self::Books
            | Self::BookNew
            | Self::BookEdit(_)
            | Self::Import
            | Self::AdminNews
            | Self::NewsNew
            | Self::NewsEdit(_) => Some(STAFF),
        }
    }

    pub fn allows(&self, role: Option<Role>) -> bool {
        match self.allowed_roles() {
            None => true,
            Some(roles) => role.is_some_and(|r| roles.contains(&r)),
        }
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 登录后（或角色不足时）的落脚页：后台人员进入面板，普通读者回到首页
    pub fn auth_success_redirect(role: Option<Role>) -> Self {
        if Self::Dashboard.allows(role) {
            Self::Dashboard
        } else {
            Self::Home
        }
    }

    /// 守卫：返回 `Ok(目标路由)` 或 `Err(重定向路由)`
    pub fn resolve(self, is_authenticated: bool, role: Option<Role>) -> Result<Self, Self> {
        if self.requires_auth() && !is_authenticated {
            return Err(Self::auth_failure_redirect());
        }
        if self.should_redirect_when_authenticated() && is_authenticated {
            return Err(Self::auth_success_redirect(role));
        }
        if !self.allows(role) {
            return Err(Self::auth_success_redirect(role));
        }
        Ok(self)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in [
            AppRoute::Home,
            AppRoute::BookDetail(7),
            AppRoute::Import,
            AppRoute::NewsEdit(3),
            AppRoute::UserRole(12),
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
        assert_eq!(AppRoute::from_path("/admin/books/abc/edit"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/admin/"), AppRoute::Dashboard);
    }

    #[test]
    fn anonymous_users_are_sent_to_login() {
        assert_eq!(AppRoute::Books.resolve(false, None), Err(AppRoute::Login));
        assert_eq!(AppRoute::Catalog.resolve(false, None), Ok(AppRoute::Catalog));
    }

    #[test]
    fn role_guard_uses_session_role() {
        assert_eq!(
            AppRoute::Users.resolve(true, Some(Role::Librarian)),
            Err(AppRoute::Dashboard)
        );
        assert_eq!(AppRoute::Users.resolve(true, Some(Role::Admin)), Ok(AppRoute::Users));
        assert_eq!(AppRoute::Books.resolve(true, Some(Role::User)), Err(AppRoute::Home));
        assert_eq!(AppRoute::Login.resolve(true, Some(Role::Librarian)), Err(AppRoute::Dashboard));
    }
}
