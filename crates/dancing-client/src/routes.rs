//! Route table
//!
//! 静态路由表：路径、名称、视图以及 `requiresAuth` 元数据。
//! 解析按声明顺序第一个匹配生效，`:param` 段会被捕获。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::navigator::{redirect_to_login, Navigator};
use crate::session::Session;

/// View rendered for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Register,
    Profile,
    VideoList,
    VideoUpload,
    MyVideos,
    VideoDetail,
    FriendManage,
    FriendSearch,
    PostList,
    PostCreate,
    MyPosts,
    PostDetail,
    VideoCall,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    pub requires_auth: bool,
}

const fn route(
    path: &'static str,
    name: &'static str,
    view: View,
    requires_auth: bool,
) -> RouteEntry {
    RouteEntry {
        path,
        name,
        view,
        requires_auth,
    }
}

/// 声明顺序即匹配顺序（`/videos/upload` 必须在 `/videos/:id` 之前）
pub const ROUTES: &[RouteEntry] = &[
    route("/", "home", View::Home, false),
    route("/login", "login", View::Login, false),
    route("/register", "register", View::Register, false),
    route("/profile", "profile", View::Profile, true),
    route("/videos", "videos", View::VideoList, false),
    route("/videos/upload", "videoUpload", View::VideoUpload, true),
    route("/videos/my", "myVideos", View::MyVideos, true),
    route("/videos/:id", "videoDetail", View::VideoDetail, false),
    route("/friends", "friends", View::FriendManage, true),
    route("/friends/search", "friendSearch", View::FriendSearch, true),
    route("/posts", "posts", View::PostList, false),
    route("/posts/create", "postCreate", View::PostCreate, true),
    route("/posts/my", "myPosts", View::MyPosts, true),
    route("/posts/:id", "postDetail", View::PostDetail, false),
    route("/video-call", "videoCall", View::VideoCall, true),
];

/// A resolved route with its captured parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub entry: &'static RouteEntry,
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Look a path up in [`ROUTES`]. Query string and fragment are ignored.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments = split_segments(path);

    ROUTES.iter().find_map(|entry| {
        match_pattern(entry.path, &segments).map(|params| RouteMatch { entry, params })
    })
}

pub fn find_by_name(name: &str) -> Option<&'static RouteEntry> {
    ROUTES.iter().find(|entry| entry.name == name)
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, segments: &[&str]) -> Option<HashMap<String, String>> {
    let parts = split_segments(pattern);
    if parts.len() != segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (part, segment) in parts.iter().zip(segments) {
        if let Some(name) = part.strip_prefix(':') {
            params.insert(name.to_string(), (*segment).to_string());
        } else if part != segment {
            return None;
        }
    }
    Some(params)
}

/// 导航守卫策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardPolicy {
    /// 放行所有导航，不检查 `requiresAuth`
    #[default]
    Bypass,
    /// 未登录进入 `requiresAuth` 路由时跳转登录页
    Enforce,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NavigationError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Route {0} requires login")]
    LoginRequired(String),
}

/// Navigates through a [`Navigator`] using the static table.
pub struct Router {
    navigator: Arc<dyn Navigator>,
    policy: GuardPolicy,
}

impl Router {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            policy: GuardPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: GuardPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    pub fn current(&self) -> Option<RouteMatch> {
        resolve(&self.navigator.current_path())
    }

    /// Navigate to `path`. Under [`GuardPolicy::Enforce`] a protected route
    /// without a session redirects to login and fails with `LoginRequired`.
    pub fn push(&self, path: &str, session: &Session) -> Result<RouteMatch, NavigationError> {
        let matched = resolve(path).ok_or_else(|| NavigationError::NotFound(path.to_string()))?;

        if self.policy == GuardPolicy::Enforce
            && matched.entry.requires_auth
            && !session.is_logged_in()
        {
            tracing::warn!("Blocked navigation to {} without a session", path);
            redirect_to_login(self.navigator.as_ref());
            return Err(NavigationError::LoginRequired(path.to_string()));
        }

        tracing::debug!("Navigating to {} ({})", path, matched.entry.name);
        self.navigator.navigate(path);
        Ok(matched)
    }
}
