//! Session store
//!
//! 内存中的登录状态，token 同步写入 [`TokenStore`]。
//! 登录/退出/刷新用户等会修改状态的操作通过一把异步锁串行执行。

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::UserApi;
use crate::models::User;
use crate::storage::TokenStore;
use crate::transport::Transport;

const LOGIN_FAILED: &str = "登录失败，请检查网络连接";
const REGISTER_FAILED: &str = "注册失败，请检查网络连接";
const UPDATE_FAILED: &str = "更新失败，请检查网络连接";

/// Logged-in user and token. Both are set together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
}

impl Session {
    pub fn authenticated(user: User, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Result of login / register / profile update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
}

impl AuthOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

struct Inner {
    api: UserApi,
    tokens: Arc<dyn TokenStore>,
    state: RwLock<Session>,
    auth_lock: Mutex<()>,
}

/// Cheaply cloneable handle to the shared session
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(transport: Transport) -> Self {
        let tokens = Arc::clone(transport.tokens());
        Self {
            inner: Arc::new(Inner {
                api: UserApi::new(transport),
                tokens,
                state: RwLock::new(Session::default()),
                auth_lock: Mutex::new(()),
            }),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state.read().is_logged_in()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.read().token.clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        let _guard = self.inner.auth_lock.lock().await;

        let envelope = match self.inner.api.login(username, password).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Login request failed: {}", e);
                return AuthOutcome::failed(LOGIN_FAILED);
            }
        };

        if !envelope.is_success() {
            tracing::info!("Login rejected for {}: {}", username, envelope.message);
            return AuthOutcome::failed(envelope.message);
        }

        let message = envelope.message;
        let Some(data) = envelope.data else {
            tracing::warn!("Login succeeded without user/token payload");
            return AuthOutcome::failed(LOGIN_FAILED);
        };

        if let Err(e) = self.inner.tokens.save(&data.token).await {
            tracing::error!("Failed to persist token: {}", e);
        }
        tracing::info!("Logged in as {}", data.user.username);
        *self.inner.state.write() = Session::authenticated(data.user, data.token);

        AuthOutcome::ok(message)
    }

    /// Never changes the session, even on success.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> AuthOutcome {
        match self.inner.api.register(username, password, email).await {
            Ok(envelope) if envelope.is_success() => AuthOutcome::ok(envelope.message),
            Ok(envelope) => AuthOutcome::failed(envelope.message),
            Err(e) => {
                tracing::warn!("Register request failed: {}", e);
                AuthOutcome::failed(REGISTER_FAILED)
            }
        }
    }

    /// Refresh the user from the backend. Any failure logs the session out.
    pub async fn get_current_user(&self) -> Option<User> {
        let _guard = self.inner.auth_lock.lock().await;
        self.refresh_locked().await
    }

    pub async fn update_user(&self, username: &str, email: &str) -> AuthOutcome {
        let _guard = self.inner.auth_lock.lock().await;

        match self.inner.api.update(username, email).await {
            Ok(envelope) if envelope.is_success() => {
                self.refresh_locked().await;
                AuthOutcome::ok(envelope.message)
            }
            Ok(envelope) => AuthOutcome::failed(envelope.message),
            Err(e) => {
                tracing::warn!("Profile update failed: {}", e);
                AuthOutcome::failed(UPDATE_FAILED)
            }
        }
    }

    /// Best-effort backend notify, then unconditional local clear.
    pub async fn logout(&self) {
        let _guard = self.inner.auth_lock.lock().await;
        self.logout_locked().await;
    }

    /// Restore a persisted login in the background.
    ///
    /// 只有存储里有 token 时才会启动刷新任务；调用方可以选择等待返回的句柄。
    pub async fn init(&self) -> Option<JoinHandle<Option<User>>> {
        let token = match self.inner.tokens.load().await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored token: {}", e);
                None
            }
        };

        if token.is_none() {
            return None;
        }
        tracing::debug!("Found stored token, restoring session");
        let store = self.clone();
        Some(tokio::spawn(async move { store.get_current_user().await }))
    }

    async fn refresh_locked(&self) -> Option<User> {
        let token = match self.inner.tokens.load().await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                self.logout_locked().await;
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read stored token: {}", e);
                self.logout_locked().await;
                return None;
            }
        };

        match self.inner.api.current().await {
            Ok(envelope) if envelope.is_success() && envelope.data.is_some() => {
                let user = envelope.data?;
                *self.inner.state.write() = Session::authenticated(user.clone(), token);
                Some(user)
            }
            Ok(envelope) => {
                tracing::info!("Current user lookup rejected: {}", envelope.message);
                self.logout_locked().await;
                None
            }
            Err(e) => {
                tracing::warn!("Current user lookup failed: {}", e);
                self.logout_locked().await;
                None
            }
        }
    }

    async fn logout_locked(&self) {
        match self.inner.api.logout().await {
            Ok(envelope) if !envelope.is_success() => {
                tracing::warn!("Logout rejected by server: {}", envelope.message);
            }
            Ok(_) => {}
            Err(e) => tracing::error!("退出登录失败: {}", e),
        }

        *self.inner.state.write() = Session::default();
        if let Err(e) = self.inner.tokens.clear().await {
            tracing::error!("Failed to clear stored token: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: None,
            created_at: None,
        }
    }

    #[test]
    fn test_session_invariant() {
        let session = Session::default();
        assert!(!session.is_logged_in());
        assert!(session.user().is_none() && session.token().is_none());

        let session = Session::authenticated(alice(), "abc");
        assert!(session.is_logged_in());
        assert_eq!(session.token(), Some("abc"));
    }
}
