//! Current-location abstraction used for login redirects

use parking_lot::RwLock;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Where the user currently is, and a way to move them.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);
}

/// Navigator that only remembers where it has been
#[derive(Debug)]
pub struct MemoryNavigator {
    history: RwLock<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::starting_at(HOME_PATH)
    }

    pub fn starting_at(path: impl Into<String>) -> Self {
        Self {
            history: RwLock::new(vec![path.into()]),
        }
    }

    /// Visited paths, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }

    /// Number of navigations after the starting location
    pub fn redirect_count(&self) -> usize {
        self.history.read().len().saturating_sub(1)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .read()
            .last()
            .cloned()
            .unwrap_or_else(|| HOME_PATH.to_string())
    }

    fn navigate(&self, path: &str) {
        self.history.write().push(path.to_string());
    }
}

/// Send the user to the login view unless they are already on login/register.
///
/// Returns true when a redirect happened.
pub fn redirect_to_login(navigator: &dyn Navigator) -> bool {
    let current = navigator.current_path();
    let path = current.split(['?', '#']).next().unwrap_or_default();

    if path == LOGIN_PATH || path == REGISTER_PATH {
        tracing::debug!("Already on {}, skipping login redirect", path);
        return false;
    }

    tracing::info!("Redirecting from {} to {}", current, LOGIN_PATH);
    navigator.navigate(LOGIN_PATH);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_from_protected_view() {
        let nav = MemoryNavigator::starting_at("/videos/upload");
        assert!(redirect_to_login(&nav));
        assert_eq!(nav.current_path(), LOGIN_PATH);
        assert_eq!(nav.redirect_count(), 1);
    }

    #[test]
    fn test_no_redirect_on_login_or_register() {
        let nav = MemoryNavigator::starting_at(LOGIN_PATH);
        assert!(!redirect_to_login(&nav));

        let nav = MemoryNavigator::starting_at("/register?from=home");
        assert!(!redirect_to_login(&nav));
        assert_eq!(nav.redirect_count(), 0);
    }
}
