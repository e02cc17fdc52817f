//! Pre-navigation check for routes that need a signed-in user.
//!
//! The guard only looks for a persisted token; it never asks the backend
//! whether that token is still good. `AuthClient::fetch_user` is where an
//! expired token gets noticed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenStorage;
use crate::config::AuthConfig;

/// Where the navigation is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// Server-side rendering. No token storage exists here.
    Server,
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "action", content = "to", rename_all = "lowercase")]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

impl GuardDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardDecision::Proceed)
    }
}

pub struct RouteGuard {
    storage: Option<Arc<dyn TokenStorage>>,
    key: String,
    login_route: String,
    protected_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(config: &AuthConfig, storage: Option<Arc<dyn TokenStorage>>) -> Self {
        Self {
            storage,
            key: config.storage_key.clone(),
            login_route: config.login_route.clone(),
            protected_prefixes: config.protected_prefixes.clone(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Whether `path` falls under one of the protected prefixes.
    /// Prefixes match whole segments: `/projects` covers `/projects/7`
    /// but not `/projectsx`.
    pub fn requires_auth(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.protected_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            prefix.is_empty()
                || path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Check a navigation to a protected route.
    pub fn check(&self, context: RenderContext, target: &str) -> GuardDecision {
        // Storage doesn't exist during server rendering; don't touch it
        if context == RenderContext::Server {
            return GuardDecision::Proceed;
        }

        if strip_query(target) == self.login_route {
            return GuardDecision::Proceed;
        }

        if self.has_stored_token() {
            GuardDecision::Proceed
        } else {
            debug!(target = %target, "No stored token, redirecting to login");
            GuardDecision::Redirect(self.login_route.clone())
        }
    }

    /// Run `check` for protected paths; everything else proceeds.
    pub fn guard(&self, context: RenderContext, target: &str) -> GuardDecision {
        if self.requires_auth(target) {
            self.check(context, target)
        } else {
            GuardDecision::Proceed
        }
    }

    fn has_stored_token(&self) -> bool {
        let Some(ref storage) = self.storage else {
            return false;
        };
        match storage.get(&self.key) {
            Ok(token) => token.is_some_and(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                false
            }
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;

    /// Storage that fails the test if it is ever read
    struct UntouchableStorage;

    impl TokenStorage for UntouchableStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            panic!("storage read during server render");
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            panic!("storage write during server render");
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            panic!("storage write during server render");
        }
    }

    fn config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.protected_prefixes = vec!["/projects".to_string(), "/settings/".to_string()];
        config
    }

    fn guard_with(storage: MemoryStorage) -> RouteGuard {
        RouteGuard::new(&config(), Some(Arc::new(storage)))
    }

    #[test]
    fn test_server_context_skips_storage() {
        let guard = RouteGuard::new(&config(), Some(Arc::new(UntouchableStorage)));
        assert_eq!(guard.check(RenderContext::Server, "/projects"), GuardDecision::Proceed);
    }

    #[test]
    fn test_no_token_redirects_to_login() {
        let guard = guard_with(MemoryStorage::new());
        assert_eq!(
            guard.check(RenderContext::Client, "/projects"),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_stored_token_proceeds() {
        let storage = MemoryStorage::new();
        storage.set("auth_token", "anything").unwrap();
        let guard = guard_with(storage);
        assert!(guard.check(RenderContext::Client, "/projects").is_proceed());
    }

    #[test]
    fn test_empty_stored_token_redirects() {
        let storage = MemoryStorage::new();
        storage.set("auth_token", "").unwrap();
        let guard = guard_with(storage);
        assert_eq!(
            guard.check(RenderContext::Client, "/projects"),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_guard_reads_storage_on_every_check() {
        let storage = MemoryStorage::new();
        let guard = guard_with(storage.clone());
        assert!(!guard.check(RenderContext::Client, "/projects").is_proceed());

        storage.set("auth_token", "token-abc").unwrap();
        assert!(guard.check(RenderContext::Client, "/projects").is_proceed());

        storage.remove("auth_token").unwrap();
        assert!(!guard.check(RenderContext::Client, "/projects").is_proceed());
    }

    #[test]
    fn test_missing_storage_redirects() {
        let guard = RouteGuard::new(&config(), None);
        assert_eq!(
            guard.check(RenderContext::Client, "/projects"),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_login_route_never_redirects() {
        let guard = guard_with(MemoryStorage::new());
        assert!(guard.check(RenderContext::Client, "/login").is_proceed());
        assert!(guard.check(RenderContext::Client, "/login?next=/projects").is_proceed());
    }

    #[test]
    fn test_requires_auth_matches_segments() {
        let guard = guard_with(MemoryStorage::new());
        assert!(guard.requires_auth("/projects"));
        assert!(guard.requires_auth("/projects/7/edit"));
        assert!(guard.requires_auth("/projects?tab=all"));
        assert!(guard.requires_auth("/settings"));
        assert!(guard.requires_auth("/settings/profile"));

        assert!(!guard.requires_auth("/projectsx"));
        assert!(!guard.requires_auth("/"));
        assert!(!guard.requires_auth("/login"));
    }

    #[test]
    fn test_guard_only_checks_protected_paths() {
        let guard = guard_with(MemoryStorage::new());
        assert!(guard.guard(RenderContext::Client, "/about").is_proceed());
        assert_eq!(
            guard.guard(RenderContext::Client, "/projects/1"),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(GuardDecision::Redirect("/login".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"action": "redirect", "to": "/login"}));
        let json = serde_json::to_value(GuardDecision::Proceed).unwrap();
        assert_eq!(json, serde_json::json!({"action": "proceed"}));
    }
}
