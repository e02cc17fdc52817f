use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{SessionSnapshot, User};

use super::TokenStorage;

/// In-memory authentication state, with the token mirrored to storage.
///
/// Every mutation bumps `generation`, so async work that started against
/// one session can tell whether that session is still current when it
/// finishes.
pub struct SessionStore {
    storage: Option<Arc<dyn TokenStorage>>,
    key: String,
    token: Option<String>,
    user: Option<User>,
    generation: u64,
}

impl SessionStore {
    /// Create a store and load any persisted token. Without storage, or if
    /// reading it fails, the session starts signed out.
    pub fn new(storage: Option<Arc<dyn TokenStorage>>, key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            key: key.into(),
            token: None,
            user: None,
            generation: 0,
        };
        store.initialize();
        store
    }

    /// Re-read the token from storage
    pub fn initialize(&mut self) {
        self.token = match self.storage {
            Some(ref storage) => match storage.get(&self.key) {
                Ok(token) => token.filter(|t| !t.is_empty()),
                Err(e) => {
                    warn!(error = %e, "Failed to read stored token, starting signed out");
                    None
                }
            },
            None => {
                debug!("No token storage available, starting signed out");
                None
            }
        };
        debug!(has_token = self.token.is_some(), "Session initialized");
    }

    /// Start a session. An empty token is not a session and is ignored.
    pub fn set_session(&mut self, token: String, user: User) {
        if token.is_empty() {
            warn!("Refusing to store an empty token");
            return;
        }
        self.persist(&token);
        self.token = Some(token);
        self.user = Some(user);
        self.generation += 1;
    }

    /// Set the token alone, keeping whatever profile is loaded
    pub fn set_token(&mut self, token: String) {
        if token.is_empty() {
            warn!("Refusing to store an empty token");
            return;
        }
        self.persist(&token);
        self.token = Some(token);
        self.generation += 1;
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn clear_session(&mut self) {
        self.token = None;
        self.user = None;
        self.generation += 1;
        if let Some(ref storage) = self.storage {
            if let Err(e) = storage.remove(&self.key) {
                warn!(error = %e, "Failed to remove stored token");
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            user: self.user.clone(),
            is_authenticated: self.is_authenticated(),
        }
    }

    fn persist(&self, token: &str) {
        if let Some(ref storage) = self.storage {
            if let Err(e) = storage.set(&self.key, token) {
                warn!(error = %e, "Failed to persist token");
            }
        }
    }
}
