//! Client for the backend's `/auth` endpoints.
//!
//! `AuthClient` owns the session store: login and signup populate it,
//! `fetch_user` refreshes the profile (or drops a session the server no
//! longer accepts), and `logout` clears it locally.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::{SessionStore, TokenStorage};
use crate::config::AuthConfig;
use crate::models::{AuthResponse, Credentials, SessionSnapshot, User};

use super::ApiError;

const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";
const ME_PATH: &str = "/auth/me";

/// Result of a successful signup call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The backend issued a session right away; the client is signed in.
    SignedIn(User),
    /// The account exists but needs email confirmation before a session is
    /// issued. The client stays signed out.
    ConfirmationRequired { user: User, message: Option<String> },
}

/// Auth API client.
/// Clone is cheap - clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    config: Arc<AuthConfig>,
    session: Arc<Mutex<SessionStore>>,
}

impl AuthClient {
    /// Create a client for the configured backend. The session is loaded
    /// from `storage`; pass `None` where no persistent storage exists.
    pub fn new(config: AuthConfig, storage: Option<Arc<dyn TokenStorage>>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let session = SessionStore::new(storage, config.storage_key.clone());

        Ok(Self {
            client,
            config: Arc::new(config),
            session: Arc::new(Mutex::new(session)),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn session(&self) -> MutexGuard<'_, SessionStore> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Session Accessors =====

    pub fn token(&self) -> Option<String> {
        self.session().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<User> {
        self.session().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session().snapshot()
    }

    /// Whether the session is backed by persistent storage
    pub fn has_storage(&self) -> bool {
        self.session().has_storage()
    }

    /// Adopt a token obtained elsewhere. The profile is left untouched until
    /// the next `fetch_user`.
    pub fn set_token(&self, token: impl Into<String>) {
        self.session().set_token(token.into());
    }

    // ===== Auth Operations =====

    /// Sign in with email and password. On rejection the error message is
    /// the server's `detail` and the session is unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let auth = self.authenticate(LOGIN_PATH, email, password).await?;
        let session = auth
            .session
            .ok_or_else(|| ApiError::InvalidResponse("login response carried no session".to_string()))?;
        let token = Self::non_empty_token(session.access_token)?;

        info!(user_id = %auth.user.id, "Login successful");
        self.session().set_session(token, auth.user.clone());
        Ok(auth.user)
    }

    /// Register a new account. Same contract as `login`, except that an
    /// account awaiting email confirmation is reported instead of signed in.
    pub async fn signup(&self, email: &str, password: &str) -> Result<SignupOutcome> {
        let auth = self.authenticate(SIGNUP_PATH, email, password).await?;

        match auth.session {
            Some(session) => {
                let token = Self::non_empty_token(session.access_token)?;
                info!(user_id = %auth.user.id, "Signup successful");
                self.session().set_session(token, auth.user.clone());
                Ok(SignupOutcome::SignedIn(auth.user))
            }
            None => {
                info!(user_id = %auth.user.id, "Signup pending email confirmation");
                Ok(SignupOutcome::ConfirmationRequired {
                    user: auth.user,
                    message: auth.message,
                })
            }
        }
    }

    /// Refresh the user profile for the current token.
    ///
    /// Does nothing without a token. A non-success response means the
    /// server no longer accepts the token, so the session is cleared and
    /// `Ok(())` returned. Results are dropped if the session changed while
    /// the request was in flight. Only transport and decode failures are
    /// returned as errors.
    pub async fn fetch_user(&self) -> Result<()> {
        let (token, generation) = {
            let session = self.session();
            match session.token() {
                Some(token) => (token.to_string(), session.generation()),
                None => {
                    debug!("No token, skipping profile fetch");
                    return Ok(());
                }
            }
        };

        let response = self
            .client
            .get(self.config.endpoint(ME_PATH))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        if !response.status().is_success() {
            let status = response.status();
            let mut session = self.session();
            if session.generation() != generation {
                debug!(%status, "Session changed during profile fetch, ignoring rejection");
                return Ok(());
            }
            warn!(%status, "Profile fetch rejected, clearing session");
            session.clear_session();
            return Ok(());
        }

        let user: User = Self::parse_json(response).await?;

        let mut session = self.session();
        if session.generation() != generation {
            debug!("Session changed during profile fetch, ignoring profile");
            return Ok(());
        }
        debug!(user_id = %user.id, "Profile refreshed");
        session.set_user(user);
        Ok(())
    }

    /// Sign out locally. No request is made to the backend.
    pub fn logout(&self) {
        self.session().clear_session();
        info!("Logged out");
    }

    // ===== HTTP Helpers =====

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let url = self.config.endpoint(path);
        debug!(url = %url, "Sending credentials");

        let response = self
            .client
            .post(&url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    fn non_empty_token(token: String) -> Result<String> {
        if token.is_empty() {
            return Err(ApiError::InvalidResponse("session carried an empty access token".to_string()).into());
        }
        Ok(token)
    }

    /// Check if response is successful, returning an error built from the
    /// body's `detail` if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %ApiError::truncate_body(&body), "Request rejected");
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await.map_err(ApiError::NetworkError)?;
        serde_json::from_str(&body).map_err(|e| {
            anyhow::Error::from(ApiError::InvalidResponse(format!(
                "{}: {}",
                e,
                ApiError::truncate_body(&body)
            )))
        })
    }
}
