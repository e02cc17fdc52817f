//! Command handlers.
//!
//! `App` wires one `AuthClient` and one `RouteGuard` to the same token
//! storage so the guard sees whatever the client persisted.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use tokengate_core::{
    AuthClient, AuthConfig, FileStorage, GuardDecision, KeyringStorage, RenderContext, RouteGuard,
    SignupOutcome, TokenStorage,
};

use crate::StorageKind;

/// Environment variable supplying the password for non-interactive use
const PASSWORD_ENV: &str = "TOKENGATE_PASSWORD";

pub struct App {
    client: AuthClient,
    guard: RouteGuard,
    file_storage: Option<Arc<FileStorage>>,
}

impl App {
    pub fn new(config_path: Option<&Path>, api_base: Option<String>, storage: StorageKind) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => AuthConfig::load_from(path)?,
            None => AuthConfig::load().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load config, using defaults");
                AuthConfig::default()
            }),
        };
        if let Some(base) = api_base {
            config.set_api_base(base);
        }
        debug!(api_base = %config.api_base, ?storage, "Config resolved");

        let mut file_storage = None;
        let storage: Option<Arc<dyn TokenStorage>> = match storage {
            StorageKind::File => {
                let file = Arc::new(FileStorage::new(AuthConfig::data_dir()?));
                file_storage = Some(file.clone());
                Some(file as Arc<dyn TokenStorage>)
            }
            StorageKind::Keyring => Some(Arc::new(KeyringStorage::default())),
            StorageKind::None => None,
        };

        let guard = RouteGuard::new(&config, storage.clone());
        let client = AuthClient::new(config, storage)?;

        Ok(Self {
            client,
            guard,
            file_storage,
        })
    }

    pub async fn login(&self, email: Option<String>) -> Result<()> {
        let email = Self::resolve_email(email)?;
        let password = Self::resolve_password()?;

        let user = self.client.login(&email, &password).await?;
        println!("Signed in as {} ({})", user.email, user.id);
        Ok(())
    }

    pub async fn signup(&self, email: Option<String>) -> Result<()> {
        let email = Self::resolve_email(email)?;
        let password = Self::resolve_password()?;

        match self.client.signup(&email, &password).await? {
            SignupOutcome::SignedIn(user) => {
                println!("Account created, signed in as {} ({})", user.email, user.id);
            }
            SignupOutcome::ConfirmationRequired { user, message } => {
                println!("Account created for {}", user.email);
                if let Some(message) = message {
                    println!("{}", message);
                }
            }
        }
        Ok(())
    }

    pub fn logout(&self) {
        self.client.logout();
        println!("Signed out");
    }

    pub async fn whoami(&self) -> Result<()> {
        if !self.client.is_authenticated() {
            anyhow::bail!("Not signed in");
        }

        self.client.fetch_user().await?;

        match self.client.user() {
            Some(user) => {
                println!("{}", serde_json::to_string_pretty(&user)?);
                Ok(())
            }
            None => anyhow::bail!("Session is no longer valid, signed out"),
        }
    }

    pub fn status(&self) -> Result<()> {
        let snapshot = self.client.snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);

        if !self.client.has_storage() {
            println!("No token storage; the session ends with this process");
        }
        println!("Login route: {}", self.guard.login_route());

        if let Some(ref file) = self.file_storage {
            if let Some(entry) = file.entry(&self.client.config().storage_key)? {
                println!("Token stored at {}", entry.updated_at.to_rfc3339());
            }
        }
        Ok(())
    }

    pub fn guard(&self, path: &str, server: bool, protected: bool) -> Result<()> {
        let decision = self.guard_decision(path, server, protected);
        println!("{}", serde_json::to_string(&decision)?);
        Ok(())
    }

    fn guard_decision(&self, path: &str, server: bool, protected: bool) -> GuardDecision {
        let context = if server {
            RenderContext::Server
        } else {
            RenderContext::Client
        };
        if protected {
            return self.guard.check(context, path);
        }
        if !self.guard.requires_auth(path) {
            debug!(path = %path, "Path not under protected_prefixes, allowing");
        }
        self.guard.guard(context, path)
    }

    pub fn print_config(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self.client.config())?);
        Ok(())
    }

    fn resolve_email(email: Option<String>) -> Result<String> {
        let email = match email {
            Some(email) => email,
            None => Self::prompt_email()?,
        };
        if email.is_empty() {
            anyhow::bail!("Email required");
        }
        Ok(email)
    }

    fn resolve_password() -> Result<String> {
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) => password,
            Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
        };
        if password.is_empty() {
            anyhow::bail!("Password required");
        }
        Ok(password)
    }

    fn prompt_email() -> Result<String> {
        print!("Email: ");
        io::stdout().flush()?;

        let mut email = String::new();
        io::stdin().read_line(&mut email)?;
        Ok(email.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_without_storage(config: &AuthConfig) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        config.save_to(&path).unwrap();
        let app = App::new(Some(&path), None, StorageKind::None).unwrap();
        (app, dir)
    }

    #[test]
    fn test_api_base_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        AuthConfig::with_api_base("http://from-file:8000").save_to(&path).unwrap();

        let app = App::new(Some(&path), Some("http://from-flag:9000/".to_string()), StorageKind::None).unwrap();
        assert_eq!(app.client.config().api_base, "http://from-flag:9000");
    }

    #[test]
    fn test_no_storage_guard_redirects() {
        let mut config = AuthConfig::default();
        config.protected_prefixes = vec!["/projects".to_string()];
        let (app, _dir) = app_without_storage(&config);

        assert!(!app.client.is_authenticated());
        assert_eq!(
            app.guard.guard(RenderContext::Client, "/projects"),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(app.guard.guard(RenderContext::Server, "/projects"), GuardDecision::Proceed);
    }

    #[test]
    fn test_protected_flag_checks_unconfigured_path() {
        // Default config has no protected prefixes
        let (app, _dir) = app_without_storage(&AuthConfig::default());
        assert!(!app.client.has_storage());

        assert_eq!(app.guard_decision("/projects", false, false), GuardDecision::Proceed);
        assert_eq!(
            app.guard_decision("/projects", false, true),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(app.guard_decision("/projects", true, true), GuardDecision::Proceed);
    }
}
