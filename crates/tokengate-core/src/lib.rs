//! tokengate core library.
//!
//! Client-side authentication for apps backed by a REST auth service:
//!
//! - `api`: `AuthClient` for login, signup, profile fetch and logout
//! - `auth`: `SessionStore` and the `TokenStorage` backends it persists to
//! - `guard`: `RouteGuard` for protected navigation
//! - `config`: `AuthConfig`, passed explicitly to the above
//! - `models`: `User`, `SessionSnapshot` and the endpoint wire types

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;

pub use api::{ApiError, AuthClient, SignupOutcome};
pub use auth::{FileStorage, KeyringStorage, MemoryStorage, SessionStore, TokenStorage};
pub use config::AuthConfig;
pub use guard::{GuardDecision, RenderContext, RouteGuard};
pub use models::{SessionSnapshot, User};
