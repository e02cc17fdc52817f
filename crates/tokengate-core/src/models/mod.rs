//! Data models shared between the auth client and its callers.
//!
//! - `User`: profile returned by login/signup and `/auth/me`
//! - `SessionSnapshot`: serializable view of the current session
//! - Wire types for the auth endpoints

pub mod auth;
pub mod user;

pub use auth::{AuthResponse, Credentials, SessionPayload};
pub use user::{SessionSnapshot, User};
