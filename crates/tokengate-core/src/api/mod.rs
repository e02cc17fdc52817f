//! REST client module for the auth backend.
//!
//! `AuthClient` signs users in and out against `/auth/login`,
//! `/auth/signup` and `/auth/me`, authenticating profile requests with a
//! bearer token held in its `SessionStore`.

pub mod client;
pub mod error;

pub use client::{AuthClient, SignupOutcome};
pub use error::ApiError;
