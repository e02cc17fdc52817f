//! Session state and token persistence.
//!
//! This module provides:
//! - `SessionStore`: current token and user profile, mirrored to storage
//! - `TokenStorage`: key-value persistence seam for the token
//! - `MemoryStorage`, `FileStorage`, `KeyringStorage`: storage backends
//!
//! A store created without storage behaves as if nothing was ever saved.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, StoredEntry, TokenStorage};
