use serde::{Deserialize, Serialize};

use super::User;

/// Request body for `/auth/login` and `/auth/signup`
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    pub access_token: String,
}

/// Success body of login and signup. Signup omits `session` and sets
/// `message` while the account is waiting on email confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    #[serde(default)]
    pub session: Option<SessionPayload>,
    #[serde(default)]
    pub message: Option<String>,
}
