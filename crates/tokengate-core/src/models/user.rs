use serde::{Deserialize, Serialize};

/// Profile of the signed-in user as returned by the auth backend.
/// Extra fields in the payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Point-in-time copy of the session, for handing to a UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<User>,
    pub is_authenticated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ignores_extra_fields() {
        let json = r#"{"id": "user-123", "email": "test@example.com", "token": "abc"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "user-123");
        assert_eq!(user.email, "test@example.com");
    }

    #[test]
    fn test_snapshot_camel_case() {
        let snapshot = SessionSnapshot {
            token: None,
            user: None,
            is_authenticated: false,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["isAuthenticated"], false);
    }
}
