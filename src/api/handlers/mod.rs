//! API handlers and shared response shapes for Tribuna.

pub mod account;
pub mod auth;
pub mod health;
pub mod storage;
pub mod user_login;
pub mod user_register;
pub mod users;

use serde::Serialize;
use utoipa::ToSchema;

use self::storage::{UserRecord, UserRole};

/// Public user shape returned by every endpoint. The password hash never
/// leaves the storage layer.
#[derive(ToSchema, Serialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            role: record.role,
            avatar: record.avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_drops_password_hash() {
        let record = UserRecord {
            id: 7,
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::User,
            avatar: None,
        };
        let value = serde_json::to_value(UserResponse::from(record)).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["avatar", "email", "id", "role"]);
    }
}
