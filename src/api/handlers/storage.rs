//! User row storage over Postgres.
//!
//! All writes are single statements; email uniqueness is enforced by the
//! database constraint and surfaced as an outcome, never as a panic.

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use utoipa::ToSchema;

/// Role column values. Stored as TEXT with a check constraint.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// A full user row, including the password hash.
///
/// Never serialized directly; response payloads go through
/// [`super::UserResponse`] which drops the hash.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

/// Result of an insert attempt against the unique email constraint.
#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    Conflict,
}

pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<RegisterOutcome, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3)")
        .bind(email)
        .bind(password_hash)
        .bind(UserRole::User.as_str())
        .execute(pool)
        .await;

    insert_outcome(result)
}

/// Fold an insert result into a register outcome: a unique violation on the
/// email column is a conflict, anything else propagates.
fn insert_outcome<T>(result: Result<T, sqlx::Error>) -> Result<RegisterOutcome, sqlx::Error> {
    match result {
        Ok(_) => Ok(RegisterOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err),
    }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, role, avatar FROM users WHERE email = $1 LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    row.map(user_from_row).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, role, avatar FROM users WHERE id = $1 LIMIT 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(user_from_row).transpose()
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, email, password_hash, role, avatar FROM users ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(user_from_row).collect()
}

/// Full-overwrite update of a user row. The caller supplies the complete
/// record; partial patches are not supported.
pub async fn replace_user(
    pool: &PgPool,
    id: i64,
    email: &str,
    role: UserRole,
    avatar: Option<&str>,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r"
        UPDATE users
        SET email = $1, role = $2, avatar = $3, updated_at = NOW()
        WHERE id = $4
        RETURNING id, email, password_hash, role, avatar
        ",
    )
    .bind(email)
    .bind(role.as_str())
    .bind(avatar)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(user_from_row).transpose()
}

pub async fn set_avatar(
    pool: &PgPool,
    id: i64,
    avatar: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r"
        UPDATE users
        SET avatar = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, email, password_hash, role, avatar
        ",
    )
    .bind(avatar)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(user_from_row).transpose()
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn user_from_row(row: PgRow) -> Result<UserRecord, sqlx::Error> {
    let role: String = row.get("role");
    let role = UserRole::parse(&role)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown role value: {role}").into()))?;
    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        avatar: row.get("avatar"),
    })
}
