//! Principal resolution and the authorization policy.
//!
//! Flow Overview: read the bearer token, verify it, and load the user row it
//! names. The resolved identity is the fresh database record, so a role
//! change takes effect on the next request rather than at token expiry.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use sqlx::PgPool;
use tracing::{debug, error};

use super::super::storage::{self, UserRecord, UserRole};
use super::state::AuthState;

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user: UserRecord,
}

/// Operations gated by the policy. Role checks live behind
/// [`Principal::allows`] instead of inline role comparisons in handlers.
#[derive(Clone, Copy, Debug)]
pub enum Permission {
    ListUsers,
    ReadUser,
    UpdateUser { target_id: i64 },
}

impl Principal {
    #[must_use]
    pub fn allows(&self, permission: &Permission) -> bool {
        match permission {
            Permission::ListUsers => self.user.role == UserRole::Admin,
            Permission::ReadUser => true,
            Permission::UpdateUser { target_id } => {
                self.user.role == UserRole::Admin || self.user.id == *target_id
            }
        }
    }
}

/// Resolve the bearer token into a principal, or return 401.
///
/// # Errors
///
/// `401` for a missing/invalid/expired token or an unknown subject;
/// `500` when the user lookup fails.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, StatusCode> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = match state.keys().verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("Rejected session token: {err}");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let Some(user_id) = claims.user_id() else {
        debug!("Session token subject is not a user id");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match storage::find_by_id(pool, user_id).await {
        Ok(Some(user)) => Ok(Principal { user }),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            error!("Failed to resolve principal: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
