//! Login endpoint: verifies credentials and mints a session token.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use super::auth::token::{now_unix, Claims};
use super::auth::utils::{normalize_email, verify_password};
use super::auth::AuthState;
use super::storage;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No user with this email"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);

    let user = match storage::find_by_email(&pool, &email).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to look up user: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error looking up user".to_string(),
            )
                .into_response();
        }
    };

    let user = match check_credentials(user, &request.password) {
        Ok(user) => user,
        Err(rejection) => {
            debug!("Login rejected: {rejection:?}");
            return rejection.into_response();
        }
    };

    let claims = Claims::for_user(&user, now_unix(), auth_state.config().token_ttl_days());
    match auth_state.keys().sign(&claims) {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(err) => {
            error!("Failed to sign session token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error creating session token".to_string(),
            )
                .into_response()
        }
    }
}

/// Why a login attempt was turned away: no account with that email, or the
/// password did not match. The two are distinct failures on the wire.
#[derive(Debug)]
enum LoginRejection {
    UnknownEmail,
    WrongPassword,
}

impl IntoResponse for LoginRejection {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownEmail => {
                (StatusCode::NOT_FOUND, "User not found".to_string()).into_response()
            }
            Self::WrongPassword => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response()
            }
        }
    }
}

fn check_credentials(
    user: Option<storage::UserRecord>,
    password: &str,
) -> Result<storage::UserRecord, LoginRejection> {
    let Some(user) = user else {
        return Err(LoginRejection::UnknownEmail);
    };
    if verify_password(password, &user.password_hash) {
        Ok(user)
    } else {
        Err(LoginRejection::WrongPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::utils::hash_password;
    use crate::api::handlers::storage::{UserRecord, UserRole};

    fn user_with_password(password: &str) -> UserRecord {
        UserRecord {
            id: 42,
            email: "alice@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            role: UserRole::User,
            avatar: None,
        }
    }

    #[test]
    fn unknown_email_is_rejected_as_not_found() {
        let rejection = check_credentials(None, "correct horse").unwrap_err();
        assert!(matches!(rejection, LoginRejection::UnknownEmail));
        assert_eq!(rejection.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn wrong_password_is_rejected_as_unauthorized() {
        let user = user_with_password("correct horse");
        let rejection = check_credentials(Some(user), "battery staple").unwrap_err();
        assert!(matches!(rejection, LoginRejection::WrongPassword));
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn matching_credentials_resolve_the_user() {
        let user = user_with_password("correct horse");
        let resolved = check_credentials(Some(user), "correct horse").unwrap();
        assert_eq!(resolved.id, 42);
    }
}
