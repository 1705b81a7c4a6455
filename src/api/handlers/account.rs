//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Authenticate via bearer token.
//! 2) Check the policy for the requested operation.
//! 3) Apply the full-record update or avatar change against the store.

use axum::{
    extract::{Extension, Multipart},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::principal::{require_auth, Permission, Principal};
use super::auth::utils::{normalize_email, valid_email};
use super::auth::AuthState;
use super::{storage, UserResponse};
use crate::files::FileStore;

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "photo";

/// Full-overwrite update payload. The caller supplies the complete record;
/// omitted `avatar` clears the reference.
#[derive(ToSchema, Deserialize, Debug)]
pub struct AccountUpdateRequest {
    pub id: i64,
    pub email: String,
    pub role: storage::UserRole,
    pub avatar: Option<String>,
}

#[utoipa::path(
    get,
    path = "/users/account",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "account"
)]
pub async fn get_account(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => {
            (StatusCode::OK, Json(UserResponse::from(principal.user))).into_response()
        }
        Err(status) => status.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/users/account",
    request_body = AccountUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not modify this user"),
        (status = 404, description = "Target user not found"),
        (status = 409, description = "Email already in use"),
    ),
    tag = "account"
)]
pub async fn update_account(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AccountUpdateRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match apply_update(&pool, &principal, request).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/users/account/avatar",
    responses(
        (status = 200, description = "User, with the new avatar reference if a file was supplied", body = UserResponse),
        (status = 400, description = "Malformed multipart body"),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "account"
)]
pub async fn upload_avatar(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    files: Extension<Arc<FileStore>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let photo = match read_photo_field(multipart).await {
        Ok(photo) => photo,
        Err(response) => return response,
    };

    // No file is a deliberate no-op: the caller gets its record back as-is.
    let Some((file_name, bytes)) = photo else {
        return (StatusCode::OK, Json(UserResponse::from(principal.user))).into_response();
    };

    let stored = match files.store(file_name.as_deref(), &bytes).await {
        Ok(stored) => stored,
        Err(err) => {
            error!("Failed to store avatar: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match storage::set_avatar(&pool, principal.user.id, &stored).await {
        Ok(Some(user)) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to update avatar reference: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug)]
enum ServiceError {
    Forbidden,
    NotFound,
    Conflict,
    BadRequest(&'static str),
    Database(sqlx::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Conflict => (StatusCode::CONFLICT, "Email already in use").into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Database(err) => {
                error!("Failed to update account: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn ensure_permission(principal: &Principal, permission: &Permission) -> Result<(), ServiceError> {
    if principal.allows(permission) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

async fn apply_update(
    pool: &PgPool,
    principal: &Principal,
    request: AccountUpdateRequest,
) -> Result<storage::UserRecord, ServiceError> {
    ensure_permission(
        principal,
        &Permission::UpdateUser {
            target_id: request.id,
        },
    )?;

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ServiceError::BadRequest("Invalid email"));
    }

    let updated = storage::replace_user(
        pool,
        request.id,
        &email,
        request.role,
        request.avatar.as_deref(),
    )
    .await
    .map_err(|err| {
        if storage::is_unique_violation(&err) {
            ServiceError::Conflict
        } else {
            ServiceError::Database(err)
        }
    })?;

    updated.ok_or(ServiceError::NotFound)
}

/// Pull the `photo` field out of the multipart body, if any.
///
/// Empty files are treated the same as a missing field.
async fn read_photo_field(
    mut multipart: Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(err) => {
                return Err(
                    (StatusCode::BAD_REQUEST, format!("Malformed upload: {err}")).into_response(),
                );
            }
        };

        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(|err| {
            (StatusCode::BAD_REQUEST, format!("Malformed upload: {err}")).into_response()
        })?;

        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some((file_name, bytes.to_vec())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header::CONTENT_TYPE, Request};

    const BOUNDARY: &str = "avatar-boundary";

    async fn multipart_from(body: &'static str) -> Multipart {
        let request = Request::builder()
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn photo_field_is_extracted_with_its_file_name() {
        let body = "--avatar-boundary\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\n\r\n\
            pixels\r\n\
            --avatar-boundary--\r\n";
        let photo = read_photo_field(multipart_from(body).await).await.unwrap();
        let (file_name, bytes) = photo.expect("photo field present");
        assert_eq!(file_name.as_deref(), Some("me.png"));
        assert_eq!(bytes, b"pixels");
    }

    #[tokio::test]
    async fn empty_file_is_treated_as_absent() {
        let body = "--avatar-boundary\r\n\
            Content-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\n\r\n\
            \r\n\
            --avatar-boundary--\r\n";
        let photo = read_photo_field(multipart_from(body).await).await.unwrap();
        assert!(photo.is_none());
    }

    #[tokio::test]
    async fn unrelated_fields_are_skipped() {
        let body = "--avatar-boundary\r\n\
            Content-Disposition: form-data; name=\"document\"; filename=\"me.png\"\r\n\r\n\
            pixels\r\n\
            --avatar-boundary--\r\n";
        let photo = read_photo_field(multipart_from(body).await).await.unwrap();
        assert!(photo.is_none());
    }
}
