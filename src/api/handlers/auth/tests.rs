//! Auth module tests.

use super::principal::{extract_bearer_token, Permission, Principal};
use super::token::{Claims, TokenKeyError, TokenKeys, SECONDS_PER_DAY};
use super::utils::{hash_password, normalize_email, valid_email, valid_password, verify_password};
use crate::api::handlers::storage::{UserRecord, UserRole};
use anyhow::Result;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::STANDARD, Engine};

const ISSUED_AT: u64 = 1_700_000_000;

fn user(id: i64, role: UserRole) -> UserRecord {
    UserRecord {
        id,
        email: format!("user{id}@example.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        role,
        avatar: None,
    }
}

fn keys_from(byte: u8) -> TokenKeys {
    TokenKeys::from_base64(&STANDARD.encode([byte; 32]), &[]).expect("valid key")
}

#[test]
fn normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
}

#[test]
fn valid_email_accepts_basic_format() {
    assert!(valid_email("a@example.com"));
    assert!(!valid_email("not-an-email"));
    assert!(!valid_email("two words@example.com"));
}

#[test]
fn valid_password_enforces_minimum_length() {
    assert!(!valid_password("short"));
    assert!(valid_password("long enough"));
}

#[test]
fn password_hash_verifies_and_differs_from_plaintext() -> Result<()> {
    let hash = hash_password("correct horse").map_err(anyhow::Error::msg)?;
    assert_ne!(hash, "correct horse");
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("battery staple", &hash));
    Ok(())
}

#[test]
fn verify_password_rejects_malformed_hash() {
    assert!(!verify_password("anything", "not-a-phc-string"));
}

#[test]
fn issued_token_round_trips() -> Result<()> {
    let keys = keys_from(1);
    let user = user(42, UserRole::Admin);
    let claims = Claims::for_user(&user, ISSUED_AT, 7);
    let token = keys.sign(&claims)?;

    // Claims are inspected directly; expiry enforcement is covered below.
    let decoded: Claims = {
        let payload = token.split('.').nth(1).expect("jwt payload");
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload)?;
        serde_json::from_slice(&bytes)?
    };

    assert_eq!(decoded.sub, "42");
    assert_eq!(decoded.user_id(), Some(42));
    assert_eq!(decoded.email, "user42@example.com");
    assert_eq!(decoded.role, UserRole::Admin);
    assert_eq!(decoded.exp - decoded.iat, 7 * SECONDS_PER_DAY);
    Ok(())
}

#[test]
fn live_token_verifies() -> Result<()> {
    let keys = keys_from(1);
    let user = user(7, UserRole::User);
    let claims = Claims::for_user(&user, super::token::now_unix(), 7);
    let token = keys.sign(&claims)?;

    let verified = keys.verify(&token)?;
    assert_eq!(verified.user_id(), Some(7));
    assert_eq!(verified.role, UserRole::User);
    Ok(())
}

#[test]
fn wrong_key_is_rejected() -> Result<()> {
    let signer = keys_from(1);
    let other = keys_from(2);
    let claims = Claims::for_user(&user(1, UserRole::User), super::token::now_unix(), 7);
    let token = signer.sign(&claims)?;

    assert!(other.verify(&token).is_err());
    Ok(())
}

#[test]
fn previous_key_still_verifies_after_rotation() -> Result<()> {
    let old_encoded = STANDARD.encode([1u8; 32]);
    let new_encoded = STANDARD.encode([2u8; 32]);

    let old_keys = keys_from(1);
    let claims = Claims::for_user(&user(3, UserRole::User), super::token::now_unix(), 7);
    let token = old_keys.sign(&claims)?;

    let rotated =
        TokenKeys::from_base64(&new_encoded, &[old_encoded.as_str()]).map_err(anyhow::Error::msg)?;
    let verified = rotated.verify(&token)?;
    assert_eq!(verified.user_id(), Some(3));
    Ok(())
}

#[test]
fn expired_token_is_rejected() -> Result<()> {
    let keys = keys_from(1);
    let now = super::token::now_unix();
    let claims = Claims {
        sub: "5".to_string(),
        email: "user5@example.com".to_string(),
        role: UserRole::User,
        iat: now - 8 * SECONDS_PER_DAY,
        exp: now - SECONDS_PER_DAY,
    };
    let token = keys.sign(&claims)?;

    let err = keys.verify(&token).expect_err("token should be expired");
    assert!(matches!(
        err.kind(),
        jsonwebtoken::errors::ErrorKind::ExpiredSignature
    ));
    Ok(())
}

#[test]
fn garbage_token_is_rejected() {
    let keys = keys_from(1);
    assert!(keys.verify("not-a-jwt").is_err());
}

#[test]
fn key_material_is_validated() {
    assert!(matches!(
        TokenKeys::from_base64("AAAA", &[]),
        Err(TokenKeyError::WrongLength(3))
    ));
    assert!(matches!(
        TokenKeys::from_base64("!!!not base64!!!", &[]),
        Err(TokenKeyError::InvalidEncoding)
    ));
    let valid = STANDARD.encode([0u8; 32]);
    assert!(matches!(
        TokenKeys::from_base64(&valid, &["AAAA"]),
        Err(TokenKeyError::WrongLength(3))
    ));
}

#[test]
fn only_admins_list_users() {
    let admin = Principal {
        user: user(1, UserRole::Admin),
    };
    let regular = Principal {
        user: user(2, UserRole::User),
    };
    assert!(admin.allows(&Permission::ListUsers));
    assert!(!regular.allows(&Permission::ListUsers));
}

#[test]
fn any_authenticated_user_reads_profiles() {
    let regular = Principal {
        user: user(2, UserRole::User),
    };
    assert!(regular.allows(&Permission::ReadUser));
}

#[test]
fn update_is_self_or_admin() {
    let admin = Principal {
        user: user(1, UserRole::Admin),
    };
    let regular = Principal {
        user: user(2, UserRole::User),
    };

    assert!(regular.allows(&Permission::UpdateUser { target_id: 2 }));
    assert!(!regular.allows(&Permission::UpdateUser { target_id: 3 }));
    assert!(admin.allows(&Permission::UpdateUser { target_id: 2 }));
    assert!(admin.allows(&Permission::UpdateUser { target_id: 999 }));
}

#[test]
fn bearer_token_extraction() {
    let mut headers = HeaderMap::new();
    assert_eq!(extract_bearer_token(&headers), None);

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
    assert_eq!(
        extract_bearer_token(&headers),
        Some("abc.def.ghi".to_string())
    );

    headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer lower"));
    assert_eq!(extract_bearer_token(&headers), Some("lower".to_string()));

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(extract_bearer_token(&headers), None);

    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(extract_bearer_token(&headers), None);
}
