use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::types::Role;

/// What a token may be used for. Session tokens are never accepted by the
/// password reset endpoint and reset tokens never open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: Role,
    pub purpose: TokenPurpose,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn for_user(user: &User, purpose: TokenPurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            purpose,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("token was issued for a different purpose")]
    WrongPurpose,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub fn issue_session_token(user: &User, security: &SecurityConfig) -> Result<String, AuthError> {
    let ttl = Duration::hours(security.jwt_expiry_hours as i64);
    sign(&Claims::for_user(user, TokenPurpose::Session, ttl), security)
}

pub fn issue_reset_token(user: &User, security: &SecurityConfig) -> Result<String, AuthError> {
    let ttl = Duration::minutes(security.reset_token_expiry_minutes as i64);
    sign(&Claims::for_user(user, TokenPurpose::PasswordReset, ttl), security)
}

fn sign(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

/// Verify signature and expiry, then check the token was issued for `expected`.
pub fn decode_token(
    token: &str,
    expected: TokenPurpose,
    security: &SecurityConfig,
) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let claims = decode::<Claims>(token, &decoding_key, &Validation::default())?.claims;

    if claims.purpose != expected {
        return Err(AuthError::WrongPurpose);
    }
    Ok(claims)
}

/// bcrypt is CPU bound, so hashing runs off the async workers.
pub async fn hash_password(plain: &str, cost: u32) -> Result<String, AuthError> {
    let plain = plain.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??)
}

pub async fn verify_password(plain: &str, hashed: &str) -> Result<bool, AuthError> {
    let plain = plain.to_string();
    let hashed = hashed.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed)).await??)
}

/// At least 8 characters from `A-Za-z0-9@$!%*?&`, with at least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    const MESSAGE: &str = "Password must be at least 8 characters long and contain a number.";

    let allowed = |c: char| c.is_ascii_alphanumeric() || "@$!%*?&".contains(c);
    if password.chars().count() < 8 || !password.chars().all(allowed) {
        return Err(MESSAGE);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(MESSAGE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn user(role: Role) -> User {
        User {
            id: 42,
            full_name: "Dana Planner".into(),
            email: "dana@example.com".into(),
            password: String::new(),
            contact_number: None,
            role,
        }
    }

    #[test]
    fn session_token_round_trip() {
        let security = AppConfig::development().security;
        let token = issue_session_token(&user(Role::Admin), &security).unwrap();
        let claims = decode_token(&token, TokenPurpose::Session, &security).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_purposes_do_not_mix() {
        let security = AppConfig::development().security;
        let reset = issue_reset_token(&user(Role::User), &security).unwrap();
        assert!(matches!(
            decode_token(&reset, TokenPurpose::Session, &security),
            Err(AuthError::WrongPurpose)
        ));

        let session = issue_session_token(&user(Role::User), &security).unwrap();
        assert!(matches!(
            decode_token(&session, TokenPurpose::PasswordReset, &security),
            Err(AuthError::WrongPurpose)
        ));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let mut security = AppConfig::development().security;
        let token = issue_session_token(&user(Role::User), &security).unwrap();
        security.jwt_secret = "another-secret".into();
        assert!(matches!(
            decode_token(&token, TokenPurpose::Session, &security),
            Err(AuthError::Token(_))
        ));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let security = AppConfig::production().security;
        assert!(matches!(
            issue_session_token(&user(Role::User), &security),
            Err(AuthError::MissingSecret)
        ));
    }

    #[tokio::test]
    async fn hashes_and_verifies_passwords() {
        let hashed = hash_password("Secret123", 4).await.unwrap();
        assert_ne!(hashed, "Secret123");
        assert!(verify_password("Secret123", &hashed).await.unwrap());
        assert!(!verify_password("Secret124", &hashed).await.unwrap());
    }

    #[test]
    fn password_strength_rules() {
        assert!(validate_password_strength("abcdefg1").is_ok());
        assert!(validate_password_strength("P@ssw0rd!").is_ok());
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("allletters").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("spaces 123").is_err());
    }
}
