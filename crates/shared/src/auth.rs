//! JWT issuance/verification and password hashing primitives, backed by
//! `jsonwebtoken` and `argon2`.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Decoded bearer-token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username, for display/audit purposes only.
    pub sub: String,
    pub user_id: i64,
    pub is_admin: bool,
    /// Unix seconds.
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn issue_token(
    secret: &str,
    user_id: i64,
    username: &str,
    is_admin: bool,
    ttl_seconds: i64,
) -> Result<String, Error> {
    let exp = chrono::Utc::now().timestamp() + ttl_seconds;
    let claims = Claims {
        sub: username.to_string(),
        user_id,
        is_admin,
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::AuthInvalid)
}
