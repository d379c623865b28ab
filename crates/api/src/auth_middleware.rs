//! Bearer-token extraction.
//!
//! `AuthUser` is an axum extractor: handlers that need an authenticated
//! caller take it as a parameter and get a 401 for free if the token is
//! missing or invalid.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use taskforge_shared::{auth, Error};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
    pub is_admin: bool,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::AuthMissing)?;
        let token = header.strip_prefix("Bearer ").ok_or(Error::AuthMissing)?;
        let claims = auth::verify_token(&state.config.secret_key, token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
        })
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::Forbidden("admin privileges required".into()).into())
        }
    }
}
