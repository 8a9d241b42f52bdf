use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::auth::Authenticator;
use crate::error::AppError;

/// Authenticated user extracted from the Authorization header.
/// Use as an extractor in route handlers that require auth.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<Authenticator>()
            .ok_or(AppError::Internal("Missing authenticator".into()))?
            .clone();

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        let username = authenticator.authenticate(token)?;

        Ok(AuthUser { username })
    }
}
