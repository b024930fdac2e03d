/*
 * Responsibility
 * - Handler から見える「認可済みトークン」の型
 * - requires_auth が検証して request extensions に格納し、handler はこの型だけを受け取る
 */
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::services::auth::TokenClaims;

/// Verified claims of the bearer token that passed the permission gate.
#[derive(Debug, Clone)]
pub struct Claims(pub TokenClaims);

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TokenClaims>() {
            Some(claims) => Ok(Claims(claims.clone())),
            None => {
                // Route was registered without requires_auth.
                tracing::error!(path = %parts.uri.path(), "claims requested on an ungated route");
                Err(AppError::Internal)
            }
        }
    }
}
