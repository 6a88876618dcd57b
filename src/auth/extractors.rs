use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Identity;
use crate::error::AppError;

/// Identity placed on the request by [`require_auth`](super::middleware::require_auth).
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::MissingCredential)
    }
}
