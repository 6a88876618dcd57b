use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{auth::jwt::JwtKeys, error::AppError};

/// Pulls the token out of a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Result<&str, AppError> {
    match header.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AppError::MalformedCredential),
    }
}

/// Gate for protected routes: validates the bearer token and stores the
/// caller's [`Identity`](crate::auth::claims::Identity) in request extensions.
pub async fn require_auth(
    State(keys): State<Arc<JwtKeys>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingCredential)?
        .to_str()
        .map_err(|_| AppError::MalformedCredential)?;

    let token = bearer_token(header)?;
    let identity = keys.verify(token).map_err(|e| {
        debug!(reason = %e, "rejected bearer token");
        AppError::Unauthenticated
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
