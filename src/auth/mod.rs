use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;

/// Registration and login; reachable without a token.
pub fn public_router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Account routes that must sit behind [`middleware::require_auth`].
pub fn protected_router() -> Router<AppState> {
    handlers::profile_routes()
}
