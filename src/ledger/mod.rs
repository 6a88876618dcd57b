//! Transaction and category endpoints. Only the routes exist so far; every
//! handler answers 501 until the ledger itself is built.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use crate::{auth::extractors::AuthUser, state::AppState};

/// Must be mounted behind the auth gate.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/categories", get(list_categories))
}

fn not_implemented(what: &str) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({ "error": format!("{what} not implemented") })),
    )
        .into_response()
}

#[instrument(skip_all, fields(user_id = %identity.user_id))]
async fn list_transactions(AuthUser(identity): AuthUser) -> Response {
    not_implemented("Listing transactions")
}

#[instrument(skip_all, fields(user_id = %identity.user_id))]
async fn create_transaction(AuthUser(identity): AuthUser) -> Response {
    not_implemented("Creating transactions")
}

#[instrument(skip_all, fields(user_id = %identity.user_id))]
async fn list_categories(AuthUser(identity): AuthUser) -> Response {
    not_implemented("Listing categories")
}
