use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        Method,
    },
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, middleware::require_auth};
use crate::config::ServerConfig;
use crate::ledger;
use crate::state::AppState;

pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(ledger::router())
        .route_layer(from_fn_with_state(state.tokens.clone(), require_auth));

    Router::new()
        .nest(
            "/api/v1",
            Router::new().merge(auth::public_router()).merge(protected),
        )
        .route("/health", get(health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(server.cors_origins.clone())
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.users.ping().await {
        Ok(()) => "Connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            "Unavailable"
        }
    };
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "database": database,
    }))
}

fn listen_addr(server: &ServerConfig) -> SocketAddr {
    SocketAddr::new(server.host, server.port)
}

pub async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr = listen_addr(server);

    tracing::info!("listening on {}", addr);
    tracing::info!("available endpoints:");
    tracing::info!("  POST /api/v1/auth/register");
    tracing::info!("  POST /api/v1/auth/login");
    tracing::info!("  GET  /api/v1/user/profile (protected)");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
