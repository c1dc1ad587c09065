// rest/mod.rs — Public REST API server.
//
// Axum HTTP server (local only by default). Endpoints:
//
//   POST /api/v1/auth/register
//   POST /api/v1/auth/login
//   POST /api/v1/auth/logout
//   GET  /api/v1/health
//   GET  /api/v1/catalog/{path}
//   GET|POST        /api/v1/companies
//   GET|PUT|DELETE  /api/v1/companies/{id}
//   GET|POST        /api/v1/companies/{id}/assessments
//   GET|DELETE      /api/v1/assessments/{id}
//   PUT  /api/v1/assessments/{id}/responses      (auto-save)
//   GET  /api/v1/assessments/{id}/validation
//   POST /api/v1/assessments/{id}/report
//   GET  /api/v1/assessments/{id}/report
//   GET  /api/v1/assessments/{id}/events         (SSE)

pub mod routes;
pub mod sse;

use anyhow::Result;
use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{AuthError, AuthedUser};
use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        // Accounts & sessions
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/auth/logout", post(routes::auth::logout))
        // Questionnaire catalog
        .route("/api/v1/catalog/{path}", get(routes::assessments::catalog))
        // Companies
        .route(
            "/api/v1/companies",
            get(routes::companies::list).post(routes::companies::create),
        )
        .route(
            "/api/v1/companies/{id}",
            get(routes::companies::get_one)
                .put(routes::companies::update)
                .delete(routes::companies::delete),
        )
        .route(
            "/api/v1/companies/{id}/assessments",
            get(routes::assessments::list_for_company).post(routes::assessments::create),
        )
        // Assessments
        .route(
            "/api/v1/assessments/{id}",
            get(routes::assessments::get_one).delete(routes::assessments::delete),
        )
        .route(
            "/api/v1/assessments/{id}/responses",
            put(routes::assessments::save_responses),
        )
        .route(
            "/api/v1/assessments/{id}/validation",
            get(routes::assessments::validation),
        )
        // Reports
        .route(
            "/api/v1/assessments/{id}/report",
            get(routes::reports::get_one).post(routes::reports::generate),
        )
        // Events
        .route(
            "/api/v1/assessments/{id}/events",
            get(sse::assessment_events_sse),
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

// ─── Shared handler plumbing ─────────────────────────────────────────────────

pub type ApiError = (StatusCode, Json<Value>);

pub fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

pub fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("internal error: {e}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(_) => api_error(StatusCode::BAD_REQUEST, e),
            AuthError::EmailTaken => api_error(StatusCode::CONFLICT, e),
            AuthError::InvalidCredentials | AuthError::Unauthorized => {
                api_error(StatusCode::UNAUTHORIZED, e)
            }
            AuthError::Internal(inner) => internal_error(inner),
        }
    }
}

/// Resolve the caller from the `Authorization` header or fail with 401.
pub async fn require_auth(
    ctx: &AppContext,
    headers: &axum::http::HeaderMap,
) -> Result<AuthedUser, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    crate::auth::authenticate(&ctx.storage, header)
        .await
        .map_err(ApiError::from)
}
