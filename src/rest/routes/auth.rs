// rest/routes/auth.rs — account registration and session endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth;
use crate::rest::ApiError;
use crate::AppContext;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub password: String,
}

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = auth::register(&ctx.storage, &body.email, &body.display_name, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "displayName": user.display_name,
            "createdAt": user.created_at,
        })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let ttl = ctx.config.retention.session_ttl_hours;
    let (user, token) = auth::login(&ctx.storage, &body.email, &body.password, ttl).await?;
    Ok(Json(json!({
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "displayName": user.display_name,
        },
    })))
}

pub async fn logout(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    auth::logout(&ctx.storage, header).await?;
    Ok(Json(json!({ "ok": true })))
}
