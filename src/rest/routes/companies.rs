// rest/routes/companies.rs — company CRUD.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::{api_error, internal_error, require_auth, ApiError};
use crate::storage::CompanyRow;
use crate::AppContext;

pub fn company_json(c: &CompanyRow) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "description": c.description,
        "createdBy": c.created_by,
        "createdAt": c.created_at,
        "updatedAt": c.updated_at,
    })
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let companies = ctx.storage.list_companies().await.map_err(internal_error)?;
    let list: Vec<Value> = companies.iter().map(company_json).collect();
    Ok(Json(json!({ "companies": list })))
}

#[derive(Deserialize)]
pub struct CompanyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = require_auth(&ctx, &headers).await?;
    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "company name is required"));
    }
    let company = ctx
        .storage
        .create_company(body.name.trim(), body.description.trim(), &user.id)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(company_json(&company))))
}

pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    match ctx.storage.get_company(&id).await.map_err(internal_error)? {
        Some(c) => Ok(Json(company_json(&c))),
        None => Err(api_error(StatusCode::NOT_FOUND, "company not found")),
    }
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CompanyRequest>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "company name is required"));
    }
    match ctx
        .storage
        .update_company(&id, body.name.trim(), body.description.trim())
        .await
        .map_err(internal_error)?
    {
        Some(c) => Ok(Json(company_json(&c))),
        None => Err(api_error(StatusCode::NOT_FOUND, "company not found")),
    }
}

/// Deletes the company and, by cascade, its assessments and their reports.
pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let deleted = ctx.storage.delete_company(&id).await.map_err(internal_error)?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "company not found"));
    }
    Ok(Json(json!({ "ok": true })))
}
