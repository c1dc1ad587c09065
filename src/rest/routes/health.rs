use crate::AppContext;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let uptime = ctx.started_at.elapsed().as_secs();
    let users = ctx.storage.count_users().await.unwrap_or(0);
    let companies = ctx.storage.count_companies().await.unwrap_or(0);
    let assessments = ctx.storage.count_assessments().await.unwrap_or(0);
    let reports = ctx.storage.count_reports().await.unwrap_or(0);
    Json(json!({
        "status": "ok",
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION"),
        "users": users,
        "companies": companies,
        "assessments": assessments,
        "reports": reports,
    }))
}
