// rest/routes/assessments.rs — assessment lifecycle: create, auto-save,
// validation, and the questionnaire catalog.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assessment::{completion, AssessmentPath, AssessmentStatus, ResponseMap};
use crate::catalog;
use crate::rest::{api_error, internal_error, require_auth, ApiError};
use crate::storage::AssessmentRow;
use crate::AppContext;

pub fn assessment_json(a: &AssessmentRow) -> Value {
    let responses: Value = serde_json::from_str(&a.responses).unwrap_or_else(|_| json!({}));
    let category_statuses: Value =
        serde_json::from_str(&a.category_statuses).unwrap_or_else(|_| json!({}));
    json!({
        "id": a.id,
        "companyId": a.company_id,
        "name": a.name,
        "type": a.assessment_type,
        "status": a.status,
        "responses": responses,
        "categoryStatuses": category_statuses,
        "createdBy": a.created_by,
        "createdAt": a.created_at,
        "updatedAt": a.updated_at,
    })
}

async fn load_assessment(ctx: &AppContext, id: &str) -> Result<AssessmentRow, ApiError> {
    ctx.storage
        .get_assessment(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "assessment not found"))
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// GET /api/v1/catalog/{path} — the questionnaire definition for a path.
pub async fn catalog(Path(path): Path<String>) -> Result<Json<Value>, ApiError> {
    let path = AssessmentPath::parse(&path)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "unknown assessment path"))?;
    let categories: Vec<Value> = catalog::CATEGORY_ORDER
        .iter()
        .map(|category| {
            let questions: Vec<Value> = catalog::questions_for(path, category)
                .into_iter()
                .map(|q| {
                    json!({
                        "id": q.id,
                        "prompt": q.prompt,
                        "required": q.required,
                    })
                })
                .collect();
            json!({
                "id": category,
                "title": catalog::category_title(category),
                "questions": questions,
            })
        })
        .collect();
    Ok(Json(json!({
        "path": path.as_str(),
        "totalSteps": catalog::total_steps(path),
        "categories": categories,
    })))
}

// ─── CRUD ────────────────────────────────────────────────────────────────────

pub async fn list_for_company(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(company_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    if ctx
        .storage
        .get_company(&company_id)
        .await
        .map_err(internal_error)?
        .is_none()
    {
        return Err(api_error(StatusCode::NOT_FOUND, "company not found"));
    }
    let rows = ctx
        .storage
        .list_assessments_for_company(&company_id)
        .await
        .map_err(internal_error)?;
    let list: Vec<Value> = rows.iter().map(assessment_json).collect();
    Ok(Json(json!({ "assessments": list })))
}

#[derive(Deserialize)]
pub struct CreateAssessmentRequest {
    pub name: String,
    /// `exploratory` | `migration`
    #[serde(rename = "type")]
    pub assessment_type: String,
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(company_id): Path<String>,
    Json(body): Json<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = require_auth(&ctx, &headers).await?;
    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "assessment name is required"));
    }
    let path = AssessmentPath::parse(&body.assessment_type)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "unknown assessment path"))?;
    if ctx
        .storage
        .get_company(&company_id)
        .await
        .map_err(internal_error)?
        .is_none()
    {
        return Err(api_error(StatusCode::NOT_FOUND, "company not found"));
    }
    let row = ctx
        .storage
        .create_assessment(&company_id, body.name.trim(), path, &user.id)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(assessment_json(&row))))
}

pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let row = load_assessment(&ctx, &id).await?;
    Ok(Json(assessment_json(&row)))
}

pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let deleted = ctx
        .storage
        .delete_assessment(&id)
        .await
        .map_err(internal_error)?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "assessment not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

// ─── Auto-save ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SaveResponsesRequest {
    pub responses: ResponseMap,
}

/// PUT /api/v1/assessments/{id}/responses — merge a partial response map,
/// recompute category statuses, and derive the assessment status.
pub async fn save_responses(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SaveResponsesRequest>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let row = load_assessment(&ctx, &id).await?;
    let path = row.path().map_err(internal_error)?;

    completion::validate_payload(path, &body.responses)
        .map_err(|msg| api_error(StatusCode::BAD_REQUEST, msg))?;

    let mut responses = row.response_map().map_err(internal_error)?;
    let previous_statuses = row.category_status_map().map_err(internal_error)?;
    let previous_status = row.parsed_status().map_err(internal_error)?;

    let touched = completion::merge_responses(&mut responses, &body.responses);
    let now = chrono::Utc::now().to_rfc3339();
    let statuses =
        completion::rebuild_status_map(path, &responses, &previous_statuses, &touched, &now);
    let status = completion::derive_status(path, &responses);

    ctx.storage
        .save_responses(&id, &responses, &statuses, status)
        .await
        .map_err(internal_error)?;

    ctx.events.publish(
        "assessment.saved",
        json!({ "assessment_id": id, "status": status.as_str() }),
    );
    if status == AssessmentStatus::Completed && previous_status != AssessmentStatus::Completed {
        ctx.events
            .publish("assessment.completed", json!({ "assessment_id": id }));
    }

    let row = load_assessment(&ctx, &id).await?;
    Ok(Json(assessment_json(&row)))
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// GET /api/v1/assessments/{id}/validation — per-category completion and the
/// Next Category / Generate Report gates.
pub async fn validation(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    let row = load_assessment(&ctx, &id).await?;
    let path = row.path().map_err(internal_error)?;
    let responses = row.response_map().map_err(internal_error)?;

    let categories: Vec<Value> = catalog::CATEGORY_ORDER
        .iter()
        .map(|category| {
            let p = completion::category_progress(path, category, &responses);
            json!({
                "id": category,
                "title": catalog::category_title(category),
                "status": p.status,
                "completionPercentage": p.completion_percentage,
                "answeredRequired": p.answered_required,
                "totalRequired": p.total_required,
                "canAdvance": completion::can_advance(path, category, &responses),
            })
        })
        .collect();

    Ok(Json(json!({
        "assessmentId": row.id,
        "status": row.status,
        "overallPercentage": completion::overall_percentage(path, &responses),
        "reportReady": completion::report_ready(path, &responses),
        "categories": categories,
    })))
}
