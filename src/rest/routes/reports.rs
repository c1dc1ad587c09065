// rest/routes/reports.rs — report generation and retrieval.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::report::{self, ReportError};
use crate::rest::{api_error, internal_error, require_auth, ApiError};
use crate::storage::ReportRow;
use crate::AppContext;

fn report_json(r: &ReportRow) -> Value {
    json!({
        "id": r.id,
        "assessmentId": r.assessment_id,
        "companyId": r.company_id,
        "companyName": r.company_name,
        "assessmentName": r.assessment_name,
        "assessmentPath": r.assessment_path,
        "htmlContent": r.html_content,
        "generatedAt": r.generated_at,
        "generatedBy": r.generated_by,
    })
}

/// POST /api/v1/assessments/{id}/report — generate (or regenerate).
/// 409 when the assessment is not completed.
pub async fn generate(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = require_auth(&ctx, &headers).await?;
    let assessment = ctx
        .storage
        .get_assessment(&id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "assessment not found"))?;
    let company = ctx
        .storage
        .get_company(&assessment.company_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "company not found"))?;

    let row = report::generate(&ctx.storage, &ctx.model, &assessment, &company, &user.id)
        .await
        .map_err(|e| match e {
            ReportError::NotCompleted => api_error(StatusCode::CONFLICT, e),
            ReportError::Model(inner) => {
                api_error(StatusCode::BAD_GATEWAY, format!("AI model error: {inner}"))
            }
            ReportError::Internal(inner) => internal_error(inner),
        })?;

    ctx.events.publish(
        "report.generated",
        json!({ "assessment_id": id, "report_id": row.id }),
    );
    Ok((StatusCode::CREATED, Json(report_json(&row))))
}

/// GET /api/v1/assessments/{id}/report — the stored report, if any.
pub async fn get_one(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&ctx, &headers).await?;
    match ctx
        .storage
        .get_report_for_assessment(&id)
        .await
        .map_err(internal_error)?
    {
        Some(r) => Ok(Json(report_json(&r))),
        None => Err(api_error(StatusCode::NOT_FOUND, "no report generated yet")),
    }
}
