//! Assessment CRUD and the auto-save write path. The nested response map and
//! the category-status map live in JSON TEXT columns, written whole in a
//! single UPDATE so a save is atomic at the row level.

use anyhow::{Context as _, Result};
use chrono::Utc;
use uuid::Uuid;

use super::{with_timeout, AssessmentRow, Storage};
use crate::assessment::{
    AssessmentPath, AssessmentStatus, CategoryStatusMap, ResponseMap,
};

impl AssessmentRow {
    /// Parse the `assessment_type` column.
    pub fn path(&self) -> Result<AssessmentPath> {
        AssessmentPath::parse(&self.assessment_type)
            .ok_or_else(|| anyhow::anyhow!("invalid assessment_type: {}", self.assessment_type))
    }

    /// Parse the `status` column.
    pub fn parsed_status(&self) -> Result<AssessmentStatus> {
        AssessmentStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("invalid status: {}", self.status))
    }

    /// Decode the `responses` JSON document.
    pub fn response_map(&self) -> Result<ResponseMap> {
        serde_json::from_str(&self.responses).context("decode responses document")
    }

    /// Decode the `category_statuses` JSON document.
    pub fn category_status_map(&self) -> Result<CategoryStatusMap> {
        serde_json::from_str(&self.category_statuses).context("decode category_statuses document")
    }
}

impl Storage {
    pub async fn create_assessment(
        &self,
        company_id: &str,
        name: &str,
        path: AssessmentPath,
        created_by: &str,
    ) -> Result<AssessmentRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO assessments
               (id, company_id, name, assessment_type, status, responses, category_statuses,
                created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'draft', '{}', '{}', ?, ?, ?)",
        )
        .bind(&id)
        .bind(company_id)
        .bind(name)
        .bind(path.as_str())
        .bind(created_by)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_assessment(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("assessment not found after insert"))
    }

    pub async fn get_assessment(&self, id: &str) -> Result<Option<AssessmentRow>> {
        Ok(sqlx::query_as("SELECT * FROM assessments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_assessments_for_company(
        &self,
        company_id: &str,
    ) -> Result<Vec<AssessmentRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM assessments WHERE company_id = ? ORDER BY created_at DESC",
            )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// Persist a merged response map, its recomputed category statuses, and
    /// the derived status in one UPDATE (the auto-save write).
    pub async fn save_responses(
        &self,
        id: &str,
        responses: &ResponseMap,
        category_statuses: &CategoryStatusMap,
        status: AssessmentStatus,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let responses_json = serde_json::to_string(responses)?;
        let statuses_json = serde_json::to_string(category_statuses)?;
        sqlx::query(
            "UPDATE assessments
                SET responses = ?, category_statuses = ?, status = ?, updated_at = ?
              WHERE id = ?",
        )
        .bind(&responses_json)
        .bind(&statuses_json)
        .bind(status.as_str())
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete an assessment and its report. Returns `false` when absent.
    pub async fn delete_assessment(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reports WHERE assessment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM assessments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn count_assessments(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM assessments")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}
