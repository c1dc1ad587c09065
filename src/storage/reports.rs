//! Report persistence. One report per assessment; regeneration replaces the
//! stored row via an upsert keyed on `assessment_id`.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use super::{ReportRow, Storage};

impl Storage {
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_report(
        &self,
        assessment_id: &str,
        company_id: &str,
        company_name: &str,
        assessment_name: &str,
        assessment_path: &str,
        html_content: &str,
        generated_by: &str,
    ) -> Result<ReportRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO reports
               (id, assessment_id, company_id, company_name, assessment_name, assessment_path,
                html_content, generated_at, generated_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(assessment_id) DO UPDATE SET
               company_name = excluded.company_name,
               assessment_name = excluded.assessment_name,
               assessment_path = excluded.assessment_path,
               html_content = excluded.html_content,
               generated_at = excluded.generated_at,
               generated_by = excluded.generated_by",
        )
        .bind(&id)
        .bind(assessment_id)
        .bind(company_id)
        .bind(company_name)
        .bind(assessment_name)
        .bind(assessment_path)
        .bind(html_content)
        .bind(&now)
        .bind(generated_by)
        .execute(&self.pool)
        .await?;
        self.get_report_for_assessment(assessment_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("report not found after upsert"))
    }

    pub async fn get_report_for_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<Option<ReportRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM reports WHERE assessment_id = ?")
                .bind(assessment_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn count_reports(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}
