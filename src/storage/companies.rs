//! Company CRUD. Deleting a company cascades to its assessments and their
//! reports inside one transaction.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use super::{with_timeout, CompanyRow, Storage};

impl Storage {
    pub async fn create_company(
        &self,
        name: &str,
        description: &str,
        created_by: &str,
    ) -> Result<CompanyRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO companies (id, name, description, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(created_by)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_company(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("company not found after insert"))
    }

    pub async fn get_company(&self, id: &str) -> Result<Option<CompanyRow>> {
        Ok(sqlx::query_as("SELECT * FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_companies(&self) -> Result<Vec<CompanyRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM companies ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn update_company(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<CompanyRow>> {
        let now = Utc::now().to_rfc3339();
        let result =
            sqlx::query("UPDATE companies SET name = ?, description = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(description)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_company(id).await
    }

    /// Delete a company together with its assessments and their reports.
    /// Returns `false` when the company does not exist.
    pub async fn delete_company(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM reports WHERE assessment_id IN
               (SELECT id FROM assessments WHERE company_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM assessments WHERE company_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn count_companies(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}
