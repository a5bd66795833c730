use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::core::Database;
use crate::db::Row;
use crate::types::{ImportJob, JobStatus};
use crate::TARGET_DB;

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Database {
    /// Persist a new job in its current state.
    #[instrument(target = "db", level = "info", skip(self, job), fields(job_id = %job.id))]
    pub async fn create_job(&self, job: &ImportJob) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO scraping_jobs (id, source, status, posts_found, started_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&job.id)
        .bind(&job.source)
        .bind(job.status.as_str())
        .bind(job.posts_found as i64)
        .bind(job.started_at.to_rfc3339())
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Created job {} with status {}", job.id, job.status.as_str());
        Ok(())
    }

    /// Write the final counters, error list and status of a job.
    #[instrument(target = "db", level = "info", skip(self, job), fields(job_id = %job.id))]
    pub async fn finalize_job(&self, job: &ImportJob) -> Result<(), sqlx::Error> {
        let errors = serde_json::to_string(&job.errors).unwrap_or_else(|_| "[]".to_string());

        let updated = sqlx::query(
            r#"
            UPDATE scraping_jobs SET
                status = ?2,
                properties_added = ?3,
                properties_updated = ?4,
                properties_skipped = ?5,
                errors = ?6,
                completed_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&job.id)
        .bind(job.status.as_str())
        .bind(job.properties_added as i64)
        .bind(job.properties_updated as i64)
        .bind(job.properties_skipped as i64)
        .bind(&errors)
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .execute(self.pool())
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        debug!(target: TARGET_DB, "Finalized job {} as {}", job.id, job.status.as_str());
        Ok(())
    }

    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn get_job(&self, id: &str) -> Result<Option<ImportJob>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, source, status, posts_found, properties_added, properties_updated,
                   properties_skipped, errors, started_at, completed_at
            FROM scraping_jobs WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| {
            let status: String = row.get("status");
            let errors: String = row.get("errors");
            let started_at: String = row.get("started_at");
            let completed_at: Option<String> = row.get("completed_at");

            ImportJob {
                id: row.get("id"),
                status: JobStatus::from(status.as_str()),
                source: row.get("source"),
                posts_found: row.get::<i64, _>("posts_found") as usize,
                properties_added: row.get::<i64, _>("properties_added") as usize,
                properties_updated: row.get::<i64, _>("properties_updated") as usize,
                properties_skipped: row.get::<i64, _>("properties_skipped") as usize,
                errors: serde_json::from_str(&errors).unwrap_or_default(),
                started_at: parse_timestamp(&started_at).unwrap_or_else(Utc::now),
                completed_at: completed_at.as_deref().and_then(parse_timestamp),
            }
        }))
    }
}
