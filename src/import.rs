//! Batch import: extract, normalize, deduplicate and persist posts while
//! keeping the job record for the batch.

use tracing::{debug, error, info, warn};

use crate::db::{Database, DuplicateLink, PropertyStatus};
use crate::duplicate::{DuplicateChecker, DuplicateConfig};
use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::normalize::Normalizer;
use crate::types::{ImportJob, ImportResponse, MatchReason, RawPost};
use crate::TARGET_IMPORT;

pub const DEFAULT_SOURCE: &str = "instagram";

/// What happened to one post.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Added { id: i64, duplicate_of: Option<i64> },
    Updated { id: i64 },
    Skipped { reasons: Vec<String> },
}

pub struct Importer {
    db: Database,
    extractor: Extractor,
    normalizer: Normalizer,
    duplicate_config: DuplicateConfig,
    source: String,
}

impl Importer {
    pub fn new(db: Database, extractor: Extractor) -> Self {
        Importer {
            db,
            extractor,
            normalizer: Normalizer::new(),
            duplicate_config: DuplicateConfig::default(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_duplicate_config(mut self, config: DuplicateConfig) -> Self {
        self.duplicate_config = config;
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Import a batch in input order.
    ///
    /// Every post is attempted before the job is finalized. Only failing to
    /// create or finalize the job is returned as an error; per-post problems
    /// end up in the job's counters and error list.
    pub async fn run(&mut self, posts: Vec<RawPost>) -> Result<ImportResponse, PipelineError> {
        let mut job = ImportJob::new(&self.source, posts.len());
        job.start();
        self.db
            .create_job(&job)
            .await
            .map_err(PipelineError::JobCreation)?;

        info!(target: TARGET_IMPORT, "Job {} started with {} posts", job.id, posts.len());

        for post in &posts {
            match self.process_post(&job.id, post).await {
                Ok(RecordOutcome::Added { id, duplicate_of }) => {
                    job.properties_added += 1;
                    match duplicate_of {
                        Some(existing) => info!(target: TARGET_IMPORT, "Added property {} from {} (possible duplicate of {})", id, post.post_url, existing),
                        None => info!(target: TARGET_IMPORT, "Added property {} from {}", id, post.post_url),
                    }
                }
                Ok(RecordOutcome::Updated { id }) => {
                    job.properties_updated += 1;
                    info!(target: TARGET_IMPORT, "Updated property {} from {}", id, post.post_url);
                }
                Ok(RecordOutcome::Skipped { reasons }) => {
                    job.properties_skipped += 1;
                    warn!(target: TARGET_IMPORT, "Skipped {}: {}", post.post_url, reasons.join("; "));
                }
                Err(e) => {
                    error!(target: TARGET_IMPORT, "Failed to import {}: {}", post.post_url, e);
                    job.errors.push(format!("{}: {}", post.post_url, e));
                }
            }
        }

        job.finish();
        self.db
            .finalize_job(&job)
            .await
            .map_err(|source| PipelineError::JobFinalization {
                job_id: job.id.clone(),
                source,
            })?;

        let summary = job.summary();
        info!(
            target: TARGET_IMPORT,
            "Job {} {}: {} added, {} updated, {} skipped, {} errors",
            job.id,
            job.status.as_str(),
            summary.added,
            summary.updated,
            summary.skipped,
            summary.errors
        );

        Ok(ImportResponse {
            success: true,
            job_id: job.id.clone(),
            summary,
            error_messages: (!job.errors.is_empty()).then(|| job.errors.clone()),
        })
    }

    /// Run one post through the pipeline. `Err` means the post could not be
    /// checked or stored; a post that is simply incomplete is `Skipped`.
    pub async fn process_post(
        &mut self,
        job_id: &str,
        post: &RawPost,
    ) -> anyhow::Result<RecordOutcome> {
        let extracted = self.extractor.extract(post).await;
        let normalized = self.normalizer.normalize_property(extracted);
        if !normalized.is_valid() {
            return Ok(RecordOutcome::Skipped {
                reasons: normalized.errors,
            });
        }
        for warning in &normalized.warnings {
            debug!(target: TARGET_IMPORT, "{}: {}", post.post_url, warning);
        }

        let warnings = normalized.warnings;
        let property = normalized.data;
        let check = DuplicateChecker::new(&self.db)
            .with_config(self.duplicate_config.clone())
            .check(&property)
            .await?;

        match check.best_match() {
            Some(best) if best.reason == MatchReason::ExactUrl => {
                self.db
                    .update_property(best.candidate_id, &property, &warnings, job_id)
                    .await?;
                Ok(RecordOutcome::Updated {
                    id: best.candidate_id,
                })
            }
            Some(best) if check.is_duplicate => {
                let link = DuplicateLink {
                    duplicate_of_id: best.candidate_id,
                    confidence: best.confidence,
                };
                let id = self
                    .db
                    .insert_property(
                        &property,
                        &warnings,
                        PropertyStatus::PendingReview,
                        Some(link),
                        job_id,
                    )
                    .await?;
                Ok(RecordOutcome::Added {
                    id,
                    duplicate_of: Some(best.candidate_id),
                })
            }
            _ => {
                let id = self
                    .db
                    .insert_property(&property, &warnings, PropertyStatus::Pending, None, job_id)
                    .await?;
                Ok(RecordOutcome::Added {
                    id,
                    duplicate_of: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobStatus;

    fn post(text: &str, url: &str) -> RawPost {
        RawPost {
            text: text.to_string(),
            post_url: url.to_string(),
            account_handle: None,
            timestamp: None,
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let db = Database::in_memory().await.unwrap();
        let mut importer = Importer::new(db.clone(), Extractor::new(None));

        let response = importer.run(Vec::new()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.summary.total, 0);
        assert!(response.error_messages.is_none());

        let job = db.get_job(&response.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_process_post_skips_incomplete_listing() {
        let db = Database::in_memory().await.unwrap();
        let mut importer = Importer::new(db.clone(), Extractor::new(None));

        let outcome = importer
            .process_post("job", &post("Beautiful home, DM for price", "https://www.instagram.com/p/a/"))
            .await
            .unwrap();
        match outcome {
            RecordOutcome::Skipped { reasons } => assert!(!reasons.is_empty()),
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(db.count_properties().await.unwrap(), 0);
    }
}
