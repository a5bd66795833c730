use thiserror::Error;

/// Errors that abort a whole import batch. Problems with individual posts
/// are recorded on the job instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to create import job: {0}")]
    JobCreation(#[source] sqlx::Error),

    #[error("Failed to finalize import job {job_id}: {source}")]
    JobFinalization {
        job_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}
