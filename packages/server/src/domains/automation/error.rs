//! Typed errors for the engine's public surface.
//!
//! Collaborator failures inside the pipeline stay `anyhow::Error` and
//! end up on the job record as a terminal failure; these variants are
//! only for operations callers invoke directly.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AutomationError {
    /// Bad input at creation time (empty prompt, name, prompt list)
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation referenced an unknown job or campaign id
    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    /// Cron trigger registration or removal failed
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

impl From<tokio_cron_scheduler::JobSchedulerError> for AutomationError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        AutomationError::Scheduler(err.to_string())
    }
}
