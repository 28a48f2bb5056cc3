//! Engine dependencies for effects (using traits for testability)
//!
//! Central dependency container handed to the engine at startup. All
//! external services sit behind trait abstractions so tests can
//! substitute mocks.

use std::sync::Arc;

use super::traits::{BaseContentGenerator, BasePublisher};

/// External collaborators the engine needs.
#[derive(Clone)]
pub struct EngineDeps {
    /// LLM + image model used for all generation steps
    pub generator: Arc<dyn BaseContentGenerator>,
    /// Publishing target (WordPress in production)
    pub publisher: Arc<dyn BasePublisher>,
}

impl EngineDeps {
    pub fn new(generator: Arc<dyn BaseContentGenerator>, publisher: Arc<dyn BasePublisher>) -> Self {
        Self {
            generator,
            publisher,
        }
    }
}
