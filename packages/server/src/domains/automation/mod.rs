//! Content automation domain: jobs, campaigns, and the generation
//! pipeline.

pub mod assembler;
pub mod campaign;
pub mod engine;
pub mod error;
pub mod events;
pub mod job;
pub mod job_store;
pub mod metadata;
pub mod pipeline;
pub mod scheduler;

pub use campaign::{
    Campaign, CampaignBundle, CampaignConfig, CampaignPatch, CampaignStats, CampaignStatsView,
    CampaignStatus, Frequency, PromptEntry, PromptPool,
};
pub use engine::AutomationEngine;
pub use error::AutomationError;
pub use events::AutomationEvent;
pub use job::{
    Job, JobKind, JobPatch, JobRequest, JobStatus, NewJob, Stage, StageProgress, StageStatus,
};
pub use job_store::{JobCounters, JobStore};
pub use pipeline::PipelineExecutor;
pub use scheduler::{CampaignScheduler, StepOutcome};
