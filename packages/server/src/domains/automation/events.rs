//! Events the engine broadcasts as jobs and campaigns change state.
//!
//! Subscribers get full snapshots for lifecycle transitions and
//! lightweight ids for fine-grained progress. A slow subscriber only
//! loses its own backlog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::campaign::{Campaign, CampaignStatus, PromptEntry};
use super::job::{Job, Stage, StageStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AutomationEvent {
    JobCreated {
        job: Job,
    },
    JobStarted {
        job: Job,
    },
    ProgressUpdated {
        job_id: Uuid,
        stage: Stage,
        status: StageStatus,
    },
    MetadataExtracted {
        job_id: Uuid,
        metadata: serde_json::Value,
    },
    ImageGenerated {
        job_id: Uuid,
        /// `None` for the featured image
        index: Option<usize>,
        reference: String,
    },
    JobCompleted {
        job: Job,
    },
    JobFailed {
        job: Job,
    },
    JobCancelled {
        job_id: Uuid,
    },
    CampaignCreated {
        campaign: Campaign,
    },
    CampaignUpdated {
        campaign: Campaign,
    },
    CampaignStatusChanged {
        campaign_id: Uuid,
        status: CampaignStatus,
    },
    CampaignDeleted {
        campaign_id: Uuid,
    },
    CampaignJobCompleted {
        campaign_id: Uuid,
        job_id: Uuid,
        prompt_index: usize,
    },
    PromptsAdded {
        campaign_id: Uuid,
        prompts: Vec<PromptEntry>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::automation::job::JobKind;

    #[test]
    fn events_tag_with_kebab_case_type() {
        let event = AutomationEvent::JobCancelled { job_id: Uuid::new_v4() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"job-cancelled\""));
    }

    #[test]
    fn progress_event_carries_stage_and_status() {
        let event = AutomationEvent::ProgressUpdated {
            job_id: Uuid::new_v4(),
            stage: Stage::Images,
            status: StageStatus::Generating,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "images");
        assert_eq!(json["status"], "generating");
    }

    #[test]
    fn job_events_embed_the_full_job() {
        let job = Job::new(JobKind::Article, "topic", 0);
        let event = AutomationEvent::JobCreated { job };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["job"]["status"], "pending");
    }
}
