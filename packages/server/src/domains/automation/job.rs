//! Job model for the content-generation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Which pipeline variant a job runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Article,
    Page,
}

/// Overall job status. Mirrors the furthest-reached pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    #[default]
    Pending,
    /// Created with a cron schedule; waiting for the trigger to fire
    Scheduled,
    Running,
    /// Draft created; deferred-publish timer pending
    ScheduledForPublish,
    Published,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Published | JobStatus::Failed)
    }
}

/// One of the four pipeline stages tracked on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Content,
    Metadata,
    Images,
    Publish,
}

/// Progress of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Pending,
    Generating,
    Creating,
    Completed,
    Scheduled,
    Published,
}

/// Independent per-stage progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StageProgress {
    pub content: StageStatus,
    pub metadata: StageStatus,
    pub images: StageStatus,
    pub publish: StageStatus,
}

impl StageProgress {
    pub fn set(&mut self, stage: Stage, status: StageStatus) {
        match stage {
            Stage::Content => self.content = status,
            Stage::Metadata => self.metadata = status,
            Stage::Images => self.images = status,
            Stage::Publish => self.publish = status,
        }
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// The featured image before upload: prompt plus source reference
/// (URL or data-URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedImage {
    pub prompt: String,
    pub reference: String,
}

/// A generated content image, ordinal-matched to its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub prompt: String,
    pub reference: String,
    pub index: usize,
}

/// A content image after upload to the publishing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub prompt: String,
    pub reference: String,
    pub index: usize,
    pub media_id: u64,
    pub media_url: String,
}

/// Campaign linkage. All fields present or the whole link absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignLink {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub prompt_id: Uuid,
    pub prompt_index: usize,
}

// ============================================================================
// Job
// ============================================================================

/// One generation request and its lifecycle. Mutated exclusively by
/// the pipeline executor once running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,

    // Input
    pub content_prompt: String,
    pub parent_page_id: Option<u64>,

    // Scheduling
    pub schedule: Option<String>,
    pub publish_delay_ms: u64,

    // Derived content
    pub generated_content: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub slug: Option<String>,
    pub meta_description: Option<String>,
    pub page_type: Option<String>,
    pub image_prompts: Vec<String>,
    pub featured_image_prompt: Option<String>,

    // Generated artifacts
    pub featured_image: Option<FeaturedImage>,
    pub featured_media_id: Option<u64>,
    pub generated_images: Vec<GeneratedImage>,
    pub uploaded_images: Vec<UploadedImage>,
    pub final_content: Option<String>,

    // Publishing-target linkage
    pub content_item_id: Option<u64>,

    // State
    pub progress: StageProgress,
    pub status: JobStatus,
    pub campaign: Option<CampaignLink>,
    pub error: Option<String>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Default article delay between draft creation and publish (5 min).
    /// Pages publish immediately unless a delay is requested.
    pub fn default_publish_delay(kind: JobKind) -> u64 {
        match kind {
            JobKind::Article => 300_000,
            JobKind::Page => 0,
        }
    }

    pub fn new(kind: JobKind, content_prompt: &str, publish_delay_ms: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            content_prompt: content_prompt.to_string(),
            parent_page_id: None,
            schedule: None,
            publish_delay_ms,
            generated_content: None,
            title: None,
            category: None,
            tags: Vec::new(),
            slug: None,
            meta_description: None,
            page_type: None,
            image_prompts: Vec::new(),
            featured_image_prompt: None,
            featured_image: None,
            featured_media_id: None,
            generated_images: Vec::new(),
            uploaded_images: Vec::new(),
            final_content: None,
            content_item_id: None,
            progress: StageProgress::default(),
            status: JobStatus::Pending,
            campaign: None,
            error: None,
            created_at: now,
            started_at: None,
            updated_at: now,
            published_at: None,
            failed_at: None,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Caller-facing request to create a single job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub kind: JobKind,
    pub content_prompt: String,
    /// Defaults per kind when absent (articles 5 min, pages immediate)
    pub publish_delay_ms: Option<u64>,
    /// Cron expression; when set the job waits for the trigger
    pub schedule: Option<String>,
    pub parent_page_id: Option<u64>,
}

/// A job request handed off by the campaign scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub content_prompt: String,
    pub publish_delay_ms: u64,
    pub parent_page_id: Option<u64>,
    pub campaign: CampaignLink,
}

/// Fields a caller may change on an existing job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    pub content_prompt: Option<String>,
    pub publish_delay_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_pending_with_all_stages_pending() {
        let job = Job::new(JobKind::Article, "write about rust", 0);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress.content, StageStatus::Pending);
        assert_eq!(job.progress.publish, StageStatus::Pending);
        assert!(job.campaign.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn article_default_delay_is_five_minutes() {
        assert_eq!(Job::default_publish_delay(JobKind::Article), 300_000);
    }

    #[test]
    fn page_default_delay_is_immediate() {
        assert_eq!(Job::default_publish_delay(JobKind::Page), 0);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Published.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::ScheduledForPublish.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn stage_progress_set_targets_one_stage() {
        let mut progress = StageProgress::default();
        progress.set(Stage::Metadata, StageStatus::Generating);
        assert_eq!(progress.metadata, StageStatus::Generating);
        assert_eq!(progress.content, StageStatus::Pending);
    }

    #[test]
    fn job_serializes_with_kebab_case_status() {
        let mut job = Job::new(JobKind::Page, "about us", 0);
        job.status = JobStatus::ScheduledForPublish;
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("scheduled-for-publish"));
        assert!(json.contains("\"kind\":\"page\""));
    }
}
