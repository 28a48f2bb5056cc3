//! Campaign, prompt pool, and execution statistics models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::JobKind;

// ============================================================================
// Enums
// ============================================================================

/// How often a campaign's trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    #[default]
    Daily,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Active,
    Paused,
}

// ============================================================================
// Campaign
// ============================================================================

/// A recurring source of jobs drawing from a rotating prompt pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub kind: JobKind,

    // Recurrence
    pub frequency: Frequency,
    /// Only consulted for `daily`
    pub items_per_day: u32,
    /// Only consulted for `custom` (6-field cron, seconds first)
    pub custom_cron: Option<String>,

    /// Applied to every job the campaign spawns
    pub publish_delay_ms: u64,
    /// Parent for page campaigns
    pub parent_page_id: Option<u64>,

    /// Wrap the cursor to the start after exhausting the pool, or
    /// self-pause
    pub is_looping: bool,
    pub is_active: bool,
    pub status: CampaignStatus,

    /// Index of the next prompt to consume
    pub current_prompt_index: usize,
    pub total_generated: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_executed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Derive the cron expression for this campaign's trigger.
    ///
    /// `daily` spreads items across the day: every
    /// `floor(24 / items_per_day)` hours, clamped to at least one hour
    /// so more than 24 items per day never yields an invalid `*/0`.
    pub fn cron_expression(&self) -> String {
        match self.frequency {
            Frequency::Hourly => "0 0 * * * *".to_string(),
            Frequency::Daily => {
                let interval = (24 / self.items_per_day.max(1)).max(1);
                format!("0 0 */{} * * *", interval)
            }
            Frequency::Custom => self
                .custom_cron
                .clone()
                // 9 AM daily when no expression was stored
                .unwrap_or_else(|| "0 0 9 * * *".to_string()),
        }
    }
}

// ============================================================================
// Prompt pool
// ============================================================================

/// One prompt in a campaign's pool. Ordinals are unique and stable
/// once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub id: Uuid,
    pub text: String,
    pub index: usize,
    pub times_used: u64,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Ordered, indexed prompt collection belonging to one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPool {
    pub campaign_id: Uuid,
    pub prompts: Vec<PromptEntry>,
}

impl PromptPool {
    pub fn new(campaign_id: Uuid, texts: &[String]) -> Self {
        let prompts = texts
            .iter()
            .enumerate()
            .map(|(index, text)| PromptEntry {
                id: Uuid::new_v4(),
                text: text.clone(),
                index,
                times_used: 0,
                last_used_at: None,
            })
            .collect();
        Self {
            campaign_id,
            prompts,
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Append prompts with ordinals continuing from the current length.
    /// Existing ordinals and the cursor are untouched.
    pub fn append(&mut self, texts: &[String]) -> Vec<PromptEntry> {
        let start = self.prompts.len();
        let new_entries: Vec<PromptEntry> = texts
            .iter()
            .enumerate()
            .map(|(offset, text)| PromptEntry {
                id: Uuid::new_v4(),
                text: text.clone(),
                index: start + offset,
                times_used: 0,
                last_used_at: None,
            })
            .collect();
        self.prompts.extend(new_entries.clone());
        new_entries
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-campaign execution statistics with an incrementally maintained
/// running average (not a sliding window).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CampaignStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub average_execution_ms: f64,
}

impl CampaignStats {
    /// Record one completed or failed execution.
    pub fn record(&mut self, success: bool, duration_ms: u64) {
        self.total_executions += 1;
        if success {
            self.successful_executions += 1;
        } else {
            self.failed_executions += 1;
        }
        let total = self.total_executions as f64;
        self.average_execution_ms =
            (self.average_execution_ms * (total - 1.0) + duration_ms as f64) / total;
    }

    /// A step that never launched a job: failure branch only, no
    /// duration sample.
    pub fn record_step_failure(&mut self) {
        self.failed_executions += 1;
    }
}

/// Statistics bundled with derived pool progress, as exposed to
/// callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStatsView {
    #[serde(flatten)]
    pub stats: CampaignStats,
    pub total_prompts: usize,
    pub current_prompt_index: usize,
    pub total_generated: u64,
    /// round(cursor / pool length * 100)
    pub progress_percentage: u32,
    pub is_active: bool,
    pub last_executed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Requests
// ============================================================================

/// Configuration for creating a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub name: String,
    pub prompts: Vec<String>,
    #[serde(default)]
    pub kind: JobKind,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_items_per_day")]
    pub items_per_day: u32,
    #[serde(default)]
    pub custom_cron: Option<String>,
    /// Defaults per kind when absent (articles 5 min, pages immediate)
    #[serde(default)]
    pub publish_delay_ms: Option<u64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_looping: bool,
    #[serde(default)]
    pub parent_page_id: Option<u64>,
}

fn default_items_per_day() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Shallow-merge update for a campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub items_per_day: Option<u32>,
    pub custom_cron: Option<String>,
    pub publish_delay_ms: Option<u64>,
    pub is_looping: Option<bool>,
    pub parent_page_id: Option<u64>,
}

impl CampaignPatch {
    /// Whether applying this patch requires re-deriving the trigger
    pub fn touches_schedule(&self) -> bool {
        self.frequency.is_some() || self.items_per_day.is_some() || self.custom_cron.is_some()
    }
}

/// Campaign bundled with its pool and stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignBundle {
    pub campaign: Campaign,
    pub pool: PromptPool,
    pub stats: CampaignStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_with(frequency: Frequency, items_per_day: u32) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            kind: JobKind::Article,
            frequency,
            items_per_day,
            custom_cron: None,
            publish_delay_ms: 0,
            parent_page_id: None,
            is_looping: true,
            is_active: true,
            status: CampaignStatus::Active,
            current_prompt_index: 0,
            total_generated: 0,
            created_at: now,
            updated_at: now,
            last_executed_at: None,
        }
    }

    #[test]
    fn hourly_cron_fires_once_per_hour() {
        let c = campaign_with(Frequency::Hourly, 1);
        assert_eq!(c.cron_expression(), "0 0 * * * *");
    }

    #[test]
    fn daily_six_per_day_fires_every_four_hours() {
        let c = campaign_with(Frequency::Daily, 6);
        assert_eq!(c.cron_expression(), "0 0 */4 * * *");
    }

    #[test]
    fn daily_one_per_day_fires_every_twenty_four_hours() {
        let c = campaign_with(Frequency::Daily, 1);
        assert_eq!(c.cron_expression(), "0 0 */24 * * *");
    }

    #[test]
    fn daily_interval_clamps_to_one_hour() {
        let c = campaign_with(Frequency::Daily, 48);
        assert_eq!(c.cron_expression(), "0 0 */1 * * *");
    }

    #[test]
    fn daily_zero_items_does_not_divide_by_zero() {
        let c = campaign_with(Frequency::Daily, 0);
        assert_eq!(c.cron_expression(), "0 0 */24 * * *");
    }

    #[test]
    fn custom_cron_used_verbatim() {
        let mut c = campaign_with(Frequency::Custom, 1);
        c.custom_cron = Some("0 30 6 * * MON".to_string());
        assert_eq!(c.cron_expression(), "0 30 6 * * MON");
    }

    #[test]
    fn pool_append_continues_ordinals() {
        let mut pool = PromptPool::new(
            Uuid::new_v4(),
            &["a".to_string(), "b".to_string()],
        );
        let added = pool.append(&["c".to_string(), "d".to_string()]);
        assert_eq!(added[0].index, 2);
        assert_eq!(added[1].index, 3);
        assert_eq!(pool.len(), 4);
        // Existing ordinals untouched
        assert_eq!(pool.prompts[0].index, 0);
        assert_eq!(pool.prompts[1].index, 1);
    }

    #[test]
    fn stats_record_updates_running_average() {
        let mut stats = CampaignStats {
            total_executions: 1,
            successful_executions: 1,
            failed_executions: 0,
            average_execution_ms: 100.0,
        };
        stats.record(true, 400);
        assert_eq!(stats.total_executions, 2);
        assert_eq!(stats.average_execution_ms, 250.0);
    }

    #[test]
    fn stats_step_failure_skips_duration() {
        let mut stats = CampaignStats::default();
        stats.record_step_failure();
        assert_eq!(stats.failed_executions, 1);
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.average_execution_ms, 0.0);
    }

    mod average_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The running average always equals the arithmetic mean
            /// of the recorded durations.
            #[test]
            fn running_average_is_arithmetic_mean(
                durations in proptest::collection::vec(0u64..1_000_000, 1..50)
            ) {
                let mut stats = CampaignStats::default();
                for &d in &durations {
                    stats.record(true, d);
                }
                let mean = durations.iter().map(|&d| d as f64).sum::<f64>()
                    / durations.len() as f64;
                prop_assert!((stats.average_execution_ms - mean).abs() < 1e-6);
            }
        }
    }
}
