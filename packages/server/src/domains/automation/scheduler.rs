//! Campaign scheduler: owns campaigns, prompt pools, and execution
//! statistics.
//!
//! This is the synchronous half of campaign handling. All operations
//! complete under a single lock acquisition with no suspend point, so
//! two interleaved steps (a trigger fire racing a manual execute)
//! consume adjacent prompts instead of the same one. Trigger
//! registration itself lives in the engine, which pairs these
//! operations with cron handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use super::campaign::{
    Campaign, CampaignBundle, CampaignConfig, CampaignPatch, CampaignStats, CampaignStatsView,
    CampaignStatus, PromptEntry, PromptPool,
};
use super::error::AutomationError;
use super::job::{CampaignLink, Job, JobRequest};

/// Outcome of one campaign step.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Bookkeeping done; the engine should launch this job request
    Ready(JobRequest),
    /// Pool exhausted or empty; `paused` when the campaign self-paused
    Exhausted { paused: bool },
    /// Campaign missing or inactive; the step is a no-op
    Unavailable,
}

#[derive(Default)]
struct State {
    campaigns: HashMap<Uuid, Campaign>,
    pools: HashMap<Uuid, PromptPool>,
    stats: HashMap<Uuid, CampaignStats>,
}

/// Registry of campaigns with their prompt pools and statistics.
#[derive(Clone, Default)]
pub struct CampaignScheduler {
    inner: Arc<Mutex<State>>,
}

impl CampaignScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a new campaign with zeroed statistics.
    pub fn create(&self, config: CampaignConfig) -> Result<CampaignBundle, AutomationError> {
        if config.name.trim().is_empty() {
            return Err(AutomationError::Validation(
                "campaign name is required".to_string(),
            ));
        }
        if config.prompts.is_empty() {
            return Err(AutomationError::Validation(
                "campaign prompt list is required".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let publish_delay_ms = config
            .publish_delay_ms
            .unwrap_or_else(|| Job::default_publish_delay(config.kind));
        let campaign = Campaign {
            id,
            name: config.name,
            kind: config.kind,
            frequency: config.frequency,
            items_per_day: config.items_per_day,
            custom_cron: config.custom_cron,
            publish_delay_ms,
            parent_page_id: config.parent_page_id,
            is_looping: config.is_looping,
            is_active: config.is_active,
            status: if config.is_active {
                CampaignStatus::Active
            } else {
                CampaignStatus::Paused
            },
            current_prompt_index: 0,
            total_generated: 0,
            created_at: now,
            updated_at: now,
            last_executed_at: None,
        };
        let pool = PromptPool::new(id, &config.prompts);

        let mut state = self.inner.lock().unwrap();
        state.campaigns.insert(id, campaign.clone());
        state.pools.insert(id, pool.clone());
        state.stats.insert(id, CampaignStats::default());

        Ok(CampaignBundle {
            campaign,
            pool,
            stats: CampaignStats::default(),
        })
    }

    /// Take the next prompt and advance the cursor. Wraps to the
    /// start only when the cursor has already run past the end and
    /// the campaign loops; otherwise an exhausted pool yields `None`.
    ///
    /// Usage counters are not touched here; `next_job_request` is the
    /// consuming path.
    pub fn next_prompt(&self, id: Uuid) -> Option<PromptEntry> {
        let mut state = self.inner.lock().unwrap();
        let State {
            campaigns, pools, ..
        } = &mut *state;
        let campaign = campaigns.get_mut(&id)?;
        let pool = pools.get(&id)?;
        advance_cursor(campaign, pool)
    }

    /// One step of a campaign: consume a prompt, advance bookkeeping,
    /// and hand back the job request to launch. Bookkeeping reflects
    /// attempted execution, not confirmed success, so a downstream
    /// failure still consumes the prompt slot.
    pub fn next_job_request(&self, id: Uuid) -> StepOutcome {
        let mut state = self.inner.lock().unwrap();
        let State {
            campaigns, pools, ..
        } = &mut *state;

        let Some(campaign) = campaigns.get_mut(&id) else {
            return StepOutcome::Unavailable;
        };
        if !campaign.is_active {
            return StepOutcome::Unavailable;
        }
        let Some(pool) = pools.get_mut(&id) else {
            return StepOutcome::Unavailable;
        };

        let Some(entry) = advance_cursor(campaign, pool) else {
            tracing::warn!(campaign = %campaign.name, "no prompts available");
            if !campaign.is_looping {
                campaign.is_active = false;
                campaign.status = CampaignStatus::Paused;
                campaign.updated_at = Utc::now();
                return StepOutcome::Exhausted { paused: true };
            }
            return StepOutcome::Exhausted { paused: false };
        };

        let now = Utc::now();
        campaign.total_generated += 1;
        campaign.last_executed_at = Some(now);
        campaign.updated_at = now;

        let prompt = &mut pool.prompts[entry.index];
        prompt.times_used += 1;
        prompt.last_used_at = Some(now);

        tracing::info!(
            campaign = %campaign.name,
            prompt_index = entry.index,
            pool_size = pool.len(),
            "executing campaign step"
        );

        StepOutcome::Ready(JobRequest {
            kind: campaign.kind,
            content_prompt: entry.text.clone(),
            publish_delay_ms: campaign.publish_delay_ms,
            parent_page_id: campaign.parent_page_id,
            campaign: CampaignLink {
                campaign_id: campaign.id,
                campaign_name: campaign.name.clone(),
                prompt_id: entry.id,
                prompt_index: entry.index,
            },
        })
    }

    pub fn pause(&self, id: Uuid) -> Option<Campaign> {
        self.set_active(id, false)
    }

    pub fn resume(&self, id: Uuid) -> Option<Campaign> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: Uuid, active: bool) -> Option<Campaign> {
        let mut state = self.inner.lock().unwrap();
        let campaign = state.campaigns.get_mut(&id)?;
        campaign.is_active = active;
        campaign.status = if active {
            CampaignStatus::Active
        } else {
            CampaignStatus::Paused
        };
        campaign.updated_at = Utc::now();
        Some(campaign.clone())
    }

    /// Shallow-merge a patch. The second tuple field reports whether
    /// the trigger must be re-derived (schedule fields touched while
    /// active).
    pub fn update(&self, id: Uuid, patch: CampaignPatch) -> Option<(Campaign, bool)> {
        let reschedule_wanted = patch.touches_schedule();
        let mut state = self.inner.lock().unwrap();
        let campaign = state.campaigns.get_mut(&id)?;

        if let Some(name) = patch.name {
            campaign.name = name;
        }
        if let Some(frequency) = patch.frequency {
            campaign.frequency = frequency;
        }
        if let Some(items_per_day) = patch.items_per_day {
            campaign.items_per_day = items_per_day;
        }
        if let Some(custom_cron) = patch.custom_cron {
            campaign.custom_cron = Some(custom_cron);
        }
        if let Some(delay) = patch.publish_delay_ms {
            campaign.publish_delay_ms = delay;
        }
        if let Some(is_looping) = patch.is_looping {
            campaign.is_looping = is_looping;
        }
        if let Some(parent) = patch.parent_page_id {
            campaign.parent_page_id = Some(parent);
        }
        campaign.updated_at = Utc::now();

        let reschedule = reschedule_wanted && campaign.is_active;
        Some((campaign.clone(), reschedule))
    }

    /// Append prompts; ordinals continue from the pool length and the
    /// cursor is untouched.
    pub fn add_prompts(&self, id: Uuid, texts: &[String]) -> Option<Vec<PromptEntry>> {
        let mut state = self.inner.lock().unwrap();
        let pool = state.pools.get_mut(&id)?;
        Some(pool.append(texts))
    }

    /// Remove the campaign with its pool and stats.
    pub fn delete(&self, id: Uuid) -> Option<Campaign> {
        let mut state = self.inner.lock().unwrap();
        let campaign = state.campaigns.remove(&id)?;
        state.pools.remove(&id);
        state.stats.remove(&id);
        Some(campaign)
    }

    pub fn list(&self) -> Vec<Campaign> {
        self.inner
            .lock()
            .unwrap()
            .campaigns
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<Campaign> {
        self.inner.lock().unwrap().campaigns.get(&id).cloned()
    }

    /// Campaign bundled with its pool and stats.
    pub fn bundle(&self, id: Uuid) -> Option<CampaignBundle> {
        let state = self.inner.lock().unwrap();
        let campaign = state.campaigns.get(&id)?.clone();
        let pool = state.pools.get(&id)?.clone();
        let stats = state.stats.get(&id).copied().unwrap_or_default();
        Some(CampaignBundle {
            campaign,
            pool,
            stats,
        })
    }

    /// Statistics with derived pool progress.
    pub fn stats_view(&self, id: Uuid) -> Option<CampaignStatsView> {
        let state = self.inner.lock().unwrap();
        let campaign = state.campaigns.get(&id)?;
        let pool = state.pools.get(&id)?;
        let stats = state.stats.get(&id).copied().unwrap_or_default();

        let progress_percentage = if pool.is_empty() {
            0
        } else {
            ((campaign.current_prompt_index as f64 / pool.len() as f64) * 100.0).round() as u32
        };

        Some(CampaignStatsView {
            stats,
            total_prompts: pool.len(),
            current_prompt_index: campaign.current_prompt_index,
            total_generated: campaign.total_generated,
            progress_percentage,
            is_active: campaign.is_active,
            last_executed_at: campaign.last_executed_at,
        })
    }

    /// Record a finished execution (success or failure) with its
    /// wall-clock duration.
    pub fn update_execution_stats(&self, id: Uuid, success: bool, duration_ms: u64) {
        let mut state = self.inner.lock().unwrap();
        if let Some(stats) = state.stats.get_mut(&id) {
            stats.record(success, duration_ms);
        }
    }

    /// Record a step whose job never launched.
    pub fn record_step_failure(&self, id: Uuid) {
        let mut state = self.inner.lock().unwrap();
        if let Some(stats) = state.stats.get_mut(&id) {
            stats.record_step_failure();
        }
    }
}

/// Cursor semantics: the returned prompt is always the one at the
/// pre-call cursor; the cursor ends one past it. The wrap happens on
/// the call *after* the last prompt was returned.
fn advance_cursor(campaign: &mut Campaign, pool: &PromptPool) -> Option<PromptEntry> {
    if pool.is_empty() {
        return None;
    }
    let mut index = campaign.current_prompt_index;
    if index >= pool.len() {
        if campaign.is_looping {
            index = 0;
            campaign.current_prompt_index = 0;
        } else {
            return None;
        }
    }
    let entry = pool.prompts[index].clone();
    campaign.current_prompt_index = index + 1;
    Some(entry)
}
