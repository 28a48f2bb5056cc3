//! Automation engine: the public surface tying jobs, campaigns, the
//! pipeline, and cron triggers together.
//!
//! One engine per process, created with [`AutomationEngine::start`]
//! and held in an `Arc`. Cron closures hold a `Weak` reference so a
//! dropped engine stops firing instead of leaking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use uuid::Uuid;

use crate::kernel::{EngineDeps, EventHub, ParentPage};

use super::campaign::{
    Campaign, CampaignBundle, CampaignConfig, CampaignPatch, CampaignStatsView, CampaignStatus,
    PromptEntry,
};
use super::error::AutomationError;
use super::events::AutomationEvent;
use super::job::{Job, JobPatch, JobStatus, NewJob};
use super::job_store::{JobCounters, JobStore};
use super::pipeline::PipelineExecutor;
use super::scheduler::{CampaignScheduler, StepOutcome};

pub struct AutomationEngine {
    deps: EngineDeps,
    jobs: JobStore,
    campaigns: CampaignScheduler,
    events: EventHub<AutomationEvent>,
    cron: JobScheduler,
    pipeline: Arc<PipelineExecutor>,
    /// campaign id -> cron trigger id
    campaign_triggers: Mutex<HashMap<Uuid, Uuid>>,
    /// job id -> cron trigger id (one-shot creation schedules)
    job_triggers: Mutex<HashMap<Uuid, Uuid>>,
}

impl AutomationEngine {
    /// Create the engine and start its cron scheduler.
    pub async fn start(deps: EngineDeps) -> anyhow::Result<Arc<Self>> {
        let cron = JobScheduler::new().await?;
        cron.start().await?;

        let jobs = JobStore::new();
        let campaigns = CampaignScheduler::new();
        let events: EventHub<AutomationEvent> = EventHub::new();
        let pipeline = Arc::new(PipelineExecutor::new(
            deps.generator.clone(),
            deps.publisher.clone(),
            jobs.clone(),
            campaigns.clone(),
            events.clone(),
        ));

        Ok(Arc::new(Self {
            deps,
            jobs,
            campaigns,
            events,
            cron,
            pipeline,
            campaign_triggers: Mutex::new(HashMap::new()),
            job_triggers: Mutex::new(HashMap::new()),
        }))
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AutomationEvent> {
        self.events.subscribe()
    }

    /// Stop the cron scheduler. In-flight pipeline runs and publish
    /// timers are not interrupted.
    pub async fn shutdown(&self) -> Result<(), AutomationError> {
        let mut cron = self.cron.clone();
        cron.shutdown().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    /// Create a job. Runs immediately, or waits for its cron trigger
    /// when a schedule is given; the trigger fires once and is then
    /// removed.
    pub async fn create_job(self: &Arc<Self>, request: NewJob) -> Result<Job, AutomationError> {
        if request.content_prompt.trim().is_empty() {
            return Err(AutomationError::Validation(
                "content prompt is required".to_string(),
            ));
        }

        let delay = request
            .publish_delay_ms
            .unwrap_or_else(|| Job::default_publish_delay(request.kind));
        let mut job = Job::new(request.kind, &request.content_prompt, delay);
        job.parent_page_id = request.parent_page_id;
        job.schedule = request.schedule.clone();

        let job_id = self.jobs.insert(job);

        if let Some(expression) = &request.schedule {
            let _ = self.jobs.modify(job_id, |j| j.status = JobStatus::Scheduled);
            self.register_job_trigger(job_id, expression).await?;
            tracing::info!(%job_id, schedule = %expression, "job scheduled");
        } else {
            tokio::spawn(self.pipeline.clone().run(job_id));
        }

        // Snapshot after the status update above
        let job = self
            .jobs
            .get(job_id)
            .ok_or(AutomationError::NotFound("job", job_id))?;
        self.events.emit(AutomationEvent::JobCreated { job: job.clone() });
        Ok(job)
    }

    async fn register_job_trigger(
        self: &Arc<Self>,
        job_id: Uuid,
        expression: &str,
    ) -> Result<(), AutomationError> {
        let weak = Arc::downgrade(self);
        let trigger = CronJob::new_async(expression, move |_uuid, _lock| {
            let weak = weak.clone();
            Box::pin(async move {
                let Some(engine) = weak.upgrade() else { return };
                engine.fire_scheduled_job(job_id).await;
            })
        })?;
        let trigger_id = self.cron.add(trigger).await?;
        self.job_triggers.lock().unwrap().insert(job_id, trigger_id);
        Ok(())
    }

    /// First (and only) firing of a creation-time schedule.
    async fn fire_scheduled_job(self: &Arc<Self>, job_id: Uuid) {
        self.remove_job_trigger(job_id).await;
        if self.jobs.get(job_id).is_none() {
            return;
        }
        tracing::info!(%job_id, "scheduled job triggered");
        tokio::spawn(self.pipeline.clone().run(job_id));
    }

    async fn remove_job_trigger(&self, job_id: Uuid) {
        let trigger = self.job_triggers.lock().unwrap().remove(&job_id);
        if let Some(trigger_id) = trigger {
            if let Err(err) = self.cron.remove(&trigger_id).await {
                tracing::warn!(%job_id, %err, "failed to remove job trigger");
            }
        }
    }

    pub fn get_job(&self, job_id: Uuid) -> Result<Job, AutomationError> {
        self.jobs
            .get(job_id)
            .ok_or(AutomationError::NotFound("job", job_id))
    }

    /// All jobs, newest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs = self.jobs.all();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn job_counters(&self) -> JobCounters {
        self.jobs.counters()
    }

    /// Patch a job that has not started running yet.
    pub fn update_job(&self, job_id: Uuid, patch: JobPatch) -> Result<Job, AutomationError> {
        let current = self.get_job(job_id)?;
        if !matches!(current.status, JobStatus::Pending | JobStatus::Scheduled) {
            return Err(AutomationError::Validation(
                "only pending or scheduled jobs can be edited".to_string(),
            ));
        }
        self.jobs
            .modify(job_id, move |j| {
                if let Some(prompt) = patch.content_prompt {
                    j.content_prompt = prompt;
                }
                if let Some(delay) = patch.publish_delay_ms {
                    j.publish_delay_ms = delay;
                }
            })
            .ok_or(AutomationError::NotFound("job", job_id))
    }

    /// Cancel a job at any point before its terminal state: removes
    /// its trigger, aborts its publish timer, and drops the record.
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<(), AutomationError> {
        self.remove_job_trigger(job_id).await;
        self.pipeline.abort_publish_timer(job_id);
        self.jobs
            .remove(job_id)
            .ok_or(AutomationError::NotFound("job", job_id))?;
        self.events.emit(AutomationEvent::JobCancelled { job_id });
        tracing::info!(%job_id, "job cancelled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Campaigns
    // ------------------------------------------------------------------

    pub async fn create_campaign(
        self: &Arc<Self>,
        config: CampaignConfig,
    ) -> Result<CampaignBundle, AutomationError> {
        let bundle = self.campaigns.create(config)?;
        if bundle.campaign.is_active {
            self.schedule_campaign(&bundle.campaign).await?;
        }
        self.events.emit(AutomationEvent::CampaignCreated {
            campaign: bundle.campaign.clone(),
        });
        tracing::info!(
            campaign_id = %bundle.campaign.id,
            name = %bundle.campaign.name,
            prompts = bundle.pool.len(),
            "campaign created"
        );
        Ok(bundle)
    }

    /// Register (or replace) the recurring trigger for a campaign.
    async fn schedule_campaign(self: &Arc<Self>, campaign: &Campaign) -> Result<(), AutomationError> {
        let expression = campaign.cron_expression();
        let campaign_id = campaign.id;
        let weak = Arc::downgrade(self);

        let trigger = CronJob::new_async(expression.as_str(), move |_uuid, _lock| {
            let weak = weak.clone();
            Box::pin(async move {
                let Some(engine) = weak.upgrade() else { return };
                if let Err(err) = engine.execute_campaign_step(campaign_id).await {
                    // Trigger keeps firing; the miss only shows up in stats
                    tracing::error!(%campaign_id, %err, "campaign step failed");
                    engine.campaigns.record_step_failure(campaign_id);
                }
            })
        })?;
        let trigger_id = self.cron.add(trigger).await?;

        let previous = self
            .campaign_triggers
            .lock()
            .unwrap()
            .insert(campaign_id, trigger_id);
        if let Some(old) = previous {
            if let Err(err) = self.cron.remove(&old).await {
                tracing::warn!(%campaign_id, %err, "failed to remove stale campaign trigger");
            }
        }
        tracing::info!(%campaign_id, %expression, "campaign trigger registered");
        Ok(())
    }

    async fn unschedule_campaign(&self, campaign_id: Uuid) {
        let trigger = self.campaign_triggers.lock().unwrap().remove(&campaign_id);
        if let Some(trigger_id) = trigger {
            if let Err(err) = self.cron.remove(&trigger_id).await {
                tracing::warn!(%campaign_id, %err, "failed to remove campaign trigger");
            }
        }
    }

    /// One campaign step: consume a prompt and launch its job.
    /// `Ok(None)` when the campaign is missing, inactive, or out of
    /// prompts. A non-looping campaign that exhausts its pool pauses
    /// itself and loses its trigger.
    pub async fn execute_campaign_step(
        self: &Arc<Self>,
        campaign_id: Uuid,
    ) -> Result<Option<Job>, AutomationError> {
        match self.campaigns.next_job_request(campaign_id) {
            StepOutcome::Unavailable => Ok(None),
            StepOutcome::Exhausted { paused } => {
                if paused {
                    self.unschedule_campaign(campaign_id).await;
                    self.events.emit(AutomationEvent::CampaignStatusChanged {
                        campaign_id,
                        status: CampaignStatus::Paused,
                    });
                    tracing::info!(%campaign_id, "campaign exhausted its pool and paused");
                }
                Ok(None)
            }
            StepOutcome::Ready(request) => {
                let mut job = Job::new(request.kind, &request.content_prompt, request.publish_delay_ms);
                job.parent_page_id = request.parent_page_id;
                job.campaign = Some(request.campaign);
                let job_id = self.jobs.insert(job.clone());

                self.events.emit(AutomationEvent::JobCreated { job: job.clone() });
                tokio::spawn(self.pipeline.clone().run(job_id));
                Ok(Some(job))
            }
        }
    }

    pub fn get_campaign(&self, campaign_id: Uuid) -> Result<CampaignBundle, AutomationError> {
        self.campaigns
            .bundle(campaign_id)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))
    }

    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns = self.campaigns.list();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn campaign_stats(&self, campaign_id: Uuid) -> Result<CampaignStatsView, AutomationError> {
        self.campaigns
            .stats_view(campaign_id)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))
    }

    pub async fn pause_campaign(&self, campaign_id: Uuid) -> Result<Campaign, AutomationError> {
        let campaign = self
            .campaigns
            .pause(campaign_id)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))?;
        self.unschedule_campaign(campaign_id).await;
        self.events.emit(AutomationEvent::CampaignStatusChanged {
            campaign_id,
            status: CampaignStatus::Paused,
        });
        tracing::info!(%campaign_id, "campaign paused");
        Ok(campaign)
    }

    pub async fn resume_campaign(
        self: &Arc<Self>,
        campaign_id: Uuid,
    ) -> Result<Campaign, AutomationError> {
        let campaign = self
            .campaigns
            .resume(campaign_id)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))?;
        self.schedule_campaign(&campaign).await?;
        self.events.emit(AutomationEvent::CampaignStatusChanged {
            campaign_id,
            status: CampaignStatus::Active,
        });
        tracing::info!(%campaign_id, "campaign resumed");
        Ok(campaign)
    }

    /// Patch a campaign; re-derives its trigger when schedule fields
    /// change while active.
    pub async fn update_campaign(
        self: &Arc<Self>,
        campaign_id: Uuid,
        patch: CampaignPatch,
    ) -> Result<Campaign, AutomationError> {
        let (campaign, reschedule) = self
            .campaigns
            .update(campaign_id, patch)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))?;
        if reschedule {
            self.schedule_campaign(&campaign).await?;
        }
        self.events.emit(AutomationEvent::CampaignUpdated {
            campaign: campaign.clone(),
        });
        Ok(campaign)
    }

    pub async fn delete_campaign(&self, campaign_id: Uuid) -> Result<Campaign, AutomationError> {
        self.unschedule_campaign(campaign_id).await;
        let campaign = self
            .campaigns
            .delete(campaign_id)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))?;
        self.events
            .emit(AutomationEvent::CampaignDeleted { campaign_id });
        tracing::info!(%campaign_id, "campaign deleted");
        Ok(campaign)
    }

    /// Append prompts to a campaign's pool without disturbing its
    /// rotation.
    pub fn add_prompts(
        &self,
        campaign_id: Uuid,
        prompts: &[String],
    ) -> Result<Vec<PromptEntry>, AutomationError> {
        if prompts.is_empty() {
            return Err(AutomationError::Validation(
                "prompt list is empty".to_string(),
            ));
        }
        let added = self
            .campaigns
            .add_prompts(campaign_id, prompts)
            .ok_or(AutomationError::NotFound("campaign", campaign_id))?;
        self.events.emit(AutomationEvent::PromptsAdded {
            campaign_id,
            prompts: added.clone(),
        });
        Ok(added)
    }

    // ------------------------------------------------------------------
    // Publishing target passthrough
    // ------------------------------------------------------------------

    /// Pages on the target usable as parents for new page jobs.
    pub async fn list_parent_pages(&self) -> anyhow::Result<Vec<ParentPage>> {
        self.deps.publisher.list_parent_pages().await
    }
}
