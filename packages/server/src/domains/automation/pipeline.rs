//! Pipeline executor: runs one job through content, metadata, images,
//! and publish.
//!
//! Stage semantics:
//! - content generation failure fails the job;
//! - metadata and placement steps never fail the job, they degrade to
//!   deterministic fallbacks;
//! - image generation and upload failures fail the job (all-or-none
//!   within the fan-out);
//! - articles are always created as drafts and published by a timer,
//!   pages with no delay are created live and skip the timer.
//!
//! A job disappearing from the store mid-run means it was cancelled;
//! the executor stops silently without resurrecting state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::try_join_all;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::kernel::{
    BaseContentGenerator, BasePublisher, EventHub, PageDraft, PostDraft,
};

use super::assembler;
use super::events::AutomationEvent;
use super::job::{
    FeaturedImage, GeneratedImage, Job, JobKind, JobStatus, Stage, StageStatus, UploadedImage,
};
use super::job_store::JobStore;
use super::metadata::{
    self, ArticleMetadata, PageMetadata, Parsed, Placement,
};
use super::scheduler::CampaignScheduler;

/// Why a pipeline run stopped early.
enum Halt {
    /// Job vanished from the store; someone cancelled it
    Cancelled,
    Failed(anyhow::Error),
}

type StepResult<T> = Result<T, Halt>;

fn step<T>(result: anyhow::Result<T>) -> StepResult<T> {
    result.map_err(Halt::Failed)
}

#[derive(Clone)]
pub struct PipelineExecutor {
    generator: Arc<dyn BaseContentGenerator>,
    publisher: Arc<dyn BasePublisher>,
    jobs: JobStore,
    campaigns: CampaignScheduler,
    events: EventHub<AutomationEvent>,
    publish_timers: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl PipelineExecutor {
    pub fn new(
        generator: Arc<dyn BaseContentGenerator>,
        publisher: Arc<dyn BasePublisher>,
        jobs: JobStore,
        campaigns: CampaignScheduler,
        events: EventHub<AutomationEvent>,
    ) -> Self {
        Self {
            generator,
            publisher,
            jobs,
            campaigns,
            events,
            publish_timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run a job through the full pipeline. Consumes one spawned task;
    /// deferred publishing continues in its own timer task after this
    /// returns.
    pub async fn run(self: Arc<Self>, job_id: Uuid) {
        let Some(job) = self.jobs.get(job_id) else {
            tracing::warn!(%job_id, "pipeline started for unknown job");
            return;
        };

        let started = Instant::now();
        self.jobs.mark_active(job_id);
        let Some(job) = self.jobs.modify(job_id, |j| {
            j.status = JobStatus::Running;
            j.started_at = Some(Utc::now());
        }) else {
            return;
        };
        self.events.emit(AutomationEvent::JobStarted { job: job.clone() });
        tracing::info!(%job_id, kind = ?job.kind, prompt = %job.content_prompt, "job started");

        let result = match job.kind {
            JobKind::Article => self.run_article(&job, started).await,
            JobKind::Page => self.run_page(&job, started).await,
        };

        match result {
            Ok(()) => {}
            Err(Halt::Cancelled) => {
                tracing::info!(%job_id, "job cancelled mid-pipeline");
            }
            Err(Halt::Failed(err)) => self.fail_job(job_id, started, err),
        }
    }

    /// Abort and forget the deferred-publish timer for a job, if any.
    pub fn abort_publish_timer(&self, job_id: Uuid) {
        if let Some(handle) = self.publish_timers.lock().unwrap().remove(&job_id) {
            handle.abort();
        }
    }

    // ------------------------------------------------------------------
    // Article pipeline
    // ------------------------------------------------------------------

    async fn run_article(self: &Arc<Self>, job: &Job, started: Instant) -> StepResult<()> {
        let job_id = job.id;

        // Stage 1: content
        self.progress(job_id, Stage::Content, StageStatus::Generating)?;
        let content = step(self.generator.generate_article(&job.content_prompt).await)?;
        self.modify(job_id, {
            let content = content.clone();
            move |j| j.generated_content = Some(content)
        })?;
        self.progress(job_id, Stage::Content, StageStatus::Completed)?;
        tracing::info!(%job_id, chars = content.len(), "article content generated");

        // Stage 2: metadata, degrading to fallback values on any error
        self.progress(job_id, Stage::Metadata, StageStatus::Generating)?;
        let parsed = match self.generator.extract_article_metadata_json(&content).await {
            Ok(raw) => metadata::parse_article_metadata(&raw),
            Err(err) => {
                tracing::warn!(%job_id, %err, "metadata extraction failed, using fallback");
                Parsed::Fallback(ArticleMetadata::fallback())
            }
        };
        let meta = parsed.into_inner();
        self.modify(job_id, {
            let meta = meta.clone();
            move |j| {
                j.title = Some(meta.title);
                j.category = Some(meta.category);
                j.tags = meta.tags;
                j.image_prompts = meta.image_prompts;
                j.featured_image_prompt = Some(meta.featured_image_prompt);
            }
        })?;
        self.progress(job_id, Stage::Metadata, StageStatus::Completed)?;
        if let Ok(value) = serde_json::to_value(&meta) {
            self.events.emit(AutomationEvent::MetadataExtracted {
                job_id,
                metadata: value,
            });
        }

        // Stage 3: images (featured first, then content images in
        // parallel, ordinal order preserved)
        self.progress(job_id, Stage::Images, StageStatus::Generating)?;
        let featured = self
            .generate_featured(job_id, &meta.featured_image_prompt)
            .await?;
        let generated = self.generate_content_images(job_id, &meta.image_prompts).await?;
        self.modify(job_id, {
            let generated = generated.clone();
            move |j| j.generated_images = generated
        })?;
        self.progress(job_id, Stage::Images, StageStatus::Completed)?;

        // Stage 4: upload, placement, assembly, draft creation
        self.progress(job_id, Stage::Publish, StageStatus::Creating)?;
        let featured_media = step(
            self.publisher
                .upload_image(
                    &featured.reference,
                    &format!("featured-{}.jpg", job_id),
                    &featured.prompt,
                )
                .await,
        )?;
        self.modify(job_id, move |j| j.featured_media_id = Some(featured_media.id))?;

        let uploaded = self
            .upload_content_images(&generated, &format!("content-{}", job_id))
            .await?;
        self.modify(job_id, {
            let uploaded = uploaded.clone();
            move |j| j.uploaded_images = uploaded
        })?;

        let placements = self.article_placements(&content, generated.len()).await;
        let final_content = assembler::assemble_article(&content, &uploaded, &placements);
        self.modify(job_id, {
            let final_content = final_content.clone();
            move |j| j.final_content = Some(final_content)
        })?;

        let post_id = step(
            self.publisher
                .create_post(PostDraft {
                    title: meta.title.clone(),
                    content: final_content,
                    publish: false,
                    categories: vec![meta.category.clone()],
                    tags: meta.tags.clone(),
                    featured_media: Some(featured_media.id),
                })
                .await,
        )?;
        self.modify(job_id, move |j| j.content_item_id = Some(post_id))?;
        tracing::info!(%job_id, post_id, "draft post created");

        // Articles always publish through the timer, even with zero
        // delay.
        self.schedule_publish(job_id, post_id, JobKind::Article, job.publish_delay_ms, started)
    }

    // ------------------------------------------------------------------
    // Page pipeline
    // ------------------------------------------------------------------

    async fn run_page(self: &Arc<Self>, job: &Job, started: Instant) -> StepResult<()> {
        let job_id = job.id;
        let immediate = job.publish_delay_ms == 0;

        self.progress(job_id, Stage::Content, StageStatus::Generating)?;
        let content = step(self.generator.generate_page(&job.content_prompt).await)?;
        self.modify(job_id, {
            let content = content.clone();
            move |j| j.generated_content = Some(content)
        })?;
        self.progress(job_id, Stage::Content, StageStatus::Completed)?;
        tracing::info!(%job_id, chars = content.len(), "page content generated");

        self.progress(job_id, Stage::Metadata, StageStatus::Generating)?;
        let parsed = match self.generator.extract_page_metadata_json(&content).await {
            Ok(raw) => metadata::parse_page_metadata(&raw),
            Err(err) => {
                tracing::warn!(%job_id, %err, "page metadata extraction failed, using fallback");
                Parsed::Fallback(PageMetadata::fallback())
            }
        };
        let meta = parsed.into_inner();
        self.modify(job_id, {
            let meta = meta.clone();
            move |j| {
                j.title = Some(meta.title);
                j.slug = Some(meta.slug);
                j.meta_description = Some(meta.meta_description);
                j.page_type = Some(meta.page_type);
                j.image_prompts = meta.image_prompts;
                j.featured_image_prompt = Some(meta.featured_image_prompt);
            }
        })?;
        self.progress(job_id, Stage::Metadata, StageStatus::Completed)?;
        if let Ok(value) = serde_json::to_value(&meta) {
            self.events.emit(AutomationEvent::MetadataExtracted {
                job_id,
                metadata: value,
            });
        }

        self.progress(job_id, Stage::Images, StageStatus::Generating)?;
        let featured = self
            .generate_featured(job_id, &meta.featured_image_prompt)
            .await?;
        let generated = self.generate_content_images(job_id, &meta.image_prompts).await?;
        self.modify(job_id, {
            let generated = generated.clone();
            move |j| j.generated_images = generated
        })?;
        self.progress(job_id, Stage::Images, StageStatus::Completed)?;

        self.progress(job_id, Stage::Publish, StageStatus::Creating)?;
        let featured_media = step(
            self.publisher
                .upload_image(
                    &featured.reference,
                    &format!("page-featured-{}.jpg", job_id),
                    &featured.prompt,
                )
                .await,
        )?;
        self.modify(job_id, move |j| j.featured_media_id = Some(featured_media.id))?;

        let uploaded = self
            .upload_content_images(&generated, &format!("page-content-{}", job_id))
            .await?;
        self.modify(job_id, {
            let uploaded = uploaded.clone();
            move |j| j.uploaded_images = uploaded
        })?;

        let placements = self.page_placements(&content, generated.len()).await;
        let final_content = assembler::assemble_page(&content, &uploaded, &placements);
        self.modify(job_id, {
            let final_content = final_content.clone();
            move |j| j.final_content = Some(final_content)
        })?;

        let page_id = step(
            self.publisher
                .create_page(PageDraft {
                    title: meta.title.clone(),
                    content: final_content,
                    // Zero-delay pages go live at creation
                    publish: immediate,
                    parent: job.parent_page_id,
                    featured_media: Some(featured_media.id),
                })
                .await,
        )?;
        self.modify(job_id, move |j| j.content_item_id = Some(page_id))?;
        tracing::info!(%job_id, page_id, immediate, "page created");

        if immediate {
            self.finalize_published(job_id, started);
            Ok(())
        } else {
            self.schedule_publish(job_id, page_id, JobKind::Page, job.publish_delay_ms, started)
        }
    }

    // ------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------

    async fn generate_featured(
        self: &Arc<Self>,
        job_id: Uuid,
        prompt: &str,
    ) -> StepResult<FeaturedImage> {
        let reference = step(self.generator.generate_image(prompt).await)?;
        let featured = FeaturedImage {
            prompt: prompt.to_string(),
            reference: reference.clone(),
        };
        self.modify(job_id, {
            let featured = featured.clone();
            move |j| j.featured_image = Some(featured)
        })?;
        self.events.emit(AutomationEvent::ImageGenerated {
            job_id,
            index: None,
            reference,
        });
        Ok(featured)
    }

    async fn generate_content_images(
        self: &Arc<Self>,
        job_id: Uuid,
        prompts: &[String],
    ) -> StepResult<Vec<GeneratedImage>> {
        let generated = try_join_all(prompts.iter().enumerate().map(|(index, prompt)| {
            let generator = self.generator.clone();
            let events = self.events.clone();
            let prompt = prompt.clone();
            async move {
                let reference = generator.generate_image(&prompt).await?;
                events.emit(AutomationEvent::ImageGenerated {
                    job_id,
                    index: Some(index),
                    reference: reference.clone(),
                });
                anyhow::Ok(GeneratedImage {
                    prompt,
                    reference,
                    index,
                })
            }
        }))
        .await;
        step(generated)
    }

    async fn upload_content_images(
        &self,
        generated: &[GeneratedImage],
        filename_prefix: &str,
    ) -> StepResult<Vec<UploadedImage>> {
        let uploaded = try_join_all(generated.iter().map(|image| {
            let publisher = self.publisher.clone();
            let image = image.clone();
            let filename = format!("{}-{}.jpg", filename_prefix, image.index);
            async move {
                let media = publisher
                    .upload_image(&image.reference, &filename, &image.prompt)
                    .await?;
                anyhow::Ok(UploadedImage {
                    prompt: image.prompt,
                    reference: image.reference,
                    index: image.index,
                    media_id: media.id,
                    media_url: media.url,
                })
            }
        }))
        .await;
        step(uploaded)
    }

    /// Placement suggestions never fail the job; a generator error
    /// degrades to the even fallback distribution.
    async fn article_placements(&self, content: &str, image_count: usize) -> Vec<Placement> {
        let units = assembler::article_unit_count(content);
        match self
            .generator
            .suggest_article_placements_json(content, image_count)
            .await
        {
            Ok(raw) => metadata::parse_placements(&raw, image_count, units, false).into_inner(),
            Err(err) => {
                tracing::warn!(%err, "placement suggestion failed, distributing evenly");
                metadata::fallback_placements(image_count, units, false)
            }
        }
    }

    async fn page_placements(&self, content: &str, image_count: usize) -> Vec<Placement> {
        let units = assembler::page_unit_count(content);
        match self
            .generator
            .suggest_page_placements_json(content, image_count)
            .await
        {
            Ok(raw) => metadata::parse_placements(&raw, image_count, units, true).into_inner(),
            Err(err) => {
                tracing::warn!(%err, "page placement suggestion failed, distributing evenly");
                metadata::fallback_placements(image_count, units, true)
            }
        }
    }

    /// Mark the job deferred and start its publish timer. The timer
    /// re-checks job existence when it fires, so a cancellation racing
    /// the sleep ends the task without a publish call.
    fn schedule_publish(
        self: &Arc<Self>,
        job_id: Uuid,
        item_id: u64,
        kind: JobKind,
        delay_ms: u64,
        started: Instant,
    ) -> StepResult<()> {
        self.modify(job_id, |j| {
            j.status = JobStatus::ScheduledForPublish;
            j.progress.set(Stage::Publish, StageStatus::Scheduled);
        })?;
        self.events.emit(AutomationEvent::ProgressUpdated {
            job_id,
            stage: Stage::Publish,
            status: StageStatus::Scheduled,
        });
        tracing::info!(%job_id, item_id, delay_ms, "publish scheduled");

        let executor = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;

            if executor.jobs.get(job_id).is_none() {
                executor.publish_timers.lock().unwrap().remove(&job_id);
                return;
            }

            let result = match kind {
                JobKind::Article => executor.publisher.publish_post(item_id).await,
                JobKind::Page => executor.publisher.publish_page(item_id).await,
            };
            match result {
                Ok(()) => executor.finalize_published(job_id, started),
                Err(err) => executor.fail_job(job_id, started, err),
            }
            executor.publish_timers.lock().unwrap().remove(&job_id);
        });
        self.publish_timers.lock().unwrap().insert(job_id, handle);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Terminal transitions
    // ------------------------------------------------------------------

    fn finalize_published(&self, job_id: Uuid, started: Instant) {
        let Some(job) = self.jobs.modify(job_id, |j| {
            j.status = JobStatus::Published;
            j.published_at = Some(Utc::now());
            j.progress.set(Stage::Publish, StageStatus::Published);
        }) else {
            self.jobs.clear_active(job_id);
            return;
        };

        tracing::info!(%job_id, title = ?job.title, "job published");
        self.events.emit(AutomationEvent::JobCompleted { job: job.clone() });

        if let Some(link) = &job.campaign {
            // Execution time includes the publish delay, measured from
            // pipeline start
            self.campaigns.update_execution_stats(
                link.campaign_id,
                true,
                started.elapsed().as_millis() as u64,
            );
            self.events.emit(AutomationEvent::CampaignJobCompleted {
                campaign_id: link.campaign_id,
                job_id,
                prompt_index: link.prompt_index,
            });
        }
        self.jobs.clear_active(job_id);
    }

    fn fail_job(&self, job_id: Uuid, started: Instant, err: anyhow::Error) {
        tracing::error!(%job_id, error = %err, "job failed");
        let Some(job) = self.jobs.modify(job_id, |j| {
            j.status = JobStatus::Failed;
            j.error = Some(err.to_string());
            j.failed_at = Some(Utc::now());
        }) else {
            self.jobs.clear_active(job_id);
            return;
        };

        self.events.emit(AutomationEvent::JobFailed { job: job.clone() });

        if let Some(link) = &job.campaign {
            self.campaigns.update_execution_stats(
                link.campaign_id,
                false,
                started.elapsed().as_millis() as u64,
            );
        }
        self.jobs.clear_active(job_id);
    }

    // ------------------------------------------------------------------
    // Store helpers
    // ------------------------------------------------------------------

    fn modify<F>(&self, job_id: Uuid, f: F) -> StepResult<Job>
    where
        F: FnOnce(&mut Job),
    {
        self.jobs.modify(job_id, f).ok_or(Halt::Cancelled)
    }

    fn progress(&self, job_id: Uuid, stage: Stage, status: StageStatus) -> StepResult<Job> {
        let job = self.modify(job_id, move |j| j.progress.set(stage, status))?;
        self.events.emit(AutomationEvent::ProgressUpdated {
            job_id,
            stage,
            status,
        });
        Ok(job)
    }
}
