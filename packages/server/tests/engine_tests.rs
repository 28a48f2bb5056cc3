// End-to-end engine tests with mock generator and publisher.

use std::sync::Arc;
use std::time::Duration;

use automation_core::domains::automation::{
    AutomationEngine, AutomationError, CampaignConfig, Frequency, JobKind, JobStatus, NewJob,
};
use automation_core::kernel::test_dependencies::{MockContentGenerator, MockPublisher};
use automation_core::kernel::EngineDeps;
use uuid::Uuid;

fn engine_deps(
    generator: MockContentGenerator,
    publisher: MockPublisher,
) -> (EngineDeps, Arc<MockContentGenerator>, Arc<MockPublisher>) {
    let generator = Arc::new(generator);
    let publisher = Arc::new(publisher);
    (
        EngineDeps::new(generator.clone(), publisher.clone()),
        generator,
        publisher,
    )
}

/// Poll until the job reaches the wanted status or the timeout hits.
async fn wait_for_status(engine: &Arc<AutomationEngine>, job_id: Uuid, status: JobStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = engine.get_job(job_id).expect("job disappeared while waiting");
        if job.status == status {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {:?}, job is {:?} (error: {:?})",
            status,
            job.status,
            job.error
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn campaign_config(prompts: &[&str], kind: JobKind) -> CampaignConfig {
    CampaignConfig {
        name: "test campaign".to_string(),
        prompts: prompts.iter().map(|p| p.to_string()).collect(),
        kind,
        frequency: Frequency::Custom,
        items_per_day: 1,
        // Far-future trigger so only manual steps run during the test
        custom_cron: Some("0 0 0 1 1 *".to_string()),
        publish_delay_ms: Some(0),
        is_active: true,
        is_looping: false,
        parent_page_id: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn article_job_publishes_after_delay() {
    let (deps, _generator, publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "rust async patterns".to_string(),
            publish_delay_ms: Some(50),
            ..Default::default()
        })
        .await
        .unwrap();

    // Draft first, live later
    wait_for_status(&engine, job.id, JobStatus::ScheduledForPublish).await;
    let drafts = publisher.post_drafts();
    assert_eq!(drafts.len(), 1);
    assert!(!drafts[0].publish);
    assert_eq!(drafts[0].title, "Mock Article");
    assert_eq!(drafts[0].categories, vec!["Testing".to_string()]);
    assert!(publisher.published_posts().is_empty());

    wait_for_status(&engine, job.id, JobStatus::Published).await;
    assert_eq!(publisher.published_posts().len(), 1);

    let job = engine.get_job(job.id).unwrap();
    assert!(job.published_at.is_some());
    assert!(job.final_content.is_some());
    assert!(job.content_item_id.is_some());
    assert!(job.featured_media_id.is_some());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_delay_article_still_goes_through_draft_then_publish() {
    let (deps, _generator, publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "zero delay article".to_string(),
            publish_delay_ms: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::Published).await;
    // Created as draft, flipped by the (immediate) timer
    assert!(!publisher.post_drafts()[0].publish);
    assert_eq!(publisher.published_posts().len(), 1);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_delay_page_is_created_live_and_never_deferred() {
    let (deps, _generator, publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Page,
            content_prompt: "about us".to_string(),
            publish_delay_ms: Some(0),
            parent_page_id: Some(7),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::Published).await;

    let drafts = publisher.page_drafts();
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].publish, "zero-delay page is created already live");
    assert_eq!(drafts[0].parent, Some(7));
    // The publish endpoint is never called for it
    assert!(publisher.published_pages().is_empty());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn delayed_page_defers_like_an_article() {
    let (deps, _generator, publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Page,
            content_prompt: "faq".to_string(),
            publish_delay_ms: Some(50),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::ScheduledForPublish).await;
    assert!(!publisher.page_drafts()[0].publish);

    wait_for_status(&engine, job.id, JobStatus::Published).await;
    assert_eq!(publisher.published_pages().len(), 1);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn content_failure_marks_job_failed() {
    let (deps, _generator, publisher) = engine_deps(
        MockContentGenerator::new().failing_content(),
        MockPublisher::new(),
    );
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "doomed".to_string(),
            publish_delay_ms: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::Failed).await;
    let job = engine.get_job(job.id).unwrap();
    assert!(job.error.as_deref().unwrap().contains("mock content failure"));
    assert!(job.failed_at.is_some());
    assert!(publisher.post_drafts().is_empty());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_metadata_falls_back_instead_of_failing() {
    let (deps, _generator, publisher) = engine_deps(
        MockContentGenerator::new().with_article_metadata_json("not json at all"),
        MockPublisher::new(),
    );
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "resilient".to_string(),
            publish_delay_ms: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::Published).await;
    assert_eq!(publisher.post_drafts()[0].title, "Generated Article");
    assert_eq!(publisher.post_drafts()[0].categories, vec!["General".to_string()]);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_scheduled_job_is_gone() {
    let (deps, _generator, _publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "someday".to_string(),
            schedule: Some("0 0 0 1 1 *".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Scheduled);

    engine.cancel_job(job.id).await.unwrap();
    assert!(matches!(
        engine.get_job(job.id),
        Err(AutomationError::NotFound("job", _))
    ));
    // Double cancel reports not found
    assert!(engine.cancel_job(job.id).await.is_err());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_deferred_job_prevents_publishing() {
    let (deps, _generator, publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let job = engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "pulled back".to_string(),
            publish_delay_ms: Some(30_000),
            ..Default::default()
        })
        .await
        .unwrap();

    wait_for_status(&engine, job.id, JobStatus::ScheduledForPublish).await;
    engine.cancel_job(job.id).await.unwrap();

    // Give any stray timer a moment; nothing may publish
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(publisher.published_posts().is_empty());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn campaign_step_launches_job_and_records_stats() {
    let (deps, _generator, _publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let bundle = engine
        .create_campaign(campaign_config(&["first prompt", "second prompt"], JobKind::Article))
        .await
        .unwrap();
    let campaign_id = bundle.campaign.id;

    let job = engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .expect("step should launch a job");
    let link = job.campaign.clone().expect("job carries campaign link");
    assert_eq!(link.campaign_id, campaign_id);
    assert_eq!(link.prompt_index, 0);
    assert_eq!(job.content_prompt, "first prompt");

    wait_for_status(&engine, job.id, JobStatus::Published).await;

    let stats = engine.campaign_stats(campaign_id).unwrap();
    assert_eq!(stats.stats.total_executions, 1);
    assert_eq!(stats.stats.successful_executions, 1);
    assert_eq!(stats.total_generated, 1);
    assert_eq!(stats.current_prompt_index, 1);
    assert_eq!(stats.progress_percentage, 50);

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_non_looping_campaign_pauses() {
    let (deps, _generator, _publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let bundle = engine
        .create_campaign(campaign_config(&["only prompt"], JobKind::Article))
        .await
        .unwrap();
    let campaign_id = bundle.campaign.id;

    let job = engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .expect("first step launches");
    wait_for_status(&engine, job.id, JobStatus::Published).await;

    let second = engine.execute_campaign_step(campaign_id).await.unwrap();
    assert!(second.is_none());

    let campaign = engine.get_campaign(campaign_id).unwrap().campaign;
    assert!(!campaign.is_active);

    // Further steps are no-ops while paused
    assert!(engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .is_none());

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_campaign_job_still_consumes_the_prompt() {
    let (deps, _generator, _publisher) = engine_deps(
        MockContentGenerator::new().failing_images(),
        MockPublisher::new(),
    );
    let engine = AutomationEngine::start(deps).await.unwrap();

    let bundle = engine
        .create_campaign(campaign_config(&["p0", "p1"], JobKind::Article))
        .await
        .unwrap();
    let campaign_id = bundle.campaign.id;

    let job = engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .expect("step launches despite doomed pipeline");
    wait_for_status(&engine, job.id, JobStatus::Failed).await;

    let stats = engine.campaign_stats(campaign_id).unwrap();
    assert_eq!(stats.stats.total_executions, 1);
    assert_eq!(stats.stats.failed_executions, 1);
    assert_eq!(stats.stats.successful_executions, 0);
    // The prompt slot was spent on the attempt
    assert_eq!(stats.current_prompt_index, 1);
    assert_eq!(stats.total_generated, 1);

    // Next step moves on to the following prompt
    let next = engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .expect("second prompt available");
    assert_eq!(next.content_prompt, "p1");

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn paused_campaign_skips_steps_until_resumed() {
    let (deps, _generator, _publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let mut config = campaign_config(&["a", "b"], JobKind::Article);
    config.is_looping = true;
    let bundle = engine.create_campaign(config).await.unwrap();
    let campaign_id = bundle.campaign.id;

    engine.pause_campaign(campaign_id).await.unwrap();
    assert!(engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .is_none());

    engine.resume_campaign(campaign_id).await.unwrap();
    let job = engine
        .execute_campaign_step(campaign_id)
        .await
        .unwrap()
        .expect("resumed campaign steps again");
    wait_for_status(&engine, job.id, JobStatus::Published).await;

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn parent_pages_come_from_the_publisher() {
    let (deps, _generator, _publisher) = engine_deps(
        MockContentGenerator::new(),
        MockPublisher::new().with_parent_pages(vec![(3, "Docs"), (9, "Blog")]),
    );
    let engine = AutomationEngine::start(deps).await.unwrap();

    let pages = engine.list_parent_pages().await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].id, 3);
    assert_eq!(pages[1].title, "Blog");

    engine.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn job_counters_reflect_lifecycle() {
    let (deps, _generator, _publisher) =
        engine_deps(MockContentGenerator::new(), MockPublisher::new());
    let engine = AutomationEngine::start(deps).await.unwrap();

    let published = engine
        .create_job(NewJob {
            kind: JobKind::Page,
            content_prompt: "done".to_string(),
            publish_delay_ms: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();
    wait_for_status(&engine, published.id, JobStatus::Published).await;

    engine
        .create_job(NewJob {
            kind: JobKind::Article,
            content_prompt: "waiting".to_string(),
            schedule: Some("0 0 0 1 1 *".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let counters = engine.job_counters();
    assert_eq!(counters.total, 2);
    assert_eq!(counters.published, 1);

    engine.shutdown().await.unwrap();
}
