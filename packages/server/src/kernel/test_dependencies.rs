// TestDependencies - mock implementations for testing
//
// Provides mock generator and publisher implementations that can be
// injected into the engine for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::traits::{
    BaseContentGenerator, BasePublisher, PageDraft, ParentPage, PostDraft, UploadedMedia,
};

// =============================================================================
// Mock Content Generator
// =============================================================================

pub struct MockContentGenerator {
    article: Mutex<String>,
    page: Mutex<String>,
    article_metadata_json: Mutex<String>,
    page_metadata_json: Mutex<String>,
    article_placements_json: Mutex<String>,
    page_placements_json: Mutex<String>,
    fail_content: Mutex<bool>,
    fail_images: Mutex<bool>,
    image_calls: Mutex<Vec<String>>,
    content_calls: Mutex<Vec<String>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self {
            article: Mutex::new("Intro paragraph.\n\nSecond paragraph.\n\nThird paragraph.".to_string()),
            page: Mutex::new("<h1>Title</h1><h2>Section</h2><p>Body</p>".to_string()),
            article_metadata_json: Mutex::new(
                r#"{"title":"Mock Article","category":"Testing","tags":["mock"],"imagePrompts":["inline art"],"featuredImagePrompt":"hero art"}"#
                    .to_string(),
            ),
            page_metadata_json: Mutex::new(
                r#"{"title":"Mock Page","slug":"mock-page","metaDescription":"A mock page.","pageType":"landing","imagePrompts":["page art"],"featuredImagePrompt":"page hero"}"#
                    .to_string(),
            ),
            article_placements_json: Mutex::new(r#"[{"position":0,"context":"after intro"}]"#.to_string()),
            page_placements_json: Mutex::new(
                r#"[{"position":1,"context":"after heading","size":"full-width"}]"#.to_string(),
            ),
            fail_content: Mutex::new(false),
            fail_images: Mutex::new(false),
            image_calls: Mutex::new(Vec::new()),
            content_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_article(self, content: &str) -> Self {
        *self.article.lock().unwrap() = content.to_string();
        self
    }

    pub fn with_page(self, content: &str) -> Self {
        *self.page.lock().unwrap() = content.to_string();
        self
    }

    pub fn with_article_metadata_json(self, json: &str) -> Self {
        *self.article_metadata_json.lock().unwrap() = json.to_string();
        self
    }

    pub fn with_page_metadata_json(self, json: &str) -> Self {
        *self.page_metadata_json.lock().unwrap() = json.to_string();
        self
    }

    pub fn with_article_placements_json(self, json: &str) -> Self {
        *self.article_placements_json.lock().unwrap() = json.to_string();
        self
    }

    pub fn with_page_placements_json(self, json: &str) -> Self {
        *self.page_placements_json.lock().unwrap() = json.to_string();
        self
    }

    /// Make content generation fail
    pub fn failing_content(self) -> Self {
        *self.fail_content.lock().unwrap() = true;
        self
    }

    /// Make image generation fail
    pub fn failing_images(self) -> Self {
        *self.fail_images.lock().unwrap() = true;
        self
    }

    /// Prompts passed to generate_image, in call order
    pub fn image_calls(&self) -> Vec<String> {
        self.image_calls.lock().unwrap().clone()
    }

    /// Prompts passed to generate_article / generate_page
    pub fn content_calls(&self) -> Vec<String> {
        self.content_calls.lock().unwrap().clone()
    }
}

impl Default for MockContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentGenerator for MockContentGenerator {
    async fn generate_article(&self, prompt: &str) -> Result<String> {
        self.content_calls.lock().unwrap().push(prompt.to_string());
        if *self.fail_content.lock().unwrap() {
            return Err(anyhow!("mock content failure"));
        }
        Ok(self.article.lock().unwrap().clone())
    }

    async fn generate_page(&self, prompt: &str) -> Result<String> {
        self.content_calls.lock().unwrap().push(prompt.to_string());
        if *self.fail_content.lock().unwrap() {
            return Err(anyhow!("mock content failure"));
        }
        Ok(self.page.lock().unwrap().clone())
    }

    async fn extract_article_metadata_json(&self, _content: &str) -> Result<String> {
        Ok(self.article_metadata_json.lock().unwrap().clone())
    }

    async fn extract_page_metadata_json(&self, _content: &str) -> Result<String> {
        Ok(self.page_metadata_json.lock().unwrap().clone())
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        self.image_calls.lock().unwrap().push(prompt.to_string());
        if *self.fail_images.lock().unwrap() {
            return Err(anyhow!("mock image failure"));
        }
        Ok(format!("image://{}", prompt))
    }

    async fn suggest_article_placements_json(
        &self,
        _content: &str,
        _image_count: usize,
    ) -> Result<String> {
        Ok(self.article_placements_json.lock().unwrap().clone())
    }

    async fn suggest_page_placements_json(
        &self,
        _content: &str,
        _image_count: usize,
    ) -> Result<String> {
        Ok(self.page_placements_json.lock().unwrap().clone())
    }
}

// =============================================================================
// Mock Publisher
// =============================================================================

/// Arguments captured from an upload_image call
#[derive(Debug, Clone)]
pub struct UploadCallArgs {
    pub source: String,
    pub filename: String,
    pub alt_text: String,
}

pub struct MockPublisher {
    next_media_id: AtomicU64,
    uploads: Mutex<Vec<UploadCallArgs>>,
    post_drafts: Mutex<Vec<PostDraft>>,
    page_drafts: Mutex<Vec<PageDraft>>,
    published_posts: Mutex<Vec<u64>>,
    published_pages: Mutex<Vec<u64>>,
    parent_pages: Mutex<Vec<ParentPage>>,
    fail_create: Mutex<bool>,
    fail_publish: Mutex<bool>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            next_media_id: AtomicU64::new(100),
            uploads: Mutex::new(Vec::new()),
            post_drafts: Mutex::new(Vec::new()),
            page_drafts: Mutex::new(Vec::new()),
            published_posts: Mutex::new(Vec::new()),
            published_pages: Mutex::new(Vec::new()),
            parent_pages: Mutex::new(vec![ParentPage {
                id: 1,
                title: "Home".to_string(),
            }]),
            fail_create: Mutex::new(false),
            fail_publish: Mutex::new(false),
        }
    }

    pub fn with_parent_pages(self, pages: Vec<(u64, &str)>) -> Self {
        *self.parent_pages.lock().unwrap() = pages
            .into_iter()
            .map(|(id, title)| ParentPage {
                id,
                title: title.to_string(),
            })
            .collect();
        self
    }

    /// Make create_post / create_page fail
    pub fn failing_create(self) -> Self {
        *self.fail_create.lock().unwrap() = true;
        self
    }

    /// Make publish_post / publish_page fail
    pub fn failing_publish(self) -> Self {
        *self.fail_publish.lock().unwrap() = true;
        self
    }

    pub fn uploads(&self) -> Vec<UploadCallArgs> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn post_drafts(&self) -> Vec<PostDraft> {
        self.post_drafts.lock().unwrap().clone()
    }

    pub fn page_drafts(&self) -> Vec<PageDraft> {
        self.page_drafts.lock().unwrap().clone()
    }

    pub fn published_posts(&self) -> Vec<u64> {
        self.published_posts.lock().unwrap().clone()
    }

    pub fn published_pages(&self) -> Vec<u64> {
        self.published_pages.lock().unwrap().clone()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePublisher for MockPublisher {
    async fn upload_image(
        &self,
        source: &str,
        filename: &str,
        alt_text: &str,
    ) -> Result<UploadedMedia> {
        self.uploads.lock().unwrap().push(UploadCallArgs {
            source: source.to_string(),
            filename: filename.to_string(),
            alt_text: alt_text.to_string(),
        });
        let id = self.next_media_id.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedMedia {
            id,
            url: format!("https://example.com/media/{}.png", id),
        })
    }

    async fn create_post(&self, draft: PostDraft) -> Result<u64> {
        if *self.fail_create.lock().unwrap() {
            return Err(anyhow!("mock create failure"));
        }
        let mut drafts = self.post_drafts.lock().unwrap();
        drafts.push(draft);
        Ok(1000 + drafts.len() as u64)
    }

    async fn create_page(&self, draft: PageDraft) -> Result<u64> {
        if *self.fail_create.lock().unwrap() {
            return Err(anyhow!("mock create failure"));
        }
        let mut drafts = self.page_drafts.lock().unwrap();
        drafts.push(draft);
        Ok(2000 + drafts.len() as u64)
    }

    async fn publish_post(&self, id: u64) -> Result<()> {
        if *self.fail_publish.lock().unwrap() {
            return Err(anyhow!("mock publish failure"));
        }
        self.published_posts.lock().unwrap().push(id);
        Ok(())
    }

    async fn publish_page(&self, id: u64) -> Result<()> {
        if *self.fail_publish.lock().unwrap() {
            return Err(anyhow!("mock publish failure"));
        }
        self.published_pages.lock().unwrap().push(id);
        Ok(())
    }

    async fn list_parent_pages(&self) -> Result<Vec<ParentPage>> {
        Ok(self.parent_pages.lock().unwrap().clone())
    }
}
