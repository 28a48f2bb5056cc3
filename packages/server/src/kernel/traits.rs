// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The
// pipeline decides what to do with generated text and created items;
// these traits only move bytes to and from external services.
//
// Naming convention: Base* for trait names (e.g., BaseContentGenerator)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Content generation (LLM + image model)
// =============================================================================

/// Produces content, metadata JSON, placement JSON, and images.
///
/// The `*_json` methods return raw model output; callers parse it and
/// supply fallbacks, so a generator never needs to guarantee valid
/// JSON.
#[async_trait]
pub trait BaseContentGenerator: Send + Sync {
    /// Generate full HTML article body for a prompt
    async fn generate_article(&self, prompt: &str) -> Result<String>;

    /// Generate full HTML page body for a prompt
    async fn generate_page(&self, prompt: &str) -> Result<String>;

    /// Extract article metadata (title, category, tags, image prompts)
    /// as a raw JSON string
    async fn extract_article_metadata_json(&self, content: &str) -> Result<String>;

    /// Extract page metadata (title, slug, meta description, page
    /// type, image prompts) as a raw JSON string
    async fn extract_page_metadata_json(&self, content: &str) -> Result<String>;

    /// Generate one image; returns a URL or data-URL reference
    async fn generate_image(&self, prompt: &str) -> Result<String>;

    /// Suggest where to place `image_count` images between article
    /// paragraphs, as a raw JSON array string
    async fn suggest_article_placements_json(
        &self,
        content: &str,
        image_count: usize,
    ) -> Result<String>;

    /// Suggest where to place `image_count` images between page
    /// sections, as a raw JSON array string
    async fn suggest_page_placements_json(
        &self,
        content: &str,
        image_count: usize,
    ) -> Result<String>;
}

// =============================================================================
// Publishing target
// =============================================================================

/// A media item after upload to the publishing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub id: u64,
    pub url: String,
}

/// A page eligible to be a parent for new pages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParentPage {
    pub id: u64,
    pub title: String,
}

/// Draft of a post handed to the publishing target.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Create live rather than as a draft
    pub publish: bool,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub featured_media: Option<u64>,
}

/// Draft of a page handed to the publishing target.
#[derive(Debug, Clone)]
pub struct PageDraft {
    pub title: String,
    pub content: String,
    pub publish: bool,
    pub parent: Option<u64>,
    pub featured_media: Option<u64>,
}

/// Creates and publishes content items on the target site.
#[async_trait]
pub trait BasePublisher: Send + Sync {
    /// Upload an image by URL or data-URL; returns the created media
    async fn upload_image(
        &self,
        source: &str,
        filename: &str,
        alt_text: &str,
    ) -> Result<UploadedMedia>;

    /// Create a post; returns its id on the target
    async fn create_post(&self, draft: PostDraft) -> Result<u64>;

    /// Create a page; returns its id on the target
    async fn create_page(&self, draft: PageDraft) -> Result<u64>;

    /// Flip an existing post from draft to published
    async fn publish_post(&self, id: u64) -> Result<()>;

    /// Flip an existing page from draft to published
    async fn publish_page(&self, id: u64) -> Result<()>;

    /// Top-level published pages usable as parents
    async fn list_parent_pages(&self) -> Result<Vec<ParentPage>>;
}
