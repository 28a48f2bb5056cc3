//! Request and response types for the WordPress REST API.

use serde::{Deserialize, Serialize};

/// Publication status for posts and pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Draft,
    Publish,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Publish => "publish",
        }
    }
}

/// A new post to create. Category and tag names are resolved to term
/// ids by the client, creating missing terms on the fly.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub status: ItemStatus,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub featured_media: Option<u64>,
}

/// A new page to create.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: String,
    pub content: String,
    pub status: ItemStatus,
    pub parent: Option<u64>,
    pub featured_media: Option<u64>,
}

/// Media item returned by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub id: u64,
    pub url: String,
}

/// Minimal page listing entry (parent-page candidates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: u64,
    pub title: String,
}

// Wire-format types below are private to the crate.

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedItem {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaItem {
    pub id: u64,
    pub source_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Term {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenderedText {
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageListing {
    pub id: u64,
    pub title: RenderedText,
}
