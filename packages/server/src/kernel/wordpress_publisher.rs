//! WordPress-backed implementation of [`BasePublisher`].
//!
//! Thin adapter over the `wordpress` crate's REST client; translates
//! pipeline drafts into API payloads.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use wordpress::{ItemStatus, NewPage, NewPost, WordPressClient};

use super::traits::{BasePublisher, PageDraft, ParentPage, PostDraft, UploadedMedia};

pub struct WordPressPublisher {
    client: Arc<WordPressClient>,
}

impl WordPressPublisher {
    pub fn new(client: Arc<WordPressClient>) -> Self {
        Self { client }
    }
}

fn status_for(publish: bool) -> ItemStatus {
    if publish {
        ItemStatus::Publish
    } else {
        ItemStatus::Draft
    }
}

#[async_trait]
impl BasePublisher for WordPressPublisher {
    async fn upload_image(
        &self,
        source: &str,
        filename: &str,
        alt_text: &str,
    ) -> Result<UploadedMedia> {
        let media = self.client.upload_media(source, filename, alt_text).await?;
        Ok(UploadedMedia {
            id: media.id,
            url: media.url,
        })
    }

    async fn create_post(&self, draft: PostDraft) -> Result<u64> {
        let post = NewPost {
            title: draft.title,
            content: draft.content,
            status: status_for(draft.publish),
            categories: draft.categories,
            tags: draft.tags,
            featured_media: draft.featured_media,
        };
        Ok(self.client.create_post(&post).await?)
    }

    async fn create_page(&self, draft: PageDraft) -> Result<u64> {
        let page = NewPage {
            title: draft.title,
            content: draft.content,
            status: status_for(draft.publish),
            parent: draft.parent,
            featured_media: draft.featured_media,
        };
        Ok(self.client.create_page(&page).await?)
    }

    async fn publish_post(&self, id: u64) -> Result<()> {
        Ok(self.client.publish_post(id).await?)
    }

    async fn publish_page(&self, id: u64) -> Result<()> {
        Ok(self.client.publish_page(id).await?)
    }

    async fn list_parent_pages(&self) -> Result<Vec<ParentPage>> {
        let pages = self.client.list_parent_pages().await?;
        Ok(pages
            .into_iter()
            .map(|p| ParentPage {
                id: p.id,
                title: p.title,
            })
            .collect())
    }
}
