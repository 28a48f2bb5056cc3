//! Pure WordPress REST API (wp/v2) client.
//!
//! Covers the surface a publishing pipeline needs: creating draft
//! posts and pages, publishing them, uploading media, and listing
//! parent-page candidates. Authentication is HTTP basic with an
//! application password.

mod error;
mod types;

pub use error::{Result, WordPressError};
pub use types::{ItemStatus, NewPage, NewPost, PageSummary, UploadedMedia};

use base64::Engine as _;
use serde_json::json;

use crate::types::{CreatedItem, MediaItem, PageListing, Term};

/// Connection settings for a WordPress site.
#[derive(Debug, Clone)]
pub struct WordPressOptions {
    /// Site root, e.g. `https://example.com` (no trailing slash needed).
    pub base_url: String,
    pub username: String,
    pub app_password: String,
}

/// WordPress REST API client.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    options: WordPressOptions,
    http: reqwest::Client,
}

impl WordPressClient {
    pub fn new(options: WordPressOptions) -> Result<Self> {
        if options.base_url.is_empty() {
            return Err(WordPressError::Config("base_url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| WordPressError::Config(e.to_string()))?;
        Ok(Self { options, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/wp-json/wp/v2{}",
            self.options.base_url.trim_end_matches('/'),
            path
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .basic_auth(&self.options.username, Some(&self.options.app_password))
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(WordPressError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Create a post. Category and tag names are resolved (and created
    /// when missing) before the post itself is created.
    pub async fn create_post(&self, post: &NewPost) -> Result<u64> {
        let category_ids = self.resolve_terms("/categories", &post.categories).await?;
        let tag_ids = self.resolve_terms("/tags", &post.tags).await?;

        let mut payload = json!({
            "title": post.title,
            "content": post.content,
            "status": post.status.as_str(),
            "categories": category_ids,
            "tags": tag_ids,
        });
        if let Some(media_id) = post.featured_media {
            payload["featured_media"] = json!(media_id);
        }

        let response = self
            .request(reqwest::Method::POST, "/posts")
            .json(&payload)
            .send()
            .await?;
        let created: CreatedItem = self.check(response).await?.json().await?;
        tracing::info!(post_id = created.id, "WordPress post created");
        Ok(created.id)
    }

    /// Create a page, optionally parented under an existing page.
    pub async fn create_page(&self, page: &NewPage) -> Result<u64> {
        let mut payload = json!({
            "title": page.title,
            "content": page.content,
            "status": page.status.as_str(),
        });
        if let Some(parent) = page.parent {
            payload["parent"] = json!(parent);
        }
        if let Some(media_id) = page.featured_media {
            payload["featured_media"] = json!(media_id);
        }

        let response = self
            .request(reqwest::Method::POST, "/pages")
            .json(&payload)
            .send()
            .await?;
        let created: CreatedItem = self.check(response).await?.json().await?;
        tracing::info!(page_id = created.id, "WordPress page created");
        Ok(created.id)
    }

    pub async fn publish_post(&self, post_id: u64) -> Result<()> {
        self.set_status("/posts", post_id).await
    }

    pub async fn publish_page(&self, page_id: u64) -> Result<()> {
        self.set_status("/pages", page_id).await
    }

    async fn set_status(&self, base: &str, id: u64) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, &format!("{}/{}", base, id))
            .json(&json!({ "status": "publish" }))
            .send()
            .await?;
        self.check(response).await?;
        tracing::info!(item_id = id, "WordPress item published");
        Ok(())
    }

    /// Upload media from a source reference: an `http(s)` URL to fetch,
    /// or a `data:image/...;base64,` payload to decode. Sets alt text
    /// in a follow-up call when provided.
    pub async fn upload_media(
        &self,
        source: &str,
        filename: &str,
        alt_text: &str,
    ) -> Result<UploadedMedia> {
        let (bytes, content_type) = self.fetch_media_bytes(source).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(&content_type)
            .map_err(|e| WordPressError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/media")
            .multipart(form)
            .send()
            .await?;
        let media: MediaItem = self.check(response).await?.json().await?;

        if !alt_text.is_empty() {
            let response = self
                .request(reqwest::Method::POST, &format!("/media/{}", media.id))
                .json(&json!({ "alt_text": alt_text }))
                .send()
                .await?;
            self.check(response).await?;
        }

        tracing::info!(media_id = media.id, filename, "media uploaded");
        Ok(UploadedMedia {
            id: media.id,
            url: media.source_url,
        })
    }

    async fn fetch_media_bytes(&self, source: &str) -> Result<(Vec<u8>, String)> {
        if let Some(rest) = source.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| WordPressError::Parse("unsupported data URL".to_string()))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| WordPressError::Parse(format!("invalid base64 media: {}", e)))?;
            let content_type = if meta.is_empty() {
                "image/png".to_string()
            } else {
                meta.to_string()
            };
            return Ok((bytes, content_type));
        }

        let response = self.http.get(source).send().await?;
        let response = self.check(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok((bytes, content_type))
    }

    /// List top-level pages usable as parents.
    pub async fn list_parent_pages(&self) -> Result<Vec<PageSummary>> {
        let response = self
            .request(reqwest::Method::GET, "/pages")
            .query(&[("parent", "0"), ("per_page", "100"), ("status", "publish")])
            .send()
            .await?;
        let pages: Vec<PageListing> = self.check(response).await?.json().await?;
        Ok(pages
            .into_iter()
            .map(|p| PageSummary {
                id: p.id,
                title: p.title.rendered,
            })
            .collect())
    }

    /// Resolve term names to ids, creating terms that do not exist.
    async fn resolve_terms(&self, base: &str, names: &[String]) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let response = self
                .request(reqwest::Method::GET, base)
                .query(&[("search", name.as_str())])
                .send()
                .await?;
            let found: Vec<Term> = self.check(response).await?.json().await?;

            if let Some(term) = found.first() {
                ids.push(term.id);
                continue;
            }

            let slug = name.to_lowercase().replace(char::is_whitespace, "-");
            let response = self
                .request(reqwest::Method::POST, base)
                .json(&json!({ "name": name, "slug": slug }))
                .send()
                .await?;
            let created: Term = self.check(response).await?.json().await?;
            ids.push(created.id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WordPressClient {
        WordPressClient::new(WordPressOptions {
            base_url: "https://example.com/".to_string(),
            username: "bot".to_string(),
            app_password: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let c = client();
        assert_eq!(
            c.endpoint("/posts"),
            "https://example.com/wp-json/wp/v2/posts"
        );
    }

    #[test]
    fn empty_base_url_is_config_error() {
        let err = WordPressClient::new(WordPressOptions {
            base_url: String::new(),
            username: "bot".to_string(),
            app_password: "secret".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, WordPressError::Config(_)));
    }

    #[test]
    fn item_status_serializes_lowercase() {
        assert_eq!(ItemStatus::Draft.as_str(), "draft");
        assert_eq!(ItemStatus::Publish.as_str(), "publish");
    }

    #[tokio::test]
    async fn data_url_media_is_decoded() {
        let c = client();
        // "hi" base64-encoded
        let (bytes, content_type) = c
            .fetch_media_bytes("data:image/png;base64,aGk=")
            .await
            .unwrap();
        assert_eq!(bytes, b"hi");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn malformed_data_url_is_parse_error() {
        let c = client();
        let err = c.fetch_media_bytes("data:image/png,raw").await.unwrap_err();
        assert!(matches!(err, WordPressError::Parse(_)));
    }
}
