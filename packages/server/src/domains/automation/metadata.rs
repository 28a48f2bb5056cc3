//! Parsing of model-produced JSON: metadata and image placements.
//!
//! Model output is untrusted. Anything that fails to parse as the
//! expected shape degrades to a deterministic fallback instead of
//! failing the job; `Parsed` tells the caller which path was taken.

use serde::{Deserialize, Serialize};

/// A value either extracted from model output or substituted by the
/// deterministic fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Extracted(T),
    Fallback(T),
}

impl<T> Parsed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Parsed::Extracted(v) | Parsed::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Parsed::Fallback(_))
    }
}

/// Structured metadata for an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_prompts: Vec<String>,
    pub featured_image_prompt: String,
}

impl ArticleMetadata {
    pub fn fallback() -> Self {
        Self {
            title: "Generated Article".to_string(),
            category: "General".to_string(),
            tags: vec!["article".to_string(), "content".to_string()],
            image_prompts: vec![
                "Professional article illustration".to_string(),
                "Modern content concept".to_string(),
            ],
            featured_image_prompt: "Professional blog article featured image".to_string(),
        }
    }
}

/// Structured metadata for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub slug: String,
    pub meta_description: String,
    pub page_type: String,
    pub image_prompts: Vec<String>,
    pub featured_image_prompt: String,
}

impl PageMetadata {
    pub fn fallback() -> Self {
        Self {
            title: "Generated Page".to_string(),
            slug: "generated-page".to_string(),
            meta_description: "A professionally generated WordPress page.".to_string(),
            page_type: "general".to_string(),
            image_prompts: vec!["Professional page illustration".to_string()],
            featured_image_prompt: "Professional WordPress page featured image".to_string(),
        }
    }
}

/// One suggested image placement inside generated content.
///
/// `position` is a 0-based paragraph (articles) or section (pages)
/// index; `size` is only meaningful for pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: usize,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// Strip ```json fences the model sometimes wraps its output in.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_article_metadata(raw: &str) -> Parsed<ArticleMetadata> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(metadata) => Parsed::Extracted(metadata),
        Err(err) => {
            tracing::warn!(%err, "failed to parse article metadata, using fallback");
            Parsed::Fallback(ArticleMetadata::fallback())
        }
    }
}

pub fn parse_page_metadata(raw: &str) -> Parsed<PageMetadata> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(metadata) => Parsed::Extracted(metadata),
        Err(err) => {
            tracing::warn!(%err, "failed to parse page metadata, using fallback");
            Parsed::Fallback(PageMetadata::fallback())
        }
    }
}

/// Parse a placement suggestion list. On any parse failure the images
/// are distributed evenly across `units` paragraphs/sections instead.
pub fn parse_placements(
    raw: &str,
    image_count: usize,
    units: usize,
    for_page: bool,
) -> Parsed<Vec<Placement>> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str(&cleaned) {
        Ok(placements) => Parsed::Extracted(placements),
        Err(err) => {
            tracing::warn!(%err, "failed to parse placements, distributing evenly");
            Parsed::Fallback(fallback_placements(image_count, units, for_page))
        }
    }
}

/// Even distribution: image i of n lands at
/// `floor(units / (n + 1) * (i + 1))`.
pub fn fallback_placements(image_count: usize, units: usize, for_page: bool) -> Vec<Placement> {
    let surface = if for_page { "page" } else { "article" };
    (0..image_count)
        .map(|i| Placement {
            position: (units as f64 / (image_count as f64 + 1.0) * (i as f64 + 1.0)).floor()
                as usize,
            context: format!("Image {} for {} content", i + 1, surface),
            size: for_page.then(|| "full-width".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_article_metadata() {
        let raw = r#"{
            "title": "Rust Async Patterns",
            "category": "Programming",
            "tags": ["rust", "async"],
            "imagePrompts": ["a crab", "an event loop"],
            "featuredImagePrompt": "ferris at a keyboard"
        }"#;
        let parsed = parse_article_metadata(raw);
        assert!(!parsed.is_fallback());
        let metadata = parsed.into_inner();
        assert_eq!(metadata.title, "Rust Async Patterns");
        assert_eq!(metadata.image_prompts.len(), 2);
    }

    #[test]
    fn strips_json_code_fences() {
        let raw = "```json\n{\"title\":\"T\",\"category\":\"C\",\"tags\":[],\"imagePrompts\":[],\"featuredImagePrompt\":\"F\"}\n```";
        let parsed = parse_article_metadata(raw);
        assert!(!parsed.is_fallback());
        assert_eq!(parsed.into_inner().title, "T");
    }

    #[test]
    fn malformed_article_metadata_falls_back() {
        let parsed = parse_article_metadata("here is your metadata: {title: oops}");
        assert!(parsed.is_fallback());
        let metadata = parsed.into_inner();
        assert_eq!(metadata.title, "Generated Article");
        assert_eq!(metadata.category, "General");
        assert_eq!(metadata.tags, vec!["article", "content"]);
    }

    #[test]
    fn malformed_page_metadata_falls_back() {
        let parsed = parse_page_metadata("not json");
        assert!(parsed.is_fallback());
        let metadata = parsed.into_inner();
        assert_eq!(metadata.title, "Generated Page");
        assert_eq!(metadata.slug, "generated-page");
        assert_eq!(metadata.page_type, "general");
    }

    #[test]
    fn placements_parse_with_optional_fields() {
        let raw = r#"[{"position": 2}, {"position": 5, "context": "a chart", "size": "half-width"}]"#;
        let parsed = parse_placements(raw, 2, 10, true);
        assert!(!parsed.is_fallback());
        let placements = parsed.into_inner();
        assert_eq!(placements[0].position, 2);
        assert_eq!(placements[0].context, "");
        assert_eq!(placements[1].size.as_deref(), Some("half-width"));
    }

    #[test]
    fn fallback_placements_distribute_evenly() {
        // 10 paragraphs, 2 images: floor(10/3*1)=3, floor(10/3*2)=6
        let placements = fallback_placements(2, 10, false);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].position, 3);
        assert_eq!(placements[1].position, 6);
        assert_eq!(placements[0].context, "Image 1 for article content");
        assert!(placements[0].size.is_none());
    }

    #[test]
    fn page_fallback_placements_carry_full_width() {
        let placements = fallback_placements(1, 4, true);
        assert_eq!(placements[0].position, 2);
        assert_eq!(placements[0].context, "Image 1 for page content");
        assert_eq!(placements[0].size.as_deref(), Some("full-width"));
    }
}
