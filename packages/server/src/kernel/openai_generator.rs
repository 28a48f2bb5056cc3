//! OpenAI-backed implementation of [`BaseContentGenerator`].
//!
//! Chat completions for text and metadata, gpt-image-1 for images.
//! Model responses are cleaned of wrapper tags and code fences before
//! they reach the pipeline; JSON responses are returned raw for the
//! caller to parse.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::traits::BaseContentGenerator;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const IMAGE_MODEL: &str = "gpt-image-1";

lazy_static! {
    static ref WRAPPER_TAGS: Regex =
        Regex::new(r"(?i)</?(html|head|body|article)[^>]*>").unwrap();
}

pub struct OpenAiGenerator {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            http: reqwest::Client::new(),
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", OPENAI_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?
            .json::<ChatResponse>()
            .await
            .context("failed to decode chat completion response")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }
}

/// Strip wrapper tags and ```html fences the model sometimes emits
/// despite instructions.
fn clean_html(raw: &str) -> String {
    let without_wrappers = WRAPPER_TAGS.replace_all(raw, "");
    without_wrappers
        .replace("```html\n", "")
        .replace("```html", "")
        .replace("\n```", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[async_trait]
impl BaseContentGenerator for OpenAiGenerator {
    async fn generate_article(&self, prompt: &str) -> Result<String> {
        let system = "You are a professional content writer. Write engaging, \
            SEO-optimized articles using WordPress-compatible HTML: <h1>-<h3> \
            headings, <p> paragraphs, <ul>/<ol> lists, <strong>/<em> emphasis. \
            Do not wrap the content in <html>, <head>, <body> or <article> \
            tags. Aim for 800-1200 words.";
        let content = self.chat(system, prompt, 3000, 0.7).await?;
        Ok(clean_html(&content))
    }

    async fn generate_page(&self, prompt: &str) -> Result<String> {
        let system = "You are a professional web content writer specializing \
            in WordPress pages (comparisons, FAQs, features, landing pages). \
            Use WordPress-compatible HTML: one <h1>, then <h2>-<h4> section \
            headings, <p>, lists, <table> for comparisons, <blockquote> for \
            highlights. Do not wrap content in <html>, <head> or <body> tags. \
            Make the content comprehensive and well-structured.";
        let content = self.chat(system, prompt, 4000, 0.7).await?;
        Ok(clean_html(&content))
    }

    async fn extract_article_metadata_json(&self, content: &str) -> Result<String> {
        let system = "Analyze the given article and return a JSON object with: \
            title (SEO-friendly, under 60 characters), category (single most \
            relevant), tags (3-5), imagePrompts (2-3 detailed image prompts), \
            featuredImagePrompt (one main image prompt). Return only valid JSON.";
        let user = format!("Extract metadata from this article:\n\n{}", content);
        self.chat(system, &user, 500, 0.3).await
    }

    async fn extract_page_metadata_json(&self, content: &str) -> Result<String> {
        let system = "Analyze the given page content and return a JSON object \
            with: title (under 60 characters), slug (lowercase, hyphens), \
            metaDescription (under 160 characters), pageType (comparison, faq, \
            features, landing, about, etc.), imagePrompts (1-2 image prompts), \
            featuredImagePrompt (one main image prompt). Return only valid JSON.";
        let user = format!("Extract metadata from this page content:\n\n{}", content);
        self.chat(system, &user, 500, 0.3).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": IMAGE_MODEL,
            "prompt": format!(
                "Create a high-quality, professional image for web publishing: {}",
                prompt
            ),
            "n": 1,
            "size": "1536x1024",
            "quality": "medium",
        });

        let response = self
            .http
            .post(format!("{}/images/generations", OPENAI_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("image generation request failed")?
            .error_for_status()
            .context("image generation returned an error status")?
            .json::<ImageResponse>()
            .await
            .context("failed to decode image generation response")?;

        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("image generation returned no data"))?;

        // gpt-image-1 returns base64; other models may return a URL
        if let Some(b64) = datum.b64_json {
            return Ok(format!("data:image/png;base64,{}", b64));
        }
        datum
            .url
            .ok_or_else(|| anyhow!("image generation returned neither b64_json nor url"))
    }

    async fn suggest_article_placements_json(
        &self,
        content: &str,
        image_count: usize,
    ) -> Result<String> {
        let system = format!(
            "Analyze the article and suggest where to place {} images. Return \
            a JSON array of objects with: position (0-based paragraph number \
            to insert after), context (what the image should show). Return \
            only valid JSON.",
            image_count
        );
        let user = format!(
            "Find optimal image placement for {} images in this article:\n\n{}",
            image_count, content
        );
        self.chat(&system, &user, 300, 0.3).await
    }

    async fn suggest_page_placements_json(
        &self,
        content: &str,
        image_count: usize,
    ) -> Result<String> {
        let system = format!(
            "Analyze the page content and suggest where to place {} images. \
            Return a JSON array of objects with: position (0-based section \
            number), context (what the image should show), size (full-width, \
            half-width, thumbnail). Return only valid JSON.",
            image_count
        );
        let user = format!(
            "Find optimal image placement for {} images in this page:\n\n{}",
            image_count, content
        );
        self.chat(&system, &user, 300, 0.3).await
    }
}
