use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub wordpress_url: String,
    pub wordpress_username: String,
    pub wordpress_password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            wordpress_url: env::var("WORDPRESS_URL")
                .context("WORDPRESS_URL must be set")?,
            wordpress_username: env::var("WORDPRESS_USERNAME")
                .context("WORDPRESS_USERNAME must be set")?,
            wordpress_password: env::var("WORDPRESS_PASSWORD")
                .context("WORDPRESS_PASSWORD must be set")?,
        })
    }
}
