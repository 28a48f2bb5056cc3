// Main entry point for the content automation engine

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordpress::{WordPressClient, WordPressOptions};

use automation_core::domains::automation::AutomationEngine;
use automation_core::kernel::{EngineDeps, OpenAiGenerator, WordPressPublisher};
use automation_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,automation_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting content automation engine");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let wordpress = WordPressClient::new(WordPressOptions {
        base_url: config.wordpress_url.clone(),
        username: config.wordpress_username.clone(),
        app_password: config.wordpress_password.clone(),
    })
    .context("Failed to build WordPress client")?;

    let generator = Arc::new(OpenAiGenerator::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    let publisher = Arc::new(WordPressPublisher::new(Arc::new(wordpress)));

    let engine = AutomationEngine::start(EngineDeps::new(generator, publisher))
        .await
        .context("Failed to start automation engine")?;
    tracing::info!("Automation engine running");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    engine.shutdown().await?;

    Ok(())
}
