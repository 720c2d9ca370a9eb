use anyhow::{Context, Result};
use std::sync::Arc;

use crate::Config;

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Create an application around an already-built configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Prepare the directories the forecast cache lives in
    pub fn initialize(&mut self) -> Result<()> {
        let cache_path = self.config.cache_path();
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }

        tracing::info!(
            endpoint = %self.config.forecast.endpoint_url,
            cache = %cache_path.display(),
            "Application initialized successfully"
        );
        Ok(())
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the config for long-lived services
    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}
