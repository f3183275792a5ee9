//! Configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Defaults match a stock
//! local Ollama install; `validate()` fails fast with a clear message before
//! any network call is made.

use anyhow::{Context, Result};
use std::env;

/// Runtime configuration for the report pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ollama server URL.
    pub ollama_host: String,

    /// Model used by the research stage (evidence summarization).
    pub researcher_model: String,

    /// Model used by the analysis stage.
    pub analyst_model: String,

    /// Model used by the writing stage. Defaults to a larger model than the
    /// other stages since it produces the full report body.
    pub writer_model: String,

    /// Model used by the critique stage.
    pub critic_model: String,

    /// Maximum number of search hits to fetch per topic.
    pub max_search_results: usize,

    /// Directory all artifacts are written under.
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost:11434".to_string(),
            researcher_model: "llama3.2:1b".to_string(),
            analyst_model: "llama3.2:1b".to_string(),
            writer_model: "gemma3:latest".to_string(),
            critic_model: "llama3.2:1b".to_string(),
            max_search_results: 5,
            output_dir: "outputs".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, starting from defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env if present; silently ignore when absent.
        let _ = dotenvy::dotenv();

        let mut config = Config::default();

        if let Ok(val) = env::var("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }
        if let Ok(val) = env::var("RESEARCHER_MODEL") {
            config.researcher_model = val;
        }
        if let Ok(val) = env::var("ANALYST_MODEL") {
            config.analyst_model = val;
        }
        if let Ok(val) = env::var("WRITER_MODEL") {
            config.writer_model = val;
        }
        if let Ok(val) = env::var("CRITIC_MODEL") {
            config.critic_model = val;
        }
        if let Ok(val) = env::var("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }
        if let Ok(val) = env::var("OUTPUT_DIR") {
            config.output_dir = val;
        }

        Ok(config)
    }

    /// Validate the configuration before the pipeline starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.ollama_host.is_empty() {
            anyhow::bail!("OLLAMA_API_BASE_URL cannot be empty");
        }

        for (name, model) in [
            ("RESEARCHER_MODEL", &self.researcher_model),
            ("ANALYST_MODEL", &self.analyst_model),
            ("WRITER_MODEL", &self.writer_model),
            ("CRITIC_MODEL", &self.critic_model),
        ] {
            if model.is_empty() {
                anyhow::bail!("{name} cannot be empty");
            }
        }

        if self.output_dir.is_empty() {
            anyhow::bail!("OUTPUT_DIR cannot be empty");
        }

        Ok(())
    }
}
