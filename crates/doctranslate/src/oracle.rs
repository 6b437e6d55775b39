//! Ollama-backed translation oracle.
//!
//! The document pipelines are synchronous, so the oracle is always called from
//! a blocking thread. It hops back onto the Tokio runtime it was created on to
//! drive the rig request, and bounds each call with its own timeout.

use crate::prelude::*;
use doctranslate_core::translate::{Oracle, OracleError};
use rig::client::{CompletionClient, Nothing};
use rig::completion::Prompt;
use rig::providers::ollama;
use std::time::Duration;
use tokio::runtime::Handle;

/// Connection settings for the local model.
#[derive(Debug, Clone, clap::Args)]
pub struct OllamaOptions {
    /// Ollama base URL
    #[clap(
        long,
        env = "OLLAMA_URL",
        global = true,
        default_value = "http://localhost:11434"
    )]
    pub ollama_url: String,

    /// Model used for translation
    #[clap(long, env = "OLLAMA_MODEL", global = true, default_value = "llama3.1")]
    pub model: String,

    /// Seconds to wait for a single completion
    #[clap(long, env = "OLLAMA_TIMEOUT", global = true, default_value = "120")]
    pub timeout: u64,
}

pub struct OllamaOracle {
    client: ollama::Client,
    model: String,
    timeout: Duration,
    handle: Handle,
}

impl OllamaOracle {
    /// Build an oracle bound to the current Tokio runtime.
    pub fn new(options: &OllamaOptions) -> Result<Self> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(&options.ollama_url)
            .build()
            .map_err(|e| eyre!("Failed to create Ollama client: {}", e))?;
        let handle = Handle::try_current().map_err(|e| eyre!("No Tokio runtime: {}", e))?;

        Ok(Self {
            client,
            model: options.model.clone(),
            timeout: Duration::from_secs(options.timeout),
            handle,
        })
    }
}

impl Oracle for OllamaOracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let agent = self.client.agent(&self.model).temperature(0.0).build();
        let request = tokio::time::timeout(self.timeout, async { agent.prompt(prompt).await });

        log::debug!("Ollama request ({}): {}", self.model, prompt);
        match self.handle.block_on(request) {
            Ok(Ok(response)) => {
                log::debug!("Ollama response ({}): {}", self.model, response);
                Ok(response)
            }
            Ok(Err(e)) => {
                log::debug!("Ollama request failed: {}", e);
                Err(OracleError::Request(e.to_string()))
            }
            Err(_) => {
                log::debug!("Ollama request timed out after {:?}", self.timeout);
                Err(OracleError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
