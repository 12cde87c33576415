//! Ollama-backed model invoker.
//!
//! Blocking HTTP client for a locally hosted Ollama instance:
//! `/api/generate` for completions, `/api/tags` for the installed-model
//! list. Generation pins a low temperature and a bounded completion
//! length so classification output stays terse and parseable.

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::ClassifyError;
use crate::config;

/// Models suitable for classification, in preference order. Matching is
/// by prefix, so tagged variants (`llama3.1:8b`) qualify.
const PREFERRED_MODELS: &[&str] = &["llama3.1", "llama3", "mistral"];

/// Sampling temperature; low keeps the JSON output stable.
const TEMPERATURE: f32 = 0.1;

/// Completion token budget. A classification record is well under this.
const NUM_PREDICT: u32 = 512;

pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Local instance with a generous timeout; CPU inference on a full
    /// chunk can take minutes.
    pub fn default_local() -> Self {
        Self::new(config::DEFAULT_OLLAMA_URL, config::DEFAULT_TIMEOUT_SECS)
    }

    /// Endpoint from `OLLAMA_HOST` when set, else the local default.
    pub fn from_env() -> Self {
        Self::new(&config::default_ollama_url(), config::DEFAULT_TIMEOUT_SECS)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// First installed model matching the preference list.
    pub fn find_best_model(&self) -> Result<String, ClassifyError> {
        resolve_model(self, None)
    }
}

/// Resolve the model for a scan before any chunk work: an explicitly
/// requested name must be installed; with no request, the first installed
/// preference-list match wins.
pub fn resolve_model(
    client: &dyn LlmClient,
    requested: Option<&str>,
) -> Result<String, ClassifyError> {
    match requested {
        Some(name) => {
            if client.is_model_available(name)? {
                Ok(name.to_string())
            } else {
                Err(ClassifyError::ModelNotInstalled(name.to_string()))
            }
        }
        None => {
            let available = client.list_models()?;
            pick_preferred(&available).ok_or(ClassifyError::NoModelAvailable)
        }
    }
}

/// Walk the preference list over the installed model names.
fn pick_preferred(available: &[String]) -> Option<String> {
    PREFERRED_MODELS
        .iter()
        .find(|preferred| available.iter().any(|name| name.starts_with(*preferred)))
        .map(|preferred| preferred.to_string())
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ClassifyError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: NUM_PREDICT,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassifyError::OllamaConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    ClassifyError::HttpClient(format!("Request timed out: {e}"))
                } else {
                    ClassifyError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ClassifyError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn is_model_available(&self, model: &str) -> Result<bool, ClassifyError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|name| name.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() {
                ClassifyError::OllamaConnection(self.base_url.clone())
            } else {
                ClassifyError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TagsResponse = response
            .json()
            .map_err(|e| ClassifyError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

// ═══════════════════════════════════════════════════════════
// Mock client for tests
// ═══════════════════════════════════════════════════════════

/// Canned-response client: fixed completion text, configurable model list.
pub struct MockLlmClient {
    response: String,
    available_models: Vec<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            available_models: vec!["llama3.1:latest".to_string()],
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ClassifyError> {
        Ok(self.response.clone())
    }

    fn is_model_available(&self, model: &str) -> Result<bool, ClassifyError> {
        Ok(self
            .available_models
            .iter()
            .any(|name| name.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, ClassifyError> {
        Ok(self.available_models.clone())
    }
}
