//! Turn pending reminders into printed receipts.
//!
//! `memento` reads pending reminders from a reminders store, asks a locally
//! hosted language model to extract a title, a cleaned body, a link, and an
//! assignee from each one, lays the result out as fixed-width blocks for a
//! thermal receipt printer, and finally moves the reminder into a dedicated
//! "processed" calendar so the next pass skips it.
//!
//! # Where to find things
//!
//! - **The extraction contract:** [`extract::ExtractedFields`] is the schema
//!   the model must return, [`extract::Extractor`] builds the prompt and
//!   validates the response.
//! - **Defaulting rules:** [`normalize::Normalizer`].
//! - **Receipt layout:** [`layout::Receipt`] turns fields into
//!   [`layout::PrintableBlock`]s and then into [`layout::PrintCommand`]s.
//! - **Collaborators:** [`model::LanguageModel`], [`store::ReminderStore`],
//!   and [`sink::PrintSink`] are the three seams. [`OllamaClient`],
//!   [`store::JsonFileStore`] and [`sink::PreviewSink`] are the bundled
//!   implementations.
//! - **The pass itself:** [`sync::SyncEngine`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Retry with backoff for model calls |
//! | [`config`] | TOML configuration with environment overrides |
//! | [`events`] | [`EventHandler`](events::EventHandler) hooks for observing a pass |
//! | [`extract`] | Prompt template, response schema, parsing and validation |
//! | [`layout`] | Word wrap, title case, bordered blocks, print commands |
//! | [`normalize`] | Post-extraction default substitution |
//! | [`reminder`] | Reminder and calendar records |
//! | [`sink`] | Printer command sinks |
//! | [`store`] | Reminder store trait and implementations |
//! | [`sync`] | One pass over pending reminders |

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod reminder;
pub mod sink;
pub mod store;
pub mod sync;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub use error::{Error, Result};
pub use model::{LanguageModel, ModelError, ModelFuture};

// ── Constants ──────────────────────────────────────────────────────

/// Default address of a local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model name when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default HTTP timeout for a single model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use memento::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Note {
///     title: String,
///     #[serde(default)]
///     body: Option<String>,
/// }
///
/// let schema = json_schema_for::<Note>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"title".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Sampling options forwarded to the model runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Context window in tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    /// Low temperature for consistent structured output.
    fn default() -> Self {
        Self {
            temperature: Some(0.1),
            top_p: Some(0.9),
            num_ctx: Some(4096),
            seed: None,
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    /// Either the string `"json"` or a JSON Schema the output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'a serde_json::Value>,
    pub options: &'a GenerateOptions,
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawGenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for a local Ollama server.
///
/// Implements [`LanguageModel`] by sending one non-streaming generate request
/// per prompt.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
    format: Option<serde_json::Value>,
}

impl OllamaClient {
    /// Create a client for `model` at the default local address.
    pub fn new(model: impl Into<String>) -> std::result::Result<Self, ModelError> {
        Self::with_base_url(DEFAULT_OLLAMA_URL, model, DEFAULT_MODEL_TIMEOUT)
    }

    /// Create a client against a custom server with an explicit request timeout.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("memento/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                timed_out: false,
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            options: GenerateOptions::default(),
            format: None,
        })
    }

    /// Replace the sampling options.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Constrain the output to a JSON Schema (or `"json"` for any JSON).
    pub fn with_format(mut self, format: serde_json::Value) -> Self {
        self.format = Some(format);
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Send a generate request and return the completion text.
    pub async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: self.format.as_ref(),
            options: &self.options,
        };
        debug!(
            "LLM request: model={}, prompt={} chars, temp={:?}",
            self.model,
            prompt.chars().count(),
            self.options.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(&body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        let elapsed = start.elapsed();
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            elapsed.as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: RawGenerateResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::Decode(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(ModelError::Api(err));
        }

        debug!(
            "Token usage: prompt={}, completion={}",
            parsed.prompt_eval_count.unwrap_or(0),
            parsed.eval_count.unwrap_or(0),
        );

        parsed
            .response
            .ok_or_else(|| ModelError::Decode("response field missing".to_string()))
    }
}

impl LanguageModel for OllamaClient {
    fn complete(&self, prompt: &str) -> ModelFuture<'_> {
        let prompt = prompt.to_string();
        Box::pin(async move { self.generate(&prompt).await })
    }

    fn name(&self) -> &str {
        &self.model
    }
}
