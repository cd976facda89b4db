//! The structured extraction contract.
//!
//! A reminder's free text goes into a fixed prompt that embeds the JSON
//! Schema of [`ExtractedFields`]. The model's answer is located, validated
//! against that same schema, and only then deserialized. Anything that does
//! not conform is an [`ExtractionError`]; nothing is defaulted here, because
//! printing a half-understood reminder is worse than printing none.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::retry::{RetryConfig, retry_model_call};
use crate::json_schema_for;
use crate::model::{LanguageModel, ModelError};

/// Soft cap on the synthesized title. Only stated to the model, never enforced.
pub const TITLE_SOFT_LIMIT: usize = 40;

const PROMPT: &str = "\
You are an expert reminder processing assistant.
Your task is to analyze the given reminder text and extract structured information.

Instructions:
1. Create a short, descriptive title (max {title_limit} characters).
2. Rewrite the main body/text for clarity. Exclude any URLs and any @NAME mentions from it.
3. Find any URL/link in the text and put it in the link field.
4. If the text contains an @NAME mention, set the assignee to NAME without the @. \
If there is no @NAME in the text, set the assignee to null.
5. If any field doesn't exist in the text or cannot be inferred, set it to null. \
Never use an empty string to mean \"missing\".
6. If the rewritten text would be identical to the title, set the text to null.

{format}

Reminder text to process:
{text}

Output:";

/// Fields the model must return for a single reminder.
///
/// `None` means the model reported the field as absent. An empty string is a
/// value, not an absence, and is kept as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFields {
    /// Short title for the reminder
    pub title: String,
    /// Main content/text of the reminder, without links or @mentions
    #[serde(default)]
    pub text: Option<String>,
    /// Any URL/link found in the reminder
    #[serde(default)]
    pub link: Option<String>,
    /// Person assigned to this reminder, without the leading @
    #[serde(default)]
    pub assignee: Option<String>,
}

impl ExtractedFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: None,
            link: None,
            assignee: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model call failed: {0}")]
    Model(#[from] ModelError),
    #[error("model response contains no JSON object")]
    NoJson,
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("model response does not match the schema:\n{}", .0.join("\n"))]
    Schema(Vec<String>),
    #[error("model response has an empty title")]
    EmptyTitle,
}

/// JSON Schema of [`ExtractedFields`].
pub fn response_schema() -> serde_json::Value {
    json_schema_for::<ExtractedFields>()
}

/// Format instructions appended to the prompt.
fn format_instructions(schema: &serde_json::Value) -> String {
    let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "The output must be a single JSON object that conforms to the JSON schema below. \
         Output only the JSON object, with no commentary.\n\n```json\n{rendered}\n```"
    )
}

/// Render the full prompt for `text`.
pub fn build_prompt(text: &str) -> String {
    PROMPT
        .replace("{title_limit}", &TITLE_SOFT_LIMIT.to_string())
        .replace("{format}", &format_instructions(&response_schema()))
        .replace("{text}", text)
}

/// Slice out the outermost `{ ... }` span, tolerating code fences and prose.
fn locate_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    raw.get(start..=end)
}

/// Parse and validate a raw model response.
pub fn parse_response(raw: &str) -> Result<ExtractedFields, ExtractionError> {
    let json = locate_json(raw).ok_or(ExtractionError::NoJson)?;
    let value: serde_json::Value = serde_json::from_str(json)?;

    let schema = response_schema();
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| ExtractionError::Schema(vec![format!("invalid schema: {e}")]))?;
    let errors: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| format!("  - {}: {e}", e.instance_path()))
        .collect();
    if !errors.is_empty() {
        return Err(ExtractionError::Schema(errors));
    }

    let fields: ExtractedFields = serde_json::from_value(value)?;
    if fields.title.trim().is_empty() {
        return Err(ExtractionError::EmptyTitle);
    }
    Ok(fields)
}

/// Runs the extraction contract against a [`LanguageModel`].
pub struct Extractor<M> {
    model: M,
    retry: RetryConfig,
}

impl<M: LanguageModel> Extractor<M> {
    /// One attempt per reminder, no retries.
    pub fn new(model: M) -> Self {
        Self {
            model,
            retry: RetryConfig::default(),
        }
    }

    /// Retry transient transport failures. Schema failures are never retried.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Extract structured fields from a reminder's text.
    pub async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractionError> {
        let prompt = build_prompt(text);
        debug!(model = self.model.name(), "extracting {} chars", text.chars().count());

        let raw = retry_model_call(&self.retry, || self.model.complete(&prompt)).await?;
        let fields = parse_response(&raw).inspect_err(|e| {
            info!("rejected model response: {e}");
            debug!("raw response: {raw}");
        })?;
        debug!(
            title = %fields.title,
            has_text = fields.text.is_some(),
            has_link = fields.link.is_some(),
            has_assignee = fields.assignee.is_some(),
            "extraction complete"
        );
        Ok(fields)
    }
}
