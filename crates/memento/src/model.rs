//! The language model seam.
//!
//! The pipeline owns the prompt and the response schema; a model only has to
//! turn one prompt string into one completion string. [`OllamaClient`](crate::OllamaClient)
//! is the production implementation, tests substitute deterministic stubs.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`LanguageModel::complete`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>>;

/// Failure of a single model invocation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The request never produced an HTTP response (connect, timeout, reset).
    #[error("request failed: {message}")]
    Transport { message: String, timed_out: bool },
    /// The server answered with a non-success status.
    #[error("model API HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The server answered 2xx but reported an error in the payload.
    #[error("model API error: {0}")]
    Api(String),
    /// The response body could not be decoded.
    #[error("failed to decode model response: {0}")]
    Decode(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures and 429/5xx statuses are transient.
    /// Everything else (bad request, auth, malformed payloads) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Transport { .. } => true,
            ModelError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            ModelError::Api(_) | ModelError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ModelError::Decode(e.to_string());
        }
        ModelError::Transport {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

/// A text-completion model.
///
/// Uses a boxed future so that the trait stays dyn-compatible.
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` and return the raw response text.
    fn complete(&self, prompt: &str) -> ModelFuture<'_>;

    /// Identifier used in logs.
    fn name(&self) -> &str {
        "model"
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    fn complete(&self, prompt: &str) -> ModelFuture<'_> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        let err = ModelError::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = ModelError::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "HTTP {status} should be transient");
        }
        for status in [400, 401, 403, 404, 422] {
            let err = ModelError::Http {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "HTTP {status} should be permanent");
        }
    }

    #[test]
    fn payload_errors_are_permanent() {
        assert!(!ModelError::Api("model not found".into()).is_transient());
        assert!(!ModelError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn display_includes_status() {
        let err = ModelError::Http {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "model API HTTP 503: overloaded");
    }
}
