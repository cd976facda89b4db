//! Model call plumbing.
//!
//! - [`retry`]: transient error detection with configurable exponential
//!   backoff and jitter. Only transport failures and 429/5xx responses are
//!   retried; a response that arrived but failed validation never is.

pub mod retry;

pub use retry::{RetryConfig, retry_model_call};
