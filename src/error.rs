//! Error Types
//!
//! Failure taxonomy for the autofill engine. None of these escape the
//! engine: the client boundaries and the controllers log them and fall back
//! to a no-op.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutofillError {
    /// Network error or non-2xx status
    #[error("request failed{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    /// Body was not JSON, usually a login redirect rendering HTML
    #[error("unexpected response format ({content_type}): {message}")]
    Format { content_type: String, message: String },

    /// JSON arrived but says no, or lacks the expected payload
    #[error("rejected response: {0}")]
    Semantic(String),

    /// A field the engine needs could not be found in a scope
    #[error("field '{field}' not found in scope")]
    Locator { field: String },

    /// Page configuration could not be decoded
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type AutofillResult<T> = Result<T, AutofillError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {}", s)).unwrap_or_default()
}

impl AutofillError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        AutofillError::Transport { status, message: message.into() }
    }

    pub fn format(content_type: impl Into<String>, message: impl Into<String>) -> Self {
        AutofillError::Format { content_type: content_type.into(), message: message.into() }
    }
}

impl From<gloo_net::Error> for AutofillError {
    fn from(e: gloo_net::Error) -> Self {
        AutofillError::transport(None, e.to_string())
    }
}
