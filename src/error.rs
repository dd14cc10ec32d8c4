use crate::bulk::{JobId, JobState};
use crate::error_code::ApiErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field or parameter that caused the error (e.g., "input[3].email", "base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected shape, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "job_runner")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A failure reported by the API itself through a non-success `status`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("API error ({kind}): {}", .message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Raw status string as sent by the server
    pub status: String,
    pub message: Option<String>,
    /// Server-side execution time in milliseconds
    pub execution_time: Option<u64>,
}

impl ApiError {
    pub fn new(
        status: impl Into<String>,
        message: Option<String>,
        execution_time: Option<u64>,
    ) -> Self {
        let status = status.into();
        Self {
            kind: ApiErrorKind::from_status(&status),
            status,
            message,
            execution_time,
        }
    }
}

/// Unified error type for the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Api(#[from] ApiError),

    /// The API answered with a payload that has no `status` field.
    #[error("Unexpected API response (missing status): {payload}")]
    UnexpectedResponse { payload: serde_json::Value },

    #[error("Invalid job state: cannot {operation} job {job_id} while {}", format_state(.state))]
    InvalidJobState {
        job_id: JobId,
        state: Option<JobState>,
        operation: &'static str,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },
}

fn format_state(state: &Option<JobState>) -> String {
    match state {
        Some(state) => state.to_string(),
        None => "untracked".to_string(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// The API failure kind, if this error was reported by the API.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
