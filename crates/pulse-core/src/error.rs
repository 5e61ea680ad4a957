//! Error types for sampling and load generation.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for pulse operations.
pub type PulseResult<T> = Result<T, PulseError>;

/// Errors surfaced by the sampler, the generator, and their adapters.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("job listing failed: {0}")]
    Listing(String),

    #[error("metric publish failed: {0}")]
    Publish(String),

    #[error("job submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("config error: {0}")]
    Config(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// How a failed remote call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limiting, throttling, or momentary unavailability.
    Retryable,
    /// Malformed request, authorization failure, missing resource.
    Fatal,
}

/// A classified failure from the job-submission API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct SubmitError {
    pub class: ErrorClass,
    pub code: String,
    pub message: String,
}

impl SubmitError {
    /// Build an error whose class is derived from the service error code.
    pub fn from_code(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            class: classify_code(code),
            code: code.unwrap_or(TRANSPORT_CODE).to_string(),
            message: message.into(),
        }
    }

    pub fn retryable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Retryable,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn fatal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Fatal,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class == ErrorClass::Retryable
    }
}

/// Code recorded for failures that never reached the service.
pub const TRANSPORT_CODE: &str = "TransportError";

const FATAL_CODES: &[&str] = &[
    "BadRequestException",
    "ValidationException",
    "AccessDeniedException",
    "UnauthorizedException",
    "UnrecognizedClientException",
    "NotFoundException",
    "ResourceNotFoundException",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
];

/// Classify a service error code.
///
/// A missing code means the request failed in transport or timed out and
/// is retryable. Unknown codes are retryable too; the retry budget bounds
/// them. `ConflictException` is retryable because each attempt uses a
/// fresh job name.
pub fn classify_code(code: Option<&str>) -> ErrorClass {
    match code {
        Some(c) if FATAL_CODES.contains(&c) => ErrorClass::Fatal,
        _ => ErrorClass::Retryable,
    }
}
