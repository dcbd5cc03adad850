//! Error types for epigram modules using thiserror.

use thiserror::Error;

/// Errors from staged diff collection.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("No staged changes (the index matches HEAD)")]
    NoStagedChanges,

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),
}

/// Errors from the Gemini generation call.
///
/// Variants split into transient conditions (retried with backoff) and
/// fatal conditions (short-circuit the retry loop). See [`GeminiError::is_transient`].
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Gemini rate limit hit (HTTP 429)")]
    RateLimited,

    #[error("Gemini service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("Gemini request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to reach Gemini: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("Gemini rejected the API key (HTTP {status}). Check GEMINI_API_KEY")]
    InvalidApiKey { status: u16 },

    #[error("Gemini rejected the request (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Gemini returned a response with no generated text")]
    EmptyResponse,

    #[error("Gemini returned an unparseable response: {0}")]
    InvalidResponse(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GeminiError>),
}

impl GeminiError {
    /// Whether another attempt is worth making.
    ///
    /// Rate limits, 5xx responses, timeouts and connection failures are
    /// transient; credential and request-shape problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeminiError::RateLimited
                | GeminiError::Unavailable { .. }
                | GeminiError::Timeout(_)
                | GeminiError::RequestFailed(_)
        )
    }
}
