//! Gemini generateContent HTTP client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GeminiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for commit message generation.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable to override the default model.
const MODEL_ENV_VAR: &str = "EPIGRAM_GEMINI_MODEL";

/// Default timeout for a single generation request (1 minute).
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "EPIGRAM_GEMINI_TIMEOUT";

/// Get the configured request timeout.
///
/// Reads from EPIGRAM_GEMINI_TIMEOUT if set, otherwise uses the default
/// of 60 seconds. Logs a warning if the variable holds an invalid value.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Get the configured model id.
fn get_model() -> String {
    match env::var(MODEL_ENV_VAR) {
        Ok(v) if !v.is_empty() => v,
        _ => DEFAULT_MODEL.to_string(),
    }
}

/// A remote text-generation call. One implementation talks to Gemini;
/// tests substitute fakes.
#[async_trait]
pub trait GenerateText: Send + Sync {
    /// Perform a single generation attempt. Errors are classified via
    /// [`GeminiError::is_transient`] to drive the retry loop.
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError>;
}

// generateContent wire format.

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Error envelope Gemini returns on non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, GeminiError> {
        let timeout = get_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GeminiError::RequestFailed)?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: get_model(),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerateText for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::Timeout(self.timeout_secs)
                } else {
                    GeminiError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), response).await);
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::InvalidResponse(e.to_string()))?;

        extract_text(body)
    }
}

/// Map a non-2xx response to the error taxonomy.
async fn classify_status(status: u16, response: reqwest::Response) -> GeminiError {
    match status {
        429 => GeminiError::RateLimited,
        500..=599 => GeminiError::Unavailable { status },
        401 | 403 => GeminiError::InvalidApiKey { status },
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) => body.chars().take(200).collect(),
            };
            GeminiError::BadRequest { status, message }
        }
    }
}

/// Pull the generated text out of a response.
///
/// A response with no candidate content is a fatal [`GeminiError::EmptyResponse`];
/// present-but-blank text is returned as-is and becomes a no-op downstream.
fn extract_text(body: GenerateContentResponse) -> Result<String, GeminiError> {
    let content = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or(GeminiError::EmptyResponse)?;

    if content.parts.is_empty() {
        return Err(GeminiError::EmptyResponse);
    }

    Ok(content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join(""))
}
