//! Bounded exponential backoff for generation attempts.

use std::env;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::GeminiError;

use super::client::GenerateText;

/// Configuration: 3 total attempts, base 1s doubling to a 30s cap.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_INTERVAL_MS: u64 = 1_000;
const MAX_INTERVAL_SECS: u64 = 30;

/// Environment variable to override the attempt count.
const MAX_ATTEMPTS_ENV_VAR: &str = "EPIGRAM_MAX_ATTEMPTS";

/// Environment variable to override the base interval (milliseconds).
const INITIAL_INTERVAL_ENV_VAR: &str = "EPIGRAM_RETRY_BASE_MS";

/// Get the configured attempt budget (at least 1).
fn get_max_attempts() -> u32 {
    match env::var(MAX_ATTEMPTS_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}",
                    MAX_ATTEMPTS_ENV_VAR, v, DEFAULT_MAX_ATTEMPTS
                );
                DEFAULT_MAX_ATTEMPTS
            }
        },
        _ => DEFAULT_MAX_ATTEMPTS,
    }
}

/// Get the configured base backoff interval.
fn get_initial_interval() -> Duration {
    match env::var(INITIAL_INTERVAL_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}ms",
                    INITIAL_INTERVAL_ENV_VAR, v, DEFAULT_INITIAL_INTERVAL_MS
                );
                Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS)
            }
        },
        _ => Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS),
    }
}

/// Generate text with bounded exponential backoff.
///
/// Transient errors are retried up to the attempt budget, sleeping for a
/// doubling interval between attempts (never after the last one). Fatal
/// errors short-circuit immediately. Exhaustion wraps the last transient
/// error in [`GeminiError::RetriesExhausted`].
pub async fn generate_with_retry<C>(client: &C, prompt: &str) -> Result<String, GeminiError>
where
    C: GenerateText + ?Sized,
{
    let max_attempts = get_max_attempts();
    let mut backoff = ExponentialBackoff {
        current_interval: get_initial_interval(),
        initial_interval: get_initial_interval(),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        attempts += 1;

        match client.generate(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() => {
                warn!(
                    "Transient Gemini error (attempt {}/{}): {}",
                    attempts, max_attempts, e
                );
                last_error = Some(e);

                if attempts < max_attempts
                    && let Some(wait_duration) = backoff.next_backoff()
                {
                    tokio::time::sleep(wait_duration).await;
                }
            }
            // Non-recoverable conditions skip the remaining attempts.
            Err(e) => return Err(e),
        }
    }

    Err(GeminiError::RetriesExhausted(Box::new(
        last_error.expect("last_error should be Some after failed retries"),
    )))
}
