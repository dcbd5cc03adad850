//! The generation pipeline as an explicit terminal-state machine.
//!
//! Every anticipated failure becomes a skip state so the caller can always
//! let the commit proceed. Only genuinely unexpected conditions (repository
//! corruption, I/O failures) surface as errors, and the binary converts
//! those to a logged no-op too.

use anyhow::Result;
use git2::Repository;
use tracing::{debug, info, warn};

use crate::credentials::{CredentialSource, resolve_api_key};
use crate::diff::{StagedDiff, collect_staged_diff};
use crate::error::DiffError;
use crate::gemini::client::{GeminiClient, GenerateText};
use crate::gemini::{build_prompt, generate_with_retry};
use crate::message::normalize::describe;
use crate::message::{CommitMessage, normalize};

/// Terminal states of one hook invocation. Every variant except `Written`
/// leaves the destination untouched, and all of them exit the process
/// successfully.
#[derive(Debug)]
pub enum HookOutcome {
    /// A message was produced and should reach the destination.
    Written(CommitMessage),
    /// Git reported a user-supplied message (`-m`, `--amend`); keep it.
    SkippedUserMessage,
    /// The index matches HEAD; there is nothing to describe.
    SkippedNoChanges,
    /// No API key could be resolved; no network call was made.
    SkippedNoApiKey,
    /// Generation failed definitively (after retries, or fatally).
    SkippedGenerationFailed(String),
    /// The model produced nothing usable after normalization.
    SkippedEmptyMessage,
}

impl HookOutcome {
    /// Short reason for logs and the dry-run summary.
    pub fn describe(&self) -> String {
        match self {
            HookOutcome::Written(msg) => format!("generated: {}", msg.subject),
            HookOutcome::SkippedUserMessage => {
                "skipped: commit message supplied by the user".to_string()
            }
            HookOutcome::SkippedNoChanges => "skipped: no staged changes".to_string(),
            HookOutcome::SkippedNoApiKey => {
                "skipped: no Gemini API key configured".to_string()
            }
            HookOutcome::SkippedGenerationFailed(reason) => {
                format!("skipped: generation failed ({reason})")
            }
            HookOutcome::SkippedEmptyMessage => {
                "skipped: model returned an empty message".to_string()
            }
        }
    }
}

/// Whether Git's `commit_source` argument means the user already wrote the
/// message. `message` is set for `-m`/`-F`, `commit` for `--amend`/`-c`.
fn is_user_supplied(commit_source: Option<&str>) -> bool {
    matches!(
        commit_source.map(str::to_ascii_lowercase).as_deref(),
        Some("message") | Some("commit")
    )
}

/// Run the full pipeline: source guard, diff, credentials, generation,
/// normalization. Writing is the caller's job so preview mode can reuse
/// this path unchanged.
pub async fn run(
    repo: &Repository,
    commit_source: Option<&str>,
    sources: &[Box<dyn CredentialSource>],
) -> Result<HookOutcome> {
    if is_user_supplied(commit_source) {
        return Ok(HookOutcome::SkippedUserMessage);
    }

    // Diff first: a clean index skips before any credential lookup.
    let diff = match collect_staged_diff(repo) {
        Ok(diff) => diff,
        Err(DiffError::NoStagedChanges) => return Ok(HookOutcome::SkippedNoChanges),
        Err(e) => return Err(e.into()),
    };

    let Some(api_key) = resolve_api_key(sources) else {
        return Ok(HookOutcome::SkippedNoApiKey);
    };

    let client = GeminiClient::new(api_key)?;
    generate_message(&diff, &client).await
}

/// Generation and normalization against an injectable client.
pub async fn generate_message(
    diff: &StagedDiff,
    client: &dyn GenerateText,
) -> Result<HookOutcome> {
    let prompt = build_prompt(diff);
    debug!(
        "Prompt: {} chars, {} file(s), truncated={}",
        prompt.len(),
        diff.changed_paths.len(),
        diff.truncated
    );

    let raw = match generate_with_retry(client, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping AI commit message generation: {e}");
            return Ok(HookOutcome::SkippedGenerationFailed(e.to_string()));
        }
    };

    match normalize(&raw) {
        Some(message) => {
            info!("Normalized message: {}", describe(&message, diff));
            Ok(HookOutcome::Written(message))
        }
        None => Ok(HookOutcome::SkippedEmptyMessage),
    }
}
