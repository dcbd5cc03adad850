//! epigram - a prepare-commit-msg Git hook that drafts commit messages.
//!
//! # Overview
//!
//! epigram reads the staged diff, asks Gemini for a Conventional Commits
//! message under a bounded retry policy, normalizes the result, and writes
//! it into the file Git opens in the editor. Every failure path is a
//! terminal skip state: the hook never blocks a commit.

pub mod credentials;
pub mod diff;
pub mod error;
pub mod gemini;
pub mod hook;
pub mod message;

// Re-export commonly used types
pub use credentials::{CredentialSource, DotenvSource, EnvVarSource};
pub use diff::StagedDiff;
pub use error::{DiffError, GeminiError};
pub use hook::{HookOutcome, write_message};
pub use message::{CommitMessage, MAX_SUBJECT_LENGTH};
