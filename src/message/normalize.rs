//! Normalization of generated text into a commit message.
//!
//! Models wrap output in fences or quotes despite instructions, so the
//! stripping rules are data-driven: extend [`WRAPPERS`] or
//! [`FENCE_LANGUAGE_TAGS`] when a new wrapping shape shows up in the wild.

use crate::diff::StagedDiff;

/// Maximum subject line length, in characters.
pub const MAX_SUBJECT_LENGTH: usize = 50;

/// Symmetric wrapper pairs stripped from the whole text, outermost first.
const WRAPPERS: &[(&str, &str)] = &[("`", "`"), ("\"", "\""), ("'", "'")];

/// First lines dropped inside a fence when the model labels the block.
const FENCE_LANGUAGE_TAGS: &[&str] = &["text", "txt", "plaintext", "markdown", "md", "commit"];

/// A normalized commit message: bounded subject, verbatim body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    /// Single line, at most [`MAX_SUBJECT_LENGTH`] characters.
    pub subject: String,
    /// Body lines; empty means subject-only.
    pub body: Vec<String>,
}

impl CommitMessage {
    /// Render for git: subject, blank line, body.
    pub fn render(&self) -> String {
        if self.body.is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n{}", self.subject, self.body.join("\n"))
        }
    }

    /// Whether the subject follows the `type(scope)?: description` shape.
    ///
    /// Diagnostic only: a subject that fails this probe is still used
    /// unmodified.
    pub fn is_conventional(&self) -> bool {
        let re = regex_lite::Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?:\s+\S").unwrap();
        re.is_match(&self.subject)
    }
}

/// Normalize raw generated text. `None` means nothing usable was produced
/// and the destination must be left untouched.
pub fn normalize(raw: &str) -> Option<CommitMessage> {
    let cleaned = strip_wrappers(raw);

    let mut lines = cleaned.lines();
    let subject = lines.next().unwrap_or("").trim();
    if subject.is_empty() {
        return None;
    }

    let subject = truncate_subject(subject, MAX_SUBJECT_LENGTH);

    let mut body: Vec<String> = lines.map(str::to_string).collect();
    if body.first().is_some_and(|l| l.trim().is_empty()) {
        body.remove(0);
    }
    if body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }

    Some(CommitMessage { subject, body })
}

/// Strip code fences and symmetric wrappers until the text is stable.
fn strip_wrappers(text: &str) -> String {
    let mut current = text.trim().to_string();

    loop {
        let stripped = strip_fence(&current)
            .or_else(|| strip_pair(&current))
            .map(|s| s.trim().to_string());

        match stripped {
            Some(next) if next != current => current = next,
            _ => return current,
        }
    }
}

/// Remove one layer of triple-backtick fencing, dropping a leading
/// language tag line when it matches the known set.
fn strip_fence(text: &str) -> Option<String> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;

    let inner = inner.trim_start_matches(|c| c == ' ' || c == '\t');
    if let Some((first, rest)) = inner.split_once('\n')
        && FENCE_LANGUAGE_TAGS.contains(&first.trim().to_ascii_lowercase().as_str())
    {
        return Some(rest.to_string());
    }

    Some(inner.to_string())
}

/// Remove one layer of a symmetric wrapper pair around the whole text.
fn strip_pair(text: &str) -> Option<String> {
    for (open, close) in WRAPPERS {
        if text.len() > open.len() + close.len()
            && let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close))
        {
            return Some(inner.to_string());
        }
    }
    None
}

/// Truncate a subject to `max` characters at a whitespace boundary.
///
/// Counts in chars, so a multibyte character is never split. When the
/// truncated prefix contains no whitespace the hard cut stands. Trailing
/// ellipses and dangling punctuation left by the cut are dropped.
fn truncate_subject(subject: &str, max: usize) -> String {
    if subject.chars().count() <= max {
        return subject.to_string();
    }

    let cut = subject
        .char_indices()
        .nth(max)
        .map(|(idx, _)| &subject[..idx])
        .unwrap_or(subject);

    let truncated = match cut.rfind(char::is_whitespace) {
        Some(idx) => &cut[..idx],
        None => cut,
    };

    trim_dangling(truncated)
}

/// Drop trailing ellipses and punctuation a truncation can leave behind.
fn trim_dangling(text: &str) -> String {
    let mut result = text.trim_end().to_string();

    loop {
        if let Some(stripped) = result.strip_suffix("...") {
            result = stripped.trim_end().to_string();
            continue;
        }
        match result.chars().last() {
            Some('…' | '-' | ',' | ';' | ':') => {
                result.pop();
                result = result.trim_end().to_string();
            }
            _ => return result,
        }
    }
}

/// Log-friendly one-line summary of what was normalized.
pub fn describe(message: &CommitMessage, diff: &StagedDiff) -> String {
    format!(
        "{} ({} chars, {} body line(s), {} file(s){})",
        if message.is_conventional() {
            "conventional subject"
        } else {
            "free-form subject"
        },
        message.subject.chars().count(),
        message.body.len(),
        diff.changed_paths.len(),
        if diff.truncated { ", diff truncated" } else { "" },
    )
}
