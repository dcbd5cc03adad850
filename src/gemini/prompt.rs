//! Prompt construction for AI-generated commit messages.

use crate::diff::StagedDiff;
use crate::message::MAX_SUBJECT_LENGTH;

/// Build the generation prompt from the staged diff.
///
/// Requests raw commit-message text (no fences, no JSON) so the normalizer
/// can split it on the first line.
pub fn build_prompt(diff: &StagedDiff) -> String {
    let files_section: String = diff
        .changed_paths
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    let truncation_note = if diff.truncated {
        "\n\nNote: The diff was truncated due to size. Base the message only on the visible changes."
    } else {
        ""
    };

    format!(
        r#"You are an expert software developer and git maintainer. Based on the staged git diff below, compose a concise, high-quality commit message using the Conventional Commits format.

## Staged Files
{files_section}

## Requirements (must follow exactly)
- Output only the raw commit message with no commentary, explanation, or markdown formatting.
- Use Conventional Commits types (feat, fix, docs, chore, refactor, perf, test, build, ci, style).
- The SUBJECT line (first line) is HARD LIMITED to {max_subject} characters including type and scope. If your first draft exceeds {max_subject} characters, shorten it. Drop adjectives, use shorter synonyms.
- Description in imperative mood ("add", "fix", "remove"), lowercase after the colon, no period at the end.
- Optionally follow the subject with a blank line and a short body explaining WHY the change was made, wrapped at 72 characters.
- Do NOT include surrounding backticks, triple-backticks, or quotes in your output.

### Subject examples
GOOD: feat(parser): add support for includes
BAD:  feat(parser): add comprehensive support for file include directives

## Staged git diff (do not invent changes, base the message only on this diff)
```
{diff_text}
```{truncation_note}"#,
        max_subject = MAX_SUBJECT_LENGTH,
        diff_text = diff.diff_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diff(paths: Vec<&str>, diff_text: &str) -> StagedDiff {
        StagedDiff {
            diff_text: diff_text.to_string(),
            changed_paths: paths.into_iter().map(String::from).collect(),
            truncated: false,
        }
    }

    #[test]
    fn test_prompt_includes_changed_paths() {
        let diff = make_diff(vec!["src/auth/login.rs", "src/auth/session.rs"], "+line\n");
        let prompt = build_prompt(&diff);

        assert!(prompt.contains("- src/auth/login.rs"));
        assert!(prompt.contains("- src/auth/session.rs"));
    }

    #[test]
    fn test_prompt_includes_diff_text() {
        let diff = make_diff(vec!["file.rs"], "+pub fn new_function() {}\n");
        let prompt = build_prompt(&diff);
        assert!(prompt.contains("pub fn new_function()"));
    }

    #[test]
    fn test_prompt_states_subject_limit() {
        let diff = make_diff(vec!["f.rs"], "+code\n");
        let prompt = build_prompt(&diff);
        assert!(prompt.contains("50 characters"));
        assert!(prompt.contains("HARD LIMITED"));
    }

    #[test]
    fn test_prompt_truncation_note() {
        let mut diff = make_diff(vec!["big.rs"], "lots of code");
        diff.truncated = true;

        let prompt = build_prompt(&diff);
        assert!(prompt.contains("truncated due to size"));
    }

    #[test]
    fn test_prompt_no_truncation_note_when_complete() {
        let diff = make_diff(vec!["small.rs"], "+tiny\n");
        let prompt = build_prompt(&diff);
        assert!(!prompt.contains("truncated due to size"));
    }

    #[test]
    fn test_prompt_forbids_wrapping() {
        let diff = make_diff(vec!["f.rs"], "+code\n");
        let prompt = build_prompt(&diff);
        assert!(prompt.contains("Do NOT include surrounding backticks"));
    }
}
