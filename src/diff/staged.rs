//! Staged diff collection using git2.
//!
//! Only the index is diffed against HEAD: the generated message must
//! describe what will actually be committed, so unstaged and untracked
//! changes are invisible here.

use git2::{DiffFlags, DiffFormat, ErrorCode, Repository, Tree};
use tracing::warn;

use crate::error::DiffError;

/// Maximum bytes of unified diff text before truncation.
pub const MAX_DIFF_BYTES: usize = 30_000;

/// The staged changes of a repository, bounded for prompt inclusion.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    /// Unified diff text, cut at a line boundary when over budget.
    pub diff_text: String,
    /// Changed paths in diff order, deduplicated. Binary files appear
    /// here even though their content is excluded from `diff_text`.
    pub changed_paths: Vec<String>,
    pub truncated: bool,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// so staged files in a fresh repository still produce a diff against the
/// empty tree. Real errors (corrupt HEAD, missing objects) propagate.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, DiffError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(DiffError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(DiffError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged diff (HEAD tree vs. index).
///
/// Returns [`DiffError::NoStagedChanges`] when the index matches HEAD —
/// the caller treats that as a terminal no-op, not a fault.
pub fn collect_staged_diff(repo: &Repository) -> Result<StagedDiff, DiffError> {
    let head_tree = resolve_head_tree(repo)?;

    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(DiffError::DiffFailed)?;

    let changed_paths = collect_changed_paths(&diff);
    if changed_paths.is_empty() {
        return Err(DiffError::NoStagedChanges);
    }

    let mut diff_text = String::new();
    let mut truncated = false;

    if let Err(e) = diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        if truncated {
            return true;
        }

        // Binary content would corrupt the prompt; the path list is enough.
        if delta.flags().contains(DiffFlags::BINARY) || line.origin() == 'B' {
            return true;
        }

        let content = std::str::from_utf8(line.content()).unwrap_or("");

        // Whole lines only: stop before the budget would be crossed.
        if diff_text.len() + content.len() + 2 > MAX_DIFF_BYTES {
            truncated = true;
            return true;
        }

        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            diff_text.push(origin);
        }
        diff_text.push_str(content);

        true
    }) {
        warn!("Failed to collect staged diff text: {e}");
        truncated = true;
    }

    Ok(StagedDiff {
        diff_text,
        changed_paths,
        truncated,
    })
}

/// Collect changed paths in diff order, deduplicated.
fn collect_changed_paths(diff: &git2::Diff<'_>) -> Vec<String> {
    let mut paths = Vec::new();

    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        if !path.is_empty() && !paths.contains(&path) {
            paths.push(path);
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::path::Path;

    fn init_repo_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let sig = Signature::now("Test", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    fn stage(repo: &Repository, name: &str) {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_clean_index_returns_no_staged_changes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        let result = collect_staged_diff(&repo);
        assert!(matches!(result, Err(DiffError::NoStagedChanges)));
    }

    #[test]
    fn test_unstaged_change_is_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        // Working tree change without `git add` must not count as staged.
        std::fs::write(dir.path().join("loose.txt"), "not staged\n").unwrap();

        let result = collect_staged_diff(&repo);
        assert!(matches!(result, Err(DiffError::NoStagedChanges)));
    }

    #[test]
    fn test_staged_new_file_appears_in_diff() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        std::fs::write(dir.path().join("new.txt"), "hello world\n").unwrap();
        stage(&repo, "new.txt");

        let diff = collect_staged_diff(&repo).unwrap();
        assert_eq!(diff.changed_paths, vec!["new.txt".to_string()]);
        assert!(diff.diff_text.contains("hello world"));
        assert!(!diff.truncated);
    }

    #[test]
    fn test_staged_diff_in_unborn_repo() {
        // No commits yet; staged files diff against the empty tree.
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        std::fs::write(dir.path().join("first.txt"), "first\n").unwrap();
        stage(&repo, "first.txt");

        let diff = collect_staged_diff(&repo).unwrap();
        assert_eq!(diff.changed_paths, vec!["first.txt".to_string()]);
        assert!(diff.diff_text.contains("first"));
    }

    #[test]
    fn test_under_budget_diff_is_verbatim_and_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        let content = "fn main() {}\n".repeat(50);
        std::fs::write(dir.path().join("small.rs"), &content).unwrap();
        stage(&repo, "small.rs");

        let diff = collect_staged_diff(&repo).unwrap();
        assert!(!diff.truncated);
        assert!(diff.diff_text.len() <= MAX_DIFF_BYTES);
        // Every staged line made it through.
        assert_eq!(diff.diff_text.matches("fn main() {}").count(), 50);
    }

    #[test]
    fn test_over_budget_diff_truncates_at_line_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        // Each line is 100 bytes of payload; 500 lines blows the 30k budget.
        let line = "x".repeat(99);
        let content = format!("{line}\n").repeat(500);
        std::fs::write(dir.path().join("big.txt"), &content).unwrap();
        stage(&repo, "big.txt");

        let diff = collect_staged_diff(&repo).unwrap();
        assert!(diff.truncated);
        assert!(diff.diff_text.len() <= MAX_DIFF_BYTES);
        assert!(
            diff.diff_text.ends_with('\n'),
            "truncation must not cut mid-line"
        );
    }

    #[test]
    fn test_binary_file_is_path_only() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        std::fs::write(dir.path().join("image.bin"), [0u8, 159, 146, 150, 0, 1]).unwrap();
        stage(&repo, "image.bin");

        let diff = collect_staged_diff(&repo).unwrap();
        assert_eq!(diff.changed_paths, vec!["image.bin".to_string()]);
        assert!(
            !diff.diff_text.contains('\u{FFFD}'),
            "binary content must not leak into the diff text"
        );
    }

    #[test]
    fn test_staged_modification_shows_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        std::fs::write(dir.path().join("file.txt"), "original\n").unwrap();
        stage(&repo, "file.txt");
        {
            let sig = Signature::now("Test", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }

        std::fs::write(dir.path().join("file.txt"), "modified\n").unwrap();
        stage(&repo, "file.txt");

        let diff = collect_staged_diff(&repo).unwrap();
        assert!(diff.diff_text.contains("-original"));
        assert!(diff.diff_text.contains("+modified"));
    }

    #[test]
    fn test_changed_paths_preserve_diff_order() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b\n").unwrap();
        std::fs::write(dir.path().join("c.txt"), "c\n").unwrap();
        stage(&repo, "a.txt");
        stage(&repo, "b.txt");
        stage(&repo, "c.txt");

        let diff = collect_staged_diff(&repo).unwrap();
        assert_eq!(diff.changed_paths, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
