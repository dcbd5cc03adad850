//! Gemini API key resolution.
//!
//! Lookup order:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. `GEMINI_API_KEY` entry in the repository's `.env` file
//!
//! Sources are queried in order; the first non-empty value wins. A missing
//! key is a recoverable condition, never an error.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable and `.env` key holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// A place an API key may come from. Tests inject fakes.
pub trait CredentialSource {
    /// Human-readable source name for diagnostics.
    fn name(&self) -> String;

    /// The key, if this source has a non-empty one.
    fn resolve(&self) -> Option<String>;
}

/// Reads a process environment variable.
pub struct EnvVarSource {
    var: String,
}

impl EnvVarSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvVarSource {
    fn name(&self) -> String {
        format!("environment variable {}", self.var)
    }

    fn resolve(&self) -> Option<String> {
        match env::var(&self.var) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        }
    }
}

/// Reads a `KEY=VALUE` entry from a dotenv-style file.
///
/// Understands `#` comments, blank lines, an optional `export ` prefix,
/// and single or double quotes around the value. Anything fancier (variable
/// interpolation, multiline values) is out of scope for a hook.
pub struct DotenvSource {
    path: PathBuf,
    var: String,
}

impl DotenvSource {
    pub fn new(path: impl Into<PathBuf>, var: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            var: var.into(),
        }
    }
}

impl CredentialSource for DotenvSource {
    fn name(&self) -> String {
        format!("{} in {}", self.var, self.path.display())
    }

    fn resolve(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim() != self.var {
                continue;
            }

            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);

            if !value.is_empty() {
                return Some(value.to_string());
            }
        }

        None
    }
}

/// Query sources in order; first non-empty key wins.
pub fn resolve_api_key(sources: &[Box<dyn CredentialSource>]) -> Option<String> {
    for source in sources {
        if let Some(key) = source.resolve() {
            tracing::debug!("Resolved API key from {}", source.name());
            return Some(key);
        }
    }
    None
}

/// The default source chain: process environment, then the repository's
/// `.env` file when a work directory is known.
pub fn default_sources(workdir: Option<&Path>) -> Vec<Box<dyn CredentialSource>> {
    let mut sources: Vec<Box<dyn CredentialSource>> =
        vec![Box::new(EnvVarSource::new(API_KEY_VAR))];

    if let Some(dir) = workdir {
        sources.push(Box::new(DotenvSource::new(dir.join(".env"), API_KEY_VAR)));
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct FakeSource {
        value: Option<&'static str>,
    }

    impl CredentialSource for FakeSource {
        fn name(&self) -> String {
            "fake".to_string()
        }

        fn resolve(&self) -> Option<String> {
            self.value.map(String::from)
        }
    }

    #[test]
    fn test_first_non_empty_source_wins() {
        let sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(FakeSource { value: None }),
            Box::new(FakeSource {
                value: Some("from-second"),
            }),
            Box::new(FakeSource {
                value: Some("from-third"),
            }),
        ];

        assert_eq!(resolve_api_key(&sources).unwrap(), "from-second");
    }

    #[test]
    fn test_all_sources_empty_is_none() {
        let sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(FakeSource { value: None }),
            Box::new(FakeSource { value: None }),
        ];

        assert!(resolve_api_key(&sources).is_none());
    }

    #[test]
    #[serial]
    fn test_env_var_source() {
        temp_env::with_var(API_KEY_VAR, Some("secret-key"), || {
            let source = EnvVarSource::new(API_KEY_VAR);
            assert_eq!(source.resolve().unwrap(), "secret-key");
        });
    }

    #[test]
    #[serial]
    fn test_env_var_source_empty_value_is_none() {
        temp_env::with_var(API_KEY_VAR, Some("  "), || {
            let source = EnvVarSource::new(API_KEY_VAR);
            assert!(source.resolve().is_none());
        });
    }

    #[test]
    #[serial]
    fn test_env_var_source_unset_is_none() {
        temp_env::with_var_unset(API_KEY_VAR, || {
            let source = EnvVarSource::new(API_KEY_VAR);
            assert!(source.resolve().is_none());
        });
    }

    #[test]
    fn test_dotenv_source_reads_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nOTHER=x\nGEMINI_API_KEY=dotenv-key\n").unwrap();

        let source = DotenvSource::new(&path, API_KEY_VAR);
        assert_eq!(source.resolve().unwrap(), "dotenv-key");
    }

    #[test]
    fn test_dotenv_source_handles_quotes_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "export GEMINI_API_KEY=\"quoted-key\"\n").unwrap();

        let source = DotenvSource::new(&path, API_KEY_VAR);
        assert_eq!(source.resolve().unwrap(), "quoted-key");

        std::fs::write(&path, "GEMINI_API_KEY='single-quoted'\n").unwrap();
        assert_eq!(source.resolve().unwrap(), "single-quoted");
    }

    #[test]
    fn test_dotenv_source_missing_file_is_none() {
        let source = DotenvSource::new("/nonexistent/.env", API_KEY_VAR);
        assert!(source.resolve().is_none());
    }

    #[test]
    fn test_dotenv_source_empty_value_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "GEMINI_API_KEY=\n").unwrap();

        let source = DotenvSource::new(&path, API_KEY_VAR);
        assert!(source.resolve().is_none());
    }

    #[test]
    #[serial]
    fn test_default_chain_env_beats_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "GEMINI_API_KEY=from-file\n").unwrap();

        temp_env::with_var(API_KEY_VAR, Some("from-env"), || {
            let sources = default_sources(Some(dir.path()));
            assert_eq!(resolve_api_key(&sources).unwrap(), "from-env");
        });

        temp_env::with_var_unset(API_KEY_VAR, || {
            let sources = default_sources(Some(dir.path()));
            assert_eq!(resolve_api_key(&sources).unwrap(), "from-file");
        });
    }
}
