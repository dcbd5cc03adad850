//! epigram - prepare-commit-msg hook entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use git2::Repository;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use epigram::credentials::default_sources;
use epigram::hook::{self, HookOutcome};

/// Draft a Conventional Commits message from the staged diff.
///
/// Git invokes this as the prepare-commit-msg hook:
///   prepare-commit-msg <commit_msg_file> [commit_source] [commit_object]
#[derive(Parser, Debug)]
#[command(name = "epigram")]
#[command(about = "Draft a Conventional Commits message from the staged diff using Gemini")]
#[command(version)]
struct Cli {
    /// Path to the commit message file Git will open in the editor
    commit_msg_file: PathBuf,

    /// Where the message came from (message, template, merge, squash, commit)
    commit_source: Option<String>,

    /// Commit object name (passed by Git for --amend)
    commit_object: Option<String>,

    /// Run the full pipeline but print the message instead of writing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // A hook must never block the commit: any error below is logged and
    // swallowed, and the process still exits 0.
    if let Err(e) = run(cli).await {
        warn!("epigram failed, leaving the commit message untouched: {e:#}");
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("epigram=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    debug!(
        "Hook args: file={}, source={:?}, object={:?}",
        cli.commit_msg_file.display(),
        cli.commit_source,
        cli.commit_object
    );

    let repo = Repository::discover(".").context("Not inside a git repository")?;

    let workdir = repo.workdir().map(Path::to_path_buf);
    let sources = default_sources(workdir.as_deref());

    let outcome = hook::pipeline::run(&repo, cli.commit_source.as_deref(), &sources).await?;

    match &outcome {
        HookOutcome::Written(message) => {
            if cli.dry_run {
                println!("{}", message.render());
            } else {
                hook::write_message(&cli.commit_msg_file, message)
                    .context("Failed to write the commit message file")?;
                info!(
                    "Wrote commit message to {}",
                    cli.commit_msg_file.display()
                );
            }
        }
        skipped => info!("{}", skipped.describe()),
    }

    Ok(())
}
