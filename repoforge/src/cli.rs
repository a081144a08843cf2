//! CLI argument definitions for the repository-improvement workflow.

use anyhow::Result;
use clap::Parser;

/// Automated repository-improvement orchestrator
///
/// Classifies the request, analyzes the repository, plans a set of
/// improvement operations, executes them, and reviews the result. Planning
/// decisions are replayed from a YAML decision script, which keeps runs
/// reproducible.
#[derive(Parser, Debug, Clone)]
#[command(name = "repoforge")]
#[command(about = "Automated repository-improvement orchestrator")]
#[command(version)]
pub struct Args {
    /// Local path of the repository to improve
    #[arg(long, value_name = "PATH", required_unless_present = "catalog")]
    pub repo: Option<String>,

    /// Repository URL recorded in the run state
    ///
    /// Defaults to the local path when omitted.
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    /// The improvement request, in plain language
    #[arg(long, value_name = "TEXT", required_unless_present = "catalog")]
    pub request: Option<String>,

    /// Path to the YAML decision script
    ///
    /// An ordered sequence of decisions; the first answers the intent
    /// classification, the next answers operation selection.
    #[arg(long, value_name = "PATH", required_unless_present = "catalog")]
    pub decisions: Option<String>,

    /// Where generated files are written
    ///
    /// Defaults to the repository path itself.
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<String>,

    /// Write the final state as a YAML run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<String>,

    /// Attempt budget for each model decision
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub max_retries: u32,

    /// Base backoff between model retries, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub retry_base_ms: u64,

    /// Reviewer rejections tolerated before the run errors out
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub max_replan_cycles: usize,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print the builtin operation catalog as JSON and exit
    #[arg(long)]
    pub catalog: bool,
}

impl Args {
    /// Validate arguments for a workflow run (not consulted for --catalog)
    pub fn validate(&self) -> Result<()> {
        let request = self.request.as_deref().unwrap_or("");
        if request.trim().is_empty() {
            anyhow::bail!("--request must not be empty");
        }
        let decisions = self.decisions.as_deref().unwrap_or("");
        if !std::path::Path::new(decisions).is_file() {
            anyhow::bail!("Decision script '{}' does not exist", decisions);
        }
        if self.max_retries == 0 {
            anyhow::bail!("--max-retries must be at least 1");
        }
        Ok(())
    }
}
