//! Narrow interfaces to the excluded subsystems, plus local implementations
//! good enough to run the workflow end to end without a network backend.
//!
//! The core only sees the traits; what `analyze` returns is an opaque JSON
//! value that operations inspect through `WorkflowState::repo_fact`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Repository preparation and analysis
#[async_trait]
pub trait RepoCollaborator: Send + Sync {
    /// Make a working tree available (clone/fork/branch as needed) and
    /// return its path
    async fn prepare(&self) -> Result<PathBuf>;

    /// Extract dependency, documentation, test, and workflow facts
    async fn analyze(&self, repo_path: &Path) -> Result<Value>;
}

/// A clarification absorbed while the run is waiting for user input
#[derive(Debug, Clone, Default)]
pub struct Clarification {
    pub user_request: String,
    pub attachment: Option<String>,
}

/// Interactive clarification channel
#[async_trait]
pub trait Clarifier: Send + Sync {
    async fn prompt_user(&self) -> Result<Clarification>;
}

/// Collaborator that works against an already-checked-out local repository
pub struct LocalRepo {
    path: PathBuf,
}

impl LocalRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RepoCollaborator for LocalRepo {
    async fn prepare(&self) -> Result<PathBuf> {
        if !self.path.is_dir() {
            bail!(
                "Repository path {} does not exist or is not a directory",
                self.path.display()
            );
        }
        Ok(self.path.clone())
    }

    async fn analyze(&self, repo_path: &Path) -> Result<Value> {
        let manifest = detect_manifest(repo_path);
        let name = manifest
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| {
                repo_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "repository".to_string())
            });

        Ok(json!({
            "name": name,
            "language": manifest.as_ref().map(|m| m.language.clone()),
            "dependencies": manifest.map(|m| m.dependencies).unwrap_or_default(),
            "has_readme": has_entry(repo_path, &["README.md", "README.rst", "README"]),
            "has_contributing": has_entry(repo_path, &["CONTRIBUTING.md", "CONTRIBUTING"]),
            "has_tests": repo_path.join("tests").is_dir() || repo_path.join("test").is_dir(),
            "has_ci": dir_has_files(&repo_path.join(".github").join("workflows")),
        }))
    }
}

/// Facts pulled from a build manifest
struct ManifestFacts {
    language: String,
    name: Option<String>,
    dependencies: Vec<String>,
}

fn detect_manifest(repo_path: &Path) -> Option<ManifestFacts> {
    let cargo = repo_path.join("Cargo.toml");
    if cargo.is_file() {
        return Some(parse_cargo_manifest(&cargo));
    }
    if repo_path.join("package.json").is_file() {
        return Some(ManifestFacts {
            language: "javascript".to_string(),
            name: None,
            dependencies: Vec::new(),
        });
    }
    if repo_path.join("pyproject.toml").is_file() || repo_path.join("setup.py").is_file() {
        return Some(ManifestFacts {
            language: "python".to_string(),
            name: None,
            dependencies: Vec::new(),
        });
    }
    None
}

/// Line-oriented scan of Cargo.toml for the package name and dependency
/// names. Good enough for fact extraction; not a full TOML parse.
fn parse_cargo_manifest(path: &Path) -> ManifestFacts {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    let mut name = None;
    let mut dependencies = Vec::new();
    let mut section = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].to_string();
            continue;
        }
        if section == "package" && name.is_none() {
            if let Some(rest) = line.strip_prefix("name") {
                let value = rest.trim_start_matches(['=', ' ', '\t']).trim_matches('"');
                if !value.is_empty() {
                    name = Some(value.to_string());
                }
            }
        }
        if section.ends_with("dependencies") && !line.is_empty() && !line.starts_with('#') {
            if let Some(dep) = line.split(['=', ' ', '\t']).next() {
                if !dep.is_empty() {
                    dependencies.push(dep.trim().to_string());
                }
            }
        }
    }

    ManifestFacts {
        language: "rust".to_string(),
        name,
        dependencies,
    }
}

fn has_entry(repo_path: &Path, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| repo_path.join(c).is_file())
}

fn dir_has_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Clarifier backed by stdin: prints the prompt, reads one line
pub struct StdinClarifier;

/// Read one clarification line. Zero bytes means the input is closed, and a
/// closed channel can never unblock the run, so it is an error rather than
/// an empty answer.
fn read_clarification(reader: &mut impl BufRead) -> Result<Clarification> {
    let mut line = String::new();
    let bytes = reader
        .read_line(&mut line)
        .context("Failed to read clarification")?;
    if bytes == 0 {
        bail!("Input closed while waiting for clarification");
    }

    Ok(Clarification {
        user_request: line.trim().to_string(),
        attachment: None,
    })
}

#[async_trait]
impl Clarifier for StdinClarifier {
    async fn prompt_user(&self) -> Result<Clarification> {
        print!("Your request needs clarification. Please elaborate: ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        read_clarification(&mut std::io::stdin().lock())
    }
}
