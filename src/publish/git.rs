//! System git wrapper for the publication steps
//!
//! Uses the git CLI with an isolated environment and the repository path
//! passed via `-C`; nothing here depends on the process working directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};

pub struct GitCli {
  root: PathBuf,
}

impl GitCli {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  /// Create a git command with an isolated environment
  ///
  /// - Repository passed via `-C`
  /// - Environment cleared, whitelisting PATH and HOME
  /// - Safe configuration overrides against surprising user config
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.root);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }

  fn run(&self, args: &[&str]) -> ReleaseResult<String> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::message(format!(
        "git {} failed: {}",
        args.join(" "),
        stderr.trim()
      )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Whether the root is inside a git work tree
  pub fn is_repository(&self) -> bool {
    self
      .git_cmd()
      .args(["rev-parse", "--is-inside-work-tree"])
      .output()
      .map(|o| o.status.success())
      .unwrap_or(false)
  }

  /// `git status --porcelain`; empty output means a clean tree
  pub fn status_porcelain(&self) -> ReleaseResult<String> {
    self.run(&["status", "--porcelain"])
  }

  /// Current branch name, or "HEAD" when detached
  pub fn current_branch(&self) -> ReleaseResult<String> {
    let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(if branch.is_empty() { "HEAD".to_string() } else { branch })
  }

  pub fn add_all(&self) -> ReleaseResult<()> {
    self.run(&["add", "-A"]).map(|_| ())
  }

  pub fn commit(&self, message: &str) -> ReleaseResult<()> {
    self.run(&["commit", "-m", message]).map(|_| ())
  }

  pub fn tag_annotated(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message]).map(|_| ())
  }

  /// Push one ref; branch and tag pushes are two distinct calls
  pub fn push(&self, remote: &str, refspec: &str) -> ReleaseResult<()> {
    self.run(&["push", remote, refspec]).map(|_| ())
  }
}
