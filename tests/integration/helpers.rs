//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A ddk-style checkout with git history and a local bare remote
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestRepo {
  /// Create a checkout with the three release manifests at version 1.1.9
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("checkout");
    let remote = root.path().join("remote.git");
    std::fs::create_dir_all(&path)?;

    git(root.path(), &["init", "--bare", "remote.git"])?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["remote", "add", "origin", remote.to_str().unwrap()])?;

    std::fs::write(
      path.join("Cargo.toml"),
      r#"[package]
name = "ddk-ffi"
version = "1.1.9"
edition = "2021"

[dependencies]
thiserror = "2"
"#,
    )?;

    std::fs::create_dir_all(path.join("ddk-ts"))?;
    std::fs::write(
      path.join("ddk-ts/Cargo.toml"),
      r#"[package]
name = "ddk-ts"
version = "1.1.9"
edition = "2021"
"#,
    )?;
    std::fs::write(
      path.join("ddk-ts/package.json"),
      r#"{
  "name": "@bennyblader/ddk-ts",
  "version": "1.1.9",
  "main": "index.js"
}
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial checkout"])?;

    Ok(Self {
      _root: root,
      path,
      remote,
    })
  }

  /// Write release.toml and commit it so the tree starts clean
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("release.toml"), content)?;
    git(&self.path, &["add", "release.toml"])?;
    git(&self.path, &["commit", "-m", "Add release config"])?;
    Ok(())
  }

  pub fn read_file(&self, rel: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(rel))?)
  }

  pub fn file_exists(&self, rel: &str) -> bool {
    self.path.join(rel).exists()
  }

  /// Local tags in the checkout
  pub fn local_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "-l"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Tags visible in the bare remote
  pub fn remote_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.remote, &["tag", "-l"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Whether the bare remote received the given branch
  pub fn remote_has_branch(&self, branch: &str) -> bool {
    git(&self.remote, &["rev-parse", "--verify", branch]).is_ok()
  }

  /// `git status --porcelain` in the checkout
  pub fn status(&self) -> Result<String> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git, failing the test on a non-zero exit
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the ddk-release binary; callers assert on the exit status themselves
pub fn run_ddk_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_ddk-release");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run ddk-release")
}
