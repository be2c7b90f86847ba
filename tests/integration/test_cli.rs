//! CLI contract: exit codes and argument validation

use crate::helpers::{TestRepo, run_ddk_release};
use anyhow::Result;

#[test]
fn test_help_exits_zero() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_ddk_release(&repo.path, &["--help"])?;

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Usage"));
  assert!(stdout.contains("ddk-release"));
  Ok(())
}

#[test]
fn test_missing_version_exits_one() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_ddk_release(&repo.path, &[])?;

  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_unknown_flag_exits_one() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_ddk_release(&repo.path, &["--frobnicate", "1.2.0"])?;

  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_invalid_version_exits_one_and_touches_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_ddk_release(&repo.path, &["1.2"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Invalid version"));

  // No filesystem or git state was touched
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.1.9\""));
  assert!(repo.read_file("ddk-ts/package.json")?.contains("\"version\": \"1.1.9\""));
  assert_eq!(repo.status()?, "");
  assert!(!repo.file_exists("dist"));
  Ok(())
}

#[test]
fn test_build_metadata_version_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  let output = run_ddk_release(&repo.path, &["1.2.0+build.5"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("build metadata"));
  Ok(())
}
