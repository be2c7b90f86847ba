//! Subprocess execution with explicit working directories
//!
//! Every external command names its working directory at the call site; the
//! pipeline never changes the process-wide current directory. Gates and
//! builds inherit stdio so their output passes straight through; registry
//! queries capture stdout.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};

/// Render a command line for error messages and logs
pub fn display(program: &str, args: &[&str]) -> String {
  if args.is_empty() {
    program.to_string()
  } else {
    format!("{} {}", program, args.join(" "))
  }
}

/// Run a command with inherited stdio, blocking until it exits
pub fn run_status(dir: &Path, program: &str, args: &[&str]) -> ReleaseResult<ExitStatus> {
  Command::new(program)
    .current_dir(dir)
    .args(args)
    .status()
    .with_context(|| format!("Failed to spawn: {}", display(program, args)))
}

/// Run a command with inherited stdio and fail on non-zero exit
pub fn run_checked(dir: &Path, program: &str, args: &[&str]) -> ReleaseResult<()> {
  let status = run_status(dir, program, args)?;
  if !status.success() {
    return Err(ReleaseError::message(format!(
      "Command failed (exit {}): {}",
      status.code().unwrap_or(-1),
      display(program, args)
    )));
  }
  Ok(())
}

/// Run a command, capturing stdout; non-zero exit is an error carrying stderr
pub fn capture(dir: &Path, program: &str, args: &[&str]) -> ReleaseResult<String> {
  let output = Command::new(program)
    .current_dir(dir)
    .args(args)
    .stdin(Stdio::null())
    .output()
    .with_context(|| format!("Failed to spawn: {}", display(program, args)))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(ReleaseError::message(format!(
      "Command failed (exit {}): {}\n{}",
      output.status.code().unwrap_or(-1),
      display(program, args),
      stderr.trim()
    )));
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command where a non-zero exit is an expected outcome, not an error
///
/// Returns `Some(stdout)` on success, `None` on non-zero exit. Spawn
/// failures (missing binary) still propagate as errors.
pub fn capture_ok(dir: &Path, program: &str, args: &[&str]) -> ReleaseResult<Option<String>> {
  let output = Command::new(program)
    .current_dir(dir)
    .args(args)
    .stdin(Stdio::null())
    .output()
    .with_context(|| format!("Failed to spawn: {}", display(program, args)))?;

  if !output.status.success() {
    return Ok(None);
  }

  Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn cwd() -> PathBuf {
    std::env::current_dir().unwrap()
  }

  #[test]
  fn test_display_joins_args() {
    assert_eq!(display("git", &["push", "origin"]), "git push origin");
    assert_eq!(display("git", &[]), "git");
  }

  #[test]
  fn test_capture_trims_stdout() {
    let out = capture(&cwd(), "echo", &["hello"]).unwrap();
    assert_eq!(out, "hello");
  }

  #[test]
  fn test_capture_ok_on_failing_command() {
    let out = capture_ok(&cwd(), "false", &[]).unwrap();
    assert!(out.is_none());
  }

  #[test]
  fn test_run_checked_reports_command_line() {
    let err = run_checked(&cwd(), "false", &[]).unwrap_err();
    assert!(err.to_string().contains("false"));
  }
}
