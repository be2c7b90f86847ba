//! Pipeline scenarios: preconditions, fail-fast ordering, publication steps

use crate::helpers::{TestRepo, run_ddk_release};
use anyhow::Result;

const MANIFESTS: &str = r#"
[[manifests]]
path = "Cargo.toml"
kind = "cargo"
package = "ddk-ffi"

[[manifests]]
path = "ddk-ts/Cargo.toml"
kind = "cargo"
package = "ddk-ts"

[[manifests]]
path = "ddk-ts/package.json"
kind = "npm"
package = "@bennyblader/ddk-ts"

[[packages]]
name = "ddk-ffi"
registry = "crates-io"

[bindings]
platforms = []
"#;

fn config_with_gate(gate: &str) -> String {
  format!(
    r#"[project]
propagation_delay_secs = 0
{}
{}"#,
    MANIFESTS, gate
  )
}

#[test]
fn test_dirty_tree_aborts_before_any_stage() -> Result<()> {
  let repo = TestRepo::new()?;
  std::fs::write(repo.path.join("scratch.txt"), "uncommitted")?;

  let output = run_ddk_release(&repo.path, &["1.2.0"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("not clean"));

  // The version sync never ran
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.1.9\""));
  assert!(repo.local_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_required_gate_failure_stops_after_version_sync() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(&config_with_gate(
    r#"[[gates]]
label = "always failing"
command = ["false"]
package = "ddk-ffi"
required = true
"#,
  ))?;

  let output = run_ddk_release(&repo.path, &["1.2.0"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Gate failed"));

  // The stage before the gate ran: every manifest carries the new version
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  assert!(repo.read_file("ddk-ts/Cargo.toml")?.contains("version = \"1.2.0\""));
  assert!(repo.read_file("ddk-ts/package.json")?.contains("\"version\": \"1.2.0\""));

  // Nothing after the gate ran: no packaging, no tag, nothing pushed
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("sync-versions"));
  assert!(stdout.contains("gates"));
  assert!(!stdout.contains("Packaging artifacts"));
  assert!(!repo.file_exists("dist"));
  assert!(repo.local_tags()?.is_empty());
  assert!(repo.remote_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_version_sync_only_touches_version_lines() -> Result<()> {
  let repo = TestRepo::new()?;
  let before = repo.read_file("Cargo.toml")?;
  repo.write_config(&config_with_gate(
    r#"[[gates]]
label = "always failing"
command = ["false"]
package = "ddk-ffi"
required = true
"#,
  ))?;

  run_ddk_release(&repo.path, &["1.2.0"])?;
  let after = repo.read_file("Cargo.toml")?;

  let untouched_before: Vec<&str> = before.lines().filter(|l| !l.contains("version")).collect();
  let untouched_after: Vec<&str> = after.lines().filter(|l| !l.contains("version")).collect();
  assert_eq!(untouched_before, untouched_after);
  assert!(after.contains("version = \"1.2.0\""));
  Ok(())
}

#[test]
fn test_optional_gate_failure_continues_to_publication() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(&config_with_gate(
    r#"[[gates]]
label = "flaky optional suite"
command = ["false"]
package = "ddk-ffi"
required = false
"#,
  ))?;

  let output = run_ddk_release(&repo.path, &["1.2.0"])?;

  // The run still fails (no release host available in tests), but only at
  // the host-release step: everything up to the tag pushes happened
  assert_eq!(output.status.code(), Some(1));
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("continuing"));
  assert!(stdout.contains("Packaging artifacts"));

  assert!(repo.local_tags()?.contains(&"v1.2.0".to_string()));
  assert!(repo.remote_has_branch("main"));
  assert!(repo.remote_tags()?.contains(&"v1.2.0".to_string()));

  // Scratch space is kept on failure for postmortem inspection
  assert!(repo.file_exists("dist"));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Recovery checklist"));
  Ok(())
}

#[test]
fn test_missing_optional_manifest_is_skipped() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(
    r#"[project]
propagation_delay_secs = 0

[[manifests]]
path = "Cargo.toml"
kind = "cargo"
package = "ddk-ffi"

[[manifests]]
path = "ddk-swift/Package.swift.json"
kind = "npm"
package = "ddk-swift"
optional = true

[[packages]]
name = "ddk-ffi"
registry = "crates-io"

[bindings]
platforms = []

[[gates]]
label = "stop here"
command = ["false"]
package = "ddk-ffi"
"#,
  )?;

  let output = run_ddk_release(&repo.path, &["1.2.0"])?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Skipping optional manifest"));
  assert!(repo.read_file("Cargo.toml")?.contains("version = \"1.2.0\""));
  Ok(())
}

#[test]
fn test_missing_required_manifest_is_fatal() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(
    r#"[[manifests]]
path = "does-not-exist/Cargo.toml"
kind = "cargo"
package = "ghost"

[[packages]]
name = "ddk-ffi"
registry = "crates-io"

[bindings]
platforms = []
"#,
  )?;

  let output = run_ddk_release(&repo.path, &["1.2.0"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Manifest not found"));
  assert!(repo.local_tags()?.is_empty());
  Ok(())
}
