//! Registry operations: auth checks, publishing, version queries
//!
//! Both registries are driven through their CLIs with fixed argument
//! shapes; exit status and stdout are the only consumed surface.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{PublishError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::exec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryKind {
  Npm,
  CratesIo,
}

impl fmt::Display for RegistryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegistryKind::Npm => write!(f, "npm"),
      RegistryKind::CratesIo => write!(f, "crates.io"),
    }
  }
}

impl RegistryKind {
  /// Fail fast if a publish would be rejected for missing credentials
  pub fn ensure_authenticated(&self, dir: &Path) -> ReleaseResult<()> {
    match self {
      RegistryKind::Npm => match exec::capture_ok(dir, "npm", &["whoami"]).context("npm auth probe failed")? {
        Some(user) => {
          println!("   🔑 npm: authenticated as {}", user);
          Ok(())
        }
        None => Err(ReleaseError::Publish(PublishError::AuthRequired {
          registry: "npm".to_string(),
          login_hint: "Run `npm login` (or export NPM_TOKEN) and re-run the release.".to_string(),
        })),
      },
      RegistryKind::CratesIo => {
        if std::env::var_os("CARGO_REGISTRY_TOKEN").is_some() || cargo_credentials_exist() {
          Ok(())
        } else {
          Err(ReleaseError::Publish(PublishError::AuthRequired {
            registry: "crates.io".to_string(),
            login_hint: "Run `cargo login` with a crates.io token and re-run the release.".to_string(),
          }))
        }
      }
    }
  }

  /// Publish the package living in `dir`
  pub fn publish(&self, dir: &Path, _package: &str) -> ReleaseResult<()> {
    match self {
      RegistryKind::Npm => exec::run_checked(dir, "npm", &["publish", "--access", "public"]),
      RegistryKind::CratesIo => exec::run_checked(dir, "cargo", &["publish"]),
    }
  }

  /// Registry-visible version of a package, if the query succeeds
  pub fn query_version(&self, dir: &Path, package: &str) -> ReleaseResult<Option<String>> {
    match self {
      RegistryKind::Npm => exec::capture_ok(dir, "npm", &["view", package, "version"]),
      RegistryKind::CratesIo => {
        let output = exec::capture_ok(dir, "cargo", &["search", package, "--limit", "1"])?;
        Ok(output.and_then(|text| parse_cargo_search(&text, package)))
      }
    }
  }
}

fn cargo_credentials_exist() -> bool {
  let cargo_home = std::env::var_os("CARGO_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cargo")));

  match cargo_home {
    Some(home) => home.join("credentials.toml").exists() || home.join("credentials").exists(),
    None => false,
  }
}

/// Extract the version from `cargo search` output
///
/// The first line for an exact match looks like:
/// `ddk-ffi = "0.5.2"    # DLC transaction primitives`
pub fn parse_cargo_search(output: &str, package: &str) -> Option<String> {
  let prefix = format!("{} = \"", package);
  output.lines().find_map(|line| {
    let rest = line.strip_prefix(&prefix)?;
    rest.split('"').next().map(|v| v.to_string())
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_cargo_search_exact_match() {
    let output = "ddk-ffi = \"0.5.2\"    # DLC transaction primitives\n";
    assert_eq!(parse_cargo_search(output, "ddk-ffi").as_deref(), Some("0.5.2"));
  }

  #[test]
  fn test_parse_cargo_search_ignores_other_crates() {
    let output = "ddk-ffi-extras = \"9.9.9\"    # not it\nddk-ffi = \"1.2.0\"    # it\n";
    assert_eq!(parse_cargo_search(output, "ddk-ffi").as_deref(), Some("1.2.0"));
  }

  #[test]
  fn test_parse_cargo_search_no_match() {
    let output = "something-else = \"0.1.0\"\n";
    assert_eq!(parse_cargo_search(output, "ddk-ffi"), None);
  }

  #[test]
  fn test_registry_display_names() {
    assert_eq!(RegistryKind::Npm.to_string(), "npm");
    assert_eq!(RegistryKind::CratesIo.to_string(), "crates.io");
  }
}
