//! Version-field rewrites that leave the rest of the manifest untouched
//!
//! Cargo manifests go through toml_edit, which preserves formatting and
//! comments. JSON manifests are spliced with a targeted replacement of the
//! first "version" string so the file's own formatting survives; the result
//! is re-parsed to prove the splice produced valid JSON.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::error::{ManifestError, ReleaseError, ReleaseResult};

fn npm_version_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r#""version"(\s*:\s*)"[^"]*""#).unwrap())
}

/// Rewrite the `[package] version` of a Cargo.toml
pub fn set_cargo_version(path: &Path, content: &str, version: &str) -> ReleaseResult<String> {
  let mut doc: toml_edit::DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
    ReleaseError::Manifest(ManifestError::ParseFailed {
      path: path.to_path_buf(),
      detail: e.to_string(),
    })
  })?;

  let Some(package) = doc.get_mut("package").and_then(|p| p.as_table_mut()) else {
    return Err(ReleaseError::Manifest(ManifestError::MissingVersionField {
      path: path.to_path_buf(),
    }));
  };

  if !package.contains_key("version") {
    return Err(ReleaseError::Manifest(ManifestError::MissingVersionField {
      path: path.to_path_buf(),
    }));
  }

  package["version"] = toml_edit::value(version);
  Ok(doc.to_string())
}

/// Rewrite the first top-level `"version"` string of a package.json
pub fn set_npm_version(path: &Path, content: &str, version: &str) -> ReleaseResult<String> {
  let re = npm_version_re();

  if !re.is_match(content) {
    return Err(ReleaseError::Manifest(ManifestError::MissingVersionField {
      path: path.to_path_buf(),
    }));
  }

  let replacement = format!(r#""version"${{1}}"{}""#, version);
  let rewritten = re.replace(content, replacement.as_str()).into_owned();

  // The splice must yield valid JSON carrying the new version
  let value: serde_json::Value =
    serde_json::from_str(&rewritten).map_err(|e| {
      ReleaseError::Manifest(ManifestError::ParseFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
      })
    })?;

  match value.get("version").and_then(|v| v.as_str()) {
    Some(v) if v == version => Ok(rewritten),
    _ => Err(ReleaseError::Manifest(ManifestError::ParseFailed {
      path: path.to_path_buf(),
      detail: "version field did not survive the rewrite".to_string(),
    })),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn p() -> PathBuf {
    PathBuf::from("test-manifest")
  }

  #[test]
  fn test_cargo_rewrite_preserves_everything_else() {
    let content = r#"# release manifest
[package]
name = "ddk-ffi"
version = "1.1.9"  # bumped by ddk-release
edition = "2021"

[dependencies]
thiserror = "2"
"#;
    let out = set_cargo_version(&p(), content, "1.2.0").unwrap();
    assert!(out.contains("version = \"1.2.0\""));
    assert!(out.contains("# release manifest"));
    assert!(out.contains("thiserror = \"2\""));
    assert!(!out.contains("1.1.9"));

    // Everything except the version line is byte-identical
    let expected: Vec<&str> = content.lines().filter(|l| !l.contains("version")).collect();
    let actual: Vec<&str> = out.lines().filter(|l| !l.contains("version")).collect();
    assert_eq!(expected, actual);
  }

  #[test]
  fn test_cargo_missing_version_field() {
    let content = "[package]\nname = \"ddk-ffi\"\n";
    let err = set_cargo_version(&p(), content, "1.2.0").unwrap_err();
    assert!(err.to_string().contains("No version field"));
  }

  #[test]
  fn test_cargo_missing_package_table() {
    let content = "[workspace]\nmembers = []\n";
    assert!(set_cargo_version(&p(), content, "1.2.0").is_err());
  }

  #[test]
  fn test_npm_rewrite_is_a_targeted_splice() {
    let content = "{\n    \"name\": \"@bennyblader/ddk-ts\",\n    \"version\": \"1.1.9\",\n    \"main\": \"index.js\"\n}\n";
    let out = set_npm_version(&p(), content, "1.2.0").unwrap();
    assert!(!out.contains("\"version\": \"1.1.9\""));
    assert!(out.contains("\"version\": \"1.2.0\""));
    // Four-space indentation and field order survive
    assert!(out.contains("{\n    \"name\": \"@bennyblader/ddk-ts\",\n    \"version\": \"1.2.0\","));
  }

  #[test]
  fn test_npm_only_first_version_key_changes() {
    let content = r#"{
  "version": "1.1.9",
  "dependencies": { "other": { "version": "3.0.0" } }
}"#;
    let out = set_npm_version(&p(), content, "1.2.0").unwrap();
    assert!(out.contains("\"version\": \"1.2.0\""));
    assert!(out.contains("\"version\": \"3.0.0\""));
  }

  #[test]
  fn test_npm_missing_version_field() {
    let content = "{ \"name\": \"demo\" }";
    let err = set_npm_version(&p(), content, "1.2.0").unwrap_err();
    assert!(err.to_string().contains("No version field"));
  }
}
