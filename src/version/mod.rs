//! Release version validation and manifest synchronization
//!
//! One validated version string is the single source of truth for a run:
//! it is written into every configured manifest before anything else
//! happens, and every later stage (archive names, tag, release notes,
//! registry checks) derives from it.

pub mod manifest;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::config::{ManifestConfig, ManifestKind};
use crate::core::error::{ManifestError, ReleaseError, ReleaseResult, ResultExt};

/// A validated `MAJOR.MINOR.PATCH[-PRERELEASE]` version
///
/// Build metadata (`+...`) is rejected: it never appears in tags, archive
/// names, or registry versions, so accepting it would only create ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
  raw: String,
  parsed: semver::Version,
}

impl ReleaseVersion {
  /// Validate a version string against the release grammar
  pub fn parse(input: &str) -> ReleaseResult<Self> {
    let parsed = semver::Version::parse(input).map_err(|e| {
      ReleaseError::with_help(
        format!("Invalid version '{}': {}", input, e),
        "Versions look like 1.2.0 or 1.2.0-beta.1 (no leading 'v', no build metadata).",
      )
    })?;

    if !parsed.build.is_empty() {
      return Err(ReleaseError::with_help(
        format!("Invalid version '{}': build metadata is not allowed", input),
        "Strip the '+...' suffix; registries and tags carry plain semver.",
      ));
    }

    Ok(Self {
      raw: input.to_string(),
      parsed,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// Tag name for this release, e.g. `v1.2.0`
  pub fn tag(&self, prefix: &str) -> String {
    format!("{}{}", prefix, self.raw)
  }

  pub fn is_prerelease(&self) -> bool {
    !self.parsed.pre.is_empty()
  }
}

impl fmt::Display for ReleaseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

impl FromStr for ReleaseVersion {
  type Err = ReleaseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ReleaseVersion::parse(s)
  }
}

/// Rewrites the version field of every configured manifest in place
///
/// Not transactional: a failure partway leaves earlier manifests updated.
/// The pipeline's clean-tree precondition makes that state recoverable with
/// a plain `git checkout -- .`.
pub struct VersionCoordinator<'a> {
  root: &'a Path,
}

impl<'a> VersionCoordinator<'a> {
  pub fn new(root: &'a Path) -> Self {
    Self { root }
  }

  /// Set every manifest's version field, returning the updated paths
  pub fn sync(&self, version: &ReleaseVersion, manifests: &[ManifestConfig]) -> ReleaseResult<Vec<PathBuf>> {
    let mut updated = Vec::new();

    for entry in manifests {
      let path = self.root.join(&entry.path);

      if !path.exists() {
        if entry.optional {
          println!("   ⚠️  Skipping optional manifest (not found): {}", entry.path.display());
          continue;
        }
        return Err(ReleaseError::Manifest(ManifestError::NotFound {
          path: entry.path.clone(),
        }));
      }

      let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read manifest {}", path.display()))?;

      let rewritten = match entry.kind {
        ManifestKind::Cargo => manifest::set_cargo_version(&entry.path, &content, version.as_str())?,
        ManifestKind::Npm => manifest::set_npm_version(&entry.path, &content, version.as_str())?,
      };

      fs::write(&path, rewritten).with_context(|| format!("Failed to write manifest {}", path.display()))?;

      println!("   {} → {}", entry.path.display(), version);
      updated.push(entry.path.clone());
    }

    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::{ManifestConfig, ManifestKind};

  #[test]
  fn test_valid_versions() {
    assert!(ReleaseVersion::parse("1.2.0").is_ok());
    assert!(ReleaseVersion::parse("0.1.0").is_ok());
    assert!(ReleaseVersion::parse("1.2.0-beta.1").is_ok());
    assert!(ReleaseVersion::parse("10.20.30-rc.2").is_ok());
  }

  #[test]
  fn test_invalid_versions() {
    assert!(ReleaseVersion::parse("1.2").is_err());
    assert!(ReleaseVersion::parse("v1.2.0").is_err());
    assert!(ReleaseVersion::parse("1.2.0+build.5").is_err());
    assert!(ReleaseVersion::parse("").is_err());
    assert!(ReleaseVersion::parse("not-a-version").is_err());
  }

  #[test]
  fn test_tag_and_prerelease() {
    let v = ReleaseVersion::parse("1.2.0-beta.1").unwrap();
    assert_eq!(v.tag("v"), "v1.2.0-beta.1");
    assert!(v.is_prerelease());

    let v = ReleaseVersion::parse("1.2.0").unwrap();
    assert!(!v.is_prerelease());
  }

  fn manifest(path: &str, kind: ManifestKind, optional: bool) -> ManifestConfig {
    ManifestConfig {
      path: PathBuf::from(path),
      kind,
      package: "test".to_string(),
      optional,
    }
  }

  #[test]
  fn test_sync_rewrites_both_kinds() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("Cargo.toml"),
      "[package]\nname = \"demo\"\nversion = \"1.1.9\"\n",
    )
    .unwrap();
    fs::write(
      dir.path().join("package.json"),
      "{\n  \"name\": \"demo\",\n  \"version\": \"1.1.9\"\n}\n",
    )
    .unwrap();

    let version = ReleaseVersion::parse("1.2.0").unwrap();
    let manifests = vec![
      manifest("Cargo.toml", ManifestKind::Cargo, false),
      manifest("package.json", ManifestKind::Npm, false),
    ];

    let updated = VersionCoordinator::new(dir.path()).sync(&version, &manifests).unwrap();
    assert_eq!(updated.len(), 2);

    let cargo = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
    assert!(cargo.contains("version = \"1.2.0\""));
    let npm = fs::read_to_string(dir.path().join("package.json")).unwrap();
    assert!(npm.contains("\"version\": \"1.2.0\""));
  }

  #[test]
  fn test_sync_missing_required_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let version = ReleaseVersion::parse("1.2.0").unwrap();
    let manifests = vec![manifest("Cargo.toml", ManifestKind::Cargo, false)];

    let err = VersionCoordinator::new(dir.path()).sync(&version, &manifests).unwrap_err();
    assert!(err.to_string().contains("Manifest not found"));
  }

  #[test]
  fn test_sync_missing_optional_manifest_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("Cargo.toml"),
      "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();

    let version = ReleaseVersion::parse("0.2.0").unwrap();
    let manifests = vec![
      manifest("missing/package.json", ManifestKind::Npm, true),
      manifest("Cargo.toml", ManifestKind::Cargo, false),
    ];

    let updated = VersionCoordinator::new(dir.path()).sync(&version, &manifests).unwrap();
    assert_eq!(updated, vec![PathBuf::from("Cargo.toml")]);
  }
}
