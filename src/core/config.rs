//! Release configuration (release.toml) parsing and validation
//!
//! Searched in order: release.toml, .release.toml, .config/release.toml.
//! When no file exists the built-in defaults describe the ddk-ffi checkout:
//! the native crate at the root, the Node binding package under ddk-ts/.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bindings::PlatformKind;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::publish::registry::RegistryKind;

/// Top-level configuration for a coordinated release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  #[serde(default)]
  pub project: ProjectConfig,

  #[serde(default = "default_manifests")]
  pub manifests: Vec<ManifestConfig>,

  #[serde(default = "default_gates")]
  pub gates: Vec<GateConfig>,

  #[serde(default = "default_packages")]
  pub packages: Vec<PackageConfig>,

  #[serde(default)]
  pub bindings: BindingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
  /// Component name used in artifact file names
  #[serde(default = "default_component")]
  pub component: String,

  /// Tag prefix; the release tag is `{prefix}{version}`
  #[serde(default = "default_tag_prefix")]
  pub tag_prefix: String,

  /// Git remote that receives the branch and tag pushes
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Per-run artifacts directory (removed after a fully successful run)
  #[serde(default = "default_artifacts_dir")]
  pub artifacts_dir: PathBuf,

  /// Fixed wait before the registry propagation check, in seconds
  #[serde(default = "default_propagation_delay")]
  pub propagation_delay_secs: u64,
}

fn default_component() -> String {
  "ddk-ffi".to_string()
}

fn default_tag_prefix() -> String {
  "v".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_artifacts_dir() -> PathBuf {
  PathBuf::from("dist")
}

fn default_propagation_delay() -> u64 {
  20
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      component: default_component(),
      tag_prefix: default_tag_prefix(),
      remote: default_remote(),
      artifacts_dir: default_artifacts_dir(),
      propagation_delay_secs: default_propagation_delay(),
    }
  }
}

/// Manifest file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
  /// Cargo.toml, rewritten losslessly via toml_edit
  Cargo,
  /// package.json, version field spliced in place
  Npm,
}

/// One version-synced manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
  /// Path relative to the invocation root
  pub path: PathBuf,

  pub kind: ManifestKind,

  /// Package identifier the manifest describes (registry name)
  pub package: String,

  /// Missing optional manifests are skipped with a warning, not fatal
  #[serde(default)]
  pub optional: bool,
}

/// One validation gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
  pub label: String,

  /// Working directory, relative to the invocation root
  #[serde(default = "default_dot")]
  pub dir: PathBuf,

  /// Command and arguments
  pub command: Vec<String>,

  /// Package this gate belongs to; drives dependency ordering
  pub package: String,

  /// A required gate's failure aborts the pipeline
  #[serde(default = "default_true")]
  pub required: bool,
}

fn default_dot() -> PathBuf {
  PathBuf::from(".")
}

fn default_true() -> bool {
  true
}

/// One publishable package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Registry name (crate name, or scoped npm name)
  pub name: String,

  pub registry: RegistryKind,

  /// Directory the publish command runs in
  #[serde(default = "default_dot")]
  pub dir: PathBuf,

  /// Package names this one depends on; dependencies gate and publish first
  #[serde(default)]
  pub depends_on: Vec<String>,
}

/// Binding-build selection; host probes still decide applicability at run time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingsConfig {
  #[serde(default = "default_platforms")]
  pub platforms: Vec<PlatformKind>,
}

fn default_platforms() -> Vec<PlatformKind> {
  vec![PlatformKind::Ios, PlatformKind::Android, PlatformKind::Node]
}

impl Default for BindingsConfig {
  fn default() -> Self {
    Self {
      platforms: default_platforms(),
    }
  }
}

fn default_manifests() -> Vec<ManifestConfig> {
  vec![
    ManifestConfig {
      path: PathBuf::from("Cargo.toml"),
      kind: ManifestKind::Cargo,
      package: "ddk-ffi".to_string(),
      optional: false,
    },
    ManifestConfig {
      path: PathBuf::from("ddk-ts/Cargo.toml"),
      kind: ManifestKind::Cargo,
      package: "ddk-ts".to_string(),
      optional: false,
    },
    ManifestConfig {
      path: PathBuf::from("ddk-ts/package.json"),
      kind: ManifestKind::Npm,
      package: "@bennyblader/ddk-ts".to_string(),
      optional: false,
    },
  ]
}

fn default_gates() -> Vec<GateConfig> {
  vec![
    GateConfig {
      label: "native library tests".to_string(),
      dir: PathBuf::from("."),
      command: vec!["cargo".to_string(), "test".to_string()],
      package: "ddk-ffi".to_string(),
      required: true,
    },
    GateConfig {
      label: "node binding tests".to_string(),
      dir: PathBuf::from("ddk-ts"),
      command: vec!["npm".to_string(), "test".to_string()],
      package: "@bennyblader/ddk-ts".to_string(),
      required: false,
    },
  ]
}

fn default_packages() -> Vec<PackageConfig> {
  vec![
    PackageConfig {
      name: "ddk-ffi".to_string(),
      registry: RegistryKind::CratesIo,
      dir: PathBuf::from("."),
      depends_on: vec![],
    },
    PackageConfig {
      name: "@bennyblader/ddk-ts".to_string(),
      registry: RegistryKind::Npm,
      dir: PathBuf::from("ddk-ts"),
      depends_on: vec!["ddk-ffi".to_string()],
    },
  ]
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      project: ProjectConfig::default(),
      manifests: default_manifests(),
      gates: default_gates(),
      packages: default_packages(),
      bindings: BindingsConfig::default(),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = vec![
      root.join("release.toml"),
      root.join(".release.toml"),
      root.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from release.toml, or fall back to the built-in defaults
  pub fn load_or_default(root: &Path) -> ReleaseResult<Self> {
    let config = match Self::find_config_path(root) {
      Some(config_path) => {
        let content = fs::read_to_string(&config_path)
          .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        toml_edit::de::from_str::<ReleaseConfig>(&content)
          .with_context(|| format!("Failed to parse config from {}", config_path.display()))?
      }
      None => ReleaseConfig::default(),
    };

    config.validate()?;
    Ok(config)
  }

  /// Validate cross-references and command shapes
  pub fn validate(&self) -> ReleaseResult<()> {
    for gate in &self.gates {
      if gate.command.is_empty() {
        return Err(ReleaseError::message(format!("Gate '{}' has an empty command", gate.label)));
      }
    }

    for manifest in &self.manifests {
      if manifest.path.as_os_str().is_empty() {
        return Err(ReleaseError::message(format!(
          "Manifest for package '{}' has an empty path",
          manifest.package
        )));
      }
    }

    for package in &self.packages {
      for dep in &package.depends_on {
        if !self.packages.iter().any(|p| &p.name == dep) {
          return Err(ReleaseError::with_help(
            format!("Package '{}' depends on unknown package '{}'", package.name, dep),
            "depends_on entries must name another [[packages]] entry in release.toml",
          ));
        }
      }
    }

    Ok(())
  }
}
