//! Binding generation and per-target builds
//!
//! Each platform pairs a generation command with compilation commands.
//! Whether a platform applies is decided at run time from host capability
//! probes (operating system, toolchain env vars, tools on PATH); an
//! inapplicable platform is skipped with a warning, never an error. Only a
//! required platform's command failure aborts the pipeline.

pub mod patch;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{BuildError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::exec;

/// Binding targets the pipeline knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
  Ios,
  Android,
  Node,
}

impl PlatformKind {
  pub fn tag(&self) -> &'static str {
    match self {
      PlatformKind::Ios => "ios",
      PlatformKind::Android => "android",
      PlatformKind::Node => "node",
    }
  }
}

impl fmt::Display for PlatformKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.tag())
  }
}

/// Host capabilities, probed once per run
#[derive(Debug, Clone)]
pub struct HostProbe {
  pub os: &'static str,
  pub ndk_home: Option<PathBuf>,
  pub npm_available: bool,
}

impl HostProbe {
  pub fn detect(root: &Path) -> Self {
    let ndk_home = std::env::var_os("ANDROID_NDK_HOME")
      .map(PathBuf::from)
      .filter(|p| p.is_dir());

    // Spawn failure means npm is absent from PATH
    let npm_available = matches!(exec::capture_ok(root, "npm", &["--version"]), Ok(Some(_)));

    Self {
      os: std::env::consts::OS,
      ndk_home,
      npm_available,
    }
  }
}

/// One platform's build recipe: generate, patch, compile
pub struct Platform {
  pub kind: PlatformKind,
  pub required: bool,
  dir: PathBuf,
  generate: Vec<String>,
  builds: Vec<Vec<String>>,
  patch_file: Option<PathBuf>,
}

impl Platform {
  /// Why this platform cannot run on the current host, if it cannot
  fn skip_reason(&self, probe: &HostProbe) -> Option<String> {
    match self.kind {
      PlatformKind::Ios if probe.os != "macos" => Some("requires a macOS host".to_string()),
      PlatformKind::Android if probe.ndk_home.is_none() => {
        Some("ANDROID_NDK_HOME is not set to an NDK directory".to_string())
      }
      PlatformKind::Node if !probe.npm_available => Some("npm is not on PATH".to_string()),
      _ => None,
    }
  }
}

/// Built-in platform recipes for the ddk checkout
pub fn platforms() -> Vec<Platform> {
  vec![
    Platform {
      kind: PlatformKind::Ios,
      required: false,
      dir: PathBuf::from("."),
      generate: cmd(&[
        "cargo",
        "run",
        "--features",
        "uniffi/cli",
        "--bin",
        "uniffi-bindgen",
        "--",
        "generate",
        "src/ddk_ffi.udl",
        "--language",
        "swift",
        "--out-dir",
        "build/ios/bindings",
      ]),
      builds: vec![
        cmd(&["cargo", "build", "--release", "--target", "aarch64-apple-ios"]),
        cmd(&[
          "xcodebuild",
          "-create-xcframework",
          "-library",
          "target/aarch64-apple-ios/release/libddk_ffi.a",
          "-headers",
          "build/ios/bindings",
          "-output",
          "build/ios/DdkFFI.xcframework",
        ]),
      ],
      patch_file: Some(PathBuf::from("build/ios/bindings/ddk_ffiFFI.h")),
    },
    Platform {
      kind: PlatformKind::Android,
      required: false,
      dir: PathBuf::from("."),
      generate: cmd(&[
        "cargo",
        "run",
        "--features",
        "uniffi/cli",
        "--bin",
        "uniffi-bindgen",
        "--",
        "generate",
        "src/ddk_ffi.udl",
        "--language",
        "kotlin",
        "--out-dir",
        "build/android/bindings",
      ]),
      builds: vec![cmd(&[
        "cargo",
        "ndk",
        "-t",
        "arm64-v8a",
        "-t",
        "armeabi-v7a",
        "-t",
        "x86_64",
        "-o",
        "build/android/jniLibs",
        "build",
        "--release",
      ])],
      patch_file: None,
    },
    Platform {
      kind: PlatformKind::Node,
      required: true,
      dir: PathBuf::from("ddk-ts"),
      generate: cmd(&["npm", "run", "build"]),
      builds: vec![],
      patch_file: None,
    },
  ]
}

fn cmd(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|s| s.to_string()).collect()
}

/// Outcome of the binding stage
#[derive(Debug, Default)]
pub struct BuildSummary {
  pub built: Vec<PlatformKind>,
  pub skipped: Vec<(PlatformKind, String)>,
  pub warnings: Vec<String>,
}

pub struct BindingBuilder<'a> {
  root: &'a Path,
  probe: HostProbe,
}

impl<'a> BindingBuilder<'a> {
  pub fn new(root: &'a Path, probe: HostProbe) -> Self {
    Self { root, probe }
  }

  /// Generate and build bindings for every selected, applicable platform
  pub fn run(&self, selection: &[PlatformKind]) -> ReleaseResult<BuildSummary> {
    let mut summary = BuildSummary::default();

    for platform in platforms() {
      if !selection.contains(&platform.kind) {
        continue;
      }

      if let Some(reason) = platform.skip_reason(&self.probe) {
        println!("   ⚠️  Skipping {} bindings: {}", platform.kind, reason);
        summary.skipped.push((platform.kind, reason));
        continue;
      }

      if let Err(err) = self.build_platform(&platform) {
        if platform.required {
          return Err(err);
        }
        let warning = format!("Optional platform {} failed: {}", platform.kind, err);
        println!("   ⚠️  {}", warning);
        summary.warnings.push(warning);
        continue;
      }

      summary.built.push(platform.kind);
    }

    Ok(summary)
  }

  fn build_platform(&self, platform: &Platform) -> ReleaseResult<()> {
    let dir = self.root.join(&platform.dir);

    println!("   🔧 Generating {} bindings", platform.kind);
    self.run_command(platform, &dir, &platform.generate, true)?;

    if let Some(rel) = &platform.patch_file {
      self.apply_patch(platform, rel)?;
    }

    for build in &platform.builds {
      self.run_command(platform, &dir, build, false)?;
    }

    Ok(())
  }

  fn run_command(&self, platform: &Platform, dir: &Path, command: &[String], generation: bool) -> ReleaseResult<()> {
    let program = command[0].as_str();
    let args: Vec<&str> = command.iter().skip(1).map(String::as_str).collect();
    let command_line = exec::display(program, &args);

    let failed = |detail: String| {
      let platform = platform.kind.to_string();
      let command = command_line.clone();
      if generation {
        ReleaseError::Build(BuildError::GenerationFailed {
          platform,
          command,
          detail,
        })
      } else {
        ReleaseError::Build(BuildError::BuildFailed {
          platform,
          command,
          detail,
        })
      }
    };

    let status = exec::run_status(dir, program, &args).map_err(|e| failed(e.to_string()))?;
    if !status.success() {
      return Err(failed(format!("exit status {}", status.code().unwrap_or(-1))));
    }
    Ok(())
  }

  /// Apply the generator-output patch; a no-op when already applied
  fn apply_patch(&self, platform: &Platform, rel: &Path) -> ReleaseResult<()> {
    let path = self.root.join(rel);
    if !path.exists() {
      println!("   ⚠️  Expected generated file missing, not patching: {}", rel.display());
      return Ok(());
    }

    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let fixed = patch::fix_generated_include(&text);

    if fixed != text {
      fs::write(&path, fixed).with_context(|| format!("Failed to write {}", path.display()))?;
      println!("   🩹 Patched {} include in {}", platform.kind, rel.display());
    }

    Ok(())
  }
}
