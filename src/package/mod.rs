//! Artifact packaging: build outputs → immutable, deterministically named files
//!
//! Each platform with an existing build output becomes exactly one file in
//! the per-run artifacts directory, named `{component}-{tag}-{version}.{ext}`.
//! Directory outputs are staged into a temporary aggregation directory and
//! archived as gzipped tar so the archive layout never depends on where the
//! build system nested its output; single-file Node modules are renamed
//! copies. An absent output directory omits the artifact, nothing more.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::core::error::{PackagingError, ReleaseError, ReleaseResult, ResultExt};
use crate::ui::progress::FileProgress;
use crate::version::ReleaseVersion;

/// A packaged build output, immutable once created
#[derive(Debug, Clone)]
pub struct Artifact {
  /// Platform tag ("ios", "android", "node")
  pub tag: String,
  pub path: PathBuf,
  /// Display label for the release asset (name minus version and extension)
  pub label: String,
  pub size: u64,
  pub sha256: String,
}

enum Source {
  /// A directory tree, archived as .tar.gz
  Tree(PathBuf),
  /// A single file, copied under the deterministic name
  File { path: PathBuf, ext: &'static str },
}

struct ArtifactSpec {
  component: String,
  tag: &'static str,
  source: Source,
}

/// Where each platform's build output lands in the ddk checkout
fn artifact_specs(component: &str) -> Vec<ArtifactSpec> {
  vec![
    ArtifactSpec {
      component: component.to_string(),
      tag: "ios",
      source: Source::Tree(PathBuf::from("build/ios/DdkFFI.xcframework")),
    },
    ArtifactSpec {
      component: component.to_string(),
      tag: "android",
      source: Source::Tree(PathBuf::from("build/android")),
    },
    ArtifactSpec {
      component: "ddk-ts".to_string(),
      tag: "node",
      source: Source::File {
        path: PathBuf::from("ddk-ts/index.node"),
        ext: "node",
      },
    },
  ]
}

/// Deterministic artifact file name
pub fn archive_file_name(component: &str, tag: &str, version: &ReleaseVersion, ext: &str) -> String {
  format!("{}-{}-{}.{}", component, tag, version, ext)
}

/// Release-asset label: file name with the version suffix and extension stripped
pub fn display_label(file_name: &str, version: &str) -> String {
  let base = file_name
    .strip_suffix(".tar.gz")
    .or_else(|| file_name.strip_suffix(".node"))
    .unwrap_or(file_name);

  base
    .strip_suffix(&format!("-{}", version))
    .unwrap_or(base)
    .to_string()
}

pub struct ArtifactPackager<'a> {
  root: &'a Path,
  out_dir: PathBuf,
}

impl<'a> ArtifactPackager<'a> {
  pub fn new(root: &'a Path, artifacts_dir: &Path) -> Self {
    Self {
      root,
      out_dir: root.join(artifacts_dir),
    }
  }

  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  /// Package every platform whose build output exists
  pub fn package(&self, version: &ReleaseVersion, component: &str) -> ReleaseResult<Vec<Artifact>> {
    fs::create_dir_all(&self.out_dir)
      .with_context(|| format!("Failed to create artifacts directory {}", self.out_dir.display()))?;

    let mut artifacts = Vec::new();

    for spec in artifact_specs(component) {
      let packaged = match &spec.source {
        Source::Tree(rel) => {
          let src = self.root.join(rel);
          if !src.is_dir() {
            println!("   ·  No {} output at {}, omitting artifact", spec.tag, rel.display());
            continue;
          }
          let name = archive_file_name(&spec.component, spec.tag, version, "tar.gz");
          let dest = self.out_dir.join(&name);
          self
            .archive_tree(&src, &dest, spec.tag)
            .map_err(|e| packaging_error(spec.tag, e))?;
          (name, dest)
        }
        Source::File { path, ext } => {
          let src = self.root.join(path);
          if !src.is_file() {
            println!("   ·  No {} output at {}, omitting artifact", spec.tag, path.display());
            continue;
          }
          let name = archive_file_name(&spec.component, spec.tag, version, ext);
          let dest = self.out_dir.join(&name);
          fs::copy(&src, &dest)
            .map(|_| ())
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))
            .map_err(|e| packaging_error(spec.tag, e))?;
          (name, dest)
        }
      };

      let (name, dest) = packaged;
      let size = fs::metadata(&dest)?.len();
      let sha256 = sha256_file(&dest).map_err(|e| packaging_error(spec.tag, e))?;

      println!("   📦 {} ({} bytes, sha256 {})", name, size, &sha256[..12]);

      artifacts.push(Artifact {
        tag: spec.tag.to_string(),
        label: display_label(&name, version.as_str()),
        path: dest,
        size,
        sha256,
      });
    }

    Ok(artifacts)
  }

  /// Stage a tree into the aggregation directory, archive it, then remove
  /// the staging directory no matter how archiving went
  fn archive_tree(&self, src: &Path, dest: &Path, tag: &str) -> ReleaseResult<()> {
    let staging_root = self.out_dir.join(".staging");
    let staging = staging_root.join(tag);

    if staging.exists() {
      fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let outcome = stage_and_archive(src, &staging, dest);
    let removed = fs::remove_dir_all(&staging_root);

    outcome?;
    removed.with_context(|| format!("Failed to remove staging directory {}", staging_root.display()))?;
    Ok(())
  }
}

fn packaging_error(tag: &str, err: ReleaseError) -> ReleaseError {
  ReleaseError::Packaging(PackagingError {
    platform: tag.to_string(),
    detail: err.to_string(),
  })
}

fn stage_and_archive(src: &Path, staging: &Path, dest: &Path) -> ReleaseResult<()> {
  let entries: Vec<walkdir::DirEntry> = WalkDir::new(src)
    .into_iter()
    .collect::<Result<_, _>>()
    .map_err(|e| ReleaseError::message(format!("Failed to walk {}: {}", src.display(), e)))?;

  let file_count = entries.iter().filter(|e| e.file_type().is_file()).count();
  let mut progress = FileProgress::new(file_count.max(1), format!("staging {}", dest.display()));

  for entry in &entries {
    let rel = entry.path().strip_prefix(src)?;
    if rel.as_os_str().is_empty() {
      continue;
    }
    let target = staging.join(rel);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)
        .with_context(|| format!("Failed to stage {}", entry.path().display()))?;
      progress.inc();
    }
  }

  let file = fs::File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder
    .append_dir_all(".", staging)
    .with_context(|| format!("Failed to archive {}", staging.display()))?;
  let encoder = builder
    .into_inner()
    .map_err(|e| ReleaseError::message(format!("Failed to finish archive: {}", e)))?;
  encoder
    .finish()
    .map_err(|e| ReleaseError::message(format!("Failed to flush archive: {}", e)))?;

  Ok(())
}

/// Hex SHA-256 of a file, streamed in chunks
pub fn sha256_file(path: &Path) -> ReleaseResult<String> {
  let mut file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
  let mut hasher = Sha256::new();
  let mut buf = [0u8; 65536];

  loop {
    let n = file.read(&mut buf)?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
  }

  Ok(format!("{:x}", hasher.finalize()))
}
