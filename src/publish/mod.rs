//! The externally visible release sequence
//!
//! commit → tag → push branch → push tag → host release with assets →
//! registry publishes → propagation check. Every step up to and including
//! the registry publishes is fatal on failure; nothing is rolled back,
//! because pushed tags, GitHub releases and published packages are not
//! safely revocable. The propagation check alone downgrades to warnings.

pub mod git;
pub mod registry;

use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::core::config::{PackageConfig, ReleaseConfig};
use crate::core::error::{PublishError, ReleaseError, ReleaseResult};
use crate::core::exec;
use crate::graph::PackageGraph;
use crate::package::Artifact;
use crate::version::ReleaseVersion;

use git::GitCli;

/// Where in the publication sequence a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
  Commit,
  Tag,
  PushBranch,
  PushTag,
  HostRelease,
  RegistryPublish,
}

impl PublishPhase {
  /// Whether the release record already exists when this phase fails
  ///
  /// The host release is the public commitment; a failure while creating
  /// it still counts as pre-release for recovery purposes.
  pub fn is_public(&self) -> bool {
    matches!(self, PublishPhase::RegistryPublish)
  }
}

impl fmt::Display for PublishPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PublishPhase::Commit => "commit",
      PublishPhase::Tag => "tag",
      PublishPhase::PushBranch => "push-branch",
      PublishPhase::PushTag => "push-tag",
      PublishPhase::HostRelease => "host-release",
      PublishPhase::RegistryPublish => "registry-publish",
    };
    write!(f, "{}", name)
  }
}

/// One package published to its registry
#[derive(Debug, Clone)]
pub struct PublishedPackage {
  pub name: String,
  pub registry: registry::RegistryKind,
  pub version: String,
}

/// The durable result of a release; never retracted once created
#[derive(Debug)]
pub struct ReleaseRecord {
  pub version: String,
  pub tag: String,
  pub artifacts: Vec<Artifact>,
  pub published: Vec<PublishedPackage>,
}

/// Record plus the non-fatal findings of the verification step
#[derive(Debug)]
pub struct PublishReport {
  pub record: ReleaseRecord,
  pub warnings: Vec<String>,
}

pub struct ReleasePublisher<'a> {
  root: &'a Path,
  config: &'a ReleaseConfig,
  graph: &'a PackageGraph,
}

impl<'a> ReleasePublisher<'a> {
  pub fn new(root: &'a Path, config: &'a ReleaseConfig, graph: &'a PackageGraph) -> Self {
    Self { root, config, graph }
  }

  pub fn publish(&self, version: &ReleaseVersion, artifacts: Vec<Artifact>) -> ReleaseResult<PublishReport> {
    let git = GitCli::new(self.root);
    let tag = version.tag(&self.config.project.tag_prefix);
    let remote = self.config.project.remote.as_str();

    println!("   ✏️  Committing version bump");
    git.add_all().map_err(|e| step_failed(PublishPhase::Commit, "git add", e))?;
    git
      .commit(&format!("Release {}", tag))
      .map_err(|e| step_failed(PublishPhase::Commit, "git commit", e))?;

    println!("   🏷️  Tagging {}", tag);
    git
      .tag_annotated(&tag, &format!("Release {}", tag))
      .map_err(|e| step_failed(PublishPhase::Tag, "git tag", e))?;

    // Branch and tag are pushed as two distinct operations; a failure
    // between them leaves a locally valid, remotely absent tag, which the
    // recovery checklist documents
    let branch = git
      .current_branch()
      .map_err(|e| step_failed(PublishPhase::PushBranch, "git rev-parse", e))?;
    println!("   ⬆️  Pushing {} to {}", branch, remote);
    git
      .push(remote, &branch)
      .map_err(|e| step_failed(PublishPhase::PushBranch, "git push", e))?;
    println!("   ⬆️  Pushing tag {}", tag);
    git
      .push(remote, &tag)
      .map_err(|e| step_failed(PublishPhase::PushTag, "git push (tag)", e))?;

    println!("   🚀 Creating GitHub release {}", tag);
    self.create_host_release(version, &tag, &artifacts)?;

    // The release is now the public commitment; later failures are still
    // fatal but nothing attempts to retract it
    let mut record = ReleaseRecord {
      version: version.to_string(),
      tag,
      artifacts,
      published: Vec::new(),
    };

    let mut ordered: Vec<&PackageConfig> = self.config.packages.iter().collect();
    self.graph.sort_by_package(&mut ordered, |p| p.name.as_str());

    for package in ordered {
      let dir = self.root.join(&package.dir);
      package.registry.ensure_authenticated(&dir)?;

      println!("   📤 Publishing {} to {}", package.name, package.registry);
      package
        .registry
        .publish(&dir, &package.name)
        .map_err(|e| step_failed(PublishPhase::RegistryPublish, "publish", e))?;

      record.published.push(PublishedPackage {
        name: package.name.clone(),
        registry: package.registry,
        version: version.to_string(),
      });
    }

    let warnings = self.verify_propagation(&record);

    Ok(PublishReport { record, warnings })
  }

  fn create_host_release(&self, version: &ReleaseVersion, tag: &str, artifacts: &[Artifact]) -> ReleaseResult<()> {
    let notes = release_notes(version, &self.config.packages, artifacts);

    let mut args: Vec<String> = vec![
      "release".to_string(),
      "create".to_string(),
      tag.to_string(),
      "--title".to_string(),
      tag.to_string(),
      "--notes".to_string(),
      notes,
    ];
    if version.is_prerelease() {
      args.push("--prerelease".to_string());
    }
    for artifact in artifacts {
      println!("   📎 Attaching {} ({})", artifact.label, artifact.tag);
      args.push(format!("{}#{}", artifact.path.display(), artifact.label));
    }

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let url = exec::capture(self.root, "gh", &arg_refs)
      .map_err(|e| step_failed(PublishPhase::HostRelease, "gh release create", e))?;

    if !url.is_empty() {
      println!("   🔗 {}", url);
    }
    Ok(())
  }

  /// Best-effort convergence check after a fixed propagation delay
  fn verify_propagation(&self, record: &ReleaseRecord) -> Vec<String> {
    let delay = self.config.project.propagation_delay_secs;
    if !record.published.is_empty() && delay > 0 {
      println!("   ⏳ Waiting {}s for registry propagation", delay);
      thread::sleep(Duration::from_secs(delay));
    }

    let mut results = Vec::new();
    for published in &record.published {
      let package = self.config.packages.iter().find(|p| p.name == published.name);
      let dir = match package {
        Some(p) => self.root.join(&p.dir),
        None => self.root.to_path_buf(),
      };
      // Query failures are folded into the same best-effort reporting
      let seen = published
        .registry
        .query_version(&dir, &published.name)
        .unwrap_or_default();
      results.push((published.name.clone(), seen));
    }

    let warnings = propagation_warnings(&record.version, &results);
    for (name, seen) in &results {
      match seen {
        Some(v) if v == &record.version => println!("   ✅ {} is visible at {}", name, v),
        _ => {}
      }
    }
    for warning in &warnings {
      println!("   ⚠️  {}", warning);
    }
    warnings
  }
}

fn step_failed(phase: PublishPhase, command: &str, err: ReleaseError) -> ReleaseError {
  // Auth failures keep their own variant and guidance
  if matches!(err, ReleaseError::Publish(PublishError::AuthRequired { .. })) {
    return err;
  }
  ReleaseError::Publish(PublishError::Failed {
    phase,
    command: command.to_string(),
    detail: err.to_string(),
  })
}

/// Warnings for registry versions that have not converged on the release
pub fn propagation_warnings(expected: &str, results: &[(String, Option<String>)]) -> Vec<String> {
  results
    .iter()
    .filter_map(|(name, seen)| match seen {
      Some(v) if v == expected => None,
      Some(v) => Some(format!(
        "{} still reports {} (expected {}); registries can lag, verify manually",
        name, v, expected
      )),
      None => Some(format!(
        "Could not confirm {} at {}; registries can lag, verify manually",
        name, expected
      )),
    })
    .collect()
}

/// Markdown release notes attached to the host release
pub fn release_notes(version: &ReleaseVersion, packages: &[PackageConfig], artifacts: &[Artifact]) -> String {
  let date = chrono::Utc::now().format("%Y-%m-%d");
  let mut notes = format!("## ddk {} ({})\n\n### Packages\n\n", version, date);

  for package in packages {
    notes.push_str(&format!("- `{}@{}` on {}\n", package.name, version, package.registry));
  }

  if !artifacts.is_empty() {
    notes.push_str("\n### Artifacts\n\n");
    for artifact in artifacts {
      let file_name = artifact
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.label.clone());
      notes.push_str(&format!("- `{}` sha256 `{}`\n", file_name, artifact.sha256));
    }
  }

  notes
}
