//! Pipeline controller: ordered stages, fail-fast, recovery guidance
//!
//! Stages run strictly in order and nothing starts until the previous
//! stage returned success. A clean working tree is a hard precondition for
//! the whole run; the release commit must contain exactly the version bump.
//! On abort the controller prints a recovery checklist whose content
//! depends on whether any public side effect already exists.

use std::fs;
use std::path::PathBuf;

use crate::bindings::{BindingBuilder, HostProbe};
use crate::core::config::ReleaseConfig;
use crate::core::error::{PreconditionError, PublishError, ReleaseError, ReleaseResult};
use crate::gates::GateRunner;
use crate::graph::PackageGraph;
use crate::package::{Artifact, ArtifactPackager};
use crate::publish::git::GitCli;
use crate::publish::{PublishReport, ReleasePublisher};
use crate::version::{ReleaseVersion, VersionCoordinator};

/// A named unit of pipeline work; ordinal position is its index in [`stages`]
pub struct Stage {
  pub name: &'static str,
  pub description: &'static str,
  /// A fatal stage's failure aborts the run; per-gate and per-platform
  /// optionality lives inside the stages themselves
  pub fatal: bool,
  kind: StageKind,
}

#[derive(Debug, Clone, Copy)]
enum StageKind {
  SyncVersions,
  Gates,
  Bindings,
  Package,
  Publish,
}

/// The fixed stage table, in execution order
pub fn stages() -> Vec<Stage> {
  vec![
    Stage {
      name: "sync-versions",
      description: "Synchronizing package versions",
      fatal: true,
      kind: StageKind::SyncVersions,
    },
    Stage {
      name: "gates",
      description: "Running validation gates",
      fatal: true,
      kind: StageKind::Gates,
    },
    Stage {
      name: "bindings",
      description: "Generating and building bindings",
      fatal: true,
      kind: StageKind::Bindings,
    },
    Stage {
      name: "package",
      description: "Packaging artifacts",
      fatal: true,
      kind: StageKind::Package,
    },
    Stage {
      name: "publish",
      description: "Publishing the release",
      fatal: true,
      kind: StageKind::Publish,
    },
  ]
}

pub struct Pipeline {
  root: PathBuf,
  config: ReleaseConfig,
  version: ReleaseVersion,
  graph: PackageGraph,
}

impl Pipeline {
  pub fn new(root: PathBuf, config: ReleaseConfig, version: ReleaseVersion) -> ReleaseResult<Self> {
    let graph = PackageGraph::build(&config.packages)?;
    Ok(Self {
      root,
      config,
      version,
      graph,
    })
  }

  pub fn run(&self) -> ReleaseResult<PublishReport> {
    self.check_preconditions()?;

    let tag = self.version.tag(&self.config.project.tag_prefix);
    println!("📦 Releasing ddk {} (tag {})", self.version, tag);
    println!("   Packages: {}", self.graph.order().join(" → "));

    let defs = stages();
    let total = defs.len();

    let mut artifacts: Vec<Artifact> = Vec::new();
    let mut publish_report: Option<PublishReport> = None;
    let mut warnings: Vec<String> = Vec::new();

    for (ordinal, stage) in defs.iter().enumerate() {
      println!("\n→ [{}/{}] {}: {}", ordinal + 1, total, stage.name, stage.description);

      let outcome: ReleaseResult<()> = match stage.kind {
        StageKind::SyncVersions => VersionCoordinator::new(&self.root)
          .sync(&self.version, &self.config.manifests)
          .map(|updated| {
            println!("   ✅ {} manifest(s) updated", updated.len());
          }),
        StageKind::Gates => GateRunner::new(&self.root, &self.graph)
          .run(&self.config.gates)
          .map(|summary| {
            println!("   ✅ {} gate(s) passed", summary.passed.len());
            warnings.extend(summary.warnings);
          }),
        StageKind::Bindings => {
          let probe = HostProbe::detect(&self.root);
          BindingBuilder::new(&self.root, probe)
            .run(&self.config.bindings.platforms)
            .map(|summary| {
              println!(
                "   ✅ {} platform(s) built, {} skipped",
                summary.built.len(),
                summary.skipped.len()
              );
              warnings.extend(summary.warnings);
            })
        }
        StageKind::Package => ArtifactPackager::new(&self.root, &self.config.project.artifacts_dir)
          .package(&self.version, &self.config.project.component)
          .map(|packaged| {
            println!("   ✅ {} artifact(s) packaged", packaged.len());
            artifacts = packaged;
          }),
        StageKind::Publish => ReleasePublisher::new(&self.root, &self.config, &self.graph)
          .publish(&self.version, std::mem::take(&mut artifacts))
          .map(|report| {
            publish_report = Some(report);
          }),
      };

      match outcome {
        Ok(()) => {}
        Err(err) if !stage.fatal => {
          let warning = format!("Stage '{}' failed: {}", stage.name, err);
          println!("   ⚠️  {}", warning);
          warnings.push(warning);
        }
        Err(err) => {
          self.print_recovery(&err, &tag);
          return Err(err);
        }
      }
    }

    let mut report = publish_report.ok_or_else(|| ReleaseError::message("Publish stage produced no report"))?;
    report.warnings.extend(warnings);

    self.finish(&report);
    Ok(report)
  }

  /// Clean working tree is a hard precondition gating the entire run
  fn check_preconditions(&self) -> ReleaseResult<()> {
    let git = GitCli::new(&self.root);

    if !git.is_repository() {
      return Err(ReleaseError::Precondition(PreconditionError::NotARepository {
        path: self.root.clone(),
      }));
    }

    let status = git.status_porcelain()?;
    if !status.is_empty() {
      return Err(ReleaseError::Precondition(PreconditionError::DirtyWorkTree { status }));
    }

    Ok(())
  }

  /// Success epilogue: summary plus scratch cleanup
  fn finish(&self, report: &PublishReport) {
    let record = &report.record;

    println!("\n✅ Release {} complete", record.tag);
    for published in &record.published {
      println!("   {}@{} on {}", published.name, published.version, published.registry);
    }
    for artifact in &record.artifacts {
      println!("   {} ({} bytes)", artifact.label, artifact.size);
    }

    if !report.warnings.is_empty() {
      println!("\n⚠️  Completed with {} warning(s):", report.warnings.len());
      for warning in &report.warnings {
        println!("   - {}", warning);
      }
    }

    // Artifacts were uploaded to the release; the scratch directory is
    // only kept when a run fails, for postmortem inspection
    let out_dir = self.root.join(&self.config.project.artifacts_dir);
    if out_dir.exists() {
      if let Err(err) = fs::remove_dir_all(&out_dir) {
        println!("   ⚠️  Could not remove {}: {}", out_dir.display(), err);
      }
    }
  }

  /// Manual remediation steps; this tool never auto-rolls-back
  fn print_recovery(&self, err: &ReleaseError, tag: &str) {
    let public = matches!(
      err,
      ReleaseError::Publish(PublishError::Failed { phase, .. }) if phase.is_public()
    );
    let out_dir = self.root.join(&self.config.project.artifacts_dir);

    eprintln!("\n🛟 Recovery checklist:");
    if public {
      eprintln!("   - The git tag and branch are already pushed; do not rewrite them");
      eprintln!("   - gh release view {} to check which assets and notes exist", tag);
      eprintln!("   - Check each registry for partially published packages (npm view / cargo search)");
      eprintln!("   - Finish the remaining publishes by hand, or fix the cause and re-run");
    } else {
      eprintln!("   - git status to review what the pipeline changed");
      eprintln!("   - git checkout -- . to drop the version bump, if not committed yet");
      eprintln!("   - git reset --soft HEAD~1 if the release commit exists");
      eprintln!("   - git tag -d {} if the tag exists locally", tag);
      eprintln!(
        "   - git push --delete {} {} if the tag was already pushed",
        self.config.project.remote, tag
      );
      eprintln!("   - gh release view {} and delete any partially created release", tag);
      eprintln!("   - No registry publish has happened yet");
    }
    if out_dir.exists() {
      eprintln!("   - Artifacts kept for inspection in {}", out_dir.display());
    }
  }
}
