//! Validation gates run before any release side effect
//!
//! Gates execute strictly one at a time, dependency order first, with
//! pass-through output. A required gate's failure aborts the whole run;
//! an optional gate's failure (a package whose test suite is legitimately
//! absent in this checkout) downgrades to a warning.

use std::path::Path;

use crate::core::config::GateConfig;
use crate::core::error::{GateError, ReleaseError, ReleaseResult};
use crate::core::exec;
use crate::graph::PackageGraph;

/// Outcome of the gate stage
#[derive(Debug, Default)]
pub struct GateSummary {
  pub passed: Vec<String>,
  pub warnings: Vec<String>,
}

pub struct GateRunner<'a> {
  root: &'a Path,
  graph: &'a PackageGraph,
}

impl<'a> GateRunner<'a> {
  pub fn new(root: &'a Path, graph: &'a PackageGraph) -> Self {
    Self { root, graph }
  }

  /// Run all gates in package-dependency order, failing fast on the first
  /// required failure
  pub fn run(&self, gates: &[GateConfig]) -> ReleaseResult<GateSummary> {
    let mut ordered: Vec<&GateConfig> = gates.iter().collect();
    self.graph.sort_by_package(&mut ordered, |gate| gate.package.as_str());

    let mut summary = GateSummary::default();

    for gate in ordered {
      let args: Vec<&str> = gate.command.iter().skip(1).map(String::as_str).collect();
      let program = gate.command[0].as_str();
      let command_line = exec::display(program, &args);

      println!("   🔍 {} ({})", gate.label, command_line);

      let dir = self.root.join(&gate.dir);
      let outcome = exec::run_status(&dir, program, &args);

      match outcome {
        Ok(status) if status.success() => {
          summary.passed.push(gate.label.clone());
        }
        Ok(status) => {
          let code = status.code().unwrap_or(-1);
          if gate.required {
            return Err(ReleaseError::Gate(GateError::Failed {
              command: command_line,
              status: code,
            }));
          }
          let warning = format!("Optional gate '{}' failed (exit {}), continuing", gate.label, code);
          println!("   ⚠️  {}", warning);
          summary.warnings.push(warning);
        }
        Err(spawn_err) => {
          if gate.required {
            return Err(spawn_err);
          }
          let warning = format!("Optional gate '{}' could not run: {}", gate.label, spawn_err);
          println!("   ⚠️  {}", warning);
          summary.warnings.push(warning);
        }
      }
    }

    Ok(summary)
  }
}
