//! Error types for ddk-release with contextual messages
//!
//! One unified error type categorizes failures by pipeline subsystem and
//! carries a remediation hint. Fatal errors surface once at the top level;
//! nothing in the pipeline retries or rolls back on its own.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::publish::PublishPhase;

/// Main error type for ddk-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Pipeline precondition not met (dirty tree, not a repository)
  Precondition(PreconditionError),

  /// Manifest discovery or rewrite errors
  Manifest(ManifestError),

  /// A required validation gate failed
  Gate(GateError),

  /// Binding generation or compilation errors
  Build(BuildError),

  /// Artifact packaging errors
  Packaging(PackagingError),

  /// Publication errors (git, host release, registries)
  Publish(PublishError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => other,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Precondition(e) => e.help_message(),
      ReleaseError::Manifest(e) => e.help_message(),
      ReleaseError::Gate(e) => e.help_message(),
      ReleaseError::Build(e) => e.help_message(),
      ReleaseError::Packaging(_) => None,
      ReleaseError::Publish(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Precondition(e) => write!(f, "{}", e),
      ReleaseError::Manifest(e) => write!(f, "{}", e),
      ReleaseError::Gate(e) => write!(f, "{}", e),
      ReleaseError::Build(e) => write!(f, "{}", e),
      ReleaseError::Packaging(e) => write!(f, "{}", e),
      ReleaseError::Publish(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for ReleaseError {
  fn from(err: semver::Error) -> Self {
    ReleaseError::message(format!("Version parse error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ReleaseError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ReleaseError::message(format!("Path strip prefix error: {}", err))
  }
}

impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}

/// Precondition errors, checked before any stage runs
#[derive(Debug)]
pub enum PreconditionError {
  /// Working tree has uncommitted changes
  DirtyWorkTree { status: String },

  /// The invocation directory is not inside a git repository
  NotARepository { path: PathBuf },
}

impl PreconditionError {
  fn help_message(&self) -> Option<String> {
    match self {
      PreconditionError::DirtyWorkTree { .. } => Some(
        "Commit or stash your changes first: the release commit must contain only the version bump.".to_string(),
      ),
      PreconditionError::NotARepository { .. } => {
        Some("Run ddk-release from the root of the ddk-ffi checkout.".to_string())
      }
    }
  }
}

impl fmt::Display for PreconditionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionError::DirtyWorkTree { status } => {
        write!(f, "Working tree is not clean:\n{}", status)
      }
      PreconditionError::NotARepository { path } => {
        write!(f, "Not a git repository: {}", path.display())
      }
    }
  }
}

/// Manifest errors
#[derive(Debug)]
pub enum ManifestError {
  /// A required manifest path does not exist
  NotFound { path: PathBuf },

  /// Manifest exists but has no version field to rewrite
  MissingVersionField { path: PathBuf },

  /// Manifest could not be parsed
  ParseFailed { path: PathBuf, detail: String },
}

impl ManifestError {
  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::NotFound { path } => Some(format!(
        "Check the [[manifests]] paths in release.toml against the checkout: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::NotFound { path } => {
        write!(f, "Manifest not found: {}", path.display())
      }
      ManifestError::MissingVersionField { path } => {
        write!(f, "No version field in manifest: {}", path.display())
      }
      ManifestError::ParseFailed { path, detail } => {
        write!(f, "Failed to parse manifest {}: {}", path.display(), detail)
      }
    }
  }
}

/// Gate errors
#[derive(Debug)]
pub enum GateError {
  /// A required gate command exited non-zero
  Failed { command: String, status: i32 },
}

impl GateError {
  fn help_message(&self) -> Option<String> {
    match self {
      GateError::Failed { command, .. } => Some(format!(
        "Fix the failure and re-run; no manifests were committed. Gate command: {}",
        command
      )),
    }
  }
}

impl fmt::Display for GateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GateError::Failed { command, status } => {
        write!(f, "Gate failed (exit {}): {}", status, command)
      }
    }
  }
}

/// Binding build errors
#[derive(Debug)]
pub enum BuildError {
  /// Binding generation command failed
  GenerationFailed {
    platform: String,
    command: String,
    detail: String,
  },

  /// Compilation command failed for a required platform
  BuildFailed {
    platform: String,
    command: String,
    detail: String,
  },
}

impl BuildError {
  fn help_message(&self) -> Option<String> {
    match self {
      BuildError::GenerationFailed { platform, .. } => Some(format!(
        "Re-run the generator for '{}' by hand to see its full output.",
        platform
      )),
      BuildError::BuildFailed { platform, .. } => Some(format!(
        "The '{}' toolchain is present but the build failed; inspect the output above.",
        platform
      )),
    }
  }
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::GenerationFailed {
        platform,
        command,
        detail,
      } => {
        write!(f, "Binding generation failed for {}: {}\n{}", platform, command, detail)
      }
      BuildError::BuildFailed {
        platform,
        command,
        detail,
      } => {
        write!(f, "Binding build failed for {}: {}\n{}", platform, command, detail)
      }
    }
  }
}

/// Packaging errors
#[derive(Debug)]
pub struct PackagingError {
  pub platform: String,
  pub detail: String,
}

impl fmt::Display for PackagingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Packaging failed for {}: {}", self.platform, self.detail)
  }
}

/// Publication errors
#[derive(Debug)]
pub enum PublishError {
  /// Registry refused or cannot verify authentication
  AuthRequired { registry: String, login_hint: String },

  /// A publication step failed
  Failed {
    phase: PublishPhase,
    command: String,
    detail: String,
  },
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::AuthRequired { login_hint, .. } => Some(login_hint.clone()),
      PublishError::Failed { phase, .. } => Some(format!(
        "The pipeline stopped at the '{}' step; earlier steps are not rolled back.",
        phase
      )),
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::AuthRequired { registry, .. } => {
        write!(f, "Not authenticated against {}", registry)
      }
      PublishError::Failed { phase, command, detail } => {
        write!(f, "Publish step '{}' failed: {}\n{}", phase, command, detail)
      }
    }
  }
}

/// Result type alias for ddk-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
