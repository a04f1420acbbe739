//! Types for script execution.
//!
//! This module defines the error type, the invocation handed to a shell
//! invoker, and the report produced by running a script.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::script::Phase;

/// Errors that can occur while executing a script.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A placeholder in a raw command could not be parsed or resolved.
  #[error("interpolating '{raw}': {source}")]
  Interpolation {
    raw: String,
    #[source]
    source: PlaceholderError,
  },

  /// The subprocess exited unsuccessfully.
  #[error("{phase} failed with {}: {cmd}", describe_exit(.code, .signal))]
  CmdFailed {
    phase: Phase,
    cmd: String,
    code: Option<i32>,
    signal: Option<i32>,
  },

  /// The subprocess could not be started.
  #[error("{phase} could not spawn '{cmd}': {source}")]
  Spawn {
    phase: Phase,
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// I/O error while supervising a subprocess.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ExecuteError {
  /// The phase that failed, when the error is tied to one.
  pub fn phase(&self) -> Option<Phase> {
    match self {
      ExecuteError::CmdFailed { phase, .. } | ExecuteError::Spawn { phase, .. } => Some(*phase),
      _ => None,
    }
  }

  /// The same error with `mask` applied to the command line it carries.
  pub fn masked(self, mask: impl Fn(&str) -> String) -> Self {
    match self {
      ExecuteError::CmdFailed {
        phase,
        cmd,
        code,
        signal,
      } => ExecuteError::CmdFailed {
        phase,
        cmd: mask(&cmd),
        code,
        signal,
      },
      ExecuteError::Spawn { phase, cmd, source } => ExecuteError::Spawn {
        phase,
        cmd: mask(&cmd),
        source,
      },
      other => other,
    }
  }
}

/// A script that stopped at its first failing phase.
///
/// `report` holds the phases that completed and, when the run phase was
/// reached, the debug command it executed with.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ScriptFailure {
  pub error: ExecuteError,
  pub report: ScriptReport,
}

impl ScriptFailure {
  pub fn phase(&self) -> Option<Phase> {
    self.error.phase()
  }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
  match (*code, *signal) {
    (Some(code), _) => format!("exit code {code}"),
    (None, Some(signal)) => format!("signal {signal}"),
    (None, None) => "abnormal termination".to_string(),
  }
}

/// A single subprocess invocation for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub phase: Phase,
  /// Interpreter, its flags, then the joined command line.
  pub argv: Vec<String>,
  pub cwd: PathBuf,
  /// Complete environment of the subprocess.
  pub env: BTreeMap<String, String>,
}

impl Invocation {
  /// The command line handed to the interpreter (last argument).
  pub fn command_line(&self) -> &str {
    self.argv.last().map(String::as_str).unwrap_or_default()
  }
}

/// Outcome of one executed phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseOutcome {
  pub phase: Phase,
  pub command_line: String,
  #[serde(with = "duration_millis")]
  pub duration: Duration,
}

/// Result of running a whole script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
  pub target: String,
  pub script: String,
  pub phases: Vec<PhaseOutcome>,
  /// Rendered shell-ready form of the run phase, when it had commands.
  /// Secret values are masked.
  pub debug_command: Option<String>,
}

impl ScriptReport {
  pub fn ran(&self, phase: Phase) -> bool {
    self.phases.iter().any(|p| p.phase == phase)
  }

  pub fn total_duration(&self) -> Duration {
    self.phases.iter().map(|p| p.duration).sum()
  }
}

mod duration_millis {
  use std::time::Duration;

  use serde::Serializer;

  pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
  }
}
