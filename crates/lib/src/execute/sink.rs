//! Destinations for subprocess output and status messages.

use std::sync::Mutex;

use tracing::info;

/// Receives the output of running phases.
///
/// Lines arrive as the subprocess produces them, without trailing newlines.
pub trait OutputSink: Send + Sync {
  fn stdout_line(&self, target: &str, line: &str);

  fn stderr_line(&self, target: &str, line: &str);

  /// A status update for the running target, e.g. `Executing //pkg:app`.
  fn status(&self, target: &str, message: &str) {
    info!(target_name = %target, "{message}");
  }
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
  fn stdout_line(&self, target: &str, line: &str) {
    info!(target_name = %target, stream = "stdout", "{line}");
  }

  fn stderr_line(&self, target: &str, line: &str) {
    info!(target_name = %target, stream = "stderr", "{line}");
  }
}

/// A single line recorded by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkLine {
  Stdout(String),
  Stderr(String),
  Status(String),
}

/// Keeps every line in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
  lines: Mutex<Vec<SinkLine>>,
}

impl CollectingSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> Vec<SinkLine> {
    self.lines.lock().map(|l| l.clone()).unwrap_or_default()
  }

  pub fn stdout(&self) -> Vec<String> {
    self
      .lines()
      .into_iter()
      .filter_map(|l| match l {
        SinkLine::Stdout(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  pub fn stderr(&self) -> Vec<String> {
    self
      .lines()
      .into_iter()
      .filter_map(|l| match l {
        SinkLine::Stderr(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  pub fn statuses(&self) -> Vec<String> {
    self
      .lines()
      .into_iter()
      .filter_map(|l| match l {
        SinkLine::Status(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  fn push(&self, line: SinkLine) {
    if let Ok(mut lines) = self.lines.lock() {
      lines.push(line);
    }
  }
}

impl OutputSink for CollectingSink {
  fn stdout_line(&self, _target: &str, line: &str) {
    self.push(SinkLine::Stdout(line.to_string()));
  }

  fn stderr_line(&self, _target: &str, line: &str) {
    self.push(SinkLine::Stderr(line.to_string()));
  }

  fn status(&self, _target: &str, message: &str) {
    self.push(SinkLine::Status(message.to_string()));
  }
}
