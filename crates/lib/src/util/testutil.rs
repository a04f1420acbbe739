//! Test utilities for stagehand-lib.
//!
//! Provides an in-memory script context and a recording shell invoker so the
//! phase driver can be tested without spawning processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::execute::{ExecuteError, Invocation, OutputSink, ScriptContext, ShellConfig, ShellInvoker};
use crate::placeholder::{EnvOverlay, Interpolate, PlaceholderError, Resolver, substitute};
use crate::script::{Phase, ScriptDef};

/// Build a script definition from phase command lists.
pub fn script(name: &str, pre: &[&str], run: &[&str], post: &[&str]) -> ScriptDef {
  let owned = |cmds: &[&str]| cmds.iter().map(|c| c.to_string()).collect::<Vec<_>>();
  ScriptDef {
    name: name.to_string(),
    pre: owned(pre),
    run: owned(run),
    post: owned(post),
    deps: Vec::new(),
    env: BTreeMap::new(),
  }
}

/// A script context backed by plain maps.
///
/// Uses `/bin/sh -c` regardless of platform so rendered commands are
/// predictable.
#[derive(Debug)]
pub struct TestContext {
  name: String,
  cwd: PathBuf,
  env: BTreeMap<String, String>,
  secrets: Vec<String>,
  shell: ShellConfig,
}

impl TestContext {
  pub fn new() -> Self {
    Self {
      name: "//test:app".to_string(),
      cwd: std::env::temp_dir(),
      env: BTreeMap::new(),
      secrets: Vec::new(),
      shell: ShellConfig {
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string()],
      },
    }
  }

  pub fn with_env(mut self, key: &str, value: &str) -> Self {
    self.env.insert(key.to_string(), value.to_string());
    self
  }

  /// Add a variable whose value is masked in displays.
  pub fn with_secret(mut self, key: &str, value: &str) -> Self {
    self.secrets.push(value.to_string());
    self.with_env(key, value)
  }

  pub fn with_cwd(mut self, cwd: &Path) -> Self {
    self.cwd = cwd.to_path_buf();
    self
  }
}

impl Resolver for TestContext {
  fn resolve_cwd(&self) -> Result<String, PlaceholderError> {
    Ok(self.cwd.to_string_lossy().to_string())
  }

  fn resolve_name(&self) -> Result<String, PlaceholderError> {
    Ok(self.name.clone())
  }

  fn resolve_env(&self, name: &str) -> Result<String, PlaceholderError> {
    self
      .env
      .get(name)
      .cloned()
      .ok_or_else(|| PlaceholderError::UnresolvedEnv(name.to_string()))
  }
}

impl Interpolate for TestContext {
  fn interpolate(&self, raw: &str) -> Result<String, PlaceholderError> {
    substitute(raw, self)
  }

  fn interpolate_in(&self, raw: &str, env: &BTreeMap<String, String>) -> Result<String, PlaceholderError> {
    substitute(raw, &EnvOverlay::new(self, env))
  }
}

impl ScriptContext for TestContext {
  fn qualified_name(&self) -> &str {
    &self.name
  }

  fn working_dir(&self) -> &Path {
    &self.cwd
  }

  fn base_env(&self) -> &BTreeMap<String, String> {
    &self.env
  }

  fn shell(&self) -> &ShellConfig {
    &self.shell
  }

  fn mask(&self, text: &str) -> String {
    self
      .secrets
      .iter()
      .fold(text.to_string(), |masked, secret| masked.replace(secret.as_str(), "<redacted>"))
  }
}

/// Records every invocation instead of spawning it.
#[derive(Debug, Default)]
pub struct SpyInvoker {
  calls: Mutex<Vec<Invocation>>,
  fail_on: Option<Phase>,
}

impl SpyInvoker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Report exit code 1 for the given phase.
  pub fn failing_on(phase: Phase) -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      fail_on: Some(phase),
    }
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }

  pub fn phases(&self) -> Vec<Phase> {
    self.invocations().iter().map(|i| i.phase).collect()
  }
}

impl ShellInvoker for SpyInvoker {
  async fn invoke(&self, invocation: &Invocation, _target: &str, _sink: &dyn OutputSink) -> Result<(), ExecuteError> {
    self.calls.lock().unwrap().push(invocation.clone());

    if self.fail_on == Some(invocation.phase) {
      return Err(ExecuteError::CmdFailed {
        phase: invocation.phase,
        cmd: invocation.command_line().to_string(),
        code: Some(1),
        signal: None,
      });
    }
    Ok(())
  }
}
