//! Base environment of a target.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::consts::{DEFAULT_PASS_ENV, ENV_TARGET};

use super::config::TargetConfig;

/// Placeholder shown instead of secret values.
pub const REDACTED: &str = "<redacted>";

/// A snapshot of the process environment.
///
/// Targets never read the live process environment; they are built from a
/// snapshot so construction is reproducible and testable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsEnv {
  vars: BTreeMap<String, String>,
}

impl OsEnv {
  /// Capture the current process environment. Variables that are not valid
  /// UTF-8 are skipped.
  pub fn capture() -> Self {
    let vars = std::env::vars_os()
      .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
      .collect();
    Self { vars }
  }

  pub fn from_pairs<K, V, I>(pairs: I) -> Self
  where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
  {
    Self {
      vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }
}

/// Assembled environment with knowledge of which values are secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
  vars: BTreeMap<String, String>,
  secrets: BTreeSet<String>,
}

impl Environment {
  /// Build the base environment of a target.
  ///
  /// Sources are applied in order, later ones overriding earlier ones:
  /// `PATH`/`HOME`, `pass_env`, `secret_env`, the static `env` map, then
  /// `STAGEHAND_TARGET`. Names missing from `os_env` are skipped.
  pub fn assemble(config: &TargetConfig, qualified_name: &str, os_env: &OsEnv) -> Self {
    let mut env = Self::default();

    for name in DEFAULT_PASS_ENV.iter().copied().chain(config.pass_env.iter().map(String::as_str)) {
      if let Some(value) = os_env.get(name) {
        env.set(name, value);
      }
    }

    for name in &config.secret_env {
      match os_env.get(name) {
        Some(value) => env.set_secret(name, value),
        None => debug!(target_name = %qualified_name, var = %name, "secret variable not set"),
      }
    }

    for (name, value) in &config.env {
      env.set(name, value);
    }

    env.set(ENV_TARGET, qualified_name);
    env
  }

  pub fn set(&mut self, name: &str, value: &str) {
    self.secrets.remove(name);
    self.vars.insert(name.to_string(), value.to_string());
  }

  pub fn set_secret(&mut self, name: &str, value: &str) {
    self.secrets.insert(name.to_string());
    self.vars.insert(name.to_string(), value.to_string());
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  pub fn is_secret(&self, name: &str) -> bool {
    self.secrets.contains(name)
  }

  pub fn vars(&self) -> &BTreeMap<String, String> {
    &self.vars
  }

  /// Copy of the variables safe to display.
  pub fn redacted(&self) -> BTreeMap<String, String> {
    self.redact(&self.vars)
  }

  /// Copy of `vars` safe to display.
  ///
  /// Secret names show [`REDACTED`] as their value, and secret values
  /// embedded in other values are masked, e.g. inside a debug command.
  pub fn redact(&self, vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    vars
      .iter()
      .map(|(k, v)| {
        let shown = if self.secrets.contains(k) { REDACTED.to_string() } else { self.mask(v) };
        (k.clone(), shown)
      })
      .collect()
  }

  /// Replace every occurrence of a secret value in `text` with [`REDACTED`].
  pub fn mask(&self, text: &str) -> String {
    let mut values: Vec<&str> = self
      .secrets
      .iter()
      .filter_map(|name| self.get(name))
      .filter(|value| !value.is_empty())
      .collect();
    // longest first, so a secret containing another is masked whole
    values.sort_by_key(|value| std::cmp::Reverse(value.len()));

    values
      .into_iter()
      .fold(text.to_string(), |masked, value| masked.replace(value, REDACTED))
  }

  pub fn secrets(&self) -> &BTreeSet<String> {
    &self.secrets
  }
}
