//! Placeholder resolution for targets.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::consts::{ENV_ENVIRONMENT, ENV_TARGET};
use crate::execute::{ScriptContext, ShellConfig};
use crate::placeholder::{EnvOverlay, Interpolate, PlaceholderError, Resolver, substitute};
use crate::util::path::display;

use super::env::OsEnv;
use super::label::{is_label, normalize_label};
use super::{Target, TargetError};

/// Everything a script of one target can reference while it runs.
///
/// Built by [`super::Project::context`]; borrows the target and the
/// project shell.
#[derive(Debug)]
pub struct TargetContext<'a> {
  target: &'a Target,
  shell: &'a ShellConfig,
  /// Normalized dependency label to absolute output paths.
  dep_outputs: BTreeMap<String, Vec<String>>,
  /// Target environment, with the selected deployment environment on top.
  env: BTreeMap<String, String>,
  environment: Option<String>,
}

impl<'a> TargetContext<'a> {
  pub fn new(target: &'a Target, shell: &'a ShellConfig, dep_outputs: BTreeMap<String, Vec<String>>) -> Self {
    Self {
      target,
      shell,
      dep_outputs,
      env: target.env.vars().clone(),
      environment: None,
    }
  }

  /// Select the deployment environment `name` of the target.
  ///
  /// Its variables override the target environment, except the reserved
  /// `STAGEHAND_TARGET`, and script overlays still override them.
  pub fn with_environment(mut self, name: &str) -> Result<Self, TargetError> {
    let environment = self.target.environment(name)?;

    self.env.extend(environment.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    self.env.insert(ENV_TARGET.to_string(), self.target.qualified_name.clone());
    self.env.insert(ENV_ENVIRONMENT.to_string(), name.to_string());
    self.environment = Some(name.to_string());

    debug!(target_name = %self.target.qualified_name, environment = %name, "selected environment");
    Ok(self)
  }

  pub fn target(&self) -> &Target {
    self.target
  }

  /// Name of the selected deployment environment.
  pub fn environment(&self) -> Option<&str> {
    self.environment.as_deref()
  }

  /// Outputs of a dependency, by label as written or normalized.
  pub fn dep_outputs(&self, label: &str) -> Option<&[String]> {
    let label = normalize_label(&self.target.package, label);
    self.dep_outputs.get(&label).map(Vec::as_slice)
  }

  /// Copy of `vars` safe to display; see [`super::Environment::redact`].
  pub fn redact(&self, vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    self.target.env.redact(vars)
  }
}

impl Resolver for TargetContext<'_> {
  fn resolve_cwd(&self) -> Result<String, PlaceholderError> {
    Ok(display(&self.target.cwd))
  }

  fn resolve_name(&self) -> Result<String, PlaceholderError> {
    Ok(self.target.qualified_name.clone())
  }

  fn resolve_srcs(&self, group: Option<&str>) -> Result<String, PlaceholderError> {
    match group {
      None => {
        let all: Vec<&str> = self
          .target
          .srcs
          .iter()
          .chain(self.target.mapped_srcs.values().flatten())
          .map(String::as_str)
          .collect();
        Ok(all.join(" "))
      }
      Some(group) => self
        .target
        .mapped_srcs
        .get(group)
        .map(|srcs| srcs.join(" "))
        .ok_or_else(|| PlaceholderError::UnresolvedSrcs(group.to_string())),
    }
  }

  fn resolve_outs(&self) -> Result<String, PlaceholderError> {
    Ok(self.target.outs.join(" "))
  }

  fn resolve_env(&self, name: &str) -> Result<String, PlaceholderError> {
    self
      .env
      .get(name)
      .cloned()
      .ok_or_else(|| PlaceholderError::UnresolvedEnv(name.to_string()))
  }

  fn resolve_tool(&self, name: &str) -> Result<String, PlaceholderError> {
    let value = self
      .target
      .tools
      .get(name)
      .ok_or_else(|| PlaceholderError::UnresolvedTool(name.to_string()))?;

    if !is_label(value) {
      return Ok(value.clone());
    }
    self
      .dep_outputs(value)
      .map(|outs| outs.join(" "))
      .ok_or_else(|| PlaceholderError::UnresolvedTool(name.to_string()))
  }

  fn resolve_dep(&self, label: &str) -> Result<String, PlaceholderError> {
    self
      .dep_outputs(label)
      .map(|outs| outs.join(" "))
      .ok_or_else(|| PlaceholderError::UnresolvedDep(label.to_string()))
  }
}

impl Interpolate for TargetContext<'_> {
  fn interpolate(&self, raw: &str) -> Result<String, PlaceholderError> {
    if self.target.no_interpolation {
      return Ok(raw.to_string());
    }
    substitute(raw, self)
  }

  fn interpolate_in(&self, raw: &str, env: &BTreeMap<String, String>) -> Result<String, PlaceholderError> {
    if self.target.no_interpolation {
      return Ok(raw.to_string());
    }
    substitute(raw, &EnvOverlay::new(self, env))
  }
}

impl ScriptContext for TargetContext<'_> {
  fn qualified_name(&self) -> &str {
    &self.target.qualified_name
  }

  fn working_dir(&self) -> &Path {
    &self.target.cwd
  }

  fn base_env(&self) -> &BTreeMap<String, String> {
    &self.env
  }

  fn shell(&self) -> &ShellConfig {
    self.shell
  }

  fn mask(&self, text: &str) -> String {
    self.target.env.mask(text)
  }
}

/// Resolver used while a target is still being constructed.
///
/// Only the package directory, the qualified name and OS variables are
/// known at that point.
pub(crate) struct ConstructionResolver<'a> {
  pub package_dir: &'a Path,
  pub qualified_name: &'a str,
  pub os_env: &'a OsEnv,
}

impl Resolver for ConstructionResolver<'_> {
  fn resolve_cwd(&self) -> Result<String, PlaceholderError> {
    Ok(display(self.package_dir))
  }

  fn resolve_name(&self) -> Result<String, PlaceholderError> {
    Ok(self.qualified_name.to_string())
  }

  fn resolve_env(&self, name: &str) -> Result<String, PlaceholderError> {
    self
      .os_env
      .get(name)
      .map(str::to_string)
      .ok_or_else(|| PlaceholderError::UnresolvedEnv(name.to_string()))
  }
}
