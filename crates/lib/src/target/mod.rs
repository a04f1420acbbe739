//! Targets and the projects that declare them.
//!
//! A [`Project`] is one loaded target file. Each `[[exec]]` table becomes a
//! [`Target`] holding its validated script set, working directory and base
//! environment. [`Project::context`] pairs a target with the outputs of its
//! dependencies so its scripts can be executed.

pub mod config;
pub mod context;
pub mod env;
pub mod label;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::execute::ShellConfig;
use crate::placeholder::{PlaceholderError, substitute};
use crate::script::{ScriptDef, ScriptError, ScriptSet, build_scripts};
use crate::util::path::{absolutize, display};

pub use config::{EnvironmentConfig, ProjectFile, Settings, TargetConfig};
pub use context::TargetContext;
pub use env::{Environment, OsEnv, REDACTED};
pub use label::{build_command_label, normalize_label, qualified_name};

use context::ConstructionResolver;
use label::is_label;

/// Errors raised while loading a project or constructing its targets.
#[derive(Debug, Error)]
pub enum TargetError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("target '{0}' is declared more than once")]
  DuplicateTarget(String),

  #[error("unknown target '{0}'")]
  UnknownTarget(String),

  #[error("target {target} has no script '{script}'")]
  UnknownScript { target: String, script: String },

  #[error("target {target} has no environment '{environment}'")]
  UnknownEnvironment { target: String, environment: String },

  #[error("resolving external_path '{path}' of {target}: {source}")]
  ExternalPath {
    target: String,
    path: String,
    #[source]
    source: PlaceholderError,
  },

  #[error("invalid scripts in {target}: {source}")]
  Script {
    target: String,
    #[source]
    source: ScriptError,
  },
}

/// A constructed target.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
  pub name: String,
  /// `//<package>:<name>`
  pub qualified_name: String,
  pub package: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub desc: Option<String>,
  /// Directory every script runs in.
  pub cwd: PathBuf,
  pub scripts: ScriptSet,
  /// Normalized dependency labels of the primary script.
  pub deps: Vec<String>,
  pub labels: Vec<String>,
  pub srcs: Vec<String>,
  pub mapped_srcs: BTreeMap<String, Vec<String>>,
  pub outs: Vec<String>,
  pub tools: BTreeMap<String, String>,
  pub environments: BTreeMap<String, EnvironmentConfig>,
  pub visibility: Vec<String>,
  pub no_interpolation: bool,
  #[serde(skip)]
  pub env: Environment,
}

impl Target {
  /// Construct a target declared in `package`, whose directory is
  /// `package_dir`.
  pub fn from_config(
    config: TargetConfig,
    package: &str,
    package_dir: &Path,
    settings: &Settings,
    os_env: &OsEnv,
  ) -> Result<Self, TargetError> {
    let qualified_name = qualified_name(package, &config.name);

    let cwd = match &config.external_path {
      Some(raw) => {
        let resolver = ConstructionResolver {
          package_dir,
          qualified_name: &qualified_name,
          os_env,
        };
        let resolved = substitute(raw, &resolver).map_err(|source| TargetError::ExternalPath {
          target: qualified_name.clone(),
          path: raw.clone(),
          source,
        })?;
        debug!(target_name = %qualified_name, external_path = %resolved, "using external path");
        absolutize(package_dir, Path::new(&resolved))
      }
      None => package_dir.to_path_buf(),
    };

    let env = Environment::assemble(&config, &qualified_name, os_env);

    let deps: Vec<String> = config.deps.iter().map(|d| normalize_label(package, d)).collect();

    let mut scripts =
      build_scripts(config.scripts, &config.build, &deps).map_err(|source| TargetError::Script {
        target: qualified_name.clone(),
        source,
      })?;
    normalize_script_deps(&mut scripts.primary, package);
    for script in scripts.named.values_mut() {
      normalize_script_deps(script, package);
    }

    let mut labels = config.labels;
    if settings.label_build_command {
      labels.extend(build_command_label(&config.build));
    }

    Ok(Self {
      name: config.name,
      qualified_name,
      package: package.to_string(),
      desc: config.desc,
      cwd,
      scripts,
      deps,
      labels,
      srcs: config.srcs,
      mapped_srcs: config.mapped_srcs,
      outs: config.outs,
      tools: config.tools,
      environments: config.environments,
      visibility: config.visibility,
      no_interpolation: config.no_interpolation,
      env,
    })
  }

  /// Look up a script by name.
  pub fn script(&self, name: &str) -> Result<&ScriptDef, TargetError> {
    self.scripts.get(name).ok_or_else(|| TargetError::UnknownScript {
      target: self.qualified_name.clone(),
      script: name.to_string(),
    })
  }

  /// Look up a deployment environment by name.
  pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, TargetError> {
    self.environments.get(name).ok_or_else(|| TargetError::UnknownEnvironment {
      target: self.qualified_name.clone(),
      environment: name.to_string(),
    })
  }

  /// Every label this target may reference: its deps, the deps of all its
  /// scripts, and tool references.
  pub fn referenced_labels(&self) -> BTreeSet<String> {
    let mut labels: BTreeSet<String> = self.scripts.iter().flat_map(|s| s.deps.iter().cloned()).collect();
    labels.extend(self.deps.iter().cloned());
    labels.extend(
      self
        .tools
        .values()
        .filter(|v| is_label(v))
        .map(|v| normalize_label(&self.package, v)),
    );
    labels
  }

  /// Declared outputs as absolute paths under the working directory.
  pub fn output_paths(&self) -> Vec<String> {
    self
      .outs
      .iter()
      .map(|out| display(&absolutize(&self.cwd, Path::new(out))))
      .collect()
  }
}

fn normalize_script_deps(script: &mut ScriptDef, package: &str) {
  for dep in &mut script.deps {
    *dep = normalize_label(package, dep);
  }
}

/// Compute the package of a target file: its directory relative to `root`,
/// with `/` separators. Files outside `root` belong to the root package.
pub fn package_of(root: &Path, file: &Path) -> String {
  let dir = file.parent().unwrap_or(Path::new(""));
  match dir.strip_prefix(root) {
    Ok(rel) => rel
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/"),
    Err(_) => String::new(),
  }
}

/// All targets of one target file.
#[derive(Debug, Clone)]
pub struct Project {
  pub root: PathBuf,
  pub settings: Settings,
  pub shell: ShellConfig,
  targets: Vec<Target>,
}

impl Project {
  /// Load a target file whose directory is the project root.
  pub fn load(path: &Path, os_env: &OsEnv) -> Result<Self, TargetError> {
    let root = path.parent().unwrap_or(Path::new("."));
    Self::load_with_root(root, path, os_env)
  }

  /// Load a target file below `root`; the package of its targets is the
  /// file's directory relative to `root`.
  pub fn load_with_root(root: &Path, path: &Path, os_env: &OsEnv) -> Result<Self, TargetError> {
    let path = absolutize(&std::env::current_dir().unwrap_or_default(), path);
    let root = absolutize(&std::env::current_dir().unwrap_or_default(), root);

    let content = std::fs::read_to_string(&path).map_err(|source| TargetError::Read {
      path: path.clone(),
      source,
    })?;
    let file = ProjectFile::parse(&content).map_err(|source| TargetError::Parse {
      path: path.clone(),
      source,
    })?;

    let package = package_of(&root, &path);
    let package_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());

    let project = Self::from_file(file, root, &package, &package_dir, os_env)?;
    info!(path = %path.display(), targets = project.targets.len(), "loaded target file");
    Ok(project)
  }

  /// Construct every target of an already parsed file.
  pub fn from_file(
    file: ProjectFile,
    root: PathBuf,
    package: &str,
    package_dir: &Path,
    os_env: &OsEnv,
  ) -> Result<Self, TargetError> {
    let mut seen = BTreeSet::new();
    let mut targets = Vec::with_capacity(file.exec.len());

    for config in file.exec {
      if !seen.insert(config.name.clone()) {
        return Err(TargetError::DuplicateTarget(qualified_name(package, &config.name)));
      }
      targets.push(Target::from_config(config, package, package_dir, &file.settings, os_env)?);
    }

    let shell = ShellConfig::detect(file.settings.shell.as_deref());

    Ok(Self {
      root,
      settings: file.settings,
      shell,
      targets,
    })
  }

  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  /// Find a target by plain name or qualified name.
  pub fn target(&self, name: &str) -> Result<&Target, TargetError> {
    self
      .targets
      .iter()
      .find(|t| t.name == name || t.qualified_name == name)
      .ok_or_else(|| TargetError::UnknownTarget(name.to_string()))
  }

  /// Build the execution context of `target`.
  ///
  /// Dependencies declared in this project contribute their outputs;
  /// labels outside the project are left unresolved.
  pub fn context<'a>(&'a self, target: &'a Target) -> TargetContext<'a> {
    let dep_outputs = target
      .referenced_labels()
      .into_iter()
      .filter_map(|label| {
        let dep = self.targets.iter().find(|t| t.qualified_name == label)?;
        Some((label, dep.output_paths()))
      })
      .collect();

    TargetContext::new(target, &self.shell, dep_outputs)
  }
}
