mod list;
mod run;
mod show;

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_lib::target::{OsEnv, Project, Target, TargetContext};

pub use list::cmd_list;
pub use run::cmd_run;
pub use show::cmd_show;

/// Load the target file, capturing the process environment once.
fn load_project(file: &Path, root: Option<&Path>) -> Result<Project> {
  let os_env = OsEnv::capture();
  let project = match root {
    Some(root) => Project::load_with_root(root, file, &os_env),
    None => Project::load(file, &os_env),
  };
  project.with_context(|| format!("Failed to load target file: {}", file.display()))
}

/// Build the context of `target`, in a deployment environment when one is
/// selected.
fn context<'a>(project: &'a Project, target: &'a Target, environment: Option<&str>) -> Result<TargetContext<'a>> {
  let ctx = project.context(target);
  match environment {
    Some(name) => Ok(ctx.with_environment(name)?),
    None => Ok(ctx),
  }
}
