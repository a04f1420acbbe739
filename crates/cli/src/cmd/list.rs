//! Implementation of the `stagehand list` command.
//!
//! Prints every target of the target file with its scripts, dependencies
//! and labels.

use std::path::Path;

use anyhow::Result;

use stagehand_lib::target::Target;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

use super::load_project;

pub fn cmd_list(file: &Path, root: Option<&Path>, format: OutputFormat) -> Result<()> {
  let project = load_project(file, root)?;

  if format.is_json() {
    let targets: Vec<_> = project.targets().iter().map(target_json).collect();
    return print_json(&targets);
  }

  if project.targets().is_empty() {
    print_info(&format!("No targets declared in {}", file.display()));
    return Ok(());
  }

  for (i, target) in project.targets().iter().enumerate() {
    if i > 0 {
      println!();
    }
    match &target.desc {
      Some(desc) => println!("{} - {}", target.qualified_name, desc),
      None => println!("{}", target.qualified_name),
    }
    print_stat("scripts", &target.scripts.names().join(", "));
    if !target.deps.is_empty() {
      print_stat("deps", &target.deps.join(", "));
    }
    if !target.labels.is_empty() {
      print_stat("labels", &target.labels.join(", "));
    }
  }

  Ok(())
}

fn target_json(target: &Target) -> serde_json::Value {
  let scripts: Vec<_> = target
    .scripts
    .iter()
    .map(|s| serde_json::json!({ "name": s.name, "deps": s.deps }))
    .collect();
  serde_json::json!({
    "name": target.name,
    "qualified_name": target.qualified_name,
    "desc": target.desc,
    "cwd": target.cwd,
    "scripts": scripts,
    "deps": target.deps,
    "labels": target.labels,
    "outs": target.outs,
    "visibility": target.visibility,
  })
}
