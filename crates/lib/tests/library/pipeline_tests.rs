//! End-to-end tests over the public API: load a target file, build the
//! context of a target and run its scripts through a real shell.

use std::path::Path;

use stagehand_lib::consts::ENV_DEBUG_CMD;
use stagehand_lib::execute::{
  CollectingSink, ExecuteError, ScriptContext, ScriptFailure, ScriptReport, SubprocessInvoker, plan_script, run_script,
};
use stagehand_lib::script::{BUILD_SCRIPT, Phase};
use stagehand_lib::target::{OsEnv, Project};
use tempfile::TempDir;

const TARGETS: &str = r#"
[[exec]]
name = "gen"
build = ["printf 'generated\n' > gen.txt"]
outs = ["gen.txt"]

[[exec]]
name = "app"
build = ["cat $${dep::gen}", "echo built $${name}"]
deps = [":gen"]

[exec.scripts.debug]
command = ['''printf '%s\n' "$STAGEHAND_DEBUG_CMD"''']

[exec.scripts.guarded]
pre = ["test -f missing.txt"]
command = ["echo unreachable"]

[[exec]]
name = "publish"
secret_env = ["PIPELINE_TOKEN"]
build = ["echo stage=$${env:STAGE} in=$STAGEHAND_ENVIRONMENT", "test $${env:PIPELINE_TOKEN} = s3cret"]

[exec.environments.staging]
env = { STAGE = "staging" }

[exec.scripts.promote]
command = ["echo stage=$${env:STAGE}", "exit 4"]
env = { STAGE = "prod" }
"#;

fn project(dir: &Path) -> Project {
  let path = dir.join("targets.toml");
  std::fs::write(&path, TARGETS).unwrap();
  Project::load(&path, &OsEnv::from_pairs([("PATH", "/usr/bin:/bin"), ("PIPELINE_TOKEN", "s3cret")])).unwrap()
}

fn run(project: &Project, target: &str, script: &str) -> (Result<ScriptReport, ScriptFailure>, CollectingSink) {
  run_in(project, target, script, None)
}

fn run_in(
  project: &Project,
  target: &str,
  script: &str,
  environment: Option<&str>,
) -> (Result<ScriptReport, ScriptFailure>, CollectingSink) {
  let rt = tokio::runtime::Runtime::new().unwrap();
  let target = project.target(target).unwrap();
  let script = target.script(script).unwrap();
  let ctx = match environment {
    Some(name) => project.context(target).with_environment(name).unwrap(),
    None => project.context(target),
  };
  let sink = CollectingSink::new();
  let result = rt.block_on(run_script(script, &ctx, &SubprocessInvoker, &sink));
  (result, sink)
}

#[test]
fn dependency_outputs_flow_into_commands() {
  if cfg!(windows) {
    return;
  }

  let dir = TempDir::new().unwrap();
  let project = project(dir.path());

  let (gen_result, _) = run(&project, "gen", BUILD_SCRIPT);
  gen_result.unwrap();

  let (result, sink) = run(&project, "app", BUILD_SCRIPT);
  let report = result.unwrap();

  assert_eq!(sink.stdout(), vec!["generated", "built //:app"]);
  assert_eq!(sink.statuses(), vec!["Executing //:app"]);
  assert!(report.ran(Phase::Run));
}

#[test]
fn exported_debug_command_matches_plan() {
  if cfg!(windows) {
    return;
  }

  let dir = TempDir::new().unwrap();
  let project = project(dir.path());
  let target = project.target("app").unwrap();
  let ctx = project.context(target);
  let plan = plan_script(target.script("debug").unwrap(), &ctx).unwrap();

  let (result, sink) = run(&project, "app", "debug");
  let report = result.unwrap();

  let expected = plan.debug_command().unwrap();
  assert_eq!(sink.stdout(), vec![expected.to_string()]);
  assert_eq!(report.debug_command.as_deref(), Some(expected));
  assert_eq!(
    plan.phase(Phase::Run).unwrap().invocation.env.get(ENV_DEBUG_CMD).map(String::as_str),
    Some(expected)
  );
  assert_eq!(ctx.shell().render(plan.phase(Phase::Run).unwrap().command_line()), expected);
}

#[test]
fn failing_pre_phase_stops_script() {
  if cfg!(windows) {
    return;
  }

  let dir = TempDir::new().unwrap();
  let project = project(dir.path());

  let (result, sink) = run(&project, "app", "guarded");

  match result.unwrap_err().error {
    ExecuteError::CmdFailed { phase, cmd, code, .. } => {
      assert_eq!(phase, Phase::Pre);
      assert_eq!(cmd, "test -f missing.txt");
      assert_eq!(code, Some(1));
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(sink.stdout().is_empty());
  assert!(sink.statuses().is_empty());
}

#[test]
fn environment_and_secrets_flow_through_a_real_shell() {
  if cfg!(windows) {
    return;
  }

  let dir = TempDir::new().unwrap();
  let project = project(dir.path());

  let (result, sink) = run_in(&project, "publish", BUILD_SCRIPT, Some("staging"));
  let report = result.unwrap();

  assert_eq!(sink.stdout(), vec!["stage=staging in=staging"]);
  let shown = report.phases[0].command_line.as_str();
  assert!(shown.contains("test <redacted> = <redacted>"), "{shown}");
  assert!(!report.debug_command.unwrap().contains("s3cret"));
}

#[test]
fn failure_carries_the_executed_debug_command() {
  if cfg!(windows) {
    return;
  }

  let dir = TempDir::new().unwrap();
  let project = project(dir.path());

  let (result, sink) = run_in(&project, "publish", "promote", Some("staging"));
  let failure = result.unwrap_err();

  assert_eq!(sink.stdout(), vec!["stage=prod"]);
  assert_eq!(failure.phase(), Some(Phase::Run));
  assert_eq!(
    failure.report.debug_command.as_deref(),
    Some("/bin/sh -c 'echo stage=prod && exit 4'")
  );
}
