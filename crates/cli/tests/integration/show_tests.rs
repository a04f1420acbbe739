//! `stagehand show` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn show_prints_joined_line_and_debug_command() {
  let env = TestEnv::from_fixture("basic.toml");

  env
    .stagehand_cmd()
    .args(["show", "hello"])
    .assert()
    .success()
    .stdout(predicate::str::contains("run: echo hello && echo world"))
    .stdout(predicate::str::contains("Debug command:"))
    .stdout(predicate::str::contains("-c 'echo hello && echo world'"));
}

#[test]
fn show_does_not_execute() {
  let env = TestEnv::from_fixture("phases.toml");

  env.stagehand_cmd().args(["show", "app", "deploy"]).assert().success();

  assert_eq!(env.read_file("order.log"), None);
}

#[test]
fn show_json_lists_phases_in_order() {
  let env = TestEnv::from_fixture("phases.toml");

  let output = env
    .stagehand_cmd()
    .args(["show", "app", "deploy", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["target"], "//:app");
  assert_eq!(json["script"], "deploy");

  let phases = json["phases"].as_array().unwrap();
  let names: Vec<_> = phases.iter().map(|p| p["phase"].as_str().unwrap()).collect();
  assert_eq!(names, vec!["pre", "run", "post"]);

  let run = &phases[1];
  assert_eq!(run["command_line"], "echo run >> order.log");
  assert_eq!(run["env"]["STAGE"], "prod");
  assert_eq!(run["env"]["STAGEHAND_SCRIPT"], "deploy");
  assert_eq!(run["env"]["STAGEHAND_DEBUG_CMD"], json["debug_command"]);
  assert!(phases[0]["env"].get("STAGEHAND_DEBUG_CMD").is_none());
}

#[test]
fn show_interpolates_dependency_outputs() {
  let env = TestEnv::from_fixture("deps.toml");
  let gen_header = env.project_dir().join("gen.h");

  env
    .stagehand_cmd()
    .args(["show", "app", "format"])
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("run: echo fmt {}", gen_header.display())));
}

#[test]
fn show_redacts_secrets() {
  let env = TestEnv::from_fixture("secrets.toml");

  let output = env
    .stagehand_cmd()
    .env("STAGEHAND_TEST_TOKEN", "hunter2")
    .env("STAGEHAND_TEST_REGION", "eu-west-1")
    .args(["show", "publish", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(!stdout.contains("hunter2"), "secret leaked: {stdout}");

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let run_env = &json["phases"][0]["env"];
  assert_eq!(run_env["STAGEHAND_TEST_TOKEN"], "<redacted>");
  assert_eq!(run_env["STAGEHAND_TEST_REGION"], "eu-west-1");
  assert_eq!(run_env["MODE"], "release");
}

#[test]
fn show_reports_interpolation_errors() {
  let env = TestEnv::from_fixture("failing.toml");

  env
    .stagehand_cmd()
    .args(["show", "bad_placeholder"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("echo $${env:STAGEHAND_NEVER_SET}"));
}

#[test]
fn show_empty_primary_has_nothing_to_run() {
  let env = TestEnv::from_fixture("failing.toml");

  env
    .stagehand_cmd()
    .args(["show", "pre_fails"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to run"))
    .stdout(predicate::str::contains("Debug command").not());
}

#[test]
fn show_masks_interpolated_secrets() {
  let env = TestEnv::from_fixture("secrets.toml");

  let output = env
    .stagehand_cmd()
    .env("STAGEHAND_TEST_TOKEN", "hunter2")
    .args(["show", "publish", "upload", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(!stdout.contains("hunter2"), "secret leaked: {stdout}");

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let run = &json["phases"][0];
  assert_eq!(run["command_line"], "test <redacted> = <redacted> && echo uploaded");
  assert_eq!(
    run["env"]["STAGEHAND_DEBUG_CMD"],
    "/bin/sh -c 'test <redacted> = <redacted> && echo uploaded'"
  );
  assert_eq!(json["debug_command"], run["debug_command"]);
}

#[test]
fn show_verbose_masks_secrets_in_text() {
  let env = TestEnv::from_fixture("secrets.toml");

  env
    .stagehand_cmd()
    .env("STAGEHAND_TEST_TOKEN", "hunter2")
    .args(["-v", "show", "publish", "upload"])
    .assert()
    .success()
    .stdout(predicate::str::contains("STAGEHAND_TEST_TOKEN=<redacted>"))
    .stdout(predicate::str::contains("hunter2").not())
    .stderr(predicate::str::contains("hunter2").not());
}

#[test]
fn show_interpolates_script_overlay() {
  let env = TestEnv::from_fixture("phases.toml");

  env
    .stagehand_cmd()
    .args(["show", "app", "tagged"])
    .assert()
    .success()
    .stdout(predicate::str::contains("run: echo tag=v1"));
}

#[test]
fn show_in_environment() {
  let env = TestEnv::from_fixture("environments.toml");

  let output = env
    .stagehand_cmd()
    .args(["show", "api", "smoke", "--environment", "prod", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["environment"], "prod");
  let run = &json["phases"][0];
  assert_eq!(run["command_line"], "echo smoke https://api.example.com smoke");
  assert_eq!(run["env"]["STAGEHAND_ENVIRONMENT"], "prod");
  assert_eq!(run["env"]["MODE"], "smoke");
}

#[test]
fn show_unknown_environment_fails() {
  let env = TestEnv::from_fixture("environments.toml");

  env
    .stagehand_cmd()
    .args(["show", "api", "-e", "qa"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("target //:api has no environment 'qa'"));
}
