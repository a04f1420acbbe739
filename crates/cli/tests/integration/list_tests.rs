//! `stagehand list` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn list_shows_targets_and_scripts() {
  let env = TestEnv::from_fixture("phases.toml");

  env
    .stagehand_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("//:app"))
    .stdout(predicate::str::contains("build, deploy, stage"));
}

#[test]
fn list_shows_description() {
  let env = TestEnv::from_fixture("basic.toml");

  env
    .stagehand_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("//:hello - Prints a greeting"));
}

#[test]
fn list_json_includes_deps_and_labels() {
  let env = TestEnv::from_fixture("deps.toml");

  let output = env.stagehand_cmd().args(["list", "--format", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let targets = json.as_array().unwrap();
  assert_eq!(targets.len(), 2);

  let app = &targets[1];
  assert_eq!(app["qualified_name"], "//:app");
  assert_eq!(app["deps"], serde_json::json!(["//:gen"]));
  // base64 of "cat $${dep::gen}"
  assert_eq!(app["labels"], serde_json::json!(["cmd:Y2F0ICQke2RlcDo6Z2VufQ=="]));

  let scripts = app["scripts"].as_array().unwrap();
  assert_eq!(scripts[0]["name"], "build");
  assert_eq!(scripts[0]["deps"], serde_json::json!(["//:gen"]));
  assert_eq!(scripts[1]["name"], "format");
}

#[test]
fn script_without_command_is_rejected() {
  let env = TestEnv::from_fixture("invalid_scripts.toml");

  env
    .stagehand_cmd()
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no commands provided for lint"));
}

#[test]
fn declared_build_script_conflicts_with_build_command() {
  let env = TestEnv::from_fixture("conflict.toml");

  env
    .stagehand_cmd()
    .arg("list")
    .assert()
    .failure()
    .stderr(predicate::str::contains("conflicts with the top-level build command"));
}

#[test]
fn packages_are_relative_to_root() {
  let env = TestEnv::from_fixture("basic.toml");
  env.write_file("web/targets.toml", &super::common::fixture_content("basic.toml"));

  env
    .stagehand_cmd()
    .args(["--file", "web/targets.toml", "--root", "."])
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("//web:hello"));
}
