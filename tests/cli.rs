//! End-to-end tests against the built binary, isolated in a temp home.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("claudeswap").unwrap();
        cmd.env("CLAUDESWAP_HOME", self.dir.path().join(".claude-swap"))
            .env("CLAUDE_CONFIG_DIR", self.dir.path().join(".claude"))
            .env("NO_COLOR", "1")
            .env_remove("CLAUDESWAP_LOG");
        cmd
    }

    fn settings(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.dir.path().join(".claude/settings.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn add_default_profiles(&self) {
        self.cmd()
            .args(["add", "zai", "--preset", "zai", "--token", "zai-secret-0123456789"])
            .assert()
            .success();
        self.cmd()
            .args([
                "add",
                "anthropic",
                "--base-url",
                "https://api.anthropic.com",
                "--token",
                "sk-ant-0123456789",
            ])
            .assert()
            .success();
    }
}

#[test]
fn help_prints_usage() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: claudeswap"));
}

#[test]
fn current_is_unconfigured_on_fresh_install() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("current")
        .assert()
        .success()
        .stdout("unconfigured\n");
}

#[test]
fn list_without_profiles_succeeds() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles found"));
}

#[test]
fn use_switches_live_settings() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();

    sandbox.cmd().args(["use", "zai"]).assert().success();
    sandbox.cmd().arg("current").assert().success().stdout("zai\n");

    let settings = sandbox.settings();
    assert_eq!(
        settings["env"]["ANTHROPIC_BASE_URL"],
        "https://api.z.ai/api/anthropic"
    );
    assert_eq!(settings["env"]["ANTHROPIC_AUTH_TOKEN"], "zai-secret-0123456789");
    assert_eq!(settings["env"]["ANTHROPIC_DEFAULT_OPUS_MODEL"], "glm-4.6");

    sandbox.cmd().args(["use", "anthropic"]).assert().success();
    let settings = sandbox.settings();
    assert_eq!(settings["env"]["ANTHROPIC_BASE_URL"], "https://api.anthropic.com");
    assert!(settings["env"].get("ANTHROPIC_DEFAULT_OPUS_MODEL").is_none());
    assert!(settings["env"].get("API_TIMEOUT_MS").is_none());

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("anthropic").and(predicate::str::contains("zai")));
}

#[test]
fn unknown_profile_fails_and_keeps_current() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();
    sandbox.cmd().args(["use", "zai"]).assert().success();
    let before = sandbox.settings();

    sandbox
        .cmd()
        .args(["use", "unknown"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'unknown' does not exist"));

    sandbox.cmd().arg("current").assert().success().stdout("zai\n");
    assert_eq!(sandbox.settings(), before);
}

#[test]
fn unmanaged_settings_survive_switch_and_reset() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();
    let claude_dir = sandbox.dir.path().join(".claude");
    fs::create_dir_all(&claude_dir).unwrap();
    fs::write(
        claude_dir.join("settings.json"),
        r#"{"theme": "dark", "env": {"MY_VAR": "keep"}}"#,
    )
    .unwrap();

    sandbox.cmd().args(["use", "zai"]).assert().success();
    sandbox.cmd().arg("reset").assert().success();

    let settings = sandbox.settings();
    assert_eq!(settings["theme"], "dark");
    assert_eq!(settings["env"]["MY_VAR"], "keep");
    assert!(settings["env"].get("ANTHROPIC_BASE_URL").is_none());
    sandbox.cmd().arg("current").assert().stdout("unconfigured\n");
}

#[test]
fn reset_warns_when_state_is_corrupt() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();
    sandbox.cmd().args(["use", "zai"]).assert().success();
    fs::write(sandbox.dir.path().join(".claude-swap/state.json"), "{not json").unwrap();

    sandbox
        .cmd()
        .arg("reset")
        .assert()
        .success()
        .stderr(predicate::str::contains("extra env keys set by the last profile may remain"));
    sandbox.cmd().arg("current").assert().success().stdout("unconfigured\n");
}

#[test]
fn show_masks_credential() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();

    sandbox
        .cmd()
        .args(["show", "zai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****6789"))
        .stdout(predicate::str::contains("zai-secret").not());
}

#[test]
fn add_without_token_fails_non_interactively() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["add", "work", "--preset", "minimax"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--token"));
}

#[test]
fn remove_active_profile_is_refused() {
    let sandbox = Sandbox::new();
    sandbox.add_default_profiles();
    sandbox.cmd().args(["use", "zai"]).assert().success();

    sandbox
        .cmd()
        .args(["remove", "zai", "--force"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("currently active"));
    sandbox
        .cmd()
        .args(["remove", "anthropic", "--force"])
        .assert()
        .success();
}

#[test]
fn completions_are_generated() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("claudeswap"));
}

#[test]
fn invalid_arguments_exit_with_one() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("frobnicate").assert().code(1);
}
