//! CLI smoke tests against the built binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn sks(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("sks").unwrap();
    cmd.env("HOME", home)
        .env_remove("SKILLSYNC_ROOT")
        .env_remove("SKILLSYNC_CONFIG");
    cmd
}

#[test]
fn init_creates_root_layout() {
    let tmp = tempfile::tempdir().unwrap();
    sks(tmp.path())
        .args(["init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".skillsync/skillsync.db").exists());
    assert!(tmp.path().join(".skillsync/skills").exists());
    assert!(tmp.path().join(".skillsync/backups").exists());
}

#[test]
fn status_reports_empty_registry() {
    let tmp = tempfile::tempdir().unwrap();
    sks(tmp.path()).args(["init"]).assert().success();
    sks(tmp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 skills"));
}

#[test]
fn skills_add_then_list_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let skill_dir = tmp.path().join("incoming/frontend-design");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(
        skill_dir.join("SKILL.md"),
        "---\nname: frontend-design\nversion: 1.0.0\n---\n\n# Guide\n",
    )
    .unwrap();

    sks(tmp.path()).args(["init"]).assert().success();
    sks(tmp.path())
        .args(["skills", "add"])
        .arg(&skill_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("frontend-design"));

    sks(tmp.path())
        .args(["skills", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"frontend-design\""));
}

#[test]
fn deploy_and_status_see_the_deployment() {
    let tmp = tempfile::tempdir().unwrap();
    let skill_dir = tmp.path().join("incoming/demo");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(skill_dir.join("SKILL.md"), "# demo\n").unwrap();

    sks(tmp.path()).args(["init"]).assert().success();
    sks(tmp.path())
        .args(["skills", "add"])
        .arg(&skill_dir)
        .assert()
        .success();
    sks(tmp.path())
        .args(["deploy", "demo", "--tool", "claude-code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deployed"));

    assert!(tmp.path().join(".claude/skills/demo/SKILL.md").exists());

    sks(tmp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("synced"));
}

#[test]
fn unknown_skill_fails_with_error() {
    let tmp = tempfile::tempdir().unwrap();
    sks(tmp.path()).args(["init"]).assert().success();
    sks(tmp.path())
        .args(["deploy", "ghost", "--tool", "cursor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Skill not found"));
}

#[test]
fn json_error_output_is_structured() {
    let tmp = tempfile::tempdir().unwrap();
    sks(tmp.path()).args(["init"]).assert().success();
    sks(tmp.path())
        .args(["--json", "sync", "missing-deployment"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DEPLOYMENT_NOT_FOUND"));
}
