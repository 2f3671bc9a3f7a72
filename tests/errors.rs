mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn unknown_speaker_is_reported() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["speakers", "show", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No speaker found matching \"Nobody\""));
}

#[test]
fn ambiguous_speaker_lists_the_match_count() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["visits", "schedule", "a", "2025-08-03"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matches 2 speakers"));
}

#[test]
fn unknown_visit_is_reported() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["visits", "complete", "zzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No visit found matching \"zzz\""));
}

#[test]
fn unknown_host_is_reported() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["visits", "edit", "v-paul", "--host", "Jacques"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No host found matching \"Jacques\""));
}

#[test]
fn invalid_date_is_rejected_by_the_parser() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["visits", "schedule", "Jean", "06/07/2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn completed_status_cannot_be_set_by_edit() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["visits", "edit", "v-paul", "--status", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kbv visits complete"));
}

#[test]
fn sync_without_a_sheet_is_not_configured() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn sync_without_an_api_key_is_not_configured() {
    let env = TestEnv::with_fixture();
    env.cmd()
        .args(["settings", "set-sheet", "1AbCdEf"])
        .assert()
        .success();
    env.cmd()
        .args(["sync", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is not configured"));
}

#[test]
fn missing_import_file_is_reported() {
    let env = TestEnv::empty();
    env.cmd()
        .args(["import", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn invalid_subcommand() {
    let env = TestEnv::empty();
    env.cmd().arg("nonexistent").assert().failure();
}

#[test]
fn invalid_config_is_reported() {
    let env = TestEnv::empty();
    let config_dir = env.dir.path().join("data").join("kbv");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "unknown_key = 1\n").unwrap();

    env.cmd()
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}
