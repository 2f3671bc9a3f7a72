mod common;

use common::{TestEnv, fixture_backup};
use predicates::prelude::*;
use serde_json::json;

#[test]
fn export_then_import_restores_the_same_document() {
    let source = TestEnv::with_fixture();
    source
        .cmd()
        .args(["settings", "set-sheet", "1AbCdEf"])
        .assert()
        .success();
    let path = source.dir.path().join("backup.json");
    source
        .cmd()
        .arg("export")
        .arg("-o")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported to"));

    let target = TestEnv::empty();
    let summary: serde_json::Value = serde_json::from_slice(
        &target
            .cmd_json()
            .arg("import")
            .arg(&path)
            .assert()
            .success()
            .get_output()
            .stdout,
    )
    .unwrap();
    assert_eq!(summary["speakers"], 2);
    assert_eq!(summary["visits"], 3);
    assert_eq!(summary["archivedVisits"], 1);
    assert_eq!(summary["upgraded"], false);

    assert_eq!(target.json(&["export"]), source.json(&["export"]));
    assert_eq!(target.json(&["export"])["googleSheetId"], "1AbCdEf");
}

#[test]
fn import_without_hosts_is_rejected_and_nothing_changes() {
    let env = TestEnv::with_fixture();
    let before = env.json(&["export"]);

    let mut broken = fixture_backup();
    broken.as_object_mut().unwrap().remove("hosts");
    let path = env.write_file("broken.json", &broken.to_string());

    env.cmd()
        .arg("import")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing \"hosts\""));

    assert_eq!(env.json(&["export"]), before);
}

#[test]
fn import_of_invalid_json_fails_cleanly() {
    let env = TestEnv::with_fixture();
    let path = env.write_file("garbage.json", "{not json");

    env.cmd()
        .arg("import")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid JSON backup"));

    assert_eq!(env.json(&["info"])["speakers"], 2);
}

#[test]
fn import_upgrades_an_old_backup() {
    let env = TestEnv::with_backup(&json!({
        "speakers": [{
            "id": "s1", "nom": "Jean Dupont", "congregation": "Nice KBV",
            "lastVisitDate": "2024-03-10", "lastTalkNoOrType": "7", "latestDPTheme": "Foi"
        }],
        "visits": [{
            "id": "s1", "nom": "Jean Dupont", "congregation": "Nice KBV",
            "visitId": "v1", "visitDate": "2025-02-02", "visitTime": "14:30",
            "host": "Marc", "status": "confirmed", "latestDPTheme": "Foi",
            "preparationMessageSentOn": "2025-01-20T10:00:00.000Z"
        }],
        "hosts": [
            {"nom": "Marc", "telephone": "06", "status": "available"},
            {"nom": "Luc", "telephone": "07", "status": "unavailable", "unavailableUntil": "2025-03-01"}
        ],
        "googleSheetUrl": "legacy-sheet"
    }));

    let speaker = env.json(&["speakers", "show", "s1"]);
    assert_eq!(speaker["talkHistory"][0]["date"], "2024-03-10");
    assert_eq!(speaker["talkHistory"][0]["talkNo"], "7");
    assert_eq!(speaker["talkHistory"][0]["theme"], "Foi");

    let visit = env.json(&["visits", "show", "v1"]);
    assert!(visit["talkNoOrType"].is_null());
    assert!(visit["communicationStatus"]["preparation"]["speaker"].is_string());
    assert!(visit["communicationStatus"]["preparation"]["host"].is_string());

    let luc = env.json(&["hosts", "show", "Luc"]);
    assert_eq!(luc["gender"], "male");
    assert_eq!(luc["unavailability"][0]["startDate"], "2024-01-01");
    assert_eq!(luc["unavailability"][0]["endDate"], "2025-03-01");

    let export = env.json(&["export"]);
    assert_eq!(export["googleSheetId"], "legacy-sheet");
    assert_eq!(export["schemaVersion"], 2);
}

#[test]
fn reset_requires_confirmation() {
    let env = TestEnv::with_fixture();

    env.cmd()
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(env.json(&["info"])["speakers"], 2);

    env.cmd()
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("All data deleted."));

    let info = env.json(&["info"]);
    assert_eq!(info["speakers"], 0);
    assert_eq!(info["hosts"], 0);
    assert_eq!(info["visits"], 0);
    assert_eq!(info["archivedVisits"], 0);
}
