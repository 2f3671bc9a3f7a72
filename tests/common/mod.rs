#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;

/// A self-contained test environment with an isolated data directory.
pub struct TestEnv {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl TestEnv {
    /// An environment whose database does not exist yet.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("data").join("kbv").join("kbv.db");
        TestEnv { dir, db_path }
    }

    /// An environment loaded from a backup document through `kbv import`.
    pub fn with_backup(backup: &Value) -> Self {
        let env = Self::empty();
        let path = env.write_file("seed.json", &backup.to_string());
        env.cmd().arg("import").arg(&path).assert().success();
        env
    }

    /// An environment with a known set of speakers, hosts and visits.
    pub fn with_fixture() -> Self {
        Self::with_backup(&fixture_backup())
    }

    /// An environment whose key/value table holds `entries` verbatim, as an
    /// older version would have left it. Nothing has been upgraded yet.
    pub fn with_raw_entries(entries: &[(&str, Value)]) -> Self {
        let env = Self::empty();
        std::fs::create_dir_all(env.db_path.parent().unwrap()).unwrap();
        let conn = Connection::open(&env.db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at TEXT NOT NULL);",
        )
        .unwrap();
        for (key, value) in entries {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, '2024-01-01T00:00:00Z')",
                (key, value.to_string()),
            )
            .unwrap();
        }
        env
    }

    /// Get a Command configured to run kbv with this environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("kbv");
        cmd.env("XDG_DATA_HOME", self.dir.path().join("data"));
        cmd.env_remove("KBV_LOG");
        // Ensure no color codes pollute test output
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Get a Command with --json flag.
    pub fn cmd_json(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--json");
        cmd
    }

    /// Run kbv with `--json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd_json().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap_or_else(|e| {
            panic!("invalid JSON from {:?}: {}\n{}", args, e, String::from_utf8_lossy(&output))
        })
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// The stored JSON under `key`, read straight from the database file.
    pub fn raw_entry(&self, key: &str) -> Option<Value> {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .ok()
            .map(|s| serde_json::from_str(&s).unwrap())
    }
}

/// Two speakers, two hosts, three scheduled visits and one archived visit.
///
/// - `v-jean` Jean Dupont (Marseille KBV) on 2025-07-06, host Marc, confirmed
/// - `v-paul` Paul Martin (Porto KBV) on 2025-07-13, unassigned, pending
/// - `v-paul-zoom` Paul Martin on 2025-07-20, zoom, unassigned
/// - archived `v-old` Jean Dupont on 2025-03-02, host Sophie
pub fn fixture_backup() -> Value {
    serde_json::json!({
        "speakers": [
            {
                "id": "s-jean",
                "nom": "Jean Dupont",
                "congregation": "Marseille KBV",
                "talkHistory": [{"date": "2025-03-02", "talkNo": "12", "theme": "Amour"}],
                "telephone": "0611111111"
            },
            {
                "id": "s-paul",
                "nom": "Paul Martin",
                "congregation": "Porto KBV",
                "talkHistory": []
            }
        ],
        "hosts": [
            {"nom": "Marc", "telephone": "0622222222", "gender": "male", "unavailability": []},
            {
                "nom": "Sophie",
                "telephone": "0633333333",
                "gender": "female",
                "unavailability": [
                    {"id": "p-sophie", "startDate": "2025-07-10", "endDate": "2025-07-15", "reason": "Vacances"}
                ]
            }
        ],
        "visits": [
            {
                "id": "s-jean", "nom": "Jean Dupont", "congregation": "Marseille KBV",
                "visitId": "v-jean", "visitDate": "2025-07-06", "visitTime": "14:30",
                "host": "Marc", "accommodation": "", "meals": "", "status": "confirmed",
                "locationType": "physical", "communicationStatus": {},
                "talkNoOrType": "45", "talkTheme": "Espoir"
            },
            {
                "id": "s-paul", "nom": "Paul Martin", "congregation": "Porto KBV",
                "visitId": "v-paul", "visitDate": "2025-07-13", "visitTime": "14:30",
                "host": "À définir", "accommodation": "", "meals": "", "status": "pending",
                "locationType": "physical", "communicationStatus": {},
                "talkNoOrType": null, "talkTheme": null
            },
            {
                "id": "s-paul", "nom": "Paul Martin", "congregation": "Porto KBV",
                "visitId": "v-paul-zoom", "visitDate": "2025-07-20", "visitTime": "14:30",
                "host": "À définir", "accommodation": "", "meals": "", "status": "pending",
                "locationType": "zoom", "communicationStatus": {},
                "talkNoOrType": null, "talkTheme": null
            }
        ],
        "archivedVisits": [
            {
                "id": "s-jean", "nom": "Jean Dupont", "congregation": "Marseille KBV",
                "visitId": "v-old", "visitDate": "2025-03-02", "visitTime": "14:30",
                "host": "Sophie", "accommodation": "", "meals": "", "status": "completed",
                "locationType": "physical", "communicationStatus": {},
                "talkNoOrType": "12", "talkTheme": "Amour"
            }
        ],
        "customTemplates": {},
        "customHostRequestTemplates": {},
        "googleSheetId": "",
        "googleApiKey": "",
        "schemaVersion": 2
    })
}
