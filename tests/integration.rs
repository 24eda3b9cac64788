use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Scratch layout for one end-to-end scan: a target tree, an assets
/// root with per-scanner fixtures, a catalog file, and an isolated HOME.
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("target")).unwrap();
        fs::create_dir_all(root.path().join("home")).unwrap();
        fs::write(root.path().join("target/app.py"), "print('hi')\n").unwrap();
        Self { root }
    }

    fn target(&self) -> PathBuf {
        self.root.path().join("target")
    }

    fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    fn catalog(&self) -> PathBuf {
        self.root.path().join("catalog.toml")
    }

    fn assets(&self) -> PathBuf {
        self.root.path().join("assets")
    }

    /// Register a fake scanner that copies its fixture document into the
    /// scan output directory.
    fn add_scanner(&self, name: &str, fixture: serde_json::Value) {
        let asset_dir = self.assets().join(name);
        fs::create_dir_all(&asset_dir).unwrap();
        fs::write(asset_dir.join("fixture.sarif"), fixture.to_string()).unwrap();
        self.add_raw_scanner(
            name,
            &format!("cp {{assets}}/fixture.sarif {{output}}/{name}.sarif"),
        );
    }

    /// Register a scanner with an arbitrary command template.
    fn add_raw_scanner(&self, name: &str, cmd: &str) {
        let entry = format!(
            "[[scanners]]\nname = \"{name}\"\ntitle = \"{name}\"\ncategories = [\"SAST\"]\ncmd = \"{cmd}\"\ndefault = true\n\n"
        );
        let mut catalog = fs::read_to_string(self.catalog()).unwrap_or_default();
        catalog.push_str(&entry);
        fs::write(self.catalog(), catalog).unwrap();
    }

    fn scan_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dragnet"));
        cmd.arg("scan")
            .arg(self.target())
            .arg("--catalog")
            .arg(self.catalog())
            .arg("--assets")
            .arg(self.assets())
            .env("HOME", self.home())
            .env_remove("DRAGNET_AGENT_TOKEN")
            .env_remove("DRAGNET_PROFILE");
        cmd
    }
}

fn clean_fixture(tool: &str) -> serde_json::Value {
    json!({
        "version": "2.1.0",
        "runs": [{
            "tool": {"driver": {"name": tool}},
            "results": []
        }]
    })
}

/// Two errors (one inherited from the rule default, one explicit) and
/// one inherited warning.
fn findings_fixture() -> serde_json::Value {
    json!({
        "version": "2.1.0",
        "runs": [{
            "tool": {"driver": {
                "name": "Official Findings Tool",
                "rules": [
                    {"id": "RULE-ERR", "defaultConfiguration": {"level": "error"}},
                    {"id": "RULE-WARN", "defaultConfiguration": {"level": "warning"}}
                ]
            }},
            "results": [
                {
                    "ruleId": "RULE-ERR",
                    "message": {"text": "hardcoded credential in /app/src/main.py"},
                    "locations": [{"physicalLocation": {
                        "artifactLocation": {"uri": "/app/src/main.py"},
                        "region": {"startLine": 3}
                    }}]
                },
                {
                    "ruleId": "RULE-ERR",
                    "level": "error",
                    "message": {"text": "command injection"},
                    "locations": [{"physicalLocation": {
                        "artifactLocation": {"uri": "/app/src/main.py"},
                        "region": {"startLine": 9}
                    }}]
                },
                {
                    "ruleId": "RULE-WARN",
                    "message": {"text": "weak hash"},
                    "locations": [{"physicalLocation": {
                        "artifactLocation": {"uri": "/app/src/util.py"},
                        "region": {"startLine": 2}
                    }}]
                }
            ]
        }]
    })
}

mod scan_outcomes {
    use super::*;

    #[test]
    fn test_clean_scan_exits_zero() {
        let ws = Workspace::new();
        ws.add_scanner("clean", clean_fixture("Clean Tool"));

        ws.scan_cmd()
            .assert()
            .success()
            .stdout(predicate::str::contains("INFO: Running a local scan."))
            .stdout(predicate::str::contains("Running 1 of 1 scanners:"))
            .stdout(predicate::str::contains(
                "0 vulnerabilities: 0 high, 0 moderate, 0 low.",
            ));
    }

    #[test]
    fn test_findings_drive_the_exit_code() {
        let ws = Workspace::new();
        ws.add_scanner("findings", findings_fixture());

        ws.scan_cmd()
            .assert()
            .code(11)
            .stdout(predicate::str::contains(
                "3 vulnerabilities: 2 high, 1 moderate, 0 low.",
            ))
            .stdout(predicate::str::contains("src/main.py:3"))
            .stdout(predicate::str::contains("Terminating with exit code 11."));
    }

    #[test]
    fn test_sarif_vocabulary() {
        let ws = Workspace::new();
        ws.add_scanner("findings", findings_fixture());

        ws.scan_cmd()
            .args(["--format", "sarif"])
            .assert()
            .code(11)
            .stdout(predicate::str::contains(
                "3 vulnerabilities: 2 error(s), 1 warning(s), 0 note(s).",
            ));
    }

    #[test]
    fn test_escalation_promotes_warnings() {
        let ws = Workspace::new();
        ws.add_scanner("findings", findings_fixture());

        ws.scan_cmd()
            .args(["--format", "sarif", "--escalate", "warning"])
            .assert()
            .code(9)
            .stdout(predicate::str::contains(
                "3 vulnerabilities: 3 error(s), 0 warning(s), 0 note(s).",
            ));
    }

    #[test]
    fn test_quiet_mode_suppresses_output() {
        let ws = Workspace::new();
        ws.add_scanner("findings", findings_fixture());

        ws.scan_cmd()
            .arg("--quiet")
            .assert()
            .code(11)
            .stdout(predicate::str::is_empty());
    }
}

mod scan_failures {
    use super::*;

    #[test]
    fn test_failing_scanner_aborts_with_16() {
        let ws = Workspace::new();
        ws.add_raw_scanner("slowpoke", "sleep 30");
        ws.add_raw_scanner("broken", "echo boom >&2; exit 3");

        let started = Instant::now();
        ws.scan_cmd()
            .assert()
            .code(16)
            .stderr(predicate::str::contains("broken"))
            .stderr(predicate::str::contains("boom"))
            .stderr(predicate::str::contains("Scan NOT completed!"));
        // The sleeping sibling was killed rather than waited out.
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_scanner_without_output_aborts_with_16() {
        let ws = Workspace::new();
        ws.add_raw_scanner("lazy", "true");

        ws.scan_cmd()
            .assert()
            .code(16)
            .stderr(predicate::str::contains("lazy.sarif"));
    }

    #[test]
    fn test_unknown_scanner_is_invalid_invocation() {
        let ws = Workspace::new();
        ws.add_scanner("clean", clean_fixture("Clean Tool"));

        ws.scan_cmd()
            .args(["--scanners", "nope"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unknown scanner: nope"));
    }

    #[test]
    fn test_missing_target_is_invalid_invocation() {
        let ws = Workspace::new();
        ws.add_scanner("clean", clean_fixture("Clean Tool"));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dragnet"));
        cmd.arg("scan")
            .arg("/definitely/not/here")
            .arg("--catalog")
            .arg(ws.catalog())
            .env("HOME", ws.home())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Path not found"));
    }
}

mod exported_document {
    use super::*;

    #[test]
    fn test_output_file_is_normalized_sarif() {
        let ws = Workspace::new();
        ws.add_scanner("findings", findings_fixture());
        let outfile = ws.root.path().join("scan.sarif");

        ws.scan_cmd()
            .arg("--output")
            .arg(&outfile)
            .assert()
            .code(11)
            .stdout(predicate::str::contains("Findings exported to"));

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outfile).unwrap()).unwrap();
        assert_eq!(document["version"], json!("2.1.0"));

        let run = &document["runs"][0];
        // Tool renamed to the scanner id; original name preserved.
        assert_eq!(run["tool"]["driver"]["name"], json!("findings"));
        assert_eq!(
            run["tool"]["driver"]["properties"]["officialName"],
            json!("Official Findings Tool")
        );

        // Sandbox paths rewritten in both the location and the message.
        let result = &run["results"][0];
        assert_eq!(
            result["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            json!("src/main.py")
        );
        assert_eq!(
            result["message"]["text"],
            json!("hardcoded credential in src/main.py")
        );
    }

    #[test]
    fn test_rule_catalog_contains_only_referenced_rules() {
        let ws = Workspace::new();
        let mut fixture = findings_fixture();
        fixture["runs"][0]["tool"]["driver"]["rules"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "ORPHAN", "defaultConfiguration": {"level": "note"}}));
        ws.add_scanner("findings", fixture);
        let outfile = ws.root.path().join("scan.sarif");

        ws.scan_cmd().arg("--output").arg(&outfile).assert().code(11);

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outfile).unwrap()).unwrap();
        let rule_ids: Vec<&str> = document["runs"][0]["tool"]["driver"]["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|rule| rule["id"].as_str().unwrap())
            .collect();
        assert_eq!(rule_ids, vec!["RULE-ERR", "RULE-WARN"]);
    }

    #[test]
    fn test_runs_follow_catalog_order() {
        let ws = Workspace::new();
        ws.add_scanner("first", clean_fixture("Tool One"));
        ws.add_scanner("second", clean_fixture("Tool Two"));
        let outfile = ws.root.path().join("scan.sarif");

        ws.scan_cmd().arg("--output").arg(&outfile).assert().success();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outfile).unwrap()).unwrap();
        assert_eq!(document["runs"][0]["tool"]["driver"]["name"], json!("first"));
        assert_eq!(document["runs"][1]["tool"]["driver"]["name"], json!("second"));
    }
}

mod scanners_listing {
    use super::*;

    #[test]
    fn test_lists_builtin_catalog() {
        Command::new(env!("CARGO_BIN_EXE_dragnet"))
            .arg("scanners")
            .assert()
            .success()
            .stdout(predicate::str::contains("opengrep"))
            .stdout(predicate::str::contains("(default)"));
    }

    #[test]
    fn test_lists_custom_catalog() {
        let ws = Workspace::new();
        ws.add_scanner("custom-tool", clean_fixture("Custom"));

        Command::new(env!("CARGO_BIN_EXE_dragnet"))
            .arg("scanners")
            .arg("--catalog")
            .arg(ws.catalog())
            .assert()
            .success()
            .stdout(predicate::str::contains("custom-tool"))
            .stdout(predicate::str::contains("[SAST]"));
    }

    #[test]
    fn test_help_lists_exit_codes() {
        Command::new(env!("CARGO_BIN_EXE_dragnet"))
            .args(["scan", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Exit codes:"))
            .stdout(predicate::str::contains("8-15"));
    }
}

// The scan output directory is owned by one scan and must be gone after
// it, on success and on failure alike.
mod scan_workdir {
    use super::*;

    fn scans_dir(home: &Path) -> PathBuf {
        home.join(".dragnet").join("scans")
    }

    #[test]
    fn test_output_directory_removed_after_success() {
        let ws = Workspace::new();
        ws.add_scanner("clean", clean_fixture("Clean Tool"));

        ws.scan_cmd().assert().success();

        let leftovers: Vec<_> = fs::read_dir(scans_dir(&ws.home())).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_output_directory_removed_after_failure() {
        let ws = Workspace::new();
        ws.add_raw_scanner("broken", "exit 3");

        ws.scan_cmd().assert().code(16);

        let leftovers: Vec<_> = fs::read_dir(scans_dir(&ws.home())).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
