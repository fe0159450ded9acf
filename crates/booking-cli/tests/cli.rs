use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = r#"
timezone = "UTC"
default_service = 1
open = "09:00"
close = "12:00"
slot_step_minutes = 30

[[services]]
id = 1
name = "Consultation"
duration_minutes = 60

[[services]]
id = 2
name = "Quick check"
duration_minutes = 15
"#;

const ONE_BOOKING: &str = r#"[
  {
    "id": 1,
    "owner": 5,
    "contact": {"name": "Ada", "surname": "Lovelace", "email": "ada@example.com"},
    "service": 1,
    "slot": {"start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z"}
  }
]"#;

struct Calendar {
    dir: TempDir,
}

impl Calendar {
    fn new(bookings: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("booking.toml"), CONFIG).unwrap();
        if let Some(json) = bookings {
            std::fs::write(dir.path().join("bookings.json"), json).unwrap();
        }
        Calendar { dir }
    }

    fn bookings_path(&self) -> PathBuf {
        self.dir.path().join("bookings.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("booking").unwrap();
        cmd.arg("--config")
            .arg(self.dir.path().join("booking.toml"))
            .arg("--bookings")
            .arg(self.bookings_path());
        cmd
    }

    fn stored(&self) -> Vec<Value> {
        read_json(&self.bookings_path()).as_array().unwrap().clone()
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── services ────────────────────────────────────────────────────────────

#[test]
fn test_services_lists_catalog() {
    let cal = Calendar::new(None);
    let output = cal.cmd().arg("services").output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json[0]["name"], "Consultation");
    assert_eq!(json[1]["duration_minutes"], 15);
}

#[test]
fn test_missing_config_fails_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("booking")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("services")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_out_of_range_config_values_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("booking.toml");
    for bad in [
        "[[services]]\nid = 1\nname = \"Forever\"\nduration_minutes = 9223372036854775807\n",
        "slot_step_minutes = 1000000000000\n",
    ] {
        std::fs::write(&config, bad).unwrap();
        Command::cargo_bin("booking")
            .unwrap()
            .arg("--config")
            .arg(&config)
            .args(["free", "--date", "2026-03-02"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid config file"));
    }
}

// ── check ───────────────────────────────────────────────────────────────

#[test]
fn test_check_back_to_back_is_accepted() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args(["check", "--start", "2026-03-02T10:00"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["start"], "2026-03-02T10:00:00Z");
    assert_eq!(json["end"], "2026-03-02T11:00:00Z");
}

#[test]
fn test_check_overlap_is_rejected_with_conflict() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args(["check", "--start", "2026-03-02T09:30", "--service", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["code"], "slot_conflict");
    assert_eq!(json["conflict"]["start"], "2026-03-02T09:00:00Z");
    assert_eq!(json["booking_id"], 1);
}

#[test]
fn test_check_inverted_interval() {
    let cal = Calendar::new(None);
    cal.cmd()
        .args([
            "check",
            "--start",
            "2026-03-02T11:00",
            "--end",
            "2026-03-02T10:00",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("invalid_interval"));
}

#[test]
fn test_check_unknown_service() {
    let cal = Calendar::new(None);
    cal.cmd()
        .args(["check", "--start", "2026-03-02T10:00", "--service", "99"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("unknown_service"));
}

#[test]
fn test_check_does_not_write() {
    let cal = Calendar::new(None);
    cal.cmd()
        .args(["check", "--start", "2026-03-02T10:00"])
        .assert()
        .success();
    assert!(!cal.bookings_path().exists());
}

// ── book / reschedule / cancel ──────────────────────────────────────────

fn book(cal: &Calendar, start: &str, service: &str) -> std::process::Output {
    cal.cmd()
        .args([
            "book",
            "--name",
            "Grace",
            "--surname",
            "Hopper",
            "--email",
            "grace@example.com",
            "--start",
            start,
            "--service",
            service,
        ])
        .output()
        .unwrap()
}

#[test]
fn test_book_creates_file_and_assigns_id() {
    let cal = Calendar::new(None);
    let output = book(&cal, "2026-03-02T10:00", "2");
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["booking"]["id"], 1);
    assert_eq!(json["end"], "2026-03-02T10:15:00Z");

    let stored = cal.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["contact"]["email"], "grace@example.com");
}

#[test]
fn test_second_booking_of_same_slot_is_rejected() {
    let cal = Calendar::new(None);
    assert!(book(&cal, "2026-03-02T10:00", "1").status.success());
    let output = book(&cal, "2026-03-02T10:30", "2");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["code"], "slot_conflict");
    assert_eq!(cal.stored().len(), 1);
}

#[test]
fn test_book_continues_ids_from_file() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = book(&cal, "2026-03-02T10:00", "1");
    assert_eq!(stdout_json(&output)["booking"]["id"], 2);
    assert_eq!(cal.stored().len(), 2);
}

#[test]
fn test_reschedule_keeps_length() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args(["reschedule", "--id", "1", "--start", "2026-03-02T09:30"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["start"], "2026-03-02T09:30:00Z");
    assert_eq!(json["end"], "2026-03-02T10:30:00Z");
    assert_eq!(cal.stored()[0]["slot"]["start"], "2026-03-02T09:30:00Z");
}

#[test]
fn test_reschedule_with_new_service_and_contact() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args([
            "reschedule",
            "--id",
            "1",
            "--start",
            "2026-03-02T09:30",
            "--service",
            "2",
            "--email",
            "ada@analytical.engine",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["end"], "2026-03-02T09:45:00Z");

    let stored = &cal.stored()[0];
    assert_eq!(stored["service"], 2);
    assert_eq!(stored["contact"]["email"], "ada@analytical.engine");
    assert_eq!(stored["contact"]["name"], "Ada");
}

#[test]
fn test_reschedule_to_unknown_service_is_rejected() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    cal.cmd()
        .args(["reschedule", "--id", "1", "--start", "2026-03-02T11:00", "--service", "99"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("unknown_service"));
    assert_eq!(cal.stored()[0]["service"], 1);
}

#[test]
fn test_reschedule_onto_other_booking_is_rejected() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    assert!(book(&cal, "2026-03-02T11:00", "1").status.success());
    cal.cmd()
        .args(["reschedule", "--id", "1", "--start", "2026-03-02T10:30"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("slot_conflict"));
}

#[test]
fn test_cancel_unknown_id() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    cal.cmd()
        .args(["cancel", "--id", "9"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("not_found"));
    assert_eq!(cal.stored().len(), 1);
}

#[test]
fn test_cancel_removes_booking() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    cal.cmd()
        .args(["cancel", "--id", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));
    assert!(cal.stored().is_empty());
}

// ── free / list ─────────────────────────────────────────────────────────

#[test]
fn test_free_reports_gaps_and_grid() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args(["free", "--date", "2026-03-02"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["window"]["start"], "2026-03-02T09:00:00Z");
    assert_eq!(json["free"][0]["start"], "2026-03-02T10:00:00Z");
    assert_eq!(json["free"][0]["duration_minutes"], 120);
    let bookable = json["bookable"].as_array().unwrap();
    // 10:00, 10:30, 11:00 for a 60 minute service closing at 12:00
    assert_eq!(bookable.len(), 3);
}

#[test]
fn test_list_redacts_for_guest() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal.cmd().arg("list").output().unwrap();
    let json = stdout_json(&output);
    assert_eq!(json[0]["contact"]["name"], "Taken");
    assert_eq!(json[0]["slot"]["start"], "2026-03-02T09:00:00Z");
}

#[test]
fn test_list_shows_owner_their_booking() {
    let cal = Calendar::new(Some(ONE_BOOKING));
    let output = cal
        .cmd()
        .args(["list", "--as", "member:5"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json[0]["contact"]["name"], "Ada");
}
