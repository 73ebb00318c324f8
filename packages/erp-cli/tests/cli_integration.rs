use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn erplab() -> Command {
    Command::cargo_bin("erplab").unwrap()
}

/// A temp directory with $ERP_SAMPLE_PATH pointed inside it, so the
/// sample recording is generated there instead of the user data dir.
fn sample_env() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample_audvis.edf");
    (dir, path)
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    erplab()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    erplab()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("erplab"));
}

#[test]
fn test_help_flag() {
    erplab()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preprocessing"));
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_nonexistent_file() {
    erplab()
        .arg("validate")
        .arg("--file")
        .arg("/nonexistent/file.edf")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_validate_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::write(&path, "a,b,c\n").unwrap();

    erplab()
        .arg("validate")
        .arg("--file")
        .arg(path.to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unsupported"));
}

#[test]
fn test_validate_malformed_edf() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.edf");
    std::fs::write(&path, "not an edf header").unwrap();

    erplab()
        .arg("validate")
        .arg("--file")
        .arg(path.to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Malformed"));
}

#[test]
fn test_validate_generated_sample() {
    let (_dir, path) = sample_env();
    erp_rs::dataset::generate_sample(&path).unwrap();

    erplab()
        .arg("validate")
        .arg("--file")
        .arg(path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_validate_json_output() {
    let (_dir, path) = sample_env();
    erp_rs::dataset::generate_sample(&path).unwrap();

    let output = erplab()
        .arg("validate")
        .arg("--file")
        .arg(path.to_str().unwrap())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.get("exists").unwrap().as_bool().unwrap(), true);
    assert_eq!(parsed.get("well_formed").unwrap().as_bool().unwrap(), true);
    assert_eq!(parsed.get("num_signals").unwrap().as_u64().unwrap(), 11);
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_sample() {
    let (_dir, path) = sample_env();

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("STI 014"))
        .stdout(predicate::str::contains("256"));
}

#[test]
fn test_info_json() {
    let (_dir, path) = sample_env();

    let output = erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("info")
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.get("sample_rate").unwrap().as_f64().unwrap(), 256.0);
    let channels = parsed.get("channels").unwrap().as_array().unwrap();
    assert_eq!(channels.len(), 11);
}

// =============================================================================
// EVENTS SUBCOMMAND
// =============================================================================

#[test]
fn test_events_sample() {
    let (_dir, path) = sample_env();

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("events")
        .assert()
        .success()
        .stdout(predicate::str::contains("code"));
}

#[test]
fn test_events_json_codes() {
    let (_dir, path) = sample_env();

    let output = erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("events")
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let events = parsed.get("events").unwrap().as_array().unwrap();
    assert!(!events.is_empty());
    for ev in events {
        let code = ev.get("code").unwrap().as_i64().unwrap();
        assert!((1..=4).contains(&code));
    }
}

#[test]
fn test_events_missing_stim_channel() {
    let (_dir, path) = sample_env();

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("events")
        .arg("--stim-channel")
        .arg("STI 999")
        .assert()
        .failure()
        .code(2);
}

// =============================================================================
// DEMO SUBCOMMAND
// =============================================================================

#[test]
fn test_demo_end_to_end() {
    let (_dir, path) = sample_env();
    let plot = path.with_file_name("evoked.png");
    let json = path.with_file_name("evoked.json");

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("demo")
        .arg("--plot")
        .arg(plot.to_str().unwrap())
        .arg("--output")
        .arg(json.to_str().unwrap())
        .arg("--quiet")
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("Loading sample EEG dataset..."))
        .stdout(predicate::str::contains(
            "EEG preprocessing demo finished successfully!",
        ));

    assert!(plot.exists());

    let evoked: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(
        evoked.get("label").unwrap().as_str().unwrap(),
        "auditory/left"
    );
    assert!(evoked.get("n_epochs").unwrap().as_u64().unwrap() > 0);
}

#[test]
fn test_demo_hierarchical_label() {
    let (_dir, path) = sample_env();
    let plot = path.with_file_name("evoked_aud.png");

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("demo")
        .arg("--label")
        .arg("auditory")
        .arg("--plot")
        .arg(plot.to_str().unwrap())
        .arg("--quiet")
        .assert()
        .success();

    assert!(plot.exists());
}

#[test]
fn test_demo_rejects_bad_band() {
    erplab()
        .arg("demo")
        .arg("--low")
        .arg("40")
        .arg("--high")
        .arg("1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cutoff"));
}

#[test]
fn test_demo_rejects_bad_window() {
    erplab()
        .arg("demo")
        .arg("--tmin")
        .arg("0.5")
        .arg("--tmax")
        .arg("-0.2")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_demo_unknown_label_fails() {
    let (_dir, path) = sample_env();
    let plot = path.with_file_name("never.png");

    erplab()
        .env("ERP_SAMPLE_PATH", path.to_str().unwrap())
        .arg("demo")
        .arg("--label")
        .arg("somatosensory")
        .arg("--plot")
        .arg(plot.to_str().unwrap())
        .arg("--quiet")
        .assert()
        .failure()
        .code(2);
}
