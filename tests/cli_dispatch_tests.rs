use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_furysim")
}

fn unique_temp_path(name: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("furysim-{name}-{stamp}.{ext}"))
}

fn write_character_sheet(name: &str) -> PathBuf {
    let path = unique_temp_path(name, "json");
    fs::write(
        &path,
        r#"{
            "faction": "horde",
            "race": "orc",
            "class": "warrior",
            "spec": "fury",
            "items": [
                {
                    "name": "Test Axe",
                    "slot": "main_hand",
                    "stats": {
                        "weapon_min_damage": 120.0,
                        "weapon_max_damage": 180.0,
                        "weapon_speed": 2.5,
                        "ap": 700.0,
                        "crit": 10.0,
                        "offhand_min_damage": 80.0,
                        "offhand_max_damage": 120.0,
                        "offhand_speed": 1.8
                    }
                },
                {
                    "name": "Test Trinket",
                    "slot": "trinket",
                    "stats": {},
                    "procs": ["hand_of_justice"]
                }
            ]
        }"#,
    )
    .expect("sheet should write");
    path
}

fn write_encounter(name: &str) -> PathBuf {
    let path = unique_temp_path(name, "json");
    fs::write(
        &path,
        r#"{
            "config": { "n_runs": 5, "seed": 99, "fight_duration_seconds_mu": 30.0 },
            "boss": {}
        }"#,
    )
    .expect("encounter should write");
    path
}

#[test]
fn simulate_command_dispatches_and_emits_json() {
    let sheet = write_character_sheet("simulate-sheet");
    let encounter = write_encounter("simulate-encounter");

    let output = Command::new(bin())
        .args(["simulate", sheet.to_str().unwrap(), encounter.to_str().unwrap(), "--json"])
        .output()
        .expect("simulate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    assert_eq!(payload["seed"].as_u64(), Some(99));
    assert!(payload["result"]["dps"].as_f64().is_some_and(|dps| dps > 0.0));
    assert!(payload["result"]["statistics"].is_object());

    let _ = fs::remove_file(sheet);
    let _ = fs::remove_file(encounter);
}

#[test]
fn simulate_runs_are_reproducible_across_invocations() {
    let sheet = write_character_sheet("repro-sheet");
    let encounter = write_encounter("repro-encounter");
    let run = || {
        Command::new(bin())
            .args(["simulate", sheet.to_str().unwrap(), encounter.to_str().unwrap(), "--json"])
            .output()
            .expect("simulate should run")
    };

    let first = run();
    let second = run();
    assert_eq!(first.status.code(), Some(0));
    assert_eq!(first.stdout, second.stdout);

    let _ = fs::remove_file(sheet);
    let _ = fs::remove_file(encounter);
}

#[test]
fn validate_command_accepts_a_well_formed_sheet() {
    let sheet = write_character_sheet("validate-sheet");

    let output = Command::new(bin())
        .args(["validate", sheet.to_str().unwrap()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));

    let _ = fs::remove_file(sheet);
}

#[test]
fn validate_command_rejects_unknown_proc_tags() {
    let path = unique_temp_path("validate-bad", "json");
    fs::write(
        &path,
        r#"{
            "faction": "horde",
            "race": "orc",
            "class": "warrior",
            "spec": "fury",
            "items": [
                { "name": "Cursed Band", "slot": "finger", "procs": ["not_a_real_proc"] }
            ]
        }"#,
    )
    .expect("sheet should write");

    let output = Command::new(bin())
        .args(["validate", path.to_str().unwrap()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not_a_real_proc"));

    let _ = fs::remove_file(path);
}

#[test]
fn export_command_writes_a_csv_with_header() {
    let sheet = write_character_sheet("export-sheet");
    let encounter = write_encounter("export-encounter");
    let csv_path = unique_temp_path("export-out", "csv");

    let output = Command::new(bin())
        .args([
            "export",
            sheet.to_str().unwrap(),
            csv_path.to_str().unwrap(),
            encounter.to_str().unwrap(),
        ])
        .output()
        .expect("export should run");

    assert_eq!(output.status.code(), Some(0));
    let csv = fs::read_to_string(&csv_path).expect("csv should exist");
    let header = csv.lines().next().expect("csv has a header");
    assert!(header.starts_with("ability,total_damage"));
    assert!(csv.lines().count() > 1, "csv has data rows");

    let _ = fs::remove_file(sheet);
    let _ = fs::remove_file(encounter);
    let _ = fs::remove_file(csv_path);
}

#[test]
fn unknown_command_prints_usage_and_fails() {
    let output = Command::new(bin())
        .args(["engage"])
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: furysim"));
}

#[test]
fn missing_character_path_is_a_usage_error() {
    let output = Command::new(bin())
        .args(["simulate"])
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
}
