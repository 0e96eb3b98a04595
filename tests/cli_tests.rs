use std::fs;

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::tempdir;
use workload_journal::persistence::load_workbook_from_json;
use workload_journal::{LedgerCoordinator, MonthlyLedger};

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("journal").expect("journal binary");
    cmd.env_remove("JOURNAL_CONFIG");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_reports_week_type() {
    run_cli("week 2024-09-08\nweek 2024-09-15\nquit\n")
        .success()
        .stdout(str_contains("2024-09-08: lower (знаменатель)"))
        .stdout(str_contains("2024-09-15: upper (числитель)"));
}

#[test]
fn cli_rejects_unknown_command() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}

#[test]
fn cli_add_requires_an_open_workbook() {
    run_cli("add Algebra 101 осн. 2 0 0\nquit\n")
        .success()
        .stdout(str_contains("No workbook open"));
}

#[test]
fn cli_records_entries_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let p = path.to_string_lossy();
    let script = format!(
        "new {p}\nperiod 2024-09-01 2024-09-30 upper\nadd Algebra 101 осн. 2 0 0\nshow 09\ntotals осень\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Selected 3 dates."), "{output}");
    assert!(output.contains("Entries added:"), "{output}");
    assert!(output.contains("09: 1.09 (row 7), 15.09 (row 8), 29.09 (row 9)"), "{output}");
    assert!(output.contains("осень: created row 5"), "{output}");
    assert!(output.contains("Algebra"), "{output}");

    let wb = load_workbook_from_json(&path).unwrap();
    let days: Vec<u32> = MonthlyLedger::default()
        .read_all(&wb, "09")
        .iter()
        .map(|r| r.day)
        .collect();
    assert_eq!(days, vec![1, 15, 29]);
    let totals = LedgerCoordinator::default().season().read_all(&wb, "осень").unwrap();
    assert_eq!(totals[0].totals.lecture, Some(2.0));
}

#[test]
fn cli_zero_hours_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let p = path.to_string_lossy();
    let script = format!("new {p}\ndate 2024-09-02\nadd Algebra 101 осн. 0 0 0\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains("Error: validation error: empty entry"));

    let wb = load_workbook_from_json(&path).unwrap();
    assert!(MonthlyLedger::default().read_all(&wb, "09").is_empty());
}

#[test]
fn cli_delete_and_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let csv_path = dir.path().join("09.csv");
    let p = path.to_string_lossy();
    let c = csv_path.to_string_lossy();
    let script = format!(
        "new {p}\ndate 2024-09-02\ndate 2024-09-09\nadd \"Linear algebra\" 101 basic 0 2 0\ndelete 09 2 \"Linear algebra\" 101\nexport csv 09 {c}\ndisciplines\nquit\n"
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Removed 1 of 1 entries"))
        .stdout(str_contains("Exported 1 rows"))
        .stdout(str_contains("  Linear algebra"));

    let text = fs::read_to_string(&csv_path).unwrap();
    assert!(text.contains("9,Linear algebra,101,осн.,,2,"), "{text}");
}

#[test]
fn cli_dates_can_be_listed_and_removed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let p = path.to_string_lossy();
    let script = format!(
        "new {p}\ndate 2024-09-15\ndate 2024-09-08\ndate 2024-09-08\nundate 1\ndates\nquit\n"
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("is already selected"))
        .stdout(str_contains("Removed 2024-09-08"))
        .stdout(str_contains("Dates: 1 | 15.09 | Sheets: 09: 1 | Types: upper"));
}

#[test]
#[allow(deprecated)]
fn cli_reads_season_names_from_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("journal.toml");
    fs::write(&config, "[seasons]\nautumn_sheet = \"Осень24\"\n").unwrap();
    let path = dir.path().join("journal.json");
    let script = format!("new {}\nsheets\nquit\n", path.to_string_lossy());

    let mut cmd = Command::cargo_bin("journal").expect("journal binary");
    cmd.env("JOURNAL_CONFIG", &config)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(str_contains("Season: Осень24, весна"));
}

#[test]
#[cfg(feature = "sqlite")]
fn cli_open_missing_database_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.db");
    let script = format!("open {}\nquit\n", path.to_string_lossy());

    run_cli(&script)
        .success()
        .stdout(str_contains("Error: workbook not found"));
    assert!(!path.exists());
}

#[test]
#[cfg(feature = "xlsx")]
fn cli_keeps_an_xlsx_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.xlsx");
    let p = path.to_string_lossy();
    let script = format!(
        "new {p}\ndate 2024-09-02\nadd Algebra 101 осн. 2 0 0\nopen {p}\nshow 09\nquit\n"
    );

    run_cli(&script)
        .success()
        .stdout(str_contains(format!("Opened {p}")))
        .stdout(str_contains("Algebra"));
    assert!(path.exists());
}
