use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;
use workload_journal::persistence::{
    load_workbook_from_json, save_monthly_csv, save_season_csv, save_workbook_to_json,
};
use workload_journal::{
    CellValue, GridStore, Hours, IdentityKey, JsonWorkbookStore, LoadType, MonthlyLedger,
    PersistenceError, RetryPolicy, ScheduleEntry, SeasonLedger, Workbook, WorkbookStore,
    with_retry,
};

fn sample_workbook() -> Workbook {
    let mut wb = Workbook::academic_year("осень", "весна");
    let monthly = MonthlyLedger::default();
    let e = ScheduleEntry::new(5, "Algebra", "101", LoadType::Basic, Hours::new(2.0, 0.0, 1.5));
    let row = monthly.find_insert_row(&wb, "09", 5);
    monthly.insert(&mut wb, "09", row, &e).unwrap();
    SeasonLedger::default()
        .merge_add(&mut wb, "осень", &e.identity(), &e.hours)
        .unwrap();
    wb.set_cell("09", 1, 1, Some(CellValue::text("Журнал учёта")));
    wb
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        backoff: Duration::ZERO,
    }
}

#[test]
fn json_round_trip_preserves_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.json");
    let wb = sample_workbook();

    save_workbook_to_json(&wb, &path).unwrap();
    let loaded = load_workbook_from_json(&path).unwrap();
    assert_eq!(loaded, wb);
    assert_eq!(loaded.sheet_names(), wb.sheet_names());
}

#[test]
fn json_store_implements_workbook_store() {
    let dir = tempdir().unwrap();
    let store = JsonWorkbookStore::new(dir.path().join("journal.json"));
    let wb = sample_workbook();

    store.save(&wb).unwrap();
    assert_eq!(store.load().unwrap(), wb);
    assert!(store.location().ends_with("journal.json"));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match load_workbook_from_json(&path) {
        Err(PersistenceError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn malformed_file_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        load_workbook_from_json(&path),
        Err(PersistenceError::Corrupt(_))
    ));

    fs::write(
        &path,
        r#"{"sheets":[{"name":"09","cells":[{"row":0,"col":5,"value":3}]}]}"#,
    )
    .unwrap();
    assert!(matches!(
        load_workbook_from_json(&path),
        Err(PersistenceError::Corrupt(_))
    ));

    fs::write(
        &path,
        r#"{"sheets":[{"name":"09","cells":[]},{"name":"09","cells":[]}]}"#,
    )
    .unwrap();
    assert!(matches!(
        load_workbook_from_json(&path),
        Err(PersistenceError::Corrupt(_))
    ));
}

#[test]
fn snapshot_cells_keep_their_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("typed.json");
    fs::write(
        &path,
        r#"{"sheets":[{"name":"09","cells":[
            {"row":7,"col":5,"value":3},
            {"row":7,"col":7,"value":"101"}
        ]}]}"#,
    )
    .unwrap();

    let wb = load_workbook_from_json(&path).unwrap();
    assert_eq!(wb.get_cell("09", 7, 5), Some(CellValue::Number(3.0)));
    assert_eq!(wb.get_cell("09", 7, 7), Some(CellValue::text("101")));
}

#[test]
fn retry_repeats_access_denied_only() {
    let calls = Cell::new(0);
    let result: Result<(), _> = with_retry(fast_retry(), || {
        calls.set(calls.get() + 1);
        Err(PersistenceError::AccessDenied(PathBuf::from("journal.json")))
    });
    assert!(matches!(result, Err(PersistenceError::AccessDenied(_))));
    assert_eq!(calls.get(), 3);

    calls.set(0);
    let result: Result<(), _> = with_retry(fast_retry(), || {
        calls.set(calls.get() + 1);
        Err(PersistenceError::NotFound(PathBuf::from("journal.json")))
    });
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    assert_eq!(calls.get(), 1);
}

#[test]
fn retry_returns_first_success() {
    let calls = Cell::new(0);
    let value = with_retry(fast_retry(), || {
        calls.set(calls.get() + 1);
        if calls.get() < 2 {
            Err(PersistenceError::AccessDenied(PathBuf::from("journal.json")))
        } else {
            Ok(42)
        }
    })
    .unwrap();
    assert_eq!(value, 42);
    assert_eq!(calls.get(), 2);
}

#[test]
fn default_retry_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.attempts, 3);
    assert_eq!(policy.backoff, Duration::from_millis(500));
    assert!(PersistenceError::AccessDenied(PathBuf::new()).is_retryable());
    assert!(!PersistenceError::Corrupt("x".into()).is_retryable());
}

#[test]
fn csv_exports_monthly_and_season_sheets() {
    let dir = tempdir().unwrap();
    let wb = sample_workbook();

    let monthly_path = dir.path().join("09.csv");
    let records = MonthlyLedger::default().read_all(&wb, "09");
    save_monthly_csv(&records, &monthly_path).unwrap();
    let text = fs::read_to_string(&monthly_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "day,discipline,group,load_type,lecture,practice,lab");
    assert_eq!(lines[1], "5,Algebra,101,осн.,2,,1.5");

    let season_path = dir.path().join("autumn.csv");
    let entries = SeasonLedger::default().read_all(&wb, "осень").unwrap();
    save_season_csv(&entries, &season_path).unwrap();
    let text = fs::read_to_string(&season_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "discipline,group,load_type,lecture,practice,lab");
    assert_eq!(lines[1], "Algebra,101,осн.,2,,1.5");
    assert_eq!(entries[0].key, IdentityKey::new("Algebra", "101", "осн."));
}
