#![cfg(feature = "xlsx")]

use std::fs;

use tempfile::tempdir;
use workload_journal::{
    CellValue, GridStore, PersistenceError, Workbook, WorkbookStore, XlsxWorkbookStore,
    export_workbook_xlsx,
};

fn sample_workbook() -> Workbook {
    let mut wb = Workbook::academic_year("осень", "весна");
    wb.set_cell("09", 1, 1, Some(CellValue::text("Журнал учёта")));
    wb.set_cell("09", 7, 5, Some(CellValue::Number(3.0)));
    wb.set_cell("09", 7, 6, Some(CellValue::text("Algebra")));
    wb.set_cell("09", 7, 12, Some(CellValue::Number(1.5)));
    wb.set_cell("осень", 5, 4, Some(CellValue::text("Algebra")));
    wb.set_cell("осень", 5, 5, Some(CellValue::Number(101.0)));
    wb
}

#[test]
fn export_writes_a_non_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.xlsx");

    export_workbook_xlsx(&sample_workbook(), &path).unwrap();

    assert!(path.exists());
    assert!(fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn cells_outside_the_grid_are_rejected() {
    let dir = tempdir().unwrap();
    for (row, col) in [(0, 3), (3, 0)] {
        let mut wb = Workbook::new();
        wb.add_sheet("09");
        wb.set_cell("09", row, col, Some(CellValue::Number(1.0)));

        let err = export_workbook_xlsx(&wb, dir.path().join("bad.xlsx")).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)), "{err}");
    }
}

#[test]
fn xlsx_store_round_trip_workbook() {
    let dir = tempdir().unwrap();
    let store = XlsxWorkbookStore::new(dir.path().join("journal.xlsx"));
    let wb = sample_workbook();

    store.save(&wb).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.sheet_names(), wb.sheet_names());
    assert_eq!(loaded.get_cell("09", 1, 1), Some(CellValue::text("Журнал учёта")));
    assert_eq!(loaded.get_cell("09", 7, 5), Some(CellValue::Number(3.0)));
    assert_eq!(loaded.get_cell("09", 7, 12), Some(CellValue::Number(1.5)));
    assert_eq!(loaded.get_cell("09", 8, 5), None);
    assert_eq!(loaded.get_cell("осень", 5, 5), Some(CellValue::Number(101.0)));
    assert_eq!(loaded.sheet("10").map(|s| s.cell_count()), Some(0));
    assert_eq!(loaded, wb);
}

#[test]
fn missing_xlsx_file_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.xlsx");
    let store = XlsxWorkbookStore::new(&path);

    assert!(matches!(store.load(), Err(PersistenceError::NotFound(p)) if p == path));
    assert_eq!(store.location(), path.as_path());
}

#[test]
fn non_xlsx_content_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal.xlsx");
    fs::write(&path, "not a zip archive").unwrap();

    let err = XlsxWorkbookStore::new(&path).load().unwrap_err();
    assert!(matches!(err, PersistenceError::Corrupt(_)), "{err}");
}
