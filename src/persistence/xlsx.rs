use super::{PersistenceError, PersistenceResult, WorkbookStore};
use crate::grid::{CellValue, Sheet, Workbook};
use calamine::{Data, Reader, Xlsx, open_workbook};
use std::path::{Path, PathBuf};

/// Workbook kept in an .xlsx file. Only cell values survive a save; formatting,
/// formulas and merged ranges are not carried over.
#[derive(Debug, Clone)]
pub struct XlsxWorkbookStore {
    path: PathBuf,
}

impl XlsxWorkbookStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WorkbookStore for XlsxWorkbookStore {
    fn load(&self) -> PersistenceResult<Workbook> {
        let mut book: Xlsx<_> = open_workbook(&self.path).map_err(|e| classify(e, &self.path))?;
        let mut workbook = Workbook::new();
        for name in book.sheet_names() {
            let range = book
                .worksheet_range(&name)
                .map_err(|e| classify(e, &self.path))?;
            let mut sheet = Sheet::new(name);
            let (top, left) = range.start().unwrap_or((0, 0));
            for (r, c, data) in range.used_cells() {
                let (Ok(r), Ok(c)) = (u32::try_from(r), u32::try_from(c)) else {
                    continue;
                };
                // calamine coordinates are 0-based
                sheet.set(top + r + 1, left + c + 1, cell_value(data));
            }
            workbook.push_sheet(sheet);
        }
        tracing::debug!(path = %self.path.display(), sheets = workbook.sheets().len(), "loaded xlsx workbook");
        Ok(workbook)
    }

    fn save(&self, workbook: &Workbook) -> PersistenceResult<()> {
        export_workbook_xlsx(workbook, &self.path)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::text(if *b { "TRUE" } else { "FALSE" })),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

fn classify(err: calamine::XlsxError, path: &Path) -> PersistenceError {
    match err {
        calamine::XlsxError::Io(io) => PersistenceError::from_io(io, path),
        other => PersistenceError::Corrupt(format!("{}: {other}", path.display())),
    }
}

/// Write every sheet of `workbook` to an .xlsx file, cell for cell.
pub fn export_workbook_xlsx<P: AsRef<Path>>(workbook: &Workbook, path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let mut book = rust_xlsxwriter::Workbook::new();
    for sheet in workbook.sheets() {
        let worksheet = book.add_worksheet();
        worksheet.set_name(sheet.name())?;
        for (row, col, value) in sheet.cells() {
            // xlsx coordinates are 0-based
            let out_of_range = || {
                PersistenceError::Corrupt(format!(
                    "sheet '{}' cell at row {row} col {col} does not fit in an xlsx worksheet",
                    sheet.name()
                ))
            };
            let xrow = row.checked_sub(1).ok_or_else(out_of_range)?;
            let xcol = col
                .checked_sub(1)
                .and_then(|c| u16::try_from(c).ok())
                .ok_or_else(out_of_range)?;
            match value {
                CellValue::Number(n) => {
                    worksheet.write_number(xrow, xcol, *n)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(xrow, xcol, s)?;
                }
            }
        }
    }
    book.save(path).map_err(|e| match e {
        rust_xlsxwriter::XlsxError::IoError(io) => PersistenceError::from_io(io, path),
        other => PersistenceError::Xlsx(other),
    })?;
    tracing::info!(path = %path.display(), "exported workbook to xlsx");
    Ok(())
}
