use super::{PersistenceError, PersistenceResult, WorkbookStore};
use crate::grid::{CellValue, Sheet, Workbook};
use crate::monthly::MonthlyRecord;
use crate::season::AggregateEntry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
struct CellSnapshot {
    row: u32,
    col: u32,
    value: CellValue,
}

#[derive(Serialize, Deserialize)]
struct SheetSnapshot {
    name: String,
    cells: Vec<CellSnapshot>,
}

#[derive(Serialize, Deserialize)]
struct WorkbookSnapshot {
    sheets: Vec<SheetSnapshot>,
}

impl WorkbookSnapshot {
    fn from_workbook(workbook: &Workbook) -> Self {
        let sheets = workbook
            .sheets()
            .iter()
            .map(|sheet| SheetSnapshot {
                name: sheet.name().to_string(),
                cells: sheet
                    .cells()
                    .map(|(row, col, value)| CellSnapshot {
                        row,
                        col,
                        value: value.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { sheets }
    }

    fn into_workbook(self) -> PersistenceResult<Workbook> {
        let mut workbook = Workbook::new();
        for snapshot in self.sheets {
            let mut sheet = Sheet::new(snapshot.name.clone());
            for cell in snapshot.cells {
                if cell.row == 0 || cell.col == 0 {
                    return Err(PersistenceError::Corrupt(format!(
                        "sheet '{}' has a cell at row {} col {} (coordinates are 1-based)",
                        snapshot.name, cell.row, cell.col
                    )));
                }
                sheet.set(cell.row, cell.col, Some(cell.value));
            }
            if !workbook.push_sheet(sheet) {
                return Err(PersistenceError::Corrupt(format!(
                    "duplicate sheet '{}'",
                    snapshot.name
                )));
            }
        }
        Ok(workbook)
    }
}

pub fn save_workbook_to_json<P: AsRef<Path>>(workbook: &Workbook, path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let snapshot = WorkbookSnapshot::from_workbook(workbook);
    let file = File::create(path).map_err(|e| PersistenceError::from_io(e, path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush().map_err(|e| PersistenceError::from_io(e, path))?;
    Ok(())
}

pub fn load_workbook_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Workbook> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PersistenceError::from_io(e, path))?;
    let snapshot: WorkbookSnapshot = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PersistenceError::Corrupt(format!("{}: {e}", path.display())))?;
    snapshot.into_workbook()
}

/// Workbook kept as a pretty-printed JSON snapshot on disk.
#[derive(Debug, Clone)]
pub struct JsonWorkbookStore {
    path: PathBuf,
}

impl JsonWorkbookStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl WorkbookStore for JsonWorkbookStore {
    fn load(&self) -> PersistenceResult<Workbook> {
        load_workbook_from_json(&self.path)
    }

    fn save(&self, workbook: &Workbook) -> PersistenceResult<()> {
        save_workbook_to_json(workbook, &self.path)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct MonthlyCsvRecord<'a> {
    day: u32,
    discipline: &'a str,
    group: &'a str,
    load_type: &'a str,
    lecture: String,
    practice: String,
    lab: String,
}

impl<'a> From<&'a MonthlyRecord> for MonthlyCsvRecord<'a> {
    fn from(record: &'a MonthlyRecord) -> Self {
        Self {
            day: record.day,
            discipline: &record.discipline,
            group: &record.group,
            load_type: &record.load_type,
            lecture: format_option_f64(record.hours.lecture),
            practice: format_option_f64(record.hours.practice),
            lab: format_option_f64(record.hours.lab),
        }
    }
}

#[derive(Serialize)]
struct SeasonCsvRecord<'a> {
    discipline: &'a str,
    group: &'a str,
    load_type: &'a str,
    lecture: String,
    practice: String,
    lab: String,
}

impl<'a> From<&'a AggregateEntry> for SeasonCsvRecord<'a> {
    fn from(entry: &'a AggregateEntry) -> Self {
        Self {
            discipline: &entry.key.discipline,
            group: &entry.key.group,
            load_type: &entry.key.load_type,
            lecture: format_option_f64(entry.totals.lecture),
            practice: format_option_f64(entry.totals.practice),
            lab: format_option_f64(entry.totals.lab),
        }
    }
}

pub fn save_monthly_csv<P: AsRef<Path>>(records: &[MonthlyRecord], path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PersistenceError::from_io(e, path))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(MonthlyCsvRecord::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_season_csv<P: AsRef<Path>>(entries: &[AggregateEntry], path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PersistenceError::from_io(e, path))?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in entries {
        writer.serialize(SeasonCsvRecord::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_option_f64(value: Option<f64>) -> String {
    value
        .filter(|v| *v != 0.0)
        .map(crate::grid::format_number)
        .unwrap_or_default()
}
