use serde::{Deserialize, Serialize};

use crate::entry::{Hours, ScheduleEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::grid::{CellValue, GridStore, cell_text};

pub const DAY_COL: u32 = 5; // E
pub const DISCIPLINE_COL: u32 = 6; // F
pub const GROUP_COL: u32 = 7; // G
pub const LOAD_TYPE_COL: u32 = 8; // H
pub const LECTURE_COL: u32 = 12;
pub const PRACTICE_COL: u32 = 13;
pub const LAB_COL: u32 = 14;

/// Every column that belongs to one monthly record, in record order.
const RECORD_COLUMNS: [u32; 7] = [
    DAY_COL,
    DISCIPLINE_COL,
    GROUP_COL,
    LOAD_TYPE_COL,
    LECTURE_COL,
    PRACTICE_COL,
    LAB_COL,
];

type RawRow = [Option<CellValue>; 7];

/// A monthly record as read back from the grid, with its physical row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub row: u32,
    pub day: u32,
    pub discipline: String,
    pub group: String,
    pub load_type: String,
    pub hours: Hours,
}

/// Day-sorted record block of a month sheet.
///
/// The block starts at `base_row` and ends at the first row whose day cell
/// is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyLedger {
    base_row: u32,
}

impl Default for MonthlyLedger {
    fn default() -> Self {
        Self { base_row: 7 }
    }
}

/// Integral day value of a day cell; `None` for text or negative numbers.
pub(crate) fn day_value(cell: Option<&CellValue>) -> Option<u32> {
    match cell {
        Some(CellValue::Number(n)) if n.is_finite() && *n >= 0.0 => Some(n.trunc() as u32),
        _ => None,
    }
}

/// Hour cell coerced to a number; blank or non-numeric text reads as `None`.
pub(crate) fn hours_value(cell: Option<&CellValue>) -> Option<f64> {
    match cell {
        Some(CellValue::Number(n)) => Some(*n),
        Some(CellValue::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    }
}

impl MonthlyLedger {
    pub fn new(base_row: u32) -> Self {
        Self { base_row }
    }

    pub fn base_row(&self) -> u32 {
        self.base_row
    }

    /// First row at or below the base row whose day cell is absent.
    pub fn end_row<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str) -> u32 {
        let mut row = self.base_row;
        while grid.get_cell(sheet, row, DAY_COL).is_some() {
            row += 1;
        }
        row
    }

    pub fn last_occupied_row<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str) -> Option<u32> {
        let end = self.end_row(grid, sheet);
        (end > self.base_row).then(|| end - 1)
    }

    pub fn read_all<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str) -> Vec<MonthlyRecord> {
        let mut records = Vec::new();
        let mut row = self.base_row;
        while let Some(day_cell) = grid.get_cell(sheet, row, DAY_COL) {
            if let Some(day) = day_value(Some(&day_cell)) {
                records.push(MonthlyRecord {
                    row,
                    day,
                    discipline: cell_text(grid.get_cell(sheet, row, DISCIPLINE_COL).as_ref()),
                    group: cell_text(grid.get_cell(sheet, row, GROUP_COL).as_ref()),
                    load_type: cell_text(grid.get_cell(sheet, row, LOAD_TYPE_COL).as_ref()),
                    hours: Hours {
                        lecture: hours_value(grid.get_cell(sheet, row, LECTURE_COL).as_ref()),
                        practice: hours_value(grid.get_cell(sheet, row, PRACTICE_COL).as_ref()),
                        lab: hours_value(grid.get_cell(sheet, row, LAB_COL).as_ref()),
                    },
                });
            }
            row += 1;
        }
        records
    }

    fn day_at<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, row: u32) -> Option<u32> {
        day_value(grid.get_cell(sheet, row, DAY_COL).as_ref())
    }

    pub fn has_day<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, day: u32) -> bool {
        self.last_row_of_day(grid, sheet, day).is_some()
    }

    /// Last physical row holding `day`.
    pub fn last_row_of_day<G: GridStore + ?Sized>(
        &self,
        grid: &G,
        sheet: &str,
        day: u32,
    ) -> Option<u32> {
        let end = self.end_row(grid, sheet);
        (self.base_row..end)
            .rev()
            .find(|&row| self.day_at(grid, sheet, row) == Some(day))
    }

    /// Row of an exact day match if present, else the first row with a later
    /// day, else one past the last occupied row.
    pub fn find_insert_row<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, day: u32) -> u32 {
        let end = self.end_row(grid, sheet);
        let rows = self.base_row..end;
        if let Some(row) = rows
            .clone()
            .find(|&row| self.day_at(grid, sheet, row) == Some(day))
        {
            return row;
        }
        rows.into_iter()
            .find(|&row| self.day_at(grid, sheet, row).is_some_and(|d| d > day))
            .unwrap_or(end)
    }

    /// Write `entry` at `row`, moving every occupied row from `row` down by one.
    pub fn insert<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        row: u32,
        entry: &ScheduleEntry,
    ) -> LedgerResult<u32> {
        let end = self.end_row(grid, sheet);
        if row < self.base_row || row > end {
            return Err(LedgerError::validation(format!(
                "row {row} is outside the ledger block {}..={end} of sheet '{sheet}'",
                self.base_row
            )));
        }

        let buffered: Vec<RawRow> = (row..end).map(|r| read_raw(grid, sheet, r)).collect();
        for r in row..end {
            clear_raw(grid, sheet, r);
        }
        write_entry(grid, sheet, row, entry);
        for (offset, raw) in buffered.into_iter().enumerate() {
            write_raw(grid, sheet, row + 1 + offset as u32, raw);
        }

        tracing::debug!(sheet, row, day = entry.day, "inserted monthly entry");
        Ok(row)
    }

    /// Insert right after the last row holding `day`. Returns `None` without
    /// writing when the day has no rows yet.
    pub fn append_same_day<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        day: u32,
        entry: &ScheduleEntry,
    ) -> LedgerResult<Option<u32>> {
        let Some(last) = self.last_row_of_day(grid, sheet, day) else {
            return Ok(None);
        };
        self.insert(grid, sheet, last + 1, entry).map(Some)
    }

    /// Remove the first record matching day, discipline and group, compacting
    /// the rows below it. Returns whether a record was removed.
    pub fn delete<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        day: u32,
        discipline: &str,
        group: &str,
    ) -> bool {
        let end = self.end_row(grid, sheet);
        let found = (self.base_row..end).find(|&row| {
            self.day_at(grid, sheet, row) == Some(day)
                && cell_text(grid.get_cell(sheet, row, DISCIPLINE_COL).as_ref()) == discipline
                && cell_text(grid.get_cell(sheet, row, GROUP_COL).as_ref()) == group
        });
        let Some(row) = found else {
            return false;
        };

        for r in row..end - 1 {
            let below = read_raw(grid, sheet, r + 1);
            write_raw(grid, sheet, r, below);
        }
        clear_raw(grid, sheet, end - 1);

        tracing::debug!(sheet, row, day, "deleted monthly entry");
        true
    }
}

fn read_raw<G: GridStore + ?Sized>(grid: &G, sheet: &str, row: u32) -> RawRow {
    RECORD_COLUMNS.map(|col| grid.get_cell(sheet, row, col))
}

fn write_raw<G: GridStore + ?Sized>(grid: &mut G, sheet: &str, row: u32, raw: RawRow) {
    for (col, value) in RECORD_COLUMNS.into_iter().zip(raw) {
        grid.set_cell(sheet, row, col, value);
    }
}

fn clear_raw<G: GridStore + ?Sized>(grid: &mut G, sheet: &str, row: u32) {
    for col in RECORD_COLUMNS {
        grid.set_cell(sheet, row, col, None);
    }
}

fn write_entry<G: GridStore + ?Sized>(grid: &mut G, sheet: &str, row: u32, entry: &ScheduleEntry) {
    let hour = |v: Option<f64>| v.filter(|h| *h != 0.0).map(CellValue::Number);
    let raw: RawRow = [
        Some(CellValue::from(entry.day)),
        Some(CellValue::text(entry.discipline.as_str())),
        Some(CellValue::text(entry.group.as_str())),
        Some(CellValue::text(entry.load_type.as_str())),
        hour(entry.hours.lecture),
        hour(entry.hours.practice),
        hour(entry.hours.lab),
    ];
    write_raw(grid, sheet, row, raw);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_cells_must_be_numeric() {
        assert_eq!(day_value(Some(&CellValue::Number(5.0))), Some(5));
        assert_eq!(day_value(Some(&CellValue::Number(5.7))), Some(5));
        assert_eq!(day_value(Some(&CellValue::text("5"))), None);
        assert_eq!(day_value(Some(&CellValue::Number(-1.0))), None);
        assert_eq!(day_value(None), None);
    }

    #[test]
    fn hour_cells_accept_numeric_text() {
        assert_eq!(hours_value(Some(&CellValue::text(" 2.5 "))), Some(2.5));
        assert_eq!(hours_value(Some(&CellValue::text(""))), None);
        assert_eq!(hours_value(Some(&CellValue::Number(4.0))), Some(4.0));
    }
}
