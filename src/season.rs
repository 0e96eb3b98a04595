use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::entry::{Hours, IdentityKey};
use crate::error::{LedgerError, LedgerResult};
use crate::grid::{CellValue, GridStore, cell_text, is_empty_cell};

pub const DISCIPLINE_COL: u32 = 4; // D
pub const GROUP_COL: u32 = 5; // E
pub const LOAD_TYPE_COL: u32 = 6; // F
pub const LECTURE_COL: u32 = 7; // G
pub const PRACTICE_COL: u32 = 8; // H
pub const LAB_COL: u32 = 9; // I

const IDENTITY_COLUMNS: [u32; 3] = [DISCIPLINE_COL, GROUP_COL, LOAD_TYPE_COL];
const TOTAL_COLUMNS: [u32; 3] = [LECTURE_COL, PRACTICE_COL, LAB_COL];
const RECORD_COLUMNS: [u32; 6] = [
    DISCIPLINE_COL,
    GROUP_COL,
    LOAD_TYPE_COL,
    LECTURE_COL,
    PRACTICE_COL,
    LAB_COL,
];

/// Academic half-year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Autumn,
    Spring,
}

impl Season {
    /// September–December is autumn, January–May is spring; summer months
    /// belong to neither.
    pub fn for_month(month: u32) -> Option<Self> {
        match month {
            9..=12 => Some(Season::Autumn),
            1..=5 => Some(Season::Spring),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Autumn => f.write_str("autumn"),
            Season::Spring => f.write_str("spring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub row: u32,
    pub key: IdentityKey,
    pub totals: Hours,
}

/// Outcome of a `merge_add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonWrite {
    pub sheet: String,
    pub row: u32,
    /// True when an existing row was topped up, false when a row was created.
    pub merged: bool,
    pub totals: Hours,
}

/// Keyed aggregate block of a season sheet, bounded to `capacity` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonLedger {
    base_row: u32,
    capacity: u32,
}

impl Default for SeasonLedger {
    fn default() -> Self {
        Self {
            base_row: 5,
            capacity: 50,
        }
    }
}

impl SeasonLedger {
    pub fn new(base_row: u32, capacity: u32) -> Self {
        Self { base_row, capacity }
    }

    pub fn base_row(&self) -> u32 {
        self.base_row
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn rows(&self) -> std::ops::Range<u32> {
        self.base_row..self.base_row + self.capacity
    }

    fn last_row(&self) -> u32 {
        self.base_row + self.capacity - 1
    }

    fn matches<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, row: u32, key: &IdentityKey) -> bool {
        cell_text(grid.get_cell(sheet, row, DISCIPLINE_COL).as_ref()) == key.discipline
            && cell_text(grid.get_cell(sheet, row, GROUP_COL).as_ref()) == key.group
            && cell_text(grid.get_cell(sheet, row, LOAD_TYPE_COL).as_ref()) == key.load_type
    }

    fn is_free<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, row: u32) -> bool {
        IDENTITY_COLUMNS
            .iter()
            .all(|&col| is_empty_cell(grid.get_cell(sheet, row, col).as_ref()))
    }

    pub fn find_identity_row<G: GridStore + ?Sized>(
        &self,
        grid: &G,
        sheet: &str,
        key: &IdentityKey,
    ) -> Option<u32> {
        self.rows().find(|&row| self.matches(grid, sheet, row, key))
    }

    /// First row in the bound whose identity cells are all empty.
    pub fn find_free_row<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str) -> LedgerResult<u32> {
        self.rows()
            .find(|&row| self.is_free(grid, sheet, row))
            .ok_or_else(|| {
                tracing::warn!(sheet, capacity = self.capacity, "season sheet is full");
                LedgerError::Capacity {
                    sheet: sheet.to_string(),
                    capacity: self.capacity,
                }
            })
    }

    /// Rows from the base row up to the first free row.
    pub fn read_all<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str) -> LedgerResult<Vec<AggregateEntry>> {
        let mut entries = Vec::new();
        for row in self.rows() {
            if self.is_free(grid, sheet, row) {
                break;
            }
            let [lecture, practice, lab] = self.stored_totals(grid, sheet, row)?;
            entries.push(AggregateEntry {
                row,
                key: IdentityKey::new(
                    cell_text(grid.get_cell(sheet, row, DISCIPLINE_COL).as_ref()),
                    cell_text(grid.get_cell(sheet, row, GROUP_COL).as_ref()),
                    cell_text(grid.get_cell(sheet, row, LOAD_TYPE_COL).as_ref()),
                ),
                totals: Hours::from_channels([lecture, practice, lab]),
            });
        }
        Ok(entries)
    }

    fn stored_totals<G: GridStore + ?Sized>(&self, grid: &G, sheet: &str, row: u32) -> LedgerResult<[f64; 3]> {
        let mut totals = [0.0; 3];
        for (slot, col) in totals.iter_mut().zip(TOTAL_COLUMNS) {
            *slot = match grid.get_cell(sheet, row, col) {
                None => 0.0,
                Some(CellValue::Number(n)) => n,
                Some(CellValue::Text(s)) if s.trim().is_empty() => 0.0,
                Some(CellValue::Text(s)) => s.trim().parse::<f64>().map_err(|_| {
                    LedgerError::validation(format!(
                        "sheet '{sheet}' row {row} column {col} holds non-numeric total '{s}'"
                    ))
                })?,
            };
        }
        Ok(totals)
    }

    fn write_totals<G: GridStore + ?Sized>(&self, grid: &mut G, sheet: &str, row: u32, totals: [f64; 3]) {
        for (value, col) in totals.into_iter().zip(TOTAL_COLUMNS) {
            let cell = (value != 0.0).then_some(CellValue::Number(value));
            grid.set_cell(sheet, row, col, cell);
        }
    }

    /// Add `hours` to the row keyed by `key`, creating it in the first free
    /// row if absent. Totals that come out as zero are left empty.
    pub fn merge_add<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        key: &IdentityKey,
        hours: &Hours,
    ) -> LedgerResult<SeasonWrite> {
        let incoming = hours.channels();

        if let Some(row) = self.find_identity_row(grid, sheet, key) {
            let stored = self.stored_totals(grid, sheet, row)?;
            let totals = [
                stored[0] + incoming[0],
                stored[1] + incoming[1],
                stored[2] + incoming[2],
            ];
            self.write_totals(grid, sheet, row, totals);
            tracing::debug!(sheet, row, %key, "merged season totals");
            return Ok(SeasonWrite {
                sheet: sheet.to_string(),
                row,
                merged: true,
                totals: Hours::from_channels(totals),
            });
        }

        let row = self.find_free_row(grid, sheet)?;
        grid.set_cell(sheet, row, DISCIPLINE_COL, Some(CellValue::text(key.discipline.as_str())));
        grid.set_cell(sheet, row, GROUP_COL, Some(CellValue::text(key.group.as_str())));
        grid.set_cell(sheet, row, LOAD_TYPE_COL, Some(CellValue::text(key.load_type.as_str())));
        self.write_totals(grid, sheet, row, incoming);
        tracing::debug!(sheet, row, %key, "created season row");
        Ok(SeasonWrite {
            sheet: sheet.to_string(),
            row,
            merged: false,
            totals: Hours::from_channels(incoming),
        })
    }

    /// Remove the row keyed by `key` and shift the rest of the bound up.
    pub fn delete_by_identity<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        key: &IdentityKey,
    ) -> bool {
        let Some(row) = self.find_identity_row(grid, sheet, key) else {
            return false;
        };
        let last = self.last_row();
        for r in row..last {
            for col in RECORD_COLUMNS {
                let below = grid.get_cell(sheet, r + 1, col);
                grid.set_cell(sheet, r, col, below);
            }
        }
        for col in RECORD_COLUMNS {
            grid.set_cell(sheet, last, col, None);
        }
        tracing::debug!(sheet, row, %key, "deleted season row");
        true
    }

    /// Sorted distinct disciplines over the whole bound of every given sheet.
    pub fn disciplines<G: GridStore + ?Sized>(&self, grid: &G, sheets: &[String]) -> Vec<String> {
        let mut found = BTreeSet::new();
        for sheet in sheets {
            for row in self.rows() {
                if let Some(CellValue::Text(s)) = grid.get_cell(sheet, row, DISCIPLINE_COL) {
                    let trimmed = s.trim();
                    if !trimmed.is_empty() {
                        found.insert(trimmed.to_string());
                    }
                }
            }
        }
        found.into_iter().collect()
    }
}
