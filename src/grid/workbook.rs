use super::{CellValue, GridStore};
use std::collections::BTreeMap;

/// One named sheet with sparse cell storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn set(&mut self, row: u32, col: u32, value: Option<CellValue>) {
        match value {
            Some(value) => {
                self.cells.insert((row, col), value);
            }
            None => {
                self.cells.remove(&(row, col));
            }
        }
    }

    /// Occupied cells in (row, column) order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(row, col), value)| (row, col, value))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// In-memory workbook: the session handle every ledger call operates on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank workbook with twelve month sheets ("09", "10", ... "08") and
    /// the two season sheets.
    pub fn academic_year(autumn_sheet: &str, spring_sheet: &str) -> Self {
        let mut workbook = Self::new();
        for month in [9u32, 10, 11, 12, 1, 2, 3, 4, 5, 6, 7, 8] {
            workbook.add_sheet(format!("{month:02}"));
        }
        workbook.add_sheet(autumn_sheet);
        workbook.add_sheet(spring_sheet);
        workbook
    }

    /// Append a sheet; returns false if a sheet with that name already exists.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.sheet(&name).is_some() {
            return false;
        }
        self.sheets.push(Sheet::new(name));
        true
    }

    pub fn push_sheet(&mut self, sheet: Sheet) -> bool {
        if self.sheet(sheet.name()).is_some() {
            return false;
        }
        self.sheets.push(sheet);
        true
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

impl GridStore for Workbook {
    fn get_cell(&self, sheet: &str, row: u32, col: u32) -> Option<CellValue> {
        self.sheet(sheet).and_then(|s| s.get(row, col)).cloned()
    }

    fn set_cell(&mut self, sheet: &str, row: u32, col: u32, value: Option<CellValue>) {
        if let Some(s) = self.sheet_mut(sheet) {
            s.set(row, col, value);
        }
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet(sheet).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_unknown_sheet_are_ignored() {
        let mut wb = Workbook::new();
        wb.add_sheet("09");
        wb.set_cell("nope", 1, 1, Some(CellValue::Number(1.0)));
        assert_eq!(wb.get_cell("nope", 1, 1), None);
        assert_eq!(wb.sheet_names(), vec!["09".to_string()]);
    }

    #[test]
    fn setting_none_clears_cell() {
        let mut wb = Workbook::new();
        wb.add_sheet("09");
        wb.set_cell("09", 7, 5, Some(CellValue::Number(3.0)));
        assert_eq!(wb.get_cell("09", 7, 5), Some(CellValue::Number(3.0)));
        wb.set_cell("09", 7, 5, None);
        assert_eq!(wb.get_cell("09", 7, 5), None);
        assert_eq!(wb.sheet("09").unwrap().cell_count(), 0);
    }

    #[test]
    fn academic_year_keeps_sheet_order() {
        let wb = Workbook::academic_year("осень", "весна");
        let names = wb.sheet_names();
        assert_eq!(names.first().map(String::as_str), Some("09"));
        assert_eq!(names.len(), 14);
        assert!(!Workbook::academic_year("a", "b").clone().add_sheet("09"));
    }
}
