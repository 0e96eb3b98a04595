use serde::{Deserialize, Serialize};
use std::fmt;

pub mod workbook;

pub use workbook::{Sheet, Workbook};

/// A single stored cell value. Absent cells are represented as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Tabular cell storage addressed by (sheet, 1-based row, 1-based column).
///
/// Implementations never create sheets implicitly: writes to an unknown
/// sheet are ignored and reads from one return `None`.
pub trait GridStore {
    fn get_cell(&self, sheet: &str, row: u32, col: u32) -> Option<CellValue>;
    fn set_cell(&mut self, sheet: &str, row: u32, col: u32, value: Option<CellValue>);
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }
}

/// A cell is empty when absent or when it holds whitespace-only text.
pub fn is_empty_cell(value: Option<&CellValue>) -> bool {
    value.is_none_or(CellValue::is_blank)
}

/// Text rendering used for identity comparisons, with `None` read as "".
pub fn cell_text(value: Option<&CellValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Convert spreadsheet column letters ("A", "E", "AA") to a 1-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, ch| {
        let ch = ch.to_ascii_uppercase();
        ch.is_ascii_uppercase()
            .then(|| acc * 26 + (ch as u32 - 'A' as u32 + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_map_to_indices() {
        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("E"), Some(5));
        assert_eq!(column_index("i"), Some(9));
        assert_eq!(column_index("AA"), Some(27));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("E1"), None);
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(CellValue::Number(101.0).to_string(), "101");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
    }

    #[test]
    fn whitespace_text_counts_as_empty() {
        assert!(is_empty_cell(None));
        assert!(is_empty_cell(Some(&CellValue::text("   "))));
        assert!(!is_empty_cell(Some(&CellValue::Number(0.0))));
        assert!(!is_empty_cell(Some(&CellValue::text("x"))));
    }
}
