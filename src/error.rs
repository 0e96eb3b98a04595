use chrono::NaiveDate;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Errors raised by the ledger engine.
///
/// A delete that matches nothing is not an error; it is reported as zero
/// rows removed.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no free row in sheet '{sheet}' (checked {capacity} rows)")]
    Capacity { sheet: String, capacity: u32 },

    #[error("no sheet found for month {0:02}")]
    NoSheetForMonth(u32),

    #[error("date {0} is already selected")]
    DuplicateDate(NaiveDate),

    #[error("sheet '{0}' not found")]
    UnknownSheet(String),

    #[error("no records were written")]
    NothingWritten,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A label that names none of the known variants of `kind`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseLabelError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
