pub mod calendar;
pub mod config;
pub mod coordinator;
pub mod entry;
pub mod error;
pub mod grid;
pub mod monthly;
pub mod persistence;
pub mod report;
pub mod season;

pub use calendar::{AcademicCalendar, OccurrenceDate, OccurrenceSet, Period, WeekFilter, WeekType};
pub use config::{ConfigError, JournalConfig};
pub use coordinator::{AddReport, DeleteReport, LedgerCoordinator, RowSelection, SheetKind};
pub use entry::{EntryTemplate, Hours, IdentityKey, LoadType, ScheduleEntry};
pub use error::{LedgerError, LedgerResult, ParseLabelError};
pub use grid::{CellValue, GridStore, Sheet, Workbook};
pub use monthly::{MonthlyLedger, MonthlyRecord};
pub use persistence::{
    JsonWorkbookStore, PersistenceError, PersistenceResult, RetryPolicy, WorkbookStore, with_retry,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteWorkbookStore;
#[cfg(feature = "xlsx")]
pub use persistence::xlsx::{XlsxWorkbookStore, export_workbook_xlsx};
pub use season::{AggregateEntry, Season, SeasonLedger};
