use crate::config::RetryConfig;
use crate::grid::Workbook;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("workbook not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no access to {}; make sure it is not open in another program", .0.display())]
    AccessDenied(PathBuf),

    #[error("corrupt workbook: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported workbook format: {0}")]
    Unsupported(String),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "xlsx")]
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl PersistenceError {
    /// Only contention on the file is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistenceError::AccessDenied(_))
    }

    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Load/save contract for a whole workbook.
pub trait WorkbookStore {
    fn load(&self) -> PersistenceResult<Workbook>;
    fn save(&self, workbook: &Workbook) -> PersistenceResult<()>;
    fn location(&self) -> &Path;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            backoff: config.backoff(),
        }
    }
}

/// Run `op`, retrying `AccessDenied` failures up to the policy's attempt count.
pub fn with_retry<T, F>(policy: RetryPolicy, mut op: F) -> PersistenceResult<T>
where
    F: FnMut() -> PersistenceResult<T>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %err, "retrying workbook access");
                thread::sleep(policy.backoff);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use file::{
    JsonWorkbookStore, load_workbook_from_json, save_monthly_csv, save_season_csv,
    save_workbook_to_json,
};
