use super::{PersistenceError, PersistenceResult, WorkbookStore};
use crate::grid::{CellValue, Sheet, Workbook};
use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Workbook stored cell-by-cell in a SQLite file.
pub struct SqliteWorkbookStore {
    path: PathBuf,
    connection: Mutex<Connection>,
}

impl SqliteWorkbookStore {
    /// Open an existing database file. A missing file is `NotFound` and is not created.
    pub fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        Self::with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)
    }

    /// Open the database file, creating it when missing.
    pub fn create<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        Self::with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn with_flags<P: AsRef<Path>>(path: P, flags: OpenFlags) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let connection = Connection::open_with_flags(&path, flags).map_err(|e| classify(e, &path))?;
        Self::initialize_schema(&connection).map_err(|e| classify(e, &path))?;
        Ok(Self {
            path,
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> rusqlite::Result<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS sheets (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS cells (
                sheet INTEGER NOT NULL REFERENCES sheets(position) ON DELETE CASCADE,
                row INTEGER NOT NULL,
                col INTEGER NOT NULL,
                number REAL,
                text TEXT,
                PRIMARY KEY (sheet, row, col)
            );
        "#;
        connection.execute_batch(ddl)
    }

    fn lock(&self) -> PersistenceResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::Corrupt("sqlite connection lock poisoned".into()))
    }

    fn write_all(conn: &mut Connection, workbook: &Workbook) -> rusqlite::Result<()> {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cells", [])?;
        tx.execute("DELETE FROM sheets", [])?;
        {
            let mut sheet_stmt = tx.prepare("INSERT INTO sheets (position, name) VALUES (?1, ?2)")?;
            let mut cell_stmt = tx.prepare(
                "INSERT INTO cells (sheet, row, col, number, text) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, sheet) in workbook.sheets().iter().enumerate() {
                let position = position as i64;
                sheet_stmt.execute(params![position, sheet.name()])?;
                for (row, col, value) in sheet.cells() {
                    let (number, text) = match value {
                        CellValue::Number(n) => (Some(*n), None),
                        CellValue::Text(s) => (None, Some(s.as_str())),
                    };
                    cell_stmt.execute(params![position, row, col, number, text])?;
                }
            }
        }
        tx.commit()
    }

    fn read_all(conn: &Connection) -> rusqlite::Result<Vec<(i64, Sheet)>> {
        let mut stmt = conn.prepare("SELECT position, name FROM sheets ORDER BY position ASC")?;
        let mut sheets = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, Sheet::new(row.get::<_, String>(1)?))))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare("SELECT sheet, row, col, number, text FROM cells")?;
        let cells = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        for cell in cells {
            let (position, row, col, number, text) = cell?;
            let value = match (number, text) {
                (Some(n), _) => Some(CellValue::Number(n)),
                (None, Some(s)) => Some(CellValue::Text(s)),
                (None, None) => None,
            };
            if let Some((_, sheet)) = sheets.iter_mut().find(|(p, _)| *p == position) {
                sheet.set(row, col, value);
            }
        }
        Ok(sheets)
    }
}

fn classify(err: rusqlite::Error, path: &Path) -> PersistenceError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::ReadOnly
            | ErrorCode::PermissionDenied => PersistenceError::AccessDenied(path.to_path_buf()),
            ErrorCode::CannotOpen => PersistenceError::NotFound(path.to_path_buf()),
            ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt => {
                PersistenceError::Corrupt(format!("{}: {err}", path.display()))
            }
            _ => PersistenceError::Sqlite(err),
        },
        _ => PersistenceError::Sqlite(err),
    }
}

impl WorkbookStore for SqliteWorkbookStore {
    fn save(&self, workbook: &Workbook) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        Self::write_all(&mut conn, workbook).map_err(|e| classify(e, &self.path))
    }

    fn load(&self) -> PersistenceResult<Workbook> {
        let conn = self.lock()?;
        let sheets = Self::read_all(&conn).map_err(|e| classify(e, &self.path))?;
        if sheets.is_empty() {
            return Err(PersistenceError::NotFound(self.path.clone()));
        }
        let mut workbook = Workbook::new();
        for (_, sheet) in sheets {
            workbook.push_sheet(sheet);
        }
        Ok(workbook)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
