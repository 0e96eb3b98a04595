use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use tracing_subscriber::prelude::*;
use workload_journal::coordinator::SheetKind;
use workload_journal::grid::format_number;
use workload_journal::persistence::{save_monthly_csv, save_season_csv};
use workload_journal::report::{hours_by_discipline, monthly_frame, season_frame};
#[cfg(not(all(feature = "sqlite", feature = "xlsx")))]
use workload_journal::PersistenceError;
use workload_journal::{
    EntryTemplate, GridStore, Hours, JournalConfig, JsonWorkbookStore, LedgerCoordinator, LoadType,
    OccurrenceSet, Period, PersistenceResult, RetryPolicy, RowSelection, WeekFilter, Workbook,
    WorkbookStore, with_retry,
};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "workload_journal=info".into()),
    );
    // stdout carries the REPL transcript
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config() -> JournalConfig {
    match std::env::var("JOURNAL_CONFIG") {
        Ok(path) => match JournalConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Config error ({}): {}. Using defaults.", path, e);
                JournalConfig::default()
            }
        },
        Err(_) => JournalConfig::default(),
    }
}

/// Pick the store by file extension. Only `new` may create a database file.
fn store_for(path: &Path, create: bool) -> PersistenceResult<Box<dyn WorkbookStore>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("db" | "sqlite" | "sqlite3") => {
            #[cfg(feature = "sqlite")]
            {
                let store = if create {
                    workload_journal::SqliteWorkbookStore::create(path)?
                } else {
                    workload_journal::SqliteWorkbookStore::open(path)?
                };
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                let _ = create;
                Err(PersistenceError::Unsupported(
                    "sqlite workbooks need the 'sqlite' feature".into(),
                ))
            }
        }
        Some("xlsx") => {
            #[cfg(feature = "xlsx")]
            {
                Ok(Box::new(workload_journal::XlsxWorkbookStore::new(path)))
            }
            #[cfg(not(feature = "xlsx"))]
            {
                Err(PersistenceError::Unsupported(
                    "xlsx workbooks need the 'xlsx' feature".into(),
                ))
            }
        }
        _ => Ok(Box::new(JsonWorkbookStore::new(path))),
    }
}

/// Split a command line on whitespace, keeping "double quoted" runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

fn cell_to_string(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format_number(*v),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_to_string(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    // Widths in chars: sheet content is mostly Cyrillic
    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, s) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            let pad = widths[ci].saturating_sub(s.chars().count());
            out.push_str(&" ".repeat(pad));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  new <path>                         Create a blank academic-year workbook\n  open <path>                        Open a workbook (.json, .db with sqlite, .xlsx with xlsx)\n  save                               Save the open workbook\n  sheets                             List monthly and season sheets\n  week <YYYY-MM-DD>                  Show the week type of a date\n  period <start> <end> <upper|lower|both>\n                                     Select every class date in a period\n  date <YYYY-MM-DD>                  Add one date to the selection\n  undate <n>                         Remove selected date number n\n  dates                              List the selected dates\n  clear                              Clear the selection\n  add <discipline> <group> <load_type> <lecture> <practice> <lab>\n                                     Record an entry on every selected date\n  show <sheet>                       Show the records of a sheet\n  totals <sheet>                     Hours per discipline and group\n  delete <sheet> <day|-> <discipline> <group> [load_type]\n                                     Delete one record\n  disciplines                        Disciplines found in the season sheets\n  export csv <sheet> <path>          Export a sheet as CSV\n  export xlsx <path>                 Export the workbook as .xlsx\n  quit|exit                          Exit\nArguments containing spaces can be \"double quoted\"."
    );
}

struct Session {
    config: JournalConfig,
    coordinator: LedgerCoordinator,
    retry: RetryPolicy,
    path: Option<PathBuf>,
    workbook: Workbook,
    selection: OccurrenceSet,
}

impl Session {
    fn new(config: JournalConfig) -> Result<Self, String> {
        let coordinator = LedgerCoordinator::new(&config).map_err(|e| e.to_string())?;
        Ok(Self {
            retry: RetryPolicy::from(&config.retry),
            config,
            coordinator,
            path: None,
            workbook: Workbook::new(),
            selection: OccurrenceSet::new(),
        })
    }

    fn store(&self) -> Result<Box<dyn WorkbookStore>, String> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| "No workbook open. Use 'open <path>' or 'new <path>'.".to_string())?;
        store_for(path, false).map_err(|e| e.to_string())
    }

    fn open(&mut self, path: &Path) -> Result<(), String> {
        let store = store_for(path, false).map_err(|e| e.to_string())?;
        let workbook = with_retry(self.retry, || store.load()).map_err(|e| e.to_string())?;
        self.workbook = workbook;
        self.path = Some(path.to_path_buf());
        self.selection.clear();
        Ok(())
    }

    fn create(&mut self, path: &Path) -> Result<(), String> {
        let workbook = Workbook::academic_year(
            &self.config.seasons.autumn_sheet,
            &self.config.seasons.spring_sheet,
        );
        let store = store_for(path, true).map_err(|e| e.to_string())?;
        with_retry(self.retry, || store.save(&workbook)).map_err(|e| e.to_string())?;
        self.workbook = workbook;
        self.path = Some(path.to_path_buf());
        self.selection.clear();
        Ok(())
    }

    fn save(&self) -> Result<(), String> {
        let store = self.store()?;
        with_retry(self.retry, || store.save(&self.workbook)).map_err(|e| e.to_string())
    }

    /// Reload from disk, apply `mutate`, then persist the result.
    fn mutate<T>(
        &mut self,
        mutate: impl FnOnce(&LedgerCoordinator, &mut Workbook) -> Result<T, String>,
    ) -> Result<T, String> {
        let store = self.store()?;
        let mut workbook = with_retry(self.retry, || store.load()).map_err(|e| e.to_string())?;
        let outcome = mutate(&self.coordinator, &mut workbook)?;
        with_retry(self.retry, || store.save(&workbook)).map_err(|e| e.to_string())?;
        self.workbook = workbook;
        Ok(outcome)
    }

    fn sheet_frame(&self, sheet: &str) -> Result<DataFrame, String> {
        if self.workbook.sheet(sheet).is_none() {
            return Err(format!("Sheet '{}' not found", sheet));
        }
        match self.coordinator.classify_sheet(sheet) {
            Some(SheetKind::Monthly(_)) => {
                let records = self.coordinator.monthly().read_all(&self.workbook, sheet);
                monthly_frame(&records).map_err(|e| e.to_string())
            }
            Some(SheetKind::Season(_)) => {
                let entries = self
                    .coordinator
                    .season()
                    .read_all(&self.workbook, sheet)
                    .map_err(|e| e.to_string())?;
                season_frame(&entries).map_err(|e| e.to_string())
            }
            None => Err(format!("Sheet '{}' is neither a month nor a season sheet", sheet)),
        }
    }

    fn export_csv(&self, sheet: &str, path: &Path) -> Result<usize, String> {
        if self.workbook.sheet(sheet).is_none() {
            return Err(format!("Sheet '{}' not found", sheet));
        }
        match self.coordinator.classify_sheet(sheet) {
            Some(SheetKind::Monthly(_)) => {
                let records = self.coordinator.monthly().read_all(&self.workbook, sheet);
                save_monthly_csv(&records, path).map_err(|e| e.to_string())?;
                Ok(records.len())
            }
            Some(SheetKind::Season(_)) => {
                let entries = self
                    .coordinator
                    .season()
                    .read_all(&self.workbook, sheet)
                    .map_err(|e| e.to_string())?;
                save_season_csv(&entries, path).map_err(|e| e.to_string())?;
                Ok(entries.len())
            }
            None => Err(format!("Sheet '{}' is neither a month nor a season sheet", sheet)),
        }
    }

    fn print_dates(&self) {
        if self.selection.is_empty() {
            println!("No dates selected.");
            return;
        }
        for (i, o) in self.selection.occurrences().iter().enumerate() {
            println!(
                "  {:>2}. {} {} ({}) -> {}",
                i + 1,
                o.date,
                o.week_type,
                o.week_type.label(),
                o.sheet
            );
        }
        println!("{}", self.selection.summary());
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_hours(s: &str) -> Option<f64> {
    if s == "-" {
        return Some(0.0);
    }
    s.replace(',', ".").parse::<f64>().ok()
}

fn main() {
    init_tracing();
    let mut session = match Session::new(load_config()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    println!("Workload Journal (CLI) - type 'help' for commands\n");
    if let Some(path) = std::env::args().nth(1) {
        match session.open(Path::new(&path)) {
            Ok(()) => println!("Opened {}", path),
            Err(e) => println!("Error: {}", e),
        }
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let args = split_args(line.trim());
        let Some(cmd) = args.first().map(String::as_str) else {
            continue;
        };
        let arg = |i: usize| args.get(i).map(String::as_str);

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "new" => match arg(1) {
                Some(path) => match session.create(Path::new(path)) {
                    Ok(()) => println!("Created {}", path),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: new <path>"),
            },
            "open" => match arg(1) {
                Some(path) => match session.open(Path::new(path)) {
                    Ok(()) => println!("Opened {}", path),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: open <path>"),
            },
            "save" => match session.save() {
                Ok(()) => println!("Saved."),
                Err(e) => println!("Error: {}", e),
            },
            "sheets" => {
                let monthly = session.coordinator.monthly_sheets(&session.workbook);
                let seasons = session.coordinator.season_sheets(&session.workbook);
                println!("Monthly: {}", monthly.join(", "));
                println!("Season: {}", seasons.join(", "));
            }
            "week" => match arg(1).and_then(parse_date) {
                Some(date) => {
                    let wt = session.coordinator.calendar().resolve_week_type(date);
                    println!("{}: {} ({})", date, wt, wt.label());
                }
                None => println!("Usage: week <YYYY-MM-DD>"),
            },
            "period" => {
                let start = arg(1).and_then(parse_date);
                let end = arg(2).and_then(parse_date);
                let filter = arg(3).and_then(|s| s.parse::<WeekFilter>().ok());
                match (start, end, filter) {
                    (Some(start), Some(end), Some(filter)) => {
                        let sheets = session.workbook.sheet_names();
                        let period = Period::new(start, end, filter);
                        match session.selection.replace_with_period(
                            session.coordinator.calendar(),
                            &period,
                            &sheets,
                        ) {
                            Ok(n) => {
                                println!("Selected {} dates.", n);
                                session.print_dates();
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: period <YYYY-MM-DD> <YYYY-MM-DD> <upper|lower|both>"),
                }
            }
            "date" => match arg(1).and_then(parse_date) {
                Some(date) => {
                    let sheets = session.workbook.sheet_names();
                    match session
                        .selection
                        .add_date(session.coordinator.calendar(), date, &sheets)
                    {
                        Ok(o) => println!("Added {} ({}) -> {}", o.date, o.week_type, o.sheet),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("Usage: date <YYYY-MM-DD>"),
            },
            "undate" => match arg(1).and_then(|s| s.parse::<usize>().ok()) {
                Some(n) if n >= 1 => match session.selection.remove(n - 1) {
                    Ok(o) => println!("Removed {}", o.date),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: undate <n>"),
            },
            "dates" => session.print_dates(),
            "clear" => {
                session.selection.clear();
                println!("Selection cleared.");
            }
            "add" => {
                let load_type = arg(3).and_then(|s| s.parse::<LoadType>().ok());
                let hours = (
                    arg(4).and_then(parse_hours),
                    arg(5).and_then(parse_hours),
                    arg(6).and_then(parse_hours),
                );
                match (arg(1), arg(2), load_type, hours) {
                    (Some(discipline), Some(group), Some(load_type), (Some(l), Some(p), Some(b))) => {
                        let template = EntryTemplate::new(
                            discipline,
                            group,
                            load_type,
                            Hours::from_channels([l, p, b]),
                        );
                        let occurrences = session.selection.occurrences().to_vec();
                        match session.mutate(|coordinator, workbook| {
                            coordinator
                                .add_intent(workbook, &occurrences, &template)
                                .map_err(|e| e.to_string())
                        }) {
                            Ok(report) => print!("{}", report),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!(
                        "Usage: add <discipline> <group> <осн.|почас.|совм.> <lecture> <practice> <lab>"
                    ),
                }
            }
            "show" | "totals" => match arg(1) {
                Some(sheet) => {
                    let frame = session.sheet_frame(sheet).and_then(|df| {
                        if cmd == "totals" {
                            hours_by_discipline(&df).map_err(|e| e.to_string())
                        } else {
                            Ok(df)
                        }
                    });
                    match frame {
                        Ok(df) => println!("{}", render_df_as_text_table(&df)),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("Usage: {} <sheet>", cmd),
            },
            "delete" => {
                let day = match arg(2) {
                    Some("-") => Some(None),
                    Some(s) => s.parse::<u32>().ok().map(Some),
                    None => None,
                };
                match (arg(1), day, arg(3), arg(4)) {
                    (Some(sheet), Some(day), Some(discipline), Some(group)) => {
                        let selection = RowSelection {
                            day,
                            discipline: discipline.to_string(),
                            group: group.to_string(),
                            load_type: arg(5).map(|lt| {
                                lt.parse::<LoadType>()
                                    .map(|t| t.as_str().to_string())
                                    .unwrap_or_else(|_| lt.to_string())
                            }),
                        };
                        let sheet = sheet.to_string();
                        match session.mutate(|coordinator, workbook| {
                            coordinator
                                .delete_intents(workbook, &sheet, &[selection])
                                .map_err(|e| e.to_string())
                        }) {
                            Ok(report) => println!("{}", report),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: delete <sheet> <day|-> <discipline> <group> [load_type]"),
                }
            }
            "disciplines" => {
                let found = session.coordinator.disciplines(&session.workbook);
                if found.is_empty() {
                    println!("No disciplines recorded.");
                } else {
                    for d in found {
                        println!("  {}", d);
                    }
                }
            }
            "export" => match (arg(1), arg(2), arg(3)) {
                (Some("csv"), Some(sheet), Some(path)) => {
                    match session.export_csv(sheet, Path::new(path)) {
                        Ok(n) => println!("Exported {} rows to {}", n, path),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                #[cfg(feature = "xlsx")]
                (Some("xlsx"), Some(path), None) => {
                    match workload_journal::export_workbook_xlsx(&session.workbook, path) {
                        Ok(()) => println!("Exported workbook to {}", path),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: export csv <sheet> <path> | export xlsx <path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
