use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::calendar::{AcademicCalendar, OccurrenceDate, month_of_sheet, starts_with_month_token};
use crate::config::{JournalConfig, SeasonConfig};
use crate::entry::{EntryTemplate, IdentityKey};
use crate::error::{LedgerError, LedgerResult};
use crate::grid::{GridStore, format_number};
use crate::monthly::MonthlyLedger;
use crate::season::{Season, SeasonLedger, SeasonWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Monthly(u32),
    Season(Season),
}

/// A monthly row written by `add_intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedEntry {
    pub sheet: String,
    pub day: u32,
    pub month: u32,
    pub row: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddReport {
    pub monthly: Vec<PlacedEntry>,
    pub seasons: Vec<SeasonWrite>,
}

impl fmt::Display for AddReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entries added:")?;
        let mut sheets: Vec<&str> = Vec::new();
        for placed in &self.monthly {
            if !sheets.contains(&placed.sheet.as_str()) {
                sheets.push(&placed.sheet);
            }
        }
        for sheet in sheets {
            let rows = self
                .monthly
                .iter()
                .filter(|p| p.sheet == sheet)
                .map(|p| format!("{}.{:02} (row {})", p.day, p.month, p.row))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  {sheet}: {rows}")?;
        }
        if !self.seasons.is_empty() {
            writeln!(f, "Season sheets:")?;
            for write in &self.seasons {
                let [lecture, practice, lab] = write.totals.channels();
                writeln!(
                    f,
                    "  {}: {} row {} (lecture {}, practice {}, lab {})",
                    write.sheet,
                    if write.merged { "updated" } else { "created" },
                    write.row,
                    format_number(lecture),
                    format_number(practice),
                    format_number(lab)
                )?;
            }
        }
        Ok(())
    }
}

/// Identity of a row to delete. Monthly sheets match on day, discipline and
/// group; season sheets on discipline, group and load type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSelection {
    pub day: Option<u32>,
    pub discipline: String,
    pub group: String,
    pub load_type: Option<String>,
}

impl RowSelection {
    pub fn monthly(day: u32, discipline: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            day: Some(day),
            discipline: discipline.into(),
            group: group.into(),
            load_type: None,
        }
    }

    pub fn season(key: &IdentityKey) -> Self {
        Self {
            day: None,
            discipline: key.discipline.clone(),
            group: key.group.clone(),
            load_type: Some(key.load_type.clone()),
        }
    }

    fn identity(&self) -> IdentityKey {
        IdentityKey::new(
            self.discipline.as_str(),
            self.group.as_str(),
            self.load_type.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub requested: usize,
    pub removed: usize,
}

impl fmt::Display for DeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Removed {} of {} entries", self.removed, self.requested)
    }
}

/// Applies one logical add or delete across the monthly and season sheets
/// of a workbook.
#[derive(Debug, Clone)]
pub struct LedgerCoordinator {
    calendar: AcademicCalendar,
    monthly: MonthlyLedger,
    season: SeasonLedger,
    seasons: SeasonConfig,
}

impl Default for LedgerCoordinator {
    fn default() -> Self {
        Self {
            calendar: AcademicCalendar::default(),
            monthly: MonthlyLedger::default(),
            season: SeasonLedger::default(),
            seasons: SeasonConfig::default(),
        }
    }
}

impl LedgerCoordinator {
    pub fn new(config: &JournalConfig) -> LedgerResult<Self> {
        Ok(Self {
            calendar: AcademicCalendar::from_config(&config.calendar)?,
            monthly: MonthlyLedger::new(config.layout.monthly_base_row),
            season: SeasonLedger::new(config.layout.season_base_row, config.layout.season_capacity),
            seasons: config.seasons.clone(),
        })
    }

    pub fn calendar(&self) -> &AcademicCalendar {
        &self.calendar
    }

    pub fn monthly(&self) -> &MonthlyLedger {
        &self.monthly
    }

    pub fn season(&self) -> &SeasonLedger {
        &self.season
    }

    fn season_name(&self, season: Season) -> &str {
        match season {
            Season::Autumn => &self.seasons.autumn_sheet,
            Season::Spring => &self.seasons.spring_sheet,
        }
    }

    pub fn classify_sheet(&self, name: &str) -> Option<SheetKind> {
        let lowered = name.to_lowercase();
        for season in [Season::Autumn, Season::Spring] {
            if lowered == self.season_name(season).to_lowercase() {
                return Some(SheetKind::Season(season));
            }
        }
        month_of_sheet(name).map(SheetKind::Monthly)
    }

    /// Sheet holding the aggregate for `season`, matched case-insensitively.
    pub fn season_sheet<G: GridStore + ?Sized>(&self, grid: &G, season: Season) -> Option<String> {
        let wanted = self.season_name(season).to_lowercase();
        grid.sheet_names()
            .into_iter()
            .find(|name| name.to_lowercase() == wanted)
    }

    pub fn season_sheets<G: GridStore + ?Sized>(&self, grid: &G) -> Vec<String> {
        [Season::Autumn, Season::Spring]
            .into_iter()
            .filter_map(|season| self.season_sheet(grid, season))
            .collect()
    }

    /// Workbook-ordered sheets whose names start with a month number.
    pub fn monthly_sheets<G: GridStore + ?Sized>(&self, grid: &G) -> Vec<String> {
        grid.sheet_names()
            .into_iter()
            .filter(|name| starts_with_month_token(name))
            .collect()
    }

    pub fn disciplines<G: GridStore + ?Sized>(&self, grid: &G) -> Vec<String> {
        self.season.disciplines(grid, &self.season_sheets(grid))
    }

    /// Record `template` on every occurrence and top up the implicated
    /// season aggregates once each.
    ///
    /// Not transactional: if a season sheet is full the monthly rows already
    /// written stay in `grid`.
    pub fn add_intent<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        occurrences: &[OccurrenceDate],
        template: &EntryTemplate,
    ) -> LedgerResult<AddReport> {
        template.validate()?;
        if occurrences.is_empty() {
            return Err(LedgerError::validation("no dates selected"));
        }

        let mut by_sheet: Vec<(&str, Vec<&OccurrenceDate>)> = Vec::new();
        for occurrence in occurrences {
            match by_sheet.iter_mut().find(|(sheet, _)| *sheet == occurrence.sheet) {
                Some((_, group)) => group.push(occurrence),
                None => by_sheet.push((occurrence.sheet.as_str(), vec![occurrence])),
            }
        }

        let mut report = AddReport::default();
        for (sheet, mut group) in by_sheet {
            if !grid.has_sheet(sheet) {
                tracing::debug!(sheet, "skipping missing monthly sheet");
                continue;
            }
            group.sort_by_key(|o| o.day);
            for occurrence in group {
                let entry = template.for_day(occurrence.day);
                let row = match self.monthly.append_same_day(grid, sheet, occurrence.day, &entry)? {
                    Some(row) => row,
                    None => {
                        let row = self.monthly.find_insert_row(grid, sheet, occurrence.day);
                        self.monthly.insert(grid, sheet, row, &entry)?
                    }
                };
                report.monthly.push(PlacedEntry {
                    sheet: sheet.to_string(),
                    day: occurrence.day,
                    month: occurrence.month,
                    row,
                });
            }
        }

        let seasons: BTreeSet<Season> = occurrences
            .iter()
            .filter_map(|o| Season::for_month(o.month))
            .collect();
        let key = template.identity();
        for season in seasons {
            let Some(sheet) = self.season_sheet(grid, season) else {
                tracing::warn!(%season, "no season sheet in workbook");
                continue;
            };
            let write = self.season.merge_add(grid, &sheet, &key, &template.hours)?;
            report.seasons.push(write);
        }

        if report.monthly.is_empty() && report.seasons.is_empty() {
            return Err(LedgerError::NothingWritten);
        }
        tracing::info!(
            monthly = report.monthly.len(),
            seasons = report.seasons.len(),
            discipline = %template.discipline,
            "entries added"
        );
        Ok(report)
    }

    pub fn delete_intents<G: GridStore + ?Sized>(
        &self,
        grid: &mut G,
        sheet: &str,
        selections: &[RowSelection],
    ) -> LedgerResult<DeleteReport> {
        if !grid.has_sheet(sheet) {
            return Err(LedgerError::UnknownSheet(sheet.to_string()));
        }
        let kind = self
            .classify_sheet(sheet)
            .ok_or_else(|| LedgerError::UnknownSheet(sheet.to_string()))?;

        let mut removed = 0;
        for selection in selections {
            let hit = match kind {
                SheetKind::Season(_) => {
                    self.season
                        .delete_by_identity(grid, sheet, &selection.identity())
                }
                SheetKind::Monthly(_) => {
                    let day = selection.day.ok_or_else(|| {
                        LedgerError::validation("monthly deletions need a day")
                    })?;
                    self.monthly
                        .delete(grid, sheet, day, &selection.discipline, &selection.group)
                }
            };
            if hit {
                removed += 1;
            }
        }

        tracing::info!(sheet, requested = selections.len(), removed, "entries deleted");
        Ok(DeleteReport {
            requested: selections.len(),
            removed,
        })
    }
}
