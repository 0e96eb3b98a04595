use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::CalendarConfig;
use crate::error::{LedgerError, LedgerResult, ParseLabelError};

/// Fortnightly academic week parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekType {
    Upper,
    Lower,
}

impl WeekType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekType::Upper => "upper",
            WeekType::Lower => "lower",
        }
    }

    /// Name used on printed timetables.
    pub fn label(&self) -> &'static str {
        match self {
            WeekType::Upper => "числитель",
            WeekType::Lower => "знаменатель",
        }
    }
}

impl fmt::Display for WeekType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekFilter {
    Upper,
    Lower,
    Both,
}

impl FromStr for WeekFilter {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "upper" | "числитель" => Ok(WeekFilter::Upper),
            "lower" | "знаменатель" => Ok(WeekFilter::Lower),
            "both" | "обе" | "обе недели" => Ok(WeekFilter::Both),
            _ => Err(ParseLabelError::new("week filter", value)),
        }
    }
}

impl WeekFilter {
    fn week_type(&self) -> Option<WeekType> {
        match self {
            WeekFilter::Upper => Some(WeekType::Upper),
            WeekFilter::Lower => Some(WeekType::Lower),
            WeekFilter::Both => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub filter: WeekFilter,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate, filter: WeekFilter) -> Self {
        Self { start, end, filter }
    }
}

/// One concrete class date, already mapped to its month sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceDate {
    pub date: NaiveDate,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub week_type: WeekType,
    pub sheet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicCalendar {
    anchor_month: u32,
    anchor_day: u32,
}

impl Default for AcademicCalendar {
    fn default() -> Self {
        Self {
            anchor_month: 9,
            anchor_day: 1,
        }
    }
}

impl AcademicCalendar {
    /// Calendar whose week cycle restarts every year on the given month/day.
    /// The anchor must exist in every year (Feb 29 is rejected).
    pub fn new(anchor_month: u32, anchor_day: u32) -> LedgerResult<Self> {
        if NaiveDate::from_ymd_opt(2001, anchor_month, anchor_day).is_none() {
            return Err(LedgerError::validation(format!(
                "invalid week anchor {anchor_month:02}-{anchor_day:02}"
            )));
        }
        Ok(Self {
            anchor_month,
            anchor_day,
        })
    }

    pub fn from_config(config: &CalendarConfig) -> LedgerResult<Self> {
        Self::new(config.anchor_month, config.anchor_day)
    }

    fn anchor_in(&self, year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, self.anchor_month, self.anchor_day)
            .expect("anchor is validated against a non-leap year")
    }

    /// Most recent anchor date on or before `date`.
    pub fn cycle_start(&self, date: NaiveDate) -> NaiveDate {
        let anchor = self.anchor_in(date.year());
        if date < anchor {
            self.anchor_in(date.year() - 1)
        } else {
            anchor
        }
    }

    pub fn resolve_week_type(&self, date: NaiveDate) -> WeekType {
        let days = (date - self.cycle_start(date)).num_days();
        if (days / 7) % 2 == 0 {
            WeekType::Upper
        } else {
            WeekType::Lower
        }
    }

    /// Expand a period into occurrences that have a month sheet, sorted by
    /// (month, day). Multi-year spans interleave by calendar position.
    pub fn expand_period(
        &self,
        period: &Period,
        known_sheets: &[String],
    ) -> LedgerResult<Vec<OccurrenceDate>> {
        if period.start >= period.end {
            return Err(LedgerError::validation(
                "period start must be earlier than period end",
            ));
        }

        let mut occurrences = Vec::new();
        let mut current = period.start;
        match period.filter.week_type() {
            None => {
                while current <= period.end {
                    if let Some(occurrence) = self.occurrence(current, known_sheets) {
                        occurrences.push(occurrence);
                    }
                    current += Duration::days(7);
                }
            }
            Some(target) => {
                while current <= period.end {
                    if self.resolve_week_type(current) == target {
                        if let Some(occurrence) = self.occurrence(current, known_sheets) {
                            occurrences.push(occurrence);
                        }
                        current += Duration::days(7);
                    } else {
                        current += Duration::days(1);
                    }
                }
            }
        }

        sort_by_calendar_position(&mut occurrences);
        tracing::debug!(
            start = %period.start,
            end = %period.end,
            count = occurrences.len(),
            "expanded period"
        );
        Ok(occurrences)
    }

    /// Occurrence for `date` if its month maps to a known sheet.
    pub fn occurrence(&self, date: NaiveDate, known_sheets: &[String]) -> Option<OccurrenceDate> {
        let sheet = map_month_to_sheet(date.month(), known_sheets)?;
        Some(OccurrenceDate {
            date,
            day: date.day(),
            month: date.month(),
            year: date.year(),
            week_type: self.resolve_week_type(date),
            sheet: sheet.to_string(),
        })
    }
}

fn sort_by_calendar_position(occurrences: &mut [OccurrenceDate]) {
    occurrences.sort_by_key(|o| (o.month, o.day));
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True if `token` occurs in `name` without a word character on either side.
pub fn contains_standalone_token(name: &str, token: &str) -> bool {
    name.match_indices(token).any(|(idx, matched)| {
        let before = name[..idx].chars().next_back();
        let after = name[idx + matched.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

/// First sheet, in workbook order, naming `month` as a standalone two-digit token.
pub fn map_month_to_sheet(month: u32, known_sheets: &[String]) -> Option<&str> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let token = format!("{month:02}");
    known_sheets
        .iter()
        .find(|name| contains_standalone_token(name, &token))
        .map(String::as_str)
}

/// Month carried by a sheet name, if any.
pub fn month_of_sheet(name: &str) -> Option<u32> {
    (1..=12).find(|month| contains_standalone_token(name, &format!("{month:02}")))
}

/// Whether a sheet name starts with a month number, which is how the viewable
/// monthly sheets are recognised.
pub fn starts_with_month_token(name: &str) -> bool {
    let prefix: String = name.chars().take(2).collect();
    matches!(
        prefix.as_str(),
        "01" | "02" | "03" | "04" | "05" | "06" | "07" | "08" | "09" | "10" | "11" | "12"
    )
}

/// The dates picked for the next add request.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceSet {
    selected: Vec<OccurrenceDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceSummary {
    pub count: usize,
    pub dates: Vec<(u32, u32)>,
    pub per_sheet: Vec<(String, usize)>,
    pub week_types: Vec<WeekType>,
}

impl fmt::Display for OccurrenceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "Dates: 0");
        }
        let dates = self
            .dates
            .iter()
            .map(|(day, month)| format!("{day}.{month:02}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sheets = self
            .per_sheet
            .iter()
            .map(|(sheet, n)| format!("{sheet}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let types = self
            .week_types
            .iter()
            .map(WeekType::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Dates: {} | {} | Sheets: {} | Types: {}",
            self.count, dates, sheets, types
        )
    }
}

impl OccurrenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occurrences(&self) -> &[OccurrenceDate] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Replace the selection with the expansion of `period`; returns how many
    /// dates were generated.
    pub fn replace_with_period(
        &mut self,
        calendar: &AcademicCalendar,
        period: &Period,
        known_sheets: &[String],
    ) -> LedgerResult<usize> {
        let occurrences = calendar.expand_period(period, known_sheets)?;
        self.selected = occurrences;
        Ok(self.selected.len())
    }

    pub fn add_date(
        &mut self,
        calendar: &AcademicCalendar,
        date: NaiveDate,
        known_sheets: &[String],
    ) -> LedgerResult<&OccurrenceDate> {
        let occurrence = calendar
            .occurrence(date, known_sheets)
            .ok_or(LedgerError::NoSheetForMonth(date.month()))?;
        if self.selected.iter().any(|o| o.date == date) {
            return Err(LedgerError::DuplicateDate(date));
        }
        self.selected.push(occurrence);
        sort_by_calendar_position(&mut self.selected);
        self.selected
            .iter()
            .find(|o| o.date == date)
            .ok_or(LedgerError::NoSheetForMonth(date.month()))
    }

    pub fn remove(&mut self, index: usize) -> LedgerResult<OccurrenceDate> {
        if index >= self.selected.len() {
            return Err(LedgerError::validation(format!(
                "no selected date at index {index}"
            )));
        }
        Ok(self.selected.remove(index))
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn summary(&self) -> OccurrenceSummary {
        let mut per_sheet: Vec<(String, usize)> = Vec::new();
        let mut week_types = Vec::new();
        for occurrence in &self.selected {
            match per_sheet.iter_mut().find(|(sheet, _)| *sheet == occurrence.sheet) {
                Some((_, count)) => *count += 1,
                None => per_sheet.push((occurrence.sheet.clone(), 1)),
            }
            if !week_types.contains(&occurrence.week_type) {
                week_types.push(occurrence.week_type);
            }
        }
        OccurrenceSummary {
            count: self.selected.len(),
            dates: self.selected.iter().map(|o| (o.day, o.month)).collect(),
            per_sheet,
            week_types,
        }
    }
}
