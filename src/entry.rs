use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult, ParseLabelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    Basic,
    Hourly,
    Combined,
}

impl LoadType {
    pub const ALL: [LoadType; 3] = [LoadType::Basic, LoadType::Hourly, LoadType::Combined];

    /// Label stored in the load-type column of the workbook.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::Basic => "осн.",
            LoadType::Hourly => "почас.",
            LoadType::Combined => "совм.",
        }
    }
}

impl FromStr for LoadType {
    type Err = ParseLabelError;

    /// Accepts the workbook labels, with or without the dot, and the English names.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "осн." | "осн" | "basic" => Ok(LoadType::Basic),
            "почас." | "почас" | "hourly" => Ok(LoadType::Hourly),
            "совм." | "совм" | "combined" => Ok(LoadType::Combined),
            _ => Err(ParseLabelError::new("load type", value)),
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lecture / practice / lab hours. `None` and `Some(0.0)` both mean "no hours".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Hours {
    pub lecture: Option<f64>,
    pub practice: Option<f64>,
    pub lab: Option<f64>,
}

impl Hours {
    pub fn new(lecture: f64, practice: f64, lab: f64) -> Self {
        Self {
            lecture: Some(lecture),
            practice: Some(practice),
            lab: Some(lab),
        }
    }

    pub fn lecture(hours: f64) -> Self {
        Self {
            lecture: Some(hours),
            ..Self::default()
        }
    }

    pub fn practice(hours: f64) -> Self {
        Self {
            practice: Some(hours),
            ..Self::default()
        }
    }

    pub fn lab(hours: f64) -> Self {
        Self {
            lab: Some(hours),
            ..Self::default()
        }
    }

    /// The three channels in column order, missing values read as 0.
    pub fn channels(&self) -> [f64; 3] {
        [
            self.lecture.unwrap_or(0.0),
            self.practice.unwrap_or(0.0),
            self.lab.unwrap_or(0.0),
        ]
    }

    pub fn from_channels(channels: [f64; 3]) -> Self {
        let keep = |v: f64| (v != 0.0).then_some(v);
        Self {
            lecture: keep(channels[0]),
            practice: keep(channels[1]),
            lab: keep(channels[2]),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.channels().iter().all(|v| *v == 0.0)
    }

    pub fn total(&self) -> f64 {
        self.channels().iter().sum()
    }
}

/// One row of a monthly sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub day: u32,
    pub discipline: String,
    pub group: String,
    pub load_type: LoadType,
    pub hours: Hours,
}

impl ScheduleEntry {
    pub fn new(
        day: u32,
        discipline: impl Into<String>,
        group: impl Into<String>,
        load_type: LoadType,
        hours: Hours,
    ) -> Self {
        Self {
            day,
            discipline: discipline.into(),
            group: group.into(),
            load_type,
            hours,
        }
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(&self.discipline, &self.group, self.load_type.as_str())
    }
}

/// Entry fields shared by every occurrence of one add request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTemplate {
    pub discipline: String,
    pub group: String,
    pub load_type: LoadType,
    pub hours: Hours,
}

impl EntryTemplate {
    pub fn new(
        discipline: impl Into<String>,
        group: impl Into<String>,
        load_type: LoadType,
        hours: Hours,
    ) -> Self {
        Self {
            discipline: discipline.into(),
            group: group.into(),
            load_type,
            hours,
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.discipline.trim().is_empty() || self.group.trim().is_empty() {
            return Err(LedgerError::validation(
                "empty entry: discipline, group and load type are required",
            ));
        }
        for (name, value) in [
            ("lecture", self.hours.lecture),
            ("practice", self.hours.practice),
            ("lab", self.hours.lab),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(LedgerError::validation(format!(
                        "{name} hours must be a nonnegative number (got {v})"
                    )));
                }
            }
        }
        if self.hours.is_zero() {
            return Err(LedgerError::validation(
                "empty entry: at least one of lecture, practice or lab hours is required",
            ));
        }
        Ok(())
    }

    pub fn for_day(&self, day: u32) -> ScheduleEntry {
        ScheduleEntry {
            day,
            discipline: self.discipline.clone(),
            group: self.group.clone(),
            load_type: self.load_type,
            hours: self.hours,
        }
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(&self.discipline, &self.group, self.load_type.as_str())
    }
}

/// Find-or-create key of a season aggregate row.
///
/// Matching is exact on the text rendering of each cell, so a numeric group
/// cell 101 matches the key "101" while "101.0" or " 101" do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub discipline: String,
    pub group: String,
    pub load_type: String,
}

impl IdentityKey {
    pub fn new(
        discipline: impl Into<String>,
        group: impl Into<String>,
        load_type: impl Into<String>,
    ) -> Self {
        Self {
            discipline: discipline.into(),
            group: group.into(),
            load_type: load_type.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.discipline, self.group, self.load_type)
    }
}
