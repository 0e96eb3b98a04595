use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Row layout of the monthly and season sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub monthly_base_row: u32,
    pub season_base_row: u32,
    /// Number of rows scanned in a season sheet, starting at `season_base_row`.
    pub season_capacity: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            monthly_base_row: 7,
            season_base_row: 5,
            season_capacity: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub anchor_month: u32,
    pub anchor_day: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            anchor_month: 9,
            anchor_day: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub autumn_sheet: String,
    pub spring_sheet: String,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            autumn_sheet: "осень".to_string(),
            spring_sheet: "весна".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub layout: LayoutConfig,
    pub calendar: CalendarConfig,
    pub seasons: SeasonConfig,
    pub retry: RetryConfig,
}

impl JournalConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: JournalConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.monthly_base_row == 0 || self.layout.season_base_row == 0 {
            return Err(ConfigError::Invalid("base rows are 1-based".into()));
        }
        if self.layout.season_capacity == 0 {
            return Err(ConfigError::Invalid(
                "season_capacity must be at least 1".into(),
            ));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid("retry.attempts must be at least 1".into()));
        }
        // 2001 is not a leap year, so Feb 29 is rejected as an anchor.
        if NaiveDate::from_ymd_opt(2001, self.calendar.anchor_month, self.calendar.anchor_day)
            .is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "calendar anchor {:02}-{:02} is not a valid date in every year",
                self.calendar.anchor_month, self.calendar.anchor_day
            )));
        }
        if self.seasons.autumn_sheet.trim().is_empty() || self.seasons.spring_sheet.trim().is_empty()
        {
            return Err(ConfigError::Invalid("season sheet names must not be empty".into()));
        }
        Ok(())
    }
}
