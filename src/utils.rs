use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

use crate::models::hhmm;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(&self) -> &'static str {
        match self {
            Profile::Dev => "dailyflow-dev",
            Profile::Prod => "dailyflow",
        }
    }
}

/// Get the configuration directory path for DailyFlow
/// If profile is Dev, uses "dailyflow-dev" instead of "dailyflow"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "dailyflow", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for DailyFlow
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "dailyflow", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Parse a time of day (HH:MM)
pub fn parse_time(time_str: &str) -> Result<NaiveTime, chrono::ParseError> {
    hhmm::parse(time_str)
}

/// Today's calendar date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local wall-clock time
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_leaves_absolute_paths_alone() {
        assert_eq!(expand_path("/var/lib/app.db"), PathBuf::from("/var/lib/app.db"));
    }

    #[test]
    fn parses_dates_and_times() {
        assert_eq!(parse_date("2026-10-19").unwrap(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(parse_date("19/10/2026").is_err());
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(parse_time("9am").is_err());
    }

    #[test]
    fn profiles_use_separate_directories() {
        assert_ne!(Profile::Dev.app_name(), Profile::Prod.app_name());
    }
}
