use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The reporting period of a parse: a whole year, or one month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: Option<u32>,
}

impl Period {
    /// # Errors
    /// Returns `Error::Config` if `month` is not in `1..=12` or the year is out of range.
    pub fn new(year: i32, month: Option<u32>) -> Result<Self> {
        let check = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), 1);
        if check.is_none() {
            return Err(match month {
                Some(m) => Error::config(format!("{year}-{m} is not a valid month")),
                None => Error::config(format!("{year} is not a valid year")),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    /// The `YYYY-MM` tag that the export writes into its month column, if a month is selected.
    pub fn month_tag(&self) -> Option<String> {
        self.month.map(|m| format!("{}-{m:02}", self.year))
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.month_tag() {
            Some(tag) => f.write_str(&tag),
            None => write!(f, "{}", self.year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_tag_is_zero_padded() {
        let period = Period::new(2024, Some(3)).unwrap();
        assert_eq!(period.month_tag().as_deref(), Some("2024-03"));
        assert_eq!(period.to_string(), "2024-03");
    }

    #[test]
    fn test_year_only() {
        let period = Period::new(2023, None).unwrap();
        assert_eq!(period.month_tag(), None);
        assert_eq!(period.to_string(), "2023");
    }

    #[test]
    fn test_invalid_month() {
        assert!(Period::new(2024, Some(0)).unwrap_err().is_config());
        assert!(Period::new(2024, Some(13)).unwrap_err().is_config());
    }
}
