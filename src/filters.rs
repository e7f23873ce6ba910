//! Record filters: publication date range and ministry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// True when at least one bound is set.
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// True when both bounds are set and `from` is after `to`.
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Ministry selection from the form or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinistryFilter {
    #[default]
    Any,
    /// Case-insensitive substring of the ministry name.
    Named(String),
}

impl MinistryFilter {
    /// Build a filter from a user selection. Blank, `Any` and `All` select everything.
    pub fn from_selection(selection: &str) -> Self {
        let selection = selection.trim();
        if selection.is_empty()
            || selection.eq_ignore_ascii_case("any")
            || selection.eq_ignore_ascii_case("all")
        {
            MinistryFilter::Any
        } else {
            MinistryFilter::Named(selection.to_string())
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MinistryFilter::Named(_))
    }

    /// Match against a known ministry name.
    pub fn matches_ministry(&self, ministry: &str) -> bool {
        match self {
            MinistryFilter::Any => true,
            MinistryFilter::Named(wanted) => contains_ignore_case(ministry, wanted),
        }
    }

    /// Match a record, falling back to its title when the ministry is unknown.
    pub fn matches(&self, ministry: Option<&str>, title: &str) -> bool {
        match ministry {
            Some(ministry) => self.matches_ministry(ministry),
            None => self.matches_ministry(title),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MinistryFilter::Any => "Any",
            MinistryFilter::Named(name) => name,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(Some(d(2025, 4, 1)), Some(d(2025, 4, 30)));
        assert!(range.contains(d(2025, 4, 1)));
        assert!(range.contains(d(2025, 4, 30)));
        assert!(range.contains(d(2025, 4, 15)));
        assert!(!range.contains(d(2025, 3, 31)));
        assert!(!range.contains(d(2025, 5, 1)));
    }

    #[test]
    fn test_open_ranges() {
        let since = DateRange::new(Some(d(2025, 1, 1)), None);
        assert!(since.contains(d(2030, 1, 1)));
        assert!(!since.contains(d(2024, 12, 31)));

        let until = DateRange::new(None, Some(d(2025, 1, 1)));
        assert!(until.contains(d(1999, 1, 1)));
        assert!(!until.contains(d(2025, 1, 2)));

        let open = DateRange::default();
        assert!(!open.is_active());
        assert!(open.contains(d(2025, 6, 1)));
    }

    #[test]
    fn test_inverted_range() {
        assert!(DateRange::new(Some(d(2025, 5, 1)), Some(d(2025, 4, 1))).is_inverted());
        assert!(!DateRange::new(Some(d(2025, 4, 1)), Some(d(2025, 4, 1))).is_inverted());
        assert!(!DateRange::new(None, Some(d(2025, 4, 1))).is_inverted());
    }

    #[test]
    fn test_ministry_selection() {
        assert_eq!(MinistryFilter::from_selection(""), MinistryFilter::Any);
        assert_eq!(MinistryFilter::from_selection(" any "), MinistryFilter::Any);
        assert_eq!(MinistryFilter::from_selection("All"), MinistryFilter::Any);
        assert_eq!(
            MinistryFilter::from_selection("Ministry of Finance"),
            MinistryFilter::Named("Ministry of Finance".to_string())
        );
    }

    #[test]
    fn test_ministry_matching() {
        let filter = MinistryFilter::Named("finance".to_string());
        assert!(filter.matches(Some("Ministry of Finance"), "Anything"));
        assert!(!filter.matches(Some("Ministry of Defence"), "Finance Commission visit"));
        assert!(filter.matches(None, "Finance Minister addresses G20"));
        assert!(!filter.matches(None, "Defence exercise concludes"));
        assert!(MinistryFilter::Any.matches(None, ""));
    }
}
