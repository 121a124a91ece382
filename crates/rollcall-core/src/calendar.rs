//! Term calendar: the ordered class dates of each track.
//!
//! The calendar is plain data handed to the aggregator. The built-in default
//! is the Spring 2026 term; a JSON file can replace it at startup:
//!
//! ```json
//! {
//!   "regular": ["2026-01-18", "2026-02-01"],
//!   "templePrep": ["2026-02-15"],
//!   "missionPrep": ["2026-02-15", "2026-02-22"]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DateRange, Track};

const SPRING_2026_REGULAR: [(i32, u32, u32); 6] = [
    (2026, 1, 18),
    (2026, 2, 1),
    (2026, 2, 15),
    (2026, 3, 1),
    (2026, 3, 15),
    (2026, 4, 5),
];

const SPRING_2026_TEMPLE_PREP: [(i32, u32, u32); 5] = [
    (2026, 2, 15),
    (2026, 2, 22),
    (2026, 3, 1),
    (2026, 3, 8),
    (2026, 3, 15),
];

const SPRING_2026_MISSION_PREP: [(i32, u32, u32); 8] = [
    (2026, 2, 15),
    (2026, 2, 22),
    (2026, 3, 1),
    (2026, 3, 8),
    (2026, 3, 15),
    (2026, 3, 22),
    (2026, 3, 29),
    (2026, 4, 5),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermCalendar {
    #[serde(default)]
    regular: Vec<NaiveDate>,
    #[serde(default)]
    temple_prep: Vec<NaiveDate>,
    #[serde(default)]
    mission_prep: Vec<NaiveDate>,
}

impl Default for TermCalendar {
    fn default() -> Self {
        Self::new(
            to_dates(&SPRING_2026_REGULAR),
            to_dates(&SPRING_2026_TEMPLE_PREP),
            to_dates(&SPRING_2026_MISSION_PREP),
        )
    }
}

fn to_dates(ymd: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
    ymd.iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

fn normalize(mut dates: Vec<NaiveDate>) -> Vec<NaiveDate> {
    dates.sort_unstable();
    dates.dedup();
    dates
}

impl TermCalendar {
    pub fn new(
        regular: Vec<NaiveDate>,
        temple_prep: Vec<NaiveDate>,
        mission_prep: Vec<NaiveDate>,
    ) -> Self {
        Self {
            regular: normalize(regular),
            temple_prep: normalize(temple_prep),
            mission_prep: normalize(mission_prep),
        }
    }

    /// Load a calendar from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read calendar file: {}", path.display()))?;
        let raw: TermCalendar = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse calendar file: {}", path.display()))?;
        let calendar = Self::new(raw.regular, raw.temple_prep, raw.mission_prep);
        debug!(
            path = %path.display(),
            regular = calendar.regular.len(),
            temple_prep = calendar.temple_prep.len(),
            mission_prep = calendar.mission_prep.len(),
            "Loaded term calendar"
        );
        Ok(calendar)
    }

    pub fn dates(&self, track: Track) -> &[NaiveDate] {
        match track {
            Track::Regular => &self.regular,
            Track::TemplePrep => &self.temple_prep,
            Track::MissionPrep => &self.mission_prep,
        }
    }

    /// Number of scheduled meetings of `track` inside `range`.
    /// An unbounded range counts the whole term.
    pub fn weeks_in_range(&self, track: Track, range: &DateRange) -> usize {
        self.dates(track).iter().filter(|d| range.contains(**d)).count()
    }

    /// Scheduled dates of `track` on or before `today`
    pub fn dates_through(&self, track: Track, today: NaiveDate) -> Vec<NaiveDate> {
        self.dates(track)
            .iter()
            .copied()
            .take_while(|d| *d <= today)
            .collect()
    }

    /// Every date on which any track meets, in order
    pub fn class_dates(&self) -> Vec<NaiveDate> {
        let all = self
            .regular
            .iter()
            .chain(&self.temple_prep)
            .chain(&self.mission_prep)
            .copied()
            .collect();
        normalize(all)
    }

    /// Tracks that meet on `date`
    pub fn tracks_on(&self, date: NaiveDate) -> Vec<Track> {
        [Track::Regular, Track::TemplePrep, Track::MissionPrep]
            .into_iter()
            .filter(|t| self.dates(*t).binary_search(&date).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_calendar_lengths() {
        let cal = TermCalendar::default();
        assert_eq!(cal.dates(Track::Regular).len(), 6);
        assert_eq!(cal.dates(Track::TemplePrep).len(), 5);
        assert_eq!(cal.dates(Track::MissionPrep).len(), 8);
    }

    #[test]
    fn test_weeks_in_range_unbounded_is_full_term() {
        let cal = TermCalendar::default();
        let all = DateRange::default();
        assert_eq!(cal.weeks_in_range(Track::TemplePrep, &all), 5);
        assert_eq!(cal.weeks_in_range(Track::MissionPrep, &all), 8);
    }

    #[test]
    fn test_weeks_in_range_filters_dates() {
        let cal = TermCalendar::default();
        let range = DateRange::between(d("2026-03-01"), d("2026-03-22"));
        assert_eq!(cal.weeks_in_range(Track::TemplePrep, &range), 3);
        assert_eq!(cal.weeks_in_range(Track::MissionPrep, &range), 4);

        let single = DateRange::single(d("2026-02-01"));
        assert_eq!(cal.weeks_in_range(Track::TemplePrep, &single), 0);
    }

    #[test]
    fn test_dates_through() {
        let cal = TermCalendar::default();
        assert!(cal.dates_through(Track::Regular, d("2026-01-17")).is_empty());
        assert_eq!(cal.dates_through(Track::Regular, d("2026-02-15")).len(), 3);
        assert_eq!(cal.dates_through(Track::Regular, d("2027-01-01")).len(), 6);
    }

    #[test]
    fn test_class_dates_union() {
        let cal = TermCalendar::default();
        let dates = cal.class_dates();
        assert_eq!(dates.len(), 10);
        assert_eq!(dates.first(), Some(&d("2026-01-18")));
        assert_eq!(dates.last(), Some(&d("2026-04-05")));
        assert_eq!(cal.tracks_on(d("2026-03-22")), vec![Track::MissionPrep]);
        assert_eq!(cal.tracks_on(d("2026-04-05")), vec![Track::Regular, Track::MissionPrep]);
    }

    #[test]
    fn test_load_sorts_and_dedups() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"regular": ["2026-09-14", "2026-09-07", "2026-09-14"], "templePrep": ["2026-10-05"]}}"#
        )
        .unwrap();

        let cal = TermCalendar::load(file.path()).unwrap();
        assert_eq!(cal.dates(Track::Regular), &[d("2026-09-07"), d("2026-09-14")]);
        assert_eq!(cal.dates(Track::TemplePrep), &[d("2026-10-05")]);
        assert!(cal.dates(Track::MissionPrep).is_empty());
    }

    #[test]
    fn test_load_rejects_bad_dates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"regular": ["not-a-date"]}}"#).unwrap();
        assert!(TermCalendar::load(file.path()).is_err());
    }
}
