//! Missed-class ranking for regular-track members.
//!
//! Only regular-track calendar dates on or before "today" count. A member who
//! attended all of them is left out; everyone else is ranked by classes
//! missed (most first), then by name.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::TermCalendar;
use crate::models::{Attendance, Member, Sex, Track};

/// How worrying a member's absences are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export, rename_all = "lowercase"))]
pub enum Risk {
    /// Missed exactly half of the classes so far
    Elevated,
    /// Missed more than half
    High,
}

impl Risk {
    /// Classify `missed` out of `held` classes. Nobody is classified before
    /// the first class.
    pub fn classify(missed: usize, held: usize) -> Option<Risk> {
        if held == 0 {
            return None;
        }
        match (missed * 2).cmp(&held) {
            std::cmp::Ordering::Greater => Some(Risk::High),
            std::cmp::Ordering::Equal => Some(Risk::Elevated),
            std::cmp::Ordering::Less => None,
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::Elevated => write!(f, "elevated"),
            Risk::High => write!(f, "high"),
        }
    }
}

impl FromStr for Risk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "yellow"/"red" are the dashboard's row colours
        match s.trim().to_ascii_lowercase().as_str() {
            "elevated" | "yellow" => Ok(Risk::Elevated),
            "high" | "red" => Ok(Risk::High),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MissedEntry {
    pub member_id: i64,
    pub name: String,
    #[serde(rename = "gender")]
    pub sex: Sex,
    pub attended_count: usize,
    pub missed_count: usize,
    /// Whole percent of classes so far that were missed
    pub missed_rate: u32,
    pub risk: Option<Risk>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MissedRanking {
    /// Regular classes held on or before the reference date
    pub classes_so_far: usize,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub as_of: NaiveDate,
    pub members: Vec<MissedEntry>,
}

impl MissedRanking {
    pub fn compute(
        calendar: &TermCalendar,
        members: &[Member],
        attendance: &[Attendance],
        today: NaiveDate,
    ) -> Self {
        let held = calendar.dates_through(Track::Regular, today);
        let classes_so_far = held.len();

        if classes_so_far == 0 {
            return Self {
                classes_so_far,
                as_of: today,
                members: Vec::new(),
            };
        }

        let held_set: HashSet<NaiveDate> = held.into_iter().collect();
        let present: HashSet<(i64, NaiveDate)> = attendance
            .iter()
            .filter(|a| a.present && held_set.contains(&a.date))
            .map(|a| (a.member_id, a.date))
            .collect();

        let mut entries: Vec<MissedEntry> = members
            .iter()
            .filter(|m| m.is_regular())
            .filter_map(|m| {
                let attended = held_set
                    .iter()
                    .filter(|date| present.contains(&(m.id, **date)))
                    .count();
                let missed = classes_so_far - attended;
                if missed == 0 {
                    return None;
                }
                Some(MissedEntry {
                    member_id: m.id,
                    name: m.name.clone(),
                    sex: m.sex,
                    attended_count: attended,
                    missed_count: missed,
                    missed_rate: ((missed as f64 * 100.0) / classes_so_far as f64).round() as u32,
                    risk: Risk::classify(missed, classes_so_far),
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.missed_count
                .cmp(&a.missed_count)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.member_id.cmp(&b.member_id))
        });

        Self {
            classes_so_far,
            as_of: today,
            members: entries,
        }
    }

    /// Narrow the ranking without touching order or counts
    pub fn apply(mut self, filter: &MissedFilter) -> Self {
        self.members.retain(|e| filter.matches(e));
        self
    }
}

/// Optional post-hoc filters over a ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissedFilter {
    pub sex: Option<Sex>,
    pub risk: Option<Risk>,
}

impl MissedFilter {
    pub fn matches(&self, entry: &MissedEntry) -> bool {
        self.sex.map_or(true, |s| entry.sex == s)
            && self.risk.map_or(true, |r| entry.risk == Some(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::{d, member, record};

    /// Four regular classes have been held by 2026-03-01
    fn as_of() -> NaiveDate {
        d("2026-03-01")
    }

    const HELD: [&str; 4] = ["2026-01-18", "2026-02-01", "2026-02-15", "2026-03-01"];

    fn attended(member_id: i64, count: usize, first_id: i64) -> Vec<Attendance> {
        HELD.iter()
            .enumerate()
            .map(|(i, date)| record(first_id + i as i64, member_id, date, i < count, false))
            .collect()
    }

    #[test]
    fn test_risk_classify() {
        assert_eq!(Risk::classify(2, 4), Some(Risk::Elevated));
        assert_eq!(Risk::classify(3, 4), Some(Risk::High));
        assert_eq!(Risk::classify(1, 4), None);
        assert_eq!(Risk::classify(0, 0), None);
        assert_eq!(Risk::classify(2, 3), Some(Risk::High));
        assert_eq!(Risk::classify(1, 3), None);
    }

    #[test]
    fn test_ranking_classification() {
        let members = vec![
            member(1, "Half", Sex::Male, Track::Regular),
            member(2, "One", Sex::Female, Track::Regular),
            member(3, "Perfect", Sex::Male, Track::Regular),
        ];
        let mut attendance = attended(1, 2, 100);
        attendance.extend(attended(2, 1, 200));
        attendance.extend(attended(3, 4, 300));

        let ranking = MissedRanking::compute(&TermCalendar::default(), &members, &attendance, as_of());

        assert_eq!(ranking.classes_so_far, 4);
        assert_eq!(ranking.members.len(), 2);

        let one = &ranking.members[0];
        assert_eq!(one.member_id, 2);
        assert_eq!(one.missed_count, 3);
        assert_eq!(one.missed_rate, 75);
        assert_eq!(one.risk, Some(Risk::High));

        let half = &ranking.members[1];
        assert_eq!(half.member_id, 1);
        assert_eq!(half.attended_count, 2);
        assert_eq!(half.risk, Some(Risk::Elevated));

        assert!(ranking.members.iter().all(|e| e.member_id != 3));
    }

    #[test]
    fn test_ties_sort_by_name() {
        let members = vec![
            member(1, "Zed", Sex::Male, Track::Regular),
            member(2, "Amy", Sex::Female, Track::Regular),
        ];
        let ranking = MissedRanking::compute(&TermCalendar::default(), &members, &[], as_of());
        let names: Vec<&str> = ranking.members.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
        assert!(ranking.members.iter().all(|e| e.missed_count == 4));
    }

    #[test]
    fn test_only_regular_members_and_held_dates_count() {
        let members = vec![
            member(1, "Regular", Sex::Male, Track::Regular),
            member(2, "Mission", Sex::Male, Track::MissionPrep),
        ];
        // 2026-02-22 is not a regular class; 2026-04-05 is after as_of
        let attendance = vec![
            record(1, 1, "2026-02-22", true, false),
            record(2, 1, "2026-04-05", true, false),
            record(3, 1, "2026-01-18", true, false),
        ];
        let ranking = MissedRanking::compute(&TermCalendar::default(), &members, &attendance, as_of());
        assert_eq!(ranking.members.len(), 1);
        assert_eq!(ranking.members[0].attended_count, 1);
        assert_eq!(ranking.members[0].missed_count, 3);
    }

    #[test]
    fn test_before_first_class_is_empty() {
        let members = vec![member(1, "A", Sex::Male, Track::Regular)];
        let ranking =
            MissedRanking::compute(&TermCalendar::default(), &members, &[], d("2026-01-01"));
        assert_eq!(ranking.classes_so_far, 0);
        assert!(ranking.members.is_empty());
    }

    #[test]
    fn test_filters_keep_order() {
        let members = vec![
            member(1, "Bob", Sex::Male, Track::Regular),
            member(2, "Cat", Sex::Female, Track::Regular),
            member(3, "Dan", Sex::Male, Track::Regular),
        ];
        let mut attendance = attended(1, 2, 100);
        attendance.extend(attended(2, 0, 200));
        attendance.extend(attended(3, 1, 300));

        let ranking = MissedRanking::compute(&TermCalendar::default(), &members, &attendance, as_of());

        let males = ranking.clone().apply(&MissedFilter {
            sex: Some(Sex::Male),
            risk: None,
        });
        let names: Vec<&str> = males.members.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dan", "Bob"]);

        let high = ranking.clone().apply(&MissedFilter {
            sex: None,
            risk: Some(Risk::High),
        });
        let names: Vec<&str> = high.members.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Cat", "Dan"]);
        assert_eq!(high.members[0].missed_count, 4);

        let male_elevated = ranking.apply(&MissedFilter {
            sex: Some(Sex::Male),
            risk: Some(Risk::Elevated),
        });
        assert_eq!(male_elevated.members.len(), 1);
        assert_eq!(male_elevated.members[0].name, "Bob");
    }

    #[test]
    fn test_risk_from_str() {
        assert_eq!("red".parse::<Risk>(), Ok(Risk::High));
        assert_eq!("Elevated".parse::<Risk>(), Ok(Risk::Elevated));
        assert!("green".parse::<Risk>().is_err());
        // unflagged members have no risk level to filter on
        assert!("normal".parse::<Risk>().is_err());
    }
}
