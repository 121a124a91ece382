//! Attendance statistics.
//!
//! Both computations here are pure functions of the roster, the attendance
//! records and the term calendar. They never fail: missing members, empty
//! rosters and empty ranges all produce zero-valued results.
//!
//! - `AttendanceStats`: membership and attendance counts plus rates
//! - `MissedRanking`: regular members ordered by classes missed so far

pub mod missed;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::calendar::TermCalendar;
use crate::models::{Attendance, DateRange, Member, Sex, Track};
use crate::utils::percent;

pub use missed::{MissedEntry, MissedFilter, MissedRanking, Risk};

/// Percentages (one decimal) derived from the counts. Zero whenever the
/// denominator is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceRates {
    pub attendance: f64,
    pub assignment: f64,
    pub male: f64,
    pub female: f64,
    pub temple_prep: f64,
    pub mission_prep: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttendanceStats {
    // roster, regular track only
    pub total_members: u64,
    pub male_members: u64,
    pub female_members: u64,

    // roster, preparatory tracks
    pub temple_prep_members: u64,
    pub mission_prep_members: u64,

    /// regular members × distinct dates observed
    pub total_attendance_slots: u64,

    // regular-track attendance
    pub present_count: u64,
    pub read_assignment_count: u64,
    pub male_attendance: u64,
    pub female_attendance: u64,

    // preparatory attendance, any sex
    pub temple_prep_attendance: u64,
    pub mission_prep_attendance: u64,

    pub dates_included: u64,
    pub temple_prep_weeks: u64,
    pub mission_prep_weeks: u64,

    pub rates: AttendanceRates,
}

impl AttendanceStats {
    /// Aggregate the roster and the attendance records falling in `range`.
    ///
    /// Records whose member is not in `members` still count toward
    /// `dates_included` but toward nothing that needs the member's category.
    pub fn compute(
        calendar: &TermCalendar,
        range: &DateRange,
        members: &[Member],
        attendance: &[Attendance],
    ) -> Self {
        let mut s = AttendanceStats::default();

        for m in members {
            match m.track {
                Track::Regular => {
                    s.total_members += 1;
                    match m.sex {
                        Sex::Male => s.male_members += 1,
                        Sex::Female => s.female_members += 1,
                    }
                }
                Track::TemplePrep => s.temple_prep_members += 1,
                Track::MissionPrep => s.mission_prep_members += 1,
            }
        }

        let by_id: HashMap<i64, &Member> = members.iter().map(|m| (m.id, m)).collect();
        let mut dates = HashSet::new();

        for record in attendance.iter().filter(|a| range.contains(a.date)) {
            dates.insert(record.date);

            if !record.present {
                continue;
            }
            let Some(member) = by_id.get(&record.member_id) else {
                continue;
            };

            match member.track {
                Track::Regular => {
                    s.present_count += 1;
                    if record.read_assignment {
                        s.read_assignment_count += 1;
                    }
                    match member.sex {
                        Sex::Male => s.male_attendance += 1,
                        Sex::Female => s.female_attendance += 1,
                    }
                }
                Track::TemplePrep => s.temple_prep_attendance += 1,
                Track::MissionPrep => s.mission_prep_attendance += 1,
            }
        }

        s.dates_included = dates.len() as u64;
        s.total_attendance_slots = s.total_members * s.dates_included;
        s.temple_prep_weeks = calendar.weeks_in_range(Track::TemplePrep, range) as u64;
        s.mission_prep_weeks = calendar.weeks_in_range(Track::MissionPrep, range) as u64;
        s.rates = s.derive_rates();
        s
    }

    fn derive_rates(&self) -> AttendanceRates {
        AttendanceRates {
            attendance: percent(self.present_count, self.total_attendance_slots),
            assignment: percent(self.read_assignment_count, self.present_count),
            male: percent(self.male_attendance, self.male_members * self.dates_included),
            female: percent(self.female_attendance, self.female_members * self.dates_included),
            temple_prep: percent(
                self.temple_prep_attendance,
                self.temple_prep_members * self.temple_prep_weeks,
            ),
            mission_prep: percent(
                self.mission_prep_attendance,
                self.mission_prep_members * self.mission_prep_weeks,
            ),
        }
    }

    /// Regular-track slots that were not marked present
    pub fn absent_count(&self) -> u64 {
        self.total_attendance_slots.saturating_sub(self.present_count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    pub(crate) fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn member(id: i64, name: &str, sex: Sex, track: Track) -> Member {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Member {
            id,
            name: name.to_string(),
            sex,
            track,
            email: None,
            phone: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub(crate) fn record(id: i64, member_id: i64, date: &str, present: bool, read: bool) -> Attendance {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Attendance {
            id,
            member_id,
            date: d(date),
            present,
            read_assignment: read,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// 6 male + 4 female regular members
    fn regular_roster() -> Vec<Member> {
        (1..=10)
            .map(|i| {
                let sex = if i <= 6 { Sex::Male } else { Sex::Female };
                member(i, &format!("Member {:02}", i), sex, Track::Regular)
            })
            .collect()
    }

    #[test]
    fn test_empty_inputs_are_all_zero() {
        let stats = AttendanceStats::compute(
            &TermCalendar::default(),
            &DateRange::between(d("2026-02-01"), d("2026-02-01")),
            &[],
            &[],
        );
        assert_eq!(stats.total_attendance_slots, 0);
        assert_eq!(stats.rates, AttendanceRates::default());
    }

    #[test]
    fn test_roster_without_records_has_zero_rates() {
        let members = regular_roster();
        let stats = AttendanceStats::compute(
            &TermCalendar::default(),
            &DateRange::default(),
            &members,
            &[],
        );
        assert_eq!(stats.total_members, 10);
        assert_eq!(stats.dates_included, 0);
        assert_eq!(stats.total_attendance_slots, 0);
        assert_eq!(stats.rates, AttendanceRates::default());
        assert!(stats.rates.attendance.is_finite());
    }

    #[test]
    fn test_ten_members_two_dates_fourteen_present() {
        let members = regular_roster();
        let mut attendance = Vec::new();
        let mut id = 0;
        // first date: members 1..=8 present, second date: 1..=6 present
        for (date, present_upto) in [("2026-02-01", 8), ("2026-02-15", 6)] {
            for m in 1..=10 {
                id += 1;
                attendance.push(record(id, m, date, m <= present_upto, m <= 3));
            }
        }

        let stats = AttendanceStats::compute(
            &TermCalendar::default(),
            &DateRange::default(),
            &members,
            &attendance,
        );

        assert_eq!(stats.total_members, 10);
        assert_eq!(stats.male_members, 6);
        assert_eq!(stats.female_members, 4);
        assert_eq!(stats.dates_included, 2);
        assert_eq!(stats.total_attendance_slots, 20);
        assert_eq!(stats.present_count, 14);
        assert_eq!(stats.rates.attendance, 70.0);
        assert_eq!(stats.male_attendance, 12);
        assert_eq!(stats.female_attendance, 2);
        assert_eq!(stats.rates.male, 100.0);
        assert_eq!(stats.rates.female, 25.0);
        assert_eq!(stats.read_assignment_count, 6);
        assert!(stats.read_assignment_count <= stats.present_count);
        assert_eq!(stats.absent_count(), 6);
    }

    #[test]
    fn test_read_without_present_is_not_counted() {
        let members = vec![member(1, "A", Sex::Male, Track::Regular)];
        let attendance = vec![record(1, 1, "2026-02-01", false, true)];
        let stats = AttendanceStats::compute(
            &TermCalendar::default(),
            &DateRange::default(),
            &members,
            &attendance,
        );
        assert_eq!(stats.present_count, 0);
        assert_eq!(stats.read_assignment_count, 0);
        assert_eq!(stats.rates.assignment, 0.0);
    }

    #[test]
    fn test_preparatory_counts_ignore_sex_and_use_calendar_weeks() {
        let members = vec![
            member(1, "Temple M", Sex::Male, Track::TemplePrep),
            member(2, "Temple F", Sex::Female, Track::TemplePrep),
            member(3, "Mission", Sex::Male, Track::MissionPrep),
            member(4, "Regular", Sex::Female, Track::Regular),
        ];
        let attendance = vec![
            record(1, 1, "2026-02-15", true, false),
            record(2, 2, "2026-02-15", true, true),
            record(3, 3, "2026-02-22", true, false),
            record(4, 3, "2026-03-01", false, false),
        ];
        let range = DateRange::between(d("2026-02-15"), d("2026-03-01"));
        let stats = AttendanceStats::compute(&TermCalendar::default(), &range, &members, &attendance);

        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.temple_prep_members, 2);
        assert_eq!(stats.mission_prep_members, 1);
        assert_eq!(stats.temple_prep_attendance, 2);
        assert_eq!(stats.mission_prep_attendance, 1);
        assert_eq!(stats.temple_prep_weeks, 3);
        assert_eq!(stats.mission_prep_weeks, 3);
        // distinct observed dates, not calendar dates
        assert_eq!(stats.dates_included, 3);
        assert_eq!(stats.present_count, 0);
        assert_eq!(stats.rates.temple_prep, 33.3);
        assert_eq!(stats.rates.mission_prep, 33.3);
    }

    #[test]
    fn test_range_filters_records_not_roster() {
        let members = regular_roster();
        let attendance = vec![
            record(1, 1, "2026-01-18", true, false),
            record(2, 1, "2026-02-01", true, false),
            record(3, 2, "2026-04-05", true, false),
        ];
        let range = DateRange::single(d("2026-02-01"));
        let stats = AttendanceStats::compute(&TermCalendar::default(), &range, &members, &attendance);
        assert_eq!(stats.total_members, 10);
        assert_eq!(stats.dates_included, 1);
        assert_eq!(stats.present_count, 1);
        assert_eq!(stats.total_attendance_slots, 10);
        assert_eq!(stats.rates.attendance, 10.0);
    }

    #[test]
    fn test_unresolved_member_degrades_quietly() {
        let members = vec![member(1, "A", Sex::Male, Track::Regular)];
        let attendance = vec![
            record(1, 1, "2026-02-01", true, true),
            record(2, 99, "2026-02-15", true, true),
        ];
        let stats = AttendanceStats::compute(
            &TermCalendar::default(),
            &DateRange::default(),
            &members,
            &attendance,
        );
        assert_eq!(stats.present_count, 1);
        assert_eq!(stats.dates_included, 2);
        assert_eq!(stats.total_attendance_slots, 2);
        assert_eq!(stats.rates.attendance, 50.0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = AttendanceStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalAttendanceSlots").is_some());
        assert!(json.get("templePrepWeeks").is_some());
        assert!(json["rates"].get("missionPrep").is_some());
    }
}
