//! Spreadsheet-shaped attendance reports.
//!
//! Reports are plain grids of JSON cell values so they can be written to a
//! sheet verbatim. The first row is always the header.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::{AttendanceWithMember, Member};
use crate::utils::{format_report_date, percent, yes_no};

const RANGE_HEADER: [&str; 8] = [
    "Date",
    "Name",
    "Gender",
    "Category",
    "Present",
    "Read Assignment",
    "Email",
    "Phone",
];

const DATE_HEADER: [&str; 5] = ["Name", "Gender", "Category", "Present", "Read Assignment"];

#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub rows: Vec<Vec<Value>>,
    /// Width of the header row
    pub columns: usize,
}

impl SheetReport {
    fn with_header(header: &[&str]) -> Self {
        Self {
            rows: vec![header.iter().map(|h| json!(h)).collect()],
            columns: header.len(),
        }
    }

    fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    fn push_summary(&mut self, lines: Vec<(&str, Value)>) {
        self.rows.push(Vec::new());
        self.rows.push(vec![json!("SUMMARY")]);
        for (label, value) in lines {
            self.rows.push(vec![json!(label), value]);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn rate_cell(part: u64, whole: u64) -> Value {
    json!(format!("{:.1}%", percent(part, whole)))
}

/// Sheet name used for a single-date export, e.g. "Attendance Feb 01 2026"
pub fn date_sheet_name(date: NaiveDate) -> String {
    format!("Attendance {}", date.format("%b %d %Y"))
}

/// Every record in the range, one row each, followed by a summary block
pub fn range_report(records: &[AttendanceWithMember]) -> SheetReport {
    let mut ordered: Vec<&AttendanceWithMember> = records.iter().collect();
    ordered.sort_by(|a, b| {
        a.record.date.cmp(&b.record.date).then_with(|| {
            let a_name = a.member.as_ref().map(|m| m.name.as_str());
            let b_name = b.member.as_ref().map(|m| m.name.as_str());
            a_name.cmp(&b_name)
        })
    });

    let mut report = SheetReport::with_header(&RANGE_HEADER);
    for entry in &ordered {
        let record = &entry.record;
        let member = entry.member.as_ref();
        report.push(vec![
            json!(format_report_date(record.date)),
            json!(member.map_or("", |m| m.name.as_str())),
            json!(member.map_or("", |m| m.sex.label())),
            json!(member.map_or("", |m| m.track.label())),
            json!(yes_no(record.present)),
            json!(yes_no(record.read_assignment)),
            json!(member.and_then(|m| m.email.as_deref()).unwrap_or("")),
            json!(member.and_then(|m| m.phone.as_deref()).unwrap_or("")),
        ]);
    }

    let total = records.len() as u64;
    let present = records.iter().filter(|r| r.record.present).count() as u64;
    let read = records
        .iter()
        .filter(|r| r.record.present && r.record.read_assignment)
        .count() as u64;

    report.push_summary(vec![
        ("Total Records:", json!(total)),
        ("Present Count:", json!(present)),
        ("Attendance Rate:", rate_cell(present, total)),
        ("Read Assignment:", json!(read)),
        ("Reading Rate:", rate_cell(read, present)),
    ]);
    report
}

/// One row per member for a single date. Members without a record count as
/// absent.
pub fn date_report(members: &[Member], records: &[AttendanceWithMember]) -> SheetReport {
    let by_member: HashMap<i64, &AttendanceWithMember> =
        records.iter().map(|r| (r.record.member_id, r)).collect();

    let mut ordered: Vec<&Member> = members.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut report = SheetReport::with_header(&DATE_HEADER);
    let mut present = 0u64;
    let mut read = 0u64;

    for member in ordered {
        let record = by_member.get(&member.id).map(|r| &r.record);
        let is_present = record.is_some_and(|r| r.present);
        let has_read = record.is_some_and(|r| r.read_assignment);
        if is_present {
            present += 1;
            if has_read {
                read += 1;
            }
        }
        report.push(vec![
            json!(member.name),
            json!(member.sex.label()),
            json!(member.track.label()),
            json!(yes_no(is_present)),
            json!(yes_no(has_read)),
        ]);
    }

    let total = members.len() as u64;
    report.push_summary(vec![
        ("Total Members:", json!(total)),
        ("Present:", json!(present)),
        ("Attendance Rate:", rate_cell(present, total)),
        ("Read Assignment:", json!(read)),
    ]);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sex, Track};
    use crate::stats::tests::{d, member, record};

    fn joined(id: i64, m: &Member, date: &str, present: bool, read: bool) -> AttendanceWithMember {
        AttendanceWithMember {
            record: record(id, m.id, date, present, read),
            member: Some(m.clone()),
        }
    }

    #[test]
    fn test_range_report_rows_and_summary() {
        let zoe = member(1, "Zoe", Sex::Female, Track::TemplePrep);
        let abe = member(2, "Abe", Sex::Male, Track::Regular);
        let records = vec![
            joined(1, &zoe, "2026-02-15", true, true),
            joined(2, &zoe, "2026-02-01", false, false),
            joined(3, &abe, "2026-02-15", true, false),
        ];

        let report = range_report(&records);
        assert_eq!(report.columns, 8);
        assert_eq!(report.rows[0][0], json!("Date"));
        // header + 3 rows + blank + SUMMARY + 5 lines
        assert_eq!(report.len(), 11);

        assert_eq!(report.rows[1][0], json!("Feb 01, 2026"));
        assert_eq!(report.rows[2][1], json!("Abe"));
        assert_eq!(report.rows[3][1], json!("Zoe"));
        assert_eq!(report.rows[3][3], json!("TEMPLE PREP"));
        assert_eq!(report.rows[3][2], json!("FEMALE"));
        assert_eq!(report.rows[3][4], json!("Yes"));

        assert!(report.rows[4].is_empty());
        assert_eq!(report.rows[5], vec![json!("SUMMARY")]);
        assert_eq!(report.rows[6], vec![json!("Total Records:"), json!(3)]);
        assert_eq!(report.rows[7], vec![json!("Present Count:"), json!(2)]);
        assert_eq!(report.rows[8], vec![json!("Attendance Rate:"), json!("66.7%")]);
        assert_eq!(report.rows[9], vec![json!("Read Assignment:"), json!(1)]);
        assert_eq!(report.rows[10], vec![json!("Reading Rate:"), json!("50.0%")]);
    }

    #[test]
    fn test_empty_range_report_has_zero_rates() {
        let report = range_report(&[]);
        assert_eq!(report.len(), 8);
        assert_eq!(report.rows[5], vec![json!("Attendance Rate:"), json!("0.0%")]);
    }

    #[test]
    fn test_date_report_marks_missing_as_absent() {
        let members = vec![
            member(1, "Cara", Sex::Female, Track::Regular),
            member(2, "Ben", Sex::Male, Track::MissionPrep),
            member(3, "Al", Sex::Male, Track::Regular),
        ];
        let records = vec![
            joined(1, &members[0], "2026-02-01", true, true),
            joined(2, &members[1], "2026-02-01", false, true),
        ];

        let report = date_report(&members, &records);
        assert_eq!(report.columns, 5);
        assert_eq!(report.rows[1], vec![json!("Al"), json!("MALE"), json!("REGULAR"), json!("No"), json!("No")]);
        assert_eq!(report.rows[2][2], json!("MISSION PREP"));
        assert_eq!(report.rows[3][3], json!("Yes"));

        let summary = &report.rows[report.len() - 4..];
        assert_eq!(summary[0], vec![json!("Total Members:"), json!(3)]);
        assert_eq!(summary[1], vec![json!("Present:"), json!(1)]);
        assert_eq!(summary[2], vec![json!("Attendance Rate:"), json!("33.3%")]);
        assert_eq!(summary[3], vec![json!("Read Assignment:"), json!(1)]);
    }

    #[test]
    fn test_date_report_without_members() {
        let report = date_report(&[], &[]);
        assert_eq!(report.rows[5], vec![json!("Attendance Rate:"), json!("0.0%")]);
    }

    #[test]
    fn test_date_sheet_name() {
        assert_eq!(date_sheet_name(d("2026-02-01")), "Attendance Feb 01 2026");
    }
}
