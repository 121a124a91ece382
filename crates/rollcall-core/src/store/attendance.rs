use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use tracing::{debug, info};

use super::{RosterStore, StoreError};
use crate::models::{Attendance, AttendanceMark, AttendanceWithMember, DateRange, Member};

const UNKNOWN_MEMBER: &str = "Attendance references an unknown member";

/// Optional filters for listing attendance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub member_id: Option<i64>,
}

const JOINED_SELECT: &str = "
    SELECT a.id, a.member_id, a.date, a.present, a.read_assignment,
           a.created_at, a.updated_at,
           m.id AS m_id, m.name AS m_name, m.gender AS m_gender,
           m.category AS m_category, m.email AS m_email, m.phone AS m_phone,
           m.created_at AS m_created_at, m.updated_at AS m_updated_at
    FROM attendance a
    LEFT JOIN members m ON m.id = a.member_id";

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: row.get("id")?,
        member_id: row.get("member_id")?,
        date: row.get("date")?,
        present: row.get("present")?,
        read_assignment: row.get("read_assignment")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceWithMember> {
    let record = attendance_from_row(row)?;
    let member = match row.get::<_, Option<i64>>("m_id")? {
        Some(id) => Some(Member {
            id,
            name: row.get("m_name")?,
            sex: row.get("m_gender")?,
            track: row.get("m_category")?,
            email: row.get("m_email")?,
            phone: row.get("m_phone")?,
            created_at: row.get("m_created_at")?,
            updated_at: row.get("m_updated_at")?,
        }),
        None => None,
    };
    Ok(AttendanceWithMember { record, member })
}

fn fetch_joined(conn: &Connection, id: i64) -> Result<AttendanceWithMember, StoreError> {
    conn.query_row(
        &format!("{} WHERE a.id = ?1", JOINED_SELECT),
        params![id],
        joined_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound("Attendance record".to_string()))
}

impl RosterStore {
    /// Records with their members, newest date first
    pub fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceWithMember>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE (?1 IS NULL OR a.date = ?1) AND (?2 IS NULL OR a.member_id = ?2)
             ORDER BY a.date DESC, m.name ASC, a.id ASC",
            JOINED_SELECT
        ))?;
        let records = stmt
            .query_map(params![filter.date, filter.member_id], joined_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Records of one date, ordered by member name
    pub fn attendance_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceWithMember>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE a.date = ?1 ORDER BY m.name ASC, a.id ASC",
            JOINED_SELECT
        ))?;
        let records = stmt
            .query_map(params![date], joined_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Plain records inside `range`, oldest first. An unbounded range returns everything.
    pub fn attendance_in_range(&self, range: &DateRange) -> Result<Vec<Attendance>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, member_id, date, present, read_assignment, created_at, updated_at
             FROM attendance
             WHERE (?1 IS NULL OR date >= ?1) AND (?2 IS NULL OR date <= ?2)
             ORDER BY date ASC, id ASC",
        )?;
        let records = stmt
            .query_map(params![range.start, range.end], attendance_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Records with members inside `range`, ordered by date then member name
    pub fn attendance_report(
        &self,
        range: &DateRange,
    ) -> Result<Vec<AttendanceWithMember>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE (?1 IS NULL OR a.date >= ?1) AND (?2 IS NULL OR a.date <= ?2)
             ORDER BY a.date ASC, m.name ASC, a.id ASC",
            JOINED_SELECT
        ))?;
        let records = stmt
            .query_map(params![range.start, range.end], joined_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Create or update the record for (member, date).
    ///
    /// Returns the stored record and whether it was newly created.
    pub fn upsert_attendance(
        &self,
        date: NaiveDate,
        mark: AttendanceMark,
    ) -> Result<(AttendanceWithMember, bool), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM attendance WHERE member_id = ?1 AND date = ?2",
                params![mark.member_id, date],
                |row| row.get(0),
            )
            .optional()?;

        let (id, created) = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE attendance SET present = ?1, read_assignment = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![mark.present, mark.read_assignment, now, id],
                )?;
                (id, false)
            }
            None => {
                tx.execute(
                    "INSERT INTO attendance
                     (member_id, date, present, read_assignment, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![mark.member_id, date, mark.present, mark.read_assignment, now],
                )
                .map_err(|e| {
                    StoreError::from_constraint(e, "Attendance already recorded", UNKNOWN_MEMBER)
                })?;
                (tx.last_insert_rowid(), true)
            }
        };

        let record = fetch_joined(&tx, id)?;
        tx.commit()?;
        debug!(member_id = mark.member_id, %date, created, "Saved attendance");
        Ok((record, created))
    }

    /// Replace every record of `date` with `marks`, atomically.
    ///
    /// A mark naming an unknown member, or the same member twice, fails the
    /// whole call and leaves the date's previous records in place.
    pub fn replace_attendance_for_date(
        &self,
        date: NaiveDate,
        marks: &[AttendanceMark],
    ) -> Result<usize, StoreError> {
        let mut seen = HashSet::new();
        if let Some(dup) = marks.iter().find(|m| !seen.insert(m.member_id)) {
            return Err(StoreError::Invalid(format!(
                "Member {} appears more than once",
                dup.member_id
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM attendance WHERE date = ?1", params![date])?;

        let now = Utc::now();
        {
            let mut insert = tx.prepare(
                "INSERT INTO attendance
                 (member_id, date, present, read_assignment, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            )?;
            for mark in marks {
                insert
                    .execute(params![mark.member_id, date, mark.present, mark.read_assignment, now])
                    .map_err(|e| {
                        StoreError::from_constraint(e, "Attendance already recorded", UNKNOWN_MEMBER)
                    })?;
            }
        }
        tx.commit()?;

        info!(%date, removed, saved = marks.len(), "Replaced attendance for date");
        Ok(marks.len())
    }

    pub fn delete_attendance(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM attendance WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound("Attendance record".to_string()));
        }
        Ok(())
    }
}
