use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{RosterStore, StoreError};
use crate::models::{Member, NewMember};

pub(crate) const MEMBER_COLUMNS: &str =
    "id, name, gender, category, email, phone, created_at, updated_at";

pub(crate) fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get("id")?,
        name: row.get("name")?,
        sex: row.get("gender")?,
        track: row.get("category")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn fetch_member(conn: &Connection, id: i64) -> Result<Member, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS),
        params![id],
        member_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound("Member".to_string()))
}

fn insert_member(conn: &Connection, input: &NewMember) -> Result<i64, StoreError> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO members (name, gender, category, email, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![input.name, input.sex, input.track, input.email, input.phone, now],
    )?;
    Ok(conn.last_insert_rowid())
}

fn validated(input: NewMember) -> Result<NewMember, StoreError> {
    input
        .validate()
        .map_err(|e| StoreError::Invalid(e.to_string()))
}

impl RosterStore {
    /// All members, ordered by name
    pub fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM members ORDER BY name ASC, id ASC",
            MEMBER_COLUMNS
        ))?;
        let members = stmt
            .query_map([], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    pub fn get_member(&self, id: i64) -> Result<Member, StoreError> {
        let conn = self.conn()?;
        fetch_member(&conn, id)
    }

    pub fn create_member(&self, input: NewMember) -> Result<Member, StoreError> {
        let input = validated(input)?;
        let conn = self.conn()?;
        let id = insert_member(&conn, &input)?;
        debug!(id, name = %input.name, "Created member");
        fetch_member(&conn, id)
    }

    /// Insert many members in one transaction. Any invalid entry rejects
    /// the whole batch.
    pub fn create_members(&self, inputs: Vec<NewMember>) -> Result<usize, StoreError> {
        let inputs = inputs
            .into_iter()
            .map(validated)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for input in &inputs {
            insert_member(&tx, input)?;
        }
        tx.commit()?;

        info!(count = inputs.len(), "Imported members");
        Ok(inputs.len())
    }

    /// Replace every field of an existing member
    pub fn update_member(&self, id: i64, input: NewMember) -> Result<Member, StoreError> {
        let input = validated(input)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE members
             SET name = ?1, gender = ?2, category = ?3, email = ?4, phone = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                input.name,
                input.sex,
                input.track,
                input.email,
                input.phone,
                Utc::now(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("Member".to_string()));
        }
        fetch_member(&conn, id)
    }

    /// Delete a member and, through the foreign key, their attendance
    pub fn delete_member(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM members WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound("Member".to_string()));
        }
        debug!(id, "Deleted member");
        Ok(())
    }

    /// Clear the roster and all attendance. Returns the number of members removed.
    pub fn delete_all_members(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let records = tx.execute("DELETE FROM attendance", [])?;
        let members = tx.execute("DELETE FROM members", [])?;
        tx.commit()?;

        info!(members, records, "Deleted all members");
        Ok(members)
    }
}
