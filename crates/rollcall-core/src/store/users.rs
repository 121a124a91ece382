use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{RosterStore, StoreError};
use crate::models::User;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

impl RosterStore {
    /// Store a new account. The caller hashes the password.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now()],
        )
        .map_err(|e| StoreError::from_constraint(e, "Username already exists", "Invalid user"))?;

        let id = conn.last_insert_rowid();
        info!(id, username, "Created user");
        conn.query_row(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .map_err(StoreError::from)
    }

    pub fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find_user() {
        let store = RosterStore::open_in_memory().unwrap();
        let user = store.create_user("admin", "hash").unwrap();
        assert_eq!(user.username, "admin");

        let found = store.find_user("admin").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");
        assert!(store.find_user("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let store = RosterStore::open_in_memory().unwrap();
        store.create_user("admin", "hash").unwrap();
        let err = store.create_user("admin", "other").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
