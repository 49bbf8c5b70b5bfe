//! SQLite database for BugTrack state persistence

use crate::types::{Bug, BugMeta, BugSpec, BugStatus, User};
use crate::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for state persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Bugs table
            CREATE TABLE IF NOT EXISTS bugs (
                id TEXT PRIMARY KEY,
                spec TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                generation INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_bugs_state ON bugs(json_extract(status, '$.state'));
            CREATE INDEX IF NOT EXISTS idx_bugs_assignee ON bugs(json_extract(spec, '$.assignee'));

            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                handle TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_handle ON users(handle);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Bug operations
    // ========================================================================

    /// Insert a bug
    pub fn insert_bug(&self, bug: &Bug) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO bugs (id, spec, status, created_at, updated_at, generation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                bug.meta.id,
                serde_json::to_string(&bug.spec)?,
                serde_json::to_string(&bug.status)?,
                bug.meta.created_at,
                bug.meta.updated_at,
                bug.meta.generation,
            ],
        )?;

        debug!("Inserted bug {}", bug.meta.id);
        Ok(())
    }

    /// Get a bug by ID
    pub fn get_bug(&self, id: &str) -> Result<Option<Bug>> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT id, spec, status, created_at, updated_at, generation
                 FROM bugs WHERE id = ?1",
                params![id],
                |row| {
                    Ok(RawBugRow {
                        id: row.get(0)?,
                        spec: row.get(1)?,
                        status: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                        generation: row.get(5)?,
                    })
                },
            )
            .optional()?;

        match row {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }

    /// List all bugs, newest first. `created_at` has second resolution, so
    /// insertion order breaks ties.
    pub fn list_bugs(&self) -> Result<Vec<Bug>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, spec, status, created_at, updated_at, generation
             FROM bugs ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RawBugRow {
                id: row.get(0)?,
                spec: row.get(1)?,
                status: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
                generation: row.get(5)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.parse()?);
        }

        Ok(results)
    }

    /// Rewrite a bug's spec, status and meta columns
    pub fn update_bug(&self, bug: &Bug) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "UPDATE bugs SET spec = ?1, status = ?2, updated_at = ?3, generation = ?4
             WHERE id = ?5",
            params![
                serde_json::to_string(&bug.spec)?,
                serde_json::to_string(&bug.status)?,
                bug.meta.updated_at,
                bug.meta.generation,
                bug.meta.id,
            ],
        )?;

        debug!("Updated bug {}", bug.meta.id);
        Ok(())
    }

    /// Delete a bug. Returns false if the id was unknown.
    pub fn delete_bug(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM bugs WHERE id = ?1", params![id])?;

        if rows > 0 {
            debug!("Deleted bug {}", id);
        }

        Ok(rows > 0)
    }

    /// Count all bugs
    pub fn count_bugs(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM bugs", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a user
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO users (id, handle, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user.id, user.handle, user.display_name, user.created_at],
        )?;

        debug!("Inserted user {}", user.handle);
        Ok(())
    }

    /// Get a user by handle
    pub fn get_user_by_handle(&self, handle: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();

        let user = conn
            .query_row(
                "SELECT id, handle, display_name, created_at FROM users WHERE handle = ?1",
                params![handle],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        handle: row.get(1)?,
                        display_name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// List all users, oldest first (stable assignee ordering)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, handle, display_name, created_at FROM users ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                handle: row.get(1)?,
                display_name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Check if a user handle is taken
    pub fn user_handle_exists(&self, handle: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE handle = ?1",
            params![handle],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Raw database row before parsing
struct RawBugRow {
    id: String,
    spec: String,
    status: String,
    created_at: i64,
    updated_at: i64,
    generation: i64,
}

impl RawBugRow {
    fn parse(self) -> Result<Bug> {
        let spec: BugSpec = serde_json::from_str(&self.spec)?;
        let status: BugStatus = serde_json::from_str(&self.status)?;
        Ok(Bug {
            meta: BugMeta {
                id: self.id,
                created_at: self.created_at,
                updated_at: self.updated_at,
                generation: self.generation,
            },
            spec,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BugState, Priority, Severity};

    fn bug(title: &str) -> Bug {
        Bug {
            meta: BugMeta::new(),
            spec: BugSpec {
                title: title.to_string(),
                description: "something is off".to_string(),
                priority: Priority::Low,
                severity: Severity::Trivial,
                assignee: None,
                environment: None,
                steps: None,
                expected: None,
                actual: None,
            },
            status: BugStatus::default(),
        }
    }

    #[test]
    fn bug_crud_round_trip() {
        let db = Database::open_memory().unwrap();

        let b = bug("Scrollbar flickers");
        db.insert_bug(&b).unwrap();

        let fetched = db.get_bug(&b.meta.id).unwrap().unwrap();
        assert_eq!(fetched.spec.title, "Scrollbar flickers");
        assert_eq!(fetched.status.state, BugState::Open);
        assert_eq!(fetched.meta.generation, 1);

        assert_eq!(db.count_bugs().unwrap(), 1);

        assert!(db.delete_bug(&b.meta.id).unwrap());
        assert!(!db.delete_bug(&b.meta.id).unwrap());
        assert_eq!(db.count_bugs().unwrap(), 0);
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::open_memory().unwrap();

        let first = bug("first");
        let second = bug("second");
        db.insert_bug(&first).unwrap();
        db.insert_bug(&second).unwrap();

        let bugs = db.list_bugs().unwrap();
        assert_eq!(bugs.len(), 2);
        assert_eq!(bugs[0].spec.title, "second");
        assert_eq!(bugs[1].spec.title, "first");
    }

    #[test]
    fn update_rewrites_spec_and_status() {
        let db = Database::open_memory().unwrap();

        let mut b = bug("Typo in footer");
        db.insert_bug(&b).unwrap();

        b.spec.title = "Typo in header".to_string();
        b.status.state = BugState::Resolved;
        b.meta.touch();
        db.update_bug(&b).unwrap();

        let fetched = db.get_bug(&b.meta.id).unwrap().unwrap();
        assert_eq!(fetched.spec.title, "Typo in header");
        assert_eq!(fetched.status.state, BugState::Resolved);
        assert_eq!(fetched.meta.generation, 2);
    }

    #[test]
    fn reopen_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        let b = bug("Survives restart");
        {
            let db = Database::open(&path).unwrap();
            db.insert_bug(&b).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let fetched = db.get_bug(&b.meta.id).unwrap().unwrap();
        assert_eq!(fetched.spec.title, "Survives restart");
    }

    #[test]
    fn user_handles_are_unique() {
        let db = Database::open_memory().unwrap();

        db.insert_user(&User::new("alice", "Alice")).unwrap();
        assert!(db.user_handle_exists("alice").unwrap());
        assert!(!db.user_handle_exists("mallory").unwrap());

        // Second insert with the same handle violates the UNIQUE constraint.
        assert!(db.insert_user(&User::new("alice", "Alice Again")).is_err());

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].handle, "alice");
    }
}
