//! State management for the bug repository
//!
//! All writes go through validation first; a rejected payload never touches
//! the store.

use bugtrack_common::{
    validation, Bug, BugFilter, BugMeta, BugPatch, BugSpec, BugStatus, Database, Error, Result,
    User,
};
use tracing::{debug, info};

/// Seeded user handles, matching the assignee choices the UI exposes.
const SEED_USERS: &[(&str, &str)] = &[
    ("alice", "Alice Martin"),
    ("bob", "Bob Dupont"),
    ("charlie", "Charlie Bernard"),
];

/// State manager for all bug tracker resources
#[derive(Clone)]
pub struct StateManager {
    db: Database,
}

impl StateManager {
    /// Create a new state manager over an opened database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get database
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ========================================================================
    // Bug operations
    // ========================================================================

    /// Create a new bug. Validation runs before the insert; on success the
    /// record gets a fresh id and starts out open.
    pub fn create_bug(&self, spec: BugSpec) -> Result<Bug> {
        validation::validate_spec(&spec)?;
        self.check_assignee(&spec)?;

        let meta = BugMeta::new();
        let status = BugStatus::default();
        let bug = Bug { meta, spec, status };

        self.db.insert_bug(&bug)?;

        debug!("Created bug: {} ({})", bug.spec.title, bug.meta.id);

        Ok(bug)
    }

    /// Get a bug by ID
    pub fn get_bug(&self, id: &str) -> Result<Option<Bug>> {
        self.db.get_bug(id)
    }

    /// List bugs, newest first, filtered in memory
    pub fn list_bugs(&self, filter: &BugFilter) -> Result<Vec<Bug>> {
        let bugs = self.db.list_bugs()?;
        Ok(bugs.into_iter().filter(|b| filter.matches(b)).collect())
    }

    /// Merge a patch into an existing bug. The merged spec is re-validated,
    /// so an update can never empty a mandatory field.
    pub fn update_bug(&self, id: &str, patch: &BugPatch) -> Result<Bug> {
        let mut bug = self
            .db
            .get_bug(id)?
            .ok_or_else(|| Error::not_found("bug", id))?;

        patch.apply(&mut bug.spec, &mut bug.status);

        validation::validate_spec(&bug.spec)?;
        self.check_assignee(&bug.spec)?;

        bug.meta.touch();
        self.db.update_bug(&bug)?;

        debug!("Updated bug: {} (generation {})", bug.meta.id, bug.meta.generation);

        Ok(bug)
    }

    /// Delete a bug permanently. The confirmation gesture is enforced at the
    /// API boundary; by the time this runs the delete is committed.
    pub fn delete_bug(&self, id: &str) -> Result<()> {
        if !self.db.delete_bug(id)? {
            return Err(Error::not_found("bug", id));
        }
        Ok(())
    }

    fn check_assignee(&self, spec: &BugSpec) -> Result<()> {
        if let Some(assignee) = &spec.assignee {
            if !self.db.user_handle_exists(assignee)? {
                return Err(Error::validation(
                    "assignee",
                    format!("unknown user: {assignee}"),
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Create a new user
    pub fn create_user(&self, handle: String, display_name: String) -> Result<User> {
        if handle.trim().is_empty() {
            return Err(Error::validation("handle", "must not be empty"));
        }
        if self.db.user_handle_exists(&handle)? {
            return Err(Error::AlreadyExists {
                kind: "user".to_string(),
                id: handle,
            });
        }

        let user = User::new(handle, display_name);
        self.db.insert_user(&user)?;

        debug!("Created user: {} ({})", user.handle, user.id);

        Ok(user)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Seed the default assignable users on first boot. Idempotent.
    pub fn seed_users(&self) -> Result<()> {
        for (handle, display_name) in SEED_USERS {
            if !self.db.user_handle_exists(handle)? {
                self.db.insert_user(&User::new(*handle, *display_name))?;
                info!("Seeded user {}", handle);
            }
        }
        Ok(())
    }

    /// Seed a handful of demo bugs into an empty store (dev convenience).
    pub fn seed_demo_bugs(&self) -> Result<()> {
        if self.db.count_bugs()? > 0 {
            return Ok(());
        }

        let demos = [
            (
                "Login page rejects valid credentials",
                "Logging in with a known-good account shows 'invalid password'.",
                "high",
                "critical",
                Some("alice"),
            ),
            (
                "Dashboard chart overlaps sidebar",
                "At narrow widths the status chart renders on top of the sidebar.",
                "low",
                "minor",
                Some("bob"),
            ),
            (
                "Export produces empty CSV",
                "Exporting a filtered list downloads a file with headers only.",
                "medium",
                "major",
                None,
            ),
        ];

        for (title, description, priority, severity, assignee) in demos {
            let spec = BugSpec {
                title: title.to_string(),
                description: description.to_string(),
                priority: priority.parse().map_err(Error::Internal)?,
                severity: severity.parse().map_err(Error::Internal)?,
                assignee: assignee.map(str::to_string),
                environment: Some("staging".to_string()),
                steps: None,
                expected: None,
                actual: None,
            };
            self.create_bug(spec)?;
        }

        info!("Seeded demo bugs");
        Ok(())
    }
}
