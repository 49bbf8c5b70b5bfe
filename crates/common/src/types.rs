//! Core types for BugTrack

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata common to all stored bug records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugMeta {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub generation: i64,
}

impl BugMeta {
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            generation: 1,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
        self.generation += 1;
    }
}

impl Default for BugMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Bug priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("invalid priority: {other} (expected low|medium|high)")),
        }
    }
}

/// Bug severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Trivial,
    Minor,
    Major,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Minor
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Trivial => write!(f, "trivial"),
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trivial" => Ok(Severity::Trivial),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "invalid severity: {other} (expected trivial|minor|major|critical)"
            )),
        }
    }
}

/// Lifecycle state of a bug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugState {
    Open,
    InProgress,
    Resolved,
}

impl Default for BugState {
    fn default() -> Self {
        Self::Open
    }
}

impl std::fmt::Display for BugState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BugState::Open => write!(f, "open"),
            BugState::InProgress => write!(f, "in_progress"),
            BugState::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for BugState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(BugState::Open),
            "in_progress" | "in-progress" => Ok(BugState::InProgress),
            "resolved" => Ok(BugState::Resolved),
            other => Err(format!(
                "invalid state: {other} (expected open|in_progress|resolved)"
            )),
        }
    }
}

/// Bug specification: the caller-provided fields of a record.
///
/// `title` and `description` are mandatory and must be non-empty; everything
/// else is optional with server-side defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugSpec {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub severity: Severity,
    /// Handle of the assigned user, if any
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub steps: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
}

/// Bug status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugStatus {
    pub state: BugState,
}

impl Default for BugStatus {
    fn default() -> Self {
        Self {
            state: BugState::Open,
        }
    }
}

/// A tracked bug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bug {
    pub meta: BugMeta,
    pub spec: BugSpec,
    pub status: BugStatus,
}

/// A user that bugs can be assigned to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub created_at: i64,
}

impl User {
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            handle: handle.into(),
            display_name: display_name.into(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Partial update for a bug. Provided fields are merged into the existing
/// record; omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BugPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BugState>,
}

impl BugPatch {
    /// Merge this patch into a spec/status pair.
    pub fn apply(&self, spec: &mut BugSpec, status: &mut BugStatus) {
        if let Some(title) = &self.title {
            spec.title = title.clone();
        }
        if let Some(description) = &self.description {
            spec.description = description.clone();
        }
        if let Some(priority) = self.priority {
            spec.priority = priority;
        }
        if let Some(severity) = self.severity {
            spec.severity = severity;
        }
        if let Some(assignee) = &self.assignee {
            spec.assignee = Some(assignee.clone());
        }
        if let Some(environment) = &self.environment {
            spec.environment = Some(environment.clone());
        }
        if let Some(steps) = &self.steps {
            spec.steps = Some(steps.clone());
        }
        if let Some(expected) = &self.expected {
            spec.expected = Some(expected.clone());
        }
        if let Some(actual) = &self.actual {
            spec.actual = Some(actual.clone());
        }
        if let Some(state) = self.status {
            status.state = state;
        }
    }
}

/// List filter. All criteria are conjunctive; `q` is a case-insensitive
/// substring match over title and description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BugFilter {
    pub status: Option<BugState>,
    pub priority: Option<Priority>,
    pub severity: Option<Severity>,
    pub assignee: Option<String>,
    pub q: Option<String>,
}

impl BugFilter {
    pub fn matches(&self, bug: &Bug) -> bool {
        if let Some(state) = self.status {
            if bug.status.state != state {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if bug.spec.priority != priority {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if bug.spec.severity != severity {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if bug.spec.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            if !q.is_empty()
                && !bug.spec.title.to_lowercase().contains(&q)
                && !bug.spec.description.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bug(title: &str, state: BugState) -> Bug {
        Bug {
            meta: BugMeta::new(),
            spec: BugSpec {
                title: title.to_string(),
                description: "login button does nothing".to_string(),
                priority: Priority::High,
                severity: Severity::Major,
                assignee: Some("alice".to_string()),
                environment: None,
                steps: None,
                expected: None,
                actual: None,
            },
            status: BugStatus { state },
        }
    }

    #[test]
    fn filter_matches_by_state_and_assignee() {
        let bug = sample_bug("Login broken", BugState::Open);

        let filter = BugFilter {
            status: Some(BugState::Open),
            assignee: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&bug));

        let filter = BugFilter {
            status: Some(BugState::Resolved),
            ..Default::default()
        };
        assert!(!filter.matches(&bug));

        let filter = BugFilter {
            assignee: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&bug));
    }

    #[test]
    fn filter_search_is_case_insensitive_over_title_and_description() {
        let bug = sample_bug("Login broken", BugState::Open);

        let by_title = BugFilter {
            q: Some("LOGIN".to_string()),
            ..Default::default()
        };
        assert!(by_title.matches(&bug));

        let by_description = BugFilter {
            q: Some("button does".to_string()),
            ..Default::default()
        };
        assert!(by_description.matches(&bug));

        let no_match = BugFilter {
            q: Some("checkout".to_string()),
            ..Default::default()
        };
        assert!(!no_match.matches(&bug));
    }

    #[test]
    fn patch_merges_only_provided_fields() {
        let bug = sample_bug("Login broken", BugState::Open);
        let mut spec = bug.spec.clone();
        let mut status = bug.status.clone();

        let patch = BugPatch {
            title: Some("Login broken on Safari".to_string()),
            status: Some(BugState::InProgress),
            ..Default::default()
        };
        patch.apply(&mut spec, &mut status);

        assert_eq!(spec.title, "Login broken on Safari");
        assert_eq!(spec.description, bug.spec.description);
        assert_eq!(spec.priority, Priority::High);
        assert_eq!(spec.assignee.as_deref(), Some("alice"));
        assert_eq!(status.state, BugState::InProgress);
    }
}
