//! Bug Commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::client::{ApiClient, BugRecord};
use crate::output::{format_timestamp, print_item, print_list, print_success, OutputFormat};
use bugtrack_common::{BugPatch, BugState, Priority, Severity};

#[derive(Subcommand)]
pub enum BugCommands {
    /// List bugs
    List {
        /// Filter by state (open|in_progress|resolved)
        #[arg(long)]
        status: Option<BugState>,

        /// Filter by priority (low|medium|high)
        #[arg(long)]
        priority: Option<Priority>,

        /// Filter by severity (trivial|minor|major|critical)
        #[arg(long)]
        severity: Option<Severity>,

        /// Filter by assignee handle
        #[arg(long)]
        assignee: Option<String>,

        /// Free-text search over title and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Get bug details
    Get {
        /// Bug ID
        id: String,
    },

    /// Report a new bug
    Create {
        /// Bug title
        #[arg(short, long)]
        title: String,

        /// Bug description
        #[arg(short, long)]
        description: String,

        /// Priority (low|medium|high)
        #[arg(long)]
        priority: Option<Priority>,

        /// Severity (trivial|minor|major|critical)
        #[arg(long)]
        severity: Option<Severity>,

        /// Assignee handle
        #[arg(long)]
        assignee: Option<String>,

        /// Environment the bug was observed in
        #[arg(long)]
        environment: Option<String>,

        /// Steps to reproduce
        #[arg(long)]
        steps: Option<String>,

        /// Expected behavior
        #[arg(long)]
        expected: Option<String>,

        /// Actual behavior
        #[arg(long)]
        actual: Option<String>,
    },

    /// Update fields of an existing bug
    Update {
        /// Bug ID
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        severity: Option<Severity>,

        #[arg(long)]
        assignee: Option<String>,

        /// New state (open|in_progress|resolved)
        #[arg(long)]
        status: Option<BugState>,
    },

    /// Mark a bug as resolved
    Resolve {
        /// Bug ID
        id: String,
    },

    /// Delete a bug (asks for confirmation)
    Delete {
        /// Bug ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Bug display wrapper for serialization
#[derive(Serialize)]
pub struct BugDisplay {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub severity: String,
    pub assignee: String,
    pub updated: String,
}

impl From<BugRecord> for BugDisplay {
    fn from(bug: BugRecord) -> Self {
        Self {
            id: bug.id,
            title: bug.title,
            status: bug.status.to_string(),
            priority: bug.priority.to_string(),
            severity: bug.severity.to_string(),
            assignee: bug.assignee.unwrap_or_else(|| "-".to_string()),
            updated: format_timestamp(bug.updated_at),
        }
    }
}

impl crate::output::TableDisplay for BugDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Title", "Status", "Priority", "Severity", "Assignee", "Updated"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.status.clone(),
            self.priority.clone(),
            self.severity.clone(),
            self.assignee.clone(),
            self.updated.clone(),
        ]
    }
}

pub async fn execute(cmd: BugCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        BugCommands::List {
            status,
            priority,
            severity,
            assignee,
            search,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(status) = status {
                query.push(("status", status.to_string()));
            }
            if let Some(priority) = priority {
                query.push(("priority", priority.to_string()));
            }
            if let Some(severity) = severity {
                query.push(("severity", severity.to_string()));
            }
            if let Some(assignee) = assignee {
                query.push(("assignee", assignee));
            }
            if let Some(search) = search {
                query.push(("q", search));
            }

            let bugs = client.list_bugs(&query).await?;
            let displays: Vec<BugDisplay> = bugs.into_iter().map(BugDisplay::from).collect();
            print_list(&displays, format);
        }

        BugCommands::Get { id } => {
            let bug = client.get_bug(&id).await?;
            let display = BugDisplay::from(bug);
            print_item(&display, format);
        }

        BugCommands::Create {
            title,
            description,
            priority,
            severity,
            assignee,
            environment,
            steps,
            expected,
            actual,
        } => {
            // Only send what the user provided; the server owns the defaults.
            let mut payload = serde_json::json!({
                "title": title,
                "description": description,
            });
            if let Some(priority) = priority {
                payload["priority"] = serde_json::json!(priority);
            }
            if let Some(severity) = severity {
                payload["severity"] = serde_json::json!(severity);
            }
            if let Some(assignee) = assignee {
                payload["assignee"] = serde_json::json!(assignee);
            }
            if let Some(environment) = environment {
                payload["environment"] = serde_json::json!(environment);
            }
            if let Some(steps) = steps {
                payload["steps"] = serde_json::json!(steps);
            }
            if let Some(expected) = expected {
                payload["expected"] = serde_json::json!(expected);
            }
            if let Some(actual) = actual {
                payload["actual"] = serde_json::json!(actual);
            }

            let bug = client.create_bug(&payload).await?;
            print_success(&format!("Bug created: {}", bug.id));
            print_item(&BugDisplay::from(bug), format);
        }

        BugCommands::Update {
            id,
            title,
            description,
            priority,
            severity,
            assignee,
            status,
        } => {
            let patch = BugPatch {
                title,
                description,
                priority,
                severity,
                assignee,
                status,
                ..Default::default()
            };

            let bug = client.update_bug(&id, &patch).await?;
            print_success(&format!("Bug updated: {}", bug.id));
            print_item(&BugDisplay::from(bug), format);
        }

        BugCommands::Resolve { id } => {
            let patch = BugPatch {
                status: Some(BugState::Resolved),
                ..Default::default()
            };

            let bug = client.update_bug(&id, &patch).await?;
            print_success(&format!("Bug resolved: {}", bug.id));
        }

        BugCommands::Delete { id, yes } => {
            // The confirmation gesture happens here; declining never reaches
            // the server.
            if !yes && !confirm_delete(&id)? {
                println!("Aborted, nothing deleted.");
                return Ok(());
            }

            client.delete_bug(&id).await?;
            print_success(&format!("Bug deleted: {}", id));
        }
    }

    Ok(())
}

fn confirm_delete(id: &str) -> Result<bool> {
    print!("{} delete bug {}? [y/N] ", "Permanently".red().bold(), id);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();

    Ok(answer == "y" || answer == "yes")
}
