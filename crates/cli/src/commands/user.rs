//! User Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::{ApiClient, UserRecord};
use crate::output::{format_timestamp, print_item, print_list, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum UserCommands {
    /// List assignable users
    List,

    /// Create a new user
    Create {
        /// Unique handle (used as assignee reference)
        #[arg(long)]
        handle: String,

        /// Display name
        #[arg(long)]
        display_name: String,
    },
}

/// User display wrapper for serialization
#[derive(Serialize)]
pub struct UserDisplay {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub created: String,
}

impl From<UserRecord> for UserDisplay {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            handle: user.handle,
            display_name: user.display_name,
            created: format_timestamp(user.created_at),
        }
    }
}

impl crate::output::TableDisplay for UserDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Handle", "Name", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.handle.clone(),
            self.display_name.clone(),
            self.created.clone(),
        ]
    }
}

pub async fn execute(cmd: UserCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        UserCommands::List => {
            let users = client.list_users().await?;
            let displays: Vec<UserDisplay> = users.into_iter().map(UserDisplay::from).collect();
            print_list(&displays, format);
        }

        UserCommands::Create {
            handle,
            display_name,
        } => {
            let user = client.create_user(&handle, &display_name).await?;
            print_success(&format!("User created: {}", user.handle));
            print_item(&UserDisplay::from(user), format);
        }
    }

    Ok(())
}
