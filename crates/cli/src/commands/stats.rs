//! Statistics Command

use anyhow::Result;
use serde::Serialize;

use crate::client::{ApiClient, StatsRecord};
use crate::output::{print_item, OutputFormat};

/// Stats display wrapper for serialization
#[derive(Serialize)]
pub struct StatsDisplay {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
}

impl From<StatsRecord> for StatsDisplay {
    fn from(stats: StatsRecord) -> Self {
        Self {
            total: stats.total,
            open: stats.open,
            in_progress: stats.in_progress,
            resolved: stats.resolved,
        }
    }
}

impl crate::output::TableDisplay for StatsDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Total", "Open", "In Progress", "Resolved"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.total.to_string(),
            self.open.to_string(),
            self.in_progress.to_string(),
            self.resolved.to_string(),
        ]
    }
}

pub async fn execute(client: ApiClient, format: OutputFormat) -> Result<()> {
    let stats = client.stats().await?;
    print_item(&StatsDisplay::from(stats), format);
    Ok(())
}
