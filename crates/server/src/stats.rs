//! Statistics derived from repository contents
//!
//! Counts are recomputed from the current bug list on every query; there is
//! no cache to invalidate.

use bugtrack_common::{Bug, BugState};
use serde::{Deserialize, Serialize};

/// Derived bug counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugStats {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
}

/// Compute counts for the given bugs.
pub fn compute(bugs: &[Bug]) -> BugStats {
    let mut stats = BugStats::default();
    for bug in bugs {
        stats.total += 1;
        match bug.status.state {
            BugState::Open => stats.open += 1,
            BugState::InProgress => stats.in_progress += 1,
            BugState::Resolved => stats.resolved += 1,
        }
    }
    stats
}
