//! Precondition checks for bug writes
//!
//! Runs before every repository mutation so a rejected payload never
//! reaches the store, even partially.

use crate::types::BugSpec;
use crate::{Error, Result};

/// Maximum accepted length for the title field.
pub const MAX_TITLE_LEN: usize = 256;

/// Validate a bug spec prior to insert or after an update merge.
///
/// Mandatory fields must be non-empty after trimming; whitespace-only
/// values count as empty.
pub fn validate_spec(spec: &BugSpec) -> Result<()> {
    if spec.title.trim().is_empty() {
        return Err(Error::validation("title", "must not be empty"));
    }
    if spec.title.len() > MAX_TITLE_LEN {
        return Err(Error::validation(
            "title",
            format!("must be at most {MAX_TITLE_LEN} bytes"),
        ));
    }
    if spec.description.trim().is_empty() {
        return Err(Error::validation("description", "must not be empty"));
    }
    if let Some(assignee) = &spec.assignee {
        if assignee.trim().is_empty() {
            return Err(Error::validation("assignee", "must not be empty when set"));
        }
    }
    Ok(())
}
