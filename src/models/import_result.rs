//! Import run results and session ranges

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Terminal status of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Another import holds the lock; nothing was done
    Locked,
    /// Run completed; per-record failures may still be listed in `errors`
    Success,
    /// Run aborted early on a session-level failure
    Error,
}

/// Final result of one import run, returned to the caller as JSON.
/// Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub status: ImportStatus,
    pub imported: usize,
    pub updated: usize,
    /// `"<bioguideId>: <message>"` entries, omitted when empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ImportResult {
    pub fn locked() -> Self {
        Self {
            status: ImportStatus::Locked,
            imported: 0,
            updated: 0,
            errors: None,
        }
    }

    pub fn completed(status: ImportStatus, imported: usize, updated: usize, errors: Vec<String>) -> Self {
        Self {
            status,
            imported,
            updated,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

/// Inclusive range of Congresses, iterated in descending order.
/// Reverse ranges are not defined behavior and are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRange {
    pub start_congress: u16,
    pub end_congress: u16,
}

impl SessionRange {
    pub fn new(start_congress: u16, end_congress: u16) -> Result<Self> {
        if start_congress < end_congress {
            return Err(Error::InvalidInput(format!(
                "startCongress ({}) must be >= endCongress ({})",
                start_congress, end_congress
            )));
        }
        Ok(Self {
            start_congress,
            end_congress,
        })
    }

    /// Advisory lock key for this range. One key per range means two
    /// runs over the same range exclude each other.
    pub fn lock_key(&self) -> String {
        format!(
            "import_legislators_{}_{}",
            self.start_congress, self.end_congress
        )
    }

    /// Sessions from start down to end, inclusive.
    pub fn sessions(&self) -> impl Iterator<Item = u16> {
        (self.end_congress..=self.start_congress).rev()
    }
}
