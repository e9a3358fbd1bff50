//! Post-commit extension point for cost entry writes.
//!
//! Hosts recalculate derived figures (rates, budget totals) after an entry
//! is written. The service calls the hook explicitly once the repository has
//! confirmed the write; a failing hook does not roll the write back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::CostEntry;

use super::define_port_error;

define_port_error! {
    /// Errors raised by commit hook adapters.
    pub enum CostEntryCommitHookError {
        /// The hook could not complete its follow-up work.
        Failed { message: String } =>
            "cost entry commit hook failed: {message}",
    }
}

/// A write that has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entry", rename_all = "snake_case")]
pub enum CostEntryCommitted {
    /// A new entry was stored.
    Created(CostEntry),
    /// A stored entry changed.
    Updated(CostEntry),
    /// A stored entry was removed.
    Deleted(CostEntry),
}

impl CostEntryCommitted {
    /// The entry the event refers to.
    pub fn entry(&self) -> &CostEntry {
        match self {
            Self::Created(entry) | Self::Updated(entry) | Self::Deleted(entry) => entry,
        }
    }
}

/// Port invoked after a cost entry write has been committed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CostEntryCommitHook: Send + Sync {
    /// React to a committed write.
    async fn after_commit(&self, event: &CostEntryCommitted)
    -> Result<(), CostEntryCommitHookError>;
}

/// Hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCostEntryCommitHook;

#[async_trait]
impl CostEntryCommitHook for FixtureCostEntryCommitHook {
    async fn after_commit(
        &self,
        _event: &CostEntryCommitted,
    ) -> Result<(), CostEntryCommitHookError> {
        Ok(())
    }
}
