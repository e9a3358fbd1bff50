//! Port for the host issue tracker.

use async_trait::async_trait;

use crate::domain::{Issue, IssueId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by issue tracker adapters.
    pub enum IssueTrackerError {
        /// The tracker could not be reached.
        Connection { message: String } =>
            "issue tracker connection failed: {message}",
        /// The lookup failed during execution.
        Query { message: String } =>
            "issue tracker query failed: {message}",
    }
}

/// Port for resolving issues referenced by cost entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch an issue, or `None` when it does not exist.
    async fn find_issue(&self, id: &IssueId) -> Result<Option<Issue>, IssueTrackerError>;
}

/// Fixture tracker that knows no issues.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIssueTracker;

#[async_trait]
impl IssueTracker for FixtureIssueTracker {
    async fn find_issue(&self, _id: &IssueId) -> Result<Option<Issue>, IssueTrackerError> {
        Ok(None)
    }
}
