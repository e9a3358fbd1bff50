//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cost_entry_command;
mod cost_entry_commit_hook;
mod cost_entry_repository;
mod cost_type_repository;
mod issue_tracker;
mod project_membership;

pub use cost_entry_command::{
    CostEntryCommand, CostEntryCommandError, CostEntryLookup, CostEntryUpdated,
    CreateCostEntryRequest, DenialReason, PrepareCostEntryRequest,
    PrepareScope, UpdateCostEntryRequest,
};
#[cfg(test)]
pub use cost_entry_commit_hook::MockCostEntryCommitHook;
pub use cost_entry_commit_hook::{
    CostEntryCommitHook, CostEntryCommitHookError, CostEntryCommitted, FixtureCostEntryCommitHook,
};
#[cfg(test)]
pub use cost_entry_repository::MockCostEntryRepository;
pub use cost_entry_repository::{
    CostEntryRepository, CostEntryRepositoryError, FixtureCostEntryRepository,
};
#[cfg(test)]
pub use cost_type_repository::MockCostTypeRepository;
pub use cost_type_repository::{
    CostTypeRepository, CostTypeRepositoryError, FixtureCostTypeRepository,
};
#[cfg(test)]
pub use issue_tracker::MockIssueTracker;
pub use issue_tracker::{FixtureIssueTracker, IssueTracker, IssueTrackerError};
#[cfg(test)]
pub use project_membership::MockProjectMembership;
pub use project_membership::{
    FixtureProjectMembership, ProjectMembership, ProjectMembershipError,
};
