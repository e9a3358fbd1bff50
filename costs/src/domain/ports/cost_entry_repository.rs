//! Port for cost entry persistence.
//!
//! The [`CostEntryRepository`] trait is the contract with whatever store
//! keeps cost entries. The rule set hands it fully validated entries only;
//! the store performs no validation of its own.

use async_trait::async_trait;

use crate::domain::{CostEntry, CostEntryId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cost entry repository adapters.
    pub enum CostEntryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "cost entry repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "cost entry repository query failed: {message}",
        /// Insert collided with an existing identifier.
        DuplicateId { id: String } =>
            "cost entry {id} already exists",
        /// Update or delete targeted an entry that no longer exists.
        Missing { id: String } =>
            "cost entry {id} does not exist",
    }
}

/// Port for cost entry storage and retrieval.
///
/// Concurrent writers are not coordinated: the last successful `update`
/// wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CostEntryRepository: Send + Sync {
    /// Fetch an entry, or `None` when it does not exist.
    async fn find(&self, id: &CostEntryId) -> Result<Option<CostEntry>, CostEntryRepositoryError>;

    /// Store a new entry.
    async fn insert(&self, entry: &CostEntry) -> Result<(), CostEntryRepositoryError>;

    /// Replace a stored entry.
    async fn update(&self, entry: &CostEntry) -> Result<(), CostEntryRepositoryError>;

    /// Remove a stored entry.
    async fn delete(&self, id: &CostEntryId) -> Result<(), CostEntryRepositoryError>;
}

/// Fixture repository that stores nothing and finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCostEntryRepository;

#[async_trait]
impl CostEntryRepository for FixtureCostEntryRepository {
    async fn find(&self, _id: &CostEntryId) -> Result<Option<CostEntry>, CostEntryRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _entry: &CostEntry) -> Result<(), CostEntryRepositoryError> {
        Ok(())
    }

    async fn update(&self, _entry: &CostEntry) -> Result<(), CostEntryRepositoryError> {
        Ok(())
    }

    async fn delete(&self, _id: &CostEntryId) -> Result<(), CostEntryRepositoryError> {
        Ok(())
    }
}
