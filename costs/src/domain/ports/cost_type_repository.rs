//! Port for cost type lookups.

use async_trait::async_trait;

use crate::domain::{CostType, CostTypeId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cost type repository adapters.
    pub enum CostTypeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "cost type repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "cost type repository query failed: {message}",
    }
}

/// Port for reading cost types.
///
/// Deleted types are still returned, flagged inactive, so callers can tell a
/// deleted reference from an unknown one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CostTypeRepository: Send + Sync {
    /// Fetch a cost type, or `None` when it does not exist.
    async fn find(&self, id: &CostTypeId) -> Result<Option<CostType>, CostTypeRepositoryError>;
}

/// Fixture repository with no cost types.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCostTypeRepository;

#[async_trait]
impl CostTypeRepository for FixtureCostTypeRepository {
    async fn find(&self, _id: &CostTypeId) -> Result<Option<CostType>, CostTypeRepositoryError> {
        Ok(None)
    }
}
