//! Port for the host project system's membership data.
//!
//! The host owns projects, memberships, and roles. The cost rules only read
//! whether a user is a member, which roles it holds, and which cost type the
//! project treats as default.

use async_trait::async_trait;

use crate::domain::{CostType, ProjectId, Role, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by project membership adapters.
    pub enum ProjectMembershipError {
        /// The membership service could not be reached.
        Connection { message: String } =>
            "project membership connection failed: {message}",
        /// The membership lookup failed during execution.
        Query { message: String } =>
            "project membership query failed: {message}",
    }
}

/// Port for reading project membership and role data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectMembership: Send + Sync {
    /// Whether `user` is a member of `project`.
    async fn is_member(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<bool, ProjectMembershipError>;

    /// Roles `user` holds in `project`.
    ///
    /// Non-members receive the host's built-in non-member role, if any.
    async fn roles_of(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<Vec<Role>, ProjectMembershipError>;

    /// The project's active default cost type.
    async fn default_cost_type(
        &self,
        project: &ProjectId,
    ) -> Result<Option<CostType>, ProjectMembershipError>;
}

/// Fixture implementation with no members, no roles, and no default.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProjectMembership;

#[async_trait]
impl ProjectMembership for FixtureProjectMembership {
    async fn is_member(
        &self,
        _user: &UserId,
        _project: &ProjectId,
    ) -> Result<bool, ProjectMembershipError> {
        Ok(false)
    }

    async fn roles_of(
        &self,
        _user: &UserId,
        _project: &ProjectId,
    ) -> Result<Vec<Role>, ProjectMembershipError> {
        Ok(Vec::new())
    }

    async fn default_cost_type(
        &self,
        _project: &ProjectId,
    ) -> Result<Option<CostType>, ProjectMembershipError> {
        Ok(None)
    }
}
