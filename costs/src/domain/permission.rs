//! Permission catalogue and tier resolution for cost entry actions.
//!
//! The cost module registers a fixed set of project permissions. Roles carry
//! a subset of them; an actor's [`PermissionTier`] for an action is derived
//! from the roles it holds in the project, never stored.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Project module a permission is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectModule {
    /// Cost tracking: rates, cost types, cost entries, budgets.
    CostsModule,
    /// Time tracking additions contributed by the cost module.
    TimeTracking,
}

/// What a role must be for a permission to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionRequirement {
    /// Any authenticated user, including non-members.
    LoggedIn,
    /// Only members of the project.
    Member,
}

/// Permissions registered by the cost module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// See one's own hourly rate.
    ViewOwnHourlyRate,
    /// See every member's hourly rate.
    ViewHourlyRates,
    /// Change one's own hourly rate.
    EditOwnHourlyRate,
    /// Change any member's hourly rate.
    EditHourlyRates,
    /// See cost item values.
    ViewCostRates,
    /// Log costs for oneself.
    LogOwnCosts,
    /// Log costs for any project member.
    LogCosts,
    /// Edit or delete one's own cost entries.
    EditOwnCostEntries,
    /// Edit or delete any cost entry in the project.
    EditCostEntries,
    /// See budgets.
    ViewCostObjects,
    /// See every cost entry in the project.
    ViewCostEntries,
    /// See one's own cost entries.
    ViewOwnCostEntries,
    /// Create, edit, copy and delete budgets.
    EditCostObjects,
    /// See one's own time entries.
    ViewOwnTimeEntries,
}

impl Permission {
    /// Every registered permission, in registration order.
    pub const ALL: [Self; 14] = [
        Self::ViewOwnHourlyRate,
        Self::ViewHourlyRates,
        Self::EditOwnHourlyRate,
        Self::EditHourlyRates,
        Self::ViewCostRates,
        Self::LogOwnCosts,
        Self::LogCosts,
        Self::EditOwnCostEntries,
        Self::EditCostEntries,
        Self::ViewCostObjects,
        Self::ViewCostEntries,
        Self::ViewOwnCostEntries,
        Self::EditCostObjects,
        Self::ViewOwnTimeEntries,
    ];

    /// Stable symbol used in role configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewOwnHourlyRate => "view_own_hourly_rate",
            Self::ViewHourlyRates => "view_hourly_rates",
            Self::EditOwnHourlyRate => "edit_own_hourly_rate",
            Self::EditHourlyRates => "edit_hourly_rates",
            Self::ViewCostRates => "view_cost_rates",
            Self::LogOwnCosts => "log_own_costs",
            Self::LogCosts => "log_costs",
            Self::EditOwnCostEntries => "edit_own_cost_entries",
            Self::EditCostEntries => "edit_cost_entries",
            Self::ViewCostObjects => "view_cost_objects",
            Self::ViewCostEntries => "view_cost_entries",
            Self::ViewOwnCostEntries => "view_own_cost_entries",
            Self::EditCostObjects => "edit_cost_objects",
            Self::ViewOwnTimeEntries => "view_own_time_entries",
        }
    }

    /// Module the permission is registered under.
    pub const fn module(self) -> ProjectModule {
        match self {
            Self::ViewOwnTimeEntries => ProjectModule::TimeTracking,
            _ => ProjectModule::CostsModule,
        }
    }

    /// Role requirement attached at registration.
    pub const fn requirement(self) -> PermissionRequirement {
        match self {
            Self::EditOwnHourlyRate
            | Self::EditHourlyRates
            | Self::LogCosts
            | Self::EditCostEntries => PermissionRequirement::Member,
            _ => PermissionRequirement::LoggedIn,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown permission symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct ParsePermissionError(String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| ParsePermissionError(s.to_owned()))
    }
}

/// How the host attached a role to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Role granted through project membership.
    #[default]
    Member,
    /// Built-in role for authenticated users outside the project.
    NonMember,
    /// Built-in role for unauthenticated visitors.
    Anonymous,
}

/// A named bundle of permissions held in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Display name.
    pub name: String,
    /// How the role was attached.
    #[serde(default)]
    pub kind: RoleKind,
    /// Permissions carried by the role.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    /// Build a membership role carrying `permissions`.
    pub fn member(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            kind: RoleKind::Member,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Build the built-in non-member role carrying `permissions`.
    pub fn non_member(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: "Non member".to_owned(),
            kind: RoleKind::NonMember,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Whether the role effectively grants `permission`.
    ///
    /// Member-only permissions are ignored on built-in roles and nothing
    /// requiring a login is granted to anonymous visitors.
    pub fn grants(&self, permission: Permission) -> bool {
        if !self.permissions.contains(&permission) {
            return false;
        }
        match (permission.requirement(), self.kind) {
            (PermissionRequirement::Member, RoleKind::Member) => true,
            (PermissionRequirement::Member, _) => false,
            (PermissionRequirement::LoggedIn, RoleKind::Anonymous) => false,
            (PermissionRequirement::LoggedIn, _) => true,
        }
    }
}

/// Cost entry action being authorised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostAction {
    /// Log a new entry (`new`, `create`).
    Create,
    /// Change or remove an existing entry (`edit`, `update`, `destroy`).
    Edit,
}

impl CostAction {
    /// Permission granting the action for any subject.
    pub const fn blanket_permission(self) -> Permission {
        match self {
            Self::Create => Permission::LogCosts,
            Self::Edit => Permission::EditCostEntries,
        }
    }

    /// Permission granting the action for the actor's own entries only.
    pub const fn own_permission(self) -> Permission {
        match self {
            Self::Create => Permission::LogOwnCosts,
            Self::Edit => Permission::EditOwnCostEntries,
        }
    }
}

impl fmt::Display for CostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Edit => f.write_str("edit"),
        }
    }
}

/// Scope of permission an actor holds for an action in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    /// The action is not permitted.
    None,
    /// The action is permitted on the actor's own entries.
    Own,
    /// The action is permitted on every entry.
    All,
}

impl PermissionTier {
    /// Whether the tier allows acting on an entry with the given ownership.
    pub const fn permits(self, is_own: bool) -> bool {
        match self {
            Self::All => true,
            Self::Own => is_own,
            Self::None => false,
        }
    }
}

/// Resolve the tier granted by `roles` for `action`.
///
/// # Examples
/// ```
/// use costs::domain::{CostAction, Permission, PermissionTier, Role, resolve_tier};
///
/// let roles = [Role::member("Developer", [Permission::LogOwnCosts])];
/// assert_eq!(resolve_tier(&roles, CostAction::Create), PermissionTier::Own);
/// assert_eq!(resolve_tier(&roles, CostAction::Edit), PermissionTier::None);
/// ```
pub fn resolve_tier(roles: &[Role], action: CostAction) -> PermissionTier {
    let grants = |permission| roles.iter().any(|role| role.grants(permission));
    if grants(action.blanket_permission()) {
        PermissionTier::All
    } else if grants(action.own_permission()) {
        PermissionTier::Own
    } else {
        PermissionTier::None
    }
}
