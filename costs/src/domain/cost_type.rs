//! Cost types and issues referenced by cost entries.

use serde::{Deserialize, Serialize};

use super::{CostTypeId, IssueId, ProjectId};

/// Category of a cost entry, e.g. "labor" or "material".
///
/// A cost type is soft-deleted by clearing `active`; entries may still point
/// at it, but no new reference to an inactive type is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostType {
    /// Stable identifier.
    pub id: CostTypeId,
    /// Display name.
    pub name: String,
    /// `false` once the type has been deleted.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Whether new entries default to this type.
    #[serde(default)]
    pub is_default: bool,
}

const fn default_active() -> bool {
    true
}

impl CostType {
    /// An active, non-default cost type.
    pub fn new(id: CostTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            is_default: false,
        }
    }

    /// Mark the type as the default for new entries.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Mark the type as deleted.
    #[must_use]
    pub fn deleted(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Scopes that expose a default cost type.
///
/// Only an active type marked default qualifies; a deleted default is
/// treated as no default at all.
pub trait HasDefaultCostType {
    /// The active default cost type, if any.
    fn default_cost_type(&self) -> Option<&CostType>;
}

impl HasDefaultCostType for [CostType] {
    fn default_cost_type(&self) -> Option<&CostType> {
        self.iter()
            .find(|cost_type| cost_type.active && cost_type.is_default)
    }
}

impl HasDefaultCostType for Vec<CostType> {
    fn default_cost_type(&self) -> Option<&CostType> {
        self.as_slice().default_cost_type()
    }
}

/// Issue as seen by the cost rules: only its project matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Stable identifier.
    pub id: IssueId,
    /// Project the issue belongs to.
    pub project_id: ProjectId,
}
