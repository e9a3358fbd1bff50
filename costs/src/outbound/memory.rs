//! In-memory adapters for every driven port.
//!
//! [`InMemoryCostsStore`] holds a whole installation (memberships, issues,
//! cost types, and entries) behind `RwLock`s so one `Arc` can be handed to
//! the service for each port. It loads from and dumps to a serde
//! [`CostsWorld`] snapshot, which is what the `costlog-check` binary reads.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    CostEntryCommitHook, CostEntryCommitHookError, CostEntryCommitted, CostEntryRepository,
    CostEntryRepositoryError, CostTypeRepository, CostTypeRepositoryError, IssueTracker,
    IssueTrackerError, ProjectMembership, ProjectMembershipError,
};
use crate::domain::{
    CostEntry, CostEntryId, CostType, CostTypeId, HasDefaultCostType, Issue, IssueId, ProjectId,
    Role, UserId,
};

const POISONED: &str = "in-memory store lock poisoned";

/// Roles one user holds in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    /// Project the membership belongs to.
    pub project_id: ProjectId,
    /// Member user.
    pub user_id: UserId,
    /// Roles granted by the membership.
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Serialisable snapshot of an installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostsWorld {
    /// Project memberships.
    pub memberships: Vec<MembershipRecord>,
    /// Built-in role applied to logged-in users outside a project.
    pub non_member_role: Option<Role>,
    /// Known issues.
    pub issues: Vec<Issue>,
    /// Cost types, deleted ones included.
    pub cost_types: Vec<CostType>,
    /// Stored entries.
    pub entries: Vec<CostEntry>,
}

/// Thread-safe in-memory installation.
#[derive(Debug, Default)]
pub struct InMemoryCostsStore {
    memberships: RwLock<HashMap<(ProjectId, UserId), Vec<Role>>>,
    non_member_role: RwLock<Option<Role>>,
    issues: RwLock<HashMap<IssueId, Issue>>,
    cost_types: RwLock<BTreeMap<CostTypeId, CostType>>,
    entries: RwLock<BTreeMap<CostEntryId, CostEntry>>,
}

impl InMemoryCostsStore {
    /// An empty installation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an installation from a snapshot.
    pub fn from_world(world: CostsWorld) -> Self {
        let memberships = world
            .memberships
            .into_iter()
            .map(|record| ((record.project_id, record.user_id), record.roles))
            .collect();
        Self {
            memberships: RwLock::new(memberships),
            non_member_role: RwLock::new(world.non_member_role),
            issues: RwLock::new(world.issues.into_iter().map(|i| (i.id, i)).collect()),
            cost_types: RwLock::new(world.cost_types.into_iter().map(|t| (t.id, t)).collect()),
            entries: RwLock::new(world.entries.into_iter().map(|e| (e.id, e)).collect()),
        }
    }

    /// Dump the current state.
    ///
    /// # Errors
    /// Fails only when a lock was poisoned by a panicking writer.
    pub fn world(&self) -> Result<CostsWorld, CostEntryRepositoryError> {
        let mut memberships: Vec<MembershipRecord> = self
            .memberships
            .read()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?
            .iter()
            .map(|((project_id, user_id), roles)| MembershipRecord {
                project_id: *project_id,
                user_id: *user_id,
                roles: roles.clone(),
            })
            .collect();
        memberships.sort_by_key(|record| (record.project_id, record.user_id));
        let mut issues: Vec<Issue> = self
            .issues
            .read()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?
            .values()
            .copied()
            .collect();
        issues.sort_by_key(|issue| issue.id);

        Ok(CostsWorld {
            memberships,
            non_member_role: self
                .non_member_role
                .read()
                .map_err(|_| CostEntryRepositoryError::query(POISONED))?
                .clone(),
            issues,
            cost_types: self
                .cost_types
                .read()
                .map_err(|_| CostEntryRepositoryError::query(POISONED))?
                .values()
                .cloned()
                .collect(),
            entries: self.entries()?,
        })
    }

    /// Grant `roles` to `user_id` in `project_id`, replacing earlier roles.
    pub fn add_member(&self, project_id: ProjectId, user_id: UserId, roles: Vec<Role>) {
        self.memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((project_id, user_id), roles);
    }

    /// Set the role applied to logged-in non-members.
    pub fn set_non_member_role(&self, role: Option<Role>) {
        *self
            .non_member_role
            .write()
            .unwrap_or_else(PoisonError::into_inner) = role;
    }

    /// Register an issue.
    pub fn add_issue(&self, issue: Issue) {
        self.issues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(issue.id, issue);
    }

    /// Register or replace a cost type.
    pub fn add_cost_type(&self, cost_type: CostType) {
        self.cost_types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cost_type.id, cost_type);
    }

    /// Seed an entry directly, bypassing the rules.
    pub fn seed_entry(&self, entry: CostEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.id, entry);
    }

    /// Every stored entry ordered by id.
    ///
    /// # Errors
    /// Fails only when the entry lock was poisoned.
    pub fn entries(&self) -> Result<Vec<CostEntry>, CostEntryRepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?;
        Ok(entries.values().cloned().collect())
    }
}

#[async_trait]
impl ProjectMembership for InMemoryCostsStore {
    async fn is_member(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<bool, ProjectMembershipError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| ProjectMembershipError::query(POISONED))?;
        Ok(memberships.contains_key(&(*project, *user)))
    }

    async fn roles_of(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<Vec<Role>, ProjectMembershipError> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| ProjectMembershipError::query(POISONED))?;
        if let Some(roles) = memberships.get(&(*project, *user)) {
            return Ok(roles.clone());
        }
        let non_member = self
            .non_member_role
            .read()
            .map_err(|_| ProjectMembershipError::query(POISONED))?;
        Ok(non_member.iter().cloned().collect())
    }

    async fn default_cost_type(
        &self,
        _project: &ProjectId,
    ) -> Result<Option<CostType>, ProjectMembershipError> {
        let cost_types = self
            .cost_types
            .read()
            .map_err(|_| ProjectMembershipError::query(POISONED))?;
        let all: Vec<CostType> = cost_types.values().cloned().collect();
        Ok(all.default_cost_type().cloned())
    }
}

#[async_trait]
impl IssueTracker for InMemoryCostsStore {
    async fn find_issue(&self, id: &IssueId) -> Result<Option<Issue>, IssueTrackerError> {
        let issues = self
            .issues
            .read()
            .map_err(|_| IssueTrackerError::query(POISONED))?;
        Ok(issues.get(id).copied())
    }
}

#[async_trait]
impl CostTypeRepository for InMemoryCostsStore {
    async fn find(&self, id: &CostTypeId) -> Result<Option<CostType>, CostTypeRepositoryError> {
        let cost_types = self
            .cost_types
            .read()
            .map_err(|_| CostTypeRepositoryError::query(POISONED))?;
        Ok(cost_types.get(id).cloned())
    }
}

#[async_trait]
impl CostEntryRepository for InMemoryCostsStore {
    async fn find(&self, id: &CostEntryId) -> Result<Option<CostEntry>, CostEntryRepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?;
        Ok(entries.get(id).cloned())
    }

    async fn insert(&self, entry: &CostEntry) -> Result<(), CostEntryRepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?;
        if entries.contains_key(&entry.id) {
            return Err(CostEntryRepositoryError::duplicate_id(entry.id.to_string()));
        }
        entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update(&self, entry: &CostEntry) -> Result<(), CostEntryRepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?;
        let slot = entries
            .get_mut(&entry.id)
            .ok_or_else(|| CostEntryRepositoryError::missing(entry.id.to_string()))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete(&self, id: &CostEntryId) -> Result<(), CostEntryRepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CostEntryRepositoryError::query(POISONED))?;
        entries
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CostEntryRepositoryError::missing(id.to_string()))
    }
}

/// Commit hook that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingCommitHook {
    events: Mutex<Vec<CostEntryCommitted>>,
}

impl RecordingCommitHook {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    ///
    /// Events recorded before a panicking recorder poisoned the lock are
    /// still returned.
    pub fn events(&self) -> Vec<CostEntryCommitted> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CostEntryCommitHook for RecordingCommitHook {
    async fn after_commit(
        &self,
        event: &CostEntryCommitted,
    ) -> Result<(), CostEntryCommitHookError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| CostEntryCommitHookError::failed(POISONED))?;
        events.push(event.clone());
        Ok(())
    }
}
