//! Driving port for cost entry operations.
//!
//! The [`CostEntryCommand`] trait is the inbound contract for logging and
//! editing cost entries. Every request names its [`Actor`] explicitly; the
//! implementation authorises the actor, validates the submission, and only
//! then touches the store.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Actor, CostAction, CostEntry, CostEntryDraft, CostEntryForm, CostEntryId, Error,
    InvalidCostEntry, IssueId, ProjectId,
};

/// Where a new entry is being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "camelCase")]
pub enum PrepareScope {
    /// Log against a project directly.
    Project(ProjectId),
    /// Log against an issue; the project is taken from the issue.
    Issue(IssueId),
}

/// Request for a blank entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCostEntryRequest {
    /// The acting user.
    pub actor: Actor,
    /// Project or issue the entry will belong to.
    pub scope: PrepareScope,
}

/// Request to log a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostEntryRequest {
    /// The acting user.
    pub actor: Actor,
    /// Project the entry is logged in.
    pub project_id: ProjectId,
    /// The raw submission.
    #[serde(default)]
    pub form: CostEntryForm,
}

/// Request addressing one stored entry, used by `edit` and `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntryLookup {
    /// The acting user.
    pub actor: Actor,
    /// The stored entry.
    pub entry_id: CostEntryId,
}

/// Request to change a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCostEntryRequest {
    /// The acting user.
    pub actor: Actor,
    /// The stored entry.
    pub entry_id: CostEntryId,
    /// The raw submission; omitted fields keep their stored value.
    #[serde(default)]
    pub form: CostEntryForm,
}

/// Result of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntryUpdated {
    /// The entry as stored after the request.
    pub entry: CostEntry,
    /// Whether anything was written.
    pub changed: bool,
}

/// Why an authorisation check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No role grants the action in the project.
    NoPermission,
    /// The actor may only act on its own entries and this one is not.
    ForeignEntry,
    /// The actor may only log for itself but named another subject.
    OnBehalfOfOther,
}

impl DenialReason {
    /// Stable machine-readable code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPermission => "no_permission",
            Self::ForeignEntry => "foreign_entry",
            Self::OnBehalfOfOther => "on_behalf_of_other",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoPermission => "no role grants the action in this project",
            Self::ForeignEntry => "the entry belongs to another user",
            Self::OnBehalfOfOther => "costs may only be logged for the acting user",
        };
        f.write_str(text)
    }
}

/// Failures returned by [`CostEntryCommand`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostEntryCommandError {
    /// The actor may not perform the action.
    #[error("{action} denied: {reason}")]
    AuthorizationDenied {
        /// Action that was attempted.
        action: CostAction,
        /// Why it was refused.
        reason: DenialReason,
    },
    /// The submission failed field validation.
    #[error("cost entry is invalid: {}", .0.errors)]
    Invalid(Box<InvalidCostEntry>),
    /// The addressed record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record.
        resource: &'static str,
        /// Identifier as requested.
        id: String,
    },
    /// A collaborator failed.
    #[error(transparent)]
    Port(#[from] Error),
}

impl CostEntryCommandError {
    /// Authorisation failure for `action`.
    pub const fn denied(action: CostAction, reason: DenialReason) -> Self {
        Self::AuthorizationDenied { action, reason }
    }

    /// Missing cost entry.
    pub fn entry_not_found(id: CostEntryId) -> Self {
        Self::NotFound {
            resource: "cost entry",
            id: id.to_string(),
        }
    }

    /// Missing issue.
    pub fn issue_not_found(id: IssueId) -> Self {
        Self::NotFound {
            resource: "issue",
            id: id.to_string(),
        }
    }

    /// The field errors, when this is a validation failure.
    pub fn invalid_entry(&self) -> Option<&InvalidCostEntry> {
        match self {
            Self::Invalid(invalid) => Some(invalid),
            _ => None,
        }
    }
}

impl From<InvalidCostEntry> for CostEntryCommandError {
    fn from(invalid: InvalidCostEntry) -> Self {
        Self::Invalid(Box::new(invalid))
    }
}

impl From<CostEntryCommandError> for Error {
    fn from(error: CostEntryCommandError) -> Self {
        let message = error.to_string();
        match error {
            CostEntryCommandError::AuthorizationDenied { action, reason } => {
                Error::forbidden(message).with_details(json!({
                    "action": action,
                    "reason": reason.as_str(),
                }))
            }
            CostEntryCommandError::Invalid(invalid) => Error::invalid_request("cost entry is invalid")
                .with_details(json!({ "fields": invalid.errors.to_json() })),
            CostEntryCommandError::NotFound { resource, id } => {
                Error::not_found(message).with_details(json!({
                    "resource": resource,
                    "id": id,
                }))
            }
            CostEntryCommandError::Port(error) => error,
        }
    }
}

/// Driving port for cost entry operations.
///
/// # Authorisation
///
/// `prepare` and `create` need the create tier in the target project;
/// `edit`, `update` and `delete` need the edit tier in the entry's own
/// project. An `Own` tier only admits entries whose subject is the actor.
/// Denials are reported before any field is validated.
#[async_trait]
pub trait CostEntryCommand: Send + Sync {
    /// Blank form for a new entry with defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown issue and `AuthorizationDenied`
    /// when the actor may not log costs in the project.
    async fn prepare(
        &self,
        request: PrepareCostEntryRequest,
    ) -> Result<CostEntryDraft, CostEntryCommandError>;

    /// Log a new entry.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationDenied` or `Invalid` without persisting
    /// anything.
    async fn create(
        &self,
        request: CreateCostEntryRequest,
    ) -> Result<CostEntry, CostEntryCommandError>;

    /// Load a stored entry for editing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown entry and `AuthorizationDenied`
    /// when the actor may not edit it.
    async fn edit(&self, request: CostEntryLookup) -> Result<CostEntry, CostEntryCommandError>;

    /// Change a stored entry.
    ///
    /// Submitting the stored values again writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AuthorizationDenied` or `Invalid`.
    async fn update(
        &self,
        request: UpdateCostEntryRequest,
    ) -> Result<CostEntryUpdated, CostEntryCommandError>;

    /// Remove a stored entry, returning it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `AuthorizationDenied`.
    async fn delete(&self, request: CostEntryLookup) -> Result<CostEntry, CostEntryCommandError>;
}
