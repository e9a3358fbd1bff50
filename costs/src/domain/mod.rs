//! Domain primitives, rules, and services for cost entries.
//!
//! Purpose: define the strongly typed records the cost rules operate on, the
//! permission model that gates them, and the service orchestrating both over
//! the ports in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - CostEntry / CostEntryForm / CostEntryDraft: stored, submitted, and
//!   redisplayed shapes of an entry.
//! - Permission / Role / PermissionTier and [`resolve_tier`]: authorisation.
//! - [`validate`]: field rules turning a form into an entry.
//! - CostEntryService: the driving port implementation.

pub mod error;
pub mod ports;

mod actor;
mod cost_entry;
mod cost_entry_service;
mod cost_type;
mod ids;
mod ownership;
mod permission;

pub use self::actor::Actor;
pub use self::cost_entry::{
    COMMENTS_MAX, CostEntry, CostEntryDraft, CostEntryField, CostEntryForm, FieldError,
    FieldErrors, InvalidCostEntry, MemberCheckPolicy, ParseMemberCheckPolicyError,
    ResolvedReferences, Submitted, ValidationContext, ValidationPolicy, validate,
};
pub use self::cost_entry_service::{CostEntryPorts, CostEntryService};
pub use self::cost_type::{CostType, HasDefaultCostType, Issue};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{CostEntryId, CostTypeId, IdValidationError, IssueId, ProjectId, UserId};
pub use self::ownership::CostLoggable;
pub use self::permission::{
    CostAction, ParsePermissionError, Permission, PermissionRequirement, PermissionTier,
    ProjectModule, Role, RoleKind, resolve_tier,
};
