//! Field validation for cost entry submissions.
//!
//! Validation is pure: the service performs every collaborator lookup up
//! front and hands the results over as [`ResolvedReferences`]. All rules run
//! and every failure is collected before the submission is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    COMMENTS_MAX, CostEntry, CostEntryDraft, CostEntryField, CostEntryForm, FieldError,
    FieldErrors, InvalidCostEntry, Submitted,
};
use crate::domain::{CostEntryId, CostType, CostTypeId, Issue, IssueId, ProjectId, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// When the subject user must be a member of the entry's project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCheckPolicy {
    /// Every saved entry needs a member subject.
    #[default]
    Always,
    /// Only entries logged on behalf of someone else are checked.
    OnBehalfOnly,
}

impl MemberCheckPolicy {
    /// Whether membership of `subject` must be verified when `actor` saves.
    pub fn applies(self, subject: UserId, actor: UserId) -> bool {
        match self {
            Self::Always => true,
            Self::OnBehalfOnly => subject != actor,
        }
    }
}

/// Error returned for an unknown member check policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown member check policy '{0}', expected 'always' or 'on_behalf_only'")]
pub struct ParseMemberCheckPolicyError(String);

impl FromStr for MemberCheckPolicy {
    type Err = ParseMemberCheckPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "always" => Ok(Self::Always),
            "on_behalf_only" => Ok(Self::OnBehalfOnly),
            _ => Err(ParseMemberCheckPolicyError(s.to_owned())),
        }
    }
}

impl fmt::Display for MemberCheckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::OnBehalfOnly => f.write_str("on_behalf_only"),
        }
    }
}

/// Tunable rules applied by the cost entry service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPolicy {
    /// Scope of the subject membership check.
    pub member_check: MemberCheckPolicy,
    /// Whether host administrators hold every permission.
    pub admin_bypass: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            member_check: MemberCheckPolicy::Always,
            admin_bypass: true,
        }
    }
}

/// Collaborator lookups performed for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    /// The issue named by the submission, when it exists.
    pub issue: Option<Issue>,
    /// The cost type named by the submission, when it exists.
    pub cost_type: Option<CostType>,
    /// The project's active default cost type.
    pub default_cost_type: Option<CostType>,
    /// Membership of the subject; `None` when it was not looked up.
    pub subject_is_member: Option<bool>,
}

/// Who is saving what, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext<'a> {
    /// Project the entry is saved in.
    pub project_id: ProjectId,
    /// Acting user.
    pub actor: UserId,
    /// Current date used for defaults.
    pub today: NaiveDate,
    /// Membership scope.
    pub member_check: MemberCheckPolicy,
    /// The stored entry when updating; `None` when creating.
    pub stored: Option<&'a CostEntry>,
    /// Identifier given to a newly created entry.
    pub new_id: CostEntryId,
}

impl ValidationContext<'_> {
    fn is_create(&self) -> bool {
        self.stored.is_none()
    }
}

/// Validate `form` into a normalised entry.
///
/// # Errors
/// Returns [`InvalidCostEntry`] listing every failing field, together with
/// the resolvable part of the submission and the submission itself.
pub fn validate(
    form: &CostEntryForm,
    context: &ValidationContext<'_>,
    references: &ResolvedReferences,
) -> Result<CostEntry, InvalidCostEntry> {
    let mut errors = FieldErrors::default();
    let stored = context.stored;

    let issue_id = resolve_issue(form, context, references, &mut errors);
    let user_id = resolve_user(form, context, references, &mut errors);
    let cost_type_id = resolve_cost_type(form, context, references, &mut errors);

    let units = match form.units() {
        Submitted::Omitted if !context.is_create() => stored.map(|entry| entry.units),
        Submitted::Omitted | Submitted::Blank => {
            errors.add(CostEntryField::Units, FieldError::Blank);
            None
        }
        Submitted::Value(raw) => match Decimal::from_str(raw) {
            Ok(units) if units < Decimal::ZERO => {
                errors.add(CostEntryField::Units, FieldError::Negative);
                Some(units)
            }
            Ok(units) => Some(units),
            Err(_) => {
                errors.add(CostEntryField::Units, FieldError::NotANumber);
                None
            }
        },
    };

    let overridden_costs = match form.overridden_costs() {
        Submitted::Omitted => stored.and_then(|entry| entry.overridden_costs),
        Submitted::Blank => None,
        Submitted::Value(raw) => Decimal::from_str(raw).map_or_else(
            |_| {
                errors.add(CostEntryField::OverriddenCosts, FieldError::NotANumber);
                None
            },
            Some,
        ),
    };

    let spent_on = match form.spent_on().value() {
        None => Some(stored.map_or(context.today, |entry| entry.spent_on)),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).map_or_else(
            |_| {
                errors.add(CostEntryField::SpentOn, FieldError::InvalidDate);
                None
            },
            Some,
        ),
    };

    let comments = form.comments.clone().unwrap_or_else(|| {
        stored.map(|entry| entry.comments.clone()).unwrap_or_default()
    });
    if comments.chars().count() > COMMENTS_MAX {
        errors.add(
            CostEntryField::Comments,
            FieldError::TooLong { max: COMMENTS_MAX },
        );
    }

    let draft = CostEntryDraft {
        id: Some(stored.map_or(context.new_id, |entry| entry.id)),
        project_id: context.project_id,
        issue_id,
        user_id,
        cost_type_id,
        spent_on,
        units,
        overridden_costs,
        comments,
    };

    match (errors.is_empty(), draft.user_id, draft.spent_on, draft.units) {
        (true, Some(user_id), Some(spent_on), Some(units)) => Ok(CostEntry {
            id: draft.id.unwrap_or(context.new_id),
            project_id: draft.project_id,
            issue_id: draft.issue_id,
            user_id,
            cost_type_id: draft.cost_type_id,
            spent_on,
            units,
            overridden_costs: draft.overridden_costs,
            comments: draft.comments,
        }),
        _ => Err(InvalidCostEntry {
            draft,
            submitted: form.clone(),
            errors,
        }),
    }
}

fn resolve_issue(
    form: &CostEntryForm,
    context: &ValidationContext<'_>,
    references: &ResolvedReferences,
    errors: &mut FieldErrors,
) -> Option<IssueId> {
    let raw = match form.issue() {
        Submitted::Omitted => return context.stored.and_then(|entry| entry.issue_id),
        Submitted::Blank => return None,
        Submitted::Value(raw) => raw,
    };

    let found = IssueId::new(raw)
        .ok()
        .and_then(|id| references.issue.filter(|issue| issue.id == id));
    match found {
        None => {
            errors.add(CostEntryField::Issue, FieldError::NotFound);
            None
        }
        Some(issue) => {
            if issue.project_id != context.project_id {
                errors.add(CostEntryField::Issue, FieldError::WrongProject);
            }
            Some(issue.id)
        }
    }
}

fn resolve_user(
    form: &CostEntryForm,
    context: &ValidationContext<'_>,
    references: &ResolvedReferences,
    errors: &mut FieldErrors,
) -> Option<UserId> {
    let fallback = context.stored.map_or(context.actor, |entry| entry.user_id);
    let Ok(subject) = form.subject_or(fallback) else {
        errors.add(CostEntryField::User, FieldError::Invalid);
        return None;
    };

    if context.member_check.applies(subject, context.actor)
        && references.subject_is_member != Some(true)
    {
        errors.add(CostEntryField::User, FieldError::NotAMember);
    }
    Some(subject)
}

fn resolve_cost_type(
    form: &CostEntryForm,
    context: &ValidationContext<'_>,
    references: &ResolvedReferences,
    errors: &mut FieldErrors,
) -> Option<CostTypeId> {
    let Some(raw) = form.cost_type().value() else {
        return match context.stored {
            Some(entry) => entry.cost_type_id,
            None => references
                .default_cost_type
                .as_ref()
                .filter(|cost_type| cost_type.active)
                .map(|cost_type| cost_type.id),
        };
    };

    let usable = CostTypeId::new(raw).ok().and_then(|id| {
        references
            .cost_type
            .as_ref()
            .filter(|cost_type| cost_type.id == id && cost_type.active)
    });
    match usable {
        Some(cost_type) => Some(cost_type.id),
        None => {
            errors.add(CostEntryField::CostType, FieldError::Invalid);
            None
        }
    }
}
