//! Cost entry records, submissions, and field-level validation results.
//!
//! A [`CostEntryForm`] is what a caller submits: raw strings, each optional.
//! Validation turns it into a normalised [`CostEntry`] or rejects it with an
//! [`InvalidCostEntry`] carrying every field problem at once together with a
//! [`CostEntryDraft`] echo for redisplay.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{CostEntryId, CostLoggable, CostTypeId, IssueId, ProjectId, UserId};

mod validation;

pub use validation::{
    MemberCheckPolicy, ParseMemberCheckPolicyError, ResolvedReferences, ValidationContext,
    ValidationPolicy, validate,
};

/// Maximum number of characters accepted in `comments`.
pub const COMMENTS_MAX: usize = 255;

/// A logged unit of cost against a project.
///
/// ## Invariants
/// - `issue_id`, when set, names an issue of `project_id`.
/// - `cost_type_id`, when set, named an active cost type when last saved.
/// - `units` is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntry {
    /// Stable identifier.
    pub id: CostEntryId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Optional issue the cost was spent on.
    pub issue_id: Option<IssueId>,
    /// Subject user the cost is logged for.
    pub user_id: UserId,
    /// Optional cost category.
    pub cost_type_id: Option<CostTypeId>,
    /// Day the cost was incurred.
    pub spent_on: NaiveDate,
    /// Quantity of the cost type consumed.
    pub units: Decimal,
    /// Manually entered total replacing the computed cost.
    pub overridden_costs: Option<Decimal>,
    /// Free text.
    pub comments: String,
}

impl CostLoggable for CostEntry {
    fn subject_user(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

/// Partially resolved entry used to prefill or redisplay a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntryDraft {
    /// Identifier of the stored entry being edited, if any.
    pub id: Option<CostEntryId>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Issue, when it resolved.
    pub issue_id: Option<IssueId>,
    /// Subject user, when it parsed.
    pub user_id: Option<UserId>,
    /// Cost type, when it resolved to an active type.
    pub cost_type_id: Option<CostTypeId>,
    /// Day the cost was incurred, when it parsed.
    pub spent_on: Option<NaiveDate>,
    /// Units, when they parsed.
    pub units: Option<Decimal>,
    /// Overridden costs, when they parsed.
    pub overridden_costs: Option<Decimal>,
    /// Free text.
    pub comments: String,
}

impl CostEntryDraft {
    /// An empty draft for `project_id`.
    pub fn blank(project_id: ProjectId) -> Self {
        Self {
            id: None,
            project_id,
            issue_id: None,
            user_id: None,
            cost_type_id: None,
            spent_on: None,
            units: None,
            overridden_costs: None,
            comments: String::new(),
        }
    }
}

impl From<&CostEntry> for CostEntryDraft {
    fn from(entry: &CostEntry) -> Self {
        Self {
            id: Some(entry.id),
            project_id: entry.project_id,
            issue_id: entry.issue_id,
            user_id: Some(entry.user_id),
            cost_type_id: entry.cost_type_id,
            spent_on: Some(entry.spent_on),
            units: Some(entry.units),
            overridden_costs: entry.overridden_costs,
            comments: entry.comments.clone(),
        }
    }
}

impl CostLoggable for CostEntryDraft {
    fn subject_user(&self) -> Option<UserId> {
        self.user_id
    }
}

/// Raw cost entry submission.
///
/// `None` means the field was not submitted at all; `Some("")` means it
/// was submitted empty. The distinction matters on update, where omitted
/// fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostEntryForm {
    /// Subject user id.
    pub user_id: Option<String>,
    /// Issue id.
    pub issue_id: Option<String>,
    /// Cost type id.
    pub cost_type_id: Option<String>,
    /// Decimal units.
    pub units: Option<String>,
    /// Decimal override of the computed costs.
    pub overridden_costs: Option<String>,
    /// `YYYY-MM-DD` date.
    pub spent_on: Option<String>,
    /// Free text.
    pub comments: Option<String>,
}

/// How a single form field was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted<'a> {
    /// Not part of the submission.
    Omitted,
    /// Present but empty or whitespace.
    Blank,
    /// Present with a trimmed, non-empty value.
    Value(&'a str),
}

impl<'a> Submitted<'a> {
    /// Classify a raw optional form value.
    pub fn of(raw: Option<&'a str>) -> Self {
        match raw.map(str::trim) {
            None => Self::Omitted,
            Some("") => Self::Blank,
            Some(value) => Self::Value(value),
        }
    }

    /// The value, treating blank input as omitted.
    pub const fn value(self) -> Option<&'a str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Omitted | Self::Blank => None,
        }
    }
}

impl CostEntryForm {
    /// Submitted subject user.
    pub fn user(&self) -> Submitted<'_> {
        Submitted::of(self.user_id.as_deref())
    }

    /// Submitted issue.
    pub fn issue(&self) -> Submitted<'_> {
        Submitted::of(self.issue_id.as_deref())
    }

    /// Submitted cost type.
    pub fn cost_type(&self) -> Submitted<'_> {
        Submitted::of(self.cost_type_id.as_deref())
    }

    /// Submitted units.
    pub fn units(&self) -> Submitted<'_> {
        Submitted::of(self.units.as_deref())
    }

    /// Submitted overridden costs.
    pub fn overridden_costs(&self) -> Submitted<'_> {
        Submitted::of(self.overridden_costs.as_deref())
    }

    /// Submitted date.
    pub fn spent_on(&self) -> Submitted<'_> {
        Submitted::of(self.spent_on.as_deref())
    }

    /// Requested subject, falling back to `fallback` when none was given.
    ///
    /// Returns `Err` with the raw value when the submitted id is malformed.
    pub fn subject_or(&self, fallback: UserId) -> Result<UserId, String> {
        match self.user().value() {
            None => Ok(fallback),
            Some(raw) => UserId::new(raw).map_err(|_| raw.to_owned()),
        }
    }
}

/// Form fields that can carry validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEntryField {
    /// `issue_id`.
    Issue,
    /// `user_id`.
    User,
    /// `cost_type_id`.
    CostType,
    /// `units`.
    Units,
    /// `overridden_costs`.
    OverriddenCosts,
    /// `spent_on`.
    SpentOn,
    /// `comments`.
    Comments,
}

impl CostEntryField {
    /// Stable field name used in error payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::User => "user",
            Self::CostType => "cost_type",
            Self::Units => "units",
            Self::OverriddenCosts => "overridden_costs",
            Self::SpentOn => "spent_on",
            Self::Comments => "comments",
        }
    }
}

impl fmt::Display for CostEntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    /// The referenced record does not exist.
    #[error("not found")]
    NotFound,
    /// The referenced issue belongs to another project.
    #[error("belongs to a different project")]
    WrongProject,
    /// The subject user is not a member of the project.
    #[error("is not a member of the project")]
    NotAMember,
    /// The value is malformed or references an unusable record.
    #[error("is invalid")]
    Invalid,
    /// A required value is missing.
    #[error("can't be blank")]
    Blank,
    /// The value is not a decimal number.
    #[error("is not a number")]
    NotANumber,
    /// The value must not be negative.
    #[error("must be greater than or equal to 0")]
    Negative,
    /// The value is not a `YYYY-MM-DD` date.
    #[error("is not a valid date")]
    InvalidDate,
    /// The value exceeds the permitted length.
    #[error("is too long (maximum is {max} characters)")]
    TooLong {
        /// Maximum number of characters.
        max: usize,
    },
}

impl FieldError {
    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::WrongProject => "wrong_project",
            Self::NotAMember => "not_a_member",
            Self::Invalid => "invalid",
            Self::Blank => "blank",
            Self::NotANumber => "not_a_number",
            Self::Negative => "negative",
            Self::InvalidDate => "invalid_date",
            Self::TooLong { .. } => "too_long",
        }
    }
}

/// Field errors collected while validating one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<CostEntryField, Vec<FieldError>>);

impl FieldErrors {
    /// Record `error` against `field`.
    pub fn add(&mut self, field: CostEntryField, error: FieldError) {
        self.0.entry(field).or_default().push(error);
    }

    /// Whether no error was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Errors recorded against `field`.
    pub fn get(&self, field: CostEntryField) -> &[FieldError] {
        self.0.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Whether `error` was recorded against `field`.
    pub fn contains(&self, field: CostEntryField, error: FieldError) -> bool {
        self.get(field).contains(&error)
    }

    /// Iterate fields in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (CostEntryField, &[FieldError])> {
        self.0.iter().map(|(field, errors)| (*field, errors.as_slice()))
    }

    /// Render as `{ field: [code, ...] }`.
    pub fn to_json(&self) -> Value {
        let fields: serde_json::Map<String, Value> = self
            .iter()
            .map(|(field, errors)| {
                let codes = errors.iter().map(|error| json!(error.code())).collect();
                (field.as_str().to_owned(), Value::Array(codes))
            })
            .collect();
        Value::Object(fields)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in self.iter() {
            for error in errors {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A rejected submission: what could be resolved, what was sent, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidCostEntry {
    /// Values resolved from the submission, for redisplay.
    pub draft: CostEntryDraft,
    /// The submission exactly as received.
    pub submitted: CostEntryForm,
    /// Every field problem found.
    pub errors: FieldErrors,
}
