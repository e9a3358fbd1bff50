//! Cost entry domain service.
//!
//! Implements [`CostEntryCommand`] over the driven ports. Every write runs
//! through the same sequence: resolve the actor's tier in the project, apply
//! the ownership rule, look up the referenced records, validate, persist, and
//! finally notify the commit hook.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CostEntryCommand, CostEntryCommandError, CostEntryCommitHook, CostEntryCommitted,
    CostEntryLookup, CostEntryRepository, CostEntryRepositoryError, CostEntryUpdated,
    CostTypeRepository, CostTypeRepositoryError, CreateCostEntryRequest, DenialReason,
    IssueTracker, IssueTrackerError, PrepareCostEntryRequest, PrepareScope, ProjectMembership,
    ProjectMembershipError, UpdateCostEntryRequest,
};
use crate::domain::{
    Actor, CostAction, CostEntry, CostEntryDraft, CostEntryForm, CostEntryId, CostLoggable,
    CostType, CostTypeId, Error, IssueId, PermissionTier, ProjectId, ResolvedReferences, UserId,
    ValidationContext, ValidationPolicy, resolve_tier, validate,
};

type CommandResult<T> = Result<T, CostEntryCommandError>;

fn map_membership_error(error: ProjectMembershipError) -> CostEntryCommandError {
    let error = match error {
        ProjectMembershipError::Connection { message } => {
            Error::service_unavailable(format!("project membership unavailable: {message}"))
        }
        ProjectMembershipError::Query { message } => {
            Error::internal(format!("project membership error: {message}"))
        }
    };
    error.into()
}

fn map_issue_error(error: IssueTrackerError) -> CostEntryCommandError {
    let error = match error {
        IssueTrackerError::Connection { message } => {
            Error::service_unavailable(format!("issue tracker unavailable: {message}"))
        }
        IssueTrackerError::Query { message } => {
            Error::internal(format!("issue tracker error: {message}"))
        }
    };
    error.into()
}

fn map_cost_type_error(error: CostTypeRepositoryError) -> CostEntryCommandError {
    let error = match error {
        CostTypeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("cost type repository unavailable: {message}"))
        }
        CostTypeRepositoryError::Query { message } => {
            Error::internal(format!("cost type repository error: {message}"))
        }
    };
    error.into()
}

fn map_entry_error(error: CostEntryRepositoryError) -> CostEntryCommandError {
    match error {
        CostEntryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("cost entry repository unavailable: {message}"))
                .into()
        }
        CostEntryRepositoryError::Query { message } => {
            Error::internal(format!("cost entry repository error: {message}")).into()
        }
        CostEntryRepositoryError::DuplicateId { id } => {
            Error::internal(format!("unexpected cost entry id collision: {id}")).into()
        }
        CostEntryRepositoryError::Missing { id } => CostEntryCommandError::NotFound {
            resource: "cost entry",
            id,
        },
    }
}

/// Driven ports consumed by [`CostEntryService`].
#[derive(Debug)]
pub struct CostEntryPorts<M, I, T, R, H> {
    /// Membership and role lookups.
    pub membership: Arc<M>,
    /// Issue lookups.
    pub issues: Arc<I>,
    /// Cost type lookups.
    pub cost_types: Arc<T>,
    /// Entry storage.
    pub entries: Arc<R>,
    /// Post-commit notifications.
    pub hook: Arc<H>,
}

impl<M, I, T, R, H> Clone for CostEntryPorts<M, I, T, R, H> {
    fn clone(&self) -> Self {
        Self {
            membership: Arc::clone(&self.membership),
            issues: Arc::clone(&self.issues),
            cost_types: Arc::clone(&self.cost_types),
            entries: Arc::clone(&self.entries),
            hook: Arc::clone(&self.hook),
        }
    }
}

/// Cost entry service implementing the driving port.
#[derive(Clone)]
pub struct CostEntryService<M, I, T, R, H> {
    ports: CostEntryPorts<M, I, T, R, H>,
    clock: Arc<dyn Clock>,
    policy: ValidationPolicy,
}

impl<M, I, T, R, H> CostEntryService<M, I, T, R, H> {
    /// Create a service with the default [`ValidationPolicy`].
    pub fn new(ports: CostEntryPorts<M, I, T, R, H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            clock,
            policy: ValidationPolicy::default(),
        }
    }

    /// Replace the validation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The policy in force.
    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }
}

impl<M, I, T, R, H> CostEntryService<M, I, T, R, H>
where
    M: ProjectMembership,
    I: IssueTracker,
    T: CostTypeRepository,
    R: CostEntryRepository,
    H: CostEntryCommitHook,
{
    async fn tier(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        action: CostAction,
    ) -> CommandResult<PermissionTier> {
        if actor.is_admin() && self.policy.admin_bypass {
            return Ok(PermissionTier::All);
        }
        let roles = self
            .ports
            .membership
            .roles_of(&actor.user_id(), project_id)
            .await
            .map_err(map_membership_error)?;
        Ok(resolve_tier(&roles, action))
    }

    async fn authorize(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        action: CostAction,
    ) -> CommandResult<PermissionTier> {
        let tier = self.tier(actor, project_id, action).await?;
        if tier == PermissionTier::None {
            return Err(deny(actor, project_id, action, DenialReason::NoPermission));
        }
        Ok(tier)
    }

    /// Load `entry_id` and authorise editing it in its own project.
    async fn authorize_stored(
        &self,
        actor: &Actor,
        entry_id: CostEntryId,
    ) -> CommandResult<(CostEntry, PermissionTier)> {
        let entry = self
            .ports
            .entries
            .find(&entry_id)
            .await
            .map_err(map_entry_error)?
            .ok_or_else(|| CostEntryCommandError::entry_not_found(entry_id))?;

        let tier = self
            .authorize(actor, &entry.project_id, CostAction::Edit)
            .await?;
        if !tier.permits(entry.is_own(actor)) {
            return Err(deny(
                actor,
                &entry.project_id,
                CostAction::Edit,
                DenialReason::ForeignEntry,
            ));
        }
        Ok((entry, tier))
    }

    async fn resolve_references(
        &self,
        form: &CostEntryForm,
        context: &ValidationContext<'_>,
    ) -> CommandResult<ResolvedReferences> {
        let issue = match form.issue().value().and_then(|raw| IssueId::new(raw).ok()) {
            Some(issue_id) => self
                .ports
                .issues
                .find_issue(&issue_id)
                .await
                .map_err(map_issue_error)?,
            None => None,
        };

        let requested_type = form.cost_type().value();
        let cost_type = match requested_type.and_then(|raw| CostTypeId::new(raw).ok()) {
            Some(cost_type_id) => self
                .ports
                .cost_types
                .find(&cost_type_id)
                .await
                .map_err(map_cost_type_error)?,
            None => None,
        };

        let default_cost_type = if context.stored.is_none() && requested_type.is_none() {
            self.default_cost_type(&context.project_id).await?
        } else {
            None
        };

        let fallback = context
            .stored
            .map_or(context.actor, |entry| entry.user_id);
        let subject_is_member = match form.subject_or(fallback) {
            Ok(subject) if context.member_check.applies(subject, context.actor) => Some(
                self.ports
                    .membership
                    .is_member(&subject, &context.project_id)
                    .await
                    .map_err(map_membership_error)?,
            ),
            _ => None,
        };

        Ok(ResolvedReferences {
            issue,
            cost_type,
            default_cost_type,
            subject_is_member,
        })
    }

    async fn default_cost_type(
        &self,
        project_id: &ProjectId,
    ) -> CommandResult<Option<CostType>> {
        let default = self
            .ports
            .membership
            .default_cost_type(project_id)
            .await
            .map_err(map_membership_error)?;
        Ok(default.filter(|cost_type| cost_type.active))
    }

    async fn notify(&self, event: CostEntryCommitted) {
        if let Err(error) = self.ports.hook.after_commit(&event).await {
            warn!(entry_id = %event.entry().id, %error, "cost entry commit hook failed");
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}

fn deny(
    actor: &Actor,
    project_id: &ProjectId,
    action: CostAction,
    reason: DenialReason,
) -> CostEntryCommandError {
    warn!(
        actor = %actor.user_id(),
        project = %project_id,
        %action,
        reason = reason.as_str(),
        "cost entry request denied"
    );
    CostEntryCommandError::denied(action, reason)
}

/// Apply the on-behalf rule: under an `Own` tier the subject must be the
/// actor. Unparsable subjects are treated as foreign.
fn check_subject(
    actor: &Actor,
    project_id: &ProjectId,
    action: CostAction,
    tier: PermissionTier,
    form: &CostEntryForm,
    fallback: UserId,
) -> CommandResult<()> {
    if tier == PermissionTier::All {
        return Ok(());
    }
    match form.subject_or(fallback) {
        Ok(subject) if subject == actor.user_id() => Ok(()),
        _ => Err(deny(actor, project_id, action, DenialReason::OnBehalfOfOther)),
    }
}

#[async_trait]
impl<M, I, T, R, H> CostEntryCommand for CostEntryService<M, I, T, R, H>
where
    M: ProjectMembership,
    I: IssueTracker,
    T: CostTypeRepository,
    R: CostEntryRepository,
    H: CostEntryCommitHook,
{
    async fn prepare(&self, request: PrepareCostEntryRequest) -> CommandResult<CostEntryDraft> {
        let PrepareCostEntryRequest { actor, scope } = request;
        let (project_id, issue_id) = match scope {
            PrepareScope::Project(project_id) => (project_id, None),
            PrepareScope::Issue(issue_id) => {
                let issue = self
                    .ports
                    .issues
                    .find_issue(&issue_id)
                    .await
                    .map_err(map_issue_error)?
                    .ok_or_else(|| CostEntryCommandError::issue_not_found(issue_id))?;
                (issue.project_id, Some(issue.id))
            }
        };

        self.authorize(&actor, &project_id, CostAction::Create)
            .await?;

        let default_cost_type = self.default_cost_type(&project_id).await?;
        Ok(CostEntryDraft {
            issue_id,
            user_id: Some(actor.user_id()),
            cost_type_id: default_cost_type.map(|cost_type| cost_type.id),
            spent_on: Some(self.today()),
            ..CostEntryDraft::blank(project_id)
        })
    }

    async fn create(&self, request: CreateCostEntryRequest) -> CommandResult<CostEntry> {
        let CreateCostEntryRequest {
            actor,
            project_id,
            form,
        } = request;

        let tier = self
            .authorize(&actor, &project_id, CostAction::Create)
            .await?;
        check_subject(
            &actor,
            &project_id,
            CostAction::Create,
            tier,
            &form,
            actor.user_id(),
        )?;

        let context = ValidationContext {
            project_id,
            actor: actor.user_id(),
            today: self.today(),
            member_check: self.policy.member_check,
            stored: None,
            new_id: CostEntryId::random(),
        };
        let references = self.resolve_references(&form, &context).await?;
        let entry = validate(&form, &context, &references).inspect_err(|invalid| {
            debug!(project = %project_id, errors = %invalid.errors, "cost entry rejected");
        })?;

        self.ports
            .entries
            .insert(&entry)
            .await
            .map_err(map_entry_error)?;
        info!(
            entry_id = %entry.id,
            project = %entry.project_id,
            user = %entry.user_id,
            "cost entry created"
        );
        self.notify(CostEntryCommitted::Created(entry.clone())).await;
        Ok(entry)
    }

    async fn edit(&self, request: CostEntryLookup) -> CommandResult<CostEntry> {
        let (entry, _) = self
            .authorize_stored(&request.actor, request.entry_id)
            .await?;
        Ok(entry)
    }

    async fn update(&self, request: UpdateCostEntryRequest) -> CommandResult<CostEntryUpdated> {
        let UpdateCostEntryRequest {
            actor,
            entry_id,
            form,
        } = request;

        let (stored, tier) = self.authorize_stored(&actor, entry_id).await?;
        check_subject(
            &actor,
            &stored.project_id,
            CostAction::Edit,
            tier,
            &form,
            stored.user_id,
        )?;

        let context = ValidationContext {
            project_id: stored.project_id,
            actor: actor.user_id(),
            today: self.today(),
            member_check: self.policy.member_check,
            stored: Some(&stored),
            new_id: stored.id,
        };
        let references = self.resolve_references(&form, &context).await?;
        let entry = validate(&form, &context, &references).inspect_err(|invalid| {
            debug!(entry_id = %entry_id, errors = %invalid.errors, "cost entry update rejected");
        })?;

        // Decimal equality ignores scale; hand back the stored row verbatim.
        if entry == stored {
            debug!(entry_id = %entry_id, "cost entry unchanged");
            return Ok(CostEntryUpdated {
                entry: stored,
                changed: false,
            });
        }

        self.ports
            .entries
            .update(&entry)
            .await
            .map_err(map_entry_error)?;
        info!(entry_id = %entry.id, project = %entry.project_id, "cost entry updated");
        self.notify(CostEntryCommitted::Updated(entry.clone())).await;
        Ok(CostEntryUpdated {
            entry,
            changed: true,
        })
    }

    async fn delete(&self, request: CostEntryLookup) -> CommandResult<CostEntry> {
        let (entry, _) = self
            .authorize_stored(&request.actor, request.entry_id)
            .await?;

        self.ports
            .entries
            .delete(&entry.id)
            .await
            .map_err(map_entry_error)?;
        info!(entry_id = %entry.id, project = %entry.project_id, "cost entry deleted");
        self.notify(CostEntryCommitted::Deleted(entry.clone())).await;
        Ok(entry)
    }
}

#[cfg(test)]
#[path = "cost_entry_service_tests.rs"]
mod tests;
