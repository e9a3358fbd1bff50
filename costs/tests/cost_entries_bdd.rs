//! Behaviour tests for authorising and validating cost entries.

use std::str::FromStr;

use costs::domain::ports::{CostEntryCommandError, CostEntryCommitted};
use costs::domain::{CostEntryForm, CostEntryId, CostTypeId, IssueId};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rust_decimal::Decimal;

#[path = "support/ledger_world.rs"]
mod ledger_world;

use ledger_world::{LedgerWorld, unquote};

#[fixture]
fn world() -> LedgerWorld {
    LedgerWorld::new()
}

fn decimal(raw: &str) -> Decimal {
    Decimal::from_str(unquote(raw)).expect("decimal in feature file")
}

fn units_form(units: &str) -> CostEntryForm {
    CostEntryForm {
        units: Some(unquote(units).to_owned()),
        ..CostEntryForm::default()
    }
}

#[given("{user} is a member with permission {permission}")]
fn member_with_permission(world: &LedgerWorld, user: String, permission: String) {
    world.add_member(&user, &permission);
}

#[given("{user} is an outsider")]
fn outsider(world: &LedgerWorld, user: String) {
    world.add_outsider(&user);
}

#[given("{user} is an administrator")]
fn administrator(world: &LedgerWorld, user: String) {
    world.add_admin(&user);
}

#[given("{user} is acting")]
fn acting(world: &LedgerWorld, user: String) {
    world.act_as(&user);
}

#[given("{user} has a stored entry")]
fn stored_entry(world: &LedgerWorld, user: String) {
    world.seed_entry(&user);
}

#[given("the non-member role has permission {permission}")]
fn non_member_permission(world: &LedgerWorld, permission: String) {
    world.grant_non_members(&permission);
}

#[given("the member check applies only on behalf of others")]
fn member_check_on_behalf_only(world: &LedgerWorld) {
    world.check_membership_on_behalf_only();
}

#[given("the cost type {name} is deleted")]
fn deleted_cost_type(world: &LedgerWorld, name: String) {
    world.delete_cost_type(&name);
}

#[given("the cost type {name} is the default")]
fn default_cost_type(world: &LedgerWorld, name: String) {
    world.make_default(&name);
}

#[given("an issue {issue} belongs to another project")]
fn foreign_issue(world: &LedgerWorld, issue: String) {
    world.add_foreign_issue(&issue);
}

#[when("a cost entry is created for {user} with units {units}")]
fn create_for(world: &LedgerWorld, user: String, units: String) {
    let form = CostEntryForm {
        user_id: Some(world.user(&user).to_string()),
        ..units_form(&units)
    };
    world.create(form);
}

#[when("{user} logs {units} units of {cost_type} on {date} with overridden costs {costs}")]
fn log_complete(
    world: &LedgerWorld,
    user: String,
    units: String,
    cost_type: String,
    date: String,
    costs: String,
) {
    let form = CostEntryForm {
        user_id: Some(world.user(&user).to_string()),
        cost_type_id: Some(world.cost_type(&cost_type).id.to_string()),
        spent_on: Some(unquote(&date).to_owned()),
        overridden_costs: Some(unquote(&costs).to_owned()),
        comments: Some("Installation".to_owned()),
        ..units_form(&units)
    };
    world.create(form);
}

#[when("a cost entry is created with an unknown cost type")]
fn create_with_unknown_cost_type(world: &LedgerWorld) {
    let form = CostEntryForm {
        cost_type_id: Some(CostTypeId::random().to_string()),
        ..units_form("1")
    };
    world.create(form);
}

#[when("a cost entry is created against issue {issue}")]
fn create_against_issue(world: &LedgerWorld, issue: String) {
    let form = CostEntryForm {
        issue_id: Some(world.issue(&issue).id.to_string()),
        ..units_form("1")
    };
    world.create(form);
}

#[when("a cost entry is created with units {units} and date {date}")]
fn create_with_units_and_date(world: &LedgerWorld, units: String, date: String) {
    let form = CostEntryForm {
        spent_on: Some(unquote(&date).to_owned()),
        ..units_form(&units)
    };
    world.create(form);
}

#[when("the stored entry is updated with units {units}")]
fn update_units(world: &LedgerWorld, units: String) {
    let form = CostEntryForm {
        units: Some(unquote(&units).to_owned()),
        ..world.resubmission()
    };
    world.update(world.stored_entry().id, form);
}

#[when("the stored entry is moved to an unknown issue")]
fn move_to_unknown_issue(world: &LedgerWorld) {
    let form = CostEntryForm {
        issue_id: Some(IssueId::random().to_string()),
        ..world.resubmission()
    };
    world.update(world.stored_entry().id, form);
}

#[when("the stored entry is switched to the cost type {name}")]
fn switch_cost_type(world: &LedgerWorld, name: String) {
    let form = CostEntryForm {
        cost_type_id: Some(world.cost_type(&name).id.to_string()),
        ..world.resubmission()
    };
    world.update(world.stored_entry().id, form);
}

#[when("the stored entry is resubmitted unchanged")]
fn resubmit_unchanged(world: &LedgerWorld) {
    world.update(world.stored_entry().id, world.resubmission());
}

#[when("the stored entry is opened for editing")]
fn open_for_editing(world: &LedgerWorld) {
    world.edit(world.stored_entry().id);
}

#[when("the stored entry is deleted")]
fn delete_stored(world: &LedgerWorld) {
    world.delete(world.stored_entry().id);
}

#[when("an unknown entry is deleted")]
fn delete_unknown(world: &LedgerWorld) {
    world.delete(CostEntryId::random());
}

#[then("the entry is persisted for {user}")]
fn persisted_for(world: &LedgerWorld, user: String) {
    let entry = world.entry();
    assert_eq!(entry.user_id, world.user(&user));
    assert_eq!(world.persisted(entry.id), Some(entry));
}

#[then("the entry has units {units}")]
fn entry_units(world: &LedgerWorld, units: String) {
    assert_eq!(world.entry().units, decimal(&units));
}

#[then("the entry has overridden costs {costs}")]
fn entry_overridden_costs(world: &LedgerWorld, costs: String) {
    assert_eq!(world.entry().overridden_costs, Some(decimal(&costs)));
}

#[then("the entry was spent on {date}")]
fn entry_spent_on(world: &LedgerWorld, date: String) {
    assert_eq!(world.entry().spent_on.to_string(), unquote(&date));
}

#[then("the entry was spent today")]
fn entry_spent_today(world: &LedgerWorld) {
    assert_eq!(world.entry().spent_on, world.today());
}

#[then("the entry uses the cost type {name}")]
fn entry_cost_type(world: &LedgerWorld, name: String) {
    assert_eq!(world.entry().cost_type_id, Some(world.cost_type(&name).id));
}

#[then("the entry has no cost type")]
fn entry_without_cost_type(world: &LedgerWorld) {
    assert_eq!(world.entry().cost_type_id, None);
}

#[then("the stored entry has units {units}")]
fn stored_units(world: &LedgerWorld, units: String) {
    let stored = world
        .persisted(world.stored_entry().id)
        .expect("stored entry persists");
    assert_eq!(stored.units, decimal(&units));
}

#[then("the stored entry no longer exists")]
fn stored_removed(world: &LedgerWorld) {
    assert_eq!(world.persisted(world.stored_entry().id), None);
}

#[then("the update reports no change")]
fn update_unchanged(world: &LedgerWorld) {
    let updated = world.updated();
    assert!(!updated.changed);
    assert_eq!(updated.entry, world.stored_entry());
}

#[then("the request is denied because {reason}")]
fn denied_because(world: &LedgerWorld, reason: String) {
    match world.error() {
        CostEntryCommandError::AuthorizationDenied { reason: actual, .. } => {
            assert_eq!(actual.as_str(), unquote(&reason));
        }
        other => panic!("expected a denial, got {other}"),
    }
}

#[then("the request reports not found")]
fn reports_not_found(world: &LedgerWorld) {
    let error = world.error();
    assert!(
        matches!(error, CostEntryCommandError::NotFound { .. }),
        "expected not found, got {error}"
    );
}

#[then("the field {field} is rejected with {code}")]
fn field_rejected(world: &LedgerWorld, field: String, code: String) {
    let codes = world.field_codes(&field);
    assert!(
        codes.contains(&unquote(&code)),
        "expected {code} on {field}, got {codes:?}"
    );
}

#[then("a created event is committed")]
fn created_committed(world: &LedgerWorld) {
    let events = world.committed();
    assert!(matches!(events.as_slice(), [CostEntryCommitted::Created(_)]));
}

#[then("an updated event is committed")]
fn updated_committed(world: &LedgerWorld) {
    let events = world.committed();
    assert!(matches!(events.as_slice(), [CostEntryCommitted::Updated(_)]));
}

#[then("a deleted event is committed")]
fn deleted_committed(world: &LedgerWorld) {
    let events = world.committed();
    assert!(matches!(events.as_slice(), [CostEntryCommitted::Deleted(_)]));
}

#[then("nothing is committed")]
fn nothing_committed(world: &LedgerWorld) {
    assert!(world.committed().is_empty());
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Blanket permission logs costs for another member"
)]
fn blanket_permission_logs_for_member(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Own permission cannot log costs for another user"
)]
fn own_permission_cannot_log_for_others(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Own permission logs costs for the actor"
)]
fn own_permission_logs_for_actor(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Members without a cost permission are denied"
)]
fn members_without_permission_are_denied(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Own edit permission cannot touch a foreign entry"
)]
fn own_edit_cannot_touch_foreign_entry(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Blanket edit permission updates a foreign entry"
)]
fn blanket_edit_updates_foreign_entry(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Users without a role in the project cannot open an entry"
)]
fn outsiders_cannot_open_entry(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Member-only permissions on the non-member role grant nothing"
)]
fn non_member_role_member_only_permission(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Administrators log costs without a role"
)]
fn administrators_log_without_role(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Deleting a missing entry reports not found"
)]
fn deleting_missing_entry(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_authorization.feature",
    name = "Deleting an entry removes it"
)]
fn deleting_entry_removes_it(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "A complete submission is persisted"
)]
fn complete_submission_is_persisted(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "An unknown cost type is rejected"
)]
fn unknown_cost_type_is_rejected(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "An issue from another project is rejected"
)]
fn foreign_issue_is_rejected(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "Moving an entry to an unknown issue is rejected"
)]
fn unknown_issue_on_update_is_rejected(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "Switching an entry to a deleted cost type is rejected"
)]
fn deleted_cost_type_on_update_is_rejected(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "An omitted date defaults to today"
)]
fn omitted_date_defaults_to_today(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "An omitted cost type falls back to the default"
)]
fn omitted_cost_type_uses_default(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "An omitted cost type stays unset without a default"
)]
fn omitted_cost_type_without_default(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "Resubmitting an unchanged entry writes nothing"
)]
fn unchanged_resubmission_writes_nothing(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "Every failing field is reported together"
)]
fn failing_fields_reported_together(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "The subject must be a project member"
)]
fn subject_must_be_member(world: LedgerWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/cost_entry_validation.feature",
    name = "Outsiders may log for themselves when only on-behalf entries are checked"
)]
fn outsiders_log_for_themselves_on_behalf_only(world: LedgerWorld) {
    drop(world);
}
