//! Scenario world for cost entry behaviour tests.
//!
//! Runs the real service over the in-memory adapters. Users, cost types and
//! issues are addressed by the names used in the feature files.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use costs::domain::ports::{
    CostEntryCommand, CostEntryCommandError, CostEntryCommitted, CostEntryLookup,
    CostEntryUpdated, CreateCostEntryRequest, UpdateCostEntryRequest,
};
use costs::domain::{
    Actor, CostEntry, CostEntryForm, CostEntryId, CostEntryPorts, CostEntryService, CostType,
    CostTypeId, Issue, IssueId, MemberCheckPolicy, Permission, ProjectId, Role, UserId,
    ValidationPolicy,
};
use costs::outbound::memory::{InMemoryCostsStore, RecordingCommitHook};
use mockable::Clock;
use rust_decimal::Decimal;
use tokio::runtime::{Builder, Runtime};

pub type LedgerService = CostEntryService<
    InMemoryCostsStore,
    InMemoryCostsStore,
    InMemoryCostsStore,
    InMemoryCostsStore,
    RecordingCommitHook,
>;

/// Strip the quotes Gherkin placeholders carry.
pub fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }
}

/// Successful command results.
#[derive(Debug)]
pub enum Accepted {
    Entry(CostEntry),
    Updated(CostEntryUpdated),
}

pub struct LedgerWorld {
    runtime: Runtime,
    store: Arc<InMemoryCostsStore>,
    hook: Arc<RecordingCommitHook>,
    policy: RefCell<ValidationPolicy>,
    project_id: ProjectId,
    other_project_id: ProjectId,
    users: RefCell<HashMap<String, UserId>>,
    admins: RefCell<HashSet<String>>,
    actor: RefCell<Option<Actor>>,
    cost_types: RefCell<HashMap<String, CostType>>,
    issues: RefCell<HashMap<String, Issue>>,
    stored_entry: RefCell<Option<CostEntry>>,
    outcome: RefCell<Option<Result<Accepted, CostEntryCommandError>>>,
}

impl LedgerWorld {
    pub fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("create runtime");
        let world = Self {
            runtime,
            store: Arc::new(InMemoryCostsStore::new()),
            hook: Arc::new(RecordingCommitHook::new()),
            policy: RefCell::new(ValidationPolicy::default()),
            project_id: ProjectId::random(),
            other_project_id: ProjectId::random(),
            users: RefCell::new(HashMap::new()),
            admins: RefCell::new(HashSet::new()),
            actor: RefCell::new(None),
            cost_types: RefCell::new(HashMap::new()),
            issues: RefCell::new(HashMap::new()),
            stored_entry: RefCell::new(None),
            outcome: RefCell::new(None),
        };
        world.cost_type("Labor");
        world
    }

    pub fn today(&self) -> NaiveDate {
        FixtureClock.utc().date_naive()
    }

    pub fn user(&self, name: &str) -> UserId {
        *self
            .users
            .borrow_mut()
            .entry(unquote(name).to_owned())
            .or_insert_with(UserId::random)
    }

    pub fn add_member(&self, name: &str, permission: &str) {
        let permission: Permission = unquote(permission).parse().expect("known permission");
        let role = Role::member("Member", [permission]);
        self.store
            .add_member(self.project_id, self.user(name), vec![role]);
    }

    pub fn add_outsider(&self, name: &str) {
        self.user(name);
    }

    pub fn add_admin(&self, name: &str) {
        self.user(name);
        self.admins.borrow_mut().insert(unquote(name).to_owned());
    }

    pub fn grant_non_members(&self, permission: &str) {
        let permission: Permission = unquote(permission).parse().expect("known permission");
        self.store
            .set_non_member_role(Some(Role::non_member([permission])));
    }

    pub fn act_as(&self, name: &str) {
        let user_id = self.user(name);
        let actor = if self.admins.borrow().contains(unquote(name)) {
            Actor::admin(user_id)
        } else {
            Actor::user(user_id)
        };
        *self.actor.borrow_mut() = Some(actor);
    }

    pub fn check_membership_on_behalf_only(&self) {
        self.policy.borrow_mut().member_check = MemberCheckPolicy::OnBehalfOnly;
    }

    pub fn cost_type(&self, name: &str) -> CostType {
        let name = unquote(name);
        let cost_type = self
            .cost_types
            .borrow_mut()
            .entry(name.to_owned())
            .or_insert_with(|| CostType::new(CostTypeId::random(), name))
            .clone();
        self.store.add_cost_type(cost_type.clone());
        cost_type
    }

    fn replace_cost_type(&self, cost_type: CostType) {
        self.cost_types
            .borrow_mut()
            .insert(cost_type.name.clone(), cost_type.clone());
        self.store.add_cost_type(cost_type);
    }

    pub fn make_default(&self, name: &str) {
        self.replace_cost_type(self.cost_type(name).as_default());
    }

    pub fn delete_cost_type(&self, name: &str) {
        self.replace_cost_type(self.cost_type(name).deleted());
    }

    pub fn add_foreign_issue(&self, name: &str) {
        let issue = Issue {
            id: IssueId::random(),
            project_id: self.other_project_id,
        };
        self.store.add_issue(issue);
        self.issues
            .borrow_mut()
            .insert(unquote(name).to_owned(), issue);
    }

    pub fn issue(&self, name: &str) -> Issue {
        *self
            .issues
            .borrow()
            .get(unquote(name))
            .expect("issue registered")
    }

    pub fn seed_entry(&self, owner: &str) {
        let entry = CostEntry {
            id: CostEntryId::random(),
            project_id: self.project_id,
            issue_id: None,
            user_id: self.user(owner),
            cost_type_id: Some(self.cost_type("Labor").id),
            spent_on: NaiveDate::from_ymd_opt(2012, 4, 3).expect("valid date"),
            units: Decimal::from(5),
            overridden_costs: None,
            comments: String::new(),
        };
        self.store.seed_entry(entry.clone());
        *self.stored_entry.borrow_mut() = Some(entry);
    }

    pub fn stored_entry(&self) -> CostEntry {
        self.stored_entry
            .borrow()
            .clone()
            .expect("an entry was seeded")
    }

    /// The stored entry as currently persisted.
    pub fn persisted(&self, id: CostEntryId) -> Option<CostEntry> {
        self.store
            .entries()
            .expect("read entries")
            .into_iter()
            .find(|entry| entry.id == id)
    }

    /// Form resubmitting the stored entry's values.
    pub fn resubmission(&self) -> CostEntryForm {
        let entry = self.stored_entry();
        CostEntryForm {
            user_id: Some(entry.user_id.to_string()),
            cost_type_id: entry.cost_type_id.map(|id| id.to_string()),
            units: Some(entry.units.to_string()),
            spent_on: Some(entry.spent_on.to_string()),
            comments: Some(entry.comments.clone()),
            ..CostEntryForm::default()
        }
    }

    fn actor(&self) -> Actor {
        self.actor.borrow().expect("an actor was chosen")
    }

    fn service(&self) -> LedgerService {
        let ports = CostEntryPorts {
            membership: Arc::clone(&self.store),
            issues: Arc::clone(&self.store),
            cost_types: Arc::clone(&self.store),
            entries: Arc::clone(&self.store),
            hook: Arc::clone(&self.hook),
        };
        CostEntryService::new(ports, Arc::new(FixtureClock)).with_policy(*self.policy.borrow())
    }

    fn record(&self, outcome: Result<Accepted, CostEntryCommandError>) {
        *self.outcome.borrow_mut() = Some(outcome);
    }

    pub fn create(&self, form: CostEntryForm) {
        let request = CreateCostEntryRequest {
            actor: self.actor(),
            project_id: self.project_id,
            form,
        };
        let service = self.service();
        let outcome = self.runtime.block_on(service.create(request));
        self.record(outcome.map(Accepted::Entry));
    }

    pub fn update(&self, entry_id: CostEntryId, form: CostEntryForm) {
        let request = UpdateCostEntryRequest {
            actor: self.actor(),
            entry_id,
            form,
        };
        let service = self.service();
        let outcome = self.runtime.block_on(service.update(request));
        self.record(outcome.map(Accepted::Updated));
    }

    pub fn edit(&self, entry_id: CostEntryId) {
        let lookup = CostEntryLookup {
            actor: self.actor(),
            entry_id,
        };
        let service = self.service();
        let outcome = self.runtime.block_on(service.edit(lookup));
        self.record(outcome.map(Accepted::Entry));
    }

    pub fn delete(&self, entry_id: CostEntryId) {
        let lookup = CostEntryLookup {
            actor: self.actor(),
            entry_id,
        };
        let service = self.service();
        let outcome = self.runtime.block_on(service.delete(lookup));
        self.record(outcome.map(Accepted::Entry));
    }

    /// The entry produced by the last command.
    pub fn entry(&self) -> CostEntry {
        match self.outcome.borrow().as_ref().expect("a command ran") {
            Ok(Accepted::Entry(entry)) => entry.clone(),
            Ok(Accepted::Updated(updated)) => updated.entry.clone(),
            Err(error) => panic!("expected success, got {error}"),
        }
    }

    /// The update result of the last command.
    pub fn updated(&self) -> CostEntryUpdated {
        match self.outcome.borrow().as_ref().expect("a command ran") {
            Ok(Accepted::Updated(updated)) => updated.clone(),
            other => panic!("expected an update result, got {other:?}"),
        }
    }

    /// The error produced by the last command.
    pub fn error(&self) -> CostEntryCommandError {
        match self.outcome.borrow().as_ref().expect("a command ran") {
            Err(error) => error.clone(),
            Ok(accepted) => panic!("expected a failure, got {accepted:?}"),
        }
    }

    /// Error codes recorded against `field` by the last command.
    pub fn field_codes(&self, field: &str) -> Vec<&'static str> {
        let error = self.error();
        let invalid = error
            .invalid_entry()
            .unwrap_or_else(|| panic!("expected a validation failure, got {error}"));
        invalid
            .errors
            .iter()
            .filter(|(name, _)| name.as_str() == unquote(field))
            .flat_map(|(_, errors)| errors.iter().map(|error| error.code()))
            .collect()
    }

    pub fn committed(&self) -> Vec<CostEntryCommitted> {
        self.hook.events()
    }
}
