//! # Mock Store & Testing Guide
//!
//! [`MockStore`] implements [`Loader`] and [`Mutator`] over [`Record`] without any backend.
//! You queue the calls you expect, in order, together with what each call returns. Every
//! call the controller makes pops the next expectation; a call that does not match panics
//! with both sides printed, and [`MockStore::verify`] panics if expectations are left over.
//!
//! Because expectations are strictly ordered, a test also pins down *when* the engine talks
//! to the store: parents before children, one load per level, no speculative lookups.
//!
//! ## When to use the mock vs the memory store
//!
//! | Feature | MockStore | MemoryStore (actor) |
//! |---------|-----------|---------------------|
//! | **State** | None, answers are scripted | Real records and relations |
//! | **Asserts call order** | Yes | No |
//! | **Error injection** | `return_err` | Hard |
//! | **Use case** | Unit testing resolution and actions | End-to-end flows |
//!
//! ## Example
//!
//! ```rust
//! use resource_recipe::framework::mock::MockStore;
//! use resource_recipe::framework::{
//!     Action, AssociationChain, AssociationSpec, Controller, Record, RequestContext,
//!     ResourceConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let chain = AssociationChain::builder(ResourceConfig::new("employee"))
//!         .belongs_to(AssociationSpec::polymorphic("parent", ["factory", "company"]))
//!         .build()
//!         .unwrap();
//!
//!     let store = MockStore::new();
//!     let factory = Record::new("factory", "37");
//!     store.expect_load_by_id("factory", "37").return_ok(Some(factory.clone()));
//!     store.expect_list_children("employees").on(&factory).return_ok(vec![]);
//!
//!     let controller = Controller::new(chain, store.clone());
//!     let request = RequestContext::new().param("factory_id", "37");
//!     let result = controller.dispatch(Action::Index, &request).await.unwrap();
//!
//!     assert_eq!(result.parent().chosen_type(), Some("factory"));
//!     store.verify();
//! }
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex};

use crate::framework::error::StoreError;
use crate::framework::model::{Attributes, Loader, Mutator, ValidationErrors};
use crate::framework::record::Record;

// =============================================================================
// CALLS & EXPECTATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    LoadById,
    FindChild,
    ListChildren,
    BuildChild,
    SingletonChild,
    BuildSingletonChild,
    Owner,
    ListTopLevel,
    FindTopLevel,
    BuildTopLevel,
    Save,
    Update,
    Destroy,
}

/// One store invocation, as made or as expected.
///
/// `target` is the record the call was made on (`factory#37`); `name` is the model, accessor
/// or association name; `id` is the looked-up id. On the expectation side `None` for
/// `target` or `attrs` matches anything.
#[derive(Debug, Clone, PartialEq)]
struct Call {
    op: Op,
    target: Option<String>,
    name: Option<String>,
    id: Option<String>,
    attrs: Option<Attributes>,
}

impl Call {
    fn new(op: Op) -> Self {
        Self {
            op,
            target: None,
            name: None,
            id: None,
            attrs: None,
        }
    }

    fn on(mut self, record: &Record) -> Self {
        self.target = Some(record.to_string());
        self
    }

    fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn attrs(mut self, attrs: &Attributes) -> Self {
        self.attrs = Some(attrs.clone());
        self
    }

    fn accepts(&self, actual: &Call) -> bool {
        self.op == actual.op
            && self.name == actual.name
            && self.id == actual.id
            && (self.target.is_none() || self.target == actual.target)
            && (self.attrs.is_none() || self.attrs == actual.attrs)
    }
}

impl Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Op::LoadById => "load_by_id",
            Op::FindChild => "find_child",
            Op::ListChildren => "list_children",
            Op::BuildChild => "build_child",
            Op::SingletonChild => "singleton_child",
            Op::BuildSingletonChild => "build_singleton_child",
            Op::Owner => "owner",
            Op::ListTopLevel => "list_top_level",
            Op::FindTopLevel => "find_top_level",
            Op::BuildTopLevel => "build_top_level",
            Op::Save => "save",
            Op::Update => "update",
            Op::Destroy => "destroy",
        };
        let args: Vec<&str> = [&self.target, &self.name, &self.id]
            .into_iter()
            .filter_map(|arg| arg.as_deref())
            .collect();
        write!(f, "{}({})", op, args.join(", "))
    }
}

#[derive(Debug)]
enum Reply {
    Found(Result<Option<Record>, StoreError>),
    Listed(Result<Vec<Record>, StoreError>),
    Built(Result<Record, StoreError>),
    Persisted(Result<bool, StoreError>, Option<ValidationErrors>),
}

struct Expectation {
    call: Call,
    reply: Reply,
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

// =============================================================================
// MOCK STORE
// =============================================================================

/// Scripted, order-checking store.
///
/// Cloning shares the expectation queue and call log, so a test can hand one clone to the
/// controller and keep another for `verify()`.
#[derive(Clone, Default)]
pub struct MockStore {
    expectations: Queue,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Factory.expects(:find).with(id)`
    pub fn expect_load_by_id(&self, model: &str, id: &str) -> FindExpectation {
        FindExpectation::new(self, Call::new(Op::LoadById).name(model).id(id))
    }

    /// `factory.employees.find(id)`
    pub fn expect_find_child(&self, accessor: &str, id: &str) -> FindExpectation {
        FindExpectation::new(self, Call::new(Op::FindChild).name(accessor).id(id))
    }

    /// `store.manager`
    pub fn expect_singleton_child(&self, accessor: &str) -> FindExpectation {
        FindExpectation::new(self, Call::new(Op::SingletonChild).name(accessor))
    }

    /// `task.project`
    pub fn expect_owner(&self, association: &str) -> FindExpectation {
        FindExpectation::new(self, Call::new(Op::Owner).name(association))
    }

    /// `Employee.find(id)`
    pub fn expect_find_top_level(&self, model: &str, id: &str) -> FindExpectation {
        FindExpectation::new(self, Call::new(Op::FindTopLevel).name(model).id(id))
    }

    /// `factory.employees`
    pub fn expect_list_children(&self, accessor: &str) -> ListExpectation {
        ListExpectation::new(self, Call::new(Op::ListChildren).name(accessor))
    }

    /// `Employee.all`
    pub fn expect_list_top_level(&self, model: &str) -> ListExpectation {
        ListExpectation::new(self, Call::new(Op::ListTopLevel).name(model))
    }

    /// `factory.employees.build(attrs)`
    pub fn expect_build_child(&self, accessor: &str) -> BuildExpectation {
        BuildExpectation::new(self, Call::new(Op::BuildChild).name(accessor))
    }

    /// `store.build_manager(attrs)`
    pub fn expect_build_singleton_child(&self, accessor: &str) -> BuildExpectation {
        BuildExpectation::new(self, Call::new(Op::BuildSingletonChild).name(accessor))
    }

    /// `Employee.new(attrs)`
    pub fn expect_build_top_level(&self, model: &str) -> BuildExpectation {
        BuildExpectation::new(self, Call::new(Op::BuildTopLevel).name(model))
    }

    pub fn expect_save(&self) -> MutationExpectation {
        MutationExpectation::new(self, Call::new(Op::Save))
    }

    pub fn expect_update(&self) -> MutationExpectation {
        MutationExpectation::new(self, Call::new(Op::Update))
    }

    pub fn expect_destroy(&self) -> MutationExpectation {
        MutationExpectation::new(self, Call::new(Op::Destroy))
    }

    /// Every call made so far, rendered like `find_child(factory#37, employees, 42)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            let pending: Vec<String> = exps.iter().map(|e| e.call.to_string()).collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                exps.len(),
                pending
            );
        }
    }

    fn push(&self, call: Call, reply: Reply) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation { call, reply });
    }

    fn take(&self, actual: Call) -> Reply {
        self.calls.lock().unwrap().push(actual.to_string());
        let mut exps = self.expectations.lock().unwrap();
        match exps.pop_front() {
            Some(expected) if expected.call.accepts(&actual) => expected.reply,
            Some(expected) => panic!(
                "Unexpected invocation: {} (expected {})",
                actual, expected.call
            ),
            None => panic!("Unexpected invocation: {} (no expectations left)", actual),
        }
    }

    fn found(&self, call: Call) -> Result<Option<Record>, StoreError> {
        let shown = call.to_string();
        match self.take(call) {
            Reply::Found(result) => result,
            other => panic!("Expectation for {} has the wrong reply: {:?}", shown, other),
        }
    }

    fn listed(&self, call: Call) -> Result<Vec<Record>, StoreError> {
        let shown = call.to_string();
        match self.take(call) {
            Reply::Listed(result) => result,
            other => panic!("Expectation for {} has the wrong reply: {:?}", shown, other),
        }
    }

    fn built(&self, call: Call) -> Result<Record, StoreError> {
        let shown = call.to_string();
        match self.take(call) {
            Reply::Built(result) => result,
            other => panic!("Expectation for {} has the wrong reply: {:?}", shown, other),
        }
    }

    fn persisted(&self, call: Call, record: &mut Record) -> Result<bool, StoreError> {
        let shown = call.to_string();
        match self.take(call) {
            Reply::Persisted(result, errors) => {
                if let Some(errors) = errors {
                    record.set_errors(errors);
                }
                result
            }
            other => panic!("Expectation for {} has the wrong reply: {:?}", shown, other),
        }
    }
}

#[async_trait]
impl Loader for MockStore {
    type Record = Record;

    async fn load_by_id(&self, model: &str, id: &str) -> Result<Option<Record>, StoreError> {
        self.found(Call::new(Op::LoadById).name(model).id(id))
    }

    async fn find_child(
        &self,
        parent: &Record,
        accessor: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        self.found(Call::new(Op::FindChild).on(parent).name(accessor).id(id))
    }

    async fn list_children(&self, parent: &Record, accessor: &str) -> Result<Vec<Record>, StoreError> {
        self.listed(Call::new(Op::ListChildren).on(parent).name(accessor))
    }

    async fn build_child(
        &self,
        parent: &Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Record, StoreError> {
        self.built(Call::new(Op::BuildChild).on(parent).name(accessor).attrs(&attrs))
    }

    async fn singleton_child(&self, parent: &Record, accessor: &str) -> Result<Option<Record>, StoreError> {
        self.found(Call::new(Op::SingletonChild).on(parent).name(accessor))
    }

    async fn build_singleton_child(
        &self,
        parent: &Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Record, StoreError> {
        self.built(
            Call::new(Op::BuildSingletonChild)
                .on(parent)
                .name(accessor)
                .attrs(&attrs),
        )
    }

    async fn owner(&self, record: &Record, association: &str) -> Result<Option<Record>, StoreError> {
        self.found(Call::new(Op::Owner).on(record).name(association))
    }

    async fn list_top_level(&self, model: &str) -> Result<Vec<Record>, StoreError> {
        self.listed(Call::new(Op::ListTopLevel).name(model))
    }

    async fn find_top_level(&self, model: &str, id: &str) -> Result<Option<Record>, StoreError> {
        self.found(Call::new(Op::FindTopLevel).name(model).id(id))
    }

    async fn build_top_level(&self, model: &str, attrs: Attributes) -> Result<Record, StoreError> {
        self.built(Call::new(Op::BuildTopLevel).name(model).attrs(&attrs))
    }
}

#[async_trait]
impl Mutator for MockStore {
    async fn save(&self, record: &mut Record) -> Result<bool, StoreError> {
        let call = Call::new(Op::Save).on(record);
        self.persisted(call, record)
    }

    async fn update(&self, record: &mut Record, attrs: Attributes) -> Result<bool, StoreError> {
        let call = Call::new(Op::Update).on(record).attrs(&attrs);
        let saved = self.persisted(call, record)?;
        record.assign(attrs);
        Ok(saved)
    }

    async fn destroy(&self, record: &mut Record) -> Result<bool, StoreError> {
        let call = Call::new(Op::Destroy).on(record);
        self.persisted(call, record)
    }
}

// =============================================================================
// EXPECTATION BUILDERS
// =============================================================================

/// Builder for calls answering a single optional record.
pub struct FindExpectation {
    store: MockStore,
    call: Call,
}

impl FindExpectation {
    fn new(store: &MockStore, call: Call) -> Self {
        Self {
            store: store.clone(),
            call,
        }
    }

    /// Only match calls made on `record`.
    pub fn on(mut self, record: &Record) -> Self {
        self.call = self.call.on(record);
        self
    }

    pub fn return_ok(self, value: Option<Record>) {
        self.store.push(self.call, Reply::Found(Ok(value)));
    }

    pub fn return_err(self, error: StoreError) {
        self.store.push(self.call, Reply::Found(Err(error)));
    }
}

/// Builder for calls answering a list of records.
pub struct ListExpectation {
    store: MockStore,
    call: Call,
}

impl ListExpectation {
    fn new(store: &MockStore, call: Call) -> Self {
        Self {
            store: store.clone(),
            call,
        }
    }

    pub fn on(mut self, record: &Record) -> Self {
        self.call = self.call.on(record);
        self
    }

    pub fn return_ok(self, value: Vec<Record>) {
        self.store.push(self.call, Reply::Listed(Ok(value)));
    }

    pub fn return_err(self, error: StoreError) {
        self.store.push(self.call, Reply::Listed(Err(error)));
    }
}

/// Builder for `build_*` calls.
pub struct BuildExpectation {
    store: MockStore,
    call: Call,
}

impl BuildExpectation {
    fn new(store: &MockStore, call: Call) -> Self {
        Self {
            store: store.clone(),
            call,
        }
    }

    pub fn on(mut self, record: &Record) -> Self {
        self.call = self.call.on(record);
        self
    }

    /// Only match calls carrying exactly these attributes.
    pub fn with(mut self, attrs: Attributes) -> Self {
        self.call.attrs = Some(attrs);
        self
    }

    pub fn return_ok(self, record: Record) {
        self.store.push(self.call, Reply::Built(Ok(record)));
    }

    pub fn return_err(self, error: StoreError) {
        self.store.push(self.call, Reply::Built(Err(error)));
    }
}

/// Builder for `save`, `update` and `destroy`.
pub struct MutationExpectation {
    store: MockStore,
    call: Call,
}

impl MutationExpectation {
    fn new(store: &MockStore, call: Call) -> Self {
        Self {
            store: store.clone(),
            call,
        }
    }

    pub fn on(mut self, record: &Record) -> Self {
        self.call = self.call.on(record);
        self
    }

    pub fn with(mut self, attrs: Attributes) -> Self {
        self.call.attrs = Some(attrs);
        self
    }

    pub fn return_ok(self, saved: bool) {
        self.store.push(self.call, Reply::Persisted(Ok(saved), None));
    }

    /// Answer `false` and attach `errors` to the record, like a failed validation.
    pub fn reject(self, errors: ValidationErrors) {
        self.store.push(self.call, Reply::Persisted(Ok(false), Some(errors)));
    }

    pub fn return_err(self, error: StoreError) {
        self.store.push(self.call, Reply::Persisted(Err(error), None));
    }
}
