//! # Action Executor
//!
//! [`Controller`] runs the seven standard actions against any [`Mutator`]:
//!
//! ```text
//! request ──► parent (resolver | parent hook)
//!                 │
//!                 ▼
//!             scope (derive | scope hook)
//!                 │
//!                 ▼
//!             action (default | action hook) ──► ExecutionResult
//! ```
//!
//! Each step runs exactly once per request, strictly in that order. Action hooks get an
//! [`ActionContext`] carrying what the earlier steps produced, and can still fall back to
//! [`ActionContext::default_action`] for the stock behavior.
//!
//! A `Controller` is cheap to clone and holds nothing request-specific, so one instance can
//! serve many concurrent tokio tasks.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::framework::chain::AssociationChain;
use crate::framework::error::ControllerError;
use crate::framework::model::{Attributes, Model, Mutator, ValidationErrors};
use crate::framework::overrides::OverrideRegistry;
use crate::framework::request::{Action, RequestContext};
use crate::framework::resolver::{ParentResolver, ResolvedParent};
use crate::framework::scope::ResourceScope;

/// What an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<R> {
    Member(R),
    Collection(Vec<R>),
    /// Nothing to expose, e.g. a singleton child that does not exist yet.
    Absent,
}

impl<R> Resource<R> {
    pub fn member(&self) -> Option<&R> {
        match self {
            Resource::Member(record) => Some(record),
            _ => None,
        }
    }

    pub fn collection(&self) -> Option<&[R]> {
        match self {
            Resource::Collection(records) => Some(records),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Resource::Absent)
    }
}

/// Whether a mutation went through. Validation failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Rejected(ValidationErrors),
}

/// A value exposed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding<'a, R> {
    Record(&'a R),
    Collection(&'a [R]),
}

/// Everything one action exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult<R> {
    action: Action,
    parent: ResolvedParent<R>,
    resource: Resource<R>,
    outcome: Outcome,
    member_name: String,
    collection_name: String,
}

impl<R> ExecutionResult<R> {
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn parent(&self) -> &ResolvedParent<R> {
        &self.parent
    }

    pub fn resource(&self) -> &Resource<R> {
        &self.resource
    }

    pub fn into_resource(self) -> Resource<R> {
        self.resource
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    /// Errors of a rejected mutation, `None` when it went through.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match &self.outcome {
            Outcome::Rejected(errors) => Some(errors),
            Outcome::Completed => None,
        }
    }

    /// Named values for the view: ancestors, the parent under its binding name, then the
    /// member under the resource name or the collection under the collection name.
    pub fn bindings(&self) -> BTreeMap<&str, Binding<'_, R>> {
        let mut bindings = BTreeMap::new();
        for ancestor in self.parent.ancestors() {
            bindings.insert(ancestor.name.as_str(), Binding::Record(&ancestor.record));
        }
        if let (Some(name), Some(record)) = (self.parent.binding_name(), self.parent.instance()) {
            bindings.insert(name, Binding::Record(record));
        }
        match &self.resource {
            Resource::Member(record) => {
                bindings.insert(self.member_name.as_str(), Binding::Record(record));
            }
            Resource::Collection(records) => {
                bindings.insert(self.collection_name.as_str(), Binding::Collection(records));
            }
            Resource::Absent => {}
        }
        bindings
    }
}

/// What the pipeline resolved so far, handed to hooks.
pub struct ActionContext<'a, S: Mutator> {
    pub action: Action,
    pub request: &'a RequestContext,
    pub chain: &'a AssociationChain,
    pub parent: &'a ResolvedParent<S::Record>,
    pub scope: &'a ResourceScope<S::Record>,
    pub store: &'a S,
    overrides: &'a OverrideRegistry<S>,
}

impl<'a, S: Mutator> ActionContext<'a, S> {
    /// Attributes sent under the resource payload key.
    pub fn attributes(&self) -> Attributes {
        self.request.attributes(self.chain.resource().payload_key_name())
    }

    pub fn completed(&self, resource: Resource<S::Record>) -> ExecutionResult<S::Record> {
        self.result(resource, Outcome::Completed)
    }

    pub fn rejected(&self, resource: Resource<S::Record>, errors: ValidationErrors) -> ExecutionResult<S::Record> {
        self.result(resource, Outcome::Rejected(errors))
    }

    fn result(&self, resource: Resource<S::Record>, outcome: Outcome) -> ExecutionResult<S::Record> {
        let config = self.chain.resource();
        ExecutionResult {
            action: self.action,
            parent: self.parent.clone(),
            resource,
            outcome,
            member_name: config.name().to_string(),
            collection_name: config.collection_name().to_string(),
        }
    }

    /// The member addressed by the request, through the `resource` hook when one is set.
    ///
    /// For a collection scope a missing id is [`ControllerError::MissingParameter`] and an
    /// unknown id is [`ControllerError::NotFound`]. For a singleton scope `None` means the
    /// child does not exist.
    pub async fn member(&self) -> Result<Option<S::Record>, ControllerError> {
        if let Some(hook) = self.overrides.resource_hook() {
            debug!("Resource computed by override");
            return hook.resource(self).await;
        }
        if self.scope.is_singleton() {
            return self.scope.find(None, self.store).await;
        }

        let config = self.chain.resource();
        let param = config.id_param_name();
        let id = self
            .request
            .get(param)
            .ok_or_else(|| ControllerError::MissingParameter(param.to_string()))?;
        match self.scope.find(Some(id), self.store).await? {
            Some(record) => Ok(Some(record)),
            None => {
                warn!(model = config.model_name(), id, "Resource not found");
                Err(ControllerError::not_found(config.model_name(), id))
            }
        }
    }

    /// Like [`member`](Self::member), but an absent member is an error.
    async fn existing_member(&self) -> Result<S::Record, ControllerError> {
        match self.member().await? {
            Some(record) => Ok(record),
            None => {
                let config = self.chain.resource();
                let id = match self.scope.parent() {
                    Some(owner) => format!(
                        "{}#{}.{}",
                        owner.model_name(),
                        owner.id().unwrap_or("new"),
                        config.name()
                    ),
                    None => self.request.get(config.id_param_name()).unwrap_or_default().to_string(),
                };
                warn!(model = config.model_name(), %id, "Resource not found");
                Err(ControllerError::not_found(config.model_name(), id))
            }
        }
    }

    /// The records index exposes, through the `collection` hook when one is set.
    pub async fn collection(&self) -> Result<Vec<S::Record>, ControllerError> {
        match self.overrides.collection_hook() {
            Some(hook) => {
                debug!("Collection computed by override");
                hook.collection(self).await
            }
            None => self.scope.list(self.store).await,
        }
    }

    /// The stock behavior of the current action.
    pub async fn default_action(&self) -> Result<ExecutionResult<S::Record>, ControllerError> {
        match self.action {
            Action::Index => {
                let records = self.collection().await?;
                debug!(count = records.len(), "Listed");
                Ok(self.completed(Resource::Collection(records)))
            }
            Action::Show | Action::Edit => {
                let resource = match self.member().await? {
                    Some(record) => Resource::Member(record),
                    None => Resource::Absent,
                };
                Ok(self.completed(resource))
            }
            Action::New => {
                let record = self.scope.build(Default::default(), self.store).await?;
                Ok(self.completed(Resource::Member(record)))
            }
            Action::Create => {
                let attrs = self.attributes();
                debug!(?attrs, "Building");
                let mut record = self.scope.build(attrs, self.store).await?;
                let saved = self.store.save(&mut record).await?;
                Ok(self.persisted(record, saved))
            }
            Action::Update => {
                let mut record = self.existing_member().await?;
                let attrs = self.attributes();
                debug!(?attrs, "Updating");
                let saved = self.store.update(&mut record, attrs).await?;
                Ok(self.persisted(record, saved))
            }
            Action::Destroy => {
                let mut record = self.existing_member().await?;
                let destroyed = self.store.destroy(&mut record).await?;
                Ok(self.persisted(record, destroyed))
            }
        }
    }

    fn persisted(&self, record: S::Record, saved: bool) -> ExecutionResult<S::Record> {
        if saved {
            self.completed(Resource::Member(record))
        } else {
            let errors = record.errors().clone();
            warn!(action = %self.action, errors = errors.len(), "Rejected");
            self.rejected(Resource::Member(record), errors)
        }
    }
}

/// Runs actions for one declared resource.
pub struct Controller<S: Mutator> {
    chain: Arc<AssociationChain>,
    overrides: Arc<OverrideRegistry<S>>,
    store: S,
}

impl<S: Mutator + Clone> Clone for Controller<S> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            overrides: Arc::clone(&self.overrides),
            store: self.store.clone(),
        }
    }
}

impl<S: Mutator> Controller<S> {
    pub fn new(chain: AssociationChain, store: S) -> Self {
        Self {
            chain: Arc::new(chain),
            overrides: Arc::new(OverrideRegistry::empty()),
            store,
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideRegistry<S>) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    pub fn chain(&self) -> &AssociationChain {
        &self.chain
    }

    pub fn overrides(&self) -> &OverrideRegistry<S> {
        &self.overrides
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the parent, derives the scope, then runs `action`.
    #[instrument(skip(self, request), fields(resource = self.chain.resource().name()))]
    pub async fn dispatch(
        &self,
        action: Action,
        request: &RequestContext,
    ) -> Result<ExecutionResult<S::Record>, ControllerError> {
        debug!(params = ?request.params(), "Dispatch");

        let parent = ParentResolver::new(&self.chain)
            .with_hook(self.overrides.parent_hook())
            .resolve(request, &self.store)
            .await?;

        let scope = match self.overrides.scope_hook() {
            Some(hook) => {
                debug!("Scope computed by override");
                hook.scope(&self.chain, request, &parent, &self.store).await?
            }
            None => ResourceScope::derive(&self.chain, &parent)?,
        };

        let ctx = ActionContext {
            action,
            request,
            chain: &self.chain,
            parent: &parent,
            scope: &scope,
            store: &self.store,
            overrides: &self.overrides,
        };
        let result = match self.overrides.action_hook(action) {
            Some(hook) => {
                debug!("Action replaced by override");
                hook.call(&ctx).await
            }
            None => ctx.default_action().await,
        };

        match &result {
            Ok(done) => info!(success = done.success(), "Action finished"),
            Err(e) => warn!(error = %e, "Action failed"),
        }
        result
    }

    pub async fn index(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Index, request).await
    }

    pub async fn show(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Show, request).await
    }

    /// The `new` action.
    pub async fn build(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::New, request).await
    }

    pub async fn edit(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Edit, request).await
    }

    pub async fn create(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Create, request).await
    }

    pub async fn update(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Update, request).await
    }

    pub async fn destroy(&self, request: &RequestContext) -> Result<ExecutionResult<S::Record>, ControllerError> {
        self.dispatch(Action::Destroy, request).await
    }
}
