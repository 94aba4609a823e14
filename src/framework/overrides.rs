//! # Override Hooks
//!
//! A controller can replace any single step of the default pipeline:
//!
//! | Hook | Replaces | Receives |
//! |------|----------|----------|
//! | `parent` | [`ParentResolver`](crate::framework::ParentResolver) | chain, request, store |
//! | `scope` | [`ResourceScope::derive`] | chain, request, resolved parent, store |
//! | `resource` | member lookup for show/edit/update/destroy | [`ActionContext`] |
//! | `collection` | the listing for index | [`ActionContext`] |
//! | `index`, `show`, ... | the whole action | [`ActionContext`] |
//!
//! Hooks are looked up by exact name and invoked on every request; nothing they return is
//! cached. Every hook runs after the steps before it, so an action hook sees the parent and
//! scope already resolved and never resolves them again.
//!
//! ```rust
//! use async_trait::async_trait;
//! use resource_recipe::framework::mock::MockStore;
//! use resource_recipe::framework::{
//!     Action, ActionContext, ActionHook, ControllerError, ExecutionResult, OverrideRegistry,
//!     Record, Resource,
//! };
//!
//! struct LeaveCollectionEmpty;
//!
//! #[async_trait]
//! impl ActionHook<MockStore> for LeaveCollectionEmpty {
//!     async fn call(
//!         &self,
//!         ctx: &ActionContext<'_, MockStore>,
//!     ) -> Result<ExecutionResult<Record>, ControllerError> {
//!         Ok(ctx.completed(Resource::Absent))
//!     }
//! }
//!
//! let overrides = OverrideRegistry::<MockStore>::builder()
//!     .action(Action::Index, LeaveCollectionEmpty)
//!     .build();
//! assert!(overrides.contains(&"index".parse().unwrap()));
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::framework::chain::AssociationChain;
use crate::framework::error::ControllerError;
use crate::framework::executor::{ActionContext, ExecutionResult};
use crate::framework::model::{Loader, Mutator};
use crate::framework::request::{Action, RequestContext};
use crate::framework::resolver::ResolvedParent;
use crate::framework::scope::ResourceScope;

/// Custom parent computation. Its answer is used verbatim, including "no parent".
#[async_trait]
pub trait ParentHook<S: Loader>: Send + Sync {
    async fn resolve(
        &self,
        chain: &AssociationChain,
        request: &RequestContext,
        store: &S,
    ) -> Result<ResolvedParent<S::Record>, ControllerError>;
}

/// Custom scope derivation.
#[async_trait]
pub trait ScopeHook<S: Loader>: Send + Sync {
    async fn scope(
        &self,
        chain: &AssociationChain,
        request: &RequestContext,
        parent: &ResolvedParent<S::Record>,
        store: &S,
    ) -> Result<ResourceScope<S::Record>, ControllerError>;
}

/// Custom member lookup. `Ok(None)` means there is no such member.
#[async_trait]
pub trait ResourceHook<S: Mutator>: Send + Sync {
    async fn resource(&self, ctx: &ActionContext<'_, S>) -> Result<Option<S::Record>, ControllerError>;
}

/// Custom collection for index.
#[async_trait]
pub trait CollectionHook<S: Mutator>: Send + Sync {
    async fn collection(&self, ctx: &ActionContext<'_, S>) -> Result<Vec<S::Record>, ControllerError>;
}

/// Replaces one action wholesale.
#[async_trait]
pub trait ActionHook<S: Mutator>: Send + Sync {
    async fn call(&self, ctx: &ActionContext<'_, S>) -> Result<ExecutionResult<S::Record>, ControllerError>;
}

/// Name a hook is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    Parent,
    Scope,
    Resource,
    Collection,
    Action(Action),
}

impl Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookName::Parent => f.write_str("parent"),
            HookName::Scope => f.write_str("scope"),
            HookName::Resource => f.write_str("resource"),
            HookName::Collection => f.write_str("collection"),
            HookName::Action(action) => Display::fmt(action, f),
        }
    }
}

impl FromStr for HookName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(HookName::Parent),
            "scope" => Ok(HookName::Scope),
            "resource" => Ok(HookName::Resource),
            "collection" => Ok(HookName::Collection),
            other => other
                .parse::<Action>()
                .map(HookName::Action)
                .map_err(|_| format!("unknown hook `{other}`")),
        }
    }
}

/// Per-controller hook table. Immutable once built.
pub struct OverrideRegistry<S: Mutator> {
    parent: Option<Box<dyn ParentHook<S>>>,
    scope: Option<Box<dyn ScopeHook<S>>>,
    resource: Option<Box<dyn ResourceHook<S>>>,
    collection: Option<Box<dyn CollectionHook<S>>>,
    actions: HashMap<Action, Box<dyn ActionHook<S>>>,
}

impl<S: Mutator> Default for OverrideRegistry<S> {
    fn default() -> Self {
        Self {
            parent: None,
            scope: None,
            resource: None,
            collection: None,
            actions: HashMap::new(),
        }
    }
}

impl<S: Mutator> OverrideRegistry<S> {
    /// A registry with no hooks: the default pipeline everywhere.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> OverrideRegistryBuilder<S> {
        OverrideRegistryBuilder {
            registry: Self::default(),
        }
    }

    pub fn parent_hook(&self) -> Option<&dyn ParentHook<S>> {
        self.parent.as_deref()
    }

    pub fn scope_hook(&self) -> Option<&dyn ScopeHook<S>> {
        self.scope.as_deref()
    }

    pub fn resource_hook(&self) -> Option<&dyn ResourceHook<S>> {
        self.resource.as_deref()
    }

    pub fn collection_hook(&self) -> Option<&dyn CollectionHook<S>> {
        self.collection.as_deref()
    }

    pub fn action_hook(&self, action: Action) -> Option<&dyn ActionHook<S>> {
        self.actions.get(&action).map(|hook| &**hook)
    }

    pub fn contains(&self, name: &HookName) -> bool {
        match name {
            HookName::Parent => self.parent.is_some(),
            HookName::Scope => self.scope.is_some(),
            HookName::Resource => self.resource.is_some(),
            HookName::Collection => self.collection.is_some(),
            HookName::Action(action) => self.actions.contains_key(action),
        }
    }

    /// Registered hook names, pipeline steps first, then actions in their standard order.
    pub fn names(&self) -> Vec<HookName> {
        let steps = [HookName::Parent, HookName::Scope, HookName::Resource, HookName::Collection];
        let actions = Action::ALL.into_iter().map(HookName::Action);
        steps
            .into_iter()
            .chain(actions)
            .filter(|name| self.contains(name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl<S: Mutator> fmt::Debug for OverrideRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.names().iter().map(ToString::to_string).collect();
        f.debug_struct("OverrideRegistry").field("hooks", &names).finish()
    }
}

/// Collects hooks; a later registration under the same name replaces the earlier one.
pub struct OverrideRegistryBuilder<S: Mutator> {
    registry: OverrideRegistry<S>,
}

impl<S: Mutator> OverrideRegistryBuilder<S> {
    pub fn parent(mut self, hook: impl ParentHook<S> + 'static) -> Self {
        self.registry.parent = Some(Box::new(hook));
        self
    }

    pub fn scope(mut self, hook: impl ScopeHook<S> + 'static) -> Self {
        self.registry.scope = Some(Box::new(hook));
        self
    }

    pub fn resource(mut self, hook: impl ResourceHook<S> + 'static) -> Self {
        self.registry.resource = Some(Box::new(hook));
        self
    }

    pub fn collection(mut self, hook: impl CollectionHook<S> + 'static) -> Self {
        self.registry.collection = Some(Box::new(hook));
        self
    }

    pub fn action(mut self, action: Action, hook: impl ActionHook<S> + 'static) -> Self {
        self.registry.actions.insert(action, Box::new(hook));
        self
    }

    pub fn build(self) -> OverrideRegistry<S> {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::executor::Resource;
    use crate::framework::mock::MockStore;
    use crate::framework::record::Record;

    struct NoParent;

    #[async_trait]
    impl ParentHook<MockStore> for NoParent {
        async fn resolve(
            &self,
            _chain: &AssociationChain,
            _request: &RequestContext,
            _store: &MockStore,
        ) -> Result<ResolvedParent<Record>, ControllerError> {
            Ok(ResolvedParent::none())
        }
    }

    struct Nothing;

    #[async_trait]
    impl ActionHook<MockStore> for Nothing {
        async fn call(&self, ctx: &ActionContext<'_, MockStore>) -> Result<ExecutionResult<Record>, ControllerError> {
            Ok(ctx.completed(Resource::Absent))
        }
    }

    #[test]
    fn test_hook_names_parse_exactly() {
        assert_eq!("parent".parse::<HookName>(), Ok(HookName::Parent));
        assert_eq!("collection".parse::<HookName>(), Ok(HookName::Collection));
        assert_eq!("destroy".parse::<HookName>(), Ok(HookName::Action(Action::Destroy)));
        assert!("Parent".parse::<HookName>().is_err());
        assert!("parents".parse::<HookName>().is_err());
        assert_eq!(HookName::Action(Action::Edit).to_string(), "edit");
    }

    #[test]
    fn test_empty_registry_means_default_pipeline() {
        let registry = OverrideRegistry::<MockStore>::empty();
        assert!(registry.is_empty());
        assert!(registry.parent_hook().is_none());
        assert!(registry.action_hook(Action::Index).is_none());
    }

    #[test]
    fn test_registered_hooks_are_found_by_name() {
        let registry = OverrideRegistry::<MockStore>::builder()
            .parent(NoParent)
            .action(Action::Destroy, Nothing)
            .build();

        assert!(registry.contains(&HookName::Parent));
        assert!(registry.action_hook(Action::Destroy).is_some());
        assert!(registry.action_hook(Action::Show).is_none());
        assert_eq!(
            registry.names(),
            vec![HookName::Parent, HookName::Action(Action::Destroy)]
        );
        assert_eq!(
            format!("{:?}", registry),
            r#"OverrideRegistry { hooks: ["parent", "destroy"] }"#
        );
    }
}
