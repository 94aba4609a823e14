//! Generic controller engine.
//!
//! This module turns a declared association chain into the seven standard resource actions.
//!
//! # Main Components
//!
//! - [`AssociationChain`] - Declared parents of a resource (`belongs_to`), validated at definition time
//! - [`ParentResolver`] - Picks and loads the parent a request addresses
//! - [`ResourceScope`] - The collection, singleton accessor or model the resource is reached through
//! - [`Controller`] - Runs index/show/new/edit/create/update/destroy
//! - [`OverrideRegistry`] - Per-controller hooks replacing single pipeline steps
//! - [`Loader`] / [`Mutator`] - What a model store must provide
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test controllers without a real store.

pub mod chain;
pub mod error;
pub mod executor;
pub mod mock;
pub mod model;
pub mod overrides;
pub mod record;
pub mod request;
pub mod resolver;
pub mod scope;

pub use chain::{
    AssociationChain, AssociationDeclaration, AssociationKind, AssociationSpec, Candidate, ChainBuilder,
    ChainDeclaration, MissingParentPolicy, ResourceConfig, ResourceDeclaration, TerminalKind,
};
pub use error::{ConfigurationError, ControllerError, StoreError};
pub use executor::{ActionContext, Binding, Controller, ExecutionResult, Outcome, Resource};
pub use model::{Attributes, Loader, Model, Mutator, ValidationErrors};
pub use overrides::{
    ActionHook, CollectionHook, HookName, OverrideRegistry, OverrideRegistryBuilder, ParentHook, ResourceHook,
    ScopeHook,
};
pub use record::Record;
pub use request::{Action, RequestContext};
pub use resolver::{NamedRecord, ParentResolver, ResolvedParent};
pub use scope::ResourceScope;
