//! # Model Capabilities
//!
//! The controller engine never talks to a database directly. It drives whatever model layer
//! the host application has through two capability traits:
//!
//! - [`Loader`] - the read/build side: load parents by id, walk parent accessors, build
//!   unsaved records.
//! - [`Mutator`] - the write side: save, update and destroy.
//!
//! Both traits are `#[async_trait]` so a backend can await I/O. The engine awaits every
//! call in declaration order and never issues two loads at once.
//!
//! Accessor names (`"employees"`, `"manager"`) are plain strings that were fixed when the
//! association chain was built. A backend maps them onto its own relations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::framework::error::StoreError;

/// Attribute payload used to build and update records.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Per-attribute validation messages attached to a record that failed to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, attribute: &str) -> &[String] {
        self.0.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A record handed out by a model store.
///
/// Records are cheap to clone from the engine's point of view: every request works on its
/// own copies and nothing is cached between requests.
pub trait Model: Clone + Debug + Send + Sync + 'static {
    /// Type name of the record (e.g. `"factory"`).
    fn model_name(&self) -> &str;

    /// Identifier, `None` while the record is unsaved.
    fn id(&self) -> Option<&str>;

    /// Validation errors from the last save or update attempt.
    fn errors(&self) -> &ValidationErrors;
}

/// Read side of a model store.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    type Record: Model;

    /// `Factory.find(id)`. `Ok(None)` means not found.
    async fn load_by_id(&self, model: &str, id: &str)
        -> Result<Option<Self::Record>, StoreError>;

    /// `parent.employees.find(id)`.
    async fn find_child(
        &self,
        parent: &Self::Record,
        accessor: &str,
        id: &str,
    ) -> Result<Option<Self::Record>, StoreError>;

    /// `parent.employees`.
    async fn list_children(
        &self,
        parent: &Self::Record,
        accessor: &str,
    ) -> Result<Vec<Self::Record>, StoreError>;

    /// `parent.employees.build(attrs)`.
    async fn build_child(
        &self,
        parent: &Self::Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Self::Record, StoreError>;

    /// `store.manager`. `Ok(None)` when the one-to-one child does not exist yet.
    async fn singleton_child(
        &self,
        parent: &Self::Record,
        accessor: &str,
    ) -> Result<Option<Self::Record>, StoreError>;

    /// `store.build_manager(attrs)`.
    async fn build_singleton_child(
        &self,
        parent: &Self::Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Self::Record, StoreError>;

    /// `task.project`: the record a child belongs to through `association`.
    async fn owner(
        &self,
        record: &Self::Record,
        association: &str,
    ) -> Result<Option<Self::Record>, StoreError>;

    /// `Employee.all`.
    async fn list_top_level(&self, model: &str) -> Result<Vec<Self::Record>, StoreError>;

    /// `Employee.find(id)`.
    async fn find_top_level(
        &self,
        model: &str,
        id: &str,
    ) -> Result<Option<Self::Record>, StoreError>;

    /// `Employee.new(attrs)`.
    async fn build_top_level(
        &self,
        model: &str,
        attrs: Attributes,
    ) -> Result<Self::Record, StoreError>;
}

/// Write side of a model store.
///
/// A `false` return means the record was rejected; the store leaves the reasons in
/// [`Model::errors`] on the record it was given.
#[async_trait]
pub trait Mutator: Loader {
    async fn save(&self, record: &mut Self::Record) -> Result<bool, StoreError>;

    async fn update(
        &self,
        record: &mut Self::Record,
        attrs: Attributes,
    ) -> Result<bool, StoreError>;

    async fn destroy(&self, record: &mut Self::Record) -> Result<bool, StoreError>;
}
