//! The scope an action reaches its records through.
//!
//! `factory.employees`, `store.manager` or plain `Employee` - picked once per request from
//! the resolved parent and the terminal resource kind.

use tracing::debug;

use crate::framework::chain::{AssociationChain, TerminalKind};
use crate::framework::error::{ConfigurationError, ControllerError};
use crate::framework::model::{Attributes, Loader, Model};
use crate::framework::resolver::ResolvedParent;

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceScope<R> {
    /// `parent.<accessor>`, a has-many collection.
    Children { parent: R, accessor: String },
    /// `parent.<accessor>`, a has-one child.
    Singleton { parent: R, accessor: String },
    /// No parent: the resource model itself.
    TopLevel { model: String },
}

impl<R: Model> ResourceScope<R> {
    /// Default scope derivation.
    ///
    /// A singleton resource without a parent can only happen when a parent hook answered
    /// "no parent"; the chain itself never allows it.
    pub fn derive(chain: &AssociationChain, parent: &ResolvedParent<R>) -> Result<Self, ControllerError> {
        let resource = chain.resource();
        let scope = match (parent.instance(), chain.terminal_kind()) {
            (Some(record), TerminalKind::Collection) => ResourceScope::Children {
                parent: record.clone(),
                accessor: resource.collection_name().to_string(),
            },
            (Some(record), TerminalKind::Singleton) => ResourceScope::Singleton {
                parent: record.clone(),
                accessor: resource.name().to_string(),
            },
            (None, TerminalKind::Collection) => ResourceScope::TopLevel {
                model: resource.model_name().to_string(),
            },
            (None, TerminalKind::Singleton) => {
                return Err(ConfigurationError::SingletonWithoutParent(resource.name().to_string()).into());
            }
        };
        debug!(scope = scope.kind_name(), "Scope derived");
        Ok(scope)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceScope::Children { .. } => "collection",
            ResourceScope::Singleton { .. } => "singleton",
            ResourceScope::TopLevel { .. } => "top-level",
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, ResourceScope::Singleton { .. })
    }

    pub fn parent(&self) -> Option<&R> {
        match self {
            ResourceScope::Children { parent, .. } | ResourceScope::Singleton { parent, .. } => Some(parent),
            ResourceScope::TopLevel { .. } => None,
        }
    }

    /// Every record in the scope. Not available on a singleton scope.
    pub async fn list<S>(&self, store: &S) -> Result<Vec<R>, ControllerError>
    where
        S: Loader<Record = R>,
    {
        match self {
            ResourceScope::Children { parent, accessor } => Ok(store.list_children(parent, accessor).await?),
            ResourceScope::TopLevel { model } => Ok(store.list_top_level(model).await?),
            ResourceScope::Singleton { .. } => Err(ControllerError::UnsupportedOperation {
                action: "list".into(),
                scope: self.kind_name().into(),
            }),
        }
    }

    /// Looks a member up by id. A singleton scope ignores `id` and answers its one child,
    /// which may not exist.
    pub async fn find<S>(&self, id: Option<&str>, store: &S) -> Result<Option<R>, ControllerError>
    where
        S: Loader<Record = R>,
    {
        match (self, id) {
            (ResourceScope::Singleton { parent, accessor }, _) => Ok(store.singleton_child(parent, accessor).await?),
            (ResourceScope::Children { parent, accessor }, Some(id)) => {
                Ok(store.find_child(parent, accessor, id).await?)
            }
            (ResourceScope::TopLevel { model }, Some(id)) => Ok(store.find_top_level(model, id).await?),
            (_, None) => Err(ControllerError::MissingParameter("id".into())),
        }
    }

    /// A new, unsaved record attached to the scope.
    pub async fn build<S>(&self, attrs: Attributes, store: &S) -> Result<R, ControllerError>
    where
        S: Loader<Record = R>,
    {
        let record = match self {
            ResourceScope::Children { parent, accessor } => store.build_child(parent, accessor, attrs).await?,
            ResourceScope::Singleton { parent, accessor } => {
                store.build_singleton_child(parent, accessor, attrs).await?
            }
            ResourceScope::TopLevel { model } => store.build_top_level(model, attrs).await?,
        };
        Ok(record)
    }
}
