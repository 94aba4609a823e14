//! # Association Chain
//!
//! The declarative half of a controller: which parents a resource is nested under, and how
//! the resource itself is reached once the parent is known.
//!
//! A chain is declared once, validated once, and then shared read-only by every request the
//! controller serves. All naming conventions (`store_id`, `employees`) are applied here, at
//! build time, so the resolver only ever reads stored strings.
//!
//! ```rust
//! use resource_recipe::framework::{AssociationChain, AssociationSpec, ResourceConfig};
//!
//! // belongs_to :factory, :company, polymorphic: true
//! let chain = AssociationChain::builder(ResourceConfig::new("employee"))
//!     .belongs_to(AssociationSpec::polymorphic("parent", ["factory", "company"]))
//!     .build()
//!     .unwrap();
//!
//! let parent = &chain.specs()[0];
//! assert_eq!(parent.expected_keys(), vec!["factory_id", "company_id"]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::framework::error::ConfigurationError;

/// How a parent association is addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    /// Fixed type, fixed id parameter.
    #[default]
    Normal,
    /// Type picked per request from an ordered candidate list.
    Polymorphic,
    /// One-to-one, no id parameter; reached through the association outside it.
    Singleton,
    /// Like `Normal`, but may be loaded by id when outer associations are absent.
    Shallow,
}

/// Default accessor name for a collection of `name`. Irregular plurals (`person` to
/// `people`) must be set explicitly with `collection(..)`.
pub(crate) fn pluralize(name: &str) -> String {
    let consonant_y = name.len() > 1
        && name.ends_with('y')
        && !name[..name.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);
    if consonant_y {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with(['s', 'x', 'z']) || name.ends_with("ch") || name.ends_with("sh") {
        format!("{name}es")
    } else {
        format!("{name}s")
    }
}

/// One possible type of a polymorphic parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub type_name: String,
    pub param_key: String,
    pub collection: String,
}

impl Candidate {
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            param_key: format!("{type_name}_id"),
            collection: pluralize(&type_name),
            type_name,
        }
    }

    pub fn param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = key.into();
        self
    }

    pub fn collection(mut self, accessor: impl Into<String>) -> Self {
        self.collection = accessor.into();
        self
    }
}

/// A single declared parent association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSpec {
    name: String,
    kind: AssociationKind,
    target: String,
    candidates: Vec<Candidate>,
    optional: Option<bool>,
    param_key: Option<String>,
    collection: String,
}

impl AssociationSpec {
    /// `belongs_to :store`
    pub fn belongs_to(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            target: name.clone(),
            param_key: Some(format!("{name}_id")),
            collection: pluralize(&name),
            kind: AssociationKind::Normal,
            candidates: Vec::new(),
            optional: None,
            name,
        }
    }

    /// `belongs_to :user, :task, polymorphic: true`
    pub fn polymorphic<I, S>(name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            target: String::new(),
            param_key: None,
            collection: pluralize(&name),
            kind: AssociationKind::Polymorphic,
            candidates: types.into_iter().map(Candidate::new).collect(),
            optional: None,
            name,
        }
    }

    /// `belongs_to :manager, singleton: true`
    pub fn singleton(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            target: name.clone(),
            param_key: None,
            collection: name.clone(),
            kind: AssociationKind::Singleton,
            candidates: Vec::new(),
            optional: None,
            name,
        }
    }

    /// `belongs_to :task, shallow: true`
    pub fn shallow(name: impl Into<String>) -> Self {
        Self {
            kind: AssociationKind::Shallow,
            ..Self::belongs_to(name)
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn param_key(mut self, key: impl Into<String>) -> Self {
        if self.param_key.is_some() {
            self.param_key = Some(key.into());
        }
        self
    }

    pub fn target(mut self, type_name: impl Into<String>) -> Self {
        self.target = type_name.into();
        self
    }

    /// Accessor used to reach this association through the one outside it.
    pub fn collection(mut self, accessor: impl Into<String>) -> Self {
        self.collection = accessor.into();
        self
    }

    /// Appends a polymorphic candidate with explicit keys.
    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn target_type(&self) -> &str {
        &self.target
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn param_key_name(&self) -> Option<&str> {
        self.param_key.as_deref()
    }

    pub fn collection_accessor(&self) -> &str {
        &self.collection
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    pub fn is_polymorphic(&self) -> bool {
        self.kind == AssociationKind::Polymorphic
    }

    pub fn is_singleton(&self) -> bool {
        self.kind == AssociationKind::Singleton
    }

    pub fn is_shallow(&self) -> bool {
        self.kind == AssociationKind::Shallow
    }

    /// Request keys that make this association present, in lookup order.
    pub fn expected_keys(&self) -> Vec<&str> {
        match self.kind {
            AssociationKind::Polymorphic => self
                .candidates
                .iter()
                .map(|c| c.param_key.as_str())
                .collect(),
            _ => self.param_key.as_deref().into_iter().collect(),
        }
    }
}

/// Whether the managed resource is a collection or a one-to-one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Collection,
    Singleton,
}

/// The resource a controller manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    name: String,
    collection: String,
    model: String,
    singleton: bool,
    id_param: String,
    payload_key: String,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection: pluralize(&name),
            model: name.clone(),
            singleton: false,
            id_param: "id".to_string(),
            payload_key: name.clone(),
            name,
        }
    }

    /// `defaults singleton: true`
    pub fn singleton(name: impl Into<String>) -> Self {
        Self {
            singleton: true,
            ..Self::new(name)
        }
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn id_param(mut self, param: impl Into<String>) -> Self {
        self.id_param = param.into();
        self
    }

    pub fn payload_key(mut self, key: impl Into<String>) -> Self {
        self.payload_key = key.into();
        self
    }

    /// Member binding name, and the singleton accessor on the parent.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collection binding name, and the children accessor on the parent.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn id_param_name(&self) -> &str {
        &self.id_param
    }

    pub fn payload_key_name(&self) -> &str {
        &self.payload_key
    }

    pub fn kind(&self) -> TerminalKind {
        if self.singleton {
            TerminalKind::Singleton
        } else {
            TerminalKind::Collection
        }
    }
}

/// What to do when an association whose optionality was never declared has none of its
/// parameters in the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingParentPolicy {
    /// Fail the request with `MissingParent`.
    #[default]
    Reject,
    /// Treat the association as optional and fall back to top-level access.
    TopLevel,
}

/// Validated, immutable declaration of a controller's parents and resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationChain {
    specs: Vec<AssociationSpec>,
    resource: ResourceConfig,
    policy: MissingParentPolicy,
}

impl AssociationChain {
    pub fn builder(resource: ResourceConfig) -> ChainBuilder {
        ChainBuilder {
            resource,
            specs: Vec::new(),
            policy: MissingParentPolicy::default(),
        }
    }

    /// Outermost first.
    pub fn specs(&self) -> &[AssociationSpec] {
        &self.specs
    }

    pub fn resource(&self) -> &ResourceConfig {
        &self.resource
    }

    pub fn terminal_kind(&self) -> TerminalKind {
        self.resource.kind()
    }

    pub fn missing_parent_policy(&self) -> MissingParentPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.resource.name.is_empty() {
            return Err(ConfigurationError::EmptyResource);
        }

        let last = self.specs.len().saturating_sub(1);
        let mut seen = HashSet::new();
        for (position, spec) in self.specs.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(ConfigurationError::EmptyName);
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigurationError::DuplicateAssociation(spec.name.clone()));
            }
            match spec.kind {
                AssociationKind::Polymorphic => {
                    if spec.candidates.is_empty() {
                        return Err(ConfigurationError::MissingCandidates(spec.name.clone()));
                    }
                    if spec.candidates.iter().any(|c| c.type_name.is_empty()) {
                        return Err(ConfigurationError::EmptyCandidate(spec.name.clone()));
                    }
                }
                _ if spec.target.is_empty() => {
                    return Err(ConfigurationError::MissingTargetType(spec.name.clone()));
                }
                AssociationKind::Singleton if position != last => {
                    return Err(ConfigurationError::SingletonNotInnermost(spec.name.clone()));
                }
                AssociationKind::Singleton if position == 0 => {
                    return Err(ConfigurationError::SingletonWithoutOwner(spec.name.clone()));
                }
                _ => {}
            }
        }

        if self.resource.singleton && self.specs.iter().all(AssociationSpec::is_optional) {
            return Err(ConfigurationError::SingletonWithoutParent(
                self.resource.name.clone(),
            ));
        }
        Ok(())
    }
}

/// Collects `belongs_to` declarations into an [`AssociationChain`].
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    resource: ResourceConfig,
    specs: Vec<AssociationSpec>,
    policy: MissingParentPolicy,
}

impl ChainBuilder {
    /// Declares the next association, inside all previously declared ones.
    pub fn belongs_to(mut self, spec: AssociationSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn missing_parent(mut self, policy: MissingParentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<AssociationChain, ConfigurationError> {
        let fallback = self.policy == MissingParentPolicy::TopLevel;
        let specs = self
            .specs
            .into_iter()
            .map(|mut spec| {
                spec.optional = Some(spec.optional.unwrap_or(fallback));
                spec
            })
            .collect();

        let chain = AssociationChain {
            specs,
            resource: self.resource,
            policy: self.policy,
        };
        chain.validate()?;
        Ok(chain)
    }
}

// =============================================================================
// SERDE DECLARATIONS
// =============================================================================

/// Serializable form of a chain, for controllers declared in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDeclaration {
    pub resource: ResourceDeclaration,
    #[serde(default)]
    pub belongs_to: Vec<AssociationDeclaration>,
    #[serde(default)]
    pub missing_parent: MissingParentPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    pub name: String,
    #[serde(default)]
    pub singleton: bool,
    pub collection: Option<String>,
    pub model: Option<String>,
    pub id_param: Option<String>,
    pub payload_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDeclaration {
    pub name: String,
    #[serde(default)]
    pub kind: AssociationKind,
    #[serde(default)]
    pub candidates: Vec<String>,
    pub optional: Option<bool>,
    pub param_key: Option<String>,
    pub target: Option<String>,
    pub collection: Option<String>,
}

impl ChainDeclaration {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidDeclaration(e.to_string()))
    }
}

impl From<ResourceDeclaration> for ResourceConfig {
    fn from(decl: ResourceDeclaration) -> Self {
        let mut config = if decl.singleton {
            ResourceConfig::singleton(decl.name)
        } else {
            ResourceConfig::new(decl.name)
        };
        if let Some(collection) = decl.collection {
            config = config.collection(collection);
        }
        if let Some(model) = decl.model {
            config = config.model(model);
        }
        if let Some(id_param) = decl.id_param {
            config = config.id_param(id_param);
        }
        if let Some(payload_key) = decl.payload_key {
            config = config.payload_key(payload_key);
        }
        config
    }
}

impl From<AssociationDeclaration> for AssociationSpec {
    fn from(decl: AssociationDeclaration) -> Self {
        let mut spec = match decl.kind {
            AssociationKind::Normal => AssociationSpec::belongs_to(decl.name),
            AssociationKind::Polymorphic => AssociationSpec::polymorphic(decl.name, decl.candidates),
            AssociationKind::Singleton => AssociationSpec::singleton(decl.name),
            AssociationKind::Shallow => AssociationSpec::shallow(decl.name),
        };
        if let Some(target) = decl.target {
            spec = spec.target(target);
        }
        if let Some(key) = decl.param_key {
            spec = spec.param_key(key);
        }
        if let Some(collection) = decl.collection {
            spec = spec.collection(collection);
        }
        if let Some(optional) = decl.optional {
            spec = spec.optional(optional);
        }
        spec
    }
}

impl TryFrom<ChainDeclaration> for AssociationChain {
    type Error = ConfigurationError;

    fn try_from(decl: ChainDeclaration) -> Result<Self, Self::Error> {
        decl.belongs_to
            .into_iter()
            .fold(
                AssociationChain::builder(decl.resource.into()).missing_parent(decl.missing_parent),
                |builder, assoc| builder.belongs_to(assoc.into()),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belongs_to_derives_conventional_names() {
        let spec = AssociationSpec::belongs_to("store");
        assert_eq!(spec.target_type(), "store");
        assert_eq!(spec.param_key_name(), Some("store_id"));
        assert_eq!(spec.collection_accessor(), "stores");
        assert_eq!(spec.expected_keys(), vec!["store_id"]);
    }

    #[test]
    fn test_explicit_keys_override_conventions() {
        let spec = AssociationSpec::belongs_to("owner")
            .target("person")
            .param_key("person_id")
            .collection("people");
        assert_eq!(spec.target_type(), "person");
        assert_eq!(spec.param_key_name(), Some("person_id"));
        assert_eq!(spec.collection_accessor(), "people");
    }

    #[test]
    fn test_default_accessors_follow_english_plurals() {
        assert_eq!(pluralize("employee"), "employees");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");

        let spec = AssociationSpec::polymorphic("parent", ["factory", "company"]);
        let accessors: Vec<&str> = spec.candidates().iter().map(|c| c.collection.as_str()).collect();
        assert_eq!(accessors, vec!["factories", "companies"]);
        assert_eq!(ResourceConfig::new("category").collection_name(), "categories");
    }

    #[test]
    fn test_singleton_has_no_param_key() {
        let spec = AssociationSpec::singleton("manager").param_key("ignored");
        assert_eq!(spec.param_key_name(), None);
        assert!(spec.expected_keys().is_empty());
        assert_eq!(spec.collection_accessor(), "manager");
    }

    #[test]
    fn test_polymorphic_candidates_keep_declaration_order() {
        let spec = AssociationSpec::polymorphic("parent", ["user", "task"])
            .candidate(Candidate::new("album").param_key("album_slug"));
        let types: Vec<&str> = spec.candidates().iter().map(|c| c.type_name.as_str()).collect();
        assert_eq!(types, vec!["user", "task", "album"]);
        assert_eq!(spec.expected_keys(), vec!["user_id", "task_id", "album_slug"]);
    }

    #[test]
    fn test_empty_chain_is_valid_for_collections() {
        let chain = AssociationChain::builder(ResourceConfig::new("employee"))
            .build()
            .unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.terminal_kind(), TerminalKind::Collection);
        assert_eq!(chain.resource().collection_name(), "employees");
    }

    #[test]
    fn test_polymorphic_without_candidates_is_rejected() {
        let err = AssociationChain::builder(ResourceConfig::new("photo"))
            .belongs_to(AssociationSpec::polymorphic("parent", Vec::<String>::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingCandidates("parent".into()));
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let err = AssociationChain::builder(ResourceConfig::new("employee"))
            .belongs_to(AssociationSpec::belongs_to("factory").target(""))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingTargetType("factory".into()));
    }

    #[test]
    fn test_singleton_must_be_innermost() {
        let err = AssociationChain::builder(ResourceConfig::new("report"))
            .belongs_to(AssociationSpec::belongs_to("store"))
            .belongs_to(AssociationSpec::singleton("manager"))
            .belongs_to(AssociationSpec::belongs_to("shift"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::SingletonNotInnermost("manager".into()));
    }

    #[test]
    fn test_singleton_needs_an_owner() {
        let err = AssociationChain::builder(ResourceConfig::new("report"))
            .belongs_to(AssociationSpec::singleton("manager"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::SingletonWithoutOwner("manager".into()));
    }

    #[test]
    fn test_duplicate_association_is_rejected() {
        let err = AssociationChain::builder(ResourceConfig::new("employee"))
            .belongs_to(AssociationSpec::belongs_to("factory"))
            .belongs_to(AssociationSpec::belongs_to("factory"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateAssociation("factory".into()));
    }

    #[test]
    fn test_singleton_resource_requires_a_guaranteed_parent() {
        let err = AssociationChain::builder(ResourceConfig::singleton("manager"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::SingletonWithoutParent("manager".into()));

        let err = AssociationChain::builder(ResourceConfig::singleton("manager"))
            .belongs_to(AssociationSpec::belongs_to("store").optional(true))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::SingletonWithoutParent("manager".into()));

        let chain = AssociationChain::builder(ResourceConfig::singleton("manager"))
            .belongs_to(AssociationSpec::belongs_to("store"))
            .build()
            .unwrap();
        assert_eq!(chain.terminal_kind(), TerminalKind::Singleton);
    }

    #[test]
    fn test_policy_fills_in_undeclared_optionality() {
        let chain = AssociationChain::builder(ResourceConfig::new("photo"))
            .belongs_to(AssociationSpec::polymorphic("parent", ["user", "task"]))
            .belongs_to(AssociationSpec::belongs_to("album").optional(false))
            .missing_parent(MissingParentPolicy::TopLevel)
            .build()
            .unwrap();
        assert!(chain.specs()[0].is_optional());
        assert!(!chain.specs()[1].is_optional());

        let chain = AssociationChain::builder(ResourceConfig::new("photo"))
            .belongs_to(AssociationSpec::polymorphic("parent", ["user", "task"]))
            .build()
            .unwrap();
        assert!(!chain.specs()[0].is_optional());
    }

    #[test]
    fn test_declaration_from_json() {
        let json = r#"{
            "resource": { "name": "employee", "collection": "staff" },
            "belongs_to": [
                { "name": "parent", "kind": "polymorphic", "candidates": ["factory", "company"] }
            ],
            "missing_parent": "top_level"
        }"#;
        let decl: ChainDeclaration = serde_json::from_str(json).unwrap();
        let chain = AssociationChain::try_from(decl).unwrap();

        assert_eq!(chain.resource().collection_name(), "staff");
        assert_eq!(chain.missing_parent_policy(), MissingParentPolicy::TopLevel);
        assert!(chain.specs()[0].is_polymorphic());
        assert!(chain.specs()[0].is_optional());
    }

    #[test]
    fn test_invalid_declaration_is_rejected() {
        let json = r#"{
            "resource": { "name": "manager", "singleton": true }
        }"#;
        let decl: ChainDeclaration = serde_json::from_str(json).unwrap();
        assert_eq!(
            AssociationChain::try_from(decl).unwrap_err(),
            ConfigurationError::SingletonWithoutParent("manager".into())
        );
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = ChainDeclaration::from_json(r#"{ "belongs_to": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDeclaration(_)));
    }
}
