//! # Parent Resolution
//!
//! Turns an [`AssociationChain`] plus the request parameters into the parent the resource
//! is addressed through.
//!
//! ## Algorithm
//!
//! 1. **Locate** (no I/O): walk the associations outer to inner. A polymorphic association
//!    picks the first candidate, in declaration order, whose id parameter is present. A
//!    normal or shallow association looks at its single id parameter. A singleton
//!    association is present iff the association directly outside it loads.
//! 2. **Check**: an absent association that is not optional fails with
//!    [`ControllerError::MissingParent`], unless a shallow association further in is present
//!    and will stand in for it.
//! 3. **Load**, strictly outer to inner, one await at a time:
//!    - through the enclosing record's accessor (`factory.employees.find(id)`) when the
//!      directly enclosing association loaded,
//!    - by id (`Factory.find(id)`) otherwise,
//!    - singletons through the enclosing record (`store.manager`).
//!
//!    A store answering `None` is [`ControllerError::NotFound`]. Nothing is substituted.
//! 4. **Back-fill**: a shallow association loaded by id walks back out through
//!    [`Loader::owner`] to fill in the absent outer associations.
//!
//! The innermost loaded association is *the* parent; the outer ones are its ancestors.
//! A registered [`ParentHook`] replaces all of the above and its answer is used verbatim.

use tracing::{debug, info, instrument, warn};

use crate::framework::chain::{AssociationChain, AssociationSpec};
use crate::framework::error::ControllerError;
use crate::framework::model::{Loader, Model};
use crate::framework::overrides::ParentHook;
use crate::framework::request::RequestContext;

/// A record exposed under a binding name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRecord<R> {
    pub name: String,
    pub record: R,
}

/// Outcome of parent resolution for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParent<R> {
    association: Option<String>,
    parent_type: Option<String>,
    polymorphic: bool,
    instance: Option<R>,
    ancestors: Vec<NamedRecord<R>>,
}

impl<R> Default for ResolvedParent<R> {
    fn default() -> Self {
        Self {
            association: None,
            parent_type: None,
            polymorphic: false,
            instance: None,
            ancestors: Vec::new(),
        }
    }
}

impl<R> ResolvedParent<R> {
    /// Top-level access: no parent.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(association: impl Into<String>, parent_type: impl Into<String>, instance: R) -> Self {
        Self {
            association: Some(association.into()),
            parent_type: Some(parent_type.into()),
            polymorphic: false,
            instance: Some(instance),
            ancestors: Vec::new(),
        }
    }

    pub fn polymorphic(
        association: impl Into<String>,
        chosen_type: impl Into<String>,
        instance: R,
    ) -> Self {
        Self {
            polymorphic: true,
            ..Self::new(association, chosen_type, instance)
        }
    }

    /// Outer resolved associations, outermost first.
    pub fn with_ancestors(mut self, ancestors: Vec<NamedRecord<R>>) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn present(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<&R> {
        self.instance.as_ref()
    }

    pub fn association(&self) -> Option<&str> {
        self.association.as_deref()
    }

    /// Concrete type of the parent (`parent_type` in controller terms).
    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type.as_deref()
    }

    /// The candidate picked for a polymorphic parent.
    pub fn chosen_type(&self) -> Option<&str> {
        if self.polymorphic {
            self.parent_type.as_deref()
        } else {
            None
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        self.polymorphic
    }

    /// Name the parent is exposed under: the chosen type for polymorphic parents
    /// (`factory`), the association name otherwise.
    pub fn binding_name(&self) -> Option<&str> {
        if self.polymorphic {
            self.parent_type.as_deref()
        } else {
            self.association.as_deref()
        }
    }

    pub fn ancestors(&self) -> &[NamedRecord<R>] {
        &self.ancestors
    }
}

/// Where a keyed association was found in the request.
struct Located<'c, 'r> {
    type_name: &'c str,
    collection: &'c str,
    id: &'r str,
}

struct Loaded<R> {
    binding: String,
    association: String,
    parent_type: String,
    polymorphic: bool,
    record: R,
}

fn locate<'c, 'r>(spec: &'c AssociationSpec, request: &'r RequestContext) -> Option<Located<'c, 'r>> {
    if spec.is_polymorphic() {
        spec.candidates().iter().find_map(|candidate| {
            request.get(&candidate.param_key).map(|id| Located {
                type_name: &candidate.type_name,
                collection: &candidate.collection,
                id,
            })
        })
    } else {
        spec.param_key_name()
            .and_then(|key| request.get(key))
            .map(|id| Located {
                type_name: spec.target_type(),
                collection: spec.collection_accessor(),
                id,
            })
    }
}

fn missing_parent(spec: &AssociationSpec) -> ControllerError {
    ControllerError::MissingParent {
        association: spec.name().to_string(),
        expected: spec.expected_keys().into_iter().map(String::from).collect(),
    }
}

/// Resolves the parent of a request against an association chain.
pub struct ParentResolver<'a, S: Loader> {
    chain: &'a AssociationChain,
    hook: Option<&'a dyn ParentHook<S>>,
}

impl<'a, S: Loader> ParentResolver<'a, S> {
    pub fn new(chain: &'a AssociationChain) -> Self {
        Self { chain, hook: None }
    }

    pub fn with_hook(mut self, hook: Option<&'a dyn ParentHook<S>>) -> Self {
        self.hook = hook;
        self
    }

    #[instrument(skip_all, fields(resource = self.chain.resource().name()))]
    pub async fn resolve(
        &self,
        request: &RequestContext,
        store: &S,
    ) -> Result<ResolvedParent<S::Record>, ControllerError> {
        let resolved = match self.hook {
            Some(hook) => {
                debug!("Parent computed by override");
                hook.resolve(self.chain, request, store).await?
            }
            None => self.resolve_declared(request, store).await?,
        };

        match resolved.binding_name() {
            Some(binding) => info!(binding, parent_type = resolved.parent_type(), "Parent resolved"),
            None => debug!("No parent, top-level access"),
        }
        Ok(resolved)
    }

    async fn resolve_declared(
        &self,
        request: &RequestContext,
        store: &S,
    ) -> Result<ResolvedParent<S::Record>, ControllerError> {
        let specs = self.chain.specs();
        let located: Vec<Option<Located<'_, '_>>> =
            specs.iter().map(|spec| locate(spec, request)).collect();

        for (position, spec) in specs.iter().enumerate() {
            if spec.is_singleton() || spec.is_optional() || located[position].is_some() {
                continue;
            }
            let covered = specs[position + 1..]
                .iter()
                .zip(&located[position + 1..])
                .any(|(inner, found)| inner.is_shallow() && found.is_some());
            if !covered {
                warn!(association = spec.name(), "Required parent parameter missing");
                return Err(missing_parent(spec));
            }
        }

        let mut loaded: Vec<Option<Loaded<S::Record>>> = specs.iter().map(|_| None).collect();
        for (position, spec) in specs.iter().enumerate() {
            let enclosing = position
                .checked_sub(1)
                .and_then(|outer| loaded[outer].as_ref());

            let level = if spec.is_singleton() {
                match enclosing {
                    Some(owner) => {
                        let accessor = spec.collection_accessor();
                        debug!(association = spec.name(), owner = %owner.binding, "Loading singleton parent");
                        let record = store
                            .singleton_child(&owner.record, accessor)
                            .await?
                            .ok_or_else(|| {
                                ControllerError::not_found(
                                    spec.target_type(),
                                    format!("{}.{}", owner.binding, accessor),
                                )
                            })?;
                        Some(Loaded {
                            binding: spec.name().to_string(),
                            association: spec.name().to_string(),
                            parent_type: spec.target_type().to_string(),
                            polymorphic: false,
                            record,
                        })
                    }
                    None if spec.is_optional() => None,
                    None => return Err(missing_parent(spec)),
                }
            } else if let Some(found) = &located[position] {
                debug!(association = spec.name(), parent_type = found.type_name, id = found.id, "Loading parent");
                let record = match enclosing {
                    Some(owner) => store.find_child(&owner.record, found.collection, found.id).await?,
                    None => store.load_by_id(found.type_name, found.id).await?,
                }
                .ok_or_else(|| {
                    warn!(parent_type = found.type_name, id = found.id, "Parent not found");
                    ControllerError::not_found(found.type_name, found.id)
                })?;
                let polymorphic = spec.is_polymorphic();
                Some(Loaded {
                    binding: if polymorphic {
                        found.type_name.to_string()
                    } else {
                        spec.name().to_string()
                    },
                    association: spec.name().to_string(),
                    parent_type: found.type_name.to_string(),
                    polymorphic,
                    record,
                })
            } else {
                None
            };

            let backfill = spec.is_shallow() && level.is_some() && enclosing.is_none() && position > 0;
            loaded[position] = level;
            if backfill {
                self.backfill(position, &mut loaded, store).await?;
            }
        }

        let mut present: Vec<Loaded<S::Record>> = loaded.into_iter().flatten().collect();
        let Some(parent) = present.pop() else {
            return Ok(ResolvedParent::none());
        };
        let ancestors = present
            .into_iter()
            .map(|level| NamedRecord {
                name: level.binding,
                record: level.record,
            })
            .collect();

        let resolved = if parent.polymorphic {
            ResolvedParent::polymorphic(parent.association, parent.parent_type, parent.record)
        } else {
            ResolvedParent::new(parent.association, parent.parent_type, parent.record)
        };
        Ok(resolved.with_ancestors(ancestors))
    }

    /// Walks out from a shallow association loaded by id, filling absent outer levels.
    async fn backfill(
        &self,
        position: usize,
        loaded: &mut [Option<Loaded<S::Record>>],
        store: &S,
    ) -> Result<(), ControllerError> {
        let Some(mut child) = loaded[position].as_ref().map(|level| level.record.clone()) else {
            return Ok(());
        };

        for outer in (0..position).rev() {
            if loaded[outer].is_some() {
                break;
            }
            let spec = &self.chain.specs()[outer];
            let Some(owner) = store.owner(&child, spec.name()).await? else {
                debug!(association = spec.name(), "Shallow back-fill stopped");
                break;
            };
            let parent_type = owner.model_name().to_string();
            debug!(association = spec.name(), %parent_type, "Back-filled outer parent");
            loaded[outer] = Some(Loaded {
                binding: if spec.is_polymorphic() {
                    parent_type.clone()
                } else {
                    spec.name().to_string()
                },
                association: spec.name().to_string(),
                parent_type,
                polymorphic: spec.is_polymorphic(),
                record: owner.clone(),
            });
            child = owner;
        }
        Ok(())
    }
}
