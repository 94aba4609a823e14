//! A singleton resource: every store has at most one manager, addressed without an id.

use crate::framework::{AssociationChain, AssociationSpec, ConfigurationError, Controller, Mutator, ResourceConfig};

pub fn chain() -> Result<AssociationChain, ConfigurationError> {
    AssociationChain::builder(ResourceConfig::singleton("manager"))
        .belongs_to(AssociationSpec::belongs_to("store"))
        .build()
}

pub fn controller<S: Mutator>(store: S) -> Result<Controller<S>, ConfigurationError> {
    Ok(Controller::new(chain()?, store))
}
