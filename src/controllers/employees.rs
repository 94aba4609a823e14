//! `belongs_to :factory, :company, polymorphic: true`

use crate::framework::{AssociationChain, AssociationSpec, ConfigurationError, Controller, Mutator, ResourceConfig};

pub fn chain() -> Result<AssociationChain, ConfigurationError> {
    AssociationChain::builder(ResourceConfig::new("employee"))
        .belongs_to(AssociationSpec::polymorphic("parent", ["factory", "company"]))
        .build()
}

pub fn controller<S: Mutator>(store: S) -> Result<Controller<S>, ConfigurationError> {
    Ok(Controller::new(chain()?, store))
}
