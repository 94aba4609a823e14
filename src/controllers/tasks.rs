//! Tasks under projects, declared as data.

use crate::framework::{AssociationChain, ChainDeclaration, ConfigurationError, Controller, Mutator};

pub const DECLARATION: &str = r#"{
    "resource": { "name": "task" },
    "belongs_to": [{ "name": "project" }]
}"#;

pub fn chain() -> Result<AssociationChain, ConfigurationError> {
    AssociationChain::try_from(ChainDeclaration::from_json(DECLARATION)?)
}

pub fn controller<S: Mutator>(store: S) -> Result<Controller<S>, ConfigurationError> {
    Ok(Controller::new(chain()?, store))
}
