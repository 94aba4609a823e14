//! Comments nested under `projects/:project_id/tasks/:task_id`, with shallow member routes
//! (`tasks/:task_id/comments`) that back-fill the project.

use crate::framework::{AssociationChain, AssociationSpec, ConfigurationError, Controller, Mutator, ResourceConfig};

pub fn chain() -> Result<AssociationChain, ConfigurationError> {
    AssociationChain::builder(ResourceConfig::new("comment"))
        .belongs_to(AssociationSpec::belongs_to("project"))
        .belongs_to(AssociationSpec::shallow("task"))
        .build()
}

pub fn controller<S: Mutator>(store: S) -> Result<Controller<S>, ConfigurationError> {
    Ok(Controller::new(chain()?, store))
}
