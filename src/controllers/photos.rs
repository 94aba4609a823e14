//! Polymorphic photos whose index only exposes the parent.

use async_trait::async_trait;

use crate::framework::{
    Action, ActionContext, ActionHook, AssociationChain, AssociationSpec, ConfigurationError, Controller,
    ControllerError, ExecutionResult, Mutator, OverrideRegistry, Resource, ResourceConfig,
};

/// Index that loads the parent and nothing else.
pub struct ParentOnlyIndex;

#[async_trait]
impl<S: Mutator> ActionHook<S> for ParentOnlyIndex {
    async fn call(&self, ctx: &ActionContext<'_, S>) -> Result<ExecutionResult<S::Record>, ControllerError> {
        Ok(ctx.completed(Resource::Absent))
    }
}

pub fn chain() -> Result<AssociationChain, ConfigurationError> {
    AssociationChain::builder(ResourceConfig::new("photo"))
        .belongs_to(AssociationSpec::polymorphic("parent", ["user", "task"]))
        .build()
}

pub fn controller<S: Mutator>(store: S) -> Result<Controller<S>, ConfigurationError> {
    let overrides = OverrideRegistry::builder()
        .action(Action::Index, ParentOnlyIndex)
        .build();
    Ok(Controller::new(chain()?, store).with_overrides(overrides))
}
