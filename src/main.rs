//! Demo: seeds the memory store and runs a scripted set of requests through the sample
//! controllers, logging what each one exposes.

use resource_recipe::framework::{Binding, ExecutionResult, Model, Record, RequestContext};
use resource_recipe::lifecycle::{attrs, named, setup_tracing, AppSystem, SystemError};
use tracing::{error, info, Instrument};

fn report(result: &ExecutionResult<Record>) {
    for (name, binding) in result.bindings() {
        match binding {
            Binding::Record(record) => info!(binding = name, %record, "Exposed"),
            Binding::Collection(records) => info!(binding = name, count = records.len(), "Exposed"),
        }
    }
    if let Some(errors) = result.errors() {
        info!(action = %result.action(), ?errors, "Rejected");
    }
}

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    setup_tracing();

    info!("Starting application");

    let system = AppSystem::new()?;
    let seeded = system.seed().await?;
    let id = |record: &Record| record.id().unwrap_or_default().to_string();

    // Polymorphic parent: the factory is picked because `factory_id` is present
    let span = tracing::info_span!("employees");
    async {
        let request = RequestContext::new().param("factory_id", id(&seeded.factory));
        let result = system.employees.index(&request).await?;
        info!(parent_type = ?result.parent().parent_type(), "Listed employees");
        report(&result);

        let request = RequestContext::new()
            .param("company_id", id(&seeded.company))
            .payload("employee", named(""));
        let result = system.employees.create(&request).await?;
        report(&result);
        Ok::<_, SystemError>(())
    }
    .instrument(span)
    .await?;

    // Singleton: the manager is reached through the store, no id
    let span = tracing::info_span!("managers");
    async {
        let request = RequestContext::new().param("store_id", id(&seeded.store));
        let result = system.managers.show(&request).await?;
        info!(absent = result.resource().is_absent(), "Manager before create");

        let request = request.payload("manager", named("Grace"));
        let result = system.managers.create(&request).await?;
        report(&result);

        let request = RequestContext::new()
            .param("store_id", id(&seeded.store))
            .payload("manager", named("Grace Hopper"));
        let result = system.managers.update(&request).await?;
        report(&result);
        Ok::<_, SystemError>(())
    }
    .instrument(span)
    .await?;

    // Overridden index: only the parent is exposed
    let span = tracing::info_span!("photos");
    async {
        let request = RequestContext::new()
            .param("user_id", id(&seeded.user))
            .payload("photo", attrs("title", "Sunset"));
        system.photos.create(&request).await?;
        let result = system.photos.index(&request).await?;
        report(&result);
        Ok::<_, SystemError>(())
    }
    .instrument(span)
    .await?;

    // Shallow: a comment addressed by task alone still exposes its project
    let span = tracing::info_span!("comments");
    async {
        let request = RequestContext::new()
            .param("project_id", id(&seeded.project))
            .param("task_id", id(&seeded.task))
            .payload("comment", attrs("body", "Looks good"));
        system.comments.create(&request).await?;

        let request = RequestContext::new().param("task_id", id(&seeded.task));
        let result = system.comments.index(&request).await?;
        report(&result);

        let result = system
            .tasks
            .show(&RequestContext::new().param("project_id", "404").param("id", id(&seeded.task)))
            .await;
        if let Err(e) = result {
            error!(error = %e, not_found = e.is_not_found(), "Task lookup failed");
        }
        Ok::<_, SystemError>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
