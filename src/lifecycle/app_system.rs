use serde_json::json;
use tracing::{error, info};

use crate::controllers;
use crate::framework::{Attributes, ConfigurationError, Controller, ControllerError, Record, StoreError};
use crate::store::{self, StoreClient};

/// Failures while starting or stopping the [`AppSystem`].
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("Store task failed: {0}")]
    Task(String),
}

/// Owns the store actor and one controller per sample resource.
///
/// # Example
///
/// ```ignore
/// let system = AppSystem::new()?;
/// let factory = system.store.insert("factory", attrs).await?;
/// let result = system
///     .employees
///     .index(&RequestContext::new().param("factory_id", factory.id().unwrap()))
///     .await?;
/// system.shutdown().await?;
/// ```
pub struct AppSystem {
    pub store: StoreClient,
    pub employees: Controller<StoreClient>,
    pub managers: Controller<StoreClient>,
    pub photos: Controller<StoreClient>,
    pub tasks: Controller<StoreClient>,
    pub comments: Controller<StoreClient>,
    handle: tokio::task::JoinHandle<()>,
}

impl AppSystem {
    /// Spawns the store actor and builds every controller. A broken declaration fails here,
    /// before any request is served.
    pub fn new() -> Result<Self, SystemError> {
        let (actor, client) = store::new(controllers::schema());
        let handle = tokio::spawn(actor.run());

        Ok(Self {
            employees: controllers::employees::controller(client.clone())?,
            managers: controllers::managers::controller(client.clone())?,
            photos: controllers::photos::controller(client.clone())?,
            tasks: controllers::tasks::controller(client.clone())?,
            comments: controllers::comments::controller(client.clone())?,
            store: client,
            handle,
        })
    }

    /// Inserts a small data set: one factory, one company, one store, one user, one project
    /// with one task, and an employee in each employer.
    pub async fn seed(&self) -> Result<Seeded, SystemError> {
        let factory = self.store.insert("factory", named("North Works")).await?;
        let company = self.store.insert("company", named("Acme")).await?;
        let store = self.store.insert("store", named("Main Street")).await?;
        let user = self.store.insert("user", named("ann")).await?;
        let project = self.store.insert("project", named("Launch")).await?;
        let task = self
            .store
            .insert_child(&project, "tasks", attrs("title", "Write docs"))
            .await?;
        self.store
            .insert_child(&factory, "employees", named("Welder"))
            .await?;
        self.store
            .insert_child(&company, "employees", named("Accountant"))
            .await?;

        info!(%factory, %company, %store, %user, %project, %task, "Seeded");
        Ok(Seeded {
            factory,
            company,
            store,
            user,
            project,
            task,
        })
    }

    /// Drops every client and waits for the store actor to drain.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        drop(self.employees);
        drop(self.managers);
        drop(self.photos);
        drop(self.tasks);
        drop(self.comments);
        drop(self.store);

        if let Err(e) = self.handle.await {
            error!("Store task failed: {:?}", e);
            return Err(SystemError::Task(e.to_string()));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

/// Records created by [`AppSystem::seed`].
#[derive(Debug, Clone)]
pub struct Seeded {
    pub factory: Record,
    pub company: Record,
    pub store: Record,
    pub user: Record,
    pub project: Record,
    pub task: Record,
}

pub fn attrs(key: &str, value: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert(key.to_string(), json!(value));
    attrs
}

pub fn named(name: &str) -> Attributes {
    attrs("name", name)
}
