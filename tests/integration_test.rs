use async_trait::async_trait;
use resource_recipe::framework::{
    Action, ActionContext, ActionHook, Binding, Controller, ControllerError, ExecutionResult, Model, OverrideRegistry,
    Record, RequestContext, Resource,
};
use resource_recipe::lifecycle::{attrs, named, AppSystem};
use resource_recipe::store::StoreClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn id(record: &Record) -> String {
    record.id().unwrap_or_default().to_string()
}

/// Full end-to-end test with the real store actor.
/// This tests every action of one controller against persisted state.
#[tokio::test]
async fn test_employee_lifecycle_under_a_factory() {
    let system = AppSystem::new().expect("Failed to start system");
    let seeded = system.seed().await.expect("Failed to seed");
    let factory_id = id(&seeded.factory);

    // index: only the factory's employee, not the company's
    let request = RequestContext::new().param("factory_id", factory_id.clone());
    let result = system.employees.index(&request).await.unwrap();
    let employees = result.resource().collection().unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].attribute("name"), Some(&serde_json::json!("Welder")));

    // create
    let request = RequestContext::new()
        .param("factory_id", factory_id.clone())
        .payload("employee", named("Ann"));
    let created = system.employees.create(&request).await.unwrap();
    assert!(created.success());
    let ann = created.resource().member().unwrap().clone();
    assert!(ann.is_persisted());
    assert_eq!(ann.attribute("factory_id"), Some(&serde_json::json!(factory_id)));

    // show
    let request = RequestContext::new()
        .param("factory_id", factory_id.clone())
        .param("id", id(&ann));
    let shown = system.employees.show(&request).await.unwrap();
    assert_eq!(shown.resource().member(), Some(&ann));

    // update
    let request = request.payload("employee", named("Ann Lee"));
    let updated = system.employees.update(&request).await.unwrap();
    assert!(updated.success());

    // destroy
    let destroyed = system.employees.destroy(&request).await.unwrap();
    assert!(destroyed.success());
    let err = system.employees.show(&request).await.unwrap_err();
    assert!(err.is_not_found());

    system.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_employee_of_another_parent_is_not_found() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();

    let request = RequestContext::new().param("company_id", id(&seeded.company));
    let company_employees = system.employees.index(&request).await.unwrap();
    let accountant = company_employees.resource().collection().unwrap()[0].clone();

    let request = RequestContext::new()
        .param("factory_id", id(&seeded.factory))
        .param("id", id(&accountant));
    let err = system.employees.show(&request).await.unwrap_err();

    assert_eq!(err, ControllerError::not_found("employee", id(&accountant)));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_create_is_rejected_without_error() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();

    let request = RequestContext::new()
        .param("company_id", id(&seeded.company))
        .payload("employee", named("   "));
    let result = system.employees.create(&request).await.unwrap();

    assert!(!result.success());
    assert_eq!(result.errors().unwrap().get("name"), ["can't be blank"]);
    let unsaved = result.resource().member().unwrap();
    assert!(!unsaved.is_persisted());
    assert_eq!(unsaved.errors().len(), 1);
    assert_eq!(result.parent().chosen_type(), Some("company"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_singleton_manager_flow() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();
    let request = RequestContext::new().param("store_id", id(&seeded.store));

    let before = system.managers.show(&request).await.unwrap();
    assert!(before.resource().is_absent());

    let created = system
        .managers
        .create(&request.clone().payload("manager", named("Grace")))
        .await
        .unwrap();
    assert!(created.success());

    let shown = system.managers.show(&request).await.unwrap();
    let manager = shown.resource().member().unwrap();
    assert_eq!(manager.attribute("store_id"), Some(&serde_json::json!(id(&seeded.store))));

    let rejected = system
        .managers
        .update(&request.clone().payload("manager", named("")))
        .await
        .unwrap();
    assert!(!rejected.success());
    assert_eq!(rejected.errors().unwrap().get("name"), ["can't be blank"]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shallow_comment_backfills_project() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();

    let nested = RequestContext::new()
        .param("project_id", id(&seeded.project))
        .param("task_id", id(&seeded.task))
        .payload("comment", attrs("body", "Ship it"));
    assert!(system.comments.create(&nested).await.unwrap().success());

    let shallow = RequestContext::new().param("task_id", id(&seeded.task));
    let result = system.comments.index(&shallow).await.unwrap();

    let bindings = result.bindings();
    assert_eq!(bindings.get("project"), Some(&Binding::Record(&seeded.project)));
    assert_eq!(bindings.get("task"), Some(&Binding::Record(&seeded.task)));
    match bindings.get("comments") {
        Some(Binding::Collection(comments)) => assert_eq!(comments.len(), 1),
        other => panic!("expected comments, got {:?}", other),
    }

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_task_declared_from_json_checks_its_project() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();

    let request = RequestContext::new()
        .param("project_id", "404")
        .param("id", id(&seeded.task));
    let err = system.tasks.show(&request).await.unwrap_err();
    assert_eq!(err, ControllerError::not_found("project", "404"));

    let request = RequestContext::new()
        .param("project_id", id(&seeded.project))
        .param("id", id(&seeded.task));
    let result = system.tasks.show(&request).await.unwrap();
    assert_eq!(result.resource().member(), Some(&seeded.task));

    system.shutdown().await.unwrap();
}

/// Counts how often it runs, then falls back to the stock action.
struct CountingDestroy {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ActionHook<StoreClient> for CountingDestroy {
    async fn call(&self, ctx: &ActionContext<'_, StoreClient>) -> Result<ExecutionResult<Record>, ControllerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(ctx.parent.present(), "parent is resolved before the hook runs");
        ctx.default_action().await
    }
}

#[tokio::test]
async fn test_destroy_override_runs_once_with_resolved_parent() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let overrides = OverrideRegistry::builder()
        .action(Action::Destroy, CountingDestroy { calls: calls.clone() })
        .build();
    let controller = resource_recipe::controllers::employees::controller(system.store.clone())
        .unwrap()
        .with_overrides(overrides);

    let request = RequestContext::new().param("factory_id", id(&seeded.factory));
    let welder = controller.index(&request).await.unwrap().into_resource();
    let Resource::Collection(records) = welder else {
        panic!("index exposes a collection");
    };

    let request = request.param("id", id(&records[0]));
    let result = controller.destroy(&request).await.unwrap();

    assert!(result.success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.parent().present());

    drop(controller);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_through_one_controller() {
    let system = AppSystem::new().unwrap();
    let seeded = system.seed().await.unwrap();
    let controller: Controller<StoreClient> = system.employees.clone();

    let mut handles = Vec::new();
    for n in 0..10 {
        let controller = controller.clone();
        let (key, parent) = if n % 2 == 0 {
            ("factory_id", id(&seeded.factory))
        } else {
            ("company_id", id(&seeded.company))
        };
        handles.push(tokio::spawn(async move {
            let request = RequestContext::new()
                .param(key, parent)
                .payload("employee", named(&format!("Worker {}", n)));
            controller.create(&request).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.success());
    }

    let factory = system
        .employees
        .index(&RequestContext::new().param("factory_id", id(&seeded.factory)))
        .await
        .unwrap();
    let company = system
        .employees
        .index(&RequestContext::new().param("company_id", id(&seeded.company)))
        .await
        .unwrap();
    assert_eq!(factory.resource().collection().unwrap().len(), 6);
    assert_eq!(company.resource().collection().unwrap().len(), 6);

    drop(controller);
    system.shutdown().await.unwrap();
}
