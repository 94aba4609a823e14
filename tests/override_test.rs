use async_trait::async_trait;
use resource_recipe::controllers::employees;
use resource_recipe::framework::mock::MockStore;
use resource_recipe::framework::{
    Action, ActionContext, ActionHook, AssociationChain, CollectionHook, Controller, ControllerError,
    ExecutionResult, OverrideRegistry, Record, RequestContext, ResolvedParent, ResourceHook,
    ResourceScope, ScopeHook,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Employees controller with `factory#37` expected to be loaded first, plus the given hooks.
///
/// Pattern 2: Controller + OverrideRegistry + MockStore
/// - The call log shows which stock steps ran and which were replaced
fn factory_setup(overrides: OverrideRegistry<MockStore>) -> (Controller<MockStore>, MockStore, Record) {
    let store = MockStore::new();
    let factory = Record::new("factory", "37");
    store
        .expect_load_by_id("factory", "37")
        .return_ok(Some(factory.clone()));
    let controller = employees::controller(store.clone())
        .unwrap()
        .with_overrides(overrides);
    (controller, store, factory)
}

fn factory_request() -> RequestContext {
    RequestContext::new().param("factory_id", "37")
}

/// Lists archived employees instead of the factory's own.
struct ArchivedScope;

#[async_trait]
impl ScopeHook<MockStore> for ArchivedScope {
    async fn scope(
        &self,
        _chain: &AssociationChain,
        _request: &RequestContext,
        parent: &ResolvedParent<Record>,
        _store: &MockStore,
    ) -> Result<ResourceScope<Record>, ControllerError> {
        assert!(parent.present());
        Ok(ResourceScope::TopLevel {
            model: "archived_employee".into(),
        })
    }
}

#[tokio::test]
async fn test_scope_hook_replaces_the_derived_scope() {
    let overrides = OverrideRegistry::<MockStore>::builder()
        .scope(ArchivedScope)
        .build();
    let (controller, store, factory) = factory_setup(overrides);
    let archived = Record::new("archived_employee", "9");
    store
        .expect_list_top_level("archived_employee")
        .return_ok(vec![archived.clone()]);

    let result = controller.index(&factory_request()).await.unwrap();

    assert_eq!(result.parent().instance(), Some(&factory));
    assert_eq!(result.resource().collection(), Some(&[archived][..]));
    assert_eq!(
        store.calls(),
        vec![
            "load_by_id(factory, 37)".to_string(),
            "list_top_level(archived_employee)".to_string(),
        ]
    );
    store.verify();
}

/// Keeps only the first record of the scope.
struct FirstOnly;

#[async_trait]
impl CollectionHook<MockStore> for FirstOnly {
    async fn collection(&self, ctx: &ActionContext<'_, MockStore>) -> Result<Vec<Record>, ControllerError> {
        let mut records = ctx.scope.list(ctx.store).await?;
        records.truncate(1);
        Ok(records)
    }
}

#[tokio::test]
async fn test_collection_hook_replaces_the_listing() {
    let overrides = OverrideRegistry::<MockStore>::builder()
        .collection(FirstOnly)
        .build();
    let (controller, store, factory) = factory_setup(overrides);
    let ann = Record::new("employee", "1");
    let bob = Record::new("employee", "2");
    store
        .expect_list_children("employees")
        .on(&factory)
        .return_ok(vec![ann.clone(), bob]);

    let result = controller.index(&factory_request()).await.unwrap();

    assert_eq!(result.resource().collection(), Some(&[ann][..]));
    // one listing only: the stock listing did not also run
    assert_eq!(
        store.calls(),
        vec![
            "load_by_id(factory, 37)".to_string(),
            "list_children(factory#37, employees)".to_string(),
        ]
    );
    store.verify();
}

/// Looks employees up by the `slug` param instead of `id`.
struct BySlug;

#[async_trait]
impl ResourceHook<MockStore> for BySlug {
    async fn resource(&self, ctx: &ActionContext<'_, MockStore>) -> Result<Option<Record>, ControllerError> {
        let slug = ctx
            .request
            .get("slug")
            .ok_or_else(|| ControllerError::MissingParameter("slug".into()))?;
        ctx.scope.find(Some(slug), ctx.store).await
    }
}

#[tokio::test]
async fn test_resource_hook_replaces_the_member_lookup() {
    let overrides = OverrideRegistry::<MockStore>::builder()
        .resource(BySlug)
        .build();
    let (controller, store, factory) = factory_setup(overrides);
    let ann = Record::new("employee", "1");
    store
        .expect_find_child("employees", "ann")
        .on(&factory)
        .return_ok(Some(ann.clone()));

    // no `id` param: the stock lookup would have failed with MissingParameter
    let result = controller
        .show(&factory_request().param("slug", "ann"))
        .await
        .unwrap();

    assert_eq!(result.resource().member(), Some(&ann));
    store.verify();
}

#[tokio::test]
async fn test_resource_hook_feeds_stock_update() {
    let overrides = OverrideRegistry::<MockStore>::builder()
        .resource(BySlug)
        .build();
    let (controller, store, factory) = factory_setup(overrides);
    let ann = Record::new("employee", "1");
    store
        .expect_find_child("employees", "ann")
        .on(&factory)
        .return_ok(Some(ann.clone()));
    store.expect_update().on(&ann).return_ok(true);

    let result = controller
        .update(&factory_request().param("slug", "ann"))
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(
        store.calls(),
        vec![
            "load_by_id(factory, 37)".to_string(),
            "find_child(factory#37, employees, ann)".to_string(),
            "update(employee#1)".to_string(),
        ]
    );
    store.verify();
}

/// Derives the stock scope, counting how often it is asked to.
struct CountingScope {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ScopeHook<MockStore> for CountingScope {
    async fn scope(
        &self,
        chain: &AssociationChain,
        _request: &RequestContext,
        parent: &ResolvedParent<Record>,
        _store: &MockStore,
    ) -> Result<ResourceScope<Record>, ControllerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ResourceScope::derive(chain, parent)
    }
}

/// Counts how often it runs, then falls back to the stock action.
struct CountingDestroy {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ActionHook<MockStore> for CountingDestroy {
    async fn call(&self, ctx: &ActionContext<'_, MockStore>) -> Result<ExecutionResult<Record>, ControllerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.default_action().await
    }
}

#[tokio::test]
async fn test_destroy_override_resolves_parent_and_scope_once() {
    let scopes = Arc::new(AtomicUsize::new(0));
    let destroys = Arc::new(AtomicUsize::new(0));
    let overrides = OverrideRegistry::<MockStore>::builder()
        .scope(CountingScope { calls: scopes.clone() })
        .action(Action::Destroy, CountingDestroy { calls: destroys.clone() })
        .build();
    let (controller, store, factory) = factory_setup(overrides);
    let employee = Record::new("employee", "42");
    store
        .expect_find_child("employees", "42")
        .on(&factory)
        .return_ok(Some(employee.clone()));
    store.expect_destroy().on(&employee).return_ok(true);

    let result = controller
        .destroy(&factory_request().param("id", "42"))
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(scopes.load(Ordering::SeqCst), 1);
    assert_eq!(destroys.load(Ordering::SeqCst), 1);
    // a single parent load, even though the hook re-entered the stock action
    assert_eq!(
        store.calls(),
        vec![
            "load_by_id(factory, 37)".to_string(),
            "find_child(factory#37, employees, 42)".to_string(),
            "destroy(employee#42)".to_string(),
        ]
    );
    store.verify();
}
