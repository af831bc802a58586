//! Role lookups fail closed to guest

use std::sync::Arc;

use dash_access::{
    get_user_role, visible_page_widgets, BackendRoleDirectory, Role, RoleDirectory,
    StaticRoleDirectory,
};
use dash_schema::{WidgetRegistry, DEFAULT_PAGE};
use dash_store::{DisabledBackend, MemoryBackend};
use dash_test_utils::{notes_widget, sample_config, FailingBackend, FailureMode};

#[tokio::test]
async fn assigned_role_resolves() {
    let backend = Arc::new(MemoryBackend::new());
    backend.assign_role("u1", "acme", "manager");
    let directory = BackendRoleDirectory::new(backend);

    assert_eq!(directory.user_role("u1", "acme").await, Role::Manager);
    assert_eq!(directory.user_role("u1", "beta").await, Role::Guest);
}

#[tokio::test]
async fn unknown_role_name_is_guest() {
    let backend = Arc::new(MemoryBackend::new());
    backend.assign_role("u1", "acme", "superuser");
    let directory = BackendRoleDirectory::new(backend);

    assert_eq!(get_user_role(&directory, "u1", "acme").await, Role::Guest);
}

#[tokio::test]
async fn backend_errors_are_guest() {
    let backend = Arc::new(FailingBackend::new(FailureMode::ALL));
    backend.inner().assign_role("u1", "acme", "admin");
    let directory = BackendRoleDirectory::new(backend.clone());
    assert_eq!(directory.user_role("u1", "acme").await, Role::Guest);

    backend.set_mode(FailureMode::default());
    assert_eq!(directory.user_role("u1", "acme").await, Role::Admin);
}

#[tokio::test]
async fn disabled_backend_is_guest() {
    let directory = BackendRoleDirectory::new(Arc::new(DisabledBackend));
    assert_eq!(directory.user_role("u1", "acme").await, Role::Guest);
}

#[tokio::test]
async fn page_visibility_combines_both_layers() {
    let mut config = sample_config("acme");
    let page = config.layouts.get_mut(DEFAULT_PAGE).unwrap();
    let mut health = notes_widget("health", 5);
    health.widget_id = "system-health".into();
    page.push(health);
    page.push(notes_widget("private-notes", 6));
    config
        .widget_permissions
        .insert("private-notes".into(), vec!["manager".into()]);

    let registry = WidgetRegistry::with_defaults();
    let role = StaticRoleDirectory(Role::User).user_role("u", "acme").await;
    let visible: Vec<_> = visible_page_widgets(&config, DEFAULT_PAGE, &registry, role.as_str())
        .into_iter()
        .map(|w| w.id.as_str())
        .collect();

    assert!(!visible.contains(&"health"));
    assert!(!visible.contains(&"private-notes"));
    assert!(visible.contains(&"sales-chart"));

    let admin_sees = visible_page_widgets(&config, DEFAULT_PAGE, &registry, "admin");
    assert_eq!(admin_sees.len(), config.page(DEFAULT_PAGE).len());
}
