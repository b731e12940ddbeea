//! Effective permissions and the navigation menu derived from them

mod common;

use auth::domain::repository::CatalogRepository;
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{Value, json};

async fn me(app: &TestApp, token: &str) -> Value {
    let (status, body) = app.send(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_user_without_grants_has_empty_menu() {
    let app = TestApp::new().await;
    app.create_user("ada@example.com", &[]).await;
    let token = app.token("ada@example.com").await;

    let body = me(&app, &token).await;
    assert_eq!(body["permissions"], json!([]));
    assert_eq!(body["navigator"], json!([]));
}

#[tokio::test]
async fn test_role_and_direct_grants_are_merged_without_duplicates() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    app.grant_via_role(user_id, "Staff", &["view-users", "view-home"])
        .await;
    app.grant_via_role(user_id, "Support", &["view-home", "logout-users"])
        .await;
    app.repo
        .grant_permission(user_id, app.permission("view-users"))
        .await;
    app.repo
        .grant_permission(user_id, app.permission("ban-users"))
        .await;
    let token = app.token("ada@example.com").await;

    let body = me(&app, &token).await;
    // Role-derived names first (by name), then direct grants not already present
    assert_eq!(
        body["permissions"],
        json!(["logout-users", "view-home", "view-users", "ban-users"])
    );
}

#[tokio::test]
async fn test_inactive_and_deleted_roles_grant_nothing() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    let inactive = app.grant_via_role(user_id, "Paused", &["view-home"]).await;
    let deleted = app.grant_via_role(user_id, "Gone", &["view-users"]).await;
    app.grant_via_role(user_id, "Live", &["view-product"]).await;
    let token = app.token("ada@example.com").await;

    assert_eq!(
        app.repo.toggle_role_status(&inactive).await.unwrap(),
        Some(false)
    );
    assert!(app.repo.soft_delete_role(&deleted).await.unwrap());

    let body = me(&app, &token).await;
    assert_eq!(body["permissions"], json!(["view-product"]));

    // Reactivation restores the role's grants
    assert_eq!(
        app.repo.toggle_role_status(&inactive).await.unwrap(),
        Some(true)
    );
    let body = me(&app, &token).await;
    assert_eq!(body["permissions"], json!(["view-home", "view-product"]));
}

#[tokio::test]
async fn test_inactive_permission_is_dropped_from_roles_and_direct_grants() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    app.grant_via_role(user_id, "Staff", &["view-home", "view-users"])
        .await;
    app.repo
        .grant_permission(user_id, app.permission("ban-users"))
        .await;
    let token = app.token("ada@example.com").await;

    app.repo
        .toggle_permission_status(&app.permission("view-users"))
        .await
        .unwrap();
    app.repo
        .toggle_permission_status(&app.permission("ban-users"))
        .await
        .unwrap();

    let body = me(&app, &token).await;
    assert_eq!(body["permissions"], json!(["view-home"]));
}

#[tokio::test]
async fn test_module_switch_hides_all_of_its_permissions() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    app.grant_via_role(user_id, "Staff", &["view-home", "view-users", "edit-users"])
        .await;
    let token = app.token("ada@example.com").await;
    let module_id = app.modules["User Management"];

    assert_eq!(
        app.repo.toggle_module_status(&module_id).await.unwrap(),
        Some(false)
    );
    let body = me(&app, &token).await;
    assert_eq!(body["permissions"], json!(["view-home"]));

    // The permissions' own flags were untouched
    assert_eq!(
        app.repo.toggle_module_status(&module_id).await.unwrap(),
        Some(true)
    );
    let body = me(&app, &token).await;
    assert_eq!(
        body["permissions"],
        json!(["edit-users", "view-home", "view-users"])
    );
}

#[tokio::test]
async fn test_permission_changes_apply_to_existing_tokens() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    let token = app.token("ada@example.com").await;

    let (denied, body) = app
        .send(Method::GET, "/setting/module", Some(&token), None)
        .await;
    assert_eq!(denied, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Missing permission: view-module-setting");

    app.repo
        .grant_permission(user_id, app.permission("view-module-setting"))
        .await;

    let (allowed, _) = app
        .send(Method::GET, "/setting/module", Some(&token), None)
        .await;
    assert_eq!(allowed, StatusCode::OK);
}

#[tokio::test]
async fn test_settings_group_needs_parent_and_a_child() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    let token = app.token("ada@example.com").await;

    app.repo
        .grant_permission(user_id, app.permission("view-setting"))
        .await;
    assert_eq!(me(&app, &token).await["navigator"], json!([]));

    app.repo
        .grant_permission(user_id, app.permission("view-config-setting"))
        .await;
    app.repo
        .grant_permission(user_id, app.permission("view-role-setting"))
        .await;

    let body = me(&app, &token).await;
    assert_eq!(
        body["navigator"],
        json!([{
            "title": "Setting",
            "icon": { "icon": "tabler-settings" },
            "children": [
                { "title": "Role", "to": "settings-role" },
                { "title": "Config", "to": "settings-config" },
            ],
        }])
    );
}

#[tokio::test]
async fn test_admin_menu_lists_everything_in_fixed_order() {
    let app = TestApp::new().await;
    app.create_admin("root@example.com").await;
    let token = app.token("root@example.com").await;

    let body = me(&app, &token).await;
    let titles: Vec<&str> = body["navigator"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();

    assert_eq!(titles, ["Home", "Product", "User", "Setting"]);
    assert_eq!(body["navigator"][0]["to"], json!({ "name": "root" }));
    assert_eq!(
        body["navigator"][3]["children"].as_array().unwrap().len(),
        3
    );
    assert_eq!(body["permissions"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn test_soft_deleted_role_is_hidden_from_lookups() {
    let app = TestApp::new().await;
    let user_id = app.create_user("ada@example.com", &[]).await;
    let role_id = app.grant_via_role(user_id, "Staff", &["view-home"]).await;

    let before = app.repo.find_role(&role_id).await.unwrap().unwrap();
    assert!(before.role.deleted_at.is_none());
    assert_eq!(before.permission_ids, vec![app.permission("view-home")]);

    assert!(app.repo.soft_delete_role(&role_id).await.unwrap());
    assert!(app.repo.find_role(&role_id).await.unwrap().is_none());
    assert!(!app.repo.soft_delete_role(&role_id).await.unwrap());
    let staff = app.repo.find_role_id_by_name("Staff").await.unwrap();
    assert!(staff.is_none());
}
