//! Update endpoints against a fresh database per test.
//!
//! Covers the all-or-nothing behavior of task and project updates, the
//! assignee-only key rule, and clearing a project lead.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{build_app_with_pool, delete, get, patch_json, post_json, send, token_for};
use harmony_core::project::ProjectStatus;
use harmony_core::roles::Role;
use harmony_core::types::DbId;
use harmony_db::models::project::CreateProject;
use harmony_db::models::task::CreateTask;
use harmony_db::models::user::CreateUser;
use harmony_db::repositories::{ProjectRepo, TaskRepo, UserRepo};

/// An id no user row carries.
const MISSING_USER: DbId = 424_242;

async fn user(pool: &PgPool, username: &str, role: Role) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.into(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            role,
            pole_id: None,
            client_type: None,
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn project(pool: &PgPool, creator: DbId) -> DbId {
    let input = CreateProject {
        title: "Teaser".into(),
        description: String::new(),
        project_type: None,
        status: None,
        pole_id: None,
        client_id: None,
        lead_id: None,
        start_date: None,
        planned_end_date: None,
        member_ids: Vec::new(),
    };
    ProjectRepo::create(pool, &input, creator, ProjectStatus::InProgress, None)
        .await
        .unwrap()
        .id
}

async fn task(pool: &PgPool, project_id: DbId, creator: DbId, assignees: Vec<DbId>) -> DbId {
    let input = CreateTask {
        project_id,
        title: "Storyboard".into(),
        description: String::new(),
        status: None,
        priority: None,
        deadline: None,
        assignee_ids: assignees,
    };
    TaskRepo::create(pool, &input, creator).await.unwrap().0.id
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_assignee_write_leaves_task_untouched(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin).await;
    let task_id = task(&pool, project_id, admin, vec![y]).await;
    let app = build_app_with_pool(pool.clone(), None);

    let (status, _) = send(
        app,
        patch_json(
            &format!("/api/v1/tasks/{task_id}"),
            &token_for(admin),
            json!({ "title": "Renamed", "assignee_ids": [MISSING_USER] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let task = TaskRepo::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.title, "Storyboard");
    assert_eq!(task.assignee_ids, vec![y]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn assignee_may_send_status_and_nothing_else(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin).await;
    let task_id = task(&pool, project_id, admin, vec![y]).await;
    let app = build_app_with_pool(pool.clone(), None);
    let uri = format!("/api/v1/tasks/{task_id}");
    let token = token_for(y);

    // A null value still names a field.
    let (status, body) = send(
        app.clone(),
        patch_json(&uri, &token, json!({ "status": "done", "title": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    // So does a key the task does not have.
    let (status, body) = send(
        app.clone(),
        patch_json(&uri, &token, json!({ "status": "in_progress", "titre": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let task = TaskRepo::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, "todo");

    let (status, body) = send(app, patch_json(&uri, &token, json!({ "status": "done" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "done");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_task_keys_are_rejected_for_managers(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let project_id = project(&pool, admin).await;
    let task_id = task(&pool, project_id, admin, vec![]).await;
    let app = build_app_with_pool(pool.clone(), None);

    let (status, body) = send(
        app,
        patch_json(
            &format!("/api/v1/tasks/{task_id}"),
            &token_for(admin),
            json!({ "titre": "Renamed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_member_write_leaves_project_untouched(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let project_id = project(&pool, admin).await;
    let app = build_app_with_pool(pool.clone(), None);

    let (status, body) = send(
        app,
        patch_json(
            &format!("/api/v1/projects/{project_id}"),
            &token_for(admin),
            json!({ "title": "Renamed", "member_ids": [MISSING_USER] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.title, "Teaser");
    assert!(project.member_ids.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn null_lead_clears_lead_and_answer(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let lead = user(&pool, "lead", Role::Member).await;
    let project_id = project(&pool, admin).await;
    let app = build_app_with_pool(pool.clone(), None);
    let uri = format!("/api/v1/projects/{project_id}");
    let token = token_for(admin);

    let (status, body) = send(app.clone(), patch_json(&uri, &token, json!({ "lead_id": lead }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lead_id"], lead);
    assert_eq!(body["data"]["lead_status"], "pending");

    // Leaving the key out keeps the lead.
    let (status, body) = send(app.clone(), patch_json(&uri, &token, json!({ "title": "Teaser 2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lead_id"], lead);

    let (status, body) = send(app, patch_json(&uri, &token, json!({ "lead_id": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["lead_id"].is_null());
    assert!(body["data"]["lead_status"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deleting_the_lead_account_clears_the_answer(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let lead = user(&pool, "lead", Role::Member).await;
    let project_id = project(&pool, admin).await;
    let app = build_app_with_pool(pool.clone(), None);
    let token = token_for(admin);

    let (status, _) = send(
        app.clone(),
        patch_json(&format!("/api/v1/projects/{project_id}"), &token, json!({ "lead_id": lead })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(app.clone(), delete(&format!("/api/v1/users/{lead}"), &token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let bearer = format!("Bearer {token}");
    let (status, body) = send(app, get(&format!("/api/v1/projects/{project_id}"), Some(&bearer))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["lead_id"].is_null());
    assert!(body["data"]["lead_status"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn pole_lead_may_create_with_any_status(pool: PgPool) {
    let pole_lead = user(&pool, "pl", Role::PoleLead).await;
    let app = build_app_with_pool(pool, None);

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/projects",
            Some(&token_for(pole_lead)),
            json!({ "title": "Clip", "status": "in_progress" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "in_progress");
}
