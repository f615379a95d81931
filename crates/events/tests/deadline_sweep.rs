//! Deadline sweep against a fresh database per test (`DATABASE_URL`).

use chrono::NaiveDate;
use harmony_core::project::{LeadStatus, ProjectStatus};
use harmony_core::roles::Role;
use harmony_core::types::DbId;
use harmony_db::models::project::CreateProject;
use harmony_db::models::task::CreateTask;
use harmony_db::models::user::CreateUser;
use harmony_db::repositories::{NotificationRepo, ProjectRepo, TaskRepo, UserRepo};
use harmony_events::NotificationEngine;
use sqlx::PgPool;

async fn user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.into(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Member,
            pole_id: None,
            client_type: None,
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_is_idempotent_within_a_day(pool: PgPool) {
    let creator = user(&pool, "creator").await;
    let lead = user(&pool, "lead").await;
    let assignee = user(&pool, "assignee").await;

    let project = ProjectRepo::create(
        &pool,
        &CreateProject {
            title: "Teaser".into(),
            description: String::new(),
            project_type: None,
            status: None,
            pole_id: None,
            client_id: None,
            lead_id: Some(lead),
            start_date: None,
            planned_end_date: None,
            member_ids: vec![],
        },
        creator,
        ProjectStatus::InProgress,
        Some(LeadStatus::Pending),
    )
    .await
    .unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    TaskRepo::create(
        &pool,
        &CreateTask {
            project_id: project.id,
            title: "Storyboard".into(),
            description: String::new(),
            status: None,
            priority: None,
            deadline: NaiveDate::from_ymd_opt(2026, 3, 13),
            assignee_ids: vec![assignee],
        },
        creator,
    )
    .await
    .unwrap();

    let engine = NotificationEngine::new(pool.clone());

    let first = engine.check_deadline_notifications(today).await.unwrap();
    assert_eq!(first.tasks, 1);
    assert_eq!(first.created, 2);

    let second = engine.check_deadline_notifications(today).await.unwrap();
    assert_eq!(second.created, 0);

    for user_id in [lead, assignee] {
        assert_eq!(NotificationRepo::unread_count(&pool, user_id).await.unwrap(), 1);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn done_tasks_are_not_swept(pool: PgPool) {
    let creator = user(&pool, "creator").await;
    let project = ProjectRepo::create(
        &pool,
        &CreateProject {
            title: "Teaser".into(),
            description: String::new(),
            project_type: None,
            status: None,
            pole_id: None,
            client_id: None,
            lead_id: None,
            start_date: None,
            planned_end_date: None,
            member_ids: vec![],
        },
        creator,
        ProjectStatus::InProgress,
        None,
    )
    .await
    .unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    TaskRepo::create(
        &pool,
        &CreateTask {
            project_id: project.id,
            title: "Wrap".into(),
            description: String::new(),
            status: Some(harmony_core::task::TaskStatus::Done),
            priority: None,
            deadline: Some(today),
            assignee_ids: vec![creator],
        },
        creator,
    )
    .await
    .unwrap();

    let report = NotificationEngine::new(pool)
        .check_deadline_notifications(today)
        .await
        .unwrap();
    assert_eq!(report, Default::default());
}
