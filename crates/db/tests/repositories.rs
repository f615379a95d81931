//! Repository integration tests. `#[sqlx::test]` creates a fresh database
//! per test on the server named by `DATABASE_URL`.

use chrono::NaiveDate;
use harmony_core::notification::{NotificationContent, NotificationKind};
use harmony_core::project::{LeadStatus, ProjectStatus};
use harmony_core::roles::Role;
use harmony_core::types::DbId;
use harmony_db::models::notification::NewNotification;
use harmony_db::models::project::CreateProject;
use harmony_db::models::task::{CreateTask, TaskFilter};
use harmony_db::models::user::CreateUser;
use harmony_db::repositories::{NotificationRepo, ProjectRepo, TaskRepo, UserRepo};
use sqlx::PgPool;

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

async fn project(pool: &PgPool, creator: DbId, lead: Option<DbId>) -> DbId {
    let input = CreateProject {
        title: "Teaser".into(),
        description: String::new(),
        project_type: None,
        status: None,
        pole_id: None,
        client_id: None,
        lead_id: lead,
        start_date: None,
        planned_end_date: None,
        member_ids: Vec::new(),
    };
    let lead_status = lead.map(|_| LeadStatus::Pending);
    ProjectRepo::create(pool, &input, creator, ProjectStatus::InProgress, lead_status)
        .await
        .unwrap()
        .id
}

fn task_input(project_id: DbId, assignees: Vec<DbId>) -> CreateTask {
    CreateTask {
        project_id,
        title: "Storyboard".into(),
        description: String::new(),
        status: None,
        priority: None,
        deadline: NaiveDate::from_ymd_opt(2026, 3, 13),
        assignee_ids: assignees,
    }
}

#[sqlx::test]
async fn assigning_a_task_enrolls_the_assignee(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin, None).await;

    let (task, added) = TaskRepo::create(&pool, &task_input(project_id, vec![y]), admin)
        .await
        .unwrap();
    assert_eq!(added, vec![y]);
    assert_eq!(task.assignee_ids, vec![y]);

    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.member_ids, vec![y]);

    // Repeating the assignment adds nothing and does not duplicate membership.
    let again = TaskRepo::add_assignees(&pool, task.id, project_id, &[y]).await.unwrap();
    assert!(again.is_empty());
    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.member_ids, vec![y]);
}

#[sqlx::test]
async fn removing_an_assignee_keeps_membership(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let z = user(&pool, "z", Role::Member).await;
    let project_id = project(&pool, admin, None).await;
    let (task, _) = TaskRepo::create(&pool, &task_input(project_id, vec![y]), admin)
        .await
        .unwrap();

    let added = TaskRepo::set_assignees(&pool, task.id, project_id, &[z]).await.unwrap();
    assert_eq!(added, vec![z]);

    let task = TaskRepo::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(task.assignee_ids, vec![z]);
    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    let mut expected = vec![y, z];
    expected.sort_unstable();
    assert_eq!(project.member_ids, expected);
}

#[sqlx::test]
async fn lead_answer_is_recorded_once(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let lead = user(&pool, "lead", Role::Member).await;
    let project_id = project(&pool, admin, Some(lead)).await;

    assert!(ProjectRepo::resolve_lead(&pool, project_id, lead, LeadStatus::Accepted)
        .await
        .unwrap());
    assert!(!ProjectRepo::resolve_lead(&pool, project_id, lead, LeadStatus::Declined)
        .await
        .unwrap());

    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.lead_status().unwrap(), Some(LeadStatus::Accepted));
}

#[sqlx::test]
async fn deadline_notifications_deduplicate_per_day(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin, None).await;
    let (task, _) = TaskRepo::create(&pool, &task_input(project_id, vec![y]), admin)
        .await
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    let new = NewNotification {
        user_id: y,
        kind: NotificationKind::Deadline3Days,
        content: NotificationContent {
            title: "Deadline in 3 days".into(),
            message: "Storyboard • 13/03/2026".into(),
        },
        task_id: Some(task.id),
        project_id: Some(project_id),
        created_on: today,
    };

    assert!(NotificationRepo::insert_if_absent(&pool, &new).await.unwrap());
    assert!(!NotificationRepo::insert_if_absent(&pool, &new).await.unwrap());

    let tomorrow = NewNotification {
        created_on: today.succ_opt().unwrap(),
        ..new.clone()
    };
    assert!(NotificationRepo::insert_if_absent(&pool, &tomorrow).await.unwrap());
    assert_eq!(NotificationRepo::unread_count(&pool, y).await.unwrap(), 2);
}

#[sqlx::test]
async fn unique_index_guards_racing_inserts(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin, None).await;
    let (task, _) = TaskRepo::create(&pool, &task_input(project_id, vec![y]), admin)
        .await
        .unwrap();

    let new = NewNotification {
        user_id: y,
        kind: NotificationKind::TaskAssigned,
        content: NotificationContent::task_assigned("Storyboard", None),
        task_id: Some(task.id),
        project_id: Some(project_id),
        created_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
    };

    let (a, b) = tokio::join!(
        NotificationRepo::insert_if_absent(&pool, &new),
        NotificationRepo::insert_if_absent(&pool, &new),
    );
    assert_eq!(u8::from(a.unwrap()) + u8::from(b.unwrap()), 1);

    let rows = NotificationRepo::list_for_user(&pool, y, None, 50).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[sqlx::test]
async fn task_filters_and_sync_queue(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let y = user(&pool, "y", Role::Member).await;
    let project_id = project(&pool, admin, None).await;
    TaskRepo::create(&pool, &task_input(project_id, vec![y]), admin).await.unwrap();
    TaskRepo::create(&pool, &task_input(project_id, vec![]), admin).await.unwrap();

    let mine = TaskRepo::list(
        &pool,
        &TaskFilter {
            assignee_id: Some(y),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(mine.len(), 1);

    // Tasks wait until their project is mirrored.
    assert!(TaskRepo::pending_sync(&pool, 20).await.unwrap().is_empty());
    ProjectRepo::set_erp_project_id(&pool, project_id, 501).await.unwrap();
    assert_eq!(TaskRepo::pending_sync(&pool, 20).await.unwrap().len(), 2);
}

#[sqlx::test]
async fn lead_answer_cannot_outlive_the_lead(pool: PgPool) {
    let admin = user(&pool, "admin", Role::Admin).await;
    let lead = user(&pool, "lead", Role::Member).await;
    let project_id = project(&pool, admin, Some(lead)).await;

    let orphaned = sqlx::query("UPDATE projects SET lead_id = NULL WHERE id = $1")
        .bind(project_id)
        .execute(&pool)
        .await;
    assert!(orphaned.is_err());

    assert!(UserRepo::delete(&pool, lead).await.unwrap());
    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.lead_id, None);
    assert_eq!(project.lead_status().unwrap(), None);
}
