//! Handlers for the `/tasks` resource.
//!
//! Assignees added on create or update become project members in the same
//! transaction (see `TaskRepo`); the `task_assigned` notification follows
//! asynchronously through the event bus.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use harmony_core::access::{
    can_create_task, can_delete_task, can_view_task, check_task_update, ensure, ProjectAccess,
};
use harmony_core::types::DbId;
use harmony_db::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use harmony_db::repositories::TaskRepo;
use harmony_events::DomainEvent;
use serde_json::{Map, Value};

use super::project::load_project;
use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

async fn load_task(state: &AppState, id: DbId) -> AppResult<(Task, ProjectAccess)> {
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))?;
    let (_, access) = load_project(state, task.project_id).await?;
    Ok((task, access))
}

/// POST /api/v1/tasks
pub async fn create_task(
    actor: CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<impl IntoResponse> {
    let (_, access) = load_project(&state, input.project_id).await?;
    ensure(
        can_create_task(&actor, &access),
        "You do not have permission to create tasks in this project",
    )?;
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let (task, added) = TaskRepo::create(&state.pool, &input, actor.user_id).await?;

    tracing::info!(
        task_id = task.id,
        project_id = task.project_id,
        assignees = added.len(),
        user_id = actor.user_id,
        "Task created",
    );

    if !added.is_empty() {
        publish(
            &state,
            actor.user_id,
            DomainEvent::TaskAssigneesAdded {
                task_id: task.id,
                user_ids: added,
            },
        );
    }
    publish(&state, actor.user_id, DomainEvent::TaskSaved { task_id: task.id });

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /api/v1/tasks?project_id=&assignee_id=&status=
///
/// Tasks matching the filter that the actor may view.
pub async fn list_tasks(
    actor: CurrentActor,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = TaskRepo::list(&state.pool, &filter).await?;

    let mut projects: HashMap<DbId, ProjectAccess> = HashMap::new();
    let mut visible = Vec::with_capacity(tasks.len());
    for task in tasks {
        if !projects.contains_key(&task.project_id) {
            let (_, access) = load_project(&state, task.project_id).await?;
            projects.insert(task.project_id, access);
        }
        let allowed = projects
            .get(&task.project_id)
            .is_some_and(|access| can_view_task(&actor, access, &task.assignee_ids));
        if allowed {
            visible.push(task);
        }
    }

    Ok(Json(DataResponse { data: visible }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, access) = load_task(&state, id).await?;
    ensure(
        can_view_task(&actor, &access, &task.assignee_ids),
        "You do not have access to this task",
    )?;
    Ok(Json(DataResponse { data: task }))
}

/// PATCH /api/v1/tasks/{id}
///
/// Assignees without management rights may send `status` and nothing else;
/// every key in the body counts, including `null` and unknown ones.
/// `assignee_ids` replaces the assignee set. Fields and assignees are
/// written in one transaction.
pub async fn update_task(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<Json<DataResponse<Task>>> {
    let (task, access) = load_task(&state, id).await?;
    let scope = {
        let fields: Vec<&str> = body.keys().map(String::as_str).collect();
        check_task_update(&actor, &access, &task.assignee_ids, &fields)?
    };

    let input: UpdateTask = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Invalid task update: {e}")))?;
    if matches!(&input.title, Some(t) if t.trim().is_empty()) {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let (updated, added) = TaskRepo::update(&state.pool, id, task.project_id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))?;

    tracing::info!(task_id = id, scope = ?scope, user_id = actor.user_id, "Task updated");

    if !added.is_empty() {
        publish(
            &state,
            actor.user_id,
            DomainEvent::TaskAssigneesAdded {
                task_id: id,
                user_ids: added,
            },
        );
    }
    publish(&state, actor.user_id, DomainEvent::TaskSaved { task_id: id });

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (task, access) = load_task(&state, id).await?;
    ensure(
        can_delete_task(&actor, &access, &task.assignee_ids),
        "You do not have permission to delete this task",
    )?;

    if !TaskRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Task", id));
    }
    tracing::info!(task_id = id, user_id = actor.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
