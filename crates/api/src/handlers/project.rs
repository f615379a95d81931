//! Handlers for the `/projects` resource.
//!
//! Every decision goes through `harmony_core::access` and
//! `harmony_core::project`; nothing here re-derives a role rule.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use harmony_core::access::{
    can_change_status, can_create_project, can_delete_project, can_manage_members,
    can_manage_project, can_view_project, check_update_status, ensure, get_available_statuses,
    ProjectAccess,
};
use harmony_core::error::CoreError;
use harmony_core::project::{
    decide_lead, get_next_status, initial_status, is_new_lead, lead_status_after_assignment,
    LeadDecision, ProjectStatus,
};
use harmony_core::types::DbId;
use harmony_db::models::project::{CreateProject, Project, UpdateProject, UpdateProjectStatus};
use harmony_db::repositories::ProjectRepo;
use harmony_events::DomainEvent;
use serde::Serialize;

use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for `GET /projects/{id}/next-status`.
#[derive(Debug, Serialize)]
pub struct NextStatus {
    pub current: ProjectStatus,
    pub next: ProjectStatus,
}

/// Load a project and its policy view, or 404.
pub(crate) async fn load_project(
    state: &AppState,
    id: DbId,
) -> AppResult<(Project, ProjectAccess)> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    let access = project.access()?;
    Ok((project, access))
}

/// Load a project the actor may see. Hidden projects are 403, not 404.
pub(crate) async fn load_visible_project(
    state: &AppState,
    actor: &CurrentActor,
    id: DbId,
) -> AppResult<(Project, ProjectAccess)> {
    let (project, access) = load_project(state, id).await?;
    ensure(
        can_view_project(actor, &access),
        "You do not have access to this project",
    )?;
    Ok((project, access))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
///
/// Any status may be requested at creation. Admin-tier creators skip the
/// approval gate; a designated lead starts in `pending`.
pub async fn create_project(
    actor: CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    ensure(
        can_create_project(&actor),
        "You do not have permission to create projects",
    )?;
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let status = initial_status(&actor, input.status);
    let lead_status = lead_status_after_assignment(None, input.lead_id, None);
    let project =
        ProjectRepo::create(&state.pool, &input, actor.user_id, status, lead_status).await?;

    tracing::info!(
        project_id = project.id,
        status = %status,
        user_id = actor.user_id,
        "Project created",
    );

    publish(&state, actor.user_id, DomainEvent::ProjectSaved { project_id: project.id });
    if !project.member_ids.is_empty() {
        publish(
            &state,
            actor.user_id,
            DomainEvent::ProjectMembersAdded {
                project_id: project.id,
                user_ids: project.member_ids.clone(),
            },
        );
    }
    if let Some(lead_id) = project.lead_id {
        publish(
            &state,
            actor.user_id,
            DomainEvent::ProjectLeadAssigned {
                project_id: project.id,
                lead_id,
            },
        );
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
///
/// Projects the actor may view.
pub async fn list_projects(
    actor: CurrentActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects: Vec<Project> = ProjectRepo::list(&state.pool)
        .await?
        .into_iter()
        .filter(|p| match p.access() {
            Ok(access) => can_view_project(&actor, &access),
            Err(e) => {
                tracing::warn!(project_id = p.id, error = %e, "Skipping unreadable project");
                false
            }
        })
        .collect();
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let (project, _) = load_visible_project(&state, &actor, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PATCH /api/v1/projects/{id}
///
/// Detail fields need management rights. `member_ids` only adds members
/// and is also open to whoever may manage members.
pub async fn update_project(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    let (project, access) = load_project(&state, id).await?;

    if input.touches_details() {
        ensure(
            can_manage_project(&actor, &access),
            "You do not have permission to modify this project",
        )?;
        check_update_status(&actor, input.status)?;
    }
    if input.member_ids.is_some() {
        ensure(
            can_manage_project(&actor, &access) || can_manage_members(&actor, &access),
            "You do not have permission to manage members of this project",
        )?;
    }
    if matches!(&input.title, Some(t) if t.trim().is_empty()) {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let new_lead = input.lead_after(project.lead_id);
    let lead_status = lead_status_after_assignment(project.lead_id, new_lead, access.lead_status);
    let (updated, added) = ProjectRepo::update(&state.pool, id, &input, lead_status)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;

    tracing::info!(project_id = id, user_id = actor.user_id, "Project updated");

    publish(&state, actor.user_id, DomainEvent::ProjectSaved { project_id: id });
    if !added.is_empty() {
        publish(
            &state,
            actor.user_id,
            DomainEvent::ProjectMembersAdded {
                project_id: id,
                user_ids: added,
            },
        );
    }
    if let (true, Some(lead_id)) = (is_new_lead(project.lead_id, new_lead), new_lead) {
        publish(
            &state,
            actor.user_id,
            DomainEvent::ProjectLeadAssigned {
                project_id: id,
                lead_id,
            },
        );
    }

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/projects/{id}
///
/// Super-admin only. Tasks and documents go with the project.
pub async fn delete_project(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (_, access) = load_project(&state, id).await?;
    ensure(
        can_delete_project(&actor, &access),
        "Only super administrators can delete projects",
    )?;

    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Project", id));
    }
    tracing::info!(project_id = id, user_id = actor.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// PATCH /api/v1/projects/{id}/status
pub async fn change_status(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectStatus>,
) -> AppResult<Json<DataResponse<Project>>> {
    let (project, access) = load_project(&state, id).await?;
    ensure(
        can_change_status(&actor, &access, Some(input.status)),
        "You do not have permission to set this status",
    )?;

    let updated = ProjectRepo::set_status(&state.pool, id, input.status)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;

    tracing::info!(
        project_id = id,
        from = %project.status,
        to = %input.status,
        user_id = actor.user_id,
        "Project status changed",
    );
    publish(&state, actor.user_id, DomainEvent::ProjectSaved { project_id: id });

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/projects/{id}/available-statuses
pub async fn available_statuses(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectStatus>>>> {
    let (_, access) = load_visible_project(&state, &actor, id).await?;
    Ok(Json(DataResponse {
        data: get_available_statuses(&actor, &access),
    }))
}

/// GET /api/v1/projects/{id}/next-status
pub async fn next_status(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<NextStatus>>> {
    let (_, access) = load_visible_project(&state, &actor, id).await?;
    Ok(Json(DataResponse {
        data: NextStatus {
            current: access.status,
            next: get_next_status(access.status),
        },
    }))
}

/// POST /api/v1/projects/{id}/accept-lead
pub async fn accept_lead(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    answer_lead(&actor, &state, id, LeadDecision::Accept).await
}

/// POST /api/v1/projects/{id}/decline-lead
pub async fn decline_lead(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    answer_lead(&actor, &state, id, LeadDecision::Decline).await
}

async fn answer_lead(
    actor: &CurrentActor,
    state: &AppState,
    id: DbId,
    decision: LeadDecision,
) -> AppResult<Json<DataResponse<Project>>> {
    let (_, access) = load_project(state, id).await?;
    let answer = decide_lead(actor, &access, decision)?;

    // Guarded on `lead_status = 'pending'`: a concurrent answer wins.
    if !ProjectRepo::resolve_lead(&state.pool, id, actor.user_id, answer).await? {
        return Err(AppError::Core(CoreError::InvalidTransition(
            "Lead designation is no longer pending".into(),
        )));
    }

    tracing::info!(project_id = id, user_id = actor.user_id, answer = %answer, "Lead designation answered");

    let (project, _) = load_project(state, id).await?;
    Ok(Json(DataResponse { data: project }))
}
