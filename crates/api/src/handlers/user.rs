//! Handlers for the `/users` resource: the directory and admin profile
//! management.
//!
//! Identity lives with the identity provider; these endpoints manage the
//! local mirror and the role-bearing profile.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use harmony_core::access::{can_manage_users, can_view_directory, ensure};
use harmony_core::error::CoreError;
use harmony_core::roles::Role;
use harmony_core::types::DbId;
use harmony_db::models::user::{CreateUser, UpdateProfile, UserWithProfile};
use harmony_db::repositories::UserRepo;
use harmony_events::DomainEvent;

use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

const MANAGE_DENIED: &str = "Only administrators can manage users";

/// Only a super-admin may hand out the super-admin role.
fn check_role_grant(actor: &CurrentActor, role: Option<Role>) -> Result<(), CoreError> {
    match role {
        Some(Role::SuperAdmin) if !actor.is_super_admin() => Err(CoreError::Forbidden(
            "Only super administrators can grant the super_admin role".into(),
        )),
        _ => Ok(()),
    }
}

/// GET /api/v1/users
pub async fn list_directory(
    actor: CurrentActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserWithProfile>>>> {
    ensure(
        can_view_directory(&actor),
        "You do not have access to the user directory",
    )?;
    let users = UserRepo::list_directory(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/users/me
pub async fn me(actor: CurrentActor) -> Json<DataResponse<UserWithProfile>> {
    Json(DataResponse { data: actor.user })
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserWithProfile>>> {
    if id != actor.user_id {
        ensure(
            can_view_directory(&actor),
            "You do not have access to the user directory",
        )?;
    }
    let user = UserRepo::find_with_profile(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/users
pub async fn create_user(
    actor: CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    ensure(can_manage_users(&actor), MANAGE_DENIED)?;
    check_role_grant(&actor, Some(input.role))?;
    if input.username.trim().is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }

    let user = UserRepo::create(&state.pool, &input).await?;
    tracing::info!(
        new_user_id = user.id,
        role = %input.role,
        user_id = actor.user_id,
        "User created",
    );
    publish(&state, actor.user_id, DomainEvent::UserSaved { user_id: user.id });

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// PATCH /api/v1/users/{id}/profile
///
/// Role and pole assignment. Creates the profile when it is missing.
pub async fn update_profile(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<UserWithProfile>>> {
    ensure(can_manage_users(&actor), MANAGE_DENIED)?;
    check_role_grant(&actor, input.role)?;

    let user = UserRepo::update_profile(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    tracing::info!(target_user_id = id, user_id = actor.user_id, "Profile updated");
    publish(&state, actor.user_id, DomainEvent::UserSaved { user_id: id });

    Ok(Json(DataResponse { data: user }))
}

/// DELETE /api/v1/users/{id}
///
/// The ERP partner, if any, is removed asynchronously.
pub async fn delete_user(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ensure(can_manage_users(&actor), MANAGE_DENIED)?;
    if id == actor.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }

    let user = UserRepo::find_with_profile(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }

    tracing::info!(target_user_id = id, user_id = actor.user_id, "User deleted");
    publish(
        &state,
        actor.user_id,
        DomainEvent::UserDeleted {
            user_id: id,
            erp_partner_id: user.erp_partner_id,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}
