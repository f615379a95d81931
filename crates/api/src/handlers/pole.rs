//! Handlers for the `/poles` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use harmony_core::access::{can_manage_poles, can_view_poles, ensure};
use harmony_core::types::DbId;
use harmony_db::models::pole::{CreatePole, Pole, UpdatePole};
use harmony_db::repositories::PoleRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

const VIEW_DENIED: &str = "You do not have access to poles";
const MANAGE_DENIED: &str = "Only administrators can manage poles";

/// GET /api/v1/poles
pub async fn list_poles(
    actor: CurrentActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Pole>>>> {
    ensure(can_view_poles(&actor), VIEW_DENIED)?;
    let poles = PoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: poles }))
}

/// GET /api/v1/poles/{id}
pub async fn get_pole(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Pole>>> {
    ensure(can_view_poles(&actor), VIEW_DENIED)?;
    let pole = PoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Pole", id))?;
    Ok(Json(DataResponse { data: pole }))
}

/// POST /api/v1/poles
pub async fn create_pole(
    actor: CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreatePole>,
) -> AppResult<impl IntoResponse> {
    ensure(can_manage_poles(&actor), MANAGE_DENIED)?;
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let pole = PoleRepo::create(&state.pool, &input).await?;
    tracing::info!(pole_id = pole.id, user_id = actor.user_id, "Pole created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: pole })))
}

/// PATCH /api/v1/poles/{id}
pub async fn update_pole(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePole>,
) -> AppResult<Json<DataResponse<Pole>>> {
    ensure(can_manage_poles(&actor), MANAGE_DENIED)?;
    let pole = PoleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Pole", id))?;
    Ok(Json(DataResponse { data: pole }))
}

/// DELETE /api/v1/poles/{id}
pub async fn delete_pole(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ensure(can_manage_poles(&actor), MANAGE_DENIED)?;
    if !PoleRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Pole", id));
    }
    tracing::info!(pole_id = id, user_id = actor.user_id, "Pole deleted");
    Ok(StatusCode::NO_CONTENT)
}
