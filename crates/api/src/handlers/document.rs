//! Handlers for the `/documents` resource.
//!
//! Uploads go straight to the blob store; this API only records the
//! returned URL against a project.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use harmony_core::access::{can_delete_document, ensure};
use harmony_core::document::is_valid_file_url;
use harmony_core::types::DbId;
use harmony_db::models::document::{CreateDocument, Document};
use harmony_db::repositories::DocumentRepo;
use serde::Deserialize;

use super::project::load_visible_project;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub project_id: DbId,
}

/// POST /api/v1/documents
pub async fn create_document(
    actor: CurrentActor,
    State(state): State<AppState>,
    Json(input): Json<CreateDocument>,
) -> AppResult<impl IntoResponse> {
    load_visible_project(&state, &actor, input.project_id).await?;
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }
    if !is_valid_file_url(&input.file_url) {
        return Err(AppError::BadRequest(
            "file_url must be an http(s) URL returned by the file store".into(),
        ));
    }

    let document = DocumentRepo::create(&state.pool, &input, actor.user_id).await?;
    tracing::info!(
        document_id = document.id,
        project_id = document.project_id,
        user_id = actor.user_id,
        "Document registered",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: document })))
}

/// GET /api/v1/documents?project_id=
pub async fn list_documents(
    actor: CurrentActor,
    State(state): State<AppState>,
    Query(params): Query<DocumentQuery>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    load_visible_project(&state, &actor, params.project_id).await?;
    let documents = DocumentRepo::list_for_project(&state.pool, params.project_id).await?;
    Ok(Json(DataResponse { data: documents }))
}

/// GET /api/v1/documents/{id}
pub async fn get_document(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Document>>> {
    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Document", id))?;
    load_visible_project(&state, &actor, document.project_id).await?;
    Ok(Json(DataResponse { data: document }))
}

/// DELETE /api/v1/documents/{id}
///
/// Admin-tier or the uploader. The blob itself is left to the store's
/// own lifecycle.
pub async fn delete_document(
    actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Document", id))?;
    ensure(
        can_delete_document(&actor, document.uploaded_by),
        "Only the uploader or an administrator can delete this document",
    )?;

    if !DocumentRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Document", id));
    }
    tracing::info!(document_id = id, user_id = actor.user_id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
