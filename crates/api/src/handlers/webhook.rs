//! Inbound ERP webhooks.
//!
//! The deadline webhook accepts two payload shapes:
//!
//! - explicit: `{"task_id", "type", "users": [partner ids], "project_manager"}`
//! - terse: `{"_id"}` or `{"id"}` with `?type=` in the query; recipients
//!   are then looked up on the ERP.
//!
//! Remote partner ids resolve to local users through
//! `profiles.erp_partner_id`, restricted to the task's project members and
//! lead. A failing lookup degrades to zero recipients rather than an error.

use axum::extract::{Query, State};
use axum::Json;
use harmony_core::notification::NotificationKind;
use harmony_core::types::DbId;
use harmony_db::repositories::{ProjectRepo, TaskRepo, UserRepo};
use harmony_erp::records::TaskRecipients;
use harmony_events::NotificationEngine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::webhook::ErpWebhookAuth;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DeadlineQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Body of `POST /webhooks/erp/task-assigned`. Both ids are ERP ids.
#[derive(Debug, Deserialize)]
pub struct TaskAssignedPayload {
    pub task_id: DbId,
    /// ERP partner id of the assignee.
    pub user_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub notifications_created: usize,
}

impl WebhookResponse {
    fn created(n: usize) -> Self {
        Self {
            success: true,
            notifications_created: n,
        }
    }
}

/// A parsed deadline webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineRequest {
    pub erp_task_id: DbId,
    pub kind: NotificationKind,
    /// Present for explicit payloads; terse payloads need a lookup.
    pub recipients: Option<TaskRecipients>,
}

impl DeadlineRequest {
    /// Parse either payload shape. The type is validated before anything
    /// else so unknown types never create notifications.
    pub fn parse(body: &Value, query_kind: Option<&str>) -> Result<Self, AppError> {
        let explicit = body.get("task_id").is_some();

        let raw_kind = body
            .get("type")
            .and_then(Value::as_str)
            .or(query_kind)
            .ok_or_else(|| AppError::BadRequest("Missing notification type".into()))?;
        let kind = parse_deadline_kind(raw_kind)?;

        if explicit {
            let erp_task_id = id_field(body, "task_id")
                .ok_or_else(|| AppError::BadRequest("task_id must be an integer".into()))?;
            let assignee_partner_ids = body
                .get("users")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default();
            let manager_partner_id = id_field(body, "project_manager");
            Ok(Self {
                erp_task_id,
                kind,
                recipients: Some(TaskRecipients {
                    assignee_partner_ids,
                    manager_partner_id,
                }),
            })
        } else {
            let erp_task_id = id_field(body, "_id")
                .or_else(|| id_field(body, "id"))
                .ok_or_else(|| AppError::BadRequest("Missing task id".into()))?;
            Ok(Self {
                erp_task_id,
                kind,
                recipients: None,
            })
        }
    }
}

fn parse_deadline_kind(raw: &str) -> Result<NotificationKind, AppError> {
    match raw.parse::<NotificationKind>() {
        Ok(kind) if kind.is_deadline() => Ok(kind),
        _ => Err(AppError::BadRequest(format!(
            "Unknown deadline notification type '{raw}'"
        ))),
    }
}

/// Integer field, treating the ERP's `false` for "unset" as absent.
fn id_field(body: &Value, name: &str) -> Option<DbId> {
    body.get(name).and_then(Value::as_i64)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /webhooks/erp/deadline
pub async fn erp_deadline(
    _auth: ErpWebhookAuth,
    State(state): State<AppState>,
    Query(query): Query<DeadlineQuery>,
    Json(body): Json<Value>,
) -> AppResult<Json<WebhookResponse>> {
    let request = DeadlineRequest::parse(&body, query.kind.as_deref())?;

    let task = TaskRepo::find_by_erp_id(&state.pool, request.erp_task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", request.erp_task_id))?;

    let recipients = match request.recipients {
        Some(recipients) => recipients,
        None => match state.gateway.task_recipients(request.erp_task_id).await {
            Ok(Some(recipients)) => recipients,
            Ok(None) => {
                tracing::warn!(erp_task_id = request.erp_task_id, "ERP task not found during recipient lookup");
                TaskRecipients::default()
            }
            Err(e) => {
                tracing::warn!(erp_task_id = request.erp_task_id, error = %e, "ERP recipient lookup failed");
                TaskRecipients::default()
            }
        },
    };

    let partner_ids: Vec<DbId> = recipients
        .assignee_partner_ids
        .iter()
        .copied()
        .chain(recipients.manager_partner_id)
        .collect();

    let mut candidates = Vec::new();
    if let Some(project) = ProjectRepo::find_by_id(&state.pool, task.project_id).await? {
        candidates.extend(project.member_ids);
        candidates.extend(project.lead_id);
    }

    let user_ids = if partner_ids.is_empty() || candidates.is_empty() {
        Vec::new()
    } else {
        UserRepo::find_ids_by_partner_ids(&state.pool, &partner_ids, &candidates).await?
    };

    let created = state
        .engine
        .create_remote_deadline_notifications(&task, request.kind, &user_ids, NotificationEngine::today())
        .await;

    tracing::info!(
        task_id = task.id,
        erp_task_id = request.erp_task_id,
        kind = %request.kind,
        recipients = user_ids.len(),
        created,
        "ERP deadline webhook handled",
    );

    Ok(Json(WebhookResponse::created(created)))
}

/// POST /webhooks/erp/task-assigned
pub async fn erp_task_assigned(
    _auth: ErpWebhookAuth,
    State(state): State<AppState>,
    Json(payload): Json<TaskAssignedPayload>,
) -> AppResult<Json<WebhookResponse>> {
    let task = TaskRepo::find_by_erp_id(&state.pool, payload.task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", payload.task_id))?;
    let user_id = UserRepo::find_id_by_partner_id(&state.pool, payload.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", payload.user_id))?;

    let created = state.engine.notify_task_assigned(task.id, &[user_id]).await?;

    tracing::info!(task_id = task.id, user_id, created, "ERP task-assigned webhook handled");
    Ok(Json(WebhookResponse::created(created)))
}
