//! The sync gateway: one connection, paced and retried calls, cached reads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use harmony_core::types::DbId;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::cache::{partner_key, project_key, TtlCache};
use crate::config::ErpConfig;
use crate::error::ErpError;
use crate::records::{
    decode_first, decode_id, decode_ids, many2many_ids, many2one_id, PartnerRecord,
    PartnerValues, ProjectRecord, ProjectValues, TaskRecipients, TaskValues, PARTNER_MODEL,
    PARTNER_READ_FIELDS, PROJECT_MODEL, PROJECT_READ_FIELDS, TASK_MODEL, USER_MODEL,
};
use crate::retry::{RetryPolicy, Throttle};
use crate::transport::JsonRpcConnector;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Opens sessions against the ERP.
#[async_trait]
pub trait ErpConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ErpSession>, ErpError>;
}

/// An authenticated ERP session able to run model methods.
#[async_trait]
pub trait ErpSession: Send + Sync {
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, ErpError>;
}

enum ConnectionState {
    Untried,
    Connected(Arc<dyn ErpSession>),
    /// Remembered so later calls fail fast instead of reconnecting.
    Failed(String),
}

// ---------------------------------------------------------------------------
// SyncGateway
// ---------------------------------------------------------------------------

pub struct SyncGateway {
    connector: Arc<dyn ErpConnector>,
    state: Mutex<ConnectionState>,
    throttle: Throttle,
    retry: RetryPolicy,
    cache: TtlCache,
}

impl SyncGateway {
    /// Gateway speaking JSON-RPC with the given settings. Nothing is
    /// contacted until the first call.
    pub fn from_config(config: ErpConfig) -> Self {
        let min_call_interval = config.min_call_interval;
        Self::new(Arc::new(JsonRpcConnector::new(config)), min_call_interval)
    }

    pub fn new(connector: Arc<dyn ErpConnector>, min_call_interval: Duration) -> Self {
        Self {
            connector,
            state: Mutex::new(ConnectionState::Untried),
            throttle: Throttle::new(min_call_interval),
            retry: RetryPolicy::default(),
            cache: TtlCache::default(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// The current session, connecting on first use. A failed connection is
    /// reported as `NotConfigured` on every call until [`Self::reconnect`].
    async fn session(&self) -> Result<Arc<dyn ErpSession>, ErpError> {
        let mut state = self.state.lock().await;
        match &*state {
            ConnectionState::Connected(session) => return Ok(session.clone()),
            ConnectionState::Failed(reason) => return Err(ErpError::NotConfigured(reason.clone())),
            ConnectionState::Untried => {}
        }

        match self.connector.connect().await {
            Ok(session) => {
                *state = ConnectionState::Connected(session.clone());
                Ok(session)
            }
            Err(e) => {
                let reason = match e {
                    ErpError::NotConfigured(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!(reason = %reason, "ERP unavailable, sync disabled until reconnect");
                *state = ConnectionState::Failed(reason.clone());
                Err(ErpError::NotConfigured(reason))
            }
        }
    }

    /// Whether a session is (or can be) established.
    pub async fn is_available(&self) -> bool {
        self.session().await.is_ok()
    }

    /// Forget any previous connection outcome and connect again.
    pub async fn reconnect(&self) -> Result<(), ErpError> {
        *self.state.lock().await = ConnectionState::Untried;
        self.session().await.map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Raw calls
    // -----------------------------------------------------------------------

    /// Run `model.method` with pacing and retry.
    ///
    /// Rate-limit responses back off 60 s, then 120 s; the third one yields
    /// [`ErpError::RateLimitExhausted`]. Other failures back off 1 s, then
    /// 2 s, and the last error is returned as is.
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, ErpError> {
        let session = self.session().await?;
        let mut attempt = 0;

        loop {
            self.throttle.wait().await;
            let err = match session
                .execute_kw(model, method, args.clone(), kwargs.clone())
                .await
            {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let rate_limited = err.is_rate_limit();
            match self.retry.next_delay(attempt, rate_limited) {
                Some(delay) => {
                    tracing::warn!(
                        model,
                        method,
                        attempt = attempt + 1,
                        rate_limited,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "ERP call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None if rate_limited => {
                    tracing::error!(model, method, "ERP rate limit persisted through all retries");
                    return Err(ErpError::RateLimitExhausted {
                        attempts: attempt + 1,
                    });
                }
                None => {
                    tracing::error!(model, method, error = %err, "ERP call failed after all retries");
                    return Err(err);
                }
            }
        }
    }

    async fn read(&self, model: &str, id: DbId, fields: &[&str]) -> Result<Value, ErpError> {
        self.call(model, "read", json!([[id]]), json!({ "fields": fields }))
            .await
    }

    async fn read_many(&self, model: &str, ids: &[DbId], fields: &[&str]) -> Result<Value, ErpError> {
        self.call(model, "read", json!([ids]), json!({ "fields": fields }))
            .await
    }

    async fn cached_read(
        &self,
        key: String,
        model: &str,
        id: DbId,
        fields: &[&str],
    ) -> Result<Value, ErpError> {
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(key = %key, "ERP cache hit");
            return Ok(hit);
        }
        let value = self.read(model, id, fields).await?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Partners
    // -----------------------------------------------------------------------

    pub async fn create_partner(&self, values: &PartnerValues) -> Result<DbId, ErpError> {
        let id = decode_id(self.call(PARTNER_MODEL, "create", json!([values]), json!({})).await?)?;
        tracing::info!(partner_id = id, "Created ERP partner");
        Ok(id)
    }

    /// Writes name, email, and phone.
    pub async fn update_partner(&self, partner_id: DbId, values: &PartnerValues) -> Result<(), ErpError> {
        self.call(
            PARTNER_MODEL,
            "write",
            json!([[partner_id], values.for_update()]),
            json!({}),
        )
        .await?;
        self.cache.invalidate(&partner_key(partner_id));
        Ok(())
    }

    pub async fn delete_partner(&self, partner_id: DbId) -> Result<(), ErpError> {
        self.call(PARTNER_MODEL, "unlink", json!([[partner_id]]), json!({}))
            .await?;
        self.cache.invalidate(&partner_key(partner_id));
        tracing::info!(partner_id, "Deleted ERP partner");
        Ok(())
    }

    pub async fn get_partner(&self, partner_id: DbId) -> Result<Option<PartnerRecord>, ErpError> {
        let value = self
            .cached_read(partner_key(partner_id), PARTNER_MODEL, partner_id, PARTNER_READ_FIELDS)
            .await?;
        decode_first(value)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn create_project(&self, values: &ProjectValues) -> Result<DbId, ErpError> {
        let id = decode_id(self.call(PROJECT_MODEL, "create", json!([values]), json!({})).await?)?;
        tracing::info!(erp_project_id = id, "Created ERP project");
        Ok(id)
    }

    /// Writes name and description.
    pub async fn update_project(&self, erp_project_id: DbId, values: &ProjectValues) -> Result<(), ErpError> {
        self.call(
            PROJECT_MODEL,
            "write",
            json!([[erp_project_id], values.for_update()]),
            json!({}),
        )
        .await?;
        self.cache.invalidate(&project_key(erp_project_id));
        Ok(())
    }

    pub async fn get_project(&self, erp_project_id: DbId) -> Result<Option<ProjectRecord>, ErpError> {
        let value = self
            .cached_read(
                project_key(erp_project_id),
                PROJECT_MODEL,
                erp_project_id,
                PROJECT_READ_FIELDS,
            )
            .await?;
        decode_first(value)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub async fn create_task(&self, values: &TaskValues) -> Result<DbId, ErpError> {
        let id = decode_id(self.call(TASK_MODEL, "create", json!([values]), json!({})).await?)?;
        tracing::info!(erp_task_id = id, "Created ERP task");
        Ok(id)
    }

    /// Create several tasks in one call. Returned ids are in input order.
    pub async fn batch_create_tasks(&self, values: &[TaskValues]) -> Result<Vec<DbId>, ErpError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let ids = decode_ids(self.call(TASK_MODEL, "create", json!([values]), json!({})).await?)?;
        if ids.len() != values.len() {
            return Err(ErpError::Decode(format!(
                "batch create returned {} ids for {} tasks",
                ids.len(),
                values.len()
            )));
        }
        tracing::info!(count = ids.len(), "Batch created ERP tasks");
        Ok(ids)
    }

    /// Partner ids of an ERP task's assignees and its project's manager.
    /// `None` when the task does not exist remotely.
    pub async fn task_recipients(&self, erp_task_id: DbId) -> Result<Option<TaskRecipients>, ErpError> {
        let task = self.read(TASK_MODEL, erp_task_id, &["user_ids", "project_id"]).await?;
        let Some(task) = task.as_array().and_then(|rows| rows.first()) else {
            return Ok(None);
        };

        let assignee_users = many2many_ids(&task["user_ids"]);
        let manager_user = match many2one_id(&task["project_id"]) {
            Some(project_id) => {
                let project = self.read(PROJECT_MODEL, project_id, &["user_id"]).await?;
                project
                    .as_array()
                    .and_then(|rows| rows.first())
                    .and_then(|row| many2one_id(&row["user_id"]))
            }
            None => None,
        };

        let mut users = assignee_users.clone();
        users.extend(manager_user);
        users.sort_unstable();
        users.dedup();
        if users.is_empty() {
            return Ok(Some(TaskRecipients::default()));
        }

        let rows = self.read_many(USER_MODEL, &users, &["partner_id"]).await?;
        let partner_of = |user_id: DbId| {
            rows.as_array()?
                .iter()
                .find(|row| row["id"].as_i64() == Some(user_id))
                .and_then(|row| many2one_id(&row["partner_id"]))
        };

        Ok(Some(TaskRecipients {
            assignee_partner_ids: assignee_users.iter().filter_map(|&u| partner_of(u)).collect(),
            manager_partner_id: manager_user.and_then(partner_of),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
