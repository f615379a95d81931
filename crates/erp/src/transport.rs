//! JSON-RPC transport to the ERP.
//!
//! Authentication goes through the `common.login` service; every model call
//! afterwards is `object.execute_kw(db, uid, password, model, method, args,
//! kwargs)` posted to `<url>/jsonrpc`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ErpConfig;
use crate::error::ErpError;
use crate::gateway::{ErpConnector, ErpSession};

/// HTTP request timeout for a single RPC.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens authenticated JSON-RPC sessions from an [`ErpConfig`].
pub struct JsonRpcConnector {
    config: ErpConfig,
    client: reqwest::Client,
}

impl JsonRpcConnector {
    pub fn new(config: ErpConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl ErpConnector for JsonRpcConnector {
    async fn connect(&self) -> Result<Arc<dyn ErpSession>, ErpError> {
        let creds = self.config.credentials()?;
        let endpoint = format!("{}/jsonrpc", creds.url.trim_end_matches('/'));

        let result = post_rpc(
            &self.client,
            &endpoint,
            "common",
            "login",
            json!([creds.db, creds.username, creds.password]),
        )
        .await?;

        let uid = result.as_i64().ok_or_else(|| {
            ErpError::NotConfigured(format!(
                "ERP authentication failed for user '{}'",
                creds.username
            ))
        })?;

        tracing::info!(url = creds.url, db = creds.db, uid, "Connected to ERP");

        Ok(Arc::new(JsonRpcSession {
            client: self.client.clone(),
            endpoint,
            db: creds.db.to_string(),
            uid,
            password: creds.password.to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated session.
pub struct JsonRpcSession {
    client: reqwest::Client,
    endpoint: String,
    db: String,
    uid: i64,
    password: String,
}

#[async_trait]
impl ErpSession for JsonRpcSession {
    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, ErpError> {
        post_rpc(
            &self.client,
            &self.endpoint,
            "object",
            "execute_kw",
            json!([self.db, self.uid, self.password, model, method, args, kwargs]),
        )
        .await
    }
}

/// Post one JSON-RPC `call` and unwrap its result.
async fn post_rpc(
    client: &reqwest::Client,
    endpoint: &str,
    service: &str,
    method: &str,
    args: Value,
) -> Result<Value, ErpError> {
    let body = json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": { "service": service, "method": method, "args": args },
    });

    let response = client.post(endpoint).json(&body).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ErpError::Transport(format!("HTTP {status}")));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| ErpError::Decode(e.to_string()))?;
    parse_rpc_response(payload)
}

/// Extract `result`, or turn `error` into [`ErpError::Remote`].
pub fn parse_rpc_response(mut payload: Value) -> Result<Value, ErpError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .pointer("/data/message")
            .and_then(Value::as_str)
            .or_else(|| error.get("message").and_then(Value::as_str))
            .unwrap_or("unknown error");
        return Err(ErpError::Remote(message.to_string()));
    }
    match payload.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ErpError::Decode("response carries neither result nor error".into())),
    }
}
