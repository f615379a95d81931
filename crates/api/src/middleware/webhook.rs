//! Shared-secret authentication for inbound ERP webhooks.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use harmony_core::error::CoreError;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried `Authorization: Bearer <ERP_WEBHOOK_SECRET>`.
///
/// Rejects with 401 when the header is missing or wrong, and when no secret
/// is configured at all.
#[derive(Debug, Clone, Copy)]
pub struct ErpWebhookAuth;

impl FromRequestParts<AppState> for ErpWebhookAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match state.config.erp_webhook_secret.as_deref() {
            None => {
                tracing::warn!("ERP webhook called but ERP_WEBHOOK_SECRET is not configured");
            }
            Some(expected) if secret_matches(presented, expected) => return Ok(ErpWebhookAuth),
            Some(_) => {
                tracing::warn!("Unauthorized ERP webhook call");
            }
        }

        Err(AppError::Core(CoreError::Unauthorized("Unauthorized".into())))
    }
}

/// Constant-time comparison of the presented token against the secret.
pub fn secret_matches(presented: Option<&str>, expected: &str) -> bool {
    match presented {
        Some(token) => token.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}
