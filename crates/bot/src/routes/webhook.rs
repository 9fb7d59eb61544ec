//! Inbound webhook acknowledgement.

use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::debug;

/// Accept a callback from the automation platform.
pub async fn webhook(Json(payload): Json<Value>) -> StatusCode {
    debug!(%payload, "Webhook received");
    StatusCode::OK
}
