//! Outbound sends requested by the automation backend.

use axum::extract::State;
use axum::Json;
use database::validation::normalize_phone;
use database::ResponseSource;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Request to send a text message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub status: String,
}

/// Request to send an image by URL.
#[derive(Debug, Deserialize)]
pub struct SendMediaRequest {
    #[serde(default)]
    pub to: String,
    pub image: Option<ImageLink>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageLink {
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMediaResponse {
    pub success: bool,
    pub message: String,
}

/// Send a text message and log it as an automation reply.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Faltan parámetros: to o body".to_string()));
    }
    let to = normalize_phone(&req.to).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .pipeline
        .send_and_log(&to, &to, &req.body, ResponseSource::Automation)
        .await
        .map_err(|e| ApiError::Send(e.to_string()))?;

    info!(to = %to, "Message sent through the API");
    Ok(Json(SendMessageResponse {
        status: "enviado".to_string(),
    }))
}

/// Send an image by URL with an optional caption.
pub async fn send_media(
    State(state): State<AppState>,
    Json(req): Json<SendMediaRequest>,
) -> Result<Json<SendMediaResponse>> {
    let link = req
        .image
        .and_then(|image| image.link)
        .filter(|link| !link.trim().is_empty());
    let (Some(link), false) = (link, req.to.trim().is_empty()) else {
        return Err(ApiError::BadRequest(
            "Faltan parámetros: to o image.link".to_string(),
        ));
    };
    let to = normalize_phone(&req.to).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .pipeline
        .send_media(&to, &link, req.caption.as_deref())
        .await
        .map_err(|e| ApiError::Send(format!("Error enviando la imagen: {}", e)))?;

    info!(to = %to, "Image sent through the API");
    Ok(Json(SendMediaResponse {
        success: true,
        message: "Imagen enviada correctamente".to_string(),
    }))
}
