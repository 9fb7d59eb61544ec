//! Login QR page.

use askama::Template;
use axum::extract::State;
use qrcode::render::svg;
use qrcode::QrCode;
use session_store::AuthState;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// QR page template.
#[derive(Template)]
#[template(path = "qr.html")]
pub struct QrTemplate {
    /// Rendered QR, when the bridge is waiting for a scan.
    pub svg: Option<String>,
    pub connected: bool,
    pub connection: String,
}

/// Render the current login QR, or the connection status when there is none.
pub async fn qr_page(State(state): State<AppState>) -> Result<QrTemplate> {
    let auth_state = state.auth.state().await;
    let svg = match state.pipeline.context().qr().await {
        Some(payload) => Some(render_svg(&payload)?),
        None => None,
    };

    Ok(QrTemplate {
        svg,
        connected: auth_state == AuthState::Ready,
        connection: auth_state.to_string(),
    })
}

fn render_svg(payload: &str) -> Result<String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build())
}
