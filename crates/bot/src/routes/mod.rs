//! Route handlers for the relay HTTP API.

pub mod health;
pub mod qr;
pub mod send;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/qr", get(qr::qr_page))
        // Health check
        .route("/health", get(health::health))
        // API endpoints
        .route("/send-message", post(send::send_message))
        .route("/send-media", post(send::send_media))
        .route("/webhook", post(webhook::webhook))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use database::{message_log, Database, ResponseSource};
    use message_listener::{Pipeline, PipelineConfig, RecordingSender, SessionContext};
    use mock_brain::EchoBrain;
    use serde_json::{json, Value};
    use session_store::{DatabaseSessionStore, RemoteAuth};
    use tower::ServiceExt;

    use super::*;

    struct TestApp {
        db: Database,
        sender: Arc<RecordingSender>,
        state: AppState,
    }

    async fn test_app() -> TestApp {
        let db = Database::in_memory().await.unwrap();
        let sender = Arc::new(RecordingSender::new());
        let pipeline = Arc::new(Pipeline::new(
            db.clone(),
            Arc::new(EchoBrain::new()),
            sender.clone(),
            Arc::new(SessionContext::new()),
            PipelineConfig::default(),
        ));
        let store = Arc::new(DatabaseSessionStore::new(db.clone()));
        let auth = Arc::new(RemoteAuth::new("tienda-centro", store).unwrap());

        TestApp {
            db,
            sender,
            state: AppState::new(pipeline, auth),
        }
    }

    async fn call(app: &TestApp, request: Request<Body>) -> (StatusCode, String) {
        let response = router()
            .with_state(app.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_connection_state() {
        let app = test_app().await;
        let (status, body) = call(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connection"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_send_message() {
        let app = test_app().await;
        let (status, body) = call(
            &app,
            post_json("/send-message", json!({"to": "+52 1 55 1234 5678", "body": "Tu pedido va en camino"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "enviado");

        let sent = app.sender.sent_to("5215512345678").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "Tu pedido va en camino");

        let log = message_log::recent_messages(app.db.pool(), "5215512345678", 1, 10)
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].response_source, Some(ResponseSource::Automation));
    }

    #[tokio::test]
    async fn test_send_message_rejects_bad_input() {
        let app = test_app().await;

        let (status, _) = call(&app, post_json("/send-message", json!({"to": "5215512345678"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            post_json("/send-message", json!({"to": "no-es-numero", "body": "hola"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("error"));
        assert!(app.sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_500() {
        let app = test_app().await;
        app.sender.set_failing(true);

        let (status, body) = call(
            &app,
            post_json("/send-message", json!({"to": "5215512345678", "body": "hola"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_send_media() {
        let app = test_app().await;

        let (status, _) = call(
            &app,
            post_json("/send-media", json!({"to": "5215512345678", "caption": "Menú"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            post_json(
                "/send-media",
                json!({"to": "5215512345678", "image": {"link": "https://cdn.example.com/menu.jpg"}, "caption": "Menú"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], true);

        let sent = app.sender.sent_to("5215512345678").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].media_url.as_deref(), Some("https://cdn.example.com/menu.jpg"));
        assert_eq!(sent[0].text, "Menú");
    }

    #[tokio::test]
    async fn test_qr_page() {
        let app = test_app().await;

        let (status, body) = call(&app, get("/qr")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Esperando"));
        assert!(!body.contains("<svg"));

        app.state
            .pipeline
            .context()
            .set_qr(Some("2@AbCdEf0123456789".to_string()))
            .await;
        let (status, body) = call(&app, get("/qr")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<svg"));
    }

    #[tokio::test]
    async fn test_webhook_ack() {
        let app = test_app().await;
        let (status, _) = call(&app, post_json("/webhook", json!({"event": "ping"}))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
