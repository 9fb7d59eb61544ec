//! WhatsApp business-automation relay.
//!
//! Listens to the bridge daemon, answers customers through the configured
//! backend and serves the HTTP API (send, QR login page, health).

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use brain_core::Brain;
use database::Database;
use llm_brain::LlmBrain;
use message_listener::{MessageProcessor, Pipeline, PipelineConfig, SessionContext, SWEEP_INTERVAL};
use mock_brain::EchoBrain;
use session_store::{AuthStrategy, DatabaseSessionStore, RemoteAuth, BACKUP_SYNC_INTERVAL};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wa_bridge::{BridgeClient, BridgeConfig};
use webhook_brain::{WebhookBrain, WebhookBrainConfig};

use crate::config::{Backend, Config};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, backend = ?config.backend, "Starting WhatsApp relay");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let brain = build_brain(&config)?;
    info!(brain = brain.name(), "Backend ready");

    // Bridge client
    let bridge_config = match &config.bridge_session {
        Some(session) => BridgeConfig::with_session(&config.bridge_url, session),
        None => BridgeConfig::new(&config.bridge_url),
    };
    let client = BridgeClient::new(bridge_config)?;
    match client.health_check().await {
        Ok(true) => info!(url = %config.bridge_url, "Bridge reachable"),
        Ok(false) => warn!(url = %config.bridge_url, "Bridge health check failed, will keep retrying"),
        Err(e) => warn!(url = %config.bridge_url, "Bridge unreachable ({}), will keep retrying", e),
    }

    // Session persistence
    let store = Arc::new(DatabaseSessionStore::new(db.clone()));
    let auth = Arc::new(RemoteAuth::new(config.client_id.clone(), store)?);
    restore_session(auth.as_ref(), &client).await;

    // Delivery pipeline
    let mut pipeline_config = PipelineConfig::default()
        .with_tenant_id(config.tenant_id)
        .with_brain_timeout(config.backend_timeout)
        .with_history_limit(config.history_limit);
    if let Some(operator) = &config.operator_number {
        pipeline_config = pipeline_config.with_operator_number(operator.clone());
    }
    let pipeline = Arc::new(Pipeline::new(
        db.clone(),
        brain,
        Arc::new(client.clone()),
        Arc::new(SessionContext::new()),
        pipeline_config,
    ));

    // Background tasks
    let backup_task = auth.spawn_backup_sync(BACKUP_SYNC_INTERVAL);
    let sweep_task = pipeline.spawn_handoff_sweep(SWEEP_INTERVAL);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor = MessageProcessor::new(client, Arc::clone(&pipeline), Arc::clone(&auth));
    let processor_task = tokio::spawn(async move {
        let mut shutdown_rx = shutdown_rx;
        let shutdown = async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };
        if let Err(e) = processor.run_with_shutdown(shutdown).await {
            error!("Message processor stopped: {}", e);
        }
    });

    // HTTP API
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(pipeline, auth));

    info!(addr = %config.addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let trigger = await_shutdown_trigger().await;
            info!("Shutdown requested ({})", trigger);
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = processor_task.await {
        error!("Message processor task failed: {}", e);
    }
    backup_task.abort();
    sweep_task.abort();
    db.close().await;

    info!("Graceful shutdown complete");
    Ok(())
}

/// Build the backend selected by `BACKEND`.
fn build_brain(config: &Config) -> Result<Arc<dyn Brain>, brain_core::BrainError> {
    Ok(match config.backend {
        Backend::Webhook => {
            let url = config.webhook_url.clone().unwrap_or_default();
            let webhook = WebhookBrainConfig::new(url).with_timeout(config.backend_timeout);
            Arc::new(WebhookBrain::new(webhook)?)
        }
        Backend::Llm => Arc::new(LlmBrain::from_env()?),
        Backend::Echo => Arc::new(EchoBrain::new()),
    })
}

/// Hand stored credentials to the bridge. Failures fall back to a QR login.
async fn restore_session(auth: &RemoteAuth<DatabaseSessionStore>, client: &BridgeClient) {
    if let Err(e) = auth.before_init().await {
        warn!("Could not check for a stored session: {}", e);
    }

    let blob = match auth.get_auth().await {
        Ok(Some(blob)) => blob,
        Ok(None) => return,
        Err(e) => {
            warn!("Failed to load stored session, falling back to QR login: {}", e);
            return;
        }
    };

    let creds = match serde_json::from_slice::<serde_json::Value>(&blob) {
        Ok(creds) => creds,
        Err(e) => {
            warn!("Stored session is not valid JSON, falling back to QR login: {}", e);
            return;
        }
    };

    match client.restore_session(&creds).await {
        Ok(()) => info!(client_id = %auth.client_id(), "Stored session handed to the bridge"),
        Err(e) => warn!("Bridge rejected the stored session, falling back to QR login: {}", e),
    }
}

/// Wait for either Ctrl+C or SIGTERM (Unix only) and return a label for logging.
#[cfg(unix)]
async fn await_shutdown_trigger() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "ctrl-c",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}; falling back to Ctrl+C only", e);
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn await_shutdown_trigger() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    "ctrl-c"
}
