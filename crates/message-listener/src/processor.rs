//! Event loop that connects the bridge to the delivery pipeline.

use std::sync::Arc;

use futures::StreamExt;
use session_store::{AuthState, AuthStrategy, RemoteAuth, SessionStore};
use tracing::{debug, error, info, warn};
use wa_bridge::{
    bare_number, BridgeClient, BridgeEvent, ConnectionState, ConnectionUpdate, CredsUpdate,
    EventStream, ReconnectConfig, UpsertBatch,
};

use crate::error::ProcessorError;
use crate::pipeline::{Pipeline, ProcessResult};

/// Receives bridge events and dispatches them to the pipeline and the auth
/// strategy.
pub struct MessageProcessor<S: SessionStore> {
    client: BridgeClient,
    pipeline: Arc<Pipeline>,
    auth: Arc<RemoteAuth<S>>,
    reconnect: ReconnectConfig,
}

impl<S: SessionStore + 'static> MessageProcessor<S> {
    /// Create a new message processor.
    pub fn new(client: BridgeClient, pipeline: Arc<Pipeline>, auth: Arc<RemoteAuth<S>>) -> Self {
        Self {
            client,
            pipeline,
            auth,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Use a custom resubscription backoff.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn auth(&self) -> &Arc<RemoteAuth<S>> {
        &self.auth
    }

    pub fn client(&self) -> &BridgeClient {
        &self.client
    }

    /// Handle one bridge event. Message batches yield one result per message.
    pub async fn handle_event(&self, event: BridgeEvent) -> Vec<ProcessResult> {
        match event {
            BridgeEvent::Messages(batch) => self.handle_messages(batch).await,
            BridgeEvent::Connection(update) => {
                self.handle_connection(update).await;
                Vec::new()
            }
            BridgeEvent::Creds(update) => {
                self.handle_creds(update).await;
                Vec::new()
            }
        }
    }

    async fn handle_messages(&self, batch: UpsertBatch) -> Vec<ProcessResult> {
        if !batch.is_notify() {
            debug!(kind = %batch.kind, count = batch.messages.len(), "Ignoring non-live batch");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(batch.messages.len());
        for message in &batch.messages {
            let result = self.pipeline.process_message(message).await;
            match &result {
                ProcessResult::Responded {
                    recipient,
                    response,
                    source,
                } => {
                    debug!(?source, "Responded to {}: {}", recipient, response);
                }
                ProcessResult::HandoffRequested { client } => {
                    info!(client = %client, "Conversation handed to an operator");
                }
                ProcessResult::ManualReplyRecorded { client } => {
                    debug!(client = %client, "Operator reply recorded");
                }
                ProcessResult::Skipped { reason } => {
                    debug!("Skipped: {}", reason);
                }
                ProcessResult::Error(e) => {
                    warn!(message_id = %message.key.id, "Error processing message: {}", e);
                }
            }
            results.push(result);
        }
        results
    }

    async fn handle_connection(&self, update: ConnectionUpdate) {
        let context = self.pipeline.context();

        if update.is_logged_out() {
            warn!(client_id = %self.auth.client_id(), "Device logged out, removing stored session");
            if let Err(e) = self.auth.on_logout().await {
                error!("Failed to remove session after logout: {}", e);
            }
            context.set_qr(None).await;
            context.set_own_number(None).await;

            if let Err(e) = self.client.restart().await {
                warn!("Failed to ask the bridge for a fresh login: {}", e);
            }
            self.auth.restart().await;
            return;
        }

        if let Some(qr) = update.qr {
            info!("New login QR received");
            context.set_qr(Some(qr)).await;
            self.enter_authenticating().await;
        }

        match update.connection {
            Some(ConnectionState::Connecting) => self.enter_authenticating().await,
            Some(ConnectionState::Open) => {
                context.set_qr(None).await;
                if let Err(e) = self.auth.on_connection_open().await {
                    warn!("Unexpected open event: {}", e);
                }
                match self.client.me().await {
                    Ok(account) => {
                        let number = bare_number(&account.id).to_string();
                        info!(number = %number, "Connected to WhatsApp");
                        context.set_own_number(Some(number)).await;
                    }
                    Err(e) => warn!("Failed to fetch own account info: {}", e),
                }
            }
            Some(ConnectionState::Close) => {
                let status = update.last_disconnect.as_ref().and_then(|d| d.status_code);
                warn!(?status, "WhatsApp connection closed, waiting for the bridge to reconnect");
                if let Err(e) = self.auth.on_disconnected().await {
                    debug!("Ignoring close event: {}", e);
                }
            }
            None => {}
        }
    }

    async fn enter_authenticating(&self) {
        match self.auth.state().await {
            AuthState::Unauthenticated | AuthState::Disconnected | AuthState::Authenticating => {
                if let Err(e) = self.auth.on_connecting().await {
                    warn!("Failed to enter authenticating state: {}", e);
                }
            }
            state => debug!(%state, "Connecting event while {}", state),
        }
    }

    async fn handle_creds(&self, update: CredsUpdate) {
        let blob = match serde_json::to_vec(&update.creds) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to serialize credentials: {}", e);
                return;
            }
        };

        if let Err(e) = self.auth.on_authenticated(blob).await {
            error!(client_id = %self.auth.client_id(), "Failed to persist credentials: {}", e);
        }
    }

    /// Open the event stream, retrying with backoff.
    async fn subscribe_with_backoff(&self) -> Result<EventStream, ProcessorError> {
        let mut attempt = 0;
        loop {
            match wa_bridge::subscribe(&self.client) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    if !self.reconnect.should_retry(attempt) {
                        error!("Giving up on event stream after {} attempts: {}", attempt, e);
                        return Err(ProcessorError::Bridge(e));
                    }
                    let delay = self.reconnect.delay_for_attempt(attempt);
                    warn!("Failed to subscribe ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the processor with graceful shutdown support.
    ///
    /// This method runs until either:
    /// - The provided shutdown signal completes
    /// - The event stream keeps failing past the reconnect policy
    ///
    /// Stream errors and disconnects resubscribe with exponential backoff.
    /// On shutdown the brain's `shutdown` hook is called.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let processor = MessageProcessor::new(client, pipeline, auth);
    /// processor.run_with_shutdown(async {
    ///     let _ = tokio::signal::ctrl_c().await;
    /// }).await?;
    /// ```
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), ProcessorError>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting message processor with brain: {} (graceful shutdown enabled)",
            self.pipeline.brain().name()
        );

        let mut stream = self.subscribe_with_backoff().await?;
        let mut failures: u32 = 0;

        tokio::pin!(shutdown_signal);

        loop {
            let interrupted = tokio::select! {
                biased;

                () = &mut shutdown_signal => break,

                next = stream.next() => match next {
                    Some(Ok(event)) => {
                        failures = 0;
                        self.handle_event(event).await;
                        None
                    }
                    Some(Err(e)) => Some(e.to_string()),
                    None => Some("stream ended".to_string()),
                },
            };

            let Some(reason) = interrupted else {
                continue;
            };

            stream.close();
            if !self.reconnect.should_retry(failures) {
                error!("Event stream lost after {} resubscriptions: {}", failures, reason);
                return Err(ProcessorError::StreamEnded);
            }

            let delay = self.reconnect.delay_for_attempt(failures);
            warn!("Event stream interrupted ({}), resubscribing in {:?}", reason, delay);
            failures += 1;

            tokio::select! {
                biased;
                () = &mut shutdown_signal => break,
                () = tokio::time::sleep(delay) => {}
            }
            stream = self.subscribe_with_backoff().await?;
        }

        info!("Shutdown signal received, stopping message processor");
        stream.close();
        if let Err(e) = self.pipeline.brain().shutdown().await {
            warn!("Error during brain shutdown: {}", e);
        }
        Ok(())
    }

    /// Run the processor until Ctrl+C is pressed.
    #[cfg(feature = "signal")]
    pub async fn run_until_stopped(self) -> Result<(), ProcessorError> {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_with_shutdown(shutdown).await
    }
}
