//! Bridge daemon HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::types::{
    to_jid, AccountInfo, ErrorBody, RestoreSessionRequest, SendMediaRequest, SendResult,
    SendTextRequest,
};

/// Client for the bridge daemon REST API.
#[derive(Clone)]
pub struct BridgeClient {
    http: Client,
    config: BridgeConfig,
    connected: Arc<AtomicBool>,
}

impl BridgeClient {
    /// Build a client without contacting the bridge.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build a client and verify the bridge answers its health check.
    pub async fn connect(config: BridgeConfig) -> Result<Self, BridgeError> {
        let client = Self::new(config)?;

        if !client.health_check().await? {
            return Err(BridgeError::HealthCheckFailed);
        }

        info!("Connected to bridge at {}", client.config.base_url);
        Ok(client)
    }

    /// Whether the last health check succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Perform a health check against the bridge.
    pub async fn health_check(&self) -> Result<bool, BridgeError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(BridgeError::Http(e))
            }
        }
    }

    /// Account the bridge is logged in as.
    pub async fn me(&self) -> Result<AccountInfo, BridgeError> {
        self.execute(self.http.get(self.config.me_url())).await
    }

    /// Send a text message to a number or jid.
    pub async fn send_text(&self, recipient: &str, text: &str) -> Result<SendResult, BridgeError> {
        let body = SendTextRequest {
            jid: to_jid(recipient),
            text: text.to_string(),
        };
        debug!("Sending text to {}", body.jid);

        self.execute(self.http.post(self.config.send_url()).json(&body))
            .await
            .map_err(send_failed)
    }

    /// Send an image by URL with an optional caption.
    pub async fn send_media(
        &self,
        recipient: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<SendResult, BridgeError> {
        let body = SendMediaRequest {
            jid: to_jid(recipient),
            url: url.to_string(),
            caption: caption.map(str::to_string),
        };
        debug!("Sending media to {}", body.jid);

        self.execute(self.http.post(self.config.send_media_url()).json(&body))
            .await
            .map_err(send_failed)
    }

    /// Hand stored credentials to the bridge so it can resume without a QR.
    pub async fn restore_session(&self, creds: &Value) -> Result<(), BridgeError> {
        let body = RestoreSessionRequest { creds };
        let _: Value = self
            .execute(self.http.put(self.config.session_url()).json(&body))
            .await?;
        Ok(())
    }

    /// Reconnect the bridge; without a session it issues a fresh login QR.
    pub async fn restart(&self) -> Result<(), BridgeError> {
        let _: Value = self
            .execute(self.http.post(self.config.restart_url()))
            .await?;
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Send a request and decode a JSON body, mapping error statuses.
    ///
    /// Empty success bodies decode as `null`.
    async fn execute<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, BridgeError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(BridgeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

fn send_failed(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Api { status, message } => {
            BridgeError::SendFailed(format!("HTTP {}: {}", status, message))
        }
        other => other,
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
