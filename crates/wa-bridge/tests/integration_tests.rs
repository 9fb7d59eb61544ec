//! Integration tests for wa-bridge.
//!
//! Most tests only exercise configuration and wire types. Tests marked
//! `#[ignore]` need a running bridge at `BRIDGE_URL`:
//!   cargo test --test integration_tests -- --ignored

use std::time::Duration;

use wa_bridge::{
    BridgeClient, BridgeConfig, BridgeError, BridgeEvent, ConnectionState, ReconnectConfig,
};

mod config_tests {
    use super::*;

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.session.is_none());
    }

    #[test]
    fn test_bridge_config_trims_trailing_slash() {
        let config = BridgeConfig::new("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_bridge_config_urls() {
        let config = BridgeConfig::new("http://localhost:8080");
        assert_eq!(config.check_url(), "http://localhost:8080/api/v1/check");
        assert_eq!(config.me_url(), "http://localhost:8080/api/v1/me");
        assert_eq!(config.send_url(), "http://localhost:8080/api/v1/send");
        assert_eq!(config.send_media_url(), "http://localhost:8080/api/v1/send-media");
        assert_eq!(config.session_url(), "http://localhost:8080/api/v1/session");
        assert_eq!(config.restart_url(), "http://localhost:8080/api/v1/restart");
        assert_eq!(config.events_url(), "http://localhost:8080/api/v1/events");
    }

    #[test]
    fn test_bridge_config_urls_with_session() {
        let config = BridgeConfig::with_session("http://localhost:8080", "tienda centro");
        assert_eq!(
            config.events_url(),
            "http://localhost:8080/api/v1/events?session=tienda%20centro"
        );
        // Health check is global to the bridge
        assert_eq!(config.check_url(), "http://localhost:8080/api/v1/check");
    }
}

mod event_tests {
    use super::*;

    #[test]
    fn test_parse_messages_upsert() {
        let data = r#"{
            "type": "notify",
            "messages": [{
                "key": {"remoteJid": "5215512345678@s.whatsapp.net", "fromMe": false, "id": "3EB0C767D097"},
                "message": {"conversation": "Hola, quiero una pizza"},
                "messageTimestamp": 1700000000,
                "pushName": "Ana"
            }]
        }"#;

        let event = BridgeEvent::parse("messages.upsert", data).unwrap().unwrap();
        let BridgeEvent::Messages(batch) = event else {
            panic!("expected messages event");
        };
        assert!(batch.is_notify());
        assert_eq!(batch.messages.len(), 1);

        let msg = &batch.messages[0];
        assert_eq!(msg.key.id, "3EB0C767D097");
        assert!(!msg.key.from_me);
        assert_eq!(
            msg.message.as_ref().unwrap().conversation.as_deref(),
            Some("Hola, quiero una pizza")
        );
        assert_eq!(msg.push_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_parse_history_append_batch() {
        let event = BridgeEvent::parse("messages.upsert", r#"{"type": "append", "messages": []}"#)
            .unwrap()
            .unwrap();
        let BridgeEvent::Messages(batch) = event else {
            panic!("expected messages event");
        };
        assert!(!batch.is_notify());
    }

    #[test]
    fn test_parse_view_once_image() {
        let data = r#"{
            "type": "notify",
            "messages": [{
                "key": {"remoteJid": "5215512345678@s.whatsapp.net", "fromMe": false, "id": "V1"},
                "message": {"viewOnceMessage": {"message": {"imageMessage": {"caption": "hello", "mimetype": "image/jpeg"}}}}
            }]
        }"#;

        let Some(BridgeEvent::Messages(batch)) = BridgeEvent::parse("messages.upsert", data).unwrap()
        else {
            panic!("expected messages event");
        };
        let content = batch.messages[0].message.as_ref().unwrap();
        assert_eq!(content.primary_key(), Some("viewOnceMessage"));

        let inner = content
            .view_once_message
            .as_ref()
            .and_then(|w| w.message.as_ref())
            .unwrap();
        assert_eq!(
            inner.image_message.as_ref().unwrap().caption.as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_parse_connection_update_with_qr() {
        let event = BridgeEvent::parse("connection.update", r#"{"qr": "2@abc,def,ghi"}"#)
            .unwrap()
            .unwrap();
        let BridgeEvent::Connection(update) = event else {
            panic!("expected connection event");
        };
        assert_eq!(update.qr.as_deref(), Some("2@abc,def,ghi"));
        assert!(update.connection.is_none());
        assert!(!update.is_logged_out());
    }

    #[test]
    fn test_parse_connection_logged_out() {
        let data = r#"{"connection": "close", "lastDisconnect": {"statusCode": 401}}"#;
        let Some(BridgeEvent::Connection(update)) =
            BridgeEvent::parse("connection.update", data).unwrap()
        else {
            panic!("expected connection event");
        };
        assert_eq!(update.connection, Some(ConnectionState::Close));
        assert!(update.is_logged_out());

        let data = r#"{"connection": "close", "lastDisconnect": {"statusCode": 428}}"#;
        let Some(BridgeEvent::Connection(update)) =
            BridgeEvent::parse("connection.update", data).unwrap()
        else {
            panic!("expected connection event");
        };
        assert!(!update.is_logged_out());
    }

    #[test]
    fn test_parse_creds_update() {
        let data = r#"{"creds": {"me": {"id": "5215500000000:1@s.whatsapp.net"}, "registered": true}}"#;
        let Some(BridgeEvent::Creds(update)) = BridgeEvent::parse("creds.update", data).unwrap()
        else {
            panic!("expected creds event");
        };
        assert_eq!(update.creds["registered"], true);
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        assert!(BridgeEvent::parse("presence.update", "{}").unwrap().is_none());
    }

    #[test]
    fn test_malformed_event_is_error() {
        assert!(BridgeEvent::parse("connection.update", "not json").is_err());
    }
}

mod reconnect_config_tests {
    use super::*;

    #[test]
    fn test_reconnect_config_default() {
        let config = ReconnectConfig::default();
        assert!(config.max_retries.is_none());
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn test_should_retry_with_limit() {
        let config = ReconnectConfig {
            max_retries: Some(3),
            ..Default::default()
        };
        assert!(config.should_retry(0));
        assert!(config.should_retry(2));
        assert!(!config.should_retry(3));
        assert!(ReconnectConfig::default().should_retry(1000));
    }
}

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let result = BridgeClient::connect(BridgeConfig::new("http://127.0.0.1:1")).await;
        assert!(matches!(result, Err(BridgeError::Http(_))));
    }

    #[tokio::test]
    async fn test_new_does_not_contact_bridge() {
        let client = BridgeClient::new(BridgeConfig::new("http://127.0.0.1:1")).unwrap();
        assert!(!client.is_connected());
    }

    fn bridge_config() -> BridgeConfig {
        dotenvy::dotenv().ok();
        BridgeConfig::from_env().unwrap_or_default()
    }

    #[tokio::test]
    #[ignore = "requires running bridge"]
    async fn test_bridge_health_and_me() {
        let client = BridgeClient::connect(bridge_config()).await.unwrap();
        assert!(client.is_connected());

        let me = client.me().await.unwrap();
        assert!(!me.id.is_empty());
    }
}
