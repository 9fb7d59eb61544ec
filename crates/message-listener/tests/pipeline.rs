//! End-to-end tests of the delivery pipeline with mock brains, an
//! in-memory database and a recording sender.

use std::sync::Arc;
use std::time::Duration;

use brain_core::Brain;
use chrono::Utc;
use database::{
    manual_response, message_log, order, product, Database, Direction, ResponseSource,
};
use message_listener::{
    Pipeline, PipelineConfig, ProcessResult, ProviderMessage, RecordingSender, SessionContext,
    APOLOGY_TEXT, HANDOFF_ACK_TEXT,
};
use mock_brain::{DelayedBrain, EchoBrain, FailingBrain, ScriptedBrain};
use serde_json::json;

const OWN: &str = "5215500000000";
const CUSTOMER: &str = "5215512345678";
const OPERATOR: &str = "5215599999999";

struct Harness {
    db: Database,
    sender: Arc<RecordingSender>,
    pipeline: Pipeline,
}

async fn harness(brain: Arc<dyn Brain>) -> Harness {
    harness_with_config(brain, PipelineConfig::default()).await
}

async fn harness_with_config(brain: Arc<dyn Brain>, config: PipelineConfig) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let sender = Arc::new(RecordingSender::new());
    let context = Arc::new(SessionContext::new());
    context.set_own_number(Some(OWN.to_string())).await;

    let pipeline = Pipeline::new(
        db.clone(),
        brain,
        sender.clone(),
        context,
        config.with_operator_number(OPERATOR),
    );

    Harness {
        db,
        sender,
        pipeline,
    }
}

fn provider_message(value: serde_json::Value) -> ProviderMessage {
    serde_json::from_value(value).unwrap()
}

fn text_from_customer(id: &str, text: &str) -> ProviderMessage {
    provider_message(json!({
        "key": {"remoteJid": format!("{}@s.whatsapp.net", CUSTOMER), "fromMe": false, "id": id},
        "message": {"conversation": text},
        "messageTimestamp": 1700000000
    }))
}

fn text_from_business(id: &str, text: &str) -> ProviderMessage {
    provider_message(json!({
        "key": {"remoteJid": format!("{}@s.whatsapp.net", CUSTOMER), "fromMe": true, "id": id},
        "message": {"conversation": text}
    }))
}

async fn add_pizza(db: &Database) {
    product::insert_product(
        db.pool(),
        "Pizza",
        "grande",
        150.0,
        Some("Hawaiana"),
        Some("https://cdn.example.com/pizza.jpg"),
    )
    .await
    .unwrap();
}

const PIZZA_REPLY: &str = "```json {\"nombre\":\"Pizza\",\"tamano\":\"grande\",\"precio\":100} ```";

#[tokio::test]
async fn test_duplicate_delivery_is_processed_once() {
    let brain = Arc::new(ScriptedBrain::always("¡Hola!"));
    let h = harness(brain.clone()).await;
    let message = text_from_customer("DUP1", "hola");

    let first = h.pipeline.process_message(&message).await;
    let second = h.pipeline.process_message(&message).await;

    assert!(matches!(first, ProcessResult::Responded { .. }));
    assert!(matches!(second, ProcessResult::Skipped { .. }));
    assert_eq!(
        message_log::count_by_message_id(h.db.pool(), "DUP1").await.unwrap(),
        1
    );
    assert_eq!(brain.call_count().await, 1);
    assert_eq!(h.sender.sent_to(CUSTOMER).await.len(), 1);
}

#[tokio::test]
async fn test_reply_is_logged_and_echo_skipped() {
    let h = harness(Arc::new(EchoBrain::new())).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("M1", "hola"))
        .await;
    match result {
        ProcessResult::Responded {
            recipient,
            response,
            source,
        } => {
            assert_eq!(recipient, CUSTOMER);
            assert_eq!(response, "hola");
            assert_eq!(source, ResponseSource::Automation);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let sent = h.sender.sent_to(CUSTOMER).await;
    assert_eq!(sent.len(), 1);

    // The bridge echoes our own send back as a fromMe message
    let echo = text_from_business(&sent[0].id, "hola");
    assert!(matches!(
        h.pipeline.process_message(&echo).await,
        ProcessResult::Skipped { .. }
    ));
    assert!(manual_response::get_state(h.db.pool(), CUSTOMER, 1)
        .await
        .unwrap()
        .is_none());

    let log = message_log::recent_messages(h.db.pool(), CUSTOMER, 1, 10)
        .await
        .unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].direction, Direction::Inbound);
    assert_eq!(log[0].to_number.as_deref(), Some(OWN));
    assert_eq!(log[1].direction, Direction::Outbound);
    assert_eq!(log[1].response_source, Some(ResponseSource::Automation));
    assert_eq!(log[1].message_id.as_deref(), Some(sent[0].id.as_str()));
}

#[tokio::test]
async fn test_handoff_request_acknowledges_without_backend() {
    let brain = Arc::new(ScriptedBrain::always("no debería responder"));
    let h = harness(brain.clone()).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("H1", "Quiero hablar con un humano"))
        .await;
    assert!(matches!(result, ProcessResult::HandoffRequested { ref client } if client == CUSTOMER));

    let to_customer = h.sender.sent_to(CUSTOMER).await;
    assert_eq!(to_customer.len(), 1);
    assert_eq!(to_customer[0].text, HANDOFF_ACK_TEXT);
    assert_eq!(h.sender.sent_to(OPERATOR).await.len(), 1);
    assert_eq!(brain.call_count().await, 0);

    let state = manual_response::get_state(h.db.pool(), CUSTOMER, 1)
        .await
        .unwrap()
        .unwrap();
    assert!(state.manual_response);
    assert_eq!(state.invocation_count, 1);

    // While a human owns the conversation the backend stays quiet
    let result = h
        .pipeline
        .process_message(&text_from_customer("H2", "¿sigues ahí?"))
        .await;
    assert!(matches!(result, ProcessResult::Skipped { .. }));
    assert_eq!(brain.call_count().await, 0);

    // Asking again does not page the operator twice
    h.pipeline
        .process_message(&text_from_customer("H3", "hablar con un humano!!"))
        .await;
    assert_eq!(h.sender.sent_to(OPERATOR).await.len(), 1);
}

#[tokio::test]
async fn test_view_once_image_caption() {
    let brain = Arc::new(ScriptedBrain::always("Bonita foto"));
    let h = harness(brain.clone()).await;

    let message = provider_message(json!({
        "key": {"remoteJid": format!("{}@s.whatsapp.net", CUSTOMER), "fromMe": false, "id": "V1"},
        "message": {"viewOnceMessage": {"message": {"imageMessage": {"caption": "hello"}}}}
    }));
    h.pipeline.process_message(&message).await;

    let log = message_log::recent_messages(h.db.pool(), CUSTOMER, 1, 10)
        .await
        .unwrap();
    assert_eq!(log[0].content_type, "imageMessage (view once)");
    assert_eq!(log[0].body.as_deref(), Some("hello"));
    assert_eq!(brain.received().await[0].text, "hello");
}

#[tokio::test]
async fn test_message_without_text_is_logged_not_answered() {
    let brain = Arc::new(ScriptedBrain::always("?"));
    let h = harness(brain.clone()).await;

    let message = provider_message(json!({
        "key": {"remoteJid": format!("{}@s.whatsapp.net", CUSTOMER), "fromMe": false, "id": "S1"},
        "message": {"stickerMessage": {"url": "https://mmg.whatsapp.net/s"}}
    }));
    let result = h.pipeline.process_message(&message).await;

    assert!(matches!(result, ProcessResult::Skipped { .. }));
    assert_eq!(message_log::count_messages(h.db.pool()).await.unwrap(), 1);
    assert_eq!(brain.call_count().await, 0);
}

#[tokio::test]
async fn test_status_broadcast_is_ignored() {
    let h = harness(Arc::new(EchoBrain::new())).await;
    let message = provider_message(json!({
        "key": {"remoteJid": "status@broadcast", "participant": format!("{}@s.whatsapp.net", CUSTOMER), "id": "ST1"},
        "message": {"conversation": "estado"}
    }));

    assert!(matches!(
        h.pipeline.process_message(&message).await,
        ProcessResult::Skipped { .. }
    ));
    assert_eq!(message_log::count_messages(h.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_catalog_corrects_backend_price() {
    let h = harness(Arc::new(ScriptedBrain::always(PIZZA_REPLY))).await;
    add_pizza(&h.db).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("C1", "quiero una pizza grande"))
        .await;

    match result {
        ProcessResult::Responded { response, .. } => {
            assert_eq!(response, "Pizza (grande): $150.00\nHawaiana");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let sent = h.sender.sent_to(CUSTOMER).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[1].media_url.as_deref(),
        Some("https://cdn.example.com/pizza.jpg")
    );

    let pending = h.pipeline.context().pending_product(CUSTOMER).await.unwrap();
    assert_eq!(pending.price, 150.0);
}

#[tokio::test]
async fn test_unknown_product_gets_not_found_reply() {
    let reply = r#"{"nombre":"Hamburguesa","tamano":"doble","precio":90}"#;
    let h = harness(Arc::new(ScriptedBrain::always(reply))).await;
    add_pizza(&h.db).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("C2", "una hamburguesa"))
        .await;

    match result {
        ProcessResult::Responded {
            response, source, ..
        } => {
            assert_eq!(response, message_listener::catalog::PRODUCT_NOT_FOUND_TEXT);
            assert_eq!(source, ResponseSource::System);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(h.pipeline.context().pending_product(CUSTOMER).await.is_none());
}

#[tokio::test]
async fn test_affirmation_captures_pending_order() {
    let brain = Arc::new(ScriptedBrain::with_replies([
        PIZZA_REPLY,
        "¡Listo! Tu pedido está registrado.",
    ]));
    let h = harness(brain.clone()).await;
    add_pizza(&h.db).await;

    h.pipeline
        .process_message(&text_from_customer("O1", "quiero una pizza grande"))
        .await;
    h.pipeline
        .process_message(&text_from_customer("O2", "Sí, por favor"))
        .await;

    let orders = order::list_orders(h.db.pool(), CUSTOMER, 1).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].product_name, "Pizza");
    assert_eq!(orders[0].price, 150.0);
    assert_eq!(orders[0].status, "pending");
    assert!(h.pipeline.context().pending_product(CUSTOMER).await.is_none());

    // The second call saw the first exchange as history
    let received = brain.received().await;
    let history = &received[1].history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "quiero una pizza grande");
    assert_eq!(history[1].role, "assistant");
}

#[tokio::test]
async fn test_affirmation_without_pending_product_creates_nothing() {
    let h = harness(Arc::new(ScriptedBrain::always("¿Qué deseas confirmar?"))).await;

    h.pipeline
        .process_message(&text_from_customer("O3", "si"))
        .await;

    let orders = order::list_orders(h.db.pool(), CUSTOMER, 1).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_backend_failure_sends_apology_and_alerts_operator() {
    let brain = Arc::new(FailingBrain::new());
    let h = harness(brain.clone()).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("F1", "hola"))
        .await;

    match result {
        ProcessResult::Responded {
            response, source, ..
        } => {
            assert_eq!(response, APOLOGY_TEXT);
            assert_eq!(source, ResponseSource::Error);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(brain.call_count(), 1);

    let to_customer = h.sender.sent_to(CUSTOMER).await;
    assert_eq!(to_customer.len(), 1);
    assert_eq!(to_customer[0].text, APOLOGY_TEXT);

    let to_operator = h.sender.sent_to(OPERATOR).await;
    assert_eq!(to_operator.len(), 1);
    assert!(to_operator[0].text.contains(CUSTOMER));
}

#[tokio::test]
async fn test_backend_timeout_is_a_failure() {
    let brain = Arc::new(DelayedBrain::with_millis(EchoBrain::new(), 500));
    let config = PipelineConfig::default().with_brain_timeout(Duration::from_millis(50));
    let h = harness_with_config(brain, config).await;

    let result = h
        .pipeline
        .process_message(&text_from_customer("T1", "hola"))
        .await;

    assert!(matches!(
        result,
        ProcessResult::Responded {
            source: ResponseSource::Error,
            ..
        }
    ));
}

#[tokio::test]
async fn test_manual_reply_pauses_automation() {
    let brain = Arc::new(ScriptedBrain::always("automático"));
    let h = harness(brain.clone()).await;

    let result = h
        .pipeline
        .process_message(&text_from_business("OP1", "Hola, soy Ana. Yo te atiendo."))
        .await;
    assert!(matches!(result, ProcessResult::ManualReplyRecorded { ref client } if client == CUSTOMER));

    let log = message_log::recent_messages(h.db.pool(), CUSTOMER, 1, 10)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].direction, Direction::Outbound);
    assert_eq!(log[0].response_source, Some(ResponseSource::Manual));

    let result = h
        .pipeline
        .process_message(&text_from_customer("OP2", "gracias"))
        .await;
    assert!(matches!(result, ProcessResult::Skipped { .. }));
    assert_eq!(brain.call_count().await, 0);
}

#[tokio::test]
async fn test_handoff_from_previous_run_is_stale() {
    let brain = Arc::new(ScriptedBrain::always("de vuelta"));
    let h = harness(brain.clone()).await;
    let now = Utc::now();

    manual_response::activate(h.db.pool(), CUSTOMER, 1, now - chrono::Duration::minutes(10))
        .await
        .unwrap();

    let pipeline = h.pipeline.with_process_start(now - chrono::Duration::minutes(5));
    let result = pipeline
        .process_message(&text_from_customer("R1", "hola"))
        .await;

    assert!(matches!(result, ProcessResult::Responded { .. }));
    assert_eq!(brain.call_count().await, 1);
    let state = manual_response::get_state(h.db.pool(), CUSTOMER, 1)
        .await
        .unwrap()
        .unwrap();
    assert!(!state.manual_response);
}

#[tokio::test]
async fn test_handoff_within_this_run_suppresses() {
    let brain = Arc::new(ScriptedBrain::always("no"));
    let h = harness(brain.clone()).await;
    let now = Utc::now();

    manual_response::activate(h.db.pool(), CUSTOMER, 1, now - chrono::Duration::minutes(10))
        .await
        .unwrap();

    let pipeline = h.pipeline.with_process_start(now - chrono::Duration::minutes(30));
    let result = pipeline
        .process_message(&text_from_customer("R2", "hola"))
        .await;

    assert!(matches!(result, ProcessResult::Skipped { .. }));
    assert_eq!(brain.call_count().await, 0);
}

/// Log one inbound message from each number so the sweep sees them as active.
async fn seed_conversations(pipeline: &Pipeline, numbers: &[&str]) {
    for (i, number) in numbers.iter().enumerate() {
        let message = provider_message(json!({
            "key": {"remoteJid": format!("{}@s.whatsapp.net", number), "fromMe": false, "id": format!("W{}", i)},
            "message": {"conversation": "hola"}
        }));
        pipeline.process_message(&message).await;
    }
}

#[tokio::test]
async fn test_sweep_notifies_and_clears() {
    let h = harness(Arc::new(EchoBrain::new())).await;
    let now = Utc::now();
    let other = "5215587654321";
    let pipeline = h.pipeline.with_process_start(now - chrono::Duration::hours(3));
    seed_conversations(&pipeline, &[CUSTOMER, other]).await;

    let pool = h.db.pool();
    manual_response::activate(pool, CUSTOMER, 1, now - chrono::Duration::minutes(15))
        .await
        .unwrap();
    manual_response::activate(pool, other, 1, now - chrono::Duration::hours(2))
        .await
        .unwrap();

    let report = pipeline.sweep_handoffs(now).await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(report.cleared, 1);

    let waiting = manual_response::get_state(pool, CUSTOMER, 1).await.unwrap().unwrap();
    assert!(waiting.manual_response);
    let expired = manual_response::get_state(pool, other, 1).await.unwrap().unwrap();
    assert!(!expired.manual_response);

    let operator = h.sender.sent_to(OPERATOR).await;
    assert_eq!(operator.len(), 1);
    assert!(operator[0].text.contains(CUSTOMER));

    // Repeated sweeps inside the lookback window stay quiet
    let report = pipeline.sweep_handoffs(now).await.unwrap();
    assert_eq!(report.notified, 0);
}

#[tokio::test]
async fn test_sweep_keeps_clearing_after_failed_alert() {
    let h = harness(Arc::new(EchoBrain::new())).await;
    let now = Utc::now();
    let other = "5215587654321";
    let pipeline = h.pipeline.with_process_start(now - chrono::Duration::hours(3));
    seed_conversations(&pipeline, &[CUSTOMER, other]).await;

    let pool = h.db.pool();
    manual_response::activate(pool, CUSTOMER, 1, now - chrono::Duration::minutes(15))
        .await
        .unwrap();
    manual_response::activate(pool, other, 1, now - chrono::Duration::hours(2))
        .await
        .unwrap();

    h.sender.set_failing(true);
    let report = pipeline.sweep_handoffs(now).await.unwrap();
    assert_eq!(report.notified, 0);
    assert_eq!(report.cleared, 1);

    let expired = manual_response::get_state(pool, other, 1).await.unwrap().unwrap();
    assert!(!expired.manual_response);

    // The failed alert was not recorded, so the next sweep tries again
    h.sender.set_failing(false);
    let report = pipeline.sweep_handoffs(now).await.unwrap();
    assert_eq!(report.notified, 1);
}

#[tokio::test]
async fn test_sweep_clears_handoff_from_previous_run() {
    let h = harness(Arc::new(EchoBrain::new())).await;
    let now = Utc::now();
    let pipeline = h.pipeline.with_process_start(now - chrono::Duration::minutes(5));
    seed_conversations(&pipeline, &[CUSTOMER]).await;

    let pool = h.db.pool();
    manual_response::activate(pool, CUSTOMER, 1, now - chrono::Duration::minutes(15))
        .await
        .unwrap();

    let report = pipeline.sweep_handoffs(now).await.unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(report.notified, 0);
    assert!(h.sender.sent_to(OPERATOR).await.is_empty());

    let state = manual_response::get_state(pool, CUSTOMER, 1).await.unwrap().unwrap();
    assert!(!state.manual_response);
}

#[tokio::test]
async fn test_operator_alert_echo_is_skipped() {
    let h = harness(Arc::new(EchoBrain::new())).await;

    h.pipeline
        .process_message(&text_from_customer("H1", "hablar con un humano"))
        .await;
    let alerts = h.sender.sent_to(OPERATOR).await;
    assert_eq!(alerts.len(), 1);

    // The bridge echoes the alert back as a fromMe message to the operator
    let echo = provider_message(json!({
        "key": {"remoteJid": format!("{}@s.whatsapp.net", OPERATOR), "fromMe": true, "id": alerts[0].id},
        "message": {"conversation": alerts[0].text}
    }));
    assert!(matches!(
        h.pipeline.process_message(&echo).await,
        ProcessResult::Skipped { .. }
    ));

    assert!(manual_response::get_state(h.db.pool(), OPERATOR, 1)
        .await
        .unwrap()
        .is_none());
    let operator_log = message_log::recent_messages(h.db.pool(), OPERATOR, 1, 10)
        .await
        .unwrap();
    assert!(operator_log.is_empty());
}

#[tokio::test]
async fn test_send_failure_is_reported() {
    let h = harness(Arc::new(EchoBrain::new())).await;
    h.sender.set_failing(true);

    let result = h
        .pipeline
        .process_message(&text_from_customer("E1", "hola"))
        .await;
    assert!(matches!(result, ProcessResult::Error(_)));

    // The inbound message is still logged
    assert_eq!(
        message_log::count_by_message_id(h.db.pool(), "E1").await.unwrap(),
        1
    );
}
