//! Append-only message log (`messages`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{MessageRecord, NewMessage};
use crate::Result;

/// Append a message to the log and return its row id.
pub async fn insert_message(pool: &SqlitePool, message: &NewMessage) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (
            message_id, from_number, to_number, tenant_id, direction,
            body, content_type, raw_envelope, response_source, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.message_id)
    .bind(&message.from_number)
    .bind(&message.to_number)
    .bind(message.tenant_id)
    .bind(message.direction)
    .bind(&message.body)
    .bind(&message.content_type)
    .bind(&message.raw_envelope)
    .bind(message.response_source)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get the most recent messages exchanged with a client, oldest first.
pub async fn recent_messages(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    limit: i64,
) -> Result<Vec<MessageRecord>> {
    let mut rows = sqlx::query_as::<_, MessageRecord>(
        r#"
        SELECT id, message_id, from_number, to_number, tenant_id, direction,
               body, content_type, raw_envelope, response_source, created_at
        FROM messages
        WHERE tenant_id = ? AND (from_number = ? OR to_number = ?)
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(tenant_id)
    .bind(client_number)
    .bind(client_number)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Distinct client and tenant pairs with inbound messages since `since`.
pub async fn active_clients_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT DISTINCT from_number, tenant_id
        FROM messages
        WHERE direction = 'inbound'
          AND from_number IS NOT NULL
          AND created_at >= ?
        ORDER BY from_number
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count logged messages carrying a provider message id.
pub async fn count_by_message_id(pool: &SqlitePool, message_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE message_id = ?
        "#,
    )
    .bind(message_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count all logged messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
