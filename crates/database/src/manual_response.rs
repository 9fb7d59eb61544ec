//! Human handoff state (`respuestas_manuales`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::ManualResponse;
use crate::Result;

/// Get the handoff state for a client, or `None` when none was ever recorded.
pub async fn get_state(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
) -> Result<Option<ManualResponse>> {
    let record = sqlx::query_as::<_, ManualResponse>(
        r#"
        SELECT client_number, tenant_id, manual_response, last_response_at, invocation_count
        FROM respuestas_manuales
        WHERE client_number = ? AND tenant_id = ?
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Mark a conversation as handed off to a human and count the request.
pub async fn activate(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO respuestas_manuales
            (client_number, tenant_id, manual_response, last_response_at, invocation_count)
        VALUES (?, ?, 1, ?, 1)
        ON CONFLICT(client_number, tenant_id) DO UPDATE SET
            manual_response = 1,
            last_response_at = excluded.last_response_at,
            invocation_count = respuestas_manuales.invocation_count + 1
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a reply typed by a human operator, keeping automation paused.
pub async fn record_manual_reply(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO respuestas_manuales
            (client_number, tenant_id, manual_response, last_response_at, invocation_count)
        VALUES (?, ?, 1, ?, 0)
        ON CONFLICT(client_number, tenant_id) DO UPDATE SET
            manual_response = 1,
            last_response_at = excluded.last_response_at
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clear the manual flag so automation resumes.
pub async fn clear(pool: &SqlitePool, client_number: &str, tenant_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE respuestas_manuales
        SET manual_response = 0
        WHERE client_number = ? AND tenant_id = ?
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .execute(pool)
    .await?;

    Ok(())
}
