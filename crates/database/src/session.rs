//! Bridge session persistence (`whatsapp_sessions`).

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::SessionRecord;
use crate::Result;

/// Get the session for a client, or `None` when no row exists.
///
/// Query failures are returned as errors and never folded into `None`.
pub async fn get_session(pool: &SqlitePool, client_id: &str) -> Result<Option<SessionRecord>> {
    let record = sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT client_id, session_data, updated_at
        FROM whatsapp_sessions
        WHERE client_id = ?
        "#,
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create or replace the session blob for a client in a single statement.
pub async fn upsert_session(pool: &SqlitePool, client_id: &str, session_data: &[u8]) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO whatsapp_sessions (client_id, session_data, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(client_id) DO UPDATE SET
            session_data = excluded.session_data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(client_id)
    .bind(session_data)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the session for a client.
///
/// Returns the number of rows removed; deleting a missing session is not an error.
pub async fn delete_session(pool: &SqlitePool, client_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM whatsapp_sessions
        WHERE client_id = ?
        "#,
    )
    .bind(client_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Check whether a session row exists for a client.
pub async fn session_exists(pool: &SqlitePool, client_id: &str) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM whatsapp_sessions
        WHERE client_id = ?
        "#,
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}
