//! Operator notification log (`notificaciones`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::NotificationKind;
use crate::Result;

/// Record that the operator was notified about a client.
pub async fn insert_notification(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    kind: NotificationKind,
    at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notificaciones (client_number, tenant_id, kind, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .bind(kind)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Check whether a notification of this kind was sent at or after `since`.
pub async fn exists_since(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    kind: NotificationKind,
    since: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM notificaciones
        WHERE client_number = ? AND tenant_id = ? AND kind = ? AND created_at >= ?
        LIMIT 1
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .bind(kind)
    .bind(since)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}
