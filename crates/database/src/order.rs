//! Order capture (`pedidos`).

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Order, Product};
use crate::Result;

/// Create a pending order for a catalog product and return its id.
pub async fn create_order(
    pool: &SqlitePool,
    client_number: &str,
    tenant_id: i64,
    product: &Product,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO pedidos
            (client_number, tenant_id, product_id, product_name, size, price, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.size)
    .bind(product.price)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List orders placed by a client, newest first.
pub async fn list_orders(pool: &SqlitePool, client_number: &str, tenant_id: i64) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, client_number, tenant_id, product_id, product_name, size, price, status, created_at
        FROM pedidos
        WHERE client_number = ? AND tenant_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(client_number)
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
