//! Catalog lookups (`productos`).

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Product;

/// Find a product by exact name and size.
pub async fn find_product(pool: &SqlitePool, name: &str, size: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, size, price, description, photo_url
        FROM productos
        WHERE name = ? AND size = ?
        "#,
    )
    .bind(name)
    .bind(size)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Get a product by id.
pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, size, price, description, photo_url
        FROM productos
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Product",
        id: id.to_string(),
    })
}

/// Insert a catalog product and return its id.
pub async fn insert_product(
    pool: &SqlitePool,
    name: &str,
    size: &str,
    price: f64,
    description: Option<&str>,
    photo_url: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO productos (name, size, price, description, photo_url)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(size)
    .bind(price)
    .bind(description)
    .bind(photo_url)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List the whole catalog.
pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, size, price, description, photo_url
        FROM productos
        ORDER BY name, size
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
