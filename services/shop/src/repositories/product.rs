//! Product repository for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::ProductRepository;
use crate::models::{NewProduct, Product};

/// PostgreSQL-backed catalog
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        image_url: row.get("image_url"),
        category: row.get("category"),
        stock: row.get("stock"),
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_all(&self) -> DatabaseResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, image_url, category, stock
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, image_url, category, stock
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn find_by_category(&self, category: &str) -> DatabaseResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, image_url, category, stock
            FROM products
            WHERE LOWER(category) = LOWER($1)
            ORDER BY id
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn create(&self, new_product: &NewProduct) -> DatabaseResult<Product> {
        info!("Creating product: {}", new_product.name);

        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, image_url, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, image_url, category, stock
            "#,
        )
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price)
        .bind(&new_product.image_url)
        .bind(&new_product.category)
        .bind(new_product.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(product_from_row(&row))
    }

    async fn update(&self, product: &Product) -> DatabaseResult<bool> {
        info!("Updating product: {}", product.id);

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, image_url = $5, category = $6, stock = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.stock)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        info!("Deleting product: {}", id);

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
