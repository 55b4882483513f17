use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use common::{Currency, OrderId, ProductId};

use crate::records::{
    NewOrder, NewProduct, OrderItemRecord, OrderRecord, OrderStatus, Product,
};
use crate::store::CommerceStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed commerce store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL commerce store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price_cents: row.try_get("price_cents")?,
            currency: Currency::new(row.try_get::<String, _>("currency")?),
            stock: row.try_get("stock")?,
            slug: row.try_get("slug")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            user_email: row.try_get("user_email")?,
            status,
            total_cents: row.try_get("total_cents")?,
            currency: Currency::new(row.try_get::<String, _>("currency")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            unit_price_cents: row.try_get("unit_price_cents")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

#[async_trait]
impl CommerceStore for PostgresStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (title, description, price_cents, currency, stock, slug)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, price_cents, currency, stock, slug
            "#,
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.currency.as_str())
        .bind(product.stock)
        .bind(&product.slug)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET title = $2, description = $3, price_cents = $4,
                currency = $5, stock = $6, slug = $7
            WHERE id = $1
            RETURNING id, title, description, price_cents, currency, stock, slug
            "#,
        )
        .bind(id.as_i64())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.currency.as_str())
        .bind(product.stock)
        .bind(&product.slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, price_cents, currency, stock, slug
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price_cents, currency, stock, slug
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, title, description, price_cents, currency, stock, slug
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Self::row_to_product(row).map(|p| (p.id, p)))
            .collect()
    }

    #[tracing::instrument(skip(self, order), fields(user_email = %order.user_email))]
    async fn commit_order(&self, order: NewOrder) -> Result<OrderId> {
        let mut tx = self.pool.begin().await?;

        // Decrement in sorted product order so concurrent commits on
        // overlapping products take row locks in a consistent order.
        let mut decrements: Vec<(ProductId, i64)> = order
            .items
            .iter()
            .map(|it| (it.product_id, it.quantity))
            .collect();
        decrements.sort_by_key(|(id, _)| *id);

        for (product_id, quantity) in decrements {
            // Conditional decrement: the row lock taken by UPDATE
            // serializes the stock check against concurrent commits,
            // and the predicate keeps stock from going negative.
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(product_id.as_i64())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(product_id.as_i64())
                        .fetch_optional(&mut *tx)
                        .await?;

                // Dropping the transaction rolls back earlier decrements.
                return Err(match available {
                    None => StoreError::ProductNotFound(product_id),
                    Some(available) => StoreError::InsufficientStock {
                        product_id,
                        available,
                        requested: quantity,
                    },
                });
            }
        }

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_email, status, total_cents, currency, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&order.user_email)
        .bind(order.status.as_str())
        .bind(order.total_cents)
        .bind(order.currency.as_str())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id.as_i64())
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(OrderId::new(order_id))
    }

    async fn list_orders(&self, user_email: &str) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_email, status, total_cents, currency, created_at
            FROM orders
            WHERE user_email = $1
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_items(&self, order_ids: &[OrderId]) -> Result<Vec<OrderItemRecord>> {
        let ids: Vec<i64> = order_ids.iter().map(|id| id.as_i64()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }
}
