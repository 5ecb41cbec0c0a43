//! sqlx-backed stores. Orders are stored as one document per row: line
//! items, shipping and history live in JSONB columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::order::{
    LineItem, Order, OrderAmounts, OrderStatus, PaymentMethod, ShippingInfo, TransactionEntry,
};
use crate::domain::product::Product;
use crate::error::{AppError, Result};
use crate::store::{CartEntry, CartStore, OrderStore, ProductStore, StockAdjust};

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    owner_user_id: Option<Uuid>,
    customer_name: String,
    line_items: Json<Vec<LineItem>>,
    shipping: Json<ShippingInfo>,
    shipping_fee: i64,
    sub_total: i64,
    discount: i64,
    total: i64,
    payment_method: String,
    status: String,
    transaction_history: Json<Vec<TransactionEntry>>,
    created_at: DateTime<Utc>,
}

fn decode_err(message: String) -> AppError {
    AppError::Database(sqlx::Error::Decode(message.into()))
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| decode_err(format!("unknown payment method `{}`", row.payment_method)))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|_| decode_err(format!("unknown order status `{}`", row.status)))?;
        Ok(Order::from_parts(
            row.id,
            row.owner_user_id,
            row.customer_name,
            row.line_items.0,
            row.shipping.0,
            OrderAmounts {
                shipping_fee: row.shipping_fee,
                sub_total: row.sub_total,
                discount: row.discount,
                total: row.total,
            },
            payment_method,
            status,
            row.transaction_history.0,
            row.created_at,
        ))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, owner_user_id, customer_name, line_items, shipping, \
             shipping_fee, sub_total, discount, total, payment_method, status, \
             transaction_history, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(order.id())
        .bind(order.owner_user_id())
        .bind(order.customer_name())
        .bind(Json(order.line_items()))
        .bind(Json(order.shipping()))
        .bind(order.amounts().shipping_fee)
        .bind(order.amounts().sub_total)
        .bind(order.amounts().discount)
        .bind(order.amounts().total)
        .bind(order.payment_method().to_string())
        .bind(order.status().to_string())
        .bind(Json(order.transaction_history()))
        .bind(order.created_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn update_status_history(&self, order: &Order) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, transaction_history = $3 WHERE id = $1",
        )
        .bind(order.id())
        .bind(order.status().to_string())
        .bind(Json(order.transaction_history()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        name_search: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64)> {
        let mut rows_q = QueryBuilder::<Postgres>::new("SELECT * FROM orders WHERE 1=1");
        let mut count_q = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders WHERE 1=1");
        for q in [&mut rows_q, &mut count_q] {
            if let Some(search) = name_search {
                q.push(" AND customer_name ILIKE ")
                    .push_bind(format!("%{search}%"));
            }
            if let Some(status) = status {
                q.push(" AND status = ").push_bind(status.to_string());
            }
        }
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
        rows_q
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(per_page))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<OrderRow> = rows_q.build_query_as().fetch_all(&self.pool).await?;
        let total: i64 = count_q.build_query_scalar().fetch_one(&self.pool).await?;
        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((orders, total))
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE owner_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, detail, dept, unit_price, stocked_quantity, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.detail)
        .bind(&product.dept)
        .bind(product.unit_price)
        .bind(product.stocked_quantity)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        dept: Option<&str>,
    ) -> Result<(Vec<Product>, i64)> {
        let mut rows_q = QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE 1=1");
        let mut count_q = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE 1=1");
        for q in [&mut rows_q, &mut count_q] {
            if let Some(dept) = dept {
                q.push(" AND dept = ").push_bind(dept.to_string());
            }
        }
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
        rows_q
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(per_page))
            .push(" OFFSET ")
            .push_bind(offset);

        let products: Vec<Product> = rows_q.build_query_as().fetch_all(&self.pool).await?;
        let total: i64 = count_q.build_query_scalar().fetch_one(&self.pool).await?;
        Ok((products, total))
    }

    async fn update(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, detail = $3, dept = $4, unit_price = $5, \
             stocked_quantity = $6 WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.detail)
        .bind(&product.dept)
        .bind(product.unit_price)
        .bind(product.stocked_quantity)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<StockAdjust> {
        let result = sqlx::query(
            "UPDATE products SET stocked_quantity = stocked_quantity + $2 \
             WHERE id = $1 AND stocked_quantity + $2 >= 0",
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(StockAdjust::Applied);
        }
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(if exists {
            StockAdjust::Insufficient
        } else {
            StockAdjust::Missing
        })
    }
}

#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<CartEntry>> {
        let entries = sqlx::query_as::<_, CartEntry>(
            "SELECT product_id, quantity FROM cart_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn upsert(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
