//! Store abstractions. Business logic talks to these traits only; the SQL
//! lives in [`postgres`].

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::domain::product::Product;
use crate::error::Result;

pub use postgres::{PgCartStore, PgOrderStore, PgProductStore};

/// Outcome of a conditional stock adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockAdjust {
    Applied,
    /// The decrement would have taken the stock below zero; nothing changed.
    Insufficient,
    Missing,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    async fn find(&self, id: Uuid) -> Result<Option<Order>>;

    /// Persists the two fields that may change after creation: status and
    /// transaction history. Returns false when the order no longer exists.
    async fn update_status_history(&self, order: &Order) -> Result<bool>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        name_search: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64)>;

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<()>;

    async fn find(&self, id: Uuid) -> Result<Option<Product>>;

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        dept: Option<&str>,
    ) -> Result<(Vec<Product>, i64)>;

    async fn update(&self, product: &Product) -> Result<bool>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Applies `delta` to the stocked quantity. Negative deltas are
    /// conditional: the update only happens when the resulting quantity
    /// stays non-negative, so concurrent orders cannot oversell.
    async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<StockAdjust>;
}

#[derive(Clone, Copy, Debug, sqlx::FromRow)]
pub struct CartEntry {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<CartEntry>>;

    /// Inserts the item or accumulates onto an existing quantity.
    async fn upsert(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<()>;

    async fn set_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<bool>;

    async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;

    async fn clear(&self, user_id: Uuid) -> Result<()>;
}
