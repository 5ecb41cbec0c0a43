//! Per-user shopping cart. Requires an authenticated user; cart lines are
//! joined with live catalog data at read time.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::{AppError, Result};
use crate::store::{CartStore, ProductStore};

#[derive(Debug, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub stocked_quantity: i32,
}

pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { carts, products }
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<CartLine>> {
        let user_id = require_user(actor)?;
        let entries = self.carts.entries_for(user_id).await?;
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            // Items whose product has since been deleted are skipped.
            if let Some(product) = self.products.find(entry.product_id).await? {
                lines.push(CartLine {
                    product_id: product.id,
                    product_name: product.name,
                    unit_price: product.unit_price,
                    quantity: entry.quantity,
                    stocked_quantity: product.stocked_quantity,
                });
            }
        }
        Ok(lines)
    }

    pub async fn add(&self, product_id: Uuid, quantity: i32, actor: &Actor) -> Result<()> {
        let user_id = require_user(actor)?;
        if quantity < 1 {
            return Err(AppError::validation("quantity", "quantity must be at least 1"));
        }
        self.products
            .find(product_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;
        self.carts.upsert(user_id, product_id, quantity).await
    }

    pub async fn set_quantity(&self, product_id: Uuid, quantity: i32, actor: &Actor) -> Result<()> {
        let user_id = require_user(actor)?;
        if quantity < 1 {
            return Err(AppError::validation("quantity", "quantity must be at least 1"));
        }
        if !self.carts.set_quantity(user_id, product_id, quantity).await? {
            return Err(AppError::NotFound("cart item"));
        }
        Ok(())
    }

    pub async fn remove(&self, product_id: Uuid, actor: &Actor) -> Result<()> {
        let user_id = require_user(actor)?;
        if !self.carts.remove(user_id, product_id).await? {
            return Err(AppError::NotFound("cart item"));
        }
        Ok(())
    }

    pub async fn clear(&self, actor: &Actor) -> Result<()> {
        let user_id = require_user(actor)?;
        self.carts.clear(user_id).await
    }
}

fn require_user(actor: &Actor) -> Result<Uuid> {
    actor.user_id.ok_or(AppError::Unauthorized)
}
