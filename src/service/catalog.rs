//! Catalog reads are public; writes require `ManageProducts`.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Actor, Capability};
use crate::domain::product::Product;
use crate::error::{AppError, Result};
use crate::store::ProductStore;

#[derive(Debug, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, message = "product name is required"))]
    pub name: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub dept: String,
    #[validate(range(min = 0, message = "unit price must be non-negative"))]
    pub unit_price: i64,
    #[validate(range(min = 0, message = "stocked quantity must be non-negative"))]
    #[serde(default)]
    pub stocked_quantity: i32,
}

pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    pub async fn list(
        &self,
        page: u32,
        per_page: u32,
        dept: Option<&str>,
    ) -> Result<(Vec<Product>, i64)> {
        self.products.list(page, per_page, dept).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        self.products
            .find(id)
            .await?
            .ok_or(AppError::NotFound("product"))
    }

    pub async fn create(&self, input: ProductInput, actor: &Actor) -> Result<Product> {
        actor.require(Capability::ManageProducts)?;
        input.validate()?;
        let product = Product::new(
            input.name,
            input.detail,
            input.dept,
            input.unit_price,
            input.stocked_quantity,
        );
        self.products.insert(&product).await?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, input: ProductInput, actor: &Actor) -> Result<Product> {
        actor.require(Capability::ManageProducts)?;
        input.validate()?;
        let mut product = self.get(id).await?;
        product.name = input.name;
        product.detail = input.detail;
        product.dept = input.dept;
        product.unit_price = input.unit_price;
        product.stocked_quantity = input.stocked_quantity;
        if !self.products.update(&product).await? {
            return Err(AppError::NotFound("product"));
        }
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        actor.require(Capability::ManageProducts)?;
        if !self.products.delete(id).await? {
            return Err(AppError::NotFound("product"));
        }
        Ok(())
    }
}
