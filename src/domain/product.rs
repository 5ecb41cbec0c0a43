//! Catalog product record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub detail: String,
    pub dept: String,
    pub unit_price: i64,
    pub stocked_quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        detail: impl Into<String>,
        dept: impl Into<String>,
        unit_price: i64,
        stocked_quantity: i32,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            detail: detail.into(),
            dept: dept.into(),
            unit_price,
            stocked_quantity,
            created_at: Utc::now(),
        }
    }
}
