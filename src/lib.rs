//! Kanso Commerce
//!
//! Self-hosted e-commerce order backend.
//!
//! ## Features
//! - Product catalog with admin CRUD
//! - Per-user shopping cart
//! - Order placement with snapshot pricing and atomic stock decrement
//! - Order lifecycle with append-only transaction history
//! - Deterministic PDF invoice generation

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod http;
pub mod invoice;
pub mod service;
pub mod store;

use std::sync::Arc;

use crate::auth::AuthTokens;
use crate::service::{CartService, CatalogService, OrderService};

pub use error::{AppError, Result};

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub tokens: AuthTokens,
}
