#![allow(dead_code)]

//! In-memory store implementations and fixtures shared by the integration
//! tests. They honor the same trait contracts as the Postgres stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use kanso_commerce::domain::order::{Order, OrderStatus};
use kanso_commerce::domain::product::Product;
use kanso_commerce::error::Result;
use kanso_commerce::events::EventPublisher;
use kanso_commerce::invoice::InvoiceAssets;
use kanso_commerce::service::orders::{
    InvoiceConfig, OrderItemRequest, OrderService, PlaceOrder, ShippingRequest,
};
use kanso_commerce::service::{CartService, CatalogService};
use kanso_commerce::store::{CartEntry, CartStore, OrderStore, ProductStore, StockAdjust};

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl MemoryOrderStore {
    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.lock().unwrap().insert(order.id(), order.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn update_status_history(&self, order: &Order) -> Result<bool> {
        let mut orders = self.orders.lock().unwrap();
        if !orders.contains_key(&order.id()) {
            return Ok(false);
        }
        orders.insert(order.id(), order.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.orders.lock().unwrap().remove(&id).is_some())
    }

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        name_search: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<Order>, i64)> {
        let orders = self.orders.lock().unwrap();
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| {
                name_search.map_or(true, |s| {
                    o.customer_name().to_lowercase().contains(&s.to_lowercase())
                }) && status.map_or(true, |s| o.status() == s)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        let total = matched.len() as i64;
        let start = ((page.max(1) - 1) * per_page) as usize;
        let data = matched
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Ok((data, total))
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let orders = self.orders.lock().unwrap();
        let mut owned: Vec<Order> = orders
            .values()
            .filter(|o| o.owner_user_id() == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(owned)
    }
}

pub struct MemoryProductStore {
    products: Mutex<HashMap<Uuid, Product>>,
}

impl MemoryProductStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub fn stock_of(&self, id: Uuid) -> i32 {
        self.products.lock().unwrap()[&id].stocked_quantity
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<()> {
        self.products
            .lock()
            .unwrap()
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        dept: Option<&str>,
    ) -> Result<(Vec<Product>, i64)> {
        let products = self.products.lock().unwrap();
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| dept.map_or(true, |d| p.dept == d))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as i64;
        let start = ((page.max(1) - 1) * per_page) as usize;
        let data = matched
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Ok((data, total))
    }

    async fn update(&self, product: &Product) -> Result<bool> {
        let mut products = self.products.lock().unwrap();
        if !products.contains_key(&product.id) {
            return Ok(false);
        }
        products.insert(product.id, product.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.products.lock().unwrap().remove(&id).is_some())
    }

    async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<StockAdjust> {
        let mut products = self.products.lock().unwrap();
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockAdjust::Missing);
        };
        if product.stocked_quantity + delta < 0 {
            return Ok(StockAdjust::Insufficient);
        }
        product.stocked_quantity += delta;
        Ok(StockAdjust::Applied)
    }
}

#[derive(Default)]
pub struct MemoryCartStore {
    items: Mutex<HashMap<(Uuid, Uuid), i32>>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<CartEntry>> {
        let items = self.items.lock().unwrap();
        let mut entries: Vec<CartEntry> = items
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((_, product_id), quantity)| CartEntry {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect();
        entries.sort_by_key(|e| e.product_id);
        Ok(entries)
    }

    async fn upsert(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<()> {
        *self
            .items
            .lock()
            .unwrap()
            .entry((user_id, product_id))
            .or_insert(0) += quantity;
        Ok(())
    }

    async fn set_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<bool> {
        let mut items = self.items.lock().unwrap();
        match items.get_mut(&(user_id, product_id)) {
            Some(existing) => {
                *existing = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .remove(&(user_id, product_id))
            .is_some())
    }

    async fn clear(&self, user_id: Uuid) -> Result<()> {
        self.items
            .lock()
            .unwrap()
            .retain(|(owner, _), _| *owner != user_id);
        Ok(())
    }
}

pub struct TestContext {
    pub orders: Arc<MemoryOrderStore>,
    pub products: Arc<MemoryProductStore>,
    pub service: OrderService,
    pub staging: TempDir,
}

impl TestContext {
    pub fn staging_dir(&self) -> std::path::PathBuf {
        self.staging.path().join("invoices")
    }
}

pub fn order_service(products: Vec<Product>) -> TestContext {
    let staging = tempfile::tempdir().unwrap();
    let orders = Arc::new(MemoryOrderStore::default());
    let product_store = Arc::new(MemoryProductStore::new(products));
    let service = OrderService::new(
        orders.clone(),
        product_store.clone(),
        EventPublisher::disabled(),
        InvoiceConfig {
            staging_dir: staging.path().join("invoices"),
            assets: InvoiceAssets::default(),
        },
    );
    TestContext {
        orders,
        products: product_store,
        service,
        staging,
    }
}

pub fn catalog_service(products: Vec<Product>) -> (Arc<MemoryProductStore>, CatalogService) {
    let store = Arc::new(MemoryProductStore::new(products));
    (store.clone(), CatalogService::new(store))
}

pub fn cart_service(products: Vec<Product>) -> (Arc<MemoryProductStore>, CartService) {
    let product_store = Arc::new(MemoryProductStore::new(products));
    let cart = CartService::new(
        Arc::new(MemoryCartStore::default()),
        product_store.clone(),
    );
    (product_store, cart)
}

pub fn frame_and_cloth() -> (Product, Product) {
    (
        Product::new("Round frame", "Acetate round frame", "frames", 10_000, 10),
        Product::new("Lens cloth", "Microfiber cloth", "accessories", 5_000, 5),
    )
}

pub fn place_request(items: Vec<(Uuid, i32)>) -> PlaceOrder {
    PlaceOrder {
        items: items
            .into_iter()
            .map(|(product_id, quantity)| OrderItemRequest {
                product_id,
                quantity,
            })
            .collect(),
        shipping: ShippingRequest {
            full_name: "Nguyen Van A".into(),
            address: "1 Tran Phu, Da Nang".into(),
            email: "a@example.com".into(),
            phone: "0905123456".into(),
        },
        shipping_fee: 0,
        discount: 0,
        payment_method: "COD".into(),
    }
}
