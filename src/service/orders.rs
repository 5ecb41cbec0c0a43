//! Order orchestration: placement with stock adjustment, lifecycle updates,
//! and invoice staging.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Actor, Capability};
use crate::domain::order::{
    LineItem, Order, OrderAmounts, OrderStatus, PaymentMethod, ShippingInfo,
};
use crate::error::{AppError, Result};
use crate::events::{EventPublisher, OrderEvent};
use crate::invoice::{self, InvoiceAssets};
use crate::store::{OrderStore, ProductStore, StockAdjust};

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrder {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    #[validate]
    pub shipping: ShippingRequest,
    #[validate(range(min = 0, message = "shipping fee must be non-negative"))]
    pub shipping_fee: i64,
    #[validate(range(min = 0, message = "discount must be non-negative"))]
    pub discount: i64,
    pub payment_method: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingRequest {
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(email(message = "email must be valid"))]
    pub email: String,
    pub phone: String,
}

pub struct OrderFilter<'a> {
    pub name_search: Option<&'a str>,
    pub status: Option<OrderStatus>,
}

pub struct InvoiceConfig {
    pub staging_dir: PathBuf,
    pub assets: InvoiceAssets,
}

#[derive(Debug)]
pub struct InvoiceDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    events: EventPublisher,
    invoice: InvoiceConfig,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        events: EventPublisher,
        invoice: InvoiceConfig,
    ) -> Self {
        Self {
            orders,
            products,
            events,
            invoice,
        }
    }

    /// Validates the request, snapshots catalog name/price per item,
    /// decrements stock and persists the order. Stock decrements are
    /// compensated if any later step fails, so a rejected placement leaves
    /// no trace.
    pub async fn place_order(&self, request: PlaceOrder, actor: &Actor) -> Result<Order> {
        request.validate()?;
        let payment_method = request.payment_method.parse::<PaymentMethod>()?;

        let mut line_items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            if item.quantity < 1 {
                return Err(AppError::validation("items", "quantity must be at least 1"));
            }
            let product = self
                .products
                .find(item.product_id)
                .await?
                .ok_or(AppError::NotFound("product"))?;
            line_items.push(LineItem {
                product_id: product.id,
                product_name: product.name,
                unit_price: product.unit_price,
                quantity: item.quantity,
            });
        }

        let sub_total: i64 = line_items.iter().map(LineItem::line_total).sum();
        let amounts = OrderAmounts {
            shipping_fee: request.shipping_fee,
            sub_total,
            discount: request.discount,
            total: sub_total - request.discount + request.shipping_fee,
        };
        let shipping = ShippingInfo {
            full_name: request.shipping.full_name,
            address: request.shipping.address,
            email: request.shipping.email,
            phone: request.shipping.phone,
        };
        let order = Order::create(
            actor.user_id,
            line_items,
            shipping,
            amounts,
            payment_method,
            &actor.audit_label(),
        )?;

        let mut applied: Vec<(Uuid, i32)> = Vec::with_capacity(order.line_items().len());
        for item in order.line_items() {
            match self.products.adjust_stock(item.product_id, -item.quantity).await {
                Ok(StockAdjust::Applied) => applied.push((item.product_id, item.quantity)),
                Ok(StockAdjust::Insufficient) => {
                    self.restock(&applied).await;
                    return Err(AppError::InsufficientStock {
                        product_id: item.product_id,
                    });
                }
                Ok(StockAdjust::Missing) => {
                    self.restock(&applied).await;
                    return Err(AppError::NotFound("product"));
                }
                Err(err) => {
                    self.restock(&applied).await;
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.orders.insert(&order).await {
            self.restock(&applied).await;
            return Err(err);
        }

        info!(order_id = %order.id(), total = order.amounts().total, "order placed");
        self.events
            .publish(OrderEvent::Created {
                order_id: order.id(),
                total: order.amounts().total,
            })
            .await;
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid, actor: &Actor) -> Result<Order> {
        let order = self.orders.find(id).await?.ok_or(AppError::NotFound("order"))?;
        if !self.can_view(actor, &order) {
            return Err(AppError::Forbidden);
        }
        Ok(order)
    }

    pub async fn list_orders(
        &self,
        page: u32,
        per_page: u32,
        filter: OrderFilter<'_>,
        actor: &Actor,
    ) -> Result<(Vec<Order>, i64)> {
        actor.require(Capability::ManageOrders)?;
        self.orders
            .list(page, per_page, filter.name_search, filter.status)
            .await
    }

    pub async fn history_for_user(&self, user_id: Uuid, actor: &Actor) -> Result<Vec<Order>> {
        if actor.user_id != Some(user_id) {
            actor.require(Capability::ManageOrders)?;
        }
        self.orders.find_by_owner(user_id).await
    }

    /// Any status in the enumerated set is accepted from any current status;
    /// the value is checked before the order is touched.
    pub async fn update_status(&self, id: Uuid, status: &str, actor: &Actor) -> Result<Order> {
        actor.require(Capability::ManageOrders)?;
        let status = status.parse::<OrderStatus>()?;
        let mut order = self.orders.find(id).await?.ok_or(AppError::NotFound("order"))?;
        order.record_status(status, &actor.audit_label());
        if !self.orders.update_status_history(&order).await? {
            return Err(AppError::NotFound("order"));
        }
        self.events
            .publish(OrderEvent::StatusChanged {
                order_id: order.id(),
                status,
            })
            .await;
        Ok(order)
    }

    /// Hard delete. Stock is not restored; placement decrements are never
    /// reversed after the order exists.
    pub async fn delete_order(&self, id: Uuid, actor: &Actor) -> Result<()> {
        actor.require(Capability::ManageOrders)?;
        if !self.orders.delete(id).await? {
            return Err(AppError::NotFound("order"));
        }
        self.events.publish(OrderEvent::Deleted { order_id: id }).await;
        Ok(())
    }

    /// Renders the invoice and stages it through a temp file that is removed
    /// when the guard drops, whether or not the transfer succeeds.
    /// Authorization runs before any rendering, so a forbidden request
    /// creates no artifact.
    pub async fn invoice(&self, id: Uuid, actor: &Actor) -> Result<InvoiceDownload> {
        let order = self.orders.find(id).await?.ok_or(AppError::NotFound("order"))?;
        if !self.can_view(actor, &order) {
            return Err(AppError::Forbidden);
        }
        let bytes = invoice::render(&order, &self.invoice.assets)?;
        let bytes = self.stage(&bytes, id)?;
        Ok(InvoiceDownload {
            file_name: format!("invoice-{id}.pdf"),
            bytes,
        })
    }

    fn stage(&self, bytes: &[u8], id: Uuid) -> Result<Vec<u8>> {
        std::fs::create_dir_all(&self.invoice.staging_dir)?;
        let mut staged = tempfile::Builder::new()
            .prefix(&format!("invoice-{id}-"))
            .suffix(".pdf")
            .tempfile_in(&self.invoice.staging_dir)?;
        staged.write_all(bytes)?;
        staged.flush()?;
        let content = std::fs::read(staged.path())?;
        // `staged` drops here and unlinks the artifact.
        Ok(content)
    }

    fn can_view(&self, actor: &Actor, order: &Order) -> bool {
        if actor.has(Capability::ManageOrders) {
            return true;
        }
        // Guest-placed orders have no owner to match against.
        actor.user_id.is_some() && actor.user_id == order.owner_user_id()
    }

    async fn restock(&self, applied: &[(Uuid, i32)]) {
        for (product_id, quantity) in applied {
            if let Err(err) = self.products.adjust_stock(*product_id, *quantity).await {
                error!(
                    %product_id,
                    quantity = *quantity,
                    error = %err,
                    "failed to restore stock after aborted placement"
                );
            }
        }
    }
}
