//! Order aggregate: line items, shipping snapshot, amounts, status and the
//! append-only transaction history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    Cod,
    Banking,
    Momo,
    ZaloPay,
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "COD" => Ok(Self::Cod),
            "Banking" => Ok(Self::Banking),
            "Momo" => Ok(Self::Momo),
            "ZaloPay" => Ok(Self::ZaloPay),
            _ => Err(AppError::validation(
                "payment_method",
                "must be one of COD, Banking, Momo, ZaloPay",
            )),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cod => write!(f, "COD"),
            Self::Banking => write!(f, "Banking"),
            Self::Momo => write!(f, "Momo"),
            Self::ZaloPay => write!(f, "ZaloPay"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivering,
    Finished,
    Cancelled,
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Delivering" => Ok(Self::Delivering),
            "Finished" => Ok(Self::Finished),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::validation(
                "status",
                "must be one of Pending, Processing, Delivering, Finished, Cancelled",
            )),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Delivering => write!(f, "Delivering"),
            Self::Finished => write!(f, "Finished"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Catalog snapshot taken at placement; a new order is required to change
/// composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

/// All amounts in whole VND.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmounts {
    pub shipping_fee: i64,
    pub sub_total: i64,
    pub discount: i64,
    pub total: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    CreateOrder,
    UpdateStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub action: HistoryAction,
    pub actor: String,
    pub details: serde_json::Value,
    pub status_at_time: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: Uuid,
    owner_user_id: Option<Uuid>,
    customer_name: String,
    line_items: Vec<LineItem>,
    shipping: ShippingInfo,
    amounts: OrderAmounts,
    payment_method: PaymentMethod,
    status: OrderStatus,
    transaction_history: Vec<TransactionEntry>,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Validates the creation invariants and seeds the transaction history
    /// with the `CREATE_ORDER` entry.
    pub fn create(
        owner_user_id: Option<Uuid>,
        line_items: Vec<LineItem>,
        shipping: ShippingInfo,
        amounts: OrderAmounts,
        payment_method: PaymentMethod,
        actor_label: &str,
    ) -> Result<Self> {
        if line_items.is_empty() {
            return Err(AppError::validation(
                "items",
                "order must contain at least one item",
            ));
        }
        if line_items.iter().any(|item| item.quantity < 1) {
            return Err(AppError::validation("items", "quantity must be at least 1"));
        }
        if shipping.full_name.trim().is_empty() {
            return Err(AppError::validation("full_name", "full name is required"));
        }
        if shipping.address.trim().is_empty() {
            return Err(AppError::validation("address", "address is required"));
        }
        if amounts.shipping_fee < 0
            || amounts.sub_total < 0
            || amounts.discount < 0
            || amounts.total < 0
        {
            return Err(AppError::validation(
                "amounts",
                "amounts must be non-negative",
            ));
        }
        let line_total: i64 = line_items.iter().map(LineItem::line_total).sum();
        if amounts.sub_total != line_total {
            return Err(AppError::validation(
                "amounts",
                "sub total must equal the sum of line totals",
            ));
        }
        if amounts.total != amounts.sub_total - amounts.discount + amounts.shipping_fee {
            return Err(AppError::validation(
                "amounts",
                "total must equal sub total - discount + shipping fee",
            ));
        }

        let customer_name = shipping.full_name.clone();
        Ok(Self {
            id: Uuid::now_v7(),
            owner_user_id,
            customer_name,
            line_items,
            shipping,
            amounts,
            payment_method,
            status: OrderStatus::Pending,
            transaction_history: vec![TransactionEntry {
                action: HistoryAction::CreateOrder,
                actor: actor_label.to_string(),
                details: json!({ "created_by": actor_label }),
                status_at_time: OrderStatus::Pending,
                timestamp: Utc::now(),
            }],
            created_at: Utc::now(),
        })
    }

    /// Hydration from storage; invariants were checked at creation.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        owner_user_id: Option<Uuid>,
        customer_name: String,
        line_items: Vec<LineItem>,
        shipping: ShippingInfo,
        amounts: OrderAmounts,
        payment_method: PaymentMethod,
        status: OrderStatus,
        transaction_history: Vec<TransactionEntry>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_user_id,
            customer_name,
            line_items,
            shipping,
            amounts,
            payment_method,
            status,
            transaction_history,
            created_at,
        }
    }

    /// Any status value in the enumerated set is accepted from any current
    /// status; each call appends exactly one history entry.
    pub fn record_status(&mut self, status: OrderStatus, actor_label: &str) {
        let previous = self.status;
        self.status = status;
        self.transaction_history.push(TransactionEntry {
            action: HistoryAction::UpdateStatus,
            actor: actor_label.to_string(),
            details: json!({ "updated_by": actor_label, "from": previous.to_string() }),
            status_at_time: status,
            timestamp: Utc::now(),
        });
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_user_id(&self) -> Option<Uuid> {
        self.owner_user_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    pub fn amounts(&self) -> OrderAmounts {
        self.amounts
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn transaction_history(&self) -> &[TransactionEntry] {
        &self.transaction_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Tran Thi B".into(),
            address: "12 Hang Bac, Hanoi".into(),
            email: "b@example.com".into(),
            phone: "0901234567".into(),
        }
    }

    fn items() -> Vec<LineItem> {
        vec![
            LineItem {
                product_id: Uuid::new_v4(),
                product_name: "Round frame".into(),
                unit_price: 10_000,
                quantity: 2,
            },
            LineItem {
                product_id: Uuid::new_v4(),
                product_name: "Lens cloth".into(),
                unit_price: 5_000,
                quantity: 1,
            },
        ]
    }

    fn amounts() -> OrderAmounts {
        OrderAmounts {
            shipping_fee: 2_000,
            sub_total: 25_000,
            discount: 1_000,
            total: 26_000,
        }
    }

    #[test]
    fn creation_starts_pending_with_one_history_entry() {
        let order = Order::create(
            None,
            items(),
            shipping(),
            amounts(),
            PaymentMethod::Cod,
            "Guest",
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.transaction_history().len(), 1);
        let entry = &order.transaction_history()[0];
        assert_eq!(entry.action, HistoryAction::CreateOrder);
        assert_eq!(entry.actor, "Guest");
        assert_eq!(entry.status_at_time, OrderStatus::Pending);
        assert_eq!(order.customer_name(), "Tran Thi B");
    }

    #[test]
    fn creation_rejects_empty_line_items() {
        let err = Order::create(
            None,
            vec![],
            shipping(),
            amounts(),
            PaymentMethod::Cod,
            "Guest",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "items"));
    }

    #[test]
    fn creation_rejects_blank_shipping_name() {
        let mut ship = shipping();
        ship.full_name = "  ".into();
        let err = Order::create(None, items(), ship, amounts(), PaymentMethod::Cod, "Guest")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "full_name"));
    }

    #[test]
    fn creation_rejects_unreconciled_total() {
        let mut bad = amounts();
        bad.total += 1;
        let err = Order::create(None, items(), shipping(), bad, PaymentMethod::Cod, "Guest")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "amounts"));
    }

    #[test]
    fn creation_rejects_sub_total_mismatch() {
        let mut bad = amounts();
        bad.sub_total += 500;
        bad.total += 500;
        let err = Order::create(None, items(), shipping(), bad, PaymentMethod::Cod, "Guest")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "amounts"));
    }

    #[test]
    fn record_status_appends_exactly_one_entry() {
        let mut order = Order::create(
            None,
            items(),
            shipping(),
            amounts(),
            PaymentMethod::Banking,
            "Guest",
        )
        .unwrap();
        order.record_status(OrderStatus::Delivering, "admin-1");
        assert_eq!(order.status(), OrderStatus::Delivering);
        assert_eq!(order.transaction_history().len(), 2);
        let entry = order.transaction_history().last().unwrap();
        assert_eq!(entry.action, HistoryAction::UpdateStatus);
        assert_eq!(entry.status_at_time, OrderStatus::Delivering);
        assert_eq!(entry.details["from"], "Pending");
    }

    #[test]
    fn payment_method_round_trips_wire_spelling() {
        for s in ["COD", "Banking", "Momo", "ZaloPay"] {
            assert_eq!(s.parse::<PaymentMethod>().unwrap().to_string(), s);
        }
        assert!("Paypal".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn status_rejects_values_outside_the_set() {
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert!("pending".parse::<OrderStatus>().is_err());
    }
}
