//! Optional order lifecycle events over NATS. Publishing is best-effort:
//! failures are logged, never propagated into the request path.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::OrderStatus;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, total: i64 },
    StatusChanged { order_id: Uuid, status: OrderStatus },
    Deleted { order_id: Uuid },
}

impl OrderEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "orders.created",
            Self::StatusChanged { .. } => "orders.status_changed",
            Self::Deleted { .. } => "orders.deleted",
        }
    }
}

#[derive(Clone, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(client: Option<async_nats::Client>) -> Self {
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub async fn publish(&self, event: OrderEvent) {
        let Some(client) = &self.client else {
            return;
        };
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(err) = client.publish(event.subject().to_string(), payload.into()).await
                {
                    tracing::warn!(subject = event.subject(), error = %err, "event publish failed");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "event serialization failed");
            }
        }
    }
}
