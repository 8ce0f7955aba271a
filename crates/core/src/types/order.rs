//! Order records and status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::food::FoodSnapshot;
use super::id::{DeliveryPersonId, OrderId};
use super::price::Price;

/// Lifecycle status of an order.
///
/// Orders are immutable from the client's perspective except for status
/// transitions driven by the delivery role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, waiting for a delivery agent to accept it.
    #[default]
    Pending,
    /// Accepted and being prepared or carried.
    Processing,
    /// Handed over to the customer.
    Delivered,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Contact card of the delivery agent assigned to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeliveryPerson {
    /// Agent ID, when the server exposes it.
    pub id: Option<DeliveryPersonId>,
    /// Display name.
    pub name: Option<String>,
    /// Phone number shown to the customer while the order is en route.
    pub phone_no: Option<String>,
}

/// A placed order as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Server-issued order identity.
    pub order_id: OrderId,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub order_time: DateTime<Utc>,
    /// Catalog snapshot of the ordered item.
    pub food: FoodSnapshot,
    /// Number of units ordered.
    pub quantity: u32,
    /// Assigned delivery agent, once one accepted the order.
    pub delivery_person: Option<DeliveryPerson>,
    /// Delivery date stamped by the agent on completion (`YYYY-MM-DD`).
    pub delivery_date: Option<String>,
    /// Delivery time stamped by the agent on completion (`HH:MM`).
    pub delivery_time: Option<String>,
}

impl Order {
    /// Order total (`price × quantity`).
    #[must_use]
    pub fn total(&self) -> Price {
        self.food.price.times(self.quantity)
    }
}
