//! Cart line records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::food::FoodSnapshot;
use super::id::{CartLineId, FoodId};
use super::price::Price;

/// A line item in the cart.
///
/// `cart_id` is the server-issued identity of the line and is unique within
/// a cart snapshot. `quantity` is always at least 1; reducing it to zero is
/// a removal, not an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Server-issued identity of this cart line.
    pub cart_id: CartLineId,
    /// Catalog ID of the item in this line.
    pub food_id: FoodId,
    /// Catalog snapshot embedded at add time.
    pub food: FoodSnapshot,
    /// Number of units. Always positive.
    pub quantity: u32,
    /// When the line was added, as reported by the server.
    pub added_time: DateTime<Utc>,
}

impl CartLine {
    /// Line total (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.food.price.times(self.quantity)
    }
}
