//! Wire format of the Quickbite backend.
//!
//! The backend speaks camelCase JSON envelopes with a `success` flag and an
//! optional `responseMessage`. These types stay private to the gateway; the
//! conversion functions hand out the clean domain types from
//! `quickbite-core`.

use std::collections::HashSet;

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quickbite_core::{
    CartLine, CartLineId, DeliveryPerson, DeliveryPersonId, FoodId, FoodSnapshot, Order, OrderId,
    OrderStatus, Price, UserId,
};

// =============================================================================
// Response Envelopes
// =============================================================================

/// Bare acknowledgement envelope (update/delete/status calls).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ack {
    pub success: bool,
    #[serde(default)]
    pub response_message: Option<String>,
}

/// `GET /api/cart/fetch` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartFetchResponse {
    pub success: bool,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub carts: Vec<WireCartEntry>,
}

/// `POST /api/cart/add` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartResponse {
    pub success: bool,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub cart_id: Option<CartLineId>,
}

/// `GET /api/order/fetch/*` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderFetchResponse {
    pub success: bool,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub orders: Vec<WireOrder>,
}

/// `POST /api/order/add` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

// =============================================================================
// Wire Records
// =============================================================================

/// Catalog item as sent by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireFood {
    pub id: FoodId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image1: Option<String>,
}

impl From<WireFood> for FoodSnapshot {
    fn from(food: WireFood) -> Self {
        Self {
            id: food.id,
            name: food.name,
            price: food.price,
            description: food.description,
            image_ref: food.image1,
        }
    }
}

/// One cart entry as sent by the backend; `id` is the cart line identity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCartEntry {
    pub id: CartLineId,
    pub food: WireFood,
    pub quantity: u32,
    #[serde(with = "ts_milliseconds")]
    pub added_time: DateTime<Utc>,
}

/// Delivery agent contact card as sent by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDeliveryPerson {
    #[serde(default)]
    pub id: Option<DeliveryPersonId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_no: Option<String>,
}

/// One order as sent by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(with = "ts_milliseconds")]
    pub order_time: DateTime<Utc>,
    pub food: WireFood,
    pub quantity: u32,
    #[serde(default)]
    pub delivery_person: Option<WireDeliveryPerson>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
}

// =============================================================================
// Request Bodies
// =============================================================================

/// `POST /api/cart/add` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartRequest {
    pub user_id: UserId,
    pub food_id: FoodId,
    pub quantity: u32,
}

/// `PUT /api/cart/update` body; `id` is the cart line identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateCartRequest {
    pub id: CartLineId,
    pub user_id: UserId,
    pub quantity: u32,
}

/// `DELETE /api/cart/delete` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteCartRequest {
    pub id: CartLineId,
    pub user_id: UserId,
}

/// Card details inside the order-create body. Built from `PaymentCard` at
/// request-construction time; never logged.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardDetails {
    pub card_name: String,
    pub card_number: String,
    pub valid_through: String,
    pub cvv: String,
}

/// One line of the cart contents snapshot inside the order-create body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderLineItem {
    pub cart_id: CartLineId,
    pub food_id: FoodId,
    pub quantity: u32,
}

impl From<&CartLine> for OrderLineItem {
    fn from(line: &CartLine) -> Self {
        Self {
            cart_id: line.cart_id,
            food_id: line.food_id,
            quantity: line.quantity,
        }
    }
}

/// `POST /api/order/add` body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderRequest {
    pub card_details: CardDetails,
    pub amount: Price,
    pub cart_lines: Vec<OrderLineItem>,
}

/// `PUT /api/order/update/delivery-status` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateDeliveryStatusRequest {
    pub order_id: OrderId,
    pub delivery_person_id: UserId,
    pub status: OrderStatus,
    pub delivery_date: String,
    pub delivery_time: String,
}

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn convert_cart_entry(entry: WireCartEntry) -> CartLine {
    CartLine {
        cart_id: entry.id,
        food_id: entry.food.id,
        food: entry.food.into(),
        quantity: entry.quantity,
        added_time: entry.added_time,
    }
}

/// Convert a fetched cart, enforcing cart line ID uniqueness.
///
/// Duplicate IDs would make quantity updates ambiguous, so later duplicates
/// are dropped with a warning.
pub(crate) fn convert_cart(entries: Vec<WireCartEntry>) -> Vec<CartLine> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            if seen.insert(entry.id) {
                true
            } else {
                tracing::warn!(cart_id = %entry.id, "Dropping duplicate cart line from server");
                false
            }
        })
        .map(convert_cart_entry)
        .collect()
}

pub(crate) fn convert_order(order: WireOrder) -> Order {
    Order {
        order_id: order.order_id,
        status: order.status,
        order_time: order.order_time,
        food: order.food.into(),
        quantity: order.quantity,
        delivery_person: order.delivery_person.map(|person| DeliveryPerson {
            id: person.id,
            name: person.name,
            phone_no: person.phone_no,
        }),
        delivery_date: order.delivery_date,
        delivery_time: order.delivery_time,
    }
}

pub(crate) fn convert_orders(orders: Vec<WireOrder>) -> Vec<Order> {
    orders.into_iter().map(convert_order).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_cart_fetch_response() {
        let json = r#"{
            "success": true,
            "carts": [
                {
                    "id": 5,
                    "food": {
                        "id": 7,
                        "name": "Margherita",
                        "price": 120,
                        "description": "Tomato and mozzarella",
                        "image1": "margherita.png"
                    },
                    "quantity": 2,
                    "addedTime": 1700000000000
                }
            ]
        }"#;

        let response: CartFetchResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        let lines = convert_cart(response.carts);
        assert_eq!(lines.len(), 1);

        let line = lines.first().unwrap();
        assert_eq!(line.cart_id, CartLineId::new(5));
        assert_eq!(line.food_id, FoodId::new(7));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.food.image_ref.as_deref(), Some("margherita.png"));
        assert_eq!(line.added_time.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_convert_cart_drops_duplicate_ids() {
        let json = r#"{
            "success": true,
            "carts": [
                {"id": 5, "food": {"id": 1, "name": "A", "price": 10}, "quantity": 1, "addedTime": 0},
                {"id": 5, "food": {"id": 2, "name": "B", "price": 20}, "quantity": 3, "addedTime": 0}
            ]
        }"#;

        let response: CartFetchResponse = serde_json::from_str(json).unwrap();
        let lines = convert_cart(response.carts);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().food_id, FoodId::new(1));
    }

    #[test]
    fn test_decode_order_fetch_response() {
        let json = r#"{
            "success": true,
            "orders": [
                {
                    "orderId": 31,
                    "status": "Processing",
                    "orderTime": 1700000500000,
                    "food": {"id": 7, "name": "Margherita", "price": 120},
                    "quantity": 2,
                    "deliveryPerson": {"id": 4, "phoneNo": "+700000000"},
                    "deliveryDate": null,
                    "deliveryTime": null
                }
            ]
        }"#;

        let response: OrderFetchResponse = serde_json::from_str(json).unwrap();
        let orders = convert_orders(response.orders);
        assert_eq!(orders.len(), 1);

        let order = orders.first().unwrap();
        assert_eq!(order.order_id, OrderId::new(31));
        assert_eq!(order.status, OrderStatus::Processing);
        let person = order.delivery_person.as_ref().unwrap();
        assert_eq!(person.id, Some(DeliveryPersonId::new(4)));
        assert_eq!(person.phone_no.as_deref(), Some("+700000000"));
        assert!(order.delivery_date.is_none());
    }

    #[test]
    fn test_decode_ack_without_message() {
        let ack: Ack = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!ack.success);
        assert!(ack.response_message.is_none());
    }

    #[test]
    fn test_requests_serialize_camel_case() {
        let body = serde_json::to_value(AddCartRequest {
            user_id: UserId::new(3),
            food_id: FoodId::new(7),
            quantity: 2,
        })
        .unwrap();
        assert_eq!(body["userId"], 3);
        assert_eq!(body["foodId"], 7);
        assert_eq!(body["quantity"], 2);

        let body = serde_json::to_value(UpdateDeliveryStatusRequest {
            order_id: OrderId::new(31),
            delivery_person_id: UserId::new(4),
            status: OrderStatus::Delivered,
            delivery_date: "2024-11-14".to_string(),
            delivery_time: "18:05".to_string(),
        })
        .unwrap();
        assert_eq!(body["orderId"], 31);
        assert_eq!(body["deliveryPersonId"], 4);
        assert_eq!(body["status"], "Delivered");
        assert_eq!(body["deliveryDate"], "2024-11-14");
    }
}
