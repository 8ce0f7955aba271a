//! Remote gateways for the cart and order services.
//!
//! # Architecture
//!
//! - Gateways are a pure request/response boundary: typed parameters in,
//!   success payload or classified [`ApiError`] out. No retries - retry and
//!   reconciliation policy belongs to the synchronizers.
//! - Every call takes the current [`Identity`] explicitly and attaches its
//!   bearer token per request. A call attempted without a token fails with
//!   [`ApiError::Unauthenticated`] before any network I/O.
//! - The traits are the seam that lets synchronizers be exercised against
//!   in-memory gateways in tests; [`HttpGateway`] is the production
//!   implementation.

mod http;
pub(crate) mod wire;

pub use http::HttpGateway;

use std::future::Future;

use chrono::{DateTime, Utc};

use quickbite_core::{
    CartLine, CartLineId, FoodId, Identity, Order, OrderId, OrderStatus, PaymentCard, Price,
};

use crate::error::Result;

/// Remote boundary for the four cart operations.
pub trait CartGateway: Send + Sync {
    /// Fetch the authoritative cart for the identity's user.
    fn fetch_cart(&self, identity: &Identity) -> impl Future<Output = Result<Vec<CartLine>>> + Send;

    /// Add `quantity` units of a catalog item; returns the server-issued
    /// cart line ID.
    fn add_cart_line(
        &self,
        identity: &Identity,
        food_id: FoodId,
        quantity: u32,
    ) -> impl Future<Output = Result<CartLineId>> + Send;

    /// Set the quantity of an existing cart line.
    fn update_cart_line(
        &self,
        identity: &Identity,
        cart_id: CartLineId,
        quantity: u32,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a cart line.
    fn delete_cart_line(
        &self,
        identity: &Identity,
        cart_id: CartLineId,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Remote boundary for order fetching, creation, and delivery updates.
pub trait OrderGateway: Send + Sync {
    /// Fetch all orders placed by the identity's user.
    fn fetch_orders_for_user(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Fetch all orders assigned to the identity's user as delivery agent.
    fn fetch_orders_for_delivery_agent(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Submit the checkout transaction: payment details, the charged
    /// amount, and the cart contents snapshot the server prices
    /// authoritatively. Returns the server-issued order ID.
    fn create_order(
        &self,
        identity: &Identity,
        payment: &PaymentCard,
        amount: Price,
        lines: &[CartLine],
    ) -> impl Future<Output = Result<OrderId>> + Send;

    /// Update the delivery status of an order on behalf of the identity's
    /// user as delivery agent, stamped with the client-computed `timestamp`.
    fn update_delivery_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;
}
