//! Integration tests for the Quickbite client core.
//!
//! The synchronizers and the checkout coordinator are exercised against
//! [`MockKitchen`], an in-memory implementation of both gateway traits that
//! behaves like the backend: it owns the server-side cart and order state,
//! issues cart line and order IDs, and can be scripted to fail or stall
//! specific operations.
//!
//! # Test Categories
//!
//! - `cart_sync` - Optimistic mutation, reconciliation, identity changes
//! - `order_sync` - Role-keyed refresh, delivery status transitions
//! - `checkout` - The cart → payment → order transaction
//!
//! Everything runs in-process; no network, no live backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use quickbite_client::error::{ApiError, Result};
use quickbite_client::gateway::{CartGateway, OrderGateway};
use quickbite_core::{
    CartLine, CartLineId, DeliveryPerson, DeliveryPersonId, FoodId, FoodSnapshot, Identity, Order,
    OrderId, OrderStatus, PaymentCard, Price, Role, UserId,
};

/// Build a catalog item for tests.
#[must_use]
pub fn food(id: i64, name: &str, price: i64) -> FoodSnapshot {
    FoodSnapshot {
        id: FoodId::new(id),
        name: name.to_string(),
        price: Price::from(price),
        description: None,
        image_ref: None,
    }
}

/// Build a customer identity carrying a token.
#[must_use]
pub fn customer(user_id: i64) -> Identity {
    Identity::new(UserId::new(user_id), Role::Customer, format!("token-{user_id}"))
}

/// Build a delivery-agent identity carrying a token.
#[must_use]
pub fn delivery_agent(user_id: i64) -> Identity {
    Identity::new(
        UserId::new(user_id),
        Role::DeliveryAgent,
        format!("token-{user_id}"),
    )
}

/// Build card details for checkout tests.
#[must_use]
pub fn test_card() -> PaymentCard {
    PaymentCard::new("Test Customer", "4111111111111111", "12/27", "123")
}

#[derive(Default)]
struct KitchenState {
    menu: HashMap<FoodId, FoodSnapshot>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: Vec<(UserId, Order)>,
    next_cart_id: i64,
    next_order_id: i64,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    stalls: HashMap<&'static str, Duration>,
    call_log: Vec<&'static str>,
    last_order_amount: Option<Price>,
    last_delivery_timestamp: Option<DateTime<Utc>>,
}

/// In-memory backend implementing both gateway traits.
///
/// Behaves like the server the synchronizers reconcile against: it owns the
/// authoritative cart and order state and issues entity IDs. Failures and
/// stalls can be scripted per operation; every authenticated call is
/// recorded in an ordered log.
#[derive(Default)]
pub struct MockKitchen {
    state: Mutex<KitchenState>,
}

impl MockKitchen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, KitchenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a catalog item orderable.
    pub fn seed_menu(&self, item: FoodSnapshot) {
        self.lock().menu.insert(item.id, item);
    }

    /// Put a line into a user's server-side cart; returns its ID.
    pub fn seed_cart_line(&self, user_id: UserId, item: &FoodSnapshot, quantity: u32) -> CartLineId {
        let mut state = self.lock();
        state.next_cart_id += 1;
        let cart_id = CartLineId::new(state.next_cart_id);
        state.carts.entry(user_id).or_default().push(CartLine {
            cart_id,
            food_id: item.id,
            food: item.clone(),
            quantity,
            added_time: Utc::now(),
        });
        cart_id
    }

    /// Put an order into the server-side order list.
    pub fn seed_order(&self, user_id: UserId, order: Order) {
        self.lock().orders.push((user_id, order));
    }

    /// Script the next call of `op` to fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Make every call of `op` sleep before answering.
    pub fn stall(&self, op: &'static str, duration: Duration) {
        self.lock().stalls.insert(op, duration);
    }

    /// How many times `op` was called (token-missing calls never reach the
    /// network and are not counted).
    #[must_use]
    pub fn calls(&self, op: &'static str) -> usize {
        self.lock().call_log.iter().filter(|&logged| *logged == op).count()
    }

    /// The ordered log of all answered operations.
    #[must_use]
    pub fn call_log(&self) -> Vec<&'static str> {
        self.lock().call_log.clone()
    }

    /// The server's current cart for a user.
    #[must_use]
    pub fn server_cart(&self, user_id: UserId) -> Vec<CartLine> {
        self.lock().carts.get(&user_id).cloned().unwrap_or_default()
    }

    /// The server's current orders placed by a user.
    #[must_use]
    pub fn server_orders(&self, user_id: UserId) -> Vec<Order> {
        self.lock()
            .orders
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, order)| order.clone())
            .collect()
    }

    /// The amount submitted with the last order-create request.
    #[must_use]
    pub fn last_order_amount(&self) -> Option<Price> {
        self.lock().last_order_amount
    }

    /// The client-computed timestamp of the last delivery status update.
    #[must_use]
    pub fn last_delivery_timestamp(&self) -> Option<DateTime<Utc>> {
        self.lock().last_delivery_timestamp
    }

    /// Shared prologue: reject token-less calls before "the network", then
    /// stall if scripted, log the call, and pop any scripted failure.
    async fn begin(&self, op: &'static str, identity: &Identity) -> Result<()> {
        if identity.token().is_none() {
            return Err(ApiError::Unauthenticated);
        }

        let stall = self.lock().stalls.get(op).copied();
        if let Some(duration) = stall {
            tokio::time::sleep(duration).await;
        }

        let mut state = self.lock();
        state.call_log.push(op);
        if let Some(err) = state.failures.get_mut(op).and_then(|queue| queue.pop_front()) {
            return Err(err);
        }
        Ok(())
    }
}

impl CartGateway for MockKitchen {
    async fn fetch_cart(&self, identity: &Identity) -> Result<Vec<CartLine>> {
        self.begin("fetch_cart", identity).await?;
        Ok(self.server_cart(identity.user_id))
    }

    async fn add_cart_line(
        &self,
        identity: &Identity,
        food_id: FoodId,
        quantity: u32,
    ) -> Result<CartLineId> {
        self.begin("add_cart_line", identity).await?;

        let mut state = self.lock();
        let item = state
            .menu
            .get(&food_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("food {food_id}")))?;

        state.next_cart_id += 1;
        let cart_id = CartLineId::new(state.next_cart_id);
        state.carts.entry(identity.user_id).or_default().push(CartLine {
            cart_id,
            food_id,
            food: item,
            quantity,
            added_time: Utc::now(),
        });
        Ok(cart_id)
    }

    async fn update_cart_line(
        &self,
        identity: &Identity,
        cart_id: CartLineId,
        quantity: u32,
    ) -> Result<()> {
        self.begin("update_cart_line", identity).await?;

        let mut state = self.lock();
        let line = state
            .carts
            .entry(identity.user_id)
            .or_default()
            .iter_mut()
            .find(|line| line.cart_id == cart_id)
            .ok_or_else(|| ApiError::NotFound(format!("cart line {cart_id}")))?;
        line.quantity = quantity;
        Ok(())
    }

    async fn delete_cart_line(&self, identity: &Identity, cart_id: CartLineId) -> Result<()> {
        self.begin("delete_cart_line", identity).await?;

        let mut state = self.lock();
        let cart = state.carts.entry(identity.user_id).or_default();
        let before = cart.len();
        cart.retain(|line| line.cart_id != cart_id);
        if cart.len() == before {
            return Err(ApiError::NotFound(format!("cart line {cart_id}")));
        }
        Ok(())
    }
}

impl OrderGateway for MockKitchen {
    async fn fetch_orders_for_user(&self, identity: &Identity) -> Result<Vec<Order>> {
        self.begin("fetch_orders_for_user", identity).await?;
        Ok(self.server_orders(identity.user_id))
    }

    async fn fetch_orders_for_delivery_agent(&self, identity: &Identity) -> Result<Vec<Order>> {
        self.begin("fetch_orders_for_delivery_agent", identity).await?;

        let agent_id = DeliveryPersonId::new(identity.user_id.as_i64());
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|(_, order)| {
                order
                    .delivery_person
                    .as_ref()
                    .is_some_and(|person| person.id == Some(agent_id))
            })
            .map(|(_, order)| order.clone())
            .collect())
    }

    async fn create_order(
        &self,
        identity: &Identity,
        _payment: &PaymentCard,
        amount: Price,
        _lines: &[CartLine],
    ) -> Result<OrderId> {
        self.begin("create_order", identity).await?;

        let mut state = self.lock();
        state.last_order_amount = Some(amount);

        // The server turns each cart line into one order and empties the cart.
        let lines = state.carts.remove(&identity.user_id).unwrap_or_default();
        if lines.is_empty() {
            return Err(ApiError::rejected("cart is empty"));
        }

        let mut first_order_id = None;
        for line in lines {
            state.next_order_id += 1;
            let order_id = OrderId::new(state.next_order_id);
            first_order_id.get_or_insert(order_id);
            state.orders.push((
                identity.user_id,
                Order {
                    order_id,
                    status: OrderStatus::Pending,
                    order_time: Utc::now(),
                    food: line.food,
                    quantity: line.quantity,
                    delivery_person: None,
                    delivery_date: None,
                    delivery_time: None,
                },
            ));
        }

        first_order_id.ok_or_else(|| ApiError::rejected("cart is empty"))
    }

    async fn update_delivery_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.begin("update_delivery_status", identity).await?;

        let mut state = self.lock();
        state.last_delivery_timestamp = Some(timestamp);

        let agent_id = DeliveryPersonId::new(identity.user_id.as_i64());
        let order = state
            .orders
            .iter_mut()
            .map(|(_, order)| order)
            .find(|order| {
                order.order_id == order_id
                    && order
                        .delivery_person
                        .as_ref()
                        .is_some_and(|person| person.id == Some(agent_id))
            })
            .ok_or_else(|| ApiError::NotFound(format!("order {order_id}")))?;

        order.status = status;
        order.delivery_date = Some(timestamp.format("%Y-%m-%d").to_string());
        order.delivery_time = Some(timestamp.format("%H:%M").to_string());
        Ok(())
    }
}

/// Build an order assigned to a delivery agent, for seeding.
#[must_use]
pub fn assigned_order(
    order_id: i64,
    item: &FoodSnapshot,
    quantity: u32,
    agent_id: i64,
    status: OrderStatus,
) -> Order {
    Order {
        order_id: OrderId::new(order_id),
        status,
        order_time: Utc::now(),
        food: item.clone(),
        quantity,
        delivery_person: Some(DeliveryPerson {
            id: Some(DeliveryPersonId::new(agent_id)),
            name: None,
            phone_no: Some("+700000000".to_string()),
        }),
        delivery_date: None,
        delivery_time: None,
    }
}
