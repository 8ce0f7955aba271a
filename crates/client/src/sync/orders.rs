//! Order synchronizer: the authoritative order list.
//!
//! Refresh-on-demand semantics: the list is wholesale-replaced on every
//! successful fetch, keyed by the identity's role (a customer sees the
//! orders they placed, a delivery agent the orders assigned to them).
//! There is no optimistic mutation beyond [`OrderSynchronizer::append`],
//! which only bridges the gap until the next refresh supersedes it.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::instrument;

use quickbite_core::{Order, OrderId, OrderStatus, Role};

use super::{read_lock, write_lock};
use crate::error::{ApiError, Result, add_breadcrumb};
use crate::gateway::OrderGateway;
use crate::session::SessionStore;

/// Published copy of the order list.
#[derive(Debug, Clone, Default)]
pub struct OrderSnapshot {
    /// Orders as returned by the server.
    pub orders: Vec<Order>,
    /// Whether a fetch is currently in flight.
    pub loading: bool,
    /// The last operation's failure, if it failed.
    pub last_error: Option<String>,
}

impl OrderSnapshot {
    /// An empty, settled order list.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Orders newest-first, for display. A read-time derivation; the stored
    /// list keeps server order.
    #[must_use]
    pub fn sorted_by_time_desc(&self) -> Vec<Order> {
        let mut orders = self.orders.clone();
        orders.sort_by(|a, b| b.order_time.cmp(&a.order_time));
        orders
    }
}

#[derive(Default)]
struct OrderState {
    orders: Vec<Order>,
    loading: bool,
    last_error: Option<String>,
    generation: u64,
}

/// Owns the in-memory order list and reconciles it with the server.
pub struct OrderSynchronizer<G> {
    session: Arc<SessionStore>,
    gateway: Arc<G>,
    state: RwLock<OrderState>,
    op_guard: Mutex<()>,
}

impl<G: OrderGateway> OrderSynchronizer<G> {
    /// Create a synchronizer with an empty order list.
    #[must_use]
    pub fn new(session: Arc<SessionStore>, gateway: Arc<G>) -> Self {
        Self {
            session,
            gateway,
            state: RwLock::new(OrderState::default()),
            op_guard: Mutex::new(()),
        }
    }

    /// Current snapshot.
    ///
    /// Reads as empty when the stored state belongs to a previous identity.
    #[must_use]
    pub fn snapshot(&self) -> OrderSnapshot {
        let state = read_lock(&self.state);
        if state.generation != self.session.generation() {
            return OrderSnapshot::empty();
        }
        OrderSnapshot {
            orders: state.orders.clone(),
            loading: state.loading,
            last_error: state.last_error.clone(),
        }
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    /// Fetch all orders for the current identity and replace the list
    /// wholesale. Any previously appended local order is superseded.
    ///
    /// With no active identity the result is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the snapshot keeps its previous
    /// confirmed orders and records the error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.op_guard.lock().await;
        self.refresh_locked().await
    }

    /// Reflect a just-placed order before the next refresh completes.
    ///
    /// Low-risk affordance: the next successful refresh replaces the whole
    /// list with server truth.
    pub fn append(&self, order: Order) {
        let generation = self.session.generation();
        self.apply(generation, move |state| state.orders.push(order));
    }

    /// Mark an order delivered, stamped with a client-computed timestamp.
    ///
    /// There is no optimistic status flip - an unconfirmed "Delivered" is
    /// worse than a stale "Pending" - so the list only changes through the
    /// refresh that follows a confirmed update.
    ///
    /// # Errors
    ///
    /// `ValidationRejected` when the identity is not a delivery agent;
    /// otherwise the classified failure, with the status left unchanged.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<()> {
        let _guard = self.op_guard.lock().await;
        let identity = self.session.identity().ok_or(ApiError::Unauthenticated)?;
        if identity.role != Role::DeliveryAgent {
            return Err(ApiError::ValidationRejected(
                "only a delivery agent can mark orders delivered".to_string(),
            ));
        }

        let order_id_str = order_id.to_string();
        add_breadcrumb("orders", "Marking order delivered", Some(&[("order_id", &order_id_str)]));

        let stamped_at = Utc::now();
        match self
            .gateway
            .update_delivery_status(&identity, order_id, OrderStatus::Delivered, stamped_at)
            .await
        {
            Ok(()) => self.refresh_locked().await,
            Err(err) => {
                self.handle_auth_failure(&err);
                tracing::warn!(error = %err, "Failed to mark order delivered");
                Err(err)
            }
        }
    }

    async fn refresh_locked(&self) -> Result<()> {
        let generation = self.session.generation();
        let Some(identity) = self.session.identity() else {
            self.apply(generation, |state| {
                state.orders.clear();
                state.loading = false;
                state.last_error = None;
            });
            return Ok(());
        };

        self.apply(generation, |state| state.loading = true);

        let result = match identity.role {
            Role::Customer => self.gateway.fetch_orders_for_user(&identity).await,
            Role::DeliveryAgent => self.gateway.fetch_orders_for_delivery_agent(&identity).await,
        };

        match result {
            Ok(orders) => {
                self.apply(generation, move |state| {
                    state.orders = orders;
                    state.loading = false;
                    state.last_error = None;
                });
                Ok(())
            }
            Err(err) => {
                self.handle_auth_failure(&err);
                self.apply(generation, |state| {
                    state.loading = false;
                    state.last_error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Write to the state, unless the session identity has changed since
    /// `generation` was captured - then the change is discarded.
    fn apply(&self, generation: u64, f: impl FnOnce(&mut OrderState)) {
        if self.session.generation() != generation {
            tracing::debug!("Discarding order state change from a previous session");
            return;
        }
        let mut state = write_lock(&self.state);
        if state.generation != generation {
            *state = OrderState {
                generation,
                ..OrderState::default()
            };
        }
        f(&mut state);
    }

    fn handle_auth_failure(&self, err: &ApiError) {
        if err.is_unauthenticated() {
            self.session.request_logout();
        }
    }
}
