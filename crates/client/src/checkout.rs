//! Checkout coordinator: the cart → payment → order transaction.
//!
//! A small state machine (`Idle → Submitting → Succeeded | Failed`) around
//! the single order-create request. The coordinator - not the UI - computes
//! the charged total from the cart snapshot it reads, so a stale UI total
//! can never diverge from what is actually submitted.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::instrument;

use quickbite_core::{OrderId, PaymentCard};

use crate::error::{ApiError, Result, add_breadcrumb};
use crate::gateway::{CartGateway, OrderGateway};
use crate::session::SessionStore;
use crate::sync::{CartSynchronizer, OrderSynchronizer};

/// Where the checkout transaction currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// No transaction in progress.
    #[default]
    Idle,
    /// The order-create request is in flight.
    Submitting,
    /// The last transaction placed an order.
    Succeeded {
        /// Server-issued ID of the placed order.
        order_id: OrderId,
    },
    /// The last transaction failed; the cart is untouched.
    Failed {
        /// Human-readable failure, for inline display.
        message: String,
    },
}

impl CheckoutState {
    /// Whether an order-create request is currently in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

/// Drives the multi-step checkout transaction.
pub struct CheckoutCoordinator<C: CartGateway, O: OrderGateway> {
    session: Arc<SessionStore>,
    gateway: Arc<O>,
    cart: Arc<CartSynchronizer<C>>,
    orders: Arc<OrderSynchronizer<O>>,
    state: Mutex<CheckoutState>,
}

impl<C: CartGateway, O: OrderGateway> CheckoutCoordinator<C, O> {
    /// Create a coordinator over the two synchronizers.
    #[must_use]
    pub fn new(
        session: Arc<SessionStore>,
        gateway: Arc<O>,
        cart: Arc<CartSynchronizer<C>>,
        orders: Arc<OrderSynchronizer<O>>,
    ) -> Self {
        Self {
            session,
            gateway,
            cart,
            orders,
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    /// Current state of the machine.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.lock().clone()
    }

    /// Return the machine to `Idle` after the UI has shown the outcome.
    ///
    /// A no-op while a submission is in flight.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !state.is_submitting() {
            *state = CheckoutState::Idle;
        }
    }

    /// Submit the checkout transaction.
    ///
    /// Preconditions are checked before the machine enters `Submitting`:
    /// an active identity and a non-empty cart. The charged amount is
    /// computed here from the snapshot. On success the order list is
    /// refreshed **before** the cart, so the UI never shows neither the
    /// cart contents nor the new order; refresh failures after a placed
    /// order are logged, not propagated. On failure nothing was mutated
    /// client-side, so there is no compensation - the error is surfaced
    /// verbatim for retry.
    ///
    /// # Errors
    ///
    /// `ValidationRejected` for a duplicate tap while `Submitting` or an
    /// empty cart (no network call in either case); `Unauthenticated` with
    /// no identity; otherwise the classified gateway failure.
    #[instrument(skip(self, payment))]
    pub async fn submit(&self, payment: PaymentCard) -> Result<OrderId> {
        let (identity, lines, total) = {
            let mut state = self.lock();
            if state.is_submitting() {
                return Err(ApiError::ValidationRejected(
                    "checkout already in progress".to_string(),
                ));
            }

            let identity = self.session.identity().ok_or(ApiError::Unauthenticated)?;
            let snapshot = self.cart.snapshot();
            if snapshot.is_empty() {
                return Err(ApiError::ValidationRejected("cart is empty".to_string()));
            }

            *state = CheckoutState::Submitting;
            let total = snapshot.total();
            (identity, snapshot.lines, total)
        };

        let amount = total.to_string();
        add_breadcrumb("checkout", "Submitting order", Some(&[("amount", &amount)]));

        match self
            .gateway
            .create_order(&identity, &payment, total, &lines)
            .await
        {
            Ok(order_id) => {
                tracing::info!(order_id = %order_id, "Order placed");

                if let Err(err) = self.orders.refresh().await {
                    tracing::warn!(error = %err, "Order list refresh after checkout failed");
                }
                if let Err(err) = self.cart.refresh().await {
                    tracing::warn!(error = %err, "Cart refresh after checkout failed");
                }

                *self.lock() = CheckoutState::Succeeded { order_id };
                Ok(order_id)
            }
            Err(err) => {
                if err.is_unauthenticated() {
                    self.session.request_logout();
                }
                tracing::warn!(error = %err, "Checkout failed");
                *self.lock() = CheckoutState::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CheckoutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
