//! Cart synchronizer: the authoritative local cart.
//!
//! Mutations are applied optimistically so the UI reflects them with no
//! latency, then reconciled against the server. Whenever a mutation's
//! outcome is uncertain (any failure after the request may have left the
//! server in either state), the optimistic value is discarded and the cart
//! is reloaded from server truth - the snapshot is never left silently
//! diverged.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::instrument;

use quickbite_core::{CartLine, CartLineId, FoodSnapshot, Price};

use super::{read_lock, write_lock};
use crate::error::{ApiError, Result, add_breadcrumb};
use crate::gateway::CartGateway;
use crate::session::SessionStore;

/// Published copy of the cart state.
#[derive(Debug, Clone, Default)]
pub struct CartSnapshot {
    /// Cart lines, in server order. `cart_id` is unique across them.
    pub lines: Vec<CartLine>,
    /// Whether a fetch is currently in flight.
    pub loading: bool,
    /// The last operation's failure, if it failed.
    pub last_error: Option<String>,
}

impl CartSnapshot {
    /// An empty, settled cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[derive(Default)]
struct CartState {
    lines: Vec<CartLine>,
    loading: bool,
    last_error: Option<String>,
    generation: u64,
}

/// Owns the in-memory cart snapshot and reconciles it with the server.
pub struct CartSynchronizer<G> {
    session: Arc<SessionStore>,
    gateway: Arc<G>,
    state: RwLock<CartState>,
    // One reconciling call in flight at a time; a mutation and its
    // failure-driven reload hold this across both.
    op_guard: Mutex<()>,
}

impl<G: CartGateway> CartSynchronizer<G> {
    /// Create a synchronizer with an empty snapshot.
    #[must_use]
    pub fn new(session: Arc<SessionStore>, gateway: Arc<G>) -> Self {
        Self {
            session,
            gateway,
            state: RwLock::new(CartState::default()),
            op_guard: Mutex::new(()),
        }
    }

    /// Current snapshot.
    ///
    /// Reads as empty when the stored state belongs to a previous identity.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let state = read_lock(&self.state);
        if state.generation != self.session.generation() {
            return CartSnapshot::empty();
        }
        CartSnapshot {
            lines: state.lines.clone(),
            loading: state.loading,
            last_error: state.last_error.clone(),
        }
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    /// Fetch the authoritative cart and replace the snapshot wholesale.
    ///
    /// With no active identity the result is an empty snapshot, not an
    /// error - an unauthenticated user has a conceptually empty cart.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the snapshot keeps its previous
    /// confirmed lines and records the error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.op_guard.lock().await;
        self.refresh_locked().await
    }

    /// Add `quantity` units of a catalog item to the cart.
    ///
    /// A successful add is followed by a full re-fetch: the server is
    /// authoritative for cart line IDs and for the price captured at add
    /// time, so a locally synthesized line is never trusted. On failure the
    /// snapshot is left unchanged.
    ///
    /// # Errors
    ///
    /// `ValidationRejected` (before any network call) for a zero quantity
    /// or an item without a catalog ID; otherwise the classified failure.
    #[instrument(skip(self, food), fields(food_id = %food.id))]
    pub async fn add(&self, food: &FoodSnapshot, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(ApiError::ValidationRejected(
                "quantity must be at least 1".to_string(),
            ));
        }
        if food.id.as_i64() <= 0 {
            return Err(ApiError::ValidationRejected(
                "food has no catalog id".to_string(),
            ));
        }

        let _guard = self.op_guard.lock().await;
        let identity = self.session.identity().ok_or(ApiError::Unauthenticated)?;

        let food_id = food.id.to_string();
        let quantity_str = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Adding item to cart",
            Some(&[("food_id", &food_id), ("quantity", &quantity_str)]),
        );

        match self.gateway.add_cart_line(&identity, food.id, quantity).await {
            Ok(_cart_id) => self.refresh_locked().await,
            Err(err) => {
                self.handle_auth_failure(&err);
                tracing::warn!(error = %err, "Failed to add item to cart");
                Err(err)
            }
        }
    }

    /// Set the quantity of a cart line.
    ///
    /// Setting a line to zero and deleting it are the same operation, so
    /// `new_quantity == 0` delegates to [`Self::remove`]. Otherwise the new
    /// quantity is applied optimistically and the update request issued; on
    /// failure the optimistic value is discarded by a forced reload.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after reconciliation has settled.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn update_quantity(&self, cart_id: CartLineId, new_quantity: u32) -> Result<()> {
        if new_quantity == 0 {
            return self.remove(cart_id).await;
        }

        let _guard = self.op_guard.lock().await;
        let identity = self.session.identity().ok_or(ApiError::Unauthenticated)?;
        let generation = self.session.generation();

        // Optimistic: the UI reflects the new quantity with no latency.
        // A line the server knows but we don't is left to the server call.
        self.apply(generation, |state| {
            if let Some(line) = state
                .lines
                .iter_mut()
                .find(|line| line.cart_id == cart_id)
            {
                line.quantity = new_quantity;
            }
        });

        match self
            .gateway
            .update_cart_line(&identity, cart_id, new_quantity)
            .await
        {
            Ok(()) => {
                self.apply(generation, |state| state.last_error = None);
                Ok(())
            }
            Err(err) => {
                self.reconcile(&err, "quantity update").await;
                Err(err)
            }
        }
    }

    /// Remove a cart line.
    ///
    /// The line is filtered out optimistically, then the delete request
    /// issued; on failure the snapshot is restored from server truth - the
    /// line is never left locally removed while still present server-side,
    /// nor the reverse.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after reconciliation has settled.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn remove(&self, cart_id: CartLineId) -> Result<()> {
        let _guard = self.op_guard.lock().await;
        let identity = self.session.identity().ok_or(ApiError::Unauthenticated)?;
        let generation = self.session.generation();

        self.apply(generation, |state| {
            state.lines.retain(|line| line.cart_id != cart_id);
        });

        match self.gateway.delete_cart_line(&identity, cart_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.reconcile(&err, "removal").await;
                Err(err)
            }
        }
    }

    /// Refresh body shared by the public entry point and the failure paths
    /// that already hold the op-guard.
    async fn refresh_locked(&self) -> Result<()> {
        let generation = self.session.generation();
        let Some(identity) = self.session.identity() else {
            self.apply(generation, |state| {
                state.lines.clear();
                state.loading = false;
                state.last_error = None;
            });
            return Ok(());
        };

        self.apply(generation, |state| state.loading = true);

        match self.gateway.fetch_cart(&identity).await {
            Ok(lines) => {
                self.apply(generation, move |state| {
                    state.lines = lines;
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

    /// A mutation settled with an uncertain outcome: discard the optimistic
    /// state and reload server truth.
    async fn reconcile(&self, err: &ApiError, operation: &str) {
        self.handle_auth_failure(err);
        tracing::warn!(error = %err, operation, "Cart mutation failed, reloading from server");
        if let Err(refresh_err) = self.refresh_locked().await {
            tracing::error!(error = %refresh_err, "Reconciling cart reload failed");
        }
    }

    /// Write to the state, unless the session identity has changed since
    /// `generation` was captured - then the change is discarded. The first
    /// write under a new generation starts from a clean slate.
    fn apply(&self, generation: u64, f: impl FnOnce(&mut CartState)) {
        if self.session.generation() != generation {
            tracing::debug!("Discarding cart state change from a previous session");
            return;
        }
        let mut state = write_lock(&self.state);
        if state.generation != generation {
            *state = CartState {
                generation,
                ..CartState::default()
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use quickbite_core::FoodId;

    fn line(cart_id: i64, unit_price: i64, quantity: u32) -> CartLine {
        CartLine {
            cart_id: CartLineId::new(cart_id),
            food_id: FoodId::new(1),
            food: FoodSnapshot {
                id: FoodId::new(1),
                name: "Pad Thai".to_string(),
                price: Price::from(unit_price),
                description: None,
                image_ref: None,
            },
            quantity,
            added_time: Utc.timestamp_millis_opt(0).single().expect("timestamp"),
        }
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = CartSnapshot {
            lines: vec![line(1, 100, 2), line(2, 50, 1)],
            loading: false,
            last_error: None,
        };
        assert_eq!(snapshot.total(), Price::from(250));
        assert_eq!(snapshot.item_count(), 3);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total(), Price::ZERO);
        assert!(snapshot.last_error.is_none());
    }
}
