//! Synchronizers owning the authoritative local snapshots.
//!
//! Each synchronizer exclusively owns its state; everything else reads a
//! published snapshot copy. Two disciplines keep the snapshots honest:
//!
//! - **Serialization**: an async op-guard allows one reconciling network
//!   call per synchronizer at a time. A mutation and the forced reload its
//!   failure triggers run as one unit; later calls queue behind them.
//! - **Generation tagging**: every operation captures the session generation
//!   at entry. A response that settles after the identity changed is
//!   discarded instead of applied, and a snapshot tagged with a stale
//!   generation reads as empty. Cross-user leakage is impossible even
//!   transiently.
//!
//! State locks are `std::sync` and held only for synchronous critical
//! sections (never across an await), which is why `snapshot()` is a plain
//! synchronous call the UI can make on every render.

mod cart;
mod orders;

pub use cart::{CartSnapshot, CartSynchronizer};
pub use orders::{OrderSnapshot, OrderSynchronizer};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
