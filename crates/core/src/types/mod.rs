//! Core types for Quickbite.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod food;
pub mod id;
pub mod identity;
pub mod order;
pub mod price;

pub use cart::CartLine;
pub use food::FoodSnapshot;
pub use id::*;
pub use identity::{Identity, PaymentCard, Role};
pub use order::{DeliveryPerson, Order, OrderStatus};
pub use price::Price;
