//! Quickbite Core - Shared types library.
//!
//! This crate provides common types used across all Quickbite components:
//! - `client` - Cart/order synchronization core consumed by the mobile UI
//! - `integration-tests` - Cross-component scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, identities, and
//!   the cart/order domain records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
