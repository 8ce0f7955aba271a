//! Quickbite client core.
//!
//! This crate is the state-synchronization layer of the Quickbite mobile
//! app: it owns the authoritative local copy of "what is in the cart" and
//! "what orders exist", keeps both consistent with the remote service over
//! an unreliable network, and drives the checkout transaction. The UI layer
//! above it only renders snapshots and forwards user events.
//!
//! # Architecture
//!
//! - The server is the source of truth - mutations are applied optimistically
//!   for latency hiding, then reconciled by a forced re-fetch whenever an
//!   outcome is uncertain
//! - Gateways are a trait seam ([`gateway::CartGateway`],
//!   [`gateway::OrderGateway`]); the HTTP implementation attaches the bearer
//!   token explicitly per request, never via an ambient default header
//! - Snapshots are tagged with the session generation, so an identity change
//!   invalidates them and any in-flight response immediately
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quickbite_client::{config::ClientConfig, gateway::HttpGateway, session::SessionStore};
//! use quickbite_client::sync::{CartSynchronizer, OrderSynchronizer};
//! use quickbite_client::checkout::CheckoutCoordinator;
//!
//! let config = ClientConfig::from_env()?;
//! let _telemetry = quickbite_client::telemetry::init(&config);
//!
//! let session = Arc::new(SessionStore::new());
//! let gateway = Arc::new(HttpGateway::new(&config));
//! let cart = Arc::new(CartSynchronizer::new(Arc::clone(&session), Arc::clone(&gateway)));
//! let orders = Arc::new(OrderSynchronizer::new(Arc::clone(&session), Arc::clone(&gateway)));
//! let checkout = CheckoutCoordinator::new(session, gateway, cart, orders);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod sync;
pub mod telemetry;
