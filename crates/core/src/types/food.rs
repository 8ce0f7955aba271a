//! Catalog item projection.

use serde::{Deserialize, Serialize};

use super::id::FoodId;
use super::price::Price;

/// Read-only projection of a catalog item.
///
/// Owned by the catalog service and embedded by value into cart lines and
/// orders, so a snapshot keeps displaying consistently even if the catalog
/// changes underneath it. The server remains authoritative for the price
/// actually charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodSnapshot {
    /// Catalog ID of the item.
    pub id: FoodId,
    /// Display name.
    pub name: String,
    /// Unit price at the time the snapshot was taken.
    pub price: Price,
    /// Optional description shown on detail screens.
    pub description: Option<String>,
    /// Reference to the item's image, resolved by the catalog client.
    pub image_ref: Option<String>,
}
