//! Catalog service boundary.
//!
//! Defines the `CatalogSource` trait — the read-only view of the
//! marketplace catalog the deal engine consumes — and provides the
//! CardTrader API v2 implementation.

pub mod cardtrader;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{Blueprint, Expansion, Listing};

/// Abstraction over the marketplace catalog service.
///
/// Implementors are pure I/O: fetch and decode, no scan policy. All
/// methods are read-only; the catalog is treated as a rate-limit-bearing
/// shared resource, so callers bound their own fan-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the expansion universe, pre-filtered to one game and
    /// sorted by name.
    async fn list_expansions(&self) -> Result<Vec<Expansion>>;

    /// Fetch all card metadata records for one expansion (all
    /// categories — the joiner filters).
    async fn list_blueprints(&self, expansion_id: u64) -> Result<Vec<Blueprint>>;

    /// Fetch the live listings for one expansion, keyed by blueprint id.
    /// Inner lists are in fetch order; the joiner owns the price-sort
    /// invariant.
    async fn list_listings(&self, expansion_id: u64) -> Result<HashMap<u64, Vec<Listing>>>;
}
