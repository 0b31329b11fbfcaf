//! CardTrader API v2 integration.
//!
//! Read-only catalog client: expansions, blueprint exports, and the
//! per-expansion marketplace product feed.
//!
//! Base URL: https://api.cardtrader.com/api/v2
//! Auth: full `Authorization` header value supplied by the caller
//! (kept in a `SecretString`, never logged).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

use super::CatalogSource;
use crate::types::{Blueprint, Condition, Expansion, Listing};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.cardtrader.com/api/v2";

// ---------------------------------------------------------------------------
// API response types (CardTrader JSON → Rust)
// ---------------------------------------------------------------------------

/// Expansion record from `/expansions`. The endpoint returns every game;
/// the client filters to one game id.
#[derive(Debug, Deserialize)]
struct RawExpansion {
    id: u64,
    game_id: u64,
    code: String,
    name: String,
}

/// Blueprint record from `/blueprints/export`. We only deserialize the
/// fields the engine needs; the export carries many more.
#[derive(Debug, Deserialize)]
struct RawBlueprint {
    id: u64,
    name: String,
    game_id: u64,
    category_id: u64,
    expansion_id: u64,
    /// CardMarket product id. Null for cards CardMarket doesn't track.
    #[serde(default)]
    card_market_id: Option<u64>,
}

/// Marketplace product from `/marketplace/products`. One seller's offer.
#[derive(Debug, Deserialize)]
struct RawProduct {
    id: u64,
    blueprint_id: u64,
    #[serde(default)]
    name_en: String,
    price: RawPrice,
    #[serde(default)]
    properties_hash: RawProperties,
    #[serde(default)]
    user: RawSeller,
    expansion: RawProductExpansion,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    cents: u64,
    currency: String,
}

/// Card-specific properties. Every field may be absent depending on the
/// game and the seller's diligence.
#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    signed: Option<bool>,
    #[serde(default)]
    altered: Option<bool>,
    #[serde(default)]
    mtg_foil: Option<bool>,
    #[serde(default)]
    mtg_language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSeller {
    #[serde(default)]
    can_sell_via_hub: bool,
}

#[derive(Debug, Deserialize)]
struct RawProductExpansion {
    id: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// CardTrader catalog client.
pub struct CardTraderClient {
    http: Client,
    /// Full `Authorization` header value (e.g. `Bearer <jwt>`).
    auth_token: SecretString,
    /// Game whose expansions the scan covers.
    game_id: u64,
}

impl CardTraderClient {
    /// Create a new CardTrader client for one game.
    pub fn new(auth_token: SecretString, game_id: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("FLIPSCAN/0.1.0 (marketplace-deal-scanner)")
            .build()
            .context("Failed to build HTTP client for CardTrader")?;

        Ok(Self {
            http,
            auth_token,
            game_id,
        })
    }

    /// Verify the configured token against `/info`. Call once at startup
    /// so a bad token fails before any fan-out begins.
    pub async fn check_credentials(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json("/info").await?;
        debug!("CardTrader credentials accepted");
        Ok(())
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{BASE_URL}{path_and_query}");

        debug!(url = %url, "Fetching from CardTrader");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_token.expose_secret().as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("CardTrader API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("CardTrader API error {status}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse CardTrader response from {path_and_query}"))
    }
}

// ---------------------------------------------------------------------------
// Wire → domain mapping
// ---------------------------------------------------------------------------

fn map_blueprint(raw: RawBlueprint) -> Blueprint {
    Blueprint {
        id: raw.id,
        name: raw.name,
        game_id: raw.game_id,
        category_id: raw.category_id,
        expansion_id: raw.expansion_id,
        external_market_id: raw.card_market_id,
    }
}

/// Map one product to a domain listing. A product with a missing or
/// unrecognized condition is filterable absence, not an error (it can
/// never clear a condition floor anyway).
fn map_product(raw: RawProduct) -> Option<Listing> {
    let label = match raw.properties_hash.condition {
        Some(label) => label,
        None => {
            debug!(product_id = raw.id, "Dropping listing without condition");
            return None;
        }
    };

    let condition = match Condition::from_str(&label) {
        Ok(c) => c,
        Err(_) => {
            warn!(product_id = raw.id, label = %label, "Dropping listing with unrecognized condition");
            return None;
        }
    };

    Some(Listing {
        id: raw.id,
        blueprint_id: raw.blueprint_id,
        name: raw.name_en,
        price_cents: raw.price.cents,
        currency: raw.price.currency,
        condition,
        foil: raw.properties_hash.mtg_foil.unwrap_or(false),
        language: raw.properties_hash.mtg_language,
        altered: raw.properties_hash.altered.unwrap_or(false),
        signed: raw.properties_hash.signed.unwrap_or(false),
        seller_can_use_fast_checkout: raw.user.can_sell_via_hub,
        expansion_id: raw.expansion.id,
    })
}

/// The product feed is a JSON object keyed by blueprint id (as a
/// string). Re-key numerically and map each offer list.
fn map_products(raw: HashMap<String, Vec<RawProduct>>) -> HashMap<u64, Vec<Listing>> {
    let mut listings = HashMap::with_capacity(raw.len());
    for (key, products) in raw {
        let blueprint_id: u64 = match key.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(key = %key, "Dropping product group with non-numeric blueprint id");
                continue;
            }
        };
        let offers: Vec<Listing> = products.into_iter().filter_map(map_product).collect();
        if !offers.is_empty() {
            listings.insert(blueprint_id, offers);
        }
    }
    listings
}

#[async_trait]
impl CatalogSource for CardTraderClient {
    async fn list_expansions(&self) -> Result<Vec<Expansion>> {
        let raw: Vec<RawExpansion> = self.get_json("/expansions").await?;

        let mut expansions: Vec<Expansion> = raw
            .into_iter()
            .filter(|e| e.game_id == self.game_id)
            .map(|e| Expansion {
                id: e.id,
                game_id: e.game_id,
                code: e.code,
                name: e.name,
            })
            .collect();
        expansions.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        debug!(count = expansions.len(), game_id = self.game_id, "Expansions fetched");
        Ok(expansions)
    }

    async fn list_blueprints(&self, expansion_id: u64) -> Result<Vec<Blueprint>> {
        let raw: Vec<RawBlueprint> = self
            .get_json(&format!("/blueprints/export?expansion_id={expansion_id}"))
            .await?;
        Ok(raw.into_iter().map(map_blueprint).collect())
    }

    async fn list_listings(&self, expansion_id: u64) -> Result<HashMap<u64, Vec<Listing>>> {
        let raw: HashMap<String, Vec<RawProduct>> = self
            .get_json(&format!("/marketplace/products?expansion_id={expansion_id}"))
            .await?;
        Ok(map_products(raw))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
