//! Shared types for the FLIPSCAN scanner.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that catalog and engine
//! modules can depend on them without circular references.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// A released card set on the marketplace.
///
/// Fetched once per run, filtered to a single game and to the
/// configured exclusion list of set codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expansion {
    pub id: u64,
    pub game_id: u64,
    pub code: String,
    pub name: String,
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (#{})", self.code, self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Canonical metadata for one specific card printing.
///
/// Many listings may reference the same blueprint. Only blueprints in
/// the single-card category are scanned; sealed product and accessories
/// share the same endpoint but are filtered out by the joiner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: u64,
    pub name: String,
    pub game_id: u64,
    pub category_id: u64,
    pub expansion_id: u64,
    /// CardMarket product id, when the marketplace knows the mapping.
    pub external_market_id: Option<u64>,
}

impl fmt::Display for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}, expansion {})", self.name, self.id, self.expansion_id)
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Graded physical state of a card, ordered worst → best.
///
/// The total order is the one the marketplace uses; comparisons go
/// through `rank()` (or the derived `Ord`), never lexical string order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    Poor = 0,
    #[serde(rename = "Heavily Played")]
    HeavilyPlayed = 1,
    Played = 2,
    #[serde(rename = "Moderately Played")]
    ModeratelyPlayed = 3,
    #[serde(rename = "Slightly Played")]
    SlightlyPlayed = 4,
    #[serde(rename = "Near Mint")]
    NearMint = 5,
    Mint = 6,
}

impl Condition {
    /// All conditions, worst first (useful for iteration).
    pub const ALL: &'static [Condition] = &[
        Condition::Poor,
        Condition::HeavilyPlayed,
        Condition::Played,
        Condition::ModeratelyPlayed,
        Condition::SlightlyPlayed,
        Condition::NearMint,
        Condition::Mint,
    ];

    /// Numeric rank, 0 (Poor) to 6 (Mint).
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Poor => write!(f, "Poor"),
            Condition::HeavilyPlayed => write!(f, "Heavily Played"),
            Condition::Played => write!(f, "Played"),
            Condition::ModeratelyPlayed => write!(f, "Moderately Played"),
            Condition::SlightlyPlayed => write!(f, "Slightly Played"),
            Condition::NearMint => write!(f, "Near Mint"),
            Condition::Mint => write!(f, "Mint"),
        }
    }
}

/// Parse the exact label the marketplace emits. Unrecognized labels are
/// an error, never a silent default.
impl std::str::FromStr for Condition {
    type Err = FlipscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Poor" => Ok(Condition::Poor),
            "Heavily Played" => Ok(Condition::HeavilyPlayed),
            "Played" => Ok(Condition::Played),
            "Moderately Played" => Ok(Condition::ModeratelyPlayed),
            "Slightly Played" => Ok(Condition::SlightlyPlayed),
            "Near Mint" => Ok(Condition::NearMint),
            "Mint" => Ok(Condition::Mint),
            other => Err(FlipscanError::UnknownCondition(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One seller's live offer for a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub blueprint_id: u64,
    /// English card name as shown on the listing.
    pub name: String,
    /// Price in minor currency units.
    pub price_cents: u64,
    pub currency: String,
    pub condition: Condition,
    pub foil: bool,
    pub language: Option<String>,
    pub altered: bool,
    pub signed: bool,
    /// Whether the seller can ship through the marketplace's managed
    /// (fast-checkout) channel.
    pub seller_can_use_fast_checkout: bool,
    pub expansion_id: u64,
}

impl Listing {
    /// Price in major currency units, e.g. "12.34 EUR".
    pub fn price_formatted(&self) -> String {
        format!(
            "{}.{:02} {}",
            self.price_cents / 100,
            self.price_cents % 100,
            self.currency
        )
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} [{}]{}",
            self.name,
            self.price_formatted(),
            self.condition,
            if self.foil { " (foil)" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// JoinedCard
// ---------------------------------------------------------------------------

/// A blueprint paired with its listings, sorted ascending by price.
///
/// Built fresh by the joiner on every scan; never persisted. The sort
/// invariant is established by the joiner — the scanner relies on it
/// and never re-sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedCard {
    pub blueprint: Blueprint,
    pub listings: Vec<Listing>,
}

impl fmt::Display for JoinedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} listings)", self.blueprint.name, self.listings.len())
    }
}

// ---------------------------------------------------------------------------
// DealCandidate
// ---------------------------------------------------------------------------

/// A listing identified as underpriced relative to the next competing
/// listing for the same card. Produced by the scanner, ordered by the
/// ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealCandidate {
    pub best_listing: Listing,
    /// Best price ÷ next-competitor price. Always < 1 when emitted;
    /// smaller is a better deal.
    pub price_ratio: Decimal,
    /// Whether any condition-eligible listing in the scanned prefix can
    /// ship via fast checkout.
    pub has_fast_checkout_seller: bool,
    /// CardMarket product id of the underlying blueprint, if known.
    pub external_market_id: Option<u64>,
}

impl DealCandidate {
    /// Relative discount against the next competitor, in percent.
    pub fn discount_pct(&self) -> Decimal {
        (dec!(1) - self.price_ratio) * dec!(100)
    }
}

impl fmt::Display for DealCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | ratio={} ({:.0}% off){}",
            self.best_listing,
            self.price_ratio,
            self.discount_pct(),
            if self.has_fast_checkout_seller { " | fast checkout" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for FLIPSCAN.
#[derive(Debug, thiserror::Error)]
pub enum FlipscanError {
    #[error("Catalog error ({endpoint}): {message}")]
    Catalog { endpoint: String, message: String },

    #[error("Unknown card condition: {0}")]
    UnknownCondition(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
