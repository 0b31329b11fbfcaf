//! Deal scanner.
//!
//! Walks the price-sorted listing list of one card and decides whether
//! a profitable price gap exists against the next-cheapest competing
//! offer, subject to price sanity bounds and a condition floor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Condition, DealCandidate, JoinedCard, Listing};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Scan policy knobs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Candidate price must stay strictly below next price × this.
    pub max_quotient: Decimal,
    /// Lower price sanity bound in minor units, exclusive. Excludes
    /// near-free placeholder listings.
    pub min_cents: u64,
    /// Upper price sanity bound in minor units, exclusive. Excludes
    /// listings too expensive to be worth flipping.
    pub max_cents: u64,
    /// How many of the cheapest listings per card may seed a deal.
    pub max_cards: usize,
    /// Worst acceptable condition.
    pub min_condition: Condition,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_quotient: dec!(0.6),
            min_cents: 50,
            max_cents: 10_000,
            max_cards: 1,
            min_condition: Condition::SlightlyPlayed,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Detects underpriced listings on price-sorted cards.
pub struct DealScanner {
    config: ScanConfig,
}

impl DealScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Access the scan configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every joined card, collecting all emitted candidates.
    /// Output order is arbitrary; the ranker imposes the total order.
    pub fn scan_cards(&self, cards: &HashMap<u64, JoinedCard>) -> Vec<DealCandidate> {
        let mut candidates = Vec::new();
        for card in cards.values() {
            if let Some(candidate) = self.scan_card(card) {
                debug!(blueprint_id = card.blueprint.id, ratio = %candidate.price_ratio, "Deal found");
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Scan one card. Emits at most one candidate.
    ///
    /// Walks indices `0..min(max_cards, len)` of the price-ascending
    /// listing list. Index `i` seeds a deal iff the listing sits inside
    /// the price sanity bounds (strictly), undercuts the next offer by
    /// more than `max_quotient` (strictly), and meets the condition
    /// floor. The reported best item is the FIRST condition-eligible
    /// listing in the prefix `0..=i` — the cheapest acceptable offer
    /// overall, not necessarily the one that triggered the gap test.
    pub fn scan_card(&self, card: &JoinedCard) -> Option<DealCandidate> {
        let listings = &card.listings;
        let depth = self.config.max_cards.min(listings.len());

        for i in 0..depth {
            let curr = &listings[i];
            // No next offer means no gap to compare against.
            let Some(next) = listings.get(i + 1) else {
                break;
            };

            if !self.qualifies(curr, next) {
                continue;
            }

            let eligible: Vec<&Listing> = listings[..=i]
                .iter()
                .filter(|l| l.condition.rank() >= self.config.min_condition.rank())
                .collect();

            // Non-empty by construction: curr met the floor and is in the
            // prefix.
            let best = *eligible.first()?;

            return Some(DealCandidate {
                best_listing: best.clone(),
                price_ratio: ratio(best.price_cents, next.price_cents),
                has_fast_checkout_seller: eligible
                    .iter()
                    .any(|l| l.seller_can_use_fast_checkout),
                external_market_id: card.blueprint.external_market_id,
            });
        }

        None
    }

    fn qualifies(&self, curr: &Listing, next: &Listing) -> bool {
        curr.price_cents > self.config.min_cents
            && curr.price_cents < self.config.max_cents
            && Decimal::from(curr.price_cents)
                < Decimal::from(next.price_cents) * self.config.max_quotient
            && curr.condition.rank() >= self.config.min_condition.rank()
    }
}

fn ratio(best_cents: u64, next_cents: u64) -> Decimal {
    Decimal::from(best_cents) / Decimal::from(next_cents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
