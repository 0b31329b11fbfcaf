//! Batch orchestrator.
//!
//! Drives the scanner across many cards and, in batch mode, many
//! expansions concurrently. Fan-out is bounded by the window size: each
//! window issues one task per expansion (two catalog fetches each) and
//! waits at an explicit join barrier — a window fails as a whole if any
//! task errors, and no retries happen here.

use anyhow::{Context, Result};
use futures::future;
use tracing::{debug, info};

use crate::catalog::CatalogSource;
use crate::engine::joiner::join_cards;
use crate::engine::ranker::{rank, ScanReport};
use crate::engine::scanner::DealScanner;
use crate::types::{DealCandidate, Expansion};

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// A half-open slice `[start, end)` of the expansion universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

/// Partition a universe of `universe` items into windows of
/// `window_size`. The last window is short, never padded. A zero window
/// size yields no windows.
pub fn windows(universe: usize, window_size: usize) -> Vec<Window> {
    if window_size == 0 {
        return Vec::new();
    }

    (0..universe)
        .step_by(window_size)
        .map(|start| Window {
            start,
            end: (start + window_size).min(universe),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Category for single-card listings.
    pub category_id: u64,
    /// Expansions scanned concurrently per window.
    pub window_size: usize,
    /// Set codes dropped from the universe (collector / oversized sets).
    pub excluded_expansion_codes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            category_id: 1,
            window_size: 50,
            excluded_expansion_codes: vec!["cei".to_string(), "ced".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// Deal engine
// ---------------------------------------------------------------------------

/// Orchestrates fetch → join → scan → rank over the expansion universe.
///
/// Owns the catalog client and the expansion list for the lifetime of a
/// run; every scan request recreates all per-card data from fresh
/// fetches.
pub struct DealEngine<C> {
    catalog: C,
    scanner: DealScanner,
    config: EngineConfig,
    expansions: Vec<Expansion>,
}

impl<C: CatalogSource> DealEngine<C> {
    /// Fetch the expansion universe and build an engine over it.
    /// Excluded set codes are dropped here, once per run.
    pub async fn connect(catalog: C, scanner: DealScanner, config: EngineConfig) -> Result<Self> {
        let mut expansions = catalog
            .list_expansions()
            .await
            .context("Failed to load expansion universe")?;

        let before = expansions.len();
        expansions.retain(|e| !config.excluded_expansion_codes.iter().any(|c| c == &e.code));

        info!(
            total = expansions.len(),
            excluded = before - expansions.len(),
            "Expansion universe loaded"
        );

        Ok(Self {
            catalog,
            scanner,
            config,
            expansions,
        })
    }

    /// The filtered expansion universe, sorted by name.
    pub fn expansions(&self) -> &[Expansion] {
        &self.expansions
    }

    /// All windows over the current universe.
    pub fn windows(&self) -> Vec<Window> {
        windows(self.expansions.len(), self.config.window_size)
    }

    /// Scan a single expansion and rank its candidates.
    pub async fn scan_expansion(&self, expansion_id: u64) -> Result<ScanReport> {
        let candidates = self.scan_one(expansion_id).await?;
        Ok(rank(candidates))
    }

    /// Scan every expansion in a window concurrently, merge, and rank.
    ///
    /// One task per expansion; the `try_join_all` barrier fails the
    /// whole window on the first task error. Candidates from different
    /// expansions may interleave in any order before ranking.
    pub async fn scan_window(&self, window: Window) -> Result<ScanReport> {
        let end = window.end.min(self.expansions.len());
        let start = window.start.min(end);
        let slice = &self.expansions[start..end];

        info!(start, end, expansions = slice.len(), "Scanning window");

        let tasks = slice.iter().map(|e| self.scan_one(e.id));
        let per_expansion = future::try_join_all(tasks).await?;

        let candidates: Vec<DealCandidate> = per_expansion.into_iter().flatten().collect();
        info!(start, end, deals = candidates.len(), "Window scanned");

        Ok(rank(candidates))
    }

    /// Fetch, join, and scan one expansion. The two sub-fetches run
    /// concurrently and must both succeed before the joiner runs.
    async fn scan_one(&self, expansion_id: u64) -> Result<Vec<DealCandidate>> {
        let (listings, blueprints) = tokio::try_join!(
            self.catalog.list_listings(expansion_id),
            self.catalog.list_blueprints(expansion_id),
        )?;

        let cards = join_cards(blueprints, listings, self.config.category_id);
        debug!(expansion_id, cards = cards.len(), "Cards joined");

        Ok(self.scanner.scan_cards(&cards))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalogSource;
    use crate::engine::scanner::ScanConfig;
    use crate::types::{Blueprint, Condition, Listing};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn expansion(id: u64, code: &str, name: &str) -> Expansion {
        Expansion {
            id,
            game_id: 1,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn blueprint(id: u64, expansion_id: u64, category_id: u64) -> Blueprint {
        Blueprint {
            id,
            name: format!("Card {id}"),
            game_id: 1,
            category_id,
            expansion_id,
            external_market_id: Some(1000 + id),
        }
    }

    fn listing(id: u64, blueprint_id: u64, price_cents: u64) -> Listing {
        Listing {
            id,
            blueprint_id,
            name: format!("Card {blueprint_id}"),
            price_cents,
            currency: "EUR".to_string(),
            condition: Condition::NearMint,
            foil: false,
            language: Some("en".to_string()),
            altered: false,
            signed: false,
            seller_can_use_fast_checkout: false,
            expansion_id: 1,
        }
    }

    fn engine_config() -> EngineConfig {
        EngineConfig {
            category_id: 1,
            window_size: 50,
            excluded_expansion_codes: vec!["cei".to_string(), "ced".to_string()],
        }
    }

    async fn engine(catalog: MockCatalogSource) -> DealEngine<MockCatalogSource> {
        DealEngine::connect(catalog, DealScanner::new(ScanConfig::default()), engine_config())
            .await
            .unwrap()
    }

    // -- Window partitioning ---------------------------------------------

    #[test]
    fn test_windows_partition_with_short_tail() {
        let w = windows(120, 50);
        assert_eq!(
            w,
            vec![
                Window { start: 0, end: 50 },
                Window { start: 50, end: 100 },
                Window { start: 100, end: 120 },
            ]
        );
    }

    #[test]
    fn test_windows_exact_multiple() {
        let w = windows(100, 50);
        assert_eq!(w.len(), 2);
        assert_eq!(w[1], Window { start: 50, end: 100 });
    }

    #[test]
    fn test_windows_smaller_than_one_window() {
        assert_eq!(windows(7, 50), vec![Window { start: 0, end: 7 }]);
    }

    #[test]
    fn test_windows_empty_universe() {
        assert!(windows(0, 50).is_empty());
    }

    #[test]
    fn test_windows_zero_size_degenerate() {
        assert!(windows(120, 0).is_empty());
    }

    // -- Connect ---------------------------------------------------------

    #[tokio::test]
    async fn test_connect_filters_excluded_codes() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_list_expansions().returning(|| {
            Ok(vec![
                expansion(1, "ced", "Collectors' Edition Domestic"),
                expansion(2, "lea", "Limited Edition Alpha"),
                expansion(3, "cei", "Collectors' Edition International"),
            ])
        });

        let engine = engine(catalog).await;
        let codes: Vec<&str> = engine.expansions().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["lea"]);
    }

    #[tokio::test]
    async fn test_connect_propagates_catalog_failure() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_list_expansions()
            .returning(|| Err(anyhow::anyhow!("503 Service Unavailable")));

        let result = DealEngine::connect(
            catalog,
            DealScanner::new(ScanConfig::default()),
            engine_config(),
        )
        .await;
        assert!(result.is_err());
    }

    // -- Single-expansion scan -------------------------------------------

    #[tokio::test]
    async fn test_scan_expansion_ranks_candidates() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_list_expansions()
            .returning(|| Ok(vec![expansion(1, "lea", "Limited Edition Alpha")]));
        catalog.expect_list_blueprints().returning(|exp| {
            Ok(vec![
                blueprint(10, exp, 1),
                blueprint(20, exp, 1),
            ])
        });
        catalog.expect_list_listings().returning(|_| {
            let mut feed = HashMap::new();
            // ratio 100/300
            feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 300)]);
            // ratio 100/500 — better deal, must rank first
            feed.insert(20, vec![listing(3, 20, 100), listing(4, 20, 500)]);
            Ok(feed)
        });

        let report = engine(catalog).await.scan_expansion(1).await.unwrap();

        assert_eq!(report.candidates.len(), 2);
        assert!(!report.nothing_to_do);
        assert_eq!(report.candidates[0].price_ratio, dec!(0.2));
        assert_eq!(report.candidates[0].best_listing.id, 3);
        assert_eq!(report.candidates[1].best_listing.id, 1);
    }

    #[tokio::test]
    async fn test_scan_expansion_nothing_to_do() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_list_expansions()
            .returning(|| Ok(vec![expansion(1, "lea", "Limited Edition Alpha")]));
        catalog
            .expect_list_blueprints()
            .returning(|exp| Ok(vec![blueprint(10, exp, 1)]));
        catalog.expect_list_listings().returning(|_| {
            let mut feed = HashMap::new();
            // No qualifying gap.
            feed.insert(10, vec![listing(1, 10, 250), listing(2, 10, 300)]);
            Ok(feed)
        });

        let report = engine(catalog).await.scan_expansion(1).await.unwrap();
        assert!(report.nothing_to_do);
        assert!(report.candidates.is_empty());
    }

    // -- Window scan -----------------------------------------------------

    #[tokio::test]
    async fn test_scan_window_merges_across_expansions() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_list_expansions().returning(|| {
            Ok(vec![
                expansion(1, "lea", "Limited Edition Alpha"),
                expansion(2, "leb", "Limited Edition Beta"),
            ])
        });
        catalog
            .expect_list_blueprints()
            .returning(|exp| Ok(vec![blueprint(exp * 10, exp, 1)]));
        catalog.expect_list_listings().returning(|exp| {
            let mut feed = HashMap::new();
            if exp == 1 {
                // ratio 0.5
                feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 200)]);
            } else {
                // ratio 0.25
                feed.insert(20, vec![listing(3, 20, 100), listing(4, 20, 400)]);
            }
            Ok(feed)
        });

        let engine = engine(catalog).await;
        let report = engine.scan_window(Window { start: 0, end: 2 }).await.unwrap();

        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.candidates[0].price_ratio, dec!(0.25));
        assert_eq!(report.candidates[1].price_ratio, dec!(0.5));
    }

    #[tokio::test]
    async fn test_scan_window_fails_as_a_whole() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_list_expansions().returning(|| {
            Ok(vec![
                expansion(1, "lea", "Limited Edition Alpha"),
                expansion(2, "leb", "Limited Edition Beta"),
            ])
        });
        catalog.expect_list_blueprints().returning(|exp| {
            if exp == 2 {
                Err(anyhow::anyhow!("429 Too Many Requests"))
            } else {
                Ok(vec![blueprint(10, exp, 1)])
            }
        });
        catalog.expect_list_listings().returning(|_| {
            let mut feed = HashMap::new();
            feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 300)]);
            Ok(feed)
        });

        let engine = engine(catalog).await;
        let result = engine.scan_window(Window { start: 0, end: 2 }).await;
        assert!(result.is_err(), "one failed expansion must fail the window");
    }

    #[tokio::test]
    async fn test_scan_window_clamps_out_of_range() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_list_expansions()
            .returning(|| Ok(vec![expansion(1, "lea", "Limited Edition Alpha")]));
        catalog
            .expect_list_blueprints()
            .returning(|exp| Ok(vec![blueprint(10, exp, 1)]));
        catalog.expect_list_listings().returning(|_| {
            let mut feed = HashMap::new();
            feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 300)]);
            Ok(feed)
        });

        let engine = engine(catalog).await;
        // end beyond the universe: clamped to the single expansion.
        let report = engine.scan_window(Window { start: 0, end: 50 }).await.unwrap();
        assert_eq!(report.candidates.len(), 1);

        // fully out of range: empty scan, nothing to do.
        let report = engine.scan_window(Window { start: 10, end: 20 }).await.unwrap();
        assert!(report.nothing_to_do);
    }

    // -- Category / emptiness filtering end to end -----------------------

    #[tokio::test]
    async fn test_foreign_categories_never_reach_candidates() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_list_expansions()
            .returning(|| Ok(vec![expansion(1, "lea", "Limited Edition Alpha")]));
        catalog.expect_list_blueprints().returning(|exp| {
            Ok(vec![
                blueprint(10, exp, 1),
                // Sealed product with a juicy gap — must never surface.
                blueprint(20, exp, 2),
                // Single card without any listing.
                blueprint(30, exp, 1),
            ])
        });
        catalog.expect_list_listings().returning(|_| {
            let mut feed = HashMap::new();
            feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 300)]);
            feed.insert(20, vec![listing(3, 20, 100), listing(4, 20, 900)]);
            Ok(feed)
        });

        let report = engine(catalog).await.scan_expansion(1).await.unwrap();

        let market_ids: Vec<_> = report
            .candidates
            .iter()
            .map(|c| c.external_market_id)
            .collect();
        assert_eq!(market_ids, vec![Some(1010)]);
    }
}
