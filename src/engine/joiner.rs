//! Listing–metadata joiner.
//!
//! Pairs the per-expansion listing feed with the blueprint export,
//! producing price-sorted `JoinedCard`s for the scanner. Pure
//! transformation; no I/O.

use std::collections::HashMap;

use crate::types::{Blueprint, JoinedCard, Listing};

/// Join blueprints with their listings, keyed by blueprint id.
///
/// Keeps only blueprints in `category_id` (single cards) that have at
/// least one listing; everything else is dropped silently — a blueprint
/// without offers has nothing to evaluate, and sealed product is out of
/// scope. Listings are stably sorted ascending by price, so equal-priced
/// offers keep their fetch order.
pub fn join_cards(
    blueprints: Vec<Blueprint>,
    mut listings: HashMap<u64, Vec<Listing>>,
    category_id: u64,
) -> HashMap<u64, JoinedCard> {
    let mut cards = HashMap::new();

    for blueprint in blueprints {
        if blueprint.category_id != category_id {
            continue;
        }
        let Some(mut offers) = listings.remove(&blueprint.id) else {
            continue;
        };
        if offers.is_empty() {
            continue;
        }
        offers.sort_by_key(|l| l.price_cents);
        cards.insert(blueprint.id, JoinedCard { blueprint, listings: offers });
    }

    cards
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Condition;

    fn blueprint(id: u64, category_id: u64) -> Blueprint {
        Blueprint {
            id,
            name: format!("Card {id}"),
            game_id: 1,
            category_id,
            expansion_id: 12,
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
            expansion_id: 12,
        }
    }

    fn prices(card: &JoinedCard) -> Vec<u64> {
        card.listings.iter().map(|l| l.price_cents).collect()
    }

    #[test]
    fn test_join_sorts_shuffled_listings() {
        let mut feed = HashMap::new();
        feed.insert(
            10,
            vec![listing(1, 10, 300), listing(2, 10, 100), listing(3, 10, 200)],
        );

        let cards = join_cards(vec![blueprint(10, 1)], feed, 1);
        assert_eq!(prices(&cards[&10]), vec![100, 200, 300]);
    }

    #[test]
    fn test_join_sorts_reverse_sorted_listings() {
        let mut feed = HashMap::new();
        feed.insert(
            10,
            vec![listing(1, 10, 500), listing(2, 10, 400), listing(3, 10, 300)],
        );

        let cards = join_cards(vec![blueprint(10, 1)], feed, 1);
        assert_eq!(prices(&cards[&10]), vec![300, 400, 500]);
    }

    #[test]
    fn test_join_keeps_already_sorted_listings() {
        let mut feed = HashMap::new();
        feed.insert(10, vec![listing(1, 10, 100), listing(2, 10, 100), listing(3, 10, 250)]);

        let cards = join_cards(vec![blueprint(10, 1)], feed, 1);
        assert_eq!(prices(&cards[&10]), vec![100, 100, 250]);
    }

    #[test]
    fn test_join_price_ties_keep_fetch_order() {
        let mut feed = HashMap::new();
        feed.insert(
            10,
            vec![listing(7, 10, 100), listing(3, 10, 100), listing(9, 10, 100)],
        );

        let cards = join_cards(vec![blueprint(10, 1)], feed, 1);
        let ids: Vec<u64> = cards[&10].listings.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }

    #[test]
    fn test_join_drops_foreign_categories() {
        let mut feed = HashMap::new();
        feed.insert(10, vec![listing(1, 10, 100)]);
        feed.insert(20, vec![listing(2, 20, 100)]);

        // 20 is sealed product (category 2)
        let cards = join_cards(vec![blueprint(10, 1), blueprint(20, 2)], feed, 1);
        assert_eq!(cards.len(), 1);
        assert!(cards.contains_key(&10));
        assert!(!cards.contains_key(&20));
    }

    #[test]
    fn test_join_drops_blueprints_without_listings() {
        let mut feed = HashMap::new();
        feed.insert(10, vec![listing(1, 10, 100)]);
        feed.insert(30, Vec::new());

        let cards = join_cards(
            vec![blueprint(10, 1), blueprint(20, 1), blueprint(30, 1)],
            feed,
            1,
        );
        assert_eq!(cards.len(), 1);
        assert!(cards.contains_key(&10));
    }

    #[test]
    fn test_join_empty_inputs() {
        assert!(join_cards(Vec::new(), HashMap::new(), 1).is_empty());
        assert!(join_cards(vec![blueprint(10, 1)], HashMap::new(), 1).is_empty());
    }
}
