//! Property-based invariant tests over generated inventory.
//!
//! Uses proptest to pick a generator seed, filter bounds and form inputs, then asserts:
//! the filter returns exactly the matching listings in order, switching mode clears the
//! selection, building fails without a selection or a positive amount, and the order
//! type follows the mode.

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;
use treasury_desk::{
    filter_inventory, from_auction, from_secondary, AmountLimitPolicy, DateRange, DeskMode,
    FilterRange, Generator, GeneratorConfig, OrderBuilder, OrderType, SecondaryListing,
    ValidationError,
};

fn inventory(seed: u64, n: usize) -> Vec<SecondaryListing> {
    Generator::new(GeneratorConfig {
        seed,
        num_records: n,
        ..Default::default()
    })
    .inventory()
}

/// Reference predicate, written out independently of `FilterRange::matches`.
fn expected(inventory: &[SecondaryListing], range: &FilterRange) -> Vec<String> {
    let (lo, hi) = range.yield_range;
    inventory
        .iter()
        .filter(|l| lo <= l.yield_to_worst && l.yield_to_worst <= hi)
        .filter(|l| match (range.date_range.start, range.date_range.end) {
            (Some(s), Some(e)) => s <= l.maturity_date && l.maturity_date <= e,
            _ => true,
        })
        .map(|l| l.cusip.clone())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Output is exactly the matching subsequence of the input.
    #[test]
    fn prop_filter_is_exact_ordered_subsequence(
        seed in 0u64..100_000u64,
        n in 0usize..120usize,
        lo in 4.0f64..5.5f64,
        width in 0.0f64..1.5f64,
        start_days in proptest::option::of(0i64..12_000i64),
        span_days in 0i64..8_000i64,
    ) {
        let items = inventory(seed, n);
        let today = GeneratorConfig::default().today;
        let start = start_days.map(|d| today + Duration::days(d));
        let end = start.map(|s| s + Duration::days(span_days));
        let range = FilterRange::new((lo, lo + width), DateRange::new(start, end));

        let got: Vec<String> = filter_inventory(&items, &range)
            .into_iter()
            .map(|l| l.cusip.clone())
            .collect();
        prop_assert_eq!(got, expected(&items, &range));
    }

    /// A range derived from the inventory lets every listing through.
    #[test]
    fn prop_inventory_range_keeps_everything(seed in 0u64..100_000u64, n in 1usize..80usize) {
        let items = inventory(seed, n);
        let range = FilterRange::from_inventory(&items);
        prop_assert_eq!(filter_inventory(&items, &range).len(), items.len());
    }

    /// Normalized securities keep their CUSIP; auctions are at par with zero yield.
    #[test]
    fn prop_normalization_keeps_identity(seed in 0u64..100_000u64) {
        let mut generator = Generator::new(GeneratorConfig { seed, ..Default::default() });
        let listing = generator.next_listing();
        let s = from_secondary(&listing);
        prop_assert_eq!(&s.cusip, &listing.cusip);
        prop_assert!(!s.is_auction());
        for a in generator.auctions(3) {
            let s = from_auction(&a);
            prop_assert_eq!(&s.cusip, &a.cusip);
            prop_assert!(s.is_auction());
            prop_assert_eq!(s.purchase_yield(), 0.0);
            prop_assert_eq!(s.price_ask, 100.00);
        }
    }

    /// Selecting a listing and then switching to auction mode always clears the selection.
    #[test]
    fn prop_mode_switch_clears_selection(seed in 0u64..100_000u64, pick in 0usize..20usize) {
        let items = inventory(seed, 20);
        let refs: Vec<&SecondaryListing> = items.iter().collect();
        let mut builder = OrderBuilder::new(AmountLimitPolicy::Warn);
        prop_assert!(builder.select_secondary(&refs, &items[pick].cusip));
        builder.set_mode(DeskMode::Auction);
        prop_assert!(builder.selection().is_none());
    }

    /// No selection or a non-positive amount never builds, in either mode.
    #[test]
    fn prop_validation_gates_build(
        seed in 0u64..100_000u64,
        auction_mode in any::<bool>(),
        select in any::<bool>(),
        amount in -1_000_000i64..1_000_000i64,
    ) {
        let mut generator = Generator::new(GeneratorConfig { seed, num_records: 5, ..Default::default() });
        let items = generator.inventory();
        let auctions = generator.auctions(3);
        let mut builder = OrderBuilder::new(AmountLimitPolicy::Warn);
        if auction_mode {
            builder.set_mode(DeskMode::Auction);
            if select {
                builder.select_auction(&auctions, &auctions[0].cusip);
            }
        } else if select {
            let refs: Vec<&SecondaryListing> = items.iter().collect();
            builder.select_secondary(&refs, &items[0].cusip);
        }
        builder.set_amount(Decimal::from(amount));

        let result = builder.build_order_request();
        if !select {
            prop_assert_eq!(result, Err(ValidationError::NoSecuritySelected));
        } else if amount <= 0 {
            prop_assert_eq!(result, Err(ValidationError::InvalidAmount));
        } else {
            let order = result.unwrap();
            prop_assert_eq!(order.order_type == OrderType::AuctionBid, auction_mode);
        }
    }
}

/// Same seed ⇒ same filtered view.
#[test]
fn deterministic_filter_same_seed_same_outcome() {
    let range = FilterRange::new((4.2, 4.5), DateRange::default());
    let a = inventory(999, 300);
    let b = inventory(999, 300);
    let fa: Vec<&str> = filter_inventory(&a, &range).into_iter().map(|l| l.cusip.as_str()).collect();
    let fb: Vec<&str> = filter_inventory(&b, &range).into_iter().map(|l| l.cusip.as_str()).collect();
    assert!(!fa.is_empty());
    assert_eq!(fa, fb);
}
