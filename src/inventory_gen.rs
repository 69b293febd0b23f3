//! Synthetic Treasury inventory generator.
//!
//! Deterministic, configurable secondary-market inventory for demos, property tests and
//! benchmarks. Same seed ⇒ same inventory. The mix is 20% bills, 50% notes, 30% bonds,
//! each priced off a rough yield level for its part of the curve.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::types::{AuctionListing, SecondaryListing};

const CUSIP_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const LOT_SIZES: [i64; 4] = [1_000, 5_000, 10_000, 25_000];

/// Configuration for the inventory generator.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed. Same seed ⇒ same inventory.
    pub seed: u64,
    /// Number of listings produced by [`Generator::inventory`].
    pub num_records: usize,
    /// Maturities are counted from this date.
    pub today: NaiveDate,
    /// Probability of a bill, then a note; bonds take the rest.
    pub bill_ratio: f64,
    pub note_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_records: 500,
            today: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap_or_default(),
            bill_ratio: 0.2,
            note_ratio: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Bill,
    Note,
    Bond,
}

/// Deterministic listing stream. Create with [`Generator::new`].
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { rng, config }
    }

    /// Mock Treasury CUSIP: `912`, five alphanumerics, one check digit.
    fn cusip(&mut self) -> String {
        let mut s = String::from("912");
        for _ in 0..5 {
            let idx = self.rng.gen_range(0..CUSIP_CHARS.len());
            s.push(CUSIP_CHARS[idx] as char);
        }
        s.push(char::from(b'0' + self.rng.gen_range(0..10u8)));
        s
    }

    fn kind(&mut self) -> Kind {
        let r = self.rng.gen::<f64>();
        if r < self.config.bill_ratio {
            Kind::Bill
        } else if r < self.config.bill_ratio + self.config.note_ratio {
            Kind::Note
        } else {
            Kind::Bond
        }
    }

    /// Next listing. Advances the RNG.
    pub fn next_listing(&mut self) -> SecondaryListing {
        let today = self.config.today;
        let (kind, days, coupon, market_yield) = match self.kind() {
            Kind::Bill => {
                let days = self.rng.gen_range(30..=360i64);
                (Kind::Bill, days, 0.0, self.rng.gen_range(5.20..5.45))
            }
            Kind::Note => {
                let years = self.rng.gen_range(2..=10i64);
                let coupon = self.rng.gen_range(8..48u32) as f64 * 0.125;
                (Kind::Note, years * 365, coupon, self.rng.gen_range(4.10..4.60))
            }
            Kind::Bond => {
                let years = self.rng.gen_range(15..=30i64);
                let coupon = self.rng.gen_range(16..48u32) as f64 * 0.125;
                (Kind::Bond, years * 365, coupon, self.rng.gen_range(4.40..4.70))
            }
        };
        let maturity_date = today + Duration::days(days);
        let price_ask = match kind {
            Kind::Bill => 100.0 - market_yield * (days as f64 / 360.0),
            // Rough duration heuristic, not bond math.
            Kind::Note | Kind::Bond => {
                let years = (days / 365) as f64;
                100.0 + (coupon - market_yield) * years * 0.8
            }
        };
        let label = match kind {
            Kind::Bill => "BILL",
            Kind::Note => "NOTE",
            Kind::Bond => "BOND",
        };
        let lot = LOT_SIZES.choose(&mut self.rng).copied().unwrap_or(1_000) * 1_000;
        let lots = self.rng.gen_range(10..=100i64);
        SecondaryListing {
            cusip: self.cusip(),
            description: format!(
                "US TREASURY {} {:.3}% {}",
                label,
                coupon,
                maturity_date.format("%m/%d/%y")
            ),
            term: None,
            coupon: Some(round3(coupon)),
            yield_to_worst: round3(market_yield),
            price_ask: round3(price_ask),
            maturity_date,
            quantity_available: Decimal::from(lot * lots),
            quantity_min: Decimal::from(lot),
        }
    }

    pub fn take_listings(&mut self, n: usize) -> Vec<SecondaryListing> {
        (0..n).map(|_| self.next_listing()).collect()
    }

    /// `config.num_records` listings.
    pub fn inventory(&mut self) -> Vec<SecondaryListing> {
        self.take_listings(self.config.num_records)
    }

    /// Weekly auction calendar: `n` upcoming auctions, issuing two days after auction.
    pub fn auctions(&mut self, n: usize) -> Vec<AuctionListing> {
        const TERMS: [(&str, &str); 5] = [
            ("Bill", "13-Week"),
            ("Bill", "26-Week"),
            ("Note", "2-Year"),
            ("Note", "10-Year"),
            ("Bond", "30-Year"),
        ];
        (0..n)
            .map(|i| {
                let (security_type, security_term) = TERMS[i % TERMS.len()];
                let auction_date = self.config.today + Duration::days(7 * (i as i64 + 1));
                let billions = self.rng.gen_range(16..=80u32);
                AuctionListing {
                    cusip: self.cusip(),
                    security_type: security_type.to_string(),
                    security_term: security_term.to_string(),
                    auction_date,
                    issue_date: auction_date + Duration::days(2),
                    offering_amount: Decimal::from_u64(billions as u64 * 1_000_000_000)
                        .unwrap_or_default(),
                    status: Some("OPEN".to_string()),
                }
            })
            .collect()
    }
}
