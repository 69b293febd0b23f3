//! Normalizes secondary listings and auction entries into one [`SelectableSecurity`].
//!
//! The rest of the order workflow only branches on [`SelectableSecurity::is_auction`];
//! the source-specific fields live in [`SecurityDetail`], so exactly one shape is
//! populated per instance.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{AuctionListing, SecondaryListing};

/// Auction securities are bid at par until the auction sets the yield.
pub const PAR_PRICE: f64 = 100.00;

/// Source-specific part of a selectable security.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SecurityDetail {
    Secondary {
        yield_to_worst: f64,
        #[serde(with = "crate::types::iso_date")]
        maturity_date: NaiveDate,
        quantity_available: Decimal,
        quantity_min: Decimal,
    },
    Auction {
        #[serde(with = "crate::types::iso_date")]
        issue_date: NaiveDate,
        offering_amount: Decimal,
    },
}

/// A security the operator can put an order on, whatever market it came from.
///
/// Serialized with the derived `is_auction` and `purchase_yield` next to the stored
/// fields; both are recomputed, not read back, on deserialization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(into = "SecurityJson", from = "SecurityJson")]
pub struct SelectableSecurity {
    pub cusip: String,
    pub description: String,
    pub term: Option<String>,
    pub price_ask: f64,
    pub detail: SecurityDetail,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SecurityJson {
    cusip: String,
    description: String,
    term: Option<String>,
    price_ask: f64,
    #[serde(default)]
    is_auction: bool,
    #[serde(default)]
    purchase_yield: f64,
    #[serde(flatten)]
    detail: SecurityDetail,
}

impl From<SelectableSecurity> for SecurityJson {
    fn from(s: SelectableSecurity) -> Self {
        Self {
            is_auction: s.is_auction(),
            purchase_yield: s.purchase_yield(),
            cusip: s.cusip,
            description: s.description,
            term: s.term,
            price_ask: s.price_ask,
            detail: s.detail,
        }
    }
}

impl From<SecurityJson> for SelectableSecurity {
    fn from(j: SecurityJson) -> Self {
        Self {
            cusip: j.cusip,
            description: j.description,
            term: j.term,
            price_ask: j.price_ask,
            detail: j.detail,
        }
    }
}

impl SelectableSecurity {
    pub fn is_auction(&self) -> bool {
        matches!(self.detail, SecurityDetail::Auction { .. })
    }

    /// Yield recorded on the order: the ask yield-to-worst, or 0 for auctions
    /// (unknown until the auction closes).
    pub fn purchase_yield(&self) -> f64 {
        match self.detail {
            SecurityDetail::Secondary { yield_to_worst, .. } => yield_to_worst,
            SecurityDetail::Auction { .. } => 0.0,
        }
    }

    /// Term sent on the order, `N/A` when the source had none.
    pub fn order_term(&self) -> String {
        match self.term.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => "N/A".to_string(),
        }
    }

    /// `(quantity_min, quantity_available)` for secondary securities.
    pub fn quantity_limits(&self) -> Option<(Decimal, Decimal)> {
        match self.detail {
            SecurityDetail::Secondary {
                quantity_min,
                quantity_available,
                ..
            } => Some((quantity_min, quantity_available)),
            SecurityDetail::Auction { .. } => None,
        }
    }
}

/// Identity mapping of a secondary listing.
pub fn from_secondary(listing: &SecondaryListing) -> SelectableSecurity {
    SelectableSecurity {
        cusip: listing.cusip.clone(),
        description: listing.description.clone(),
        term: listing.term.clone(),
        price_ask: listing.price_ask,
        detail: SecurityDetail::Secondary {
            yield_to_worst: listing.yield_to_worst,
            maturity_date: listing.maturity_date,
            quantity_available: listing.quantity_available,
            quantity_min: listing.quantity_min,
        },
    }
}

/// Reshapes an auction entry: described as `AUCTION: {type} - {term}`, priced at par.
pub fn from_auction(listing: &AuctionListing) -> SelectableSecurity {
    SelectableSecurity {
        cusip: listing.cusip.clone(),
        description: format!(
            "AUCTION: {} - {}",
            listing.security_type, listing.security_term
        ),
        term: Some(listing.security_term.clone()),
        price_ask: PAR_PRICE,
        detail: SecurityDetail::Auction {
            issue_date: listing.issue_date,
            offering_amount: listing.offering_amount,
        },
    }
}

/// `MM/DD/YYYY`, or `N/A` when there is no date.
pub fn format_us_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%m/%d/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// Picker label for a secondary listing.
pub fn secondary_label(listing: &SecondaryListing) -> String {
    format!("{} | YTM: {:.2}%", listing.description, listing.yield_to_worst)
}

/// Picker label for an auction entry.
pub fn auction_label(listing: &AuctionListing) -> String {
    format!(
        "{} | {} {}",
        format_us_date(Some(listing.auction_date)),
        listing.security_term,
        listing.security_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> SecondaryListing {
        SecondaryListing {
            cusip: "A1".into(),
            description: "US TREASURY NOTE 2.500% 01/01/30".into(),
            term: None,
            coupon: Some(2.5),
            yield_to_worst: 2.5,
            price_ask: 99.875,
            maturity_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            quantity_available: Decimal::from(500_000),
            quantity_min: Decimal::from(1_000),
        }
    }

    fn ten_year() -> AuctionListing {
        AuctionListing {
            cusip: "B2".into(),
            security_type: "Note".into(),
            security_term: "10-Year".into(),
            auction_date: NaiveDate::from_ymd_opt(2025, 5, 28).unwrap(),
            issue_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            offering_amount: Decimal::from(1_000_000),
            status: None,
        }
    }

    #[test]
    fn from_secondary_keeps_cusip_and_yield() {
        let s = from_secondary(&note());
        assert_eq!(s.cusip, "A1");
        assert!(!s.is_auction());
        assert_eq!(s.purchase_yield(), 2.5);
        assert_eq!(s.price_ask, 99.875);
        assert_eq!(s.order_term(), "N/A");
        assert_eq!(
            s.quantity_limits(),
            Some((Decimal::from(1_000), Decimal::from(500_000)))
        );
    }

    #[test]
    fn from_auction_prices_at_par_with_zero_yield() {
        let s = from_auction(&ten_year());
        assert_eq!(s.cusip, "B2");
        assert!(s.is_auction());
        assert_eq!(s.purchase_yield(), 0.0);
        assert_eq!(s.price_ask, 100.00);
        assert_eq!(s.description, "AUCTION: Note - 10-Year");
        assert_eq!(s.order_term(), "10-Year");
        assert!(s.quantity_limits().is_none());
        match s.detail {
            SecurityDetail::Auction {
                issue_date,
                offering_amount,
            } => {
                assert_eq!(issue_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
                assert_eq!(offering_amount, Decimal::from(1_000_000));
            }
            other => panic!("expected auction detail, got {:?}", other),
        }
    }

    #[test]
    fn labels_match_picker_format() {
        assert_eq!(
            secondary_label(&note()),
            "US TREASURY NOTE 2.500% 01/01/30 | YTM: 2.50%"
        );
        assert_eq!(auction_label(&ten_year()), "05/28/2025 | 10-Year Note");
        assert_eq!(format_us_date(None), "N/A");
    }

    #[test]
    fn serialized_security_is_tagged_by_source() {
        let v = serde_json::to_value(from_auction(&ten_year())).unwrap();
        assert_eq!(v["source"], "auction");
        assert_eq!(v["issue_date"], "2025-06-01");
        assert_eq!(v["is_auction"], true);
        assert_eq!(v["purchase_yield"], 0.0);
        let back: SelectableSecurity = serde_json::from_value(v).unwrap();
        assert!(back.is_auction());
    }

    #[test]
    fn serialized_secondary_carries_derived_fields() {
        let original = from_secondary(&note());
        let v = serde_json::to_value(&original).unwrap();
        assert_eq!(v["source"], "secondary");
        assert_eq!(v["is_auction"], false);
        assert_eq!(v["purchase_yield"].as_f64(), Some(original.purchase_yield()));
        let back: SelectableSecurity = serde_json::from_value(v).unwrap();
        assert_eq!(back, original);
    }
}
