//! Wire types shared with the treasury backend.
//!
//! [`SecondaryListing`] and [`AuctionListing`] are what the backend serves for the
//! secondary market and the primary auction calendar. [`OrderRequest`] is what the desk
//! posts; [`OrderRecord`] is what the backend stores and lists back.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Portfolio classification for a purchase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PortfolioType {
    /// Available-for-Sale.
    #[default]
    AFS,
    /// Held-to-Maturity.
    HTM,
}

impl PortfolioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioType::AFS => "AFS",
            PortfolioType::HTM => "HTM",
        }
    }
}

impl std::fmt::Display for PortfolioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type recorded by the backend. Derived from the desk mode, never chosen directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Trade,
    #[serde(rename = "Auction Bid")]
    AuctionBid,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Trade => "Trade",
            OrderType::AuctionBid => "Auction Bid",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which instrument source the order form is working against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskMode {
    /// Already-issued securities from dealer inventory.
    #[default]
    Secondary,
    /// New issuance from the primary auction calendar.
    Auction,
}

impl DeskMode {
    /// Order type submitted in this mode.
    pub fn order_type(&self) -> OrderType {
        match self {
            DeskMode::Secondary => OrderType::Trade,
            DeskMode::Auction => OrderType::AuctionBid,
        }
    }
}

/// One bond in the secondary-market inventory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SecondaryListing {
    pub cusip: String,
    pub description: String,
    /// The inventory table carries no term column, so this is usually absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<f64>,
    /// Percent.
    pub yield_to_worst: f64,
    /// Percent of par.
    pub price_ask: f64,
    #[serde(with = "iso_date")]
    pub maturity_date: NaiveDate,
    pub quantity_available: Decimal,
    pub quantity_min: Decimal,
}

/// One upcoming primary auction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuctionListing {
    pub cusip: String,
    pub security_type: String,
    pub security_term: String,
    #[serde(with = "iso_date")]
    pub auction_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub offering_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Order payload posted to `POST /api/orders`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    pub cusip: String,
    pub term: String,
    pub amount: Decimal,
    pub portfolio_type: PortfolioType,
    pub purchase_yield: f64,
    pub order_type: OrderType,
}

/// A stored order as listed by `GET /api/orders`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderRecord {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub cusip: String,
    pub term: String,
    pub amount: Decimal,
    pub purchase_yield: f64,
    pub portfolio_type: PortfolioType,
    pub order_type: OrderType,
}

/// One tenor on the Treasury yield curve, with optional historical comparisons.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPoint {
    pub term: String,
    pub current: Option<f64>,
    #[serde(default)]
    pub yesterday: Option<f64>,
    #[serde(default)]
    pub last_month: Option<f64>,
    #[serde(default)]
    pub last_year: Option<f64>,
}

/// Parses `YYYY-MM-DD`, dropping any trailing `T...` time component.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let day = raw.trim().split('T').next().unwrap_or("");
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
}

/// Serde adapter for calendar dates sent as ISO strings.
pub(crate) mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        super::parse_iso_date(&raw).map_err(serde::de::Error::custom)
    }
}
