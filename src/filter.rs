//! Yield and maturity-date range filter over secondary-market inventory.
//!
//! [`filter_inventory`] is pure and order-preserving. [`FilterRange::from_inventory`]
//! derives the initial bounds from a freshly fetched inventory.

use chrono::NaiveDate;

use crate::types::{parse_iso_date, SecondaryListing};

/// Yield bounds used before any inventory is known, percent.
pub const DEFAULT_YIELD_RANGE: (f64, f64) = (0.0, 10.0);

/// Maturity-date bounds. The date predicate only applies when both ends are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    #[serde(default, with = "date_bound")]
    pub start: Option<NaiveDate>,
    #[serde(default, with = "date_bound")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Both bounds set.
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => true,
        }
    }
}

/// Yield range (inclusive, percent) plus maturity-date range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterRange {
    pub yield_range: (f64, f64),
    #[serde(default)]
    pub date_range: DateRange,
}

impl Default for FilterRange {
    fn default() -> Self {
        Self {
            yield_range: DEFAULT_YIELD_RANGE,
            date_range: DateRange::default(),
        }
    }
}

impl FilterRange {
    pub fn new(yield_range: (f64, f64), date_range: DateRange) -> Self {
        Self {
            yield_range,
            date_range,
        }
    }

    /// Bounds spanning the whole inventory: min/max yield-to-worst and min/max maturity.
    /// An empty inventory gives the default range.
    pub fn from_inventory(inventory: &[SecondaryListing]) -> Self {
        let Some(first) = inventory.first() else {
            return Self::default();
        };
        let mut lo = first.yield_to_worst;
        let mut hi = first.yield_to_worst;
        let mut start = first.maturity_date;
        let mut end = first.maturity_date;
        for item in &inventory[1..] {
            lo = lo.min(item.yield_to_worst);
            hi = hi.max(item.yield_to_worst);
            start = start.min(item.maturity_date);
            end = end.max(item.maturity_date);
        }
        Self {
            yield_range: (lo, hi),
            date_range: DateRange::new(Some(start), Some(end)),
        }
    }

    pub fn matches(&self, item: &SecondaryListing) -> bool {
        let (lo, hi) = self.yield_range;
        let in_yield = lo <= item.yield_to_worst && item.yield_to_worst <= hi;
        in_yield && self.date_range.contains(item.maturity_date)
    }
}

/// Items of `inventory` inside `range`, in their original order.
pub fn filter_inventory<'a>(
    inventory: &'a [SecondaryListing],
    range: &FilterRange,
) -> Vec<&'a SecondaryListing> {
    inventory.iter().filter(|item| range.matches(item)).collect()
}

/// Parses a date bound from operator input. Blank input is an open bound.
pub fn parse_date_bound(raw: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_iso_date(raw).map(Some)
}

/// Serde adapter: `null`, missing or `""` is an open bound.
mod date_bound {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => s.collect_str(&d.format("%Y-%m-%d")),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) => super::parse_date_bound(&s).map_err(serde::de::Error::custom),
        }
    }
}
