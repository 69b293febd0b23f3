//! Two-mode order form state machine.
//!
//! [`OrderBuilder`] holds the active [`DeskMode`], the current selection, the requested
//! par amount and the portfolio. Switching mode always drops the selection, so a
//! secondary security can never be submitted as an auction bid or vice versa.
//! [`OrderBuilder::build_order_request`] validates and produces an [`OrderRequest`]
//! without side effects.

use std::str::FromStr;

use log::{debug, warn};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{ParsePolicyError, ValidationError};
use crate::security::{format_us_date, from_auction, from_secondary, SecurityDetail, SelectableSecurity};
use crate::types::{AuctionListing, DeskMode, OrderRequest, PortfolioType, SecondaryListing};

/// Par amount the form starts with.
pub const DEFAULT_PAR_AMOUNT: i64 = 1_000_000;

/// What to do when a secondary order breaks the listing's quantity limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountLimitPolicy {
    /// Report the breach through [`OrderBuilder::amount_warnings`], submit anyway and
    /// let the backend decide.
    #[default]
    Warn,
    /// Refuse to build the order.
    Block,
}

impl FromStr for AmountLimitPolicy {
    type Err = ParsePolicyError;

    /// `warn` or `block`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("warn") {
            Ok(Self::Warn)
        } else if s.eq_ignore_ascii_case("block") {
            Ok(Self::Block)
        } else {
            Err(ParsePolicyError(s.to_string()))
        }
    }
}

/// Quantity limit breach on a secondary order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AmountWarning {
    ExceedsAvailable { requested: Decimal, available: Decimal },
    BelowMinimum { requested: Decimal, minimum: Decimal },
}

impl std::fmt::Display for AmountWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountWarning::ExceedsAvailable { .. } => {
                f.write_str("Amount exceeds available inventory.")
            }
            AmountWarning::BelowMinimum { minimum, .. } => {
                write!(f, "Amount is below the minimum quantity {}.", minimum)
            }
        }
    }
}

/// Order details shown before submitting.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OrderPreview {
    Secondary {
        cusip: String,
        price: f64,
        yield_to_worst: f64,
        /// `amount * price_ask / 100`; absent while the amount is invalid.
        estimated_cost: Option<Decimal>,
    },
    Auction {
        cusip: String,
        issue_date: String,
        offering_amount: Decimal,
    },
}

/// Order form state. Serializable so a controller can snapshot or restore it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderBuilder {
    mode: DeskMode,
    selection: Option<SelectableSecurity>,
    /// `None` when the operator's input did not parse.
    amount: Option<Decimal>,
    portfolio: PortfolioType,
    policy: AmountLimitPolicy,
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new(AmountLimitPolicy::default())
    }
}

impl OrderBuilder {
    pub fn new(policy: AmountLimitPolicy) -> Self {
        Self {
            mode: DeskMode::Secondary,
            selection: None,
            amount: Some(Decimal::from(DEFAULT_PAR_AMOUNT)),
            portfolio: PortfolioType::AFS,
            policy,
        }
    }

    pub fn mode(&self) -> DeskMode {
        self.mode
    }

    pub fn selection(&self) -> Option<&SelectableSecurity> {
        self.selection.as_ref()
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn portfolio(&self) -> PortfolioType {
        self.portfolio
    }

    pub fn policy(&self) -> AmountLimitPolicy {
        self.policy
    }

    /// Switches mode and discards the selection, even when the mode is unchanged.
    pub fn set_mode(&mut self, mode: DeskMode) {
        debug!("order form mode={:?} (selection cleared)", mode);
        self.mode = mode;
        self.selection = None;
    }

    /// Selects `cusip` from the filtered inventory. Returns `false` and leaves no
    /// selection when the CUSIP is not there; returns `false` without touching state
    /// when not in secondary mode.
    pub fn select_secondary(&mut self, filtered: &[&SecondaryListing], cusip: &str) -> bool {
        if self.mode != DeskMode::Secondary {
            warn!("secondary selection ignored in mode={:?} cusip={}", self.mode, cusip);
            return false;
        }
        self.selection = filtered
            .iter()
            .find(|item| item.cusip == cusip)
            .map(|item| from_secondary(item));
        self.selection.is_some()
    }

    /// Selects `cusip` from the auction list. Same contract as [`Self::select_secondary`].
    pub fn select_auction(&mut self, auctions: &[AuctionListing], cusip: &str) -> bool {
        if self.mode != DeskMode::Auction {
            warn!("auction selection ignored in mode={:?} cusip={}", self.mode, cusip);
            return false;
        }
        self.selection = auctions
            .iter()
            .find(|item| item.cusip == cusip)
            .map(from_auction);
        self.selection.is_some()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Stores the par amount as given; range checks happen on build.
    pub fn set_amount(&mut self, amount: Decimal) {
        self.amount = Some(amount);
    }

    /// Stores a float amount. NaN and infinities become the invalid-amount sentinel.
    pub fn set_amount_f64(&mut self, amount: f64) {
        self.amount = if amount.is_finite() {
            Decimal::from_f64(amount)
        } else {
            None
        };
    }

    /// Parses operator text (`"250000"`, `"1,000,000"`). Unparseable text becomes the
    /// invalid-amount sentinel.
    pub fn set_amount_input(&mut self, raw: &str) {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        self.amount = Decimal::from_str(&cleaned).ok();
    }

    pub fn set_portfolio(&mut self, portfolio: PortfolioType) {
        self.portfolio = portfolio;
    }

    /// Quantity limit breaches for the current secondary selection.
    pub fn amount_warnings(&self) -> Vec<AmountWarning> {
        let mut out = Vec::new();
        if self.mode != DeskMode::Secondary {
            return out;
        }
        let (Some(requested), Some(security)) = (self.amount, self.selection.as_ref()) else {
            return out;
        };
        if let Some((minimum, available)) = security.quantity_limits() {
            if requested > available {
                out.push(AmountWarning::ExceedsAvailable {
                    requested,
                    available,
                });
            }
            if requested < minimum {
                out.push(AmountWarning::BelowMinimum { requested, minimum });
            }
        }
        out
    }

    pub fn preview(&self) -> Option<OrderPreview> {
        let security = self.selection.as_ref()?;
        let preview = match &security.detail {
            SecurityDetail::Secondary { yield_to_worst, .. } => OrderPreview::Secondary {
                cusip: security.cusip.clone(),
                price: security.price_ask,
                yield_to_worst: *yield_to_worst,
                estimated_cost: self.amount.and_then(|amount| {
                    let price = Decimal::from_f64(security.price_ask)?;
                    amount
                        .checked_mul(price)
                        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                        .map(|v| v.round_dp(2))
                }),
            },
            SecurityDetail::Auction {
                issue_date,
                offering_amount,
            } => OrderPreview::Auction {
                cusip: security.cusip.clone(),
                issue_date: format_us_date(Some(*issue_date)),
                offering_amount: *offering_amount,
            },
        };
        Some(preview)
    }

    /// Validates the form and builds the order payload.
    pub fn build_order_request(&self) -> Result<OrderRequest, ValidationError> {
        let security = self
            .selection
            .as_ref()
            .ok_or(ValidationError::NoSecuritySelected)?;
        let amount = match self.amount {
            Some(a) if a > Decimal::ZERO => a,
            _ => return Err(ValidationError::InvalidAmount),
        };
        for breach in self.amount_warnings() {
            warn!("order amount limit cusip={} {}", security.cusip, breach);
            if self.policy == AmountLimitPolicy::Block {
                return Err(ValidationError::from(breach));
            }
        }
        Ok(OrderRequest {
            cusip: security.cusip.clone(),
            term: security.order_term(),
            amount,
            portfolio_type: self.portfolio,
            purchase_yield: security.purchase_yield(),
            order_type: self.mode.order_type(),
        })
    }
}
