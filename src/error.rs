//! Error types for the order workflow.
//!
//! [`ValidationError`] never reaches the network. [`FetchError`] and [`SubmitError`]
//! wrap backend failures; [`DeskError`] is what the desk surface returns.

use rust_decimal::Decimal;

use crate::catalog::Resource;
use crate::order_builder::AmountWarning;

/// Message shown when the backend gives no usable `detail`.
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to submit order";

/// Local form validation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no security selected")]
    NoSecuritySelected,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("amount {requested} exceeds available quantity {available}")]
    ExceedsAvailable { requested: Decimal, available: Decimal },
    #[error("amount {requested} is below the minimum quantity {minimum}")]
    BelowMinimum { requested: Decimal, minimum: Decimal },
}

impl From<AmountWarning> for ValidationError {
    fn from(w: AmountWarning) -> Self {
        match w {
            AmountWarning::ExceedsAvailable {
                requested,
                available,
            } => ValidationError::ExceedsAvailable {
                requested,
                available,
            },
            AmountWarning::BelowMinimum { requested, minimum } => {
                ValidationError::BelowMinimum { requested, minimum }
            }
        }
    }
}

/// Unrecognized amount limit policy name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown amount limit policy {0:?}, expected warn or block")]
pub struct ParsePolicyError(pub String);

/// A GET against the backend failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{resource} request failed: {source}")]
    Transport {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },
    #[error("{resource} returned {status}: {detail}")]
    Status {
        resource: Resource,
        status: u16,
        detail: String,
    },
    #[error("{resource} response could not be decoded: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },
}

/// Order submission failed. The order form is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Backend answered non-2xx; `detail` is its message when one was sent.
    #[error("{}", .detail.as_deref().unwrap_or(GENERIC_SUBMIT_FAILURE))]
    Rejected { status: u16, detail: Option<String> },
    #[error("Failed to submit order: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("an order submission is already in progress")]
    InProgress,
}

impl SubmitError {
    /// Operator-facing message: the backend's `detail` verbatim, else a generic line.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            SubmitError::Rejected { detail: None, .. } | SubmitError::Transport(_) => {
                GENERIC_SUBMIT_FAILURE.to_string()
            }
            SubmitError::InProgress => self.to_string(),
        }
    }
}

/// Errors surfaced by [`crate::Desk`].
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("backend is still initializing")]
    NotReady,
    #[error("security {0} is not available in the current list")]
    UnknownSecurity(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl DeskError {
    pub fn user_message(&self) -> String {
        match self {
            DeskError::Submit(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
