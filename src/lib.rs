//! # Treasury Desk
//!
//! Order-construction workflow for a bank treasury desk: filter secondary-market bond
//! inventory by yield and maturity, pick a bond or an upcoming primary auction, build a
//! validated order and submit it to the treasury backend.
//!
//! ## Entry point
//!
//! Use [`Desk`] as the single entry point: create with [`Desk::new`], start the health
//! poll with [`Desk::start_health_poll`], load data with [`Desk::load_all`], drive the
//! form through [`Desk::update`] and submit with [`Desk::submit`].
//!
//! ## Example
//!
//! ```rust
//! use treasury_desk::{DeskMode, DeskState, OrderType, PortfolioType, Resource};
//! use treasury_desk::types::{parse_iso_date, AuctionListing};
//! use rust_decimal::Decimal;
//!
//! let mut state = DeskState::default();
//! let ticket = state.begin_fetch(Resource::Auctions);
//! state.apply_auctions(ticket, vec![AuctionListing {
//!     cusip: "B2".into(),
//!     security_type: "Note".into(),
//!     security_term: "10-Year".into(),
//!     auction_date: parse_iso_date("2025-05-28").unwrap(),
//!     issue_date: parse_iso_date("2025-06-01").unwrap(),
//!     offering_amount: Decimal::from(1_000_000),
//!     status: None,
//! }]);
//! state.set_mode(DeskMode::Auction);
//! state.select("B2").unwrap();
//! state.set_amount(Decimal::from(50_000));
//! state.set_portfolio(PortfolioType::HTM);
//! let order = state.build_order_request().unwrap();
//! assert_eq!(order.order_type, OrderType::AuctionBid);
//! assert_eq!(order.purchase_yield, 0.0);
//! ```
//!
//! ## Lower-level API
//!
//! You can also use [`filter_inventory`], [`OrderBuilder`] and [`OrderSubmitter`] directly
//! if you manage fetching and state yourself.

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod desk;
pub mod error;
pub mod filter;
pub mod health;
pub mod inventory_gen;
pub mod order_builder;
pub mod security;
pub mod submitter;
pub mod types;

pub use catalog::{FetchTicket, FetchTracker, Resource, SecurityCatalog};
pub use client::BackendClient;
pub use config::DeskConfig;
pub use desk::{Desk, DeskState, InventoryView, OrderFormView, SelectionOption};
pub use error::{DeskError, FetchError, ParsePolicyError, SubmitError, ValidationError};
pub use filter::{filter_inventory, DateRange, FilterRange};
pub use health::{HealthPoller, Readiness};
pub use inventory_gen::{Generator, GeneratorConfig};
pub use order_builder::{AmountLimitPolicy, AmountWarning, OrderBuilder, OrderPreview};
pub use security::{from_auction, from_secondary, SecurityDetail, SelectableSecurity};
pub use submitter::{OrderAck, OrderSubmitter};
pub use types::{
    AuctionListing, DeskMode, OrderRecord, OrderRequest, OrderType, PortfolioType,
    SecondaryListing, YieldPoint,
};
