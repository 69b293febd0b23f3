//! Desk controller: one explicit state object plus the async operations around it.
//!
//! [`DeskState`] holds everything the order workflow reads or changes, with plain
//! synchronous transitions. [`Desk`] owns it behind a mutex (never held across an
//! `.await`) together with the backend client, the order submitter and the readiness
//! flag, and runs fetches with stale-response guards.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::{FetchTicket, FetchTracker, Resource, SecurityCatalog};
use crate::client::BackendClient;
use crate::config::DeskConfig;
use crate::error::{DeskError, FetchError, ValidationError};
use crate::filter::{filter_inventory, FilterRange};
use crate::health::{HealthPoller, Readiness};
use crate::order_builder::{AmountLimitPolicy, AmountWarning, OrderBuilder, OrderPreview};
use crate::security::{auction_label, secondary_label, SelectableSecurity};
use crate::submitter::{OrderAck, OrderSubmitter};
use crate::types::{
    AuctionListing, DeskMode, OrderRecord, OrderRequest, PortfolioType, SecondaryListing,
    YieldPoint,
};

/// Filter range and the inventory it lets through. `items` is `None` until loaded.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct InventoryView {
    pub filter: FilterRange,
    pub total: Option<usize>,
    pub items: Option<Vec<SecondaryListing>>,
}

/// Everything the order form renders.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OrderFormView {
    pub mode: DeskMode,
    pub selection: Option<SelectableSecurity>,
    pub amount: Option<Decimal>,
    pub portfolio_type: PortfolioType,
    pub policy: AmountLimitPolicy,
    pub warnings: Vec<AmountWarning>,
    pub preview: Option<OrderPreview>,
    pub submitting: bool,
}

/// One entry of the security picker.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SelectionOption {
    pub cusip: String,
    pub label: String,
}

/// All order workflow state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DeskState {
    catalog: SecurityCatalog,
    filter: FilterRange,
    builder: OrderBuilder,
    yields: Option<Vec<YieldPoint>>,
    orders: Option<Vec<OrderRecord>>,
    #[serde(skip)]
    fetches: FetchTracker,
}

impl Default for DeskState {
    fn default() -> Self {
        Self::new(AmountLimitPolicy::default())
    }
}

impl DeskState {
    pub fn new(policy: AmountLimitPolicy) -> Self {
        Self {
            catalog: SecurityCatalog::new(),
            filter: FilterRange::default(),
            builder: OrderBuilder::new(policy),
            yields: None,
            orders: None,
            fetches: FetchTracker::new(),
        }
    }

    pub fn catalog(&self) -> &SecurityCatalog {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterRange {
        &self.filter
    }

    pub fn builder(&self) -> &OrderBuilder {
        &self.builder
    }

    pub fn yields(&self) -> Option<&[YieldPoint]> {
        self.yields.as_deref()
    }

    pub fn orders(&self) -> Option<&[OrderRecord]> {
        self.orders.as_deref()
    }

    /// Inventory inside the current filter range; `None` until the inventory is loaded.
    pub fn filtered_inventory(&self) -> Option<Vec<&SecondaryListing>> {
        self.catalog
            .inventory()
            .map(|inventory| filter_inventory(inventory, &self.filter))
    }

    pub fn auction_list(&self) -> Option<&[AuctionListing]> {
        self.catalog.auctions()
    }

    pub fn selected_security(&self) -> Option<&SelectableSecurity> {
        self.builder.selection()
    }

    /// Picker entries for the current mode; `None` until that list is loaded.
    pub fn selection_options(&self) -> Option<Vec<SelectionOption>> {
        match self.builder.mode() {
            DeskMode::Secondary => self.filtered_inventory().map(|items| {
                items
                    .into_iter()
                    .map(|l| SelectionOption {
                        cusip: l.cusip.clone(),
                        label: secondary_label(l),
                    })
                    .collect()
            }),
            DeskMode::Auction => self.catalog.auctions().map(|auctions| {
                auctions
                    .iter()
                    .map(|a| SelectionOption {
                        cusip: a.cusip.clone(),
                        label: auction_label(a),
                    })
                    .collect()
            }),
        }
    }

    pub fn inventory_view(&self) -> InventoryView {
        let items = self
            .filtered_inventory()
            .map(|items| items.into_iter().cloned().collect::<Vec<_>>());
        InventoryView {
            filter: self.filter,
            total: self.catalog.inventory().map(|i| i.len()),
            items,
        }
    }

    pub fn set_filter(&mut self, filter: FilterRange) {
        self.filter = filter;
    }

    pub fn set_mode(&mut self, mode: DeskMode) {
        self.builder.set_mode(mode);
    }

    /// Selects `cusip` from the list belonging to the current mode: the filtered
    /// inventory in secondary mode, the auction list in auction mode.
    pub fn select(&mut self, cusip: &str) -> Result<(), DeskError> {
        let found = match self.builder.mode() {
            DeskMode::Secondary => {
                let filtered = self
                    .catalog
                    .inventory()
                    .map(|inventory| filter_inventory(inventory, &self.filter))
                    .unwrap_or_default();
                self.builder.select_secondary(&filtered, cusip)
            }
            DeskMode::Auction => {
                let auctions = self.catalog.auctions().unwrap_or(&[]);
                self.builder.select_auction(auctions, cusip)
            }
        };
        if found {
            Ok(())
        } else {
            Err(DeskError::UnknownSecurity(cusip.to_string()))
        }
    }

    pub fn clear_selection(&mut self) {
        self.builder.clear_selection();
    }

    pub fn set_amount(&mut self, amount: Decimal) {
        self.builder.set_amount(amount);
    }

    pub fn set_amount_input(&mut self, raw: &str) {
        self.builder.set_amount_input(raw);
    }

    pub fn set_amount_f64(&mut self, amount: f64) {
        self.builder.set_amount_f64(amount);
    }

    pub fn set_portfolio(&mut self, portfolio: PortfolioType) {
        self.builder.set_portfolio(portfolio);
    }

    pub fn build_order_request(&self) -> Result<OrderRequest, ValidationError> {
        self.builder.build_order_request()
    }

    pub fn order_form_view(&self, submitting: bool) -> OrderFormView {
        OrderFormView {
            mode: self.builder.mode(),
            selection: self.builder.selection().cloned(),
            amount: self.builder.amount(),
            portfolio_type: self.builder.portfolio(),
            policy: self.builder.policy(),
            warnings: self.builder.amount_warnings(),
            preview: self.builder.preview(),
            submitting,
        }
    }

    pub fn begin_fetch(&mut self, resource: Resource) -> FetchTicket {
        self.fetches.begin(resource)
    }

    /// Stops accepting fetch responses.
    pub fn close(&mut self) {
        self.fetches.close();
    }

    pub fn is_closed(&self) -> bool {
        self.fetches.is_closed()
    }

    fn accept(&self, ticket: &FetchTicket) -> bool {
        let current = self.fetches.is_current(ticket);
        if !current {
            debug!(
                "discarding {} response generation={} (stale or closed)",
                ticket.resource, ticket.generation
            );
        }
        current
    }

    /// Applies an inventory response. The first load also sets the filter range to span it.
    pub fn apply_inventory(&mut self, ticket: FetchTicket, inventory: Vec<SecondaryListing>) -> bool {
        if !self.accept(&ticket) {
            return false;
        }
        if self.catalog.inventory().is_none() {
            self.filter = FilterRange::from_inventory(&inventory);
        }
        self.catalog.set_inventory(inventory);
        true
    }

    pub fn apply_auctions(&mut self, ticket: FetchTicket, auctions: Vec<AuctionListing>) -> bool {
        if !self.accept(&ticket) {
            return false;
        }
        self.catalog.set_auctions(auctions);
        true
    }

    pub fn apply_yields(&mut self, ticket: FetchTicket, yields: Vec<YieldPoint>) -> bool {
        if !self.accept(&ticket) {
            return false;
        }
        self.yields = Some(yields);
        true
    }

    pub fn apply_orders(&mut self, ticket: FetchTicket, orders: Vec<OrderRecord>) -> bool {
        if !self.accept(&ticket) {
            return false;
        }
        self.orders = Some(orders);
        true
    }
}

/// Order workflow controller shared by the REST layer and the binary.
#[derive(Debug)]
pub struct Desk {
    state: Mutex<DeskState>,
    client: BackendClient,
    submitter: OrderSubmitter,
    readiness: Readiness,
    poll_cancel: CancellationToken,
    order_history_limit: u32,
}

impl Desk {
    pub fn new(client: BackendClient, policy: AmountLimitPolicy, order_history_limit: u32) -> Self {
        Self {
            state: Mutex::new(DeskState::new(policy)),
            submitter: OrderSubmitter::new(client.clone()),
            client,
            readiness: Readiness::new(),
            poll_cancel: CancellationToken::new(),
            order_history_limit,
        }
    }

    pub fn from_config(config: &DeskConfig) -> Result<Self, reqwest::Error> {
        let client = BackendClient::with_timeout(config.api_url.clone(), config.request_timeout)?;
        Ok(Self::new(
            client,
            config.amount_policy,
            config.order_history_limit,
        ))
    }

    fn lock(&self) -> MutexGuard<'_, DeskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&DeskState) -> R) -> R {
        f(&self.lock())
    }

    /// Runs one state transition.
    pub fn update<R>(&self, f: impl FnOnce(&mut DeskState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    /// Revision bumped once per accepted order; the order-history view reloads on change.
    pub fn subscribe_order_accepted(&self) -> watch::Receiver<u64> {
        self.submitter.subscribe()
    }

    pub fn order_form(&self) -> OrderFormView {
        let submitting = self.submitter.is_submitting();
        self.with_state(|s| s.order_form_view(submitting))
    }

    /// Starts polling `/api/health`. The poller stops on first success or on [`Desk::close`].
    pub fn start_health_poll(&self, interval: Duration) -> JoinHandle<()> {
        HealthPoller::new(self.client.clone(), interval, self.readiness.clone())
            .with_cancel_token(self.poll_cancel.child_token())
            .spawn()
    }

    /// Teardown: stops the health poller and drops any fetch response still in flight.
    pub fn close(&self) {
        self.poll_cancel.cancel();
        self.update(|s| s.close());
        info!("desk closed");
    }

    pub async fn load_inventory(&self) -> Result<(), DeskError> {
        let ticket = self.update(|s| s.begin_fetch(Resource::Inventory));
        let result = self.client.inventory().await;
        self.finish(ticket, result, DeskState::apply_inventory)
    }

    pub async fn load_auctions(&self) -> Result<(), DeskError> {
        let ticket = self.update(|s| s.begin_fetch(Resource::Auctions));
        let result = self.client.auctions().await;
        self.finish(ticket, result, DeskState::apply_auctions)
    }

    pub async fn load_yields(&self) -> Result<(), DeskError> {
        let ticket = self.update(|s| s.begin_fetch(Resource::Yields));
        let result = self.client.yields().await;
        self.finish(ticket, result, DeskState::apply_yields)
    }

    pub async fn load_orders(&self) -> Result<(), DeskError> {
        let ticket = self.update(|s| s.begin_fetch(Resource::Orders));
        let result = self.client.orders(0, self.order_history_limit).await;
        self.finish(ticket, result, DeskState::apply_orders)
    }

    /// Fetches every resource concurrently. Failures are logged and returned; the
    /// affected lists keep their previous contents.
    pub async fn load_all(&self) -> Vec<DeskError> {
        let (inventory, auctions, yields, orders) = tokio::join!(
            self.load_inventory(),
            self.load_auctions(),
            self.load_yields(),
            self.load_orders()
        );
        [inventory, auctions, yields, orders]
            .into_iter()
            .filter_map(Result::err)
            .collect()
    }

    fn finish<T>(
        &self,
        ticket: FetchTicket,
        result: Result<T, FetchError>,
        apply: fn(&mut DeskState, FetchTicket, T) -> bool,
    ) -> Result<(), DeskError> {
        match result {
            Ok(data) => {
                if self.update(|s| apply(s, ticket, data)) {
                    debug!("{} loaded generation={}", ticket.resource, ticket.generation);
                }
                Ok(())
            }
            Err(e) => {
                error!("Error fetching {}: {}", ticket.resource, e);
                Err(e.into())
            }
        }
    }

    /// Validates the form and submits the order. On acceptance the submitted selection is
    /// cleared and inventory and order history are reloaded. On failure the form is untouched.
    pub async fn submit(&self) -> Result<OrderAck, DeskError> {
        if !self.is_ready() {
            return Err(DeskError::NotReady);
        }
        let request = self.with_state(|s| s.build_order_request())?;
        let ack = self.submitter.submit(&request).await?;
        self.update(|s| {
            // The operator may have picked another security while the POST was in flight.
            if s.selected_security().is_some_and(|sel| sel.cusip == request.cusip) {
                s.clear_selection();
            }
        });
        let (inventory, orders) = tokio::join!(self.load_inventory(), self.load_orders());
        for e in [inventory, orders].into_iter().filter_map(Result::err) {
            debug!("refresh after order id={} failed: {}", ack.order.id, e);
        }
        Ok(ack)
    }
}
