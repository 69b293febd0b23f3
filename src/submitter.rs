//! Sends validated orders to the backend, one at a time.
//!
//! Every accepted order bumps a revision on a `watch` channel; the order-history view
//! subscribes with [`OrderSubmitter::subscribe`] and reloads when it changes.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};
use tokio::sync::watch;

use crate::client::BackendClient;
use crate::error::SubmitError;
use crate::types::{OrderRecord, OrderRequest, OrderType};

/// Backend acknowledgement of an order, with the operator confirmation line.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OrderAck {
    pub order: OrderRecord,
    pub message: String,
}

/// `Trade Submitted!` or `Bid Submitted!`.
pub fn confirmation_message(order_type: OrderType) -> String {
    match order_type {
        OrderType::Trade => "Trade Submitted!".to_string(),
        OrderType::AuctionBid => "Bid Submitted!".to_string(),
    }
}

/// Clears the in-flight flag when the submission ends, including when its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct OrderSubmitter {
    client: BackendClient,
    in_flight: AtomicBool,
    accepted: watch::Sender<u64>,
}

impl OrderSubmitter {
    pub fn new(client: BackendClient) -> Self {
        let (accepted, _) = watch::channel(0);
        Self {
            client,
            in_flight: AtomicBool::new(false),
            accepted,
        }
    }

    /// Receiver of the accepted-order revision. Changes once per accepted order.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.accepted.subscribe()
    }

    /// Number of orders accepted so far.
    pub fn accepted_revision(&self) -> u64 {
        *self.accepted.borrow()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Posts `request`. Fails with [`SubmitError::InProgress`] while another submission
    /// is outstanding. Does not retry.
    pub async fn submit(&self, request: &OrderRequest) -> Result<OrderAck, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::InProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        info!(
            "order submitted cusip={} amount={} portfolio={} order_type={} purchase_yield={}",
            request.cusip, request.amount, request.portfolio_type, request.order_type, request.purchase_yield
        );
        match self.client.create_order(request).await {
            Ok(order) => {
                info!(
                    "order accepted id={} cusip={} order_type={}",
                    order.id, order.cusip, order.order_type
                );
                self.accepted.send_modify(|revision| *revision += 1);
                Ok(OrderAck {
                    message: confirmation_message(request.order_type),
                    order,
                })
            }
            Err(e) => {
                error!("order rejected cusip={} reason={}", request.cusip, e);
                Err(e)
            }
        }
    }
}
