//! Fetched backend data and the stale-response guard around it.
//!
//! [`SecurityCatalog`] stores the raw inventory and auction list; `None` means not yet
//! loaded, which is distinct from a loaded empty list. [`FetchTracker`] hands out one
//! generation ticket per request so only the latest response for a resource is applied,
//! and nothing is applied after the desk is closed.

use std::collections::HashMap;

use crate::types::{AuctionListing, SecondaryListing};

/// Backend resource a request is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Health,
    Inventory,
    Auctions,
    Yields,
    Orders,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Health => "health",
            Resource::Inventory => "inventory",
            Resource::Auctions => "auctions",
            Resource::Yields => "yields",
            Resource::Orders => "orders",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw secondary inventory and auction list, as last fetched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SecurityCatalog {
    inventory: Option<Vec<SecondaryListing>>,
    auctions: Option<Vec<AuctionListing>>,
}

impl SecurityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(&self) -> Option<&[SecondaryListing]> {
        self.inventory.as_deref()
    }

    pub fn auctions(&self) -> Option<&[AuctionListing]> {
        self.auctions.as_deref()
    }

    pub fn set_inventory(&mut self, inventory: Vec<SecondaryListing>) {
        self.inventory = Some(inventory);
    }

    pub fn set_auctions(&mut self, auctions: Vec<AuctionListing>) {
        self.auctions = Some(auctions);
    }
}

/// Identifies one request for a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub resource: Resource,
    pub generation: u64,
}

/// Latest generation per resource, plus the closed flag set on teardown.
#[derive(Clone, Debug, Default)]
pub struct FetchTracker {
    latest: HashMap<Resource, u64>,
    closed: bool,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket newer than every earlier ticket for `resource`.
    pub fn begin(&mut self, resource: Resource) -> FetchTicket {
        let generation = self.latest.entry(resource).or_insert(0);
        *generation += 1;
        FetchTicket {
            resource,
            generation: *generation,
        }
    }

    /// True if no newer request was issued for the ticket's resource and the tracker is open.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        !self.closed && self.latest.get(&ticket.resource) == Some(&ticket.generation)
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
