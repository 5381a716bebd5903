//! Instrument references: watch-list entries and search results.

use serde::{Deserialize, Serialize};

/// One instrument from a free-text search against the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Vendor instrument code.
    pub epic: String,
    /// Human-readable instrument name.
    pub name: String,
    /// Vendor instrument category (SHARES, INDICES, CRYPTOCURRENCIES, ...).
    pub instrument_type: String,
}

/// A display name bound to a vendor instrument code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub name: String,
    pub epic: String,
}

impl WatchlistEntry {
    pub fn new(name: impl Into<String>, epic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            epic: epic.into(),
        }
    }
}

/// The fixed set of instruments queried by the batch quote endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn new(entries: Vec<WatchlistEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
