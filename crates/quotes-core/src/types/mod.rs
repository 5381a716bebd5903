//! Core data types for the quote proxy.

mod instrument;
mod quote;

pub use instrument::{SearchHit, Watchlist, WatchlistEntry};
pub use quote::{round_price, Quote};
