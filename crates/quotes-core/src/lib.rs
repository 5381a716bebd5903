//! Core types and traits for the quote proxy.
//!
//! This crate provides the foundational building blocks including:
//! - Quote and instrument types (Quote, SearchHit, Watchlist)
//! - The error taxonomy shared by every layer
//! - The QuoteSource trait seaming the serving layer from the vendor client

pub mod error;
pub mod traits;
pub mod types;

pub use error::{QuoteError, QuoteResult};
pub use traits::*;
pub use types::*;
