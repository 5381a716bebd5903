//! Core trait definitions.

mod quote_source;

pub use quote_source::QuoteSource;
