//! Capital.com client: session management and market data retrieval.
//!
//! [`SessionManager`] owns the credential exchange and caches the pair of
//! opaque session tokens every authenticated call must carry.
//! [`MarketGateway`] resolves instrument codes to prices and answers
//! free-text instrument searches, implementing [`quotes_core::QuoteSource`].

mod market;
mod session;

pub use market::MarketGateway;
pub use session::{Credentials, Session, SessionManager};
