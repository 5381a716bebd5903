//! QuoteSource trait definition.

use crate::error::QuoteResult;
use crate::types::{Quote, SearchHit, Watchlist};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Trait for market data sources.
///
/// A source resolves instrument codes to prices and answers free-text
/// instrument searches. The serving layer depends only on this trait.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the raw bid/offer snapshot for an exact vendor code.
    ///
    /// No venue normalization is applied; the epic is requested as given.
    async fn quote(&self, epic: &str) -> QuoteResult<Quote>;

    /// Resolve a code to a single price.
    ///
    /// Bare tickers are venue-qualified first; the snapshot is then reduced
    /// to a mid price (or the bid alone) rounded to two decimals.
    async fn price(&self, code: &str) -> QuoteResult<Decimal>;

    /// Free-text instrument search, returning at most `limit` hits in the
    /// vendor's relevance order.
    async fn search(&self, term: &str, limit: usize) -> QuoteResult<Vec<SearchHit>>;

    /// Price every watch-list entry independently.
    ///
    /// A failed lookup occupies its own slot; it never drops or aborts the
    /// remaining entries. Every requested name appears exactly once.
    async fn batch(&self, watchlist: &Watchlist) -> HashMap<String, QuoteResult<Decimal>> {
        let mut results = HashMap::with_capacity(watchlist.len());
        for entry in &watchlist.entries {
            results.insert(entry.name.clone(), self.price(&entry.epic).await);
        }
        results
    }

    /// Source name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteError;
    use crate::types::WatchlistEntry;
    use rust_decimal_macros::dec;

    struct StubSource;

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn quote(&self, epic: &str) -> QuoteResult<Quote> {
            Ok(Quote::new(epic, Some(dec!(100)), Some(dec!(101))))
        }

        async fn price(&self, code: &str) -> QuoteResult<Decimal> {
            match code {
                "BAD" => Err(QuoteError::PriceNotFound(code.to_string())),
                _ => Ok(dec!(100.50)),
            }
        }

        async fn search(&self, _term: &str, _limit: usize) -> QuoteResult<Vec<SearchHit>> {
            Ok(vec![])
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn batch_isolates_failures_and_keeps_every_key() {
        let watchlist = Watchlist::new(vec![
            WatchlistEntry::new("A", "BAD"),
            WatchlistEntry::new("B", "GS.US"),
        ]);

        let results = StubSource.batch(&watchlist).await;

        assert_eq!(results.len(), 2);
        assert!(matches!(results["A"], Err(QuoteError::PriceNotFound(_))));
        assert_eq!(*results["B"].as_ref().unwrap(), dec!(100.50));
    }

    #[tokio::test]
    async fn batch_of_empty_watchlist_is_empty() {
        let results = StubSource.batch(&Watchlist::default()).await;
        assert!(results.is_empty());
    }
}
