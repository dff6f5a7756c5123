//! Market data providers

pub mod yahoo;

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::StockSnapshot;

pub use yahoo::YahooMarketData;

/// Source of price, earnings and history for a symbol
///
/// Returns [`AnalysisError::DataUnavailable`](crate::error::AnalysisError::DataUnavailable)
/// when the symbol resolves to nothing usable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot>;
}
