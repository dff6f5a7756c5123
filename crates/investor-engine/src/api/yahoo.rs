//! Yahoo Finance market data

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

use super::MarketDataProvider;
use crate::error::{AnalysisError, Result};
use crate::snapshot::{Bar, CompanyProfile, StockSnapshot};

/// Yahoo Finance backed [`MarketDataProvider`]
///
/// History comes from the chart API; price, EPS and the company profile from
/// `get_ticker_info`, which handles the crumb and cookie handshake. The
/// connector keeps that session between calls.
pub struct YahooMarketData {
    connector: Mutex<yahoo::YahooConnector>,
    history_years: u32,
}

impl YahooMarketData {
    pub fn new(history_years: u32) -> Result<Self> {
        Ok(Self {
            connector: Mutex::new(yahoo::YahooConnector::new()?),
            history_years,
        })
    }

    /// Daily bars covering the configured lookback
    pub async fn fetch_history(&self, symbol: &str) -> Result<Vec<Bar>> {
        let end = Utc::now();
        let start = end - Duration::days(365 * i64::from(self.history_years));

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| AnalysisError::MarketData(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AnalysisError::MarketData(format!("Invalid end timestamp: {e}")))?;

        let response = {
            let connector = self.connector.lock().await;
            connector
                .get_quote_history(symbol, start_odt, end_odt)
                .await?
        };
        let quotes = response.quotes()?;

        Ok(quotes
            .iter()
            .filter(|q| q.close.is_finite() && q.close > 0.0)
            .map(|q| Bar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    /// Price, EPS and profile fields, `None` when Yahoo has no record
    pub async fn fetch_summary(&self, symbol: &str) -> Result<Option<SummaryFields>> {
        let summary = self.connector.lock().await.get_ticker_info(symbol).await?;
        Ok(summary_fields(summary))
    }
}

impl std::fmt::Debug for YahooMarketData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooMarketData")
            .field("history_years", &self.history_years)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    #[instrument(skip(self))]
    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot> {
        let (summary, history) =
            tokio::join!(self.fetch_summary(symbol), self.fetch_history(symbol));

        // An unknown symbol fails the chart call; that is reported as not found below
        let history = history.unwrap_or_else(|e| {
            warn!(error = %e, "price history unavailable");
            Vec::new()
        });
        debug!(
            bars = history.len(),
            summary_ok = summary.is_ok(),
            "market data fetched"
        );

        build_snapshot(symbol, summary, history)
    }
}

/// Fields pulled out of a ticker info response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryFields {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub industry: Option<String>,
    pub summary: Option<String>,
    pub current_price: Option<f64>,
    pub forward_eps: Option<f64>,
    pub trailing_eps: Option<f64>,
}

impl SummaryFields {
    fn price(&self) -> Option<f64> {
        self.current_price.filter(|p| p.is_finite() && *p > 0.0)
    }

    fn eps(&self) -> Option<f64> {
        self.forward_eps
            .or(self.trailing_eps)
            .filter(|e| e.is_finite())
    }
}

/// Combine the summary lookup and history into a snapshot
///
/// A summary that could not be fetched leaves EPS unknown and is recorded in
/// [`StockSnapshot::fundamentals_error`]. The price falls back to the last
/// close. With neither a price nor history the symbol is reported as
/// unavailable, unless the summary lookup itself failed, in which case that
/// error is returned.
pub fn build_snapshot(
    symbol: &str,
    summary: Result<Option<SummaryFields>>,
    history: Vec<Bar>,
) -> Result<StockSnapshot> {
    let last_close = history.last().map(|b| b.close);

    let (summary, fundamentals_error) = match summary {
        Ok(summary) => (summary.unwrap_or_default(), None),
        Err(err) if last_close.is_some() => (SummaryFields::default(), Some(err.to_string())),
        Err(err) => return Err(err),
    };

    let Some(price) = summary.price().or(last_close) else {
        return Err(AnalysisError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no quote or price history".to_string(),
        });
    };

    let eps = summary.eps();
    let defaults = CompanyProfile::for_symbol(symbol);
    let profile = CompanyProfile {
        name: summary.name.unwrap_or(defaults.name),
        currency: summary.currency.unwrap_or(defaults.currency),
        industry: summary.industry.unwrap_or(defaults.industry),
        summary: summary.summary.unwrap_or(defaults.summary),
    };

    Ok(StockSnapshot {
        symbol: symbol.to_string(),
        profile,
        price,
        eps,
        history,
        fundamentals_error,
    })
}

/// Map a ticker info response, `None` when it carries no usable record
pub fn summary_fields(summary: yahoo::YQuoteSummary) -> Option<SummaryFields> {
    let data = summary
        .quote_summary?
        .result
        .and_then(|r| r.into_iter().next())?;

    let profile = data.asset_profile;
    let stats = data.default_key_statistics;
    let financial = data.financial_data;
    let quote_type = data.quote_type;

    let fields = SummaryFields {
        name: non_empty(
            quote_type
                .as_ref()
                .and_then(|qt| qt.long_name.clone().or_else(|| qt.short_name.clone())),
        ),
        currency: non_empty(
            data.summary_detail
                .and_then(|sd| sd.currency)
                .or_else(|| financial.as_ref().and_then(|fd| fd.financial_currency.clone())),
        ),
        industry: non_empty(profile.as_ref().and_then(|p| p.industry.clone())),
        summary: non_empty(profile.and_then(|p| p.long_business_summary)),
        current_price: financial.and_then(|fd| fd.current_price),
        forward_eps: stats.as_ref().and_then(|ks| ks.forward_eps),
        trailing_eps: stats.and_then(|ks| ks.trailing_eps),
    };

    (fields != SummaryFields::default()).then_some(fields)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::bars_from_closes;

    const NVDA_TICKER_INFO: &str = r#"{
        "quoteSummary": {
            "result": [{
                "assetProfile": {
                    "industry": "Semiconductors",
                    "longBusinessSummary": "NVIDIA provides graphics and compute solutions.",
                    "companyOfficers": []
                },
                "summaryDetail": {"currency": "USD", "trailingPE": 61.7},
                "defaultKeyStatistics": {"forwardEps": 4.54, "trailingEps": 2.94},
                "quoteType": {"longName": "NVIDIA Corporation", "shortName": "NVIDIA"},
                "financialData": {"currentPrice": 182.0, "financialCurrency": "USD"}
            }],
            "error": null
        }
    }"#;

    fn ticker_info(body: &str) -> yahoo::YQuoteSummary {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_summary_fields() {
        let fields = summary_fields(ticker_info(NVDA_TICKER_INFO)).unwrap();
        assert_eq!(fields.name.as_deref(), Some("NVIDIA Corporation"));
        assert_eq!(fields.industry.as_deref(), Some("Semiconductors"));
        assert_eq!(fields.currency.as_deref(), Some("USD"));
        assert_eq!(fields.price(), Some(182.0));
        assert_eq!(fields.eps(), Some(4.54));
    }

    #[test]
    fn test_summary_falls_back_to_trailing_eps() {
        let body = r#"{"quoteSummary": {"result": [{
            "defaultKeyStatistics": {"trailingEps": -1.2},
            "quoteType": {"shortName": "Loss Co"},
            "financialData": {"currentPrice": 50.0, "financialCurrency": "CAD"}
        }], "error": null}}"#;

        let fields = summary_fields(ticker_info(body)).unwrap();
        assert_eq!(fields.price(), Some(50.0));
        assert_eq!(fields.eps(), Some(-1.2));
        assert_eq!(fields.name.as_deref(), Some("Loss Co"));
        assert_eq!(fields.currency.as_deref(), Some("CAD"));
        assert_eq!(fields.industry, None);
    }

    #[test]
    fn test_summary_without_record() {
        let body = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found"}}}"#;
        assert_eq!(summary_fields(ticker_info(body)), None);

        let body = r#"{"quoteSummary": {"result": [{}], "error": null}}"#;
        assert_eq!(summary_fields(ticker_info(body)), None);

        let body = r#"{"finance": {"result": null, "error": {"code": "Unauthorized"}}}"#;
        assert_eq!(summary_fields(ticker_info(body)), None);
    }

    #[test]
    fn test_build_snapshot_defaults_profile() {
        let snap = build_snapshot("0700.HK", Ok(None), bars_from_closes(&[300.0, 310.0])).unwrap();
        assert_eq!(snap.price, 310.0);
        assert_eq!(snap.eps, None);
        assert_eq!(snap.fundamentals_error, None);
        assert_eq!(snap.profile, CompanyProfile::for_symbol("0700.HK"));
    }

    #[test]
    fn test_build_snapshot_prefers_quote_price() {
        let summary = summary_fields(ticker_info(NVDA_TICKER_INFO));
        let snap = build_snapshot("NVDA", Ok(summary), bars_from_closes(&[170.0])).unwrap();
        assert_eq!(snap.price, 182.0);
        assert_eq!(snap.profile.name, "NVIDIA Corporation");
        assert!((snap.pe_ratio().unwrap() - 182.0 / 4.54).abs() < 1e-9);
    }

    #[test]
    fn test_failed_summary_is_recorded_not_hidden() {
        let failed = Err(AnalysisError::MarketData("Unauthorized".to_string()));
        let snap = build_snapshot("NVDA", failed, bars_from_closes(&[170.0, 171.0])).unwrap();

        assert_eq!(snap.price, 171.0);
        assert_eq!(snap.eps, None);
        assert_eq!(
            snap.fundamentals_error.as_deref(),
            Some("Market data error: Unauthorized")
        );
    }

    #[test]
    fn test_failed_summary_without_history_is_not_not_found() {
        let failed = Err(AnalysisError::MarketData("connection reset".to_string()));
        let err = build_snapshot("NVDA", failed, Vec::new()).unwrap_err();

        assert!(matches!(err, AnalysisError::MarketData(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_nothing_found_is_data_unavailable() {
        let err = build_snapshot("ZZZZ", Ok(None), Vec::new()).unwrap_err();
        assert!(err.is_not_found());

        let no_price = SummaryFields {
            name: Some("Shell Co".to_string()),
            ..SummaryFields::default()
        };
        assert!(build_snapshot("ZZZZ", Ok(Some(no_price)), Vec::new()).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_snapshot_live() {
        let provider = YahooMarketData::new(1).unwrap();
        let snap = provider.fetch_snapshot("AAPL").await.unwrap();
        assert_eq!(snap.symbol, "AAPL");
        assert!(snap.price > 0.0);
        assert!(snap.eps.is_some());
        assert_eq!(snap.fundamentals_error, None);
        assert!(!snap.history.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_live() {
        let provider = YahooMarketData::new(1).unwrap();
        let err = provider.fetch_snapshot("INVALID_SYMBOL_12345").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
