//! Market data snapshot consumed by the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::valuation::PeRange;

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Descriptive company fields used by prompts and the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub currency: String,
    pub industry: String,
    /// Long business summary, may be empty
    pub summary: String,
}

impl CompanyProfile {
    /// Profile with the documented defaults for missing fields
    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            name: symbol.to_string(),
            currency: "USD".to_string(),
            industry: "Unknown".to_string(),
            summary: String::new(),
        }
    }
}

/// Everything fetched for one ticker in one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub profile: CompanyProfile,
    /// Current trading price
    pub price: f64,
    /// Forward EPS, else trailing EPS
    pub eps: Option<f64>,
    /// Daily bars in chronological order
    pub history: Vec<Bar>,
    /// Why price, EPS and profile could not be fetched, if they could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundamentals_error: Option<String>,
}

impl StockSnapshot {
    /// `price / eps` when EPS is positive
    pub fn pe_ratio(&self) -> Option<f64> {
        match self.eps {
            Some(eps) if eps.is_finite() && eps > 0.0 && self.price.is_finite() => {
                Some(self.price / eps)
            }
            _ => None,
        }
    }

    /// PE range over the whole history, assuming EPS held constant
    pub fn historical_pe_range(&self) -> Option<PeRange> {
        let eps = self.eps?;
        PeRange::from_closes(self.history.iter().map(|b| b.close), eps)
    }

    /// Close of the most recent bar
    pub fn last_close(&self) -> Option<f64> {
        self.history.last().map(|b| b.close)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::snapshot;
    use super::*;

    #[test]
    fn test_pe_ratio() {
        assert_eq!(snapshot(100.0, Some(4.0), &[]).pe_ratio(), Some(25.0));
        assert_eq!(snapshot(100.0, Some(0.0), &[]).pe_ratio(), None);
        assert_eq!(snapshot(100.0, Some(-3.0), &[]).pe_ratio(), None);
        assert_eq!(snapshot(100.0, None, &[]).pe_ratio(), None);
    }

    #[test]
    fn test_historical_pe_range_uses_current_eps() {
        let snap = snapshot(120.0, Some(4.0), &[40.0, 200.0, 120.0]);
        let range = snap.historical_pe_range().unwrap();
        assert_eq!(range.min, 10.0);
        assert_eq!(range.max, 50.0);
        assert_eq!(snap.last_close(), Some(120.0));
    }

    #[test]
    fn test_profile_defaults() {
        let profile = CompanyProfile::for_symbol("0700.HK");
        assert_eq!(profile.name, "0700.HK");
        assert_eq!(profile.currency, "USD");
        assert_eq!(profile.industry, "Unknown");
        assert!(profile.summary.is_empty());
    }
}
