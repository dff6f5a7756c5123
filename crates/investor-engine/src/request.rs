//! Analysis request and exchange-specific ticker formatting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AnalysisError, Result};

/// Exchange a ticker is listed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    #[default]
    Us,
    /// Toronto Stock Exchange
    Canada,
    /// Hong Kong Exchange
    HongKong,
}

impl Market {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Canada => "tsx",
            Self::HongKong => "hkex",
        }
    }

    /// Turn user input into the provider symbol for this market
    ///
    /// `"shop"` on TSX becomes `"SHOP.TO"`, `"700"` on HKEX becomes
    /// `"0700.HK"`.
    pub fn format_symbol(self, raw: &str) -> Result<String> {
        let ticker = raw.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidSymbol(raw.to_string()));
        }

        let symbol = match self {
            Self::Us => ticker,
            Self::Canada => {
                if ticker.ends_with(".TO") {
                    ticker
                } else {
                    format!("{ticker}.TO")
                }
            }
            Self::HongKong => {
                let digits: String = ticker.chars().filter(char::is_ascii_digit).collect();
                if digits.is_empty() {
                    format!("{ticker}.HK")
                } else {
                    format!("{digits:0>4}.HK")
                }
            }
        };

        Ok(symbol)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" | "usa" | "nasdaq" | "nyse" => Ok(Self::Us),
            "tsx" | "ca" | "canada" => Ok(Self::Canada),
            "hkex" | "hk" | "hong_kong" => Ok(Self::HongKong),
            other => Err(format!("unknown market '{other}', expected us, tsx or hkex")),
        }
    }
}

/// One analysis invocation
///
/// Carries everything a run needs so the engine keeps no session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub id: Uuid,
    /// Ticker as entered by the user
    pub ticker: String,
    pub market: Market,
}

impl AnalysisRequest {
    pub fn new(ticker: impl Into<String>, market: Market) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            market,
        }
    }

    /// Provider symbol for this request
    pub fn symbol(&self) -> Result<String> {
        self.market.format_symbol(&self.ticker)
    }
}
