//! Valuation multiplier
//!
//! Maps a price/earnings ratio to a 1–5 multiplier and a status band. Three
//! policies are supported and selected explicitly through configuration;
//! they disagree with each other by design and none of them is "the" answer.
//!
//! A PE of zero or below means earnings are missing or negative. Every
//! policy treats that as maximally overvalued (multiplier 1).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PE at or below which the linear policy awards the full multiplier
const LINEAR_FLOOR_PE: f64 = 20.0;
/// PE at or above which the linear policy awards the minimum multiplier
const LINEAR_CEILING_PE: f64 = 75.0;

/// Qualitative valuation band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusBand {
    Undervalued,
    FairValue,
    Overvalued,
}

impl StatusBand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Undervalued => "Undervalued",
            Self::FairValue => "Fair Value",
            Self::Overvalued => "Overvalued",
        }
    }
}

impl fmt::Display for StatusBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Strategy used to turn a PE ratio into a multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationPolicy {
    /// Discrete steps on absolute PE: <20, <35, <50, <75, ≥75
    #[default]
    FixedBands,
    /// Straight line from 5 at PE 20 down to 1 at PE 75
    LinearInterpolation,
    /// Position of the current PE inside its trailing historical range
    HistoricalRange,
}

impl ValuationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedBands => "fixed",
            Self::LinearInterpolation => "linear",
            Self::HistoricalRange => "historical",
        }
    }

    /// Evaluate a PE ratio under this policy
    ///
    /// `pe` is `None` when earnings are missing or not positive. `range` is
    /// only consulted by [`ValuationPolicy::HistoricalRange`].
    pub fn evaluate(self, pe: Option<f64>, range: Option<PeRange>) -> ValuationResult {
        let pe_value = pe.filter(|p| p.is_finite() && *p > 0.0);

        let (multiplier, band) = match pe_value {
            None => (1.0, StatusBand::Overvalued),
            Some(pe) => match self {
                Self::FixedBands => fixed_bands(pe),
                Self::LinearInterpolation => linear(pe),
                Self::HistoricalRange => range.map_or((1.0, StatusBand::Overvalued), |r| {
                    historical_position(pe, r)
                }),
            },
        };

        ValuationResult {
            policy: self,
            pe_ratio: pe_value,
            historical_range: range,
            multiplier,
            band,
        }
    }
}

impl fmt::Display for ValuationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed_bands" | "a" => Ok(Self::FixedBands),
            "linear" | "linear_interpolation" | "b" => Ok(Self::LinearInterpolation),
            "historical" | "historical_range" | "c" => Ok(Self::HistoricalRange),
            other => Err(format!(
                "unknown valuation policy '{other}', expected fixed, linear or historical"
            )),
        }
    }
}

/// Trailing (min, max) PE range
///
/// Built by dividing every close in the lookback window by the *current*
/// EPS. This assumes earnings were constant over the window; it is an
/// approximation kept deliberately, not a bug.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeRange {
    pub min: f64,
    pub max: f64,
}

impl PeRange {
    /// Derive the range from a close series and a single EPS value
    ///
    /// Returns `None` for non-positive EPS or when no finite close exists.
    pub fn from_closes(closes: impl IntoIterator<Item = f64>, eps: f64) -> Option<Self> {
        if !(eps.is_finite() && eps > 0.0) {
            return None;
        }

        closes
            .into_iter()
            .filter(|c| c.is_finite())
            .map(|c| c / eps)
            .fold(None, |acc: Option<Self>, pe| {
                Some(match acc {
                    None => Self { min: pe, max: pe },
                    Some(r) => Self {
                        min: r.min.min(pe),
                        max: r.max.max(pe),
                    },
                })
            })
    }

    /// Relative position of `pe` within the range, clamped below at 0
    ///
    /// Values above 1 mean the PE exceeds the historical high. `None` when
    /// the range is degenerate.
    pub fn position(&self, pe: f64) -> Option<f64> {
        let width = self.max - self.min;
        if !(width.is_finite() && width > 0.0) {
            return None;
        }
        Some(((pe - self.min) / width).max(0.0))
    }
}

/// Output of the valuation multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub policy: ValuationPolicy,
    /// PE ratio, `None` when undefined
    pub pe_ratio: Option<f64>,
    pub historical_range: Option<PeRange>,
    /// 1.0..=5.0, whole steps except under the linear policy
    pub multiplier: f64,
    pub band: StatusBand,
}

fn fixed_bands(pe: f64) -> (f64, StatusBand) {
    if pe < 20.0 {
        (5.0, StatusBand::Undervalued)
    } else if pe < 35.0 {
        (4.0, StatusBand::FairValue)
    } else if pe < 50.0 {
        (3.0, StatusBand::FairValue)
    } else if pe < 75.0 {
        (2.0, StatusBand::Overvalued)
    } else {
        (1.0, StatusBand::Overvalued)
    }
}

fn linear(pe: f64) -> (f64, StatusBand) {
    if pe >= LINEAR_CEILING_PE {
        return (1.0, StatusBand::Overvalued);
    }
    if pe <= LINEAR_FLOOR_PE {
        return (5.0, StatusBand::Undervalued);
    }

    let pct = (pe - LINEAR_FLOOR_PE) / (LINEAR_CEILING_PE - LINEAR_FLOOR_PE);
    let multiplier = round_to(5.0 - pct * 4.0, 2);
    // Bands follow the fixed-band PE cut points.
    let band = if pe < 50.0 {
        StatusBand::FairValue
    } else {
        StatusBand::Overvalued
    };
    (multiplier, band)
}

fn historical_position(pe: f64, range: PeRange) -> (f64, StatusBand) {
    let Some(position) = range.position(pe) else {
        return (1.0, StatusBand::Overvalued);
    };

    if position < 0.25 {
        (5.0, StatusBand::Undervalued)
    } else if position < 0.50 {
        (4.0, StatusBand::FairValue)
    } else if position < 0.75 {
        (3.0, StatusBand::FairValue)
    } else if position < 1.0 {
        (2.0, StatusBand::Overvalued)
    } else {
        (1.0, StatusBand::Overvalued)
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
