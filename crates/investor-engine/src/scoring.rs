//! Final score and verdict

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::valuation::round_to;

/// Overall recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    StrongBuy,
    Hold,
    /// Lowest band of the standard table
    SellAvoid,
    Sell,
    Avoid,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Hold => "HOLD",
            Self::SellAvoid => "SELL / AVOID",
            Self::Sell => "SELL",
            Self::Avoid => "AVOID",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A score at or above `min_score` earns `verdict`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictBand {
    pub min_score: f64,
    pub verdict: Verdict,
}

/// Ordered verdict table
///
/// Bands are checked from the highest threshold down; a score below every
/// threshold gets `floor`. Deserialized tables go through [`VerdictBands::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVerdictBands")]
pub struct VerdictBands {
    bands: Vec<VerdictBand>,
    floor: Verdict,
}

#[derive(Deserialize)]
struct RawVerdictBands {
    bands: Vec<VerdictBand>,
    floor: Verdict,
}

impl TryFrom<RawVerdictBands> for VerdictBands {
    type Error = AnalysisError;

    fn try_from(raw: RawVerdictBands) -> Result<Self> {
        Self::new(raw.bands, raw.floor)
    }
}

impl Default for VerdictBands {
    fn default() -> Self {
        Self::standard()
    }
}

impl VerdictBands {
    /// `>= 75` strong buy, `>= 45` hold, otherwise sell/avoid
    pub fn standard() -> Self {
        Self {
            bands: vec![
                VerdictBand {
                    min_score: 75.0,
                    verdict: Verdict::StrongBuy,
                },
                VerdictBand {
                    min_score: 45.0,
                    verdict: Verdict::Hold,
                },
            ],
            floor: Verdict::SellAvoid,
        }
    }

    /// Standard table with the lowest band split at 30 into sell and avoid
    pub fn granular() -> Self {
        let mut bands = Self::standard().bands;
        bands.push(VerdictBand {
            min_score: 30.0,
            verdict: Verdict::Sell,
        });
        Self {
            bands,
            floor: Verdict::Avoid,
        }
    }

    /// Custom table, thresholds in any order
    pub fn new(mut bands: Vec<VerdictBand>, floor: Verdict) -> Result<Self> {
        if bands.iter().any(|b| !b.min_score.is_finite()) {
            return Err(AnalysisError::Config(
                "verdict thresholds must be finite".to_string(),
            ));
        }
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        if bands.windows(2).any(|w| w[0].min_score == w[1].min_score) {
            return Err(AnalysisError::Config(
                "verdict thresholds must be distinct".to_string(),
            ));
        }
        Ok(Self { bands, floor })
    }

    pub fn bands(&self) -> &[VerdictBand] {
        &self.bands
    }

    pub fn floor(&self) -> Verdict {
        self.floor
    }

    pub fn classify(&self, score: f64) -> Verdict {
        self.bands
            .iter()
            .find(|b| score >= b.min_score)
            .map_or(self.floor, |b| b.verdict)
    }
}

/// Combined score handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub qualitative_total: f64,
    pub multiplier: f64,
    /// `qualitative_total * multiplier`, one decimal, 0.0..=100.0
    pub final_score: f64,
    pub verdict: Verdict,
}

pub fn combine(qualitative_total: f64, multiplier: f64, bands: &VerdictBands) -> FinalResult {
    let final_score = round_to(qualitative_total * multiplier, 1);
    FinalResult {
        qualitative_total,
        multiplier,
        final_score,
        verdict: bands.classify(final_score),
    }
}
