//! Technical signal engine
//!
//! Reduces a daily OHLCV history to a handful of readings (trend against
//! the 50/200 SMAs, RSI, volume surge, 60-bar support/resistance and a
//! volatility squeeze flag) and runs them through a fixed decision table.
//!
//! By default support and resistance are taken over the `range_window` bars
//! *before* the latest one, so the latest close can actually break below
//! support. [`LevelWindow::IncludingLatest`] counts the latest bar as well.

use serde::{Deserialize, Serialize};
use std::fmt;
use ta::Next;
use ta::indicators::{Maximum, Minimum, SimpleMovingAverage, StandardDeviation};

use crate::error::{AnalysisError, Result};
use crate::snapshot::Bar;

/// Windows and thresholds used by [`TechnicalSignalEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalParams {
    /// Fewer bars than this yields [`TechnicalOutcome::InsufficientData`]
    pub min_bars: usize,
    pub fast_sma: usize,
    pub slow_sma: usize,
    pub rsi_period: usize,
    pub volume_window: usize,
    /// Support/resistance lookback
    pub range_window: usize,
    #[serde(default)]
    pub level_window: LevelWindow,
    pub squeeze_short: usize,
    pub squeeze_long: usize,
    /// Squeeze when `stddev(short) < squeeze_ratio * stddev(long)`
    pub squeeze_ratio: f64,
    /// "Near support" when `close < support * support_proximity`
    pub support_proximity: f64,
    pub volume_surge: f64,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            min_bars: 200,
            fast_sma: 50,
            slow_sma: 200,
            rsi_period: 14,
            volume_window: 20,
            range_window: 60,
            level_window: LevelWindow::PriorBars,
            squeeze_short: 10,
            squeeze_long: 60,
            squeeze_ratio: 0.5,
            support_proximity: 1.05,
            volume_surge: 1.5,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl TechnicalParams {
    /// Largest number of bars any reading looks back over
    pub fn required_bars(&self) -> usize {
        [
            self.fast_sma,
            self.slow_sma,
            self.rsi_period + 1,
            self.volume_window,
            self.range_window + self.level_window.skipped_bars(),
            self.squeeze_short,
            self.squeeze_long,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("fast_sma", self.fast_sma),
            ("slow_sma", self.slow_sma),
            ("rsi_period", self.rsi_period),
            ("volume_window", self.volume_window),
            ("range_window", self.range_window),
            ("squeeze_short", self.squeeze_short),
            ("squeeze_long", self.squeeze_long),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(AnalysisError::Config(format!("{name} must be greater than 0")));
        }

        if self.min_bars < self.required_bars() {
            return Err(AnalysisError::Config(format!(
                "min_bars ({}) must cover the longest window ({})",
                self.min_bars,
                self.required_bars()
            )));
        }

        let thresholds = [
            self.squeeze_ratio,
            self.support_proximity,
            self.volume_surge,
            self.overbought,
            self.oversold,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(AnalysisError::Config(
                "technical thresholds must be finite and non-negative".to_string(),
            ));
        }
        if self.oversold >= self.overbought || self.overbought > 100.0 {
            return Err(AnalysisError::Config(
                "RSI thresholds must satisfy oversold < overbought <= 100".to_string(),
            ));
        }

        Ok(())
    }
}

/// Which bars the support/resistance lookback covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelWindow {
    /// The `range_window` bars before the latest bar
    #[default]
    PriorBars,
    /// The last `range_window` bars, latest included
    IncludingLatest,
}

impl LevelWindow {
    fn skipped_bars(self) -> usize {
        match self {
            Self::PriorBars => 1,
            Self::IncludingLatest => 0,
        }
    }
}

/// Trend classification against the moving averages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// Above both the slow and the fast SMA
    Uptrend,
    /// Above the slow SMA, below the fast one
    WeakUptrend,
    Downtrend,
    /// No classification available
    #[default]
    Neutral,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uptrend => "Uptrend",
            Self::WeakUptrend => "Weak Uptrend",
            Self::Downtrend => "Downtrend",
            Self::Neutral => "Neutral",
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, Self::Uptrend | Self::WeakUptrend)
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recommendation produced by the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    BuySupportBounce,
    StrongBuyBreakout,
    PrepareToBuyVcp,
    HoldTakeProfit,
    BuyHold,
    SellAvoid,
    WatchOversold,
    AvoidSell,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Self::BuySupportBounce => "BUY (Support Bounce)",
            Self::StrongBuyBreakout => "STRONG BUY (Breakout)",
            Self::PrepareToBuyVcp => "PREPARE TO BUY (VCP)",
            Self::HoldTakeProfit => "HOLD / TAKE PROFIT",
            Self::BuyHold => "BUY / HOLD",
            Self::SellAvoid => "SELL / AVOID",
            Self::WatchOversold => "WATCH (Oversold)",
            Self::AvoidSell => "AVOID / SELL",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::BuySupportBounce => "near support in uptrend",
            Self::StrongBuyBreakout => "high volume surge",
            Self::PrepareToBuyVcp => "volatility squeeze detected",
            Self::HoldTakeProfit => "overbought",
            Self::BuyHold => "healthy uptrend",
            Self::SellAvoid => "breaking support",
            Self::WatchOversold => "potential oversold bounce",
            Self::AvoidSell => "in downtrend",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Readings and verdict for a sufficiently long history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalResult {
    pub trend: Trend,
    pub last_close: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    /// 0..=100
    pub rsi: f64,
    /// Latest volume over the trailing average, 1.0 when the average is 0
    pub volume_ratio: f64,
    pub support: f64,
    pub resistance: f64,
    pub is_squeezing: bool,
    pub action: Action,
    pub reason: String,
}

/// Outcome of a technical analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TechnicalOutcome {
    Signal(TechnicalResult),
    InsufficientData { bars: usize, required: usize },
}

impl TechnicalOutcome {
    pub fn signal(&self) -> Option<&TechnicalResult> {
        match self {
            Self::Signal(result) => Some(result),
            Self::InsufficientData { .. } => None,
        }
    }

    /// Trend, or [`Trend::Neutral`] without a signal
    pub fn trend(&self) -> Trend {
        self.signal().map_or(Trend::Neutral, |r| r.trend)
    }
}

#[derive(Debug, Clone, Copy)]
struct Readings {
    last_close: f64,
    sma_fast: f64,
    sma_slow: f64,
    rsi: f64,
    volume_ratio: f64,
    support: f64,
    resistance: f64,
    is_squeezing: bool,
}

/// Stateless technical analyzer
///
/// Indicator prototypes are validated once at construction and cloned per
/// call, so [`analyze`](Self::analyze) cannot fail and keeps no state
/// between calls.
#[derive(Debug, Clone)]
pub struct TechnicalSignalEngine {
    params: TechnicalParams,
    sma_fast: SimpleMovingAverage,
    sma_slow: SimpleMovingAverage,
    avg_gain: SimpleMovingAverage,
    avg_loss: SimpleMovingAverage,
    avg_volume: SimpleMovingAverage,
    support: Minimum,
    resistance: Maximum,
    dev_short: StandardDeviation,
    dev_long: StandardDeviation,
}

impl TechnicalSignalEngine {
    pub fn new(params: TechnicalParams) -> Result<Self> {
        params.validate()?;

        let sma = |period: usize| {
            SimpleMovingAverage::new(period).map_err(|e| AnalysisError::Indicator(e.to_string()))
        };
        let dev = |period: usize| {
            StandardDeviation::new(period).map_err(|e| AnalysisError::Indicator(e.to_string()))
        };

        Ok(Self {
            params,
            sma_fast: sma(params.fast_sma)?,
            sma_slow: sma(params.slow_sma)?,
            avg_gain: sma(params.rsi_period)?,
            avg_loss: sma(params.rsi_period)?,
            avg_volume: sma(params.volume_window)?,
            support: Minimum::new(params.range_window)
                .map_err(|e| AnalysisError::Indicator(e.to_string()))?,
            resistance: Maximum::new(params.range_window)
                .map_err(|e| AnalysisError::Indicator(e.to_string()))?,
            dev_short: dev(params.squeeze_short)?,
            dev_long: dev(params.squeeze_long)?,
        })
    }

    pub fn params(&self) -> &TechnicalParams {
        &self.params
    }

    /// Analyze a chronological bar series
    pub fn analyze(&self, bars: &[Bar]) -> TechnicalOutcome {
        if bars.len() < self.params.min_bars {
            return TechnicalOutcome::InsufficientData {
                bars: bars.len(),
                required: self.params.min_bars,
            };
        }

        let readings = self.readings(bars);
        let trend = classify_trend(&readings);
        let action = decide(&self.params, trend, &readings);

        TechnicalOutcome::Signal(TechnicalResult {
            trend,
            last_close: readings.last_close,
            sma_fast: readings.sma_fast,
            sma_slow: readings.sma_slow,
            rsi: readings.rsi,
            volume_ratio: readings.volume_ratio,
            support: readings.support,
            resistance: readings.resistance,
            is_squeezing: readings.is_squeezing,
            action,
            reason: action.reason().to_string(),
        })
    }

    fn readings(&self, bars: &[Bar]) -> Readings {
        let p = &self.params;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let last_close = closes[closes.len() - 1];

        let sma_fast = last_value(&self.sma_fast, tail(&closes, p.fast_sma).iter().copied());
        let sma_slow = last_value(&self.sma_slow, tail(&closes, p.slow_sma).iter().copied());

        let rsi = self.rsi(tail(&closes, p.rsi_period + 1));

        let volumes = tail(bars, p.volume_window).iter().map(|b| b.volume as f64);
        let avg_volume = last_value(&self.avg_volume, volumes);
        let last_volume = bars[bars.len() - 1].volume as f64;
        let volume_ratio = if avg_volume > 0.0 {
            last_volume / avg_volume
        } else {
            1.0
        };

        let levels = &bars[..bars.len() - p.level_window.skipped_bars()];
        let window = tail(levels, p.range_window);
        let support = last_value(&self.support, window.iter().map(|b| b.low));
        let resistance = last_value(&self.resistance, window.iter().map(|b| b.high));

        let short_dev = last_value(&self.dev_short, tail(&closes, p.squeeze_short).iter().copied());
        let long_dev = last_value(&self.dev_long, tail(&closes, p.squeeze_long).iter().copied());
        let is_squeezing = short_dev < p.squeeze_ratio * long_dev;

        Readings {
            last_close,
            sma_fast,
            sma_slow,
            rsi,
            volume_ratio,
            support,
            resistance,
            is_squeezing,
        }
    }

    /// Rolling-mean RSI over the close changes in `closes`
    ///
    /// Saturates at 100 when there were no losses.
    fn rsi(&self, closes: &[f64]) -> f64 {
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let avg_gain = last_value(&self.avg_gain, changes.iter().map(|c| c.max(0.0)));
        let avg_loss = last_value(&self.avg_loss, changes.iter().map(|c| (-c).max(0.0)));

        if avg_loss <= 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

fn classify_trend(r: &Readings) -> Trend {
    if r.last_close > r.sma_slow {
        if r.last_close > r.sma_fast {
            Trend::Uptrend
        } else {
            Trend::WeakUptrend
        }
    } else {
        Trend::Downtrend
    }
}

/// First matching rule wins
fn decide(p: &TechnicalParams, trend: Trend, r: &Readings) -> Action {
    if trend.is_up() {
        if r.last_close < r.support * p.support_proximity {
            Action::BuySupportBounce
        } else if r.volume_ratio > p.volume_surge {
            Action::StrongBuyBreakout
        } else if r.is_squeezing {
            Action::PrepareToBuyVcp
        } else if r.rsi > p.overbought {
            Action::HoldTakeProfit
        } else {
            Action::BuyHold
        }
    } else if r.last_close < r.support {
        Action::SellAvoid
    } else if r.rsi < p.oversold {
        Action::WatchOversold
    } else {
        Action::AvoidSell
    }
}

fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Feed `values` through a fresh copy of `proto` and return the last output
fn last_value<I>(proto: &I, values: impl Iterator<Item = f64>) -> f64
where
    I: Next<f64, Output = f64> + Clone,
{
    let mut indicator = proto.clone();
    values.fold(f64::NAN, |_, v| indicator.next(v))
}
