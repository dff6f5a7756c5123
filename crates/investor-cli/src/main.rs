//! Command-line value-investing scorecard
//!
//! ```bash
//! export GROQ_API_KEY="..."
//! value-investor NVDA
//! value-investor 700 --market hkex --policy historical --granular
//! value-investor SHOP --market tsx --json
//! ```

mod render;

use clap::Parser;
use investor_engine::{
    AnalysisConfig, AnalysisRequest, Market, ValuationPolicy, ValueAnalyzer, VerdictBands,
};
use investor_utils::init_tracing;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "value-investor", version)]
#[command(about = "Score a stock on valuation, business quality and technicals", long_about = None)]
struct Args {
    /// Ticker as listed, e.g. NVDA, SHOP or 700
    ticker: String,

    /// Exchange: us, tsx or hkex
    #[arg(short, long, default_value = "us")]
    market: Market,

    /// Valuation policy: fixed, linear or historical
    #[arg(short, long)]
    policy: Option<ValuationPolicy>,

    /// Split the lowest verdict band into SELL (30-45) and AVOID (<30)
    #[arg(long)]
    granular: bool,

    /// Score the qualitative topics concurrently
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = AnalysisConfig::default().with_env()?;
        if let Some(policy) = self.policy {
            config.valuation_policy = policy;
        }
        if self.granular {
            config.verdict_bands = VerdictBands::granular();
        }
        if self.parallel {
            config.parallel_topics = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let config = args.config()?;
    let analyzer = ValueAnalyzer::from_env(config)?;

    let request = AnalysisRequest::new(&args.ticker, args.market);
    info!(
        request_id = %request.id,
        ticker = %request.ticker,
        market = %request.market,
        "starting analysis"
    );

    let report = match analyzer.analyze(&request).await {
        Ok(report) => report,
        Err(err) if err.is_not_found() => {
            eprintln!("Ticker not found.");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_report(&report);
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "value-investor",
            "700",
            "--market",
            "hkex",
            "--policy",
            "historical",
            "--granular",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.ticker, "700");
        assert_eq!(args.market, Market::HongKong);
        assert_eq!(args.policy, Some(ValuationPolicy::HistoricalRange));
        assert!(args.granular);
        assert!(!args.parallel);
        assert!(args.json);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["value-investor", "NVDA"]).unwrap();
        assert_eq!(args.market, Market::Us);
        assert_eq!(args.policy, None);
    }

    #[test]
    fn test_args_reject_unknown_market() {
        assert!(Args::try_parse_from(["value-investor", "VOD", "--market", "lse"]).is_err());
    }
}
