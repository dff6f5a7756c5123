//! Terminal tables for an analysis report

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use investor_engine::{AnalysisReport, TechnicalOutcome};

pub fn print_report(report: &AnalysisReport) {
    println!(
        "{} ({}) | {} | {} {:.2}",
        report.profile.name,
        report.symbol,
        report.profile.industry,
        report.profile.currency,
        report.price
    );
    println!();
    println!("{}", qualitative_table(report));
    println!("{}", valuation_table(report));
    println!("{}", technical_table(report));
    println!("{}", verdict_table(report));
    if report.fallback_used {
        println!("The backup model was used for some topics.");
    }
    if report.fundamentals_unavailable {
        println!("Quote summary unavailable: valuation ran without EPS.");
    }
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

pub fn qualitative_table(report: &AnalysisReport) -> Table {
    let mut table = table(&["Topic", "Score", "Reason"]);

    for topic in &report.qualitative.topics {
        table.add_row([
            Cell::new(topic.topic.label()),
            Cell::new(format!("{:.1}/4", topic.score)),
            Cell::new(&topic.reason),
        ]);
    }
    table.add_row([
        Cell::new("Total"),
        Cell::new(format!("{:.1}/20", report.qualitative.total)),
        Cell::new(""),
    ]);
    table
}

pub fn valuation_table(report: &AnalysisReport) -> Table {
    let valuation = &report.valuation;
    let mut table = table(&["Valuation", ""]);

    table.add_row(["Policy".to_string(), valuation.policy.to_string()]);
    table.add_row([
        "PE ratio".to_string(),
        valuation
            .pe_ratio
            .map_or_else(|| "n/a".to_string(), |pe| format!("{pe:.2}")),
    ]);
    if let Some(range) = valuation.historical_range {
        table.add_row([
            "PE range".to_string(),
            format!("{:.1} to {:.1}", range.min, range.max),
        ]);
    }
    table.add_row(["Multiplier".to_string(), format!("{}x", valuation.multiplier)]);
    table.add_row(["Status".to_string(), valuation.band.to_string()]);
    table
}

pub fn technical_table(report: &AnalysisReport) -> Table {
    let mut table = table(&["Technical", ""]);

    match &report.technical {
        TechnicalOutcome::Signal(signal) => {
            table.add_row(["Action".to_string(), signal.action.to_string()]);
            table.add_row(["Reason".to_string(), signal.reason.clone()]);
            table.add_row(["Trend".to_string(), signal.trend.to_string()]);
            table.add_row(["RSI".to_string(), format!("{:.1}", signal.rsi)]);
            table.add_row(["Volume".to_string(), format!("{:.2}x avg", signal.volume_ratio)]);
            table.add_row(["Support".to_string(), format!("{:.2}", signal.support)]);
            table.add_row(["Resistance".to_string(), format!("{:.2}", signal.resistance)]);
            table.add_row([
                "Squeeze".to_string(),
                if signal.is_squeezing { "yes" } else { "no" }.to_string(),
            ]);
        }
        TechnicalOutcome::InsufficientData { bars, required } => {
            table.add_row([
                "Status".to_string(),
                format!("Insufficient data ({bars} of {required} bars)"),
            ]);
        }
    }
    table
}

pub fn verdict_table(report: &AnalysisReport) -> Table {
    let result = &report.final_result;
    let mut table = table(&["Verdict", ""]);

    table.add_row([
        "Score".to_string(),
        format!(
            "{:.1} x {} = {:.1}/100",
            result.qualitative_total, result.multiplier, result.final_score
        ),
    ]);
    table.add_row(["Verdict".to_string(), result.verdict.to_string()]);
    table
}
