//! Terminal rendering of a refresh cycle

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use picker_core::{Ranking, ScoreRecord};
use picker_stock::CycleReport;
use std::fmt::Write as _;

/// Printed instead of the table when nothing qualified
pub const NO_PICKS_MESSAGE: &str = "No top stocks available.";

/// Coverage line plus the sufficiency notice
pub fn coverage_section(ranking: &Ranking) -> String {
    let coverage = ranking.coverage_pct();
    let mut out = format!("Percentage of tickers with valid data: {coverage:.2}%\n");

    if coverage < 100.0 {
        out.push_str("Warning: some tickers don't have sufficient data for analysis.\n");
        for (symbol, reason) in &ranking.skipped {
            let _ = writeln!(out, "  - {symbol}: {reason}");
        }
    } else {
        out.push_str("All tickers have sufficient data for analysis.\n");
    }
    out
}

/// Table of the top picks, one column per active sub-score
pub fn picks_table(picks: &[ScoreRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let Some(first) = picks.first() else {
        return table;
    };

    let mut header = vec!["Rank".to_string(), "Stock".to_string()];
    header.extend(first.sub_scores().iter().map(|(label, _)| format!("{label} Score")));
    header.push("Overall Score".to_string());
    table.set_header(header);

    for (rank, pick) in picks.iter().enumerate() {
        let mut row = vec![(rank + 1).to_string(), pick.symbol.clone()];
        row.extend(pick.sub_scores().iter().map(|(_, value)| format!("{value:.2}")));
        row.push(format!("{:.2}", pick.overall_score));
        table.add_row(row);
    }

    table
}

/// Full report: coverage, picks and commentary
pub fn render(report: &CycleReport) -> String {
    let ranking = &report.ranking;
    let mut out = coverage_section(ranking);
    out.push('\n');

    if ranking.is_empty() {
        out.push_str(NO_PICKS_MESSAGE);
        out.push('\n');
        return out;
    }

    let model = ranking.top[0].model;
    let _ = writeln!(
        out,
        "Top {} Stock Picks Overall ({model} model, {})",
        ranking.top.len(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out, "{}", picks_table(&ranking.top));

    if !report.commentary.is_empty() {
        out.push_str("\nAI-Powered Investment Insights\n");
        for (symbol, text) in &report.commentary {
            let _ = writeln!(out, "\n{symbol} Analysis:\n  {text}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use picker_core::{CanonicalFeatures, DefaultedFields, ScoringModel, SkipReason, score};

    fn pick(symbol: &str, momentum_pct: f64, model: ScoringModel) -> ScoreRecord {
        let features = CanonicalFeatures {
            momentum_pct,
            rsi: Some(28.0),
            last_volume: 900,
            average_volume: 1_000.0,
            volume_ratio: Some(0.9),
            pe_ratio: 22.0,
            debt_to_equity: 0.7,
            return_on_equity: 0.1,
            news_sentiment: 0.0,
            defaulted: DefaultedFields::default(),
        };
        score(symbol, &features, model).unwrap()
    }

    fn report(top: Vec<ScoreRecord>, universe_size: usize) -> CycleReport {
        let qualifying_count = top.len();
        let skipped = (qualifying_count..universe_size)
            .map(|i| {
                (
                    format!("S{i}"),
                    SkipReason::InsufficientHistory {
                        bars: 12,
                        required: 20,
                    },
                )
            })
            .collect();
        let commentary = top
            .iter()
            .map(|r| (r.symbol.clone(), format!("Consider {}.", r.symbol)))
            .collect();
        CycleReport {
            ranking: Ranking {
                top,
                qualifying_count,
                universe_size,
                skipped,
            },
            commentary,
            generated_at: Utc.with_ymd_and_hms(2024, 9, 2, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_coverage_line_with_warning() {
        let report = report(vec![pick("NVDA", 3.0, ScoringModel::Fundamental)], 4);
        let section = coverage_section(&report.ranking);

        assert!(section.starts_with("Percentage of tickers with valid data: 25.00%\n"));
        assert!(section.contains("Warning: some tickers don't have sufficient data"));
        assert!(section.contains("  - S1: insufficient history: 12 bars, need 20"));
    }

    #[test]
    fn test_full_coverage_notice() {
        let report = report(vec![pick("AMD", 1.0, ScoringModel::Fundamental)], 1);
        let section = coverage_section(&report.ranking);

        assert!(section.contains("100.00%"));
        assert!(section.contains("All tickers have sufficient data for analysis."));
    }

    #[test]
    fn test_table_columns_follow_model() {
        let fundamental = picks_table(&[pick("NVDA", 3.0, ScoringModel::Fundamental)]).to_string();
        assert!(fundamental.contains("P/E Score"));
        assert!(fundamental.contains("ROE Score"));
        assert!(fundamental.contains("3.00"));
        assert!(fundamental.contains("5.25"));

        let price_action = picks_table(&[pick("NVDA", 3.0, ScoringModel::PriceAction)]).to_string();
        assert!(price_action.contains("RSI Score"));
        assert!(price_action.contains("Volume Score"));
        assert!(!price_action.contains("ROE Score"));
    }

    #[test]
    fn test_render_with_picks_and_commentary() {
        let report = report(
            vec![
                pick("NVDA", 4.0, ScoringModel::PriceAction),
                pick("COIN", 2.0, ScoringModel::PriceAction),
            ],
            2,
        );
        let text = render(&report);

        assert!(text.contains("Top 2 Stock Picks Overall (price-action model, 2024-09-02 14:30 UTC)"));
        assert!(text.contains("AI-Powered Investment Insights"));
        assert!(text.contains("NVDA Analysis:\n  Consider NVDA."));
        assert!(text.find("NVDA Analysis").unwrap() < text.find("COIN Analysis").unwrap());
    }

    #[test]
    fn test_render_empty_ranking() {
        let report = report(Vec::new(), 3);
        let text = render(&report);

        assert!(text.contains("Percentage of tickers with valid data: 0.00%"));
        assert!(text.contains(NO_PICKS_MESSAGE));
        assert!(!text.contains("Top "));
    }
}
