//! Plain-text output for ranking runs.

use valyield_chain::{NominatorEraActivity, RetrievalReport};
use valyield_core::{MetricsRow, Network, ValidatorMetrics, rows, summarize};

/// Print a ranked table with a header line.
pub fn print_ranking(ranked: &[ValidatorMetrics], network: Network) {
    let symbol = network.token_symbol();
    println!(
        "{:>4}  {:<48}  {:>8}  {:>20}  {:>16}  {:>5}  {:>7}  {:>14}  {:>10}",
        "#",
        "Validator",
        "Comm.",
        format!("Stake ({})", symbol),
        format!("Own ({})", symbol),
        "Noms",
        "Points",
        format!("Reward ({})", symbol),
        "APY"
    );
    for row in rows(ranked, network) {
        print_row(&row);
    }
}

fn print_row(row: &MetricsRow) {
    println!(
        "{:>4}  {:<48}  {:>8}  {:>20}  {:>16}  {:>5}  {:>7}  {:>14}  {:>10}",
        row.rank,
        row.address,
        row.commission,
        row.total_stake,
        row.own_stake,
        row.nominator_count,
        row.points,
        row.reward_after_commission,
        row.apy
    );
}

/// Print the run totals and anything that was left out.
pub fn print_summary(report: &RetrievalReport, ranked: &[ValidatorMetrics]) {
    println!();
    let summary = summarize(&report.metrics);
    println!(
        "Era {}: {} validators computed, {} skipped, showing {}",
        report.era,
        summary.count,
        report.skipped.len(),
        ranked.len()
    );
    if summary.count > 0 {
        println!(
            "APY min {:.2}%  max {:.2}%  avg {:.2}%",
            summary.apy_min, summary.apy_max, summary.apy_avg
        );
    }
    if report.cancelled {
        println!("Run was cancelled after {} batches", report.batches_delivered);
    }

    if !report.skipped.is_empty() {
        println!();
        println!("Skipped validators:");
        for skipped in &report.skipped {
            println!("  {}  {}", skipped.validator_id, skipped.reason);
        }
    }
}

/// Print a nominator's per-era target activity.
pub fn print_activity(activity: &[NominatorEraActivity]) {
    let mut current = None;
    for entry in activity {
        if current != Some(entry.era) {
            println!("Era {}:", entry.era);
            current = Some(entry.era);
        }
        let status = if entry.active { "active" } else { "inactive" };
        println!("  {:<48}  {}", entry.validator, status);
    }
}
