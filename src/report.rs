use std::fmt::Write;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::filter::{self, AccountFilter, RENEWING_SOON_DAYS};
use crate::models::{PortfolioSummary, RangeAnomaly, RejectedRow, ScoredAccount};
use crate::rules::Priority;
use crate::scoring::BatchOutcome;

const BAR_WIDTH: usize = 30;

pub struct ReportInput<'a> {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    pub source: &'a str,
    pub outcome: &'a BatchOutcome,
    pub filter: &'a AccountFilter,
}

pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len)
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn write_summary(output: &mut String, summary: &PortfolioSummary) {
    let _ = writeln!(output, "## Portfolio Summary");
    let _ = writeln!(output, "- Total ARR: {}", format_currency(summary.total_arr));
    let _ = writeln!(
        output,
        "- ARR (Yellow + Red): {}",
        format_currency(summary.at_risk_arr)
    );
    let _ = writeln!(
        output,
        "- ARR renewing in {} days: {}",
        RENEWING_SOON_DAYS,
        format_currency(summary.renewing_soon_arr)
    );
    let _ = writeln!(
        output,
        "- Red accounts: {} of {}",
        summary.red_accounts, summary.accounts
    );
}

fn write_charts(output: &mut String, summary: &PortfolioSummary) {
    let max_count = summary.bands.iter().map(|b| b.accounts).max().unwrap_or(0) as f64;
    let max_arr = summary.bands.iter().map(|b| b.arr).fold(0.0, f64::max);

    let _ = writeln!(output, "## Health Band Distribution");
    let _ = writeln!(output, "```");
    for total in &summary.bands {
        let _ = writeln!(
            output,
            "{:<6} {:<width$} {}",
            total.band.as_str(),
            bar(total.accounts as f64, max_count),
            total.accounts,
            width = BAR_WIDTH
        );
    }
    let _ = writeln!(output, "```");
    let _ = writeln!(output);

    let _ = writeln!(output, "## ARR by Health Band");
    let _ = writeln!(output, "```");
    for total in &summary.bands {
        let _ = writeln!(
            output,
            "{:<6} {:<width$} {}",
            total.band.as_str(),
            bar(total.arr, max_arr),
            format_currency(total.arr),
            width = BAR_WIDTH
        );
    }
    let _ = writeln!(output, "```");
}

fn write_table(output: &mut String, accounts: &[&ScoredAccount]) {
    let _ = writeln!(output, "## Account-level View");
    if accounts.is_empty() {
        let _ = writeln!(output, "No accounts match the current filters.");
        return;
    }

    let _ = writeln!(
        output,
        "| Customer | Segment | ARR | Renewal | Score | Band | Renewal Risk | Expansion | NPS | CSAT | Usage | Tickets | Days to Renewal |"
    );
    let _ = writeln!(
        output,
        "|---|---|---:|---|---:|---|---|---|---:|---:|---:|---:|---:|"
    );
    for account in accounts {
        let record = &account.record;
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {:.0}% | {} | {} |",
            record.customer,
            record.segment,
            format_currency(record.arr),
            record.renewal_date,
            account.health_score,
            account.health_band.as_str(),
            account.renewal_risk.as_str(),
            account.expansion_potential.as_str(),
            record.nps.map_or("-".to_string(), |v| v.to_string()),
            record.csat.map_or("-".to_string(), |v| format!("{v:.1}")),
            account.usage_ratio * 100.0,
            record
                .tickets_last_90d
                .map_or("-".to_string(), |v| v.to_string()),
            account.days_to_renewal
        );
    }
}

fn write_recommendations(output: &mut String, accounts: &[&ScoredAccount]) {
    let _ = writeln!(output, "## Recommended Actions");
    if accounts.is_empty() {
        let _ = writeln!(output, "No accounts match the current filters.");
        return;
    }

    for account in accounts {
        let _ = writeln!(
            output,
            "### {} ({} {}, renewal risk {})",
            account.record.customer,
            account.health_band.as_str(),
            account.health_score,
            account.renewal_risk.as_str()
        );
        if account.recommendations.is_empty() {
            let _ = writeln!(output, "- No actions triggered.");
        }
        for rec in &account.recommendations {
            let _ = writeln!(output, "- [{}] {}", priority_label(rec.priority), rec.text);
        }
        let _ = writeln!(output);
    }
}

fn write_data_quality(output: &mut String, anomalies: &[RangeAnomaly], rejected: &[RejectedRow]) {
    let _ = writeln!(output, "## Data Quality");
    if anomalies.is_empty() && rejected.is_empty() {
        let _ = writeln!(output, "No data quality issues detected.");
        return;
    }

    for row in rejected {
        let who = row.customer.as_deref().unwrap_or("unknown customer");
        let _ = writeln!(output, "- Rejected ({}): {}", who, row.error);
    }
    for anomaly in anomalies {
        let observed = anomaly
            .observed
            .map_or("missing".to_string(), |v| v.to_string());
        let _ = writeln!(
            output,
            "- {}: {} was {}, scored as {}",
            anomaly.customer, anomaly.field, observed, anomaly.clamped_to
        );
    }
}

pub fn build_report(input: &ReportInput<'_>) -> String {
    let outcome = input.outcome;
    let selected = input.filter.apply(&outcome.scored);
    let summary = filter::summarize(&outcome.scored);

    let mut output = String::new();
    let _ = writeln!(output, "# Customer Health Report");
    let _ = writeln!(
        output,
        "Generated from {} as of {} (run {})",
        input.source, input.as_of, input.run_id
    );
    let segments = filter::segments(&outcome.scored);
    if !segments.is_empty() {
        let _ = writeln!(output, "Segments: {}", segments.join(", "));
    }
    let _ = writeln!(
        output,
        "{} of {} scored accounts match the current filters.",
        selected.len(),
        outcome.scored.len()
    );
    let _ = writeln!(output);

    write_summary(&mut output, &summary);
    let _ = writeln!(output);
    write_charts(&mut output, &summary);
    let _ = writeln!(output);
    write_table(&mut output, &selected);
    let _ = writeln!(output);
    write_recommendations(&mut output, &selected);
    write_data_quality(&mut output, &outcome.anomalies, &outcome.rejected);

    output
}
