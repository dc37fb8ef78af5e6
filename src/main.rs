use std::path::PathBuf;

use account_health::filter::AccountFilter;
use account_health::report::{self, ReportInput};
use account_health::scoring::BatchOutcome;
use account_health::{ingest, logging, pipeline, risk, HealthBand, RenewalRisk, Thresholds, Weights};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "account-health")]
#[command(about = "Customer health scoring for account exports", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScoringArgs {
    /// Account export with the ten required columns
    #[arg(long)]
    csv: PathBuf,
    /// JSON thresholds file; omitted sections use defaults
    #[arg(long)]
    thresholds: Option<PathBuf>,
    /// Relative weights as nps,csat,usage,logins,tickets
    #[arg(long)]
    weights: Option<String>,
    /// Date renewals are measured from (YYYY-MM-DD), defaults to today in UTC
    #[arg(long)]
    as_of: Option<NaiveDate>,
    #[arg(long = "segment")]
    segments: Vec<String>,
    #[arg(long = "band", value_enum)]
    bands: Vec<HealthBand>,
    #[arg(long = "risk", value_enum)]
    risks: Vec<RenewalRisk>,
    /// Fail the run if any row is rejected
    #[arg(long)]
    strict: bool,
}

impl ScoringArgs {
    fn filter(&self) -> AccountFilter {
        AccountFilter {
            segments: self.segments.clone(),
            bands: self.bands.clone(),
            risks: self.risks.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score accounts and list the least healthy
    Score {
        #[command(flatten)]
        args: ScoringArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown health report
    Report {
        #[command(flatten)]
        args: ScoringArgs,
        #[arg(long, default_value = "health_report.md")]
        out: PathBuf,
    },
    /// Print the default thresholds as JSON
    Thresholds {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a thresholds file
    CheckThresholds {
        #[arg(long)]
        thresholds: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    run_id: Uuid,
    as_of: NaiveDate,
    accounts: Vec<&'a account_health::ScoredAccount>,
    anomalies: &'a [account_health::RangeAnomaly],
    rejected: &'a [account_health::RejectedRow],
}

fn load_thresholds(args: &ScoringArgs) -> anyhow::Result<Thresholds> {
    let thresholds = match &args.thresholds {
        Some(path) => Thresholds::load(path)
            .with_context(|| format!("invalid thresholds in {}", path.display()))?,
        None => Thresholds::default(),
    };
    match &args.weights {
        Some(raw) => {
            let weights = Weights::parse_relative(raw)?;
            Ok(thresholds.with_weights(weights)?)
        }
        None => Ok(thresholds),
    }
}

fn run_batch(args: &ScoringArgs) -> anyhow::Result<(BatchOutcome, NaiveDate)> {
    let thresholds = load_thresholds(args)?;
    let as_of = args.as_of.unwrap_or_else(risk::today);

    let ingested = ingest::load_accounts(&args.csv)?;
    let outcome = pipeline::run(ingested, &thresholds, as_of, args.strict)?;
    Ok((outcome, as_of))
}

fn print_scores(outcome: &BatchOutcome, filter: &AccountFilter, as_of: NaiveDate, limit: usize) {
    let selected = filter.apply(&outcome.scored);
    if selected.is_empty() {
        println!("No accounts match the current filters.");
        return;
    }

    println!("Least healthy accounts as of {as_of}:");
    for account in selected.iter().take(limit) {
        println!(
            "- {} ({}, {}) score {} {}, renewal risk {} in {} days",
            account.record.customer,
            account.record.segment,
            report::format_currency(account.record.arr),
            account.health_score,
            account.health_band.as_str(),
            account.renewal_risk.as_str(),
            account.days_to_renewal
        );
        for rec in &account.recommendations {
            println!("    * {}", rec.text);
        }
    }

    if !outcome.anomalies.is_empty() || !outcome.rejected.is_empty() {
        println!(
            "{} data-quality anomalies, {} rows rejected.",
            outcome.anomalies.len(),
            outcome.rejected.len()
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let run_id = Uuid::new_v4();
    let _run = tracing::info_span!("run", %run_id).entered();

    match cli.command {
        Commands::Score {
            args,
            limit,
            format,
        } => {
            let (outcome, as_of) = run_batch(&args)?;
            let filter = args.filter();
            match format {
                OutputFormat::Text => print_scores(&outcome, &filter, as_of, limit),
                OutputFormat::Json => {
                    let output = JsonOutput {
                        run_id,
                        as_of,
                        accounts: filter.apply(&outcome.scored),
                        anomalies: &outcome.anomalies,
                        rejected: &outcome.rejected,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
        }
        Commands::Report { args, out } => {
            let (outcome, as_of) = run_batch(&args)?;
            let filter = args.filter();
            let source = args.csv.display().to_string();
            let report = report::build_report(&ReportInput {
                run_id,
                as_of,
                source: &source,
                outcome: &outcome,
                filter: &filter,
            });
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
        Commands::Thresholds { out } => {
            let json = serde_json::to_string_pretty(&Thresholds::default())?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Default thresholds written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::CheckThresholds { thresholds } => {
            Thresholds::load(&thresholds)
                .with_context(|| format!("invalid thresholds in {}", thresholds.display()))?;
            println!("{} is valid.", thresholds.display());
        }
    }

    Ok(())
}
