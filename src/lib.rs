//! Account health scoring for customer-success teams.
//!
//! Loads an account export, scores each account into a 0-100 health score,
//! a health band and a renewal risk, and attaches recommendations from a
//! declarative rule table.

pub mod error;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod rules;
pub mod scoring;
pub mod thresholds;

pub use error::{ConfigError, RunError, ValidationError};
pub use filter::{summarize, AccountFilter};
pub use ingest::{load_accounts, read_accounts, Ingested};
pub use models::{
    AccountRecord, AnomalyKind, ExpansionPotential, HealthBand, PortfolioSummary, RangeAnomaly,
    RejectedRow, RenewalRisk, ScoredAccount, SubScores,
};
pub use rules::{Priority, Rule, RuleId};
pub use scoring::{score, score_batch, BatchOutcome, Scoring};
pub use thresholds::{Thresholds, Weights};
