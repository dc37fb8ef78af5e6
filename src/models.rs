use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;
use crate::rules::{Priority, RuleId};

/// One row of the account export. Signal fields are optional; a blank cell
/// is scored at the worst case for that signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub customer: String,
    pub segment: String,
    pub arr: f64,
    pub renewal_date: NaiveDate,
    pub nps: Option<i32>,
    pub tickets_last_90d: Option<i64>,
    pub csat: Option<f64>,
    pub logins_last_30d: Option<i64>,
    pub active_users: Option<i64>,
    pub total_seats: i64,
}

/// Normalized signals, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub nps: f64,
    pub csat: f64,
    pub usage: f64,
    pub logins: f64,
    pub tickets: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum HealthBand {
    Green,
    Yellow,
    Red,
}

impl HealthBand {
    pub const ALL: [HealthBand; 3] = [HealthBand::Green, HealthBand::Yellow, HealthBand::Red];

    /// Higher is healthier.
    pub fn rank(self) -> u8 {
        match self {
            HealthBand::Green => 2,
            HealthBand::Yellow => 1,
            HealthBand::Red => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthBand::Green => "Green",
            HealthBand::Yellow => "Yellow",
            HealthBand::Red => "Red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum RenewalRisk {
    Low,
    Medium,
    High,
}

impl RenewalRisk {
    pub fn escalate(self) -> Self {
        match self {
            RenewalRisk::Low => RenewalRisk::Medium,
            RenewalRisk::Medium | RenewalRisk::High => RenewalRisk::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenewalRisk::Low => "Low",
            RenewalRisk::Medium => "Medium",
            RenewalRisk::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpansionPotential {
    Low,
    Medium,
    High,
}

impl ExpansionPotential {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpansionPotential::Low => "Low",
            ExpansionPotential::Medium => "Medium",
            ExpansionPotential::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub rule: RuleId,
    pub priority: Priority,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAccount {
    #[serde(flatten)]
    pub record: AccountRecord,
    pub health_score: u8,
    pub health_band: HealthBand,
    pub sub_scores: SubScores,
    pub usage_ratio: f64,
    pub days_to_renewal: i64,
    pub overdue: bool,
    pub renewal_risk: RenewalRisk,
    pub expansion_potential: ExpansionPotential,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    OutOfRange,
    Missing,
    ZeroSeats,
}

/// A value that was clamped or substituted while scoring. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeAnomaly {
    pub customer: String,
    pub field: &'static str,
    pub kind: AnomalyKind,
    pub observed: Option<f64>,
    pub clamped_to: f64,
}

/// A record excluded from output, with the reason attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: Option<usize>,
    pub customer: Option<String>,
    #[serde(serialize_with = "display")]
    pub error: ValidationError,
}

fn display<S: Serializer>(error: &ValidationError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTotal {
    pub band: HealthBand,
    pub accounts: usize,
    pub arr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub accounts: usize,
    pub total_arr: f64,
    pub at_risk_arr: f64,
    pub renewing_soon_arr: f64,
    pub red_accounts: usize,
    pub bands: Vec<BandTotal>,
}
