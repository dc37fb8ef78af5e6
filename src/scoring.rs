//! The scoring engine: one [`AccountRecord`] in, one [`ScoredAccount`] out.
//!
//! Every signal is normalized to a 0-100 sub-score, combined with the
//! configured weights, then banded. Values outside their expected range are
//! clamped and reported as [`RangeAnomaly`] entries. A missing signal scores
//! at its worst case.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::models::{
    AccountRecord, AnomalyKind, ExpansionPotential, HealthBand, RangeAnomaly, RejectedRow,
    ScoredAccount, SubScores,
};
use crate::risk;
use crate::rules::{self, RuleContext};
use crate::thresholds::{BandCutoffs, ExpansionLimits, Thresholds, Weights};

pub const NPS_MIN: i32 = -100;
pub const NPS_MAX: i32 = 100;
pub const CSAT_MIN: f64 = 1.0;
pub const CSAT_MAX: f64 = 5.0;

/// Result of scoring a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    pub account: ScoredAccount,
    pub anomalies: Vec<RangeAnomaly>,
}

/// Result of scoring a batch. Rejected records never appear in `scored`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub scored: Vec<ScoredAccount>,
    pub anomalies: Vec<RangeAnomaly>,
    pub rejected: Vec<RejectedRow>,
}

struct AnomalyLog<'a> {
    customer: &'a str,
    entries: Vec<RangeAnomaly>,
}

impl<'a> AnomalyLog<'a> {
    fn new(customer: &'a str) -> Self {
        Self {
            customer,
            entries: Vec::new(),
        }
    }

    fn push(
        &mut self,
        field: &'static str,
        kind: AnomalyKind,
        observed: Option<f64>,
        clamped_to: f64,
    ) {
        self.entries.push(RangeAnomaly {
            customer: self.customer.to_string(),
            field,
            kind,
            observed,
            clamped_to,
        });
    }

    fn out_of_range(&mut self, field: &'static str, observed: f64, clamped_to: f64) {
        self.push(field, AnomalyKind::OutOfRange, Some(observed), clamped_to);
    }

    fn missing(&mut self, field: &'static str, worst_case: f64) {
        self.push(field, AnomalyKind::Missing, None, worst_case);
    }
}

/// Clamps a count to be non-negative, flagging negatives.
fn non_negative(value: i64, field: &'static str, log: &mut AnomalyLog<'_>) -> i64 {
    if value < 0 {
        log.out_of_range(field, value as f64, 0.0);
        0
    } else {
        value
    }
}

/// Classic NPS on -100..100, rescaled as `(nps + 100) / 2`.
fn nps_subscore(nps: Option<i32>, log: &mut AnomalyLog<'_>) -> f64 {
    let Some(raw) = nps else {
        log.missing("NPS", NPS_MIN as f64);
        return 0.0;
    };
    let clamped = raw.clamp(NPS_MIN, NPS_MAX);
    if clamped != raw {
        log.out_of_range("NPS", raw as f64, clamped as f64);
    }
    (clamped - NPS_MIN) as f64 / 2.0
}

fn csat_subscore(csat: Option<f64>, log: &mut AnomalyLog<'_>) -> f64 {
    let Some(raw) = csat else {
        log.missing("CSAT", CSAT_MIN);
        return 0.0;
    };
    let clamped = raw.clamp(CSAT_MIN, CSAT_MAX);
    if clamped != raw {
        log.out_of_range("CSAT", raw, clamped);
    }
    (clamped - CSAT_MIN) / (CSAT_MAX - CSAT_MIN) * 100.0
}

/// Share of seats in use, 0..1.
fn usage_ratio(active_users: Option<i64>, total_seats: i64, log: &mut AnomalyLog<'_>) -> f64 {
    let active = match active_users {
        Some(value) => non_negative(value, "Active_Users", log),
        None => {
            log.missing("Active_Users", 0.0);
            0
        }
    };
    if total_seats == 0 {
        log.push("Total_Seats", AnomalyKind::ZeroSeats, Some(0.0), 0.0);
        return 0.0;
    }
    if total_seats < 0 {
        log.out_of_range("Total_Seats", total_seats as f64, 0.0);
        return 0.0;
    }
    if active > total_seats {
        log.out_of_range("Active_Users", active as f64, total_seats as f64);
        return 1.0;
    }
    active as f64 / total_seats as f64
}

fn logins_subscore(logins: Option<i64>, saturation: u32, log: &mut AnomalyLog<'_>) -> f64 {
    let Some(raw) = logins else {
        log.missing("Logins_Last_30d", 0.0);
        return 0.0;
    };
    let logins = non_negative(raw, "Logins_Last_30d", log);
    (logins as f64 / saturation as f64).min(1.0) * 100.0
}

fn tickets_subscore(tickets: Option<i64>, zero_floor: u32, log: &mut AnomalyLog<'_>) -> f64 {
    let Some(raw) = tickets else {
        log.missing("Tickets_Last_90d", zero_floor as f64);
        return 0.0;
    };
    let tickets = non_negative(raw, "Tickets_Last_90d", log);
    (1.0 - tickets as f64 / zero_floor as f64).max(0.0) * 100.0
}

pub fn weighted_score(sub: &SubScores, weights: &Weights) -> u8 {
    let total = sub.nps * weights.nps
        + sub.csat * weights.csat
        + sub.usage * weights.usage
        + sub.logins * weights.logins
        + sub.tickets * weights.tickets;
    total.round().clamp(0.0, 100.0) as u8
}

pub fn health_band(score: u8, cutoffs: &BandCutoffs) -> HealthBand {
    if score >= cutoffs.green_min {
        HealthBand::Green
    } else if score >= cutoffs.yellow_min {
        HealthBand::Yellow
    } else {
        HealthBand::Red
    }
}

pub fn expansion_potential(
    band: HealthBand,
    usage_ratio: f64,
    nps: Option<i32>,
    limits: &ExpansionLimits,
) -> ExpansionPotential {
    let Some(nps) = nps else {
        return ExpansionPotential::Low;
    };
    match band {
        HealthBand::Green if usage_ratio > limits.high_min_usage && nps >= limits.high_min_nps => {
            ExpansionPotential::High
        }
        HealthBand::Yellow
            if usage_ratio > limits.medium_min_usage && nps >= limits.medium_min_nps =>
        {
            ExpansionPotential::Medium
        }
        _ => ExpansionPotential::Low,
    }
}

fn check_contract(record: &AccountRecord) -> Result<(), ValidationError> {
    if record.customer.trim().is_empty() {
        return Err(ValidationError::EmptyCustomer);
    }
    if !record.arr.is_finite() {
        return Err(ValidationError::NonFinite { field: "ARR" });
    }
    if record.csat.is_some_and(|csat| !csat.is_finite()) {
        return Err(ValidationError::NonFinite { field: "CSAT" });
    }
    Ok(())
}

/// Scores one record. Only out-of-contract records (empty customer,
/// non-finite numbers) are rejected; anything else yields a result.
pub fn score(
    record: &AccountRecord,
    thresholds: &Thresholds,
    today: NaiveDate,
) -> Result<Scoring, ValidationError> {
    check_contract(record)?;

    let mut log = AnomalyLog::new(&record.customer);
    if record.arr < 0.0 {
        log.out_of_range("ARR", record.arr, 0.0);
    }

    let ratio = usage_ratio(record.active_users, record.total_seats, &mut log);
    let sub_scores = SubScores {
        nps: nps_subscore(record.nps, &mut log),
        csat: csat_subscore(record.csat, &mut log),
        usage: ratio * 100.0,
        logins: logins_subscore(record.logins_last_30d, thresholds.login_saturation, &mut log),
        tickets: tickets_subscore(record.tickets_last_90d, thresholds.ticket_zero_floor, &mut log),
    };

    let health_score = weighted_score(&sub_scores, &thresholds.weights);
    let band = health_band(health_score, &thresholds.band_cutoffs);
    let days = risk::days_to_renewal(record.renewal_date, today);
    let renewal_risk = risk::renewal_risk(days, band, &thresholds.renewal_windows_days);
    let expansion = expansion_potential(band, ratio, record.nps, &thresholds.expansion);

    let ctx = RuleContext {
        band,
        sub_scores,
        usage_ratio: ratio,
        nps: record.nps,
        csat: record.csat,
        days_to_renewal: days,
    };
    let recommendations = rules::evaluate(
        &thresholds.rules,
        &ctx,
        &thresholds.recommendation_limits,
    );

    debug!(
        customer = %record.customer,
        health_score,
        band = band.as_str(),
        days_to_renewal = days,
        "scored account"
    );

    Ok(Scoring {
        account: ScoredAccount {
            record: record.clone(),
            health_score,
            health_band: band,
            sub_scores,
            usage_ratio: ratio,
            days_to_renewal: days,
            overdue: days < 0,
            renewal_risk,
            expansion_potential: expansion,
            recommendations,
        },
        anomalies: log.entries,
    })
}

pub fn score_batch(
    records: &[AccountRecord],
    thresholds: &Thresholds,
    today: NaiveDate,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for record in records {
        match score(record, thresholds, today) {
            Ok(scoring) => {
                for anomaly in &scoring.anomalies {
                    warn!(
                        customer = %anomaly.customer,
                        field = anomaly.field,
                        kind = ?anomaly.kind,
                        observed = ?anomaly.observed,
                        clamped_to = anomaly.clamped_to,
                        "value clamped while scoring"
                    );
                }
                outcome.anomalies.extend(scoring.anomalies);
                outcome.scored.push(scoring.account);
            }
            Err(error) => {
                warn!(customer = %record.customer, %error, "record rejected by scoring engine");
                outcome.rejected.push(RejectedRow {
                    row: None,
                    customer: Some(record.customer.clone()),
                    error,
                });
            }
        }
    }

    info!(
        scored = outcome.scored.len(),
        rejected = outcome.rejected.len(),
        anomalies = outcome.anomalies.len(),
        as_of = %today,
        "batch scored"
    );
    outcome
}
