//! Declarative recommendation table.
//!
//! Each row pairs a predicate id with a priority and the text to emit. Rows
//! are evaluated in order; the first occurrence of an id wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{HealthBand, Recommendation, SubScores};
use crate::thresholds::RecommendationLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    BandRed,
    BandYellow,
    BandGreen,
    LowAdoption,
    HighAdoption,
    HighTicketBurden,
    NegativeNps,
    Promoter,
    LowCsat,
    RenewalWindow,
    RenewalOverdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub priority: Priority,
    pub text: String,
}

impl Rule {
    fn new(id: RuleId, priority: Priority, text: &str) -> Self {
        Self {
            id,
            priority,
            text: text.to_string(),
        }
    }
}

/// Everything a predicate may look at for one account.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub band: HealthBand,
    pub sub_scores: SubScores,
    pub usage_ratio: f64,
    pub nps: Option<i32>,
    pub csat: Option<f64>,
    pub days_to_renewal: i64,
}

impl RuleId {
    pub fn matches(self, ctx: &RuleContext, limits: &RecommendationLimits) -> bool {
        match self {
            RuleId::BandRed => ctx.band == HealthBand::Red,
            RuleId::BandYellow => ctx.band == HealthBand::Yellow,
            RuleId::BandGreen => ctx.band == HealthBand::Green,
            RuleId::LowAdoption => ctx.usage_ratio < limits.low_adoption_ratio,
            RuleId::HighAdoption => ctx.usage_ratio > limits.high_adoption_ratio,
            RuleId::HighTicketBurden => {
                ctx.sub_scores.tickets <= limits.ticket_burden_max_subscore
            }
            RuleId::NegativeNps => ctx.nps.is_some_and(|nps| nps < 0),
            RuleId::Promoter => ctx.nps.is_some_and(|nps| nps >= limits.promoter_nps),
            RuleId::LowCsat => ctx.csat.map_or(true, |csat| csat < limits.low_csat),
            RuleId::RenewalWindow => {
                (0..=limits.renewal_focus_days).contains(&ctx.days_to_renewal)
            }
            RuleId::RenewalOverdue => ctx.days_to_renewal < 0,
        }
    }
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            RuleId::BandRed,
            Priority::High,
            "Schedule executive-sponsored escalation and detailed recovery plan.",
        ),
        Rule::new(
            RuleId::BandYellow,
            Priority::Medium,
            "Run focused health check and align on 90-day success plan.",
        ),
        Rule::new(
            RuleId::BandGreen,
            Priority::Low,
            "Reinforce value with EBR/QBR and explore expansion paths.",
        ),
        Rule::new(
            RuleId::LowAdoption,
            Priority::Medium,
            "Low adoption: run enablement sessions and map more use cases.",
        ),
        Rule::new(
            RuleId::HighAdoption,
            Priority::Low,
            "High adoption: discuss seat expansion or advanced modules.",
        ),
        Rule::new(
            RuleId::HighTicketBurden,
            Priority::High,
            "High support volume: review top ticket themes and propose fixes.",
        ),
        Rule::new(
            RuleId::NegativeNps,
            Priority::High,
            "Negative NPS: hold stakeholder interviews and address pain points.",
        ),
        Rule::new(
            RuleId::Promoter,
            Priority::Low,
            "Promoter: invite to reference program or case study.",
        ),
        Rule::new(
            RuleId::LowCsat,
            Priority::Medium,
            "Improve support quality: review SLAs and support playbook.",
        ),
        Rule::new(
            RuleId::RenewalWindow,
            Priority::Medium,
            "Renewal approaching: lock in mutual success plan and early commit.",
        ),
        Rule::new(
            RuleId::RenewalOverdue,
            Priority::High,
            "Renewal date has passed: confirm contract status with the account owner.",
        ),
    ]
}

pub fn evaluate(
    rules: &[Rule],
    ctx: &RuleContext,
    limits: &RecommendationLimits,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    rules
        .iter()
        .filter(|rule| seen.insert(rule.id))
        .filter(|rule| rule.id.matches(ctx, limits))
        .map(|rule| Recommendation {
            rule: rule.id,
            priority: rule.priority,
            text: rule.text.clone(),
        })
        .collect()
}
