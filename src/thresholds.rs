//! Scoring configuration threaded into every call to the engine.
//!
//! Defaults mirror the stock dashboard. A JSON file may override any subset
//! of sections; missing sections fall back to their defaults. Everything is
//! validated once at load time so the engine never sees a bad configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::{default_rules, Rule};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub nps: f64,
    pub csat: f64,
    pub usage: f64,
    pub logins: f64,
    pub tickets: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            nps: 0.30,
            csat: 0.20,
            usage: 0.20,
            logins: 0.15,
            tickets: 0.15,
        }
    }
}

impl Weights {
    /// Normalizes relative weights (any non-negative scale) so they sum to 1.0.
    pub fn from_relative(raw: [f64; 5]) -> Result<Self, ConfigError> {
        let names = ["nps", "csat", "usage", "logins", "tickets"];
        for (name, value) in names.into_iter().zip(raw) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }
        Ok(Self {
            nps: raw[0] / total,
            csat: raw[1] / total,
            usage: raw[2] / total,
            logins: raw[3] / total,
            tickets: raw[4] / total,
        })
    }

    /// Parses `nps,csat,usage,logins,tickets` relative weights.
    pub fn parse_relative(value: &str) -> Result<Self, ConfigError> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ConfigError::WeightList(value.to_string()))?;
        let raw: [f64; 5] = parts
            .try_into()
            .map_err(|_| ConfigError::WeightList(value.to_string()))?;
        Self::from_relative(raw)
    }

    pub fn sum(&self) -> f64 {
        self.nps + self.csat + self.usage + self.logins + self.tickets
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("nps", self.nps),
            ("csat", self.csat),
            ("usage", self.usage),
            ("logins", self.logins),
            ("tickets", self.tickets),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsSum { sum });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandCutoffs {
    pub green_min: u8,
    pub yellow_min: u8,
}

impl Default for BandCutoffs {
    fn default() -> Self {
        Self {
            green_min: 75,
            yellow_min: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalWindows {
    pub high_max: i64,
    pub medium_max: i64,
    pub escalate_on_red: bool,
}

impl Default for RenewalWindows {
    fn default() -> Self {
        Self {
            high_max: 30,
            medium_max: 90,
            escalate_on_red: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationLimits {
    pub low_adoption_ratio: f64,
    pub high_adoption_ratio: f64,
    pub ticket_burden_max_subscore: f64,
    pub promoter_nps: i32,
    pub low_csat: f64,
    pub renewal_focus_days: i64,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            low_adoption_ratio: 0.4,
            high_adoption_ratio: 0.8,
            ticket_burden_max_subscore: 50.0,
            promoter_nps: 50,
            low_csat: 3.5,
            renewal_focus_days: 120,
        }
    }
}

impl RecommendationLimits {
    fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("low_adoption_ratio", self.low_adoption_ratio),
            ("high_adoption_ratio", self.high_adoption_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Limit { name, value });
            }
        }
        if !(0.0..=100.0).contains(&self.ticket_burden_max_subscore) {
            return Err(ConfigError::Limit {
                name: "ticket_burden_max_subscore",
                value: self.ticket_burden_max_subscore,
            });
        }
        if !self.low_csat.is_finite() {
            return Err(ConfigError::Limit {
                name: "low_csat",
                value: self.low_csat,
            });
        }
        if self.renewal_focus_days < 0 {
            return Err(ConfigError::Limit {
                name: "renewal_focus_days",
                value: self.renewal_focus_days as f64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    pub high_min_usage: f64,
    pub high_min_nps: i32,
    pub medium_min_usage: f64,
    pub medium_min_nps: i32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            high_min_usage: 0.7,
            high_min_nps: 50,
            medium_min_usage: 0.5,
            medium_min_nps: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub weights: Weights,
    pub band_cutoffs: BandCutoffs,
    pub renewal_windows_days: RenewalWindows,
    pub login_saturation: u32,
    pub ticket_zero_floor: u32,
    pub recommendation_limits: RecommendationLimits,
    pub expansion: ExpansionLimits,
    pub rules: Vec<Rule>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            band_cutoffs: BandCutoffs::default(),
            renewal_windows_days: RenewalWindows::default(),
            login_saturation: 20,
            ticket_zero_floor: 20,
            recommendation_limits: RecommendationLimits::default(),
            expansion: ExpansionLimits::default(),
            rules: default_rules(),
        }
    }
}

impl Thresholds {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let thresholds: Thresholds = serde_json::from_str(raw)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn with_weights(mut self, weights: Weights) -> Result<Self, ConfigError> {
        self.weights = weights;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        let cutoffs = &self.band_cutoffs;
        if cutoffs.yellow_min == 0
            || cutoffs.yellow_min >= cutoffs.green_min
            || cutoffs.green_min > 100
        {
            return Err(ConfigError::BandCutoffs {
                green_min: cutoffs.green_min,
                yellow_min: cutoffs.yellow_min,
            });
        }

        let windows = &self.renewal_windows_days;
        if windows.high_max < 0 || windows.high_max >= windows.medium_max {
            return Err(ConfigError::RenewalWindows {
                high_max: windows.high_max,
                medium_max: windows.medium_max,
            });
        }

        if self.login_saturation == 0 {
            return Err(ConfigError::NonPositive {
                name: "login_saturation",
            });
        }
        if self.ticket_zero_floor == 0 {
            return Err(ConfigError::NonPositive {
                name: "ticket_zero_floor",
            });
        }

        self.recommendation_limits.validate()
    }
}
