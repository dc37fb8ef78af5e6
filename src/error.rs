use thiserror::Error;

/// A record or input table that does not meet the scoring contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: required field `{field}` is empty")]
    MissingField { row: usize, field: &'static str },
    #[error("row {row}: field `{field}` has invalid value {value:?}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("row {row}: malformed record: {reason}")]
    MalformedRow { row: usize, reason: String },
    #[error("field `{field}` is not a finite number")]
    NonFinite { field: &'static str },
    #[error("customer identifier is empty")]
    EmptyCustomer,
}

/// Invalid scoring configuration, raised when thresholds are loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("weights must sum to 1.0, got {sum:.6}")]
    WeightsSum { sum: f64 },
    #[error("weight `{name}` must be a finite non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("relative weights are all zero")]
    ZeroWeights,
    #[error("band cutoffs must satisfy 0 < yellow_min < green_min <= 100, got green_min={green_min} yellow_min={yellow_min}")]
    BandCutoffs { green_min: u8, yellow_min: u8 },
    #[error("renewal windows must satisfy high_max < medium_max, got high_max={high_max} medium_max={medium_max}")]
    RenewalWindows { high_max: i64, medium_max: i64 },
    #[error("{name} must be greater than zero")]
    NonPositive { name: &'static str },
    #[error("recommendation limit `{name}` is out of range: {value}")]
    Limit { name: &'static str, value: f64 },
    #[error("expected 5 comma-separated weights (nps,csat,usage,logins,tickets), got {0:?}")]
    WeightList(String),
    #[error("failed to read thresholds file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse thresholds file: {0}")]
    Json(#[from] serde_json::Error),
}

/// A batch run that cannot produce output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("{count} rows rejected in strict mode, first: {first}")]
    StrictRejected { count: usize, first: ValidationError },
}
