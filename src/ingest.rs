use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::models::{AccountRecord, RejectedRow};

pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Customer",
    "Segment",
    "ARR",
    "Renewal_Date",
    "NPS",
    "Tickets_Last_90d",
    "CSAT",
    "Logins_Last_30d",
    "Active_Users",
    "Total_Seats",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Records that passed validation, plus the rows that did not.
#[derive(Debug, Default)]
pub struct Ingested {
    pub records: Vec<AccountRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Customer")]
    customer: String,
    #[serde(rename = "Segment")]
    segment: String,
    #[serde(rename = "ARR")]
    arr: String,
    #[serde(rename = "Renewal_Date")]
    renewal_date: String,
    #[serde(rename = "NPS")]
    nps: String,
    #[serde(rename = "Tickets_Last_90d")]
    tickets_last_90d: String,
    #[serde(rename = "CSAT")]
    csat: String,
    #[serde(rename = "Logins_Last_30d")]
    logins_last_30d: String,
    #[serde(rename = "Active_Users")]
    active_users: String,
    #[serde(rename = "Total_Seats")]
    total_seats: String,
}

pub fn load_accounts(csv_path: &Path) -> anyhow::Result<Ingested> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let ingested = read_accounts(file)?;
    info!(
        path = %csv_path.display(),
        records = ingested.records.len(),
        rejected = ingested.rejected.len(),
        "loaded accounts"
    );
    Ok(ingested)
}

pub fn read_accounts<R: Read>(input: R) -> anyhow::Result<Ingested> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers().context("failed to read CSV header")?;
    let missing = missing_columns(headers);
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing).into());
    }

    let mut ingested = Ingested::default();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = index + 1;
        let (customer, parsed) = match result {
            Ok(raw) => {
                let customer = Some(raw.customer.clone()).filter(|name| !name.is_empty());
                (customer, to_record(row, raw))
            }
            Err(err) => (
                None,
                Err(ValidationError::MalformedRow {
                    row,
                    reason: err.to_string(),
                }),
            ),
        };

        match parsed {
            Ok(record) => ingested.records.push(record),
            Err(error) => {
                warn!(row, %error, "rejected account row");
                ingested.rejected.push(RejectedRow {
                    row: Some(row),
                    customer,
                    error,
                });
            }
        }
    }

    Ok(ingested)
}

fn missing_columns(headers: &csv::StringRecord) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect()
}

fn to_record(row: usize, raw: CsvRow) -> Result<AccountRecord, ValidationError> {
    let customer = required(row, "Customer", &raw.customer)?.to_string();
    let segment = required(row, "Segment", &raw.segment)?.to_string();
    let arr = parse_currency(row, "ARR", required(row, "ARR", &raw.arr)?)?;
    let renewal_date = parse_date(row, required(row, "Renewal_Date", &raw.renewal_date)?)?;
    let total_seats = parse(row, "Total_Seats", required(row, "Total_Seats", &raw.total_seats)?)?;

    let csat = optional::<f64>(row, "CSAT", &raw.csat)?;
    if let Some(value) = csat {
        finite(row, "CSAT", value, &raw.csat)?;
    }

    Ok(AccountRecord {
        customer,
        segment,
        arr,
        renewal_date,
        nps: optional(row, "NPS", &raw.nps)?,
        tickets_last_90d: optional(row, "Tickets_Last_90d", &raw.tickets_last_90d)?,
        csat,
        logins_last_30d: optional(row, "Logins_Last_30d", &raw.logins_last_30d)?,
        active_users: optional(row, "Active_Users", &raw.active_users)?,
        total_seats,
    })
}

fn required<'a>(
    row: usize,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField { row, field })
    } else {
        Ok(value)
    }
}

fn invalid(row: usize, field: &'static str, value: &str) -> ValidationError {
    ValidationError::InvalidValue {
        row,
        field,
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(row: usize, field: &'static str, value: &str) -> Result<T, ValidationError> {
    value.parse::<T>().map_err(|_| invalid(row, field, value))
}

fn optional<T: FromStr>(
    row: usize,
    field: &'static str,
    value: &str,
) -> Result<Option<T>, ValidationError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(row, field, value).map(Some)
    }
}

fn finite(row: usize, field: &'static str, value: f64, raw: &str) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(row, field, raw))
    }
}

/// Accepts plain numbers as well as `$1,250,000`-style amounts.
fn parse_currency(row: usize, field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let amount = parse::<f64>(row, field, cleaned.trim()).map_err(|_| invalid(row, field, value))?;
    finite(row, field, amount, value)
}

fn parse_date(row: usize, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid(row, "Renewal_Date", value))
}
