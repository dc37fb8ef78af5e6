use std::cmp::Ordering;

use crate::models::{BandTotal, HealthBand, PortfolioSummary, RenewalRisk, ScoredAccount};

/// ARR renewing within this many days counts as "renewing soon".
pub const RENEWING_SOON_DAYS: i64 = 180;

/// Segment, band and renewal-risk filters. An empty list imposes no constraint.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub segments: Vec<String>,
    pub bands: Vec<HealthBand>,
    pub risks: Vec<RenewalRisk>,
}

impl AccountFilter {
    pub fn matches(&self, account: &ScoredAccount) -> bool {
        (self.segments.is_empty()
            || self
                .segments
                .iter()
                .any(|segment| segment.eq_ignore_ascii_case(&account.record.segment)))
            && (self.bands.is_empty() || self.bands.contains(&account.health_band))
            && (self.risks.is_empty() || self.risks.contains(&account.renewal_risk))
    }

    /// Matching accounts, least healthy first.
    pub fn apply<'a>(&self, accounts: &'a [ScoredAccount]) -> Vec<&'a ScoredAccount> {
        let mut selected: Vec<&ScoredAccount> =
            accounts.iter().filter(|account| self.matches(account)).collect();
        selected.sort_by(|a, b| by_health_ascending(a, b));
        selected
    }
}

pub fn by_health_ascending(a: &ScoredAccount, b: &ScoredAccount) -> Ordering {
    a.health_score
        .cmp(&b.health_score)
        .then_with(|| a.record.customer.cmp(&b.record.customer))
}

/// Distinct segments in sorted order.
pub fn segments(accounts: &[ScoredAccount]) -> Vec<String> {
    let mut values: Vec<String> = accounts
        .iter()
        .map(|account| account.record.segment.clone())
        .collect();
    values.sort();
    values.dedup();
    values
}

pub fn summarize<'a, I>(accounts: I) -> PortfolioSummary
where
    I: IntoIterator<Item = &'a ScoredAccount>,
{
    let mut bands: Vec<BandTotal> = HealthBand::ALL
        .iter()
        .map(|band| BandTotal {
            band: *band,
            accounts: 0,
            arr: 0.0,
        })
        .collect();
    let mut summary = PortfolioSummary {
        accounts: 0,
        total_arr: 0.0,
        at_risk_arr: 0.0,
        renewing_soon_arr: 0.0,
        red_accounts: 0,
        bands: Vec::new(),
    };

    for account in accounts {
        let arr = account.record.arr.max(0.0);
        summary.accounts += 1;
        summary.total_arr += arr;
        if account.health_band != HealthBand::Green {
            summary.at_risk_arr += arr;
        }
        if (0..=RENEWING_SOON_DAYS).contains(&account.days_to_renewal) {
            summary.renewing_soon_arr += arr;
        }
        if account.health_band == HealthBand::Red {
            summary.red_accounts += 1;
        }
        if let Some(total) = bands.iter_mut().find(|t| t.band == account.health_band) {
            total.accounts += 1;
            total.arr += arr;
        }
    }

    summary.bands = bands;
    summary
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::models::AccountRecord;
    use crate::scoring::score;
    use crate::thresholds::Thresholds;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).expect("date")
    }

    fn account(customer: &str, segment: &str, nps: i32, arr: f64, renew_in: i64) -> ScoredAccount {
        let record = AccountRecord {
            customer: customer.to_string(),
            segment: segment.to_string(),
            arr,
            renewal_date: as_of() + Duration::days(renew_in),
            nps: Some(nps),
            tickets_last_90d: Some(2),
            csat: Some(4.0),
            logins_last_30d: Some(20),
            active_users: Some(70),
            total_seats: 100,
        };
        score(&record, &Thresholds::default(), as_of())
            .expect("score")
            .account
    }

    fn portfolio() -> Vec<ScoredAccount> {
        vec![
            account("Zeta", "SMB", 90, 10_000.0, 400),
            account("Alpha", "Enterprise", -100, 500_000.0, 20),
            account("Mid", "Mid-Market", -20, 80_000.0, 150),
            account("Beta", "Enterprise", 90, 300_000.0, 300),
        ]
    }

    #[test]
    fn empty_filter_sorts_least_healthy_first() {
        let accounts = portfolio();
        let names: Vec<&str> = AccountFilter::default()
            .apply(&accounts)
            .iter()
            .map(|a| a.record.customer.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Beta", "Zeta"]);
    }

    #[test]
    fn filters_combine() {
        let accounts = portfolio();
        let filter = AccountFilter {
            segments: vec!["enterprise".to_string()],
            bands: vec![HealthBand::Green],
            risks: Vec::new(),
        };
        let selected = filter.apply(&accounts);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].record.customer, "Beta");
    }

    #[test]
    fn summary_totals_by_band() {
        let accounts = portfolio();
        let summary = summarize(&accounts);
        assert_eq!(summary.accounts, 4);
        assert_eq!(summary.total_arr, 890_000.0);
        assert_eq!(summary.renewing_soon_arr, 580_000.0);
        assert_eq!(
            summary.bands.iter().map(|b| b.band).collect::<Vec<_>>(),
            HealthBand::ALL.to_vec()
        );
        let counted: usize = summary.bands.iter().map(|b| b.accounts).sum();
        assert_eq!(counted, 4);
        let green_arr = summary.bands[0].arr;
        assert_eq!(summary.at_risk_arr, summary.total_arr - green_arr);
    }

    #[test]
    fn segments_are_distinct_and_sorted() {
        assert_eq!(
            segments(&portfolio()),
            vec!["Enterprise", "Mid-Market", "SMB"]
        );
    }
}
