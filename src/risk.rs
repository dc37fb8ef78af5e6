use chrono::{NaiveDate, Utc};

use crate::models::{HealthBand, RenewalRisk};
use crate::thresholds::RenewalWindows;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_to_renewal(renewal_date: NaiveDate, today: NaiveDate) -> i64 {
    (renewal_date - today).num_days()
}

pub fn window_tier(days: i64, windows: &RenewalWindows) -> RenewalRisk {
    if days < 0 || days <= windows.high_max {
        RenewalRisk::High
    } else if days <= windows.medium_max {
        RenewalRisk::Medium
    } else {
        RenewalRisk::Low
    }
}

pub fn renewal_risk(days: i64, band: HealthBand, windows: &RenewalWindows) -> RenewalRisk {
    let tier = window_tier(days, windows);
    if windows.escalate_on_red && band == HealthBand::Red {
        tier.escalate()
    } else {
        tier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn tiers_follow_windows() {
        let windows = RenewalWindows::default();
        assert_eq!(window_tier(0, &windows), RenewalRisk::High);
        assert_eq!(window_tier(30, &windows), RenewalRisk::High);
        assert_eq!(window_tier(31, &windows), RenewalRisk::Medium);
        assert_eq!(window_tier(90, &windows), RenewalRisk::Medium);
        assert_eq!(window_tier(91, &windows), RenewalRisk::Low);
    }

    #[test]
    fn overdue_is_high_regardless_of_band() {
        let windows = RenewalWindows::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).expect("date");
        let yesterday = today - Duration::days(1);
        let days = days_to_renewal(yesterday, today);
        assert_eq!(days, -1);
        assert_eq!(renewal_risk(days, HealthBand::Green, &windows), RenewalRisk::High);
    }

    #[test]
    fn red_band_escalates_one_level() {
        let windows = RenewalWindows::default();
        assert_eq!(renewal_risk(200, HealthBand::Red, &windows), RenewalRisk::Medium);
        assert_eq!(renewal_risk(60, HealthBand::Red, &windows), RenewalRisk::High);
        assert_eq!(renewal_risk(200, HealthBand::Yellow, &windows), RenewalRisk::Low);

        let flat = RenewalWindows {
            escalate_on_red: false,
            ..RenewalWindows::default()
        };
        assert_eq!(renewal_risk(200, HealthBand::Red, &flat), RenewalRisk::Low);
    }
}
