//! Per-alert and system-wide delivery statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_database::store::{AlertCounts, DailyCount, DeliveryTotals, LabelCount, StatusCount};
use alerthub_entity::alert::Severity;
use alerthub_entity::delivery::{DeliveryRecord, DeliveryStatus};

/// Delivery metrics for one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    /// The alert.
    pub alert_id: Uuid,
    /// Its title.
    pub title: String,
    /// Its severity.
    pub severity: Severity,
    /// Delivery records of any status.
    pub total_deliveries: i64,
    /// Records in `read` status.
    pub read_count: i64,
    /// Users whose snooze is live now.
    pub snoozed_count: i64,
    /// Records written by reminder passes.
    pub reminder_count: i64,
    /// Read records as a percentage of all records, two decimals.
    pub read_rate: f64,
    /// Record counts per status.
    pub status_breakdown: Vec<StatusCount>,
}

impl AlertStats {
    /// Derive the counters from the alert's delivery log.
    pub fn from_records(
        alert_id: Uuid,
        title: String,
        severity: Severity,
        records: &[DeliveryRecord],
        snoozed_count: i64,
        status_breakdown: Vec<StatusCount>,
    ) -> Self {
        let total_deliveries = records.len() as i64;
        let read_count = records
            .iter()
            .filter(|r| r.status == DeliveryStatus::Read)
            .count() as i64;
        let reminder_count = records.iter().filter(|r| r.is_reminder).count() as i64;

        Self {
            alert_id,
            title,
            severity,
            total_deliveries,
            read_count,
            snoozed_count,
            reminder_count,
            read_rate: read_rate(read_count, total_deliveries),
            status_breakdown,
        }
    }
}

/// Headline numbers across every unarchived alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemOverview {
    /// Unarchived alerts.
    pub total_alerts: i64,
    /// Active and not yet expired.
    pub active_alerts: i64,
    /// Past their expiry.
    pub expired_alerts: i64,
    /// Delivery records of any status.
    pub total_delivered: i64,
    /// Records in `read` status.
    pub total_read: i64,
    /// Preferences whose snooze is live now.
    pub total_snoozed: i64,
    /// Read records as a percentage of all records, two decimals.
    pub read_rate: f64,
}

impl SystemOverview {
    /// Combine the store counters.
    pub fn new(alerts: AlertCounts, deliveries: DeliveryTotals, snoozed: i64) -> Self {
        Self {
            total_alerts: alerts.total,
            active_alerts: alerts.active,
            expired_alerts: alerts.expired,
            total_delivered: deliveries.total,
            total_read: deliveries.read,
            total_snoozed: snoozed,
            read_rate: read_rate(deliveries.read, deliveries.total),
        }
    }
}

/// System-wide analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Headline numbers.
    pub overview: SystemOverview,
    /// Unarchived alerts per severity.
    pub by_severity: Vec<LabelCount>,
    /// Unarchived alerts per delivery channel.
    pub by_channel: Vec<LabelCount>,
    /// Unarchived alerts per audience kind.
    pub by_visibility: Vec<LabelCount>,
    /// Alerts created per local day, oldest first, one entry per day.
    pub recent_activity: Vec<DailyCount>,
}

/// One entry per day of `days`, taking counts from `observed` and zero
/// for days that had none.
pub(crate) fn fill_days(days: impl Iterator<Item = NaiveDate>, observed: &[DailyCount]) -> Vec<DailyCount> {
    days.map(|day| DailyCount {
        day,
        count: observed
            .iter()
            .find(|d| d.day == day)
            .map_or(0, |d| d.count),
    })
    .collect()
}

/// Percentage rounded to two decimals; zero when nothing was delivered.
fn read_rate(read: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = read as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rate_rounding() {
        assert_eq!(read_rate(0, 0), 0.0);
        assert_eq!(read_rate(1, 3), 33.33);
        assert_eq!(read_rate(2, 3), 66.67);
        assert_eq!(read_rate(4, 4), 100.0);
    }

    #[test]
    fn test_fill_days_inserts_zero_days() {
        let start = NaiveDate::from_ymd_opt(2026, 4, 8).unwrap();
        let observed = [DailyCount {
            day: start.succ_opt().unwrap(),
            count: 4,
        }];

        let filled = fill_days(start.iter_days().take(3), &observed);
        let counts: Vec<i64> = filled.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![0, 4, 0]);
        assert_eq!(filled[0].day, start);
    }
}
