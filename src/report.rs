//! Uptime statistics over a stored observation range.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::StoreError;
use crate::models::{CheckRecord, Report};
use crate::store::CheckStore;

/// Aggregate every observation in `[start, end)` into a report value.
///
/// An empty range yields a zero report: total 0, uptime 0.0, no response-time
/// statistics.
pub async fn generate(
    store: &CheckStore,
    url: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Report, StoreError> {
    let checks = store.query_range(url, start, end).await?;
    Ok(summarize(url, start, end, &checks))
}

pub fn summarize(
    url: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    checks: &[CheckRecord],
) -> Report {
    let total_checks = checks.len();
    let up_count = checks.iter().filter(|c| c.is_up).count();
    let uptime_percentage = if total_checks == 0 {
        0.0
    } else {
        up_count as f64 / total_checks as f64 * 100.0
    };

    let response_times: Vec<f64> = checks
        .iter()
        .filter(|c| c.is_up)
        .filter_map(|c| c.response_time)
        .collect();
    let avg_response_time = if response_times.is_empty() {
        None
    } else {
        Some(response_times.iter().sum::<f64>() / response_times.len() as f64)
    };
    let max_response_time = response_times.iter().copied().reduce(f64::max);

    Report {
        url: url.to_string(),
        start,
        end,
        total_checks,
        up_count,
        down_count: total_checks - up_count,
        uptime_percentage,
        avg_response_time,
        max_response_time,
        timeline: checks.iter().map(|c| (c.timestamp, c.is_up)).collect(),
    }
}

/// The half-open UTC range covering one calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
