use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classified probe outcome, exactly as persisted.
///
/// `is_up` implies a success status code and no error message; a down
/// observation carries a non-success status code, an error message, or both.
/// `response_time` and `status_code` are absent when the probe never received
/// a timed HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub is_up: bool,
    pub response_time: Option<f64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

/// Failure-tracking state for the single monitored endpoint.
///
/// Held only in memory by the engine loop; a restart begins a fresh incident
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorState {
    pub consecutive_failures: u32,
    pub alert_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    Failure,
    Recovery,
}

/// Emitted by the tracker at most once per observation.
///
/// For a failure this carries the count that reached the threshold; for a
/// recovery, the failure count of the incident that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub consecutive_failures: u32,
}

/// Payload handed to the notifier when an enabled alert fires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertNotification {
    pub url: String,
    pub kind: AlertKind,
    pub consecutive_failures: u32,
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
}

/// Aggregated uptime statistics over a half-open time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub url: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_checks: usize,
    pub up_count: usize,
    pub down_count: usize,
    pub uptime_percentage: f64,
    /// Mean response time over successful checks; `None` when none succeeded.
    pub avg_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    /// `(timestamp, is_up)` pairs in ascending timestamp order.
    pub timeline: Vec<(DateTime<Utc>, bool)>,
}
