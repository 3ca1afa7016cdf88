//! Failure-state transitions, kept free of I/O so the alerting rules can be
//! tested in isolation from the scheduling loop.

use crate::models::{AlertEvent, AlertKind, CheckRecord, MonitorState};

/// Advance the monitor state with one observation.
///
/// A `Failure` event fires exactly once, at the moment the consecutive
/// failure count reaches `threshold` with no alert already active; further
/// failures during the incident stay silent. A `Recovery` event fires on the
/// first up observation while an alert is active. A `threshold` of zero or
/// less means alert on the first failure.
pub fn transition(
    state: MonitorState,
    observation: &CheckRecord,
    threshold: i64,
) -> (MonitorState, Option<AlertEvent>) {
    let threshold = threshold.max(1) as u32;

    if observation.is_up {
        let event = state.alert_active.then_some(AlertEvent {
            kind: AlertKind::Recovery,
            consecutive_failures: state.consecutive_failures,
        });
        let next = MonitorState {
            consecutive_failures: 0,
            alert_active: false,
        };
        (next, event)
    } else {
        let failures = state.consecutive_failures + 1;
        let fires = failures == threshold && !state.alert_active;
        let event = fires.then_some(AlertEvent {
            kind: AlertKind::Failure,
            consecutive_failures: failures,
        });
        let next = MonitorState {
            consecutive_failures: failures,
            alert_active: state.alert_active || fires,
        };
        (next, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(is_up: bool) -> CheckRecord {
        CheckRecord {
            timestamp: Utc::now(),
            url: "https://example.com".into(),
            is_up,
            response_time: is_up.then_some(0.1),
            status_code: is_up.then_some(200),
            error_message: (!is_up).then(|| "connection failed".into()),
        }
    }

    fn run(sequence: &[bool], threshold: i64) -> (MonitorState, Vec<Option<AlertKind>>) {
        let mut state = MonitorState::default();
        let mut events = Vec::new();
        for &is_up in sequence {
            let (next, event) = transition(state, &observation(is_up), threshold);
            state = next;
            events.push(event.map(|e| e.kind));
        }
        (state, events)
    }

    #[test]
    fn fires_once_at_threshold_then_recovers() {
        let (state, events) = run(&[true, false, false, false, true], 3);
        assert_eq!(
            events,
            vec![
                None,
                None,
                None,
                Some(AlertKind::Failure),
                Some(AlertKind::Recovery),
            ]
        );
        assert_eq!(state.consecutive_failures, 0);
        assert!(!state.alert_active);
    }

    #[test]
    fn threshold_one_fires_on_first_failure() {
        let (_, events) = run(&[false], 1);
        assert_eq!(events, vec![Some(AlertKind::Failure)]);
    }

    #[test]
    fn zero_threshold_means_first_failure() {
        let (_, events) = run(&[false, false], 0);
        assert_eq!(events, vec![Some(AlertKind::Failure), None]);
    }

    #[test]
    fn negative_threshold_means_first_failure() {
        let (_, events) = run(&[false], -5);
        assert_eq!(events, vec![Some(AlertKind::Failure)]);
    }

    #[test]
    fn no_repeat_alerts_during_incident() {
        let (state, events) = run(&[false, false, false, false, false], 2);
        let fired = events.iter().filter(|e| e.is_some()).count();
        assert_eq!(fired, 1);
        assert_eq!(events[1], Some(AlertKind::Failure));
        assert_eq!(state.consecutive_failures, 5);
        assert!(state.alert_active);
    }

    #[test]
    fn recovery_without_active_alert_is_silent() {
        let (state, events) = run(&[false, true], 3);
        assert_eq!(events, vec![None, None]);
        assert_eq!(state.consecutive_failures, 0);
        assert!(!state.alert_active);
    }

    #[test]
    fn recovery_only_after_active_alert() {
        // up observations emit Recovery iff the prior state had an active alert
        let (_, events) = run(&[false, false, true, true], 2);
        assert_eq!(
            events,
            vec![None, Some(AlertKind::Failure), Some(AlertKind::Recovery), None]
        );
    }

    #[test]
    fn new_incident_after_recovery_fires_again() {
        let (_, events) = run(&[false, false, true, false, false], 2);
        let failures = events
            .iter()
            .filter(|e| matches!(e, Some(AlertKind::Failure)))
            .count();
        assert_eq!(failures, 2);
    }

    #[test]
    fn failure_event_carries_threshold_count() {
        let mut state = MonitorState::default();
        let mut fired = None;
        for _ in 0..3 {
            let (next, event) = transition(state, &observation(false), 3);
            state = next;
            if event.is_some() {
                fired = event;
            }
        }
        let event = fired.expect("threshold reached");
        assert_eq!(event.consecutive_failures, 3);
    }
}
