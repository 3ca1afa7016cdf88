use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::ProbeError;
use crate::models::{AlertKind, AlertNotification, CheckRecord, MonitorState};
use crate::notify::Notifier;
use crate::render::Renderer;
use crate::report;
use crate::store::CheckStore;
use crate::tracker;

/// HTTP status codes treated as "up".
const SUCCESS_RANGE: std::ops::Range<u16> = 200..400;

pub struct Monitor {
    config: MonitorConfig,
    http_client: reqwest::Client,
    store: CheckStore,
    notifier: Arc<dyn Notifier>,
    renderer: Arc<dyn Renderer>,
    state: MonitorState,
    last_prune: Option<DateTime<Utc>>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        store: CheckStore,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        // Redirects are not followed: a 3xx answer from the endpoint itself
        // already counts as up.
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            config,
            http_client,
            store,
            notifier,
            renderer,
            state: MonitorState::default(),
            last_prune: None,
        })
    }

    /// Drive the check/record/alert cycle until cancellation.
    ///
    /// Tick deadlines are absolute (`tick_start + interval`), so probe
    /// latency does not accumulate as drift; an overrunning probe collapses
    /// the missed deadline into an immediate next tick.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            url = %self.config.url,
            interval_secs = self.config.check_interval,
            threshold = self.config.consecutive_failures_threshold,
            "starting uptime monitor"
        );

        if let Ok(history) = self.store.recent(&self.config.url, 1).await {
            if let Some(last) = history.first() {
                info!(
                    status = if last.is_up { "UP" } else { "DOWN" },
                    at = %last.timestamp,
                    "last recorded observation"
                );
            }
        }

        let interval = Duration::from_secs(self.config.check_interval);
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep_until(deadline) => {}
            }

            let tick_start = Instant::now();
            self.tick().await;
            deadline = tick_start + interval;
        }

        info!("shutdown observed, no further ticks scheduled");
        if self.config.report_on_shutdown {
            self.shutdown_report().await;
        }
        Ok(())
    }

    async fn tick(&mut self) {
        let record = self.probe().await;

        if record.is_up {
            info!(
                url = %record.url,
                status = record.status_code,
                response_secs = record.response_time,
                "UP"
            );
        } else {
            warn!(
                url = %record.url,
                status = record.status_code,
                error = record.error_message.as_deref().unwrap_or("unknown"),
                "DOWN"
            );
        }

        // An unrecorded observation is not retried; the next tick is the retry.
        if let Err(e) = self.store.record(&record).await {
            error!("failed to record check: {e}");
        }

        let (next_state, event) = tracker::transition(
            self.state,
            &record,
            self.config.consecutive_failures_threshold,
        );
        self.state = next_state;

        if let Some(event) = event {
            let enabled = match event.kind {
                AlertKind::Failure => self.config.alert_on_failure,
                AlertKind::Recovery => self.config.alert_on_recovery,
            };
            if enabled {
                let notification = AlertNotification {
                    url: record.url.clone(),
                    kind: event.kind,
                    consecutive_failures: event.consecutive_failures,
                    timestamp: record.timestamp,
                    error_message: record.error_message.clone(),
                };
                if let Err(e) = self.notifier.notify(&notification).await {
                    error!("failed to deliver {:?} alert: {e}", event.kind);
                }
            } else {
                debug!(kind = ?event.kind, "alert suppressed by configuration");
            }
        }

        self.maybe_prune().await;
    }

    /// Issue one probe and classify the outcome into an observation.
    async fn probe(&self) -> CheckRecord {
        let timestamp = Utc::now();
        let started = std::time::Instant::now();

        match self.http_client.get(&self.config.url).send().await {
            Ok(response) => {
                let elapsed = started.elapsed().as_secs_f64();
                let status = response.status().as_u16();
                if SUCCESS_RANGE.contains(&status) {
                    CheckRecord {
                        timestamp,
                        url: self.config.url.clone(),
                        is_up: true,
                        response_time: Some(elapsed),
                        status_code: Some(status),
                        error_message: None,
                    }
                } else {
                    CheckRecord {
                        timestamp,
                        url: self.config.url.clone(),
                        is_up: false,
                        response_time: Some(elapsed),
                        status_code: Some(status),
                        error_message: Some(format!("HTTP status {status}")),
                    }
                }
            }
            Err(e) => {
                let probe_error = ProbeError::from(e);
                CheckRecord {
                    timestamp,
                    url: self.config.url.clone(),
                    is_up: false,
                    response_time: None,
                    status_code: None,
                    error_message: Some(probe_error.to_string()),
                }
            }
        }
    }

    /// Retention pruning, at most once per day, from inside the loop so the
    /// store keeps a single writer.
    async fn maybe_prune(&mut self) {
        let now = Utc::now();
        let due = self
            .last_prune
            .map_or(true, |last| now - last >= chrono::Duration::days(1));
        if !due {
            return;
        }
        match self.store.prune_older_than(self.config.days_to_keep).await {
            Ok(_) => self.last_prune = Some(now),
            Err(e) => error!("retention pruning failed: {e}"),
        }
    }

    async fn shutdown_report(&self) {
        let (start, end) = report::day_bounds(Utc::now().date_naive());
        match report::generate(&self.store, &self.config.url, start, end).await {
            Ok(report) if report.total_checks == 0 => {
                info!("no observations today, skipping final report")
            }
            Ok(report) => match self.renderer.render(&report) {
                Ok(path) => info!("final report written to {}", path.display()),
                Err(e) => error!("failed to render final report: {e}"),
            },
            Err(e) => error!("failed to generate final report: {e}"),
        }
    }
}
