use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod config;
mod engine;
mod error;
mod models;
mod notify;
mod render;
mod report;
mod store;
mod tracker;

use crate::cli::{Cli, Command};
use crate::config::MonitorConfig;
use crate::engine::Monitor;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::render::{Renderer, TextRenderer};
use crate::store::CheckStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(true)
        .init();

    let cli = Cli::parse();
    let config = MonitorConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let store = CheckStore::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;

    match cli.command {
        Some(Command::Report { date, days, today }) => {
            run_reports(config, store, date, days, today).await
        }
        None => run_monitor(config, store).await,
    }
}

async fn run_monitor(config: MonitorConfig, store: CheckStore) -> Result<()> {
    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(reqwest::Client::new(), url.clone())),
        None => Arc::new(LogNotifier),
    };
    let renderer: Arc<dyn Renderer> = Arc::new(TextRenderer::new(config.reports_dir.clone()));

    let monitor = Monitor::new(config, store, notifier, renderer)?;
    let shutdown = CancellationToken::new();
    let engine = tokio::spawn(monitor.run(shutdown.clone()));

    signal::ctrl_c().await?;
    info!("shutdown signal received, stopping monitor");
    shutdown.cancel();

    engine.await.context("engine task panicked")??;
    Ok(())
}

async fn run_reports(
    config: MonitorConfig,
    store: CheckStore,
    date: Option<NaiveDate>,
    days: Option<u32>,
    today: bool,
) -> Result<()> {
    let current = Utc::now().date_naive();
    let dates: Vec<NaiveDate> = if let Some(count) = days {
        let newest = if today { current } else { current - Duration::days(1) };
        (0..count)
            .map(|i| newest - Duration::days(i64::from(i)))
            .collect()
    } else if let Some(date) = date {
        vec![date]
    } else if today {
        vec![current]
    } else {
        vec![current - Duration::days(1)]
    };

    let renderer = TextRenderer::new(config.reports_dir.clone());
    for date in dates {
        let (start, end) = report::day_bounds(date);
        let report = report::generate(&store, &config.url, start, end).await?;
        if report.total_checks == 0 {
            warn!("no data available for {date}");
            continue;
        }
        let path = renderer.render(&report)?;
        info!(
            "report for {date} written to {} ({:.1}% uptime, {}/{} checks up)",
            path.display(),
            report.uptime_percentage,
            report.up_count,
            report.total_checks,
        );
    }
    Ok(())
}
