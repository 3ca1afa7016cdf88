use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::Report;

/// Turns a report value into an artifact. The core loop never renders; this
/// is invoked from the CLI layer and optionally once at shutdown.
pub trait Renderer: Send + Sync {
    fn render(&self, report: &Report) -> Result<PathBuf>;
}

/// Writes a plain-text summary into the reports directory, one file per day.
pub struct TextRenderer {
    reports_dir: PathBuf,
}

impl TextRenderer {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&self, report: &Report) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir).with_context(|| {
            format!("failed to create {}", self.reports_dir.display())
        })?;
        let filename = format!("uptime_report_{}.txt", report.start.format("%Y-%m-%d"));
        let path = self.reports_dir.join(filename);
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_summary(&mut file, report)?;
        Ok(path)
    }
}

fn write_summary(out: &mut impl Write, report: &Report) -> Result<()> {
    writeln!(out, "Uptime Report for {}", report.url)?;
    writeln!(out, "Range: {} .. {}", report.start, report.end)?;
    writeln!(out)?;
    writeln!(out, "Total Checks: {}", report.total_checks)?;
    writeln!(out, "Successful:   {}", report.up_count)?;
    writeln!(out, "Failed:       {}", report.down_count)?;
    writeln!(out, "Uptime:       {:.1}%", report.uptime_percentage)?;
    if let Some(avg) = report.avg_response_time {
        writeln!(out, "Avg Response: {avg:.3}s")?;
    }
    if let Some(max) = report.max_response_time {
        writeln!(out, "Max Response: {max:.3}s")?;
    }
    writeln!(out)?;
    for (timestamp, is_up) in &report.timeline {
        let status = if *is_up { "UP" } else { "DOWN" };
        writeln!(out, "{}  {}", timestamp.format("%H:%M:%S"), status)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn writes_report_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TextRenderer::new(dir.path().join("reports"));
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let report = Report {
            url: "https://example.com".into(),
            start,
            end: start + chrono::Duration::days(1),
            total_checks: 2,
            up_count: 1,
            down_count: 1,
            uptime_percentage: 50.0,
            avg_response_time: Some(0.25),
            max_response_time: Some(0.25),
            timeline: vec![
                (start + chrono::Duration::hours(1), true),
                (start + chrono::Duration::hours(2), false),
            ],
        };

        let path = renderer.render(&report).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("uptime_report_2025-01-01.txt")
        );
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("Uptime:       50.0%"));
        assert!(body.contains("01:00:00  UP"));
        assert!(body.contains("02:00:00  DOWN"));
    }
}
