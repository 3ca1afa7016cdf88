use std::path::PathBuf;

use thiserror::Error;

/// A probe that never produced a usable HTTP response.
///
/// These are classified into `is_up = false` observations and recorded; they
/// never abort the scheduling loop.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout
        } else if err.is_connect() {
            ProbeError::Connect(root_cause(&err))
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

/// reqwest wraps socket errors in several layers; the innermost one carries
/// the useful detail (refused, DNS, TLS).
fn root_cause(err: &reqwest::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(next) = source.source() {
        source = next;
    }
    source.to_string()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),
    #[error("webhook endpoint returned status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("created default configuration at {0}; edit it and run again")]
    DefaultCreated(PathBuf),
}
