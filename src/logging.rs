use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/aida-term.log";
const DEFAULT_FILTER: &str = "aida_term=info,aida=info";

/// Install the global tracing subscriber.
///
/// The TUI owns the terminal, so events go to a file whenever stderr is a TTY
/// (or `AIDA_LOG_PATH` is set). `RUST_LOG` overrides the default filter.
pub fn init(log_path: Option<&str>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match resolve_log_path(log_path) {
        Some(path) => {
            let file = open_log_file(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
        }
    }

    Ok(())
}

fn resolve_log_path(configured: Option<&str>) -> Option<String> {
    configured
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

fn open_log_file(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {path}"))
}
