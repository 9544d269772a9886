//! Logging configuration and initialization.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Default log file under the user's local data directory.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("recipe-cli")
        .join("recipe-cli.log")
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter; `RUST_LOG` wins over the verbosity flag.
fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recipe_cli={}", level_for(verbose))))
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Install the global tracing subscriber.
pub fn init_logging(verbose: u8, target: &LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3);

    let res = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    res.map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;

    tracing::debug!(verbose, ?target, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn default_log_path_is_namespaced() {
        let p = default_log_path();
        assert!(p.ends_with("recipe-cli/recipe-cli.log"));
    }
}
