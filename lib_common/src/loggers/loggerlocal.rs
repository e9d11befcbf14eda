//! # Local Logger
//!
//! Installs a `fern` dispatcher behind the `log` facade. Lines look like
//! `[2026-10-19 08:15:02][lib_common::core::relay][INFO] Messages processed: 1000`.
//! Warnings and errors go to stderr, everything else to stdout. With a log
//! directory, every line is also written to `<app_name>_<timestamp>.log`
//! and earlier logs of the same application are removed.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Parses a level name, case-insensitively. Unknown names fall back to
/// `Info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.trim().to_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" | "warning" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// # Setup Logging
///
/// Installs the global logger. Can only succeed once per process.
///
/// # Errors
/// Fails when the log directory is unusable or a logger is already
/// installed.
pub fn setup_logging(app_name: &str, log_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let level = parse_level(log_level);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(
            fern::Dispatch::new()
                .filter(|metadata| metadata.level() > log::Level::Warn)
                .chain(std::io::stdout()),
        )
        .chain(fern::Dispatch::new().level(log::LevelFilter::Warn).chain(std::io::stderr()));

    if let Some(dir) = log_dir {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let log_path = log_file_path(dir, app_name);
        dispatch = dispatch.chain(fern::log_file(&log_path)?);
        cleanup_old_logs(dir, app_name, &log_path)?;
    }

    dispatch.apply()?;
    Ok(())
}

fn log_file_path(log_dir: &Path, app_name: &str) -> PathBuf {
    let log_file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    log_dir.join(log_file_name)
}

/// Deletes every `<app_name>_*.log` in `log_dir` except `current`.
fn cleanup_old_logs(log_dir: &Path, app_name: &str, current: &Path) -> Result<()> {
    let prefix = format!("{}_", app_name);
    let stale: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix))
        })
        .filter(|path| path.file_name() != current.file_name())
        .collect();

    for path in stale {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}
