//! Pairing Registry Logging System
//!
//! Structured logging with configurable levels and output formats, built on
//! the tracing crate. Output goes to stdout, or to daily-rotated files when
//! a log file is configured.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to output
    pub level: Level,
    /// Enable colored output
    pub color: bool,
    /// Show target/module name
    pub show_target: bool,
    /// Enable JSON format for machine parsing
    pub json_format: bool,
    /// Enable span events for tracing
    pub enable_spans: bool,
    /// Output to daily-rotated files instead of stdout
    pub file_output: Option<PathBuf>,
}

impl LoggingConfig {
    /// Create config from CLI arguments
    pub fn from_args(quiet: bool, verbose: bool, json: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            Level::INFO
        };

        Self {
            level,
            color: !quiet && !json && io::stdout().is_terminal(),
            show_target: verbose,
            json_format: json,
            enable_spans: verbose,
            file_output: None,
        }
    }

    /// Route output to a rotating log file
    pub fn with_file_output(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.color = false;
        }
        self.file_output = path;
        self
    }
}

/// Build the default filter directive for a level
fn default_directive(level: Level) -> String {
    format!(
        "pairing_registry={level},tower_http={level}",
        level = level.as_str().to_lowercase()
    )
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.level)));

    let registry = Registry::default().with(env_filter);

    if let Some(log_file) = config.file_output {
        let file_appender = tracing_appender::rolling::daily(
            log_file.parent().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path")
            })?,
            log_file.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file name")
            })?,
        );

        if config.json_format {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(config.enable_spans)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender);
            json_layer.with_subscriber(registry).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_target(config.show_target)
                .with_level(true)
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            fmt_layer.with_subscriber(registry).init();
        }
    } else if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(config.enable_spans)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stdout);
        json_layer.with_subscriber(registry).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_level(true)
            .with_ansi(config.color)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .with_writer(io::stdout);
        fmt_layer.with_subscriber(registry).init();
    }

    Ok(())
}

/// Clean up old log files based on retention policy
///
/// Only files whose name contains `.log.` (the rotated suffix, e.g.
/// `registry.log.2025-11-22`) are considered; the live file is never touched.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use pairing_registry::logging::cleanup_old_logs;
///
/// cleanup_old_logs(Path::new("/var/log/pairing-registry"), 7).ok();
/// ```
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u32) -> io::Result<usize> {
    use std::fs;
    use std::time::{Duration, SystemTime};

    if !log_dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let retention = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);

    let mut cleaned_count = 0;
    let mut cleaned_size: u64 = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let name = entry.file_name();
        if !name.to_string_lossy().contains(".log.") || !path.is_file() {
            continue;
        }

        let metadata = entry.metadata()?;
        let modified = metadata.modified()?;

        if let Ok(age) = now.duration_since(modified) {
            if age > retention {
                let size = metadata.len();
                match fs::remove_file(&path) {
                    Ok(_) => {
                        cleaned_count += 1;
                        cleaned_size += size;
                        tracing::info!(
                            path = %path.display(),
                            age_days = age.as_secs() / 86400,
                            size,
                            "Removed old log file"
                        );
                    },
                    Err(e) => {
                        tracing::warn!("Failed to remove old log file {}: {}", path.display(), e);
                    },
                }
            }
        }
    }

    if cleaned_count > 0 {
        tracing::info!(
            "Log cleanup completed: removed {} files, freed {} bytes",
            cleaned_count,
            cleaned_size
        );
    }

    Ok(cleaned_count)
}

/// Log an outcome of a registry operation keyed by public key
#[macro_export]
macro_rules! log_registry_operation {
    ($operation:expr, $pubkey:expr) => {
        tracing::info!(operation = $operation, pubkey = %$pubkey, "Registry operation");
    };
}

/// Log an expected registry failure (unknown key, unknown code, offline)
#[macro_export]
macro_rules! log_registry_rejection {
    ($operation:expr, $key:ident = $value:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            $key = %$value,
            reason = $reason,
            "Registry operation rejected"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn age_file(path: &Path, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn test_from_args_levels() {
        assert_eq!(LoggingConfig::from_args(false, true, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_args(true, false, false).level, Level::ERROR);
        assert_eq!(LoggingConfig::from_args(false, false, false).level, Level::INFO);
    }

    #[test]
    fn test_json_disables_color() {
        let config = LoggingConfig::from_args(false, false, true);
        assert!(config.json_format);
        assert!(!config.color);
    }

    #[test]
    fn test_file_output_disables_color() {
        let config = LoggingConfig::from_args(false, true, false)
            .with_file_output(Some(PathBuf::from("/tmp/registry.log")));
        assert!(!config.color);
        assert!(config.file_output.is_some());
    }

    #[test]
    fn test_verbose_enables_target_and_spans() {
        let verbose = LoggingConfig::from_args(false, true, false);
        assert!(verbose.show_target);
        assert!(verbose.enable_spans);

        let quiet = LoggingConfig::from_args(true, false, false);
        assert!(!quiet.show_target);
        assert!(!quiet.enable_spans);
        assert!(!quiet.color);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(
            default_directive(Level::WARN),
            "pairing_registry=warn,tower_http=warn"
        );
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&missing, 7).unwrap(), 0);
    }

    #[test]
    fn test_cleanup_removes_only_old_rotated_files() {
        let dir = TempDir::new().unwrap();

        let old_rotated = dir.path().join("registry.log.2020-01-01");
        let fresh_rotated = dir.path().join("registry.log.2099-01-01");
        let live = dir.path().join("registry.log");
        for path in [&old_rotated, &fresh_rotated, &live] {
            fs::write(path, "line\n").unwrap();
        }
        age_file(&old_rotated, 30);
        age_file(&live, 30);

        let removed = cleanup_old_logs(dir.path(), 7).unwrap();

        assert_eq!(removed, 1);
        assert!(!old_rotated.exists());
        assert!(fresh_rotated.exists());
        assert!(live.exists());
    }
}
