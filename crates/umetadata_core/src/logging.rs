//! Process logging for metadata store hosts.
//!
//! # Responsibility
//! - Route `log` records from the store and its callers to either a rolling
//!   file set (long-running readers) or stderr (the `umetadata` CLI).
//! - Record one startup line naming the target, level and crate version.
//!
//! # Invariants
//! - A process has exactly one logging target; asking for another one, or
//!   for another level, is rejected instead of silently reconfiguring.
//! - Setup never panics; failures come back as `Err(String)`.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "umetadata";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogging> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    Directory(PathBuf),
    Stderr,
}

impl LogTarget {
    fn describe(&self) -> String {
        match self {
            Self::Directory(dir) => dir.display().to_string(),
            Self::Stderr => "stderr".to_string(),
        }
    }
}

struct ActiveLogging {
    level: &'static str,
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Sends logs to rolling `umetadata*.log` files under `log_dir`.
///
/// Files rotate at 10 MiB and the newest five are kept.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error.
/// - `log_dir` is blank, relative, or cannot be created.
/// - Logging is already active with another target or level.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = parse_level(level)?;
    let dir = parse_log_dir(log_dir)?;
    let target = LogTarget::Directory(dir.clone());

    init_once(level, target, || {
        std::fs::create_dir_all(&dir)
            .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

        Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(ROTATE_AT_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("cannot start file logger: {err}"))
    })
}

/// Sends logs to stderr; used by the CLI when no log directory is configured.
pub fn init_stderr_logging(level: &str) -> Result<(), String> {
    let level = parse_level(level)?;

    init_once(level, LogTarget::Stderr, || {
        Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("cannot start stderr logger: {err}"))
    })
}

fn init_once(
    level: &'static str,
    target: LogTarget,
    start: impl FnOnce() -> Result<LoggerHandle, String>,
) -> Result<(), String> {
    if let Some(active) = ACTIVE.get() {
        return ensure_same(active, level, &target);
    }

    let active = ACTIVE.get_or_try_init(|| -> Result<ActiveLogging, String> {
        let handle = start()?;
        install_panic_hook();
        info!(
            "event=logging_init module=logging status=ok target={} level={} version={} build={}",
            target.describe(),
            level,
            env!("CARGO_PKG_VERSION"),
            if cfg!(debug_assertions) { "debug" } else { "release" }
        );
        Ok(ActiveLogging {
            level,
            target: target.clone(),
            _handle: handle,
        })
    })?;

    ensure_same(active, level, &target)
}

fn ensure_same(active: &ActiveLogging, level: &str, target: &LogTarget) -> Result<(), String> {
    if active.target != *target {
        return Err(format!(
            "logging already goes to `{}`; refusing to switch to `{}`",
            active.target.describe(),
            target.describe()
        ));
    }
    if active.level != level {
        return Err(format!(
            "logging already runs at `{}`; refusing to switch to `{}`",
            active.level, level
        ));
    }
    Ok(())
}

/// Active `(level, log_dir)`; `log_dir` is `None` when logging to stderr.
/// Returns `None` before any init call succeeded.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    ACTIVE.get().map(|active| {
        let dir = match &active.target {
            LogTarget::Directory(dir) => Some(dir.clone()),
            LogTarget::Stderr => None,
        };
        (active.level, dir)
    })
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log directory cannot be blank".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log directory must be absolute, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.get().is_some() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            one_line(panic_text(info), PANIC_SUMMARY_CHARS)
        );
        previous(info);
    }));

    let _ = PANIC_HOOK.set(());
}

fn panic_text<'a>(info: &'a std::panic::PanicHookInfo<'_>) -> &'a str {
    if let Some(message) = info.payload().downcast_ref::<&str>() {
        message
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Flattens `value` onto one line and caps it at `max_chars`.
fn one_line(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    let mut capped = flat.chars().take(max_chars).collect::<String>();
    if flat.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, init_stderr_logging, logging_status, one_line, parse_level, parse_log_dir,
        LogTarget,
    };
    use std::path::PathBuf;

    #[test]
    fn level_names_are_normalized() {
        assert_eq!(parse_level("INFO").unwrap(), "info");
        assert_eq!(parse_level(" warning ").unwrap(), "warn");
        assert!(parse_level("verbose").unwrap_err().contains("unsupported"));
    }

    #[test]
    fn log_dir_must_be_absolute_and_non_blank() {
        assert!(parse_log_dir("logs/ynp").unwrap_err().contains("absolute"));
        assert!(parse_log_dir("   ").unwrap_err().contains("blank"));
    }

    #[test]
    fn one_line_flattens_and_caps() {
        let flat = one_line("UU.CTU\nUU.MOUT\rUU.NOQ", 8);
        assert_eq!(flat, "UU.CTU U...");
    }

    #[test]
    fn targets_describe_themselves() {
        assert_eq!(LogTarget::Stderr.describe(), "stderr");
        assert_eq!(
            LogTarget::Directory(PathBuf::from("/var/log/umetadata")).describe(),
            "/var/log/umetadata"
        );
    }

    // Logging state is process-wide, so every init assertion lives here.
    #[test]
    fn first_target_wins_for_the_process() {
        let root = tempfile::Builder::new()
            .prefix("umetadata-logging")
            .tempdir()
            .unwrap();
        let log_dir = root.path().join("active");
        let log_dir_str = log_dir.to_str().unwrap().to_string();
        let other_dir_str = root.path().join("other").to_str().unwrap().to_string();

        init_logging("info", &log_dir_str).unwrap();
        init_logging("INFO", &log_dir_str).unwrap();

        assert!(init_logging("debug", &log_dir_str)
            .unwrap_err()
            .contains("refusing to switch"));
        assert!(init_logging("info", &other_dir_str)
            .unwrap_err()
            .contains("refusing to switch"));
        assert!(init_stderr_logging("info")
            .unwrap_err()
            .contains("refusing to switch"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(dir, Some(log_dir.clone()));
        assert!(log_dir.is_dir());
    }
}
