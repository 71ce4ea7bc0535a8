//! File logging for the core crate.
//!
//! # Responsibility
//! - Start rolling file logs once per process and keep the handle alive.
//! - Capture panics as sanitized, size-capped log events.
//!
//! # Invariants
//! - A second `init_logging` call with the same level and directory is a
//!   no-op; a call that would change either is rejected.
//! - Nothing in this module panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "harmony";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_SNIPPET_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogging> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogging {
    level: &'static str,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Starts rolling file logs under `log_dir` at `level`.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Logging is already active with a different level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = parse_level(level)?;
    let dir = resolve_log_dir(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_file_logger(level, &dir)?;
        install_panic_hook();
        info!(
            "event=logging_start module=logging status=ok level={level} dir={} version={}",
            dir.display(),
            env!("CARGO_PKG_VERSION")
        );
        Ok::<_, String>(ActiveLogging {
            level,
            dir: dir.clone(),
            _handle: handle,
        })
    })?;

    if active.dir != dir {
        return Err(format!(
            "logging already active at `{}`; cannot move to `{}`",
            active.dir.display(),
            dir.display()
        ));
    }
    if active.level != level {
        return Err(format!(
            "logging already active at level `{}`; cannot change to `{level}`",
            active.level
        ));
    }
    Ok(())
}

/// Returns `(level, log_dir)` when logging is active, `None` otherwise.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

/// Returns the default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_file_logger(level: &'static str, dir: &Path) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

    Logger::try_with_str(level)
        .map_err(|err| format!("bad log level `{level}`: {err}"))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))
}

fn parse_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unknown log level `{other}` (want trace|debug|info|warn|error)"
        )),
    }
}

fn resolve_log_dir(raw: &str) -> Result<PathBuf, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("log directory is empty".to_string());
    }
    let path = Path::new(raw);
    if path.is_relative() {
        return Err(format!("log directory `{raw}` must be absolute"));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        // Payloads can carry user text; strip newlines and cap the length
        // before it reaches the log file.
        let payload = scrub_payload(&panic_text(info), PANIC_SNIPPET_CHARS);
        error!("event=panic module=logging status=error location={location} payload={payload}");
        previous(info);
    }));
}

fn panic_text(info: &std::panic::PanicHookInfo<'_>) -> String {
    if let Some(text) = info.payload().downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = info.payload().downcast_ref::<String>() {
        text.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

fn scrub_payload(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_chars));
    for (taken, ch) in text.chars().enumerate() {
        if taken == max_chars {
            out.push_str("...");
            return out;
        }
        out.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, parse_level, resolve_log_dir, scrub_payload};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("harmony-logs-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn parse_level_normalizes_case_and_aliases() {
        assert_eq!(parse_level("INFO").expect("INFO should parse"), "info");
        assert_eq!(
            parse_level(" warning ").expect("warning should parse"),
            "warn"
        );
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn resolve_log_dir_requires_absolute_paths() {
        assert!(resolve_log_dir("").is_err());
        let error = resolve_log_dir("logs/dev").expect_err("relative paths must be rejected");
        assert!(error.contains("absolute"));
    }

    #[test]
    fn scrub_payload_strips_newlines_and_caps_length() {
        let scrubbed = scrub_payload("line1\nline2\rline3", 8);
        assert!(!scrubbed.contains('\n'));
        assert!(!scrubbed.contains('\r'));
        assert!(scrubbed.ends_with("..."));

        assert_eq!(scrub_payload("short", 8), "short");
    }

    #[test]
    fn second_init_is_a_no_op_and_conflicts_are_rejected() {
        let log_dir = scratch_dir("first");
        let log_dir_str = log_dir
            .to_str()
            .expect("temp dir should be valid UTF-8")
            .to_string();
        let other_dir = scratch_dir("second");
        let other_dir_str = other_dir
            .to_str()
            .expect("temp dir should be valid UTF-8")
            .to_string();

        init_logging("info", &log_dir_str).expect("first init should succeed");
        init_logging("info", &log_dir_str).expect("repeat with same config should succeed");

        let level_error =
            init_logging("debug", &log_dir_str).expect_err("level change should be rejected");
        assert!(level_error.contains("already active"));

        let dir_error =
            init_logging("info", &other_dir_str).expect_err("directory change should be rejected");
        assert!(dir_error.contains("already active"));

        let (level, dir) = logging_status().expect("logging should be active");
        assert_eq!(level, "info");
        assert_eq!(dir, log_dir);
    }
}
