//! Logging bootstrap for the host process.
//!
//! One `tracing` registry with two sinks:
//! - console: human-readable, non-blocking stderr, levels per subsystem;
//! - files: JSON lines routed by target prefix to rotating files.
//!
//! `RUST_LOG` (when set) caps both sinks.

use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, util::SubscriberInitExt, Layer};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

static CONSOLE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// `target == prefix` or `target` starts with `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// ---------------------------------------------------------------------------
// rotating file sinks
// ---------------------------------------------------------------------------

type Rotating = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct SinkHandle(Option<Rotating>);

impl Write for SinkHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(file) => file.lock().write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(file) => file.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to a file by target prefix, falling back to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<Rotating>,
    by_prefix: Vec<(String, Rotating)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<Rotating> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = SinkHandle;

    fn make_writer(&'a self) -> Self::Writer {
        SinkHandle(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        SinkHandle(self.resolve(meta.target()))
    }
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(section: &Section, base_dir: &Path) -> std::io::Result<Rotating> {
    let log_path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Prefer an explicit backup count; otherwise retain by age.
    let limit = match section.max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(
            i64::from(section.max_age_days.unwrap_or(1)),
        )),
    };
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) as usize * 1024 * 1024;

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );
    Ok(Arc::new(Mutex::new(rot)))
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        match open_rotating(section, base_dir) {
            Ok(w) if name == DEFAULT_SECTION => router.default = Some(w),
            Ok(w) => router.by_prefix.push((name.clone(), w)),
            Err(e) => eprintln!(
                "Failed to open log file '{}' for '{}': {e}",
                section.file, name
            ),
        }
    }
    // Longest prefix first so nested subsystems win over their parents.
    router
        .by_prefix
        .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    router
}

// ---------------------------------------------------------------------------
// level targets
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Sink {
    Console,
    File { has_default_file: bool },
}

fn section_level(section: &Section, sink: Sink) -> LevelFilter {
    let raw = match sink {
        Sink::Console => &section.console_level,
        Sink::File { .. } => &section.file_level,
    };
    parse_level(raw).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

fn build_targets(cfg: &LoggingConfig, sink: Sink) -> Targets {
    let fallback = match sink {
        Sink::Console => LevelFilter::INFO,
        Sink::File { has_default_file: true } => LevelFilter::INFO,
        Sink::File { has_default_file: false } => LevelFilter::OFF,
    };
    let default_level = cfg
        .get(DEFAULT_SECTION)
        .map(|s| section_level(s, sink))
        .unwrap_or(fallback);

    let mut targets = Targets::new().with_default(default_level);
    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
        if matches!(sink, Sink::File { .. }) && section.file.trim().is_empty() {
            continue;
        }
        targets = targets.with_target(name.clone(), section_level(section, sink));
    }
    targets
}

// ---------------------------------------------------------------------------
// public init
// ---------------------------------------------------------------------------

/// Install the global subscriber. Relative log files resolve against `base_dir`.
///
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logging_unified(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    if cfg.is_empty() {
        init_minimal();
        return;
    }

    let router = build_file_router(cfg, base_dir);
    let console_targets = build_targets(cfg, Sink::Console);
    let file_targets = build_targets(
        cfg,
        Sink::File {
            has_default_file: router.default.is_some(),
        },
    );

    install_subscriber(console_targets, file_targets, router);
}

fn install_subscriber(console_targets: Targets, file_targets: Targets, router: FileRouter) {
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(file_targets)
    });

    let subscriber = Registry::default()
        .with(env)
        .with(console_layer)
        .with(file_layer);

    let _ = subscriber.try_init();
}

fn init_minimal() {
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

    let env = EnvFilter::try_from_default_env().ok();
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let _ = Registry::default().with(env).with(fmt_layer).try_init();
}
