//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! Output is controlled by:
//! - [`EnvFilter`]: log level filtering, from `RUST_LOG`
//! - [`LogFormat`]: output format (json, full, compact, bare, pretty), from `TILEPICK_FORMAT`

use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, single-line logs.
    Full,

    /// A variant of the full format, optimized for short line lengths (default).
    Compact,

    /// Short lines without timestamps, targets or ANSI colors.
    Bare,

    /// Multi-line logs for local development.
    Pretty,

    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Installs the global subscriber. Logs go to stderr, stdout carries the layer events.
    pub fn init(self, env_filter: EnvFilter) {
        let dispatch = match self {
            Self::Full => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .finish()
                .into(),
            Self::Compact => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .compact()
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .finish()
                .into(),
            Self::Pretty => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .pretty()
                .with_env_filter(env_filter)
                .finish()
                .into(),
            Self::Bare => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .compact()
                .with_span_events(FmtSpan::NONE)
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .with_env_filter(env_filter)
                .finish()
                .into(),
            Self::Json => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .finish()
                .into(),
        };
        // Not `SubscriberInitExt::init()`: it would install a second `LogTracer`.
        if tracing::dispatcher::set_global_default(dispatch).is_err() {
            eprintln!("Warning: a global tracing subscriber is already set");
        }
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "bare" => Ok(Self::Bare),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: json, full, compact, bare or pretty"
            )),
        }
    }
}

fn log_level(level: Level) -> log::LevelFilter {
    match level {
        Level::TRACE => log::LevelFilter::Trace,
        Level::DEBUG => log::LevelFilter::Debug,
        Level::INFO => log::LevelFilter::Info,
        Level::WARN => log::LevelFilter::Warn,
        Level::ERROR => log::LevelFilter::Error,
    }
}

/// Forwards `log` records of dependencies into `tracing`.
fn init_log_bridge(env_filter: &EnvFilter) {
    let mut log_builder = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default());
    if let Some(Some(max_level)) = env_filter.max_level_hint().map(LevelFilter::into_level) {
        log_builder = log_builder.with_max_level(log_level(max_level));
    }
    if log_builder.init().is_err() {
        eprintln!("Warning: the log -> tracing bridge is already set");
    }
}

/// Initializes the global tracing subscriber for the given filter and format.
///
/// An invalid filter falls back to `debug`, an unknown format to [`LogFormat::default`].
pub fn init_tracing(filter: &str, format: Option<String>) {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid filter string '{filter}' passed, using 'debug' instead");
        EnvFilter::new("debug")
    });

    let log_format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| {
                    eprintln!("Warning: {e}");
                    eprintln!(
                        "Falling back to default format ({:?})",
                        LogFormat::default()
                    );
                })
                .ok()
        })
        .unwrap_or_default();

    init_log_bridge(&env_filter);
    log_format.init(env_filter);
}

/// Makes `tilepick_core` log at the level configured for `tilepick=`, unless it has its own.
#[must_use]
pub fn ensure_core_log_level_matches(env_filter: Option<String>) -> String {
    const CLI: &str = "tilepick=";
    const CORE: &str = "tilepick_core=";
    let Some(rust_log) = env_filter else {
        return format!("{CLI}info,{CORE}info");
    };
    if rust_log.contains(CORE) {
        return rust_log;
    }
    match rust_log.split(',').find_map(|s| s.strip_prefix(CLI)) {
        Some(level) => format!("{rust_log},{CORE}{level}"),
        None => rust_log,
    }
}
