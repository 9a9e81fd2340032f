use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events reach stderr. Everything else is silenced.
const LINK_TARGETS: [&str; 3] = ["serialxfer", "serialxfer_frame", "serialxfer_transport"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    /// Dropped frames with their fault, port shorthand expansion.
    Debug,
    /// Every completed packet and every frame written.
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Parser and transport events are only told apart by target once
    /// per-frame diagnostics are on.
    fn shows_targets(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

fn link_targets(level: LogLevel) -> Targets {
    LINK_TARGETS
        .iter()
        .fold(Targets::new(), |targets, name| {
            targets.with_target(*name, level.as_filter())
        })
}

/// Route link diagnostics (dropped frames, port resolution) to stderr so
/// stdout carries only command output.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(level.shows_targets());
    let registry = tracing_subscriber::registry().with(link_targets(level));

    let _ = match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
}
