use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Overrides the computed filter with raw directives when set.
pub const LOG_ENV: &str = "FRAMEBRIDGE_LOG";

const BRIDGE_TARGETS: [&str; 5] = [
    "framebridge",
    "framebridge_transport",
    "framebridge_envelope",
    "framebridge_viewport",
    "framebridge_peer",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
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

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Directives putting every bridge crate at `level`.
pub fn bridge_directives(level: LogLevel) -> String {
    BRIDGE_TARGETS
        .iter()
        .map(|target| format!("{target}={}", level.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Level for everything outside the bridge crates; never chattier than warn.
pub fn default_level(level: LogLevel) -> LevelFilter {
    level.as_filter().min(LevelFilter::WARN)
}

fn filter(level: LogLevel) -> EnvFilter {
    let directives = match std::env::var(LOG_ENV) {
        Ok(custom) if !custom.trim().is_empty() => custom,
        _ => bridge_directives(level),
    };
    EnvFilter::builder()
        .with_default_directive(default_level(level).into())
        .parse_lossy(directives)
}

/// Install the stderr subscriber bridge diagnostics are written to.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level))
        .with_ansi(false)
        .with_target(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
