//! Structured logging foundation for cs-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for automation
//!
//! # Usage
//!
//! ```ignore
//! use cs_core::log_event;
//! use cs_core::logging::{event_names, init_logging, LogConfig, Stage};
//!
//! init_logging(&LogConfig::from_env(None, None));
//!
//! log_event!(INFO, event_names::REPORT_PERSISTED, Stage::Persist, "report stored",
//!     venue_id = 3u64, report_id = 41u64);
//! ```
//!
//! # Design Notes
//!
//! - stdout is reserved for command payloads (JSON/MD output)
//! - stderr receives all log output (human or JSONL)
//! - Reporter identities are logged as given; they are opaque tokens, not PII

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Call once at startup. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::new(format!("cs_core={}", config.level));

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Initialize logging with defaults (for tests and simple cases).
pub fn init_default_logging() {
    init_logging(&LogConfig::from_env(None, None));
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Emit a structured event with the stable `event` and `stage` fields.
///
/// ```ignore
/// log_event!(WARN, event_names::REPORT_FLAGGED, Stage::Fraud, "report flagged",
///     report_id = 12u64, occupancy_deviation = 5u8);
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:ident, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        ::tracing::event!(
            ::tracing::Level::$level,
            event = $event,
            stage = %$stage,
            $($key = $val,)*
            "{}",
            $msg
        )
    };
}
