//! Logging setup for callsite-validator
//!
//! Every event this crate emits uses the `callsite_validator` target:
//! registration and build progress at `debug`, per-service validation at
//! `trace`, captive-dependency rejections at `warn`.
//!
//! # Features
//!
//! - `logging` - emit events through `tracing` (default)
//! - `logging-json` - JSON subscriber output
//! - `logging-pretty` - human-readable subscriber output
//!
//! # Example
//!
//! ```rust,ignore
//! use callsite_validator::logging;
//!
//! // Default format for the enabled features
//! logging::init();
//!
//! // Only this crate's events, at trace level, compact
//! logging::builder()
//!     .trace()
//!     .validator_only()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event in this crate
pub const TARGET: &str = "callsite_validator";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Multi-line pretty output
    Pretty,
    /// Single-line output
    Compact,
}

/// Builder for the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Include per-service validation events
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Only rejections and worse
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Filter to only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show this crate's events
    pub fn validator_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// `EnvFilter` directive for the configured level and target
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the configured subscriber globally.
    ///
    /// Panics if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.directive());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init(),
            // json output needs the `logging-json` feature
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty())
                .init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty())
                .init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .init(),
        }
    }

    /// No-op without a subscriber feature
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with the default format for the enabled features.
///
/// JSON when `logging-json` is on, pretty otherwise.
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// JSON output at debug level
pub fn init_json() {
    builder().json().debug().init();
}

/// Pretty output at debug level
pub fn init_pretty() {
    builder().pretty().debug().init();
}
