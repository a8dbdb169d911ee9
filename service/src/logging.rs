use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ColorChoice, ConfigBuilder, TerminalMode};

/// Dependencies whose records are dropped unless running at Trace level.
/// The HTTP client, server and WebSocket stacks log every frame and
/// connection state change at debug.
const FILTERED_MODULES: &[&str] = &[
    "axum",
    "h2",
    "hyper",
    "reqwest",
    "rustls",
    "tower",
    "tracing",
    "tungstenite",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger for the configured level.
    ///
    /// Fails if a logger is already installed.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        let log_config = Self::build_log_config(Self::should_filter_dependencies(level));
        let (mode, color) = Self::terminal_for(&config.runtime_env());

        simplelog::TermLogger::init(level, log_config, mode, color)
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    // Deployed environments log to a collector, so everything goes to stdout
    // without color codes.
    fn terminal_for(env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match env {
            RustEnv::Development => (TerminalMode::Mixed, ColorChoice::Auto),
            RustEnv::Staging | RustEnv::Production => (TerminalMode::Stdout, ColorChoice::Never),
        }
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
