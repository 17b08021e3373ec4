use crate::config::Config;
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Modules to filter out from logging when not in Trace mode.
/// These are typically verbose dependencies that clutter normal log output.
const FILTERED_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "rustls",
    "tower",
    "tower_http",
    "axum",
    "mio",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global terminal logger from `config.log_level_filter`.
    ///
    /// Trace shows everything, including the HTTP stack. Any other level hides
    /// the chatty client and server dependencies so relay events stand out.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        simplelog::TermLogger::init(
            level,
            Self::log_config(Self::ignored_modules(level)),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .expect("Failed to start simplelog");
    }

    /// Module prefixes muted at `level`.
    fn ignored_modules(level: LevelFilter) -> &'static [&'static str] {
        match level {
            LevelFilter::Trace => &[],
            _ => FILTERED_MODULES,
        }
    }

    fn log_config(ignored: &[&'static str]) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        for module in ignored {
            builder.add_filter_ignore_str(*module);
        }
        builder.build()
    }
}
