use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
        Append,
    },
    config::{Appender, Config, Root},
    encode::{json::JsonEncoder, pattern::PatternEncoder},
};
use std::env;
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::config::LoggingConfig;

pub struct Logger;

pub static LOGGER_ENABLED: OnceCell<bool> = OnceCell::new();

#[macro_export]
macro_rules! logger {
    ($level:ident, $($arg:tt)+) => {
        if let Some(true) = $crate::logging::LOGGER_ENABLED.get() {
            ::log::$level!($($arg)+);
        }
    };
}

impl Logger {
    /// Level: config → `RUST_LOG` → info.
    /// Output: JSON lines to `config.path` when set, otherwise plain lines to stderr.
    pub fn init(config: &LoggingConfig) -> Result<(), anyhow::Error> {
        let level = match &config.level {
            Some(level) => level.to_string(),
            None => env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        let level_filter = LevelFilter::from_str(&level)?;

        let appender: Box<dyn Append> = match &config.path {
            Some(path) => Box::new(
                FileAppender::builder()
                    .append(true)
                    .encoder(Box::new(JsonEncoder::new()))
                    .build(path)?,
            ),
            None => Box::new(
                ConsoleAppender::builder()
                    .target(Target::Stderr)
                    .encoder(Box::new(PatternEncoder::new(
                        "{d(%Y-%m-%dT%H:%M:%S%.3f%z)} {l} {t} - {m}{n}",
                    )))
                    .build(),
            ),
        };

        let config = Config::builder()
            .appender(Appender::builder().build("output", appender))
            .build(Root::builder().appender("output").build(level_filter))?;

        log4rs::init_config(config)?;

        LOGGER_ENABLED
            .set(true)
            .map_err(|_| anyhow::anyhow!("logger is already initialized"))?;

        Ok(())
    }
}
