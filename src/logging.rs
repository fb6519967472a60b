//! Logger setup for the simulator binary.
//!
//! Info and below go to stdout, warnings and errors to stderr. Level names
//! are coloured only when the stream is a terminal. The `EVSIM_LOG_LEVEL`
//! environment variable overrides the level from the scenario file.
use std::env;
use std::fmt::{Arguments, Display};
use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};

/// Environment variable taking precedence over `[logging] level`.
pub const LOG_LEVEL_ENV: &str = "EVSIM_LOG_LEVEL";

/// Parses a level name (case-insensitive).
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    Ok(match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("unknown log level: {unknown}"),
    })
}

/// Installs the process-wide logger.
///
/// # Arguments
///
/// * `level_from_config` - Level named in the scenario; the environment
///   variable wins if set
///
/// # Errors
///
/// Fails on an unknown level name or if a logger is already installed.
pub fn init(level_from_config: &str) -> Result<()> {
    let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| level_from_config.to_string());
    let level = parse_level(&level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
        .apply()
        .context("logger already initialised")
}

fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log(out, record.level(), record.target(), message);
    }
}
