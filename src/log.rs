//! Initialisation and configuration of the program logger.
//!
//! Log messages are written to the console (coloured, when attached to a terminal) and, for
//! commands that produce output, to two files in the output directory: one holding messages at
//! `info` level and above and one holding everything down to `debug`.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the
/// `STEEL_DECARB_LOG_LEVEL` environment variable or the settings file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which overrides the log level in the settings file
const LOG_LEVEL_ENV_VAR: &str = "STEEL_DECARB_LOG_LEVEL";

/// The file name for the log file containing messages about general program execution
const LOG_INFO_FILE_NAME: &str = "steel_decarb_info.log";

/// The file name for the log file containing all messages down to debug level
const LOG_DEBUG_FILE_NAME: &str = "steel_decarb_debug.log";

/// Used to indicate whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level string, as found in the settings file or environment variable
fn parse_log_level(level: &str) -> Result<LevelFilter> {
    let filter = match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(filter)
}

/// Initialise the program logger using the `fern` logging library.
///
/// The user can specify their preferred logging level via the `log_level` setting in the settings
/// file or with the `STEEL_DECARB_LOG_LEVEL` environment variable (which takes precedence). If
/// neither is specified, [`DEFAULT_LOG_LEVEL`] is used.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level specified in the settings file
/// * `log_file_path` - The folder in which to save log files. If `None`, no files are written.
pub fn init(log_level_from_settings: &str, log_file_path: Option<&Path>) -> Result<()> {
    // Retrieve the log level from the environment variable or settings, or use the default
    let env_level = env::var(LOG_LEVEL_ENV_VAR).ok();
    let log_level = env_level.as_deref().unwrap_or(log_level_from_settings);
    let log_level = parse_log_level(log_level)?;

    // Set up colours for log levels
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Automatically apply colours only if the output is a terminal
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    // Console output, split by level
    let stdout_dispatch = Dispatch::new()
        .filter(|metadata| metadata.level() > log::Level::Warn)
        .format(move |out, message, record| {
            write_log(out, record.level(), record.target(), message, use_colour_stdout, &colours);
        })
        .chain(std::io::stdout());
    let stderr_dispatch = Dispatch::new()
        .filter(|metadata| metadata.level() <= log::Level::Warn)
        .format(move |out, message, record| {
            write_log(out, record.level(), record.target(), message, use_colour_stderr, &colours);
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new().chain(
        Dispatch::new()
            .level(log_level)
            .chain(stdout_dispatch)
            .chain(stderr_dispatch),
    );

    // Log files, if requested
    if let Some(log_file_path) = log_file_path {
        let info_file = fern::log_file(log_file_path.join(LOG_INFO_FILE_NAME))?;
        let debug_file = fern::log_file(log_file_path.join(LOG_DEBUG_FILE_NAME))?;

        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .level(LevelFilter::Info)
                    .format(write_log_plain)
                    .chain(info_file),
            )
            .chain(
                Dispatch::new()
                    .level(LevelFilter::Debug)
                    .format(write_log_plain)
                    .chain(debug_file),
            );
    }

    dispatch.apply()?;

    // `apply` fails if a logger is already set, so this can only happen once
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Write a log message, optionally coloured by level
fn write_log(
    out: FormatCallback,
    level: log::Level,
    target: &str,
    message: &Arguments,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    if use_colour {
        out.finish(format_args!(
            "[{timestamp} {} {target}] {message}",
            colours.color(level)
        ));
    } else {
        out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
    }
}

/// Write a log message without colours, for log files
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    out.finish(format_args!(
        "[{} {} {}] {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target()
    ));
}
