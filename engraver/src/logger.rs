//! Logger set up for the engraver.

use std::time::Instant;

use colored::{ColoredString, Colorize};
use log::{info, LevelFilter};
use thiserror::Error;

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

/// Initialise the logger for this execution.
///
/// Records go to stdout and, if `log_file` is given, are appended to that
/// file. Every record is prefixed with the seconds elapsed since this call.
///
/// # Safety
///
/// - This function must only be called once.
pub fn logger_init(
    min_level: LevelFilter,
    log_file: Option<&str>,
) -> Result<(), LoggerInitError> {
    let start = Instant::now();

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let elapsed = start.elapsed().as_secs_f64();
            // Include the target for debug and trace records only.
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    elapsed,
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    elapsed,
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(
            fern::log_file(path).map_err(LoggerInitError::LogFileInitError)?,
        );
    }

    dispatch.apply().map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Log level: {:?}", min_level);
    if let Some(path) = log_file {
        info!("    Log file path: {}", path);
    }

    Ok(())
}

/// Get the string representation of a log level.
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}
