//! Bridge from the `log` crate macros to a [`Logger`]'s default alias.

use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::logger::Logger;

struct LogFacade {
    logger: Logger,
}

impl Log for LogFacade {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let level = match record.level() {
            Level::Error => "ERROR".red(),
            Level::Warn => "WARN".yellow(),
            Level::Info => "INFO".green(),
            Level::Debug => "DEBUG".blue(),
            Level::Trace => "TRACE".purple(),
        };
        // facade writes are best-effort, a failed sink cannot panic the
        // caller's log macro
        let _ = self.logger.write(&format!("{level} {}", record.args()));
    }

    fn flush(&self) {}
}

/// Installs `logger` as the process-wide `log` crate backend. Records of
/// every level are forwarded to the default alias; filtering stays out of
/// scope.
pub fn init_log_facade(logger: &Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LogFacade {
        logger: logger.clone(),
    }))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
