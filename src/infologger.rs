
/* Copyright (C) 2024 Philipp Benner
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::io::{self, Write};
use std::sync::Mutex;

use log::{Level, LevelFilter, Metadata, Record};

/* -------------------------------------------------------------------------- */

/// A minimal `log` backend writing plain lines to a sink.
///
/// Verbosity follows the `-v` convention of the command line tools:
/// `0` shows warnings and errors, `1` adds progress messages and `2` or
/// more adds the command lines of all external tools.
pub struct Logger {
    sink : Mutex<Box<dyn Write + Send>>,
    level: LevelFilter,
}

/* -------------------------------------------------------------------------- */

impl Logger {

    pub fn new_void() -> Logger {
        Logger::new(Box::new(io::sink()), 0)
    }

    pub fn new_stdout(verbose: u8) -> Logger {
        Logger::new(Box::new(io::stdout()), verbose)
    }

    pub fn new_stderr(verbose: u8) -> Logger {
        Logger::new(Box::new(io::stderr()), verbose)
    }

    fn new(sink: Box<dyn Write + Send>, verbose: u8) -> Logger {
        Logger {
            sink : Mutex::new(sink),
            level: level_filter(verbose),
        }
    }

    /// Installs a stderr logger as the global `log` backend. Calling this
    /// more than once keeps the first logger.
    pub fn init(verbose: u8) {
        let logger = Logger::new_stderr(verbose);
        let level  = logger.level;
        if log::set_boxed_logger(Box::new(logger)).is_ok() {
            log::set_max_level(level);
        }
    }

}

/* -------------------------------------------------------------------------- */

pub fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/* -------------------------------------------------------------------------- */

impl log::Log for Logger {

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut sink) = self.sink.lock() {
            // write errors on the log sink are ignored
            let _ = match record.level() {
                Level::Error | Level::Warn => writeln!(sink, "{}: {}", record.level(), record.args()),
                _                          => writeln!(sink, "{}", record.args()),
            };
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }

}

/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {

    use log::{Log, LevelFilter};

    use super::{level_filter, Logger};

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(0), LevelFilter::Warn);
        assert_eq!(level_filter(1), LevelFilter::Info);
        assert_eq!(level_filter(2), LevelFilter::Debug);
        assert_eq!(level_filter(7), LevelFilter::Debug);
    }

    #[test]
    fn test_void_logger() {
        let logger = Logger::new_void();

        assert!(!logger.enabled(&log::Metadata::builder().level(log::Level::Info).build()));
        assert!( logger.enabled(&log::Metadata::builder().level(log::Level::Error).build()));
    }
}
