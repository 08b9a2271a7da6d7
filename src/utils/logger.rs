//! Logger utility for application-wide logging
//!
//! A file-backed implementation of the `log` facade that also echoes every
//! record to stderr. Filtering follows `RUST_LOG` syntax.

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use env_logger::filter::{Builder as FilterBuilder, Filter};
use log::{LevelFilter, Log, Metadata, Record};

/// Custom logger implementation
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Level and module filter
    filter: Filter,
    /// Whether records are echoed to stderr
    echo: bool,
}

impl Logger {
    /// Creates a new logger writing to `log_file`
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &str) -> io::Result<Self> {
        Logger::with_verbosity(log_file, false)
    }

    /// Creates a logger whose default level is `debug` when `verbose`
    ///
    /// A `RUST_LOG` variable in the environment takes precedence.
    pub fn with_verbosity(log_file: &str, verbose: bool) -> io::Result<Self> {
        let file = File::create(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            filter: Logger::build_filter(verbose, env::var("RUST_LOG").ok().as_deref()),
            echo: true,
        })
    }

    /// Stop echoing records to stderr
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    fn build_filter(verbose: bool, directives: Option<&str>) -> Filter {
        let mut builder = FilterBuilder::new();
        builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
        if let Some(directives) = directives {
            builder.parse(directives);
        }
        builder.build()
    }

    fn lock_file(&self) -> MutexGuard<'_, Option<File>> {
        // A panic while holding the lock leaves the file usable
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a plain line to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        if let Some(file) = &mut *self.lock_file() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Install a logger as the global `log` backend
    pub fn init_global_logger(log_file: &str, verbose: bool) -> io::Result<()> {
        let global_logger = Logger::with_verbosity(log_file, verbose)?;
        let max_level = global_logger.filter.filter();

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.filter.matches(record) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.log(&message);

            if self.echo {
                eprintln!("{}", message);
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &mut *self.lock_file() {
            let _ = file.flush();
        }
    }
}
