use std::fmt;

use colored::*;

use crate::raise_error::raise_error;

/// Severity of a message, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Completion = 1,
    Info = 2,
    Warning = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    /// Maps `--debug_level` values 1 to 5.
    pub fn from_flag(level: i32) -> Option<Level> {
        match level {
            1 => Some(Level::Completion),
            2 => Some(Level::Info),
            3 => Some(Level::Warning),
            4 => Some(Level::Error),
            5 => Some(Level::Fatal),
            _ => None,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Level::Completion => "completion",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal error",
        }
    }

    /// Applies the formatting of this level to `message`.
    pub fn paint(&self, message: &str) -> ColoredString {
        let line = format!("{}: {}", self.prefix(), message);
        match self {
            Level::Completion => line.bright_green(),
            Level::Info => line.bright_cyan(),
            Level::Warning => line.bright_yellow(),
            Level::Error => line.bright_red(),
            Level::Fatal => line.red().bold(),
        }
    }

    /// Errors and worse end the program.
    pub fn is_fatal(&self) -> bool {
        *self >= Level::Error
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Logger {
    threshold: Level,
    debug: bool,
}

impl Logger {
    pub fn new(debug: bool, threshold: Level) -> Logger {
        Logger { threshold, debug }
    }

    /// Prints `message` when debugging at or below its level. Errors are
    /// raised regardless of the mode.
    pub fn log(&self, message: &str, level: Level) {
        if level.is_fatal() {
            raise_error(message, level);
        }
        if self.enabled(level) {
            println!("{}", level.paint(message));
        }
    }

    pub fn completion(&self, message: &str) {
        self.log(message, Level::Completion)
    }

    pub fn info(&self, message: &str) {
        self.log(message, Level::Info)
    }

    pub fn warning(&self, message: &str) {
        self.log(message, Level::Warning)
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.debug && level >= self.threshold
    }

    /// Returns the current mode where true is debug and false is not debug
    pub fn get_mode(&self) -> bool {
        self.debug
    }
}
