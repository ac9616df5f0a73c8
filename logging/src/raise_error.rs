use std::process::exit;

use crate::logger::Level;

/// Prints `error` to stderr and exits the program when the level is
/// [`Level::Error`] or worse.
///
/// # Arguments
///
/// * `error` - The message
/// * `level` - How severe it is
pub fn raise_error(error: &str, level: Level) {
    eprintln!("{}", level.paint(error));
    if level.is_fatal() {
        exit(1);
    }
}
