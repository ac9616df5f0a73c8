//! Colored, leveled messages for the command-line driver. Library crates log
//! through `log` instead.

mod logger;
mod raise_error;

pub use logger::{Level, Logger};
pub use raise_error::raise_error;
