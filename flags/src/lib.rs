pub mod flags;

pub use crate::flags::{parse_flags, Flags, FLAGS, SCENARIOS};
