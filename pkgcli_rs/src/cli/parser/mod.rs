//! Command-line parser.
//!
//! Binds the tokens following a command name onto a command instance using
//! that command's option catalog. Command resolution lives in
//! [`registry`](super::registry); response files are expanded beforehand by
//! [`response_file`](super::response_file).

mod core;

pub use core::{DeprecatedOption, ParseResult, extract_options, option_name};
