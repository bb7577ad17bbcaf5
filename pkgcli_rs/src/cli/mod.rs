//! Command-line core: response files, option binding and dispatch.
//!
//! # Architecture
//!
//! ```text
//! argv
//!   │
//!   ▼
//! response_file::expand      @file tokens spliced in (depth ≤ 3, ≤ 2 MB)
//!   │
//!   ▼
//! CommandRegistry::resolve   name or alias → CommandDescriptor
//!   │
//!   ▼
//! parser::extract_options    catalog binders write into the command struct
//!   │
//!   ▼
//! Dispatcher                 deprecation warnings, execute, exit code
//! ```
//!
//! # Module Structure
//!
//! - [`command`] - descriptors, option catalogs, help rendering
//! - [`registry`] - built-in and extension commands
//! - [`parser`] - option binding
//! - [`response_file`] - `@file` expansion
//! - [`dispatch`] - the dispatcher and the built-in command handlers
//! - [`entrypoint`] - process setup for the `pkgcli` binary

pub mod command;
pub mod dispatch;
pub mod entrypoint;
mod error;
pub mod parser;
pub mod registry;
pub mod response_file;

/// Name the executable is invoked as; used in help text.
pub const BINARY_NAME: &str = "pkgcli";

pub use command::{
    CatalogBuilder, CommandBase, CommandContext, CommandDescriptor, CommandInstance,
    OptionCatalog, OptionKind, render_catalog_help, render_command_help,
};
pub use dispatch::{Dispatcher, Services};
pub use error::{CliError, CommandError, ResponseFileError, ResponseFileErrorKind};
pub use parser::{ParseResult, extract_options};
pub use registry::{CommandRegistry, ExtensionProvider};
