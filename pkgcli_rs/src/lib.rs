//! # pkgcli
//!
//! Command-line core of a package manager client: everything between argv
//! and a command body.
//!
//! - **Response files**: `@file` tokens are replaced by the whitespace-split
//!   contents of the file, nested up to three levels, 2 MB per file.
//! - **Typed option binding**: each command declares a static option catalog;
//!   `-Name value` pairs are written straight into the command struct.
//! - **Registry and dispatch**: built-in commands plus extension commands,
//!   deprecation warnings, help switches and exit codes.
//! - **Help**: plain or Markdown, for one command or the whole catalog.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pkgcli::cli::{CommandRegistry, Dispatcher, Services};
//! use pkgcli::console::SystemConsole;
//! use pkgcli::engine::UnconfiguredEngine;
//! use pkgcli::settings::TomlSettingsLoader;
//!
//! let services = Services {
//!     console: Arc::new(SystemConsole::new()),
//!     settings: Arc::new(TomlSettingsLoader),
//!     engine: Arc::new(UnconfiguredEngine),
//!     working_dir: std::env::current_dir()?,
//! };
//! let dispatcher = Dispatcher::new(CommandRegistry::builtin()?, services);
//! let code = dispatcher.run(&["help".to_string()])?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Package operations themselves (restore, delete, verify) are delegated to a
//! [`engine::PackageEngine`] implementation supplied by the embedder.

pub mod cli;
pub mod console;
pub mod engine;
pub mod fs_utils;
pub mod i18n;
pub mod settings;
pub mod types;

pub use cli::{CommandRegistry, Dispatcher, Services};
pub use types::Verbosity;
