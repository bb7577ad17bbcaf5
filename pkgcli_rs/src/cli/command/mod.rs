//! Command model: descriptors, option catalogs and help rendering.
//!
//! - `base`: options and arguments shared by every command
//! - `catalog`: typed option declarations and lookup
//! - `descriptor`: command metadata, the [`CommandInstance`] trait and its context
//! - `help`: plain and markdown help text

mod base;
pub mod catalog;
mod descriptor;
pub mod help;

pub use base::CommandBase;
pub use catalog::{CatalogBuilder, OptionCatalog, OptionKind, OptionMatch, OptionSpec};
pub use descriptor::{
    CommandContext, CommandDescriptor, CommandInstance, Deprecation, DescriptorBuilder,
};
pub use help::{render_catalog_help, render_command_help};
