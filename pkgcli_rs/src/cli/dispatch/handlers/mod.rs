//! Built-in command handlers.
//!
//! One module per command. Each exposes a `descriptor()` declaring the
//! command's options and a struct implementing
//! [`CommandInstance`](crate::cli::command::CommandInstance).

pub mod config;
pub mod delete;
pub mod deprecation;
pub mod help;
pub mod init;
pub mod locals;
pub mod restore;
pub mod set_api_key;
pub mod sources;
pub mod spec;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

use crate::cli::command::CommandDescriptor;
use crate::cli::error::CommandError;
use crate::settings::{SettingsStore, sections};

/// Source used when neither `-Source` nor `defaultPushSource` is set.
pub const DEFAULT_SOURCE: &str = "https://api.pkgcli.org/v3/index.json";

pub(crate) fn builtin_descriptors() -> Vec<CommandDescriptor> {
    vec![
        restore::descriptor(),
        delete::descriptor(),
        config::descriptor(),
        locals::descriptor(),
        sources::descriptor(),
        init::descriptor(),
        set_api_key::descriptor(),
        verify::descriptor(),
        spec::descriptor(),
        help::descriptor(),
    ]
}

/// Fail with a usage error unless the argument count is within `range`.
pub(crate) fn expect_arguments(
    arguments: &[String],
    range: std::ops::RangeInclusive<usize>,
    message: &str,
) -> Result<(), CommandError> {
    if range.contains(&arguments.len()) {
        Ok(())
    } else {
        Err(CommandError::Usage(message.to_string()))
    }
}

/// `-Source` if given, otherwise the configured default push source.
pub(crate) fn push_source(explicit: Option<&str>, settings: &dyn SettingsStore) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| settings.get(sections::CONFIG, "defaultPushSource"))
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string())
}

/// Turn a settings write failure into a user-facing error.
pub(crate) fn settings_error(err: anyhow::Error) -> CommandError {
    CommandError::Failed(format!("{:#}", err))
}
