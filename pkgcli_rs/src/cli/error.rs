//! Error taxonomy of the command-line core.
//!
//! [`CliError`] covers everything detected before a command runs and is
//! always reported with usage text. [`CommandError`] is raised by command
//! bodies for ordinary failures. Any other error coming out of a command is
//! treated as a defect and propagated untouched.

use std::path::PathBuf;

use thiserror::Error;

use super::response_file::{MAX_DEPTH, MAX_FILE_SIZE};

/// Discriminant of a [`ResponseFileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFileErrorKind {
    NotFound,
    TooLarge,
    TooDeep,
    InvalidEncoding,
    Io,
}

#[derive(Debug, Error)]
pub enum ResponseFileError {
    #[error("Response file '{path}' does not exist.")]
    NotFound { path: String },

    #[error(
        "Response file '{}' is {size} bytes, which exceeds the 2MB limit of {} bytes.",
        path.display(),
        MAX_FILE_SIZE
    )]
    TooLarge { path: PathBuf, size: u64 },

    #[error(
        "Response file '{}' is nested too deeply. Response files may be nested at most {} levels deep.",
        path.display(),
        MAX_DEPTH
    )]
    TooDeep { path: PathBuf },

    #[error("Response file '{}' is not valid UTF-8 text.", path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("Failed to read response file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResponseFileError {
    pub fn kind(&self) -> ResponseFileErrorKind {
        match self {
            ResponseFileError::NotFound { .. } => ResponseFileErrorKind::NotFound,
            ResponseFileError::TooLarge { .. } => ResponseFileErrorKind::TooLarge,
            ResponseFileError::TooDeep { .. } => ResponseFileErrorKind::TooDeep,
            ResponseFileError::InvalidEncoding { .. } => ResponseFileErrorKind::InvalidEncoding,
            ResponseFileError::Io { .. } => ResponseFileErrorKind::Io,
        }
    }
}

/// Failure while turning argv into a bound command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    ResponseFile(#[from] ResponseFileError),

    #[error("Unknown command: '{name}'.{}", suggestion_hint(suggestion.as_deref()))]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error("'{token}' is not a valid option for the '{command}' command.")]
    UnknownOption { token: String, command: String },

    #[error("Missing value for option '-{option}' of the '{command}' command.")]
    MissingOptionValue { option: String, command: String },

    #[error("'{token}' is ambiguous for the '{command}' command. It matches: {candidates}.")]
    AmbiguousOption {
        token: String,
        command: String,
        candidates: String,
    },

    #[error("A command named '{name}' is already registered.")]
    DuplicateCommand { name: String },
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    suggestion.map_or(String::new(), |s| format!(" Did you mean '{}'?", s))
}

/// Ordinary failure raised by a command body.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong arguments for the command; the dispatcher also prints its help.
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Failed(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CommandError::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_deep_mentions_limit() {
        let err = ResponseFileError::TooDeep {
            path: PathBuf::from("d.rsp"),
        };
        assert!(err.to_string().contains('3'));
        assert_eq!(err.kind(), ResponseFileErrorKind::TooDeep);
    }

    #[test]
    fn test_too_large_mentions_2mb() {
        let err = ResponseFileError::TooLarge {
            path: PathBuf::from("big.rsp"),
            size: 2_000_001,
        };
        assert!(err.to_string().to_lowercase().contains("2mb"));
    }

    #[test]
    fn test_unknown_command_suggestion() {
        let err = CliError::UnknownCommand {
            name: "restor".into(),
            suggestion: Some("restore".into()),
        };
        assert_eq!(
            err.to_string(),
            "Unknown command: 'restor'. Did you mean 'restore'?"
        );
    }

    #[test]
    fn test_unknown_option_names_token() {
        let err = CliError::UnknownOption {
            token: "-NoHttpCache".into(),
            command: "delete".into(),
        };
        assert!(
            err.to_string()
                .starts_with("'-NoHttpCache' is not a valid option")
        );
    }
}
