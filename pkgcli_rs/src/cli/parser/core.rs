//! Option binding: walks the token stream and writes options into a command.

use super::super::command::{CommandDescriptor, CommandInstance, OptionMatch};
use super::super::error::CliError;

/// A deprecated option that was used on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecatedOption {
    pub name: String,
    pub replacement: Option<String>,
}

/// What the parser learned besides the bound fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub positional_args: Vec<String>,
    pub deprecated_options: Vec<DeprecatedOption>,
}

/// Option name carried by `token`, without its dash prefix.
///
/// `-Name` and `--Name` are options; `-` and `--` alone are positional.
pub fn option_name(token: &str) -> Option<&str> {
    let name = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))?;
    if name.is_empty() { None } else { Some(name) }
}

/// Bind `tokens` (everything after the command name) onto `command`.
///
/// Flags take no value, value options consume the following token and multi
/// options append. Anything that is not an option is positional and kept in
/// order, empty strings included. The positional arguments are also stored in
/// the command's [`CommandBase`](super::super::command::CommandBase).
pub fn extract_options<I>(
    command: &mut dyn CommandInstance,
    descriptor: &CommandDescriptor,
    tokens: I,
) -> Result<ParseResult, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut tokens = tokens.into_iter();
    let mut result = ParseResult::default();

    while let Some(token) = tokens.next() {
        let Some(name) = option_name(&token) else {
            result.positional_args.push(token);
            continue;
        };

        let option = match descriptor.catalog().find(name) {
            OptionMatch::Found(option) => option,
            OptionMatch::Ambiguous(candidates) => {
                return Err(CliError::AmbiguousOption {
                    token: token.clone(),
                    command: descriptor.name().to_string(),
                    candidates: candidates
                        .iter()
                        .map(|option| format!("-{}", option.name()))
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            OptionMatch::NotFound => {
                return Err(CliError::UnknownOption {
                    token: token.clone(),
                    command: descriptor.name().to_string(),
                });
            }
        };

        let value = if option.takes_value() {
            let value = tokens.next().ok_or_else(|| CliError::MissingOptionValue {
                option: option.name().to_string(),
                command: descriptor.name().to_string(),
            })?;
            Some(value)
        } else {
            None
        };

        let bound = option.bind(command.as_any_mut(), value);
        debug_assert!(
            bound,
            "option -{} was declared for a different command type than '{}'",
            option.name(),
            descriptor.name()
        );

        if option.is_deprecated()
            && !result
                .deprecated_options
                .iter()
                .any(|used| used.name == option.name())
        {
            result.deprecated_options.push(DeprecatedOption {
                name: option.name().to_string(),
                replacement: option.replacement().map(str::to_string),
            });
        }
    }

    command.base_mut().arguments = result.positional_args.clone();
    Ok(result)
}
