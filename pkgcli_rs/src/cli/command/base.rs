//! State shared by every command instance.

/// Options and positional arguments common to all commands.
///
/// The catalog binds `-Help`, `-Verbosity`, `-NonInteractive`, `-ConfigFile`
/// and `-ForceEnglishOutput` here for every command; the dispatcher applies
/// them before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBase {
    /// Positional arguments in the order they were given.
    pub arguments: Vec<String>,
    pub help: bool,
    /// Raw `-Verbosity` value; parsed by the dispatcher.
    pub verbosity: Option<String>,
    pub non_interactive: bool,
    pub config_file: Option<String>,
    pub force_english_output: bool,
}

impl CommandBase {
    /// Positional argument at `index`, if present.
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }
}
