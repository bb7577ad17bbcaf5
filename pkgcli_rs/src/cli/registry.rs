//! Command registry.
//!
//! Built once at startup from the built-in commands plus any extension
//! commands, then only read. Lookup is an exact, case-insensitive match on a
//! command's name or one of its aliases.

use strsim::levenshtein;

use super::command::CommandDescriptor;
use super::dispatch::builtin_descriptors;
use super::error::CliError;

/// Supplies additional commands, e.g. from a plugin directory.
pub trait ExtensionProvider {
    fn descriptors(&self) -> Vec<CommandDescriptor>;
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    descriptors: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    pub fn builtin() -> Result<Self, CliError> {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Add one command. Fails if its name or an alias is already taken.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), CliError> {
        if let Some(taken) = descriptor
            .labels()
            .find(|label| self.descriptors.iter().any(|d| d.answers_to(label)))
        {
            return Err(CliError::DuplicateCommand {
                name: taken.to_string(),
            });
        }
        tracing::trace!(command = descriptor.name(), "registered command");
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Merge the commands of an extension provider.
    pub fn with_extensions(mut self, provider: &dyn ExtensionProvider) -> Result<Self, CliError> {
        for descriptor in provider.descriptors() {
            self.register(descriptor)?;
        }
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Result<&CommandDescriptor, CliError> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.answers_to(name))
            .ok_or_else(|| CliError::UnknownCommand {
                name: name.to_string(),
                suggestion: self.suggest(name),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Closest visible command name within edit distance 2.
    fn suggest(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();
        let mut best_match: Option<(&str, usize)> = None;

        for descriptor in self.descriptors.iter().filter(|d| !d.is_hidden()) {
            let distance = levenshtein(&input_lower, &descriptor.name().to_lowercase());
            if distance <= 2 && best_match.is_none_or(|(_, best)| distance < best) {
                best_match = Some((descriptor.name(), distance));
            }
        }

        best_match.map(|(name, _)| name.to_string())
    }
}
