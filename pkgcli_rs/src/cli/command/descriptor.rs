//! Command descriptors and the runtime command interface.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;

use super::base::CommandBase;
use super::catalog::{CatalogBuilder, OptionCatalog};
use crate::cli::CommandError;
use crate::cli::registry::CommandRegistry;
use crate::console::Console;
use crate::engine::PackageEngine;
use crate::i18n::{Localizer, Msg};
use crate::settings::{SettingsLoader, SettingsStore};

/// A command bound for one invocation.
///
/// Implementors are plain structs whose fields are the option targets
/// declared in their catalog.
#[async_trait]
pub trait CommandInstance: Any + Send {
    fn base(&self) -> &CommandBase;

    fn base_mut(&mut self) -> &mut CommandBase;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Run the command. `Ok` carries the process exit code.
    ///
    /// Return [`CommandError`] for failures the user should see as a message;
    /// any other error is treated as a defect and propagated.
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> anyhow::Result<i32>;
}

/// Everything a command body may use.
pub struct CommandContext<'a> {
    pub console: &'a dyn Console,
    pub registry: &'a CommandRegistry,
    pub engine: &'a dyn PackageEngine,
    pub localizer: Localizer,
    pub working_dir: &'a Path,
    settings_loader: &'a dyn SettingsLoader,
    config_file: Option<PathBuf>,
    settings: OnceCell<Arc<dyn SettingsStore>>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        console: &'a dyn Console,
        registry: &'a CommandRegistry,
        engine: &'a dyn PackageEngine,
        settings_loader: &'a dyn SettingsLoader,
        working_dir: &'a Path,
    ) -> Self {
        Self {
            console,
            registry,
            engine,
            localizer: Localizer::default(),
            working_dir,
            settings_loader,
            config_file: None,
            settings: OnceCell::new(),
        }
    }

    pub fn with_localizer(mut self, localizer: Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    /// Use `-ConfigFile`; relative paths resolve against the working directory.
    pub fn with_config_file(mut self, config_file: Option<&str>) -> Self {
        self.config_file = config_file.map(|file| self.resolve_path(file));
        self
    }

    /// Settings for this invocation, loaded on first use.
    pub fn settings(&self) -> Result<Arc<dyn SettingsStore>, CommandError> {
        self.settings
            .get_or_try_init(|| self.settings_loader.load(self.config_file.as_deref()))
            .map(Arc::clone)
    }

    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }
}

/// Deprecation metadata of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    /// Command to use instead, if there is one.
    pub alternative: Option<String>,
}

type Factory = Box<dyn Fn() -> Box<dyn CommandInstance> + Send + Sync>;

/// Static description of one command. Built once, read-only afterwards.
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    summary: String,
    usage: String,
    description: String,
    examples: Vec<String>,
    catalog: OptionCatalog,
    deprecation: Option<Deprecation>,
    hidden: bool,
    factory: Factory,
}

impl CommandDescriptor {
    pub fn builder<T>(name: &str) -> DescriptorBuilder<T>
    where
        T: CommandInstance + Default,
    {
        DescriptorBuilder {
            name: name.to_string(),
            aliases: Vec::new(),
            summary: String::new(),
            usage: String::new(),
            description: String::new(),
            examples: Vec::new(),
            catalog: CatalogBuilder::new(),
            deprecation: None,
            hidden: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// One-line summary used in the command list.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Argument synopsis, e.g. `<package Id> <package version>`.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn deprecation(&self) -> Option<&Deprecation> {
        self.deprecation.as_ref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Name and aliases, compared case-insensitively.
    pub fn answers_to(&self, token: &str) -> bool {
        self.labels().any(|label| label.eq_ignore_ascii_case(token))
    }

    pub(crate) fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Fresh instance with every field at its default.
    pub fn instantiate(&self) -> Box<dyn CommandInstance> {
        (self.factory)()
    }

    /// Localized deprecation notice, `None` for current commands.
    pub fn deprecation_warning(&self, localizer: &Localizer) -> Option<String> {
        let deprecation = self.deprecation.as_ref()?;
        Some(match deprecation.alternative.as_deref() {
            Some(alternative) => localizer.format(
                Msg::CommandDeprecatedUseInstead,
                &[("command", self.name.as_str()), ("alternative", alternative)],
            ),
            None => localizer.format(Msg::CommandDeprecated, &[("command", self.name.as_str())]),
        })
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("deprecation", &self.deprecation)
            .field("hidden", &self.hidden)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`CommandDescriptor::builder`].
pub struct DescriptorBuilder<T> {
    name: String,
    aliases: Vec<String>,
    summary: String,
    usage: String,
    description: String,
    examples: Vec<String>,
    catalog: CatalogBuilder<T>,
    deprecation: Option<Deprecation>,
    hidden: bool,
}

impl<T> DescriptorBuilder<T>
where
    T: CommandInstance + Default,
{
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    /// Longer help text. Defaults to the summary.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }

    pub fn deprecated(mut self, alternative: Option<&str>) -> Self {
        self.deprecation = Some(Deprecation {
            alternative: alternative.map(str::to_string),
        });
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Declare the command's own options.
    pub fn options(mut self, declare: impl FnOnce(CatalogBuilder<T>) -> CatalogBuilder<T>) -> Self {
        self.catalog = declare(self.catalog);
        self
    }

    pub fn build(self) -> CommandDescriptor {
        let description = if self.description.is_empty() {
            self.summary.clone()
        } else {
            self.description
        };
        CommandDescriptor {
            name: self.name,
            aliases: self.aliases,
            summary: self.summary,
            usage: self.usage,
            description,
            examples: self.examples,
            catalog: self.catalog.build(),
            deprecation: self.deprecation,
            hidden: self.hidden,
            factory: Box::new(|| Box::new(T::default()) as Box<dyn CommandInstance>),
        }
    }
}
