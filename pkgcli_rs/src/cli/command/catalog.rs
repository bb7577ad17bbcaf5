//! Option catalogs.
//!
//! Each command declares its options once with [`CatalogBuilder`]. Every
//! entry carries a binder that writes the parsed value into the concrete
//! command struct, so the parser never needs to know the struct's type.
//!
//! ```ignore
//! CatalogBuilder::<DeleteCommand>::new()
//!     .value("Source", "Package source to delete from.", |c| &mut c.source)
//!     .flag("NoPrompt", "Do not prompt before deleting.", |c| &mut c.no_prompt)
//!     .alias("np")
//!     .build();
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use super::descriptor::CommandInstance;

type Binder = Box<dyn Fn(&mut dyn Any, Option<String>) -> bool + Send + Sync>;

/// How an option consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Presence sets a boolean; no value token.
    Flag,
    /// Consumes the next token; repeating overwrites.
    Value,
    /// Consumes the next token; repeating appends.
    Multi,
}

/// One entry of an [`OptionCatalog`].
pub struct OptionSpec {
    name: String,
    aliases: Vec<String>,
    description: String,
    kind: OptionKind,
    hidden: bool,
    deprecated: bool,
    replacement: Option<String>,
    /// Declared for every command rather than by this one.
    shared: bool,
    binder: Binder,
}

impl OptionSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn takes_value(&self) -> bool {
        self.kind != OptionKind::Flag
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// One of the options every command accepts (`-Help`, `-Verbosity`, ...).
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Option to use instead of a deprecated one.
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    /// Write `value` into `target`. Returns false if `target` is not the
    /// command type this option was declared for.
    pub fn bind(&self, target: &mut dyn Any, value: Option<String>) -> bool {
        (self.binder)(target, value)
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn is_aliased(&self, name: &str) -> bool {
        self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("kind", &self.kind)
            .field("hidden", &self.hidden)
            .field("deprecated", &self.deprecated)
            .field("replacement", &self.replacement)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

/// Result of looking an option token up in a catalog.
#[derive(Debug)]
pub enum OptionMatch<'a> {
    Found(&'a OptionSpec),
    /// The token is a prefix of several option names.
    Ambiguous(Vec<&'a OptionSpec>),
    NotFound,
}

/// Ordered table of the options one command accepts.
#[derive(Debug, Default)]
pub struct OptionCatalog {
    options: Vec<OptionSpec>,
}

impl OptionCatalog {
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Options shown in help.
    pub fn visible(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter().filter(|option| !option.hidden)
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.is_named(name))
    }

    /// Look up `name` (the token without its leading dashes).
    ///
    /// Exact name wins over alias, alias wins over prefix. A prefix is only
    /// accepted when it selects exactly one of the command's own options;
    /// shared options match by full name or alias only.
    pub fn find(&self, name: &str) -> OptionMatch<'_> {
        if name.is_empty() {
            return OptionMatch::NotFound;
        }
        if let Some(option) = self.get(name) {
            return OptionMatch::Found(option);
        }
        if let Some(option) = self.options.iter().find(|option| option.is_aliased(name)) {
            return OptionMatch::Found(option);
        }

        let lowered = name.to_ascii_lowercase();
        let mut candidates: Vec<&OptionSpec> = self
            .options
            .iter()
            .filter(|option| !option.shared)
            .filter(|option| option.name.to_ascii_lowercase().starts_with(&lowered))
            .collect();
        match candidates.len() {
            0 => OptionMatch::NotFound,
            1 => OptionMatch::Found(candidates.remove(0)),
            _ => OptionMatch::Ambiguous(candidates),
        }
    }

    /// Check that no name or alias is declared twice.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen: Vec<String> = Vec::new();
        for option in &self.options {
            for label in std::iter::once(&option.name).chain(option.aliases.iter()) {
                let lowered = label.to_ascii_lowercase();
                if lowered.is_empty() {
                    return Err("option names must not be empty".to_string());
                }
                if seen.contains(&lowered) {
                    return Err(format!("option '{}' is declared more than once", label));
                }
                seen.push(lowered);
            }
            if let Some(replacement) = option.replacement()
                && self.get(replacement).is_none()
            {
                return Err(format!(
                    "option '{}' names unknown replacement '{}'",
                    option.name, replacement
                ));
            }
        }
        Ok(())
    }
}

/// Typed builder for the catalog of command type `T`.
///
/// Modifier methods ([`alias`](Self::alias), [`hidden`](Self::hidden),
/// [`deprecated`](Self::deprecated)) apply to the most recently added option.
pub struct CatalogBuilder<T> {
    options: Vec<OptionSpec>,
    hide: Vec<String>,
    _command: PhantomData<fn() -> T>,
}

impl<T: CommandInstance> CatalogBuilder<T> {
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            hide: Vec::new(),
            _command: PhantomData,
        }
    }

    pub fn flag(self, name: &str, description: &str, field: fn(&mut T) -> &mut bool) -> Self {
        self.push(name, description, OptionKind::Flag, move |command, _| {
            *field(command) = true;
        })
    }

    pub fn value(
        self,
        name: &str,
        description: &str,
        field: fn(&mut T) -> &mut Option<String>,
    ) -> Self {
        self.push(name, description, OptionKind::Value, move |command, value| {
            *field(command) = value;
        })
    }

    pub fn multi(
        self,
        name: &str,
        description: &str,
        field: fn(&mut T) -> &mut Vec<String>,
    ) -> Self {
        self.push(name, description, OptionKind::Multi, move |command, value| {
            field(command).extend(value);
        })
    }

    pub fn alias(mut self, alias: &str) -> Self {
        if let Some(option) = self.options.last_mut() {
            option.aliases.push(alias.to_string());
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        if let Some(option) = self.options.last_mut() {
            option.hidden = true;
        }
        self
    }

    pub fn deprecated(mut self, replacement: Option<&str>) -> Self {
        if let Some(option) = self.options.last_mut() {
            option.deprecated = true;
            option.replacement = replacement.map(str::to_string);
        }
        self
    }

    /// Hide an option by name, including the shared ones added at build time.
    pub fn hide(mut self, name: &str) -> Self {
        self.hide.push(name.to_string());
        self
    }

    /// Append the options every command shares.
    fn common(self) -> Self {
        self.flag("Help", "Display help information for the command.", |c| {
            &mut c.base_mut().help
        })
        .alias("?")
        .value(
            "Verbosity",
            "Display this amount of detail in the output: normal, quiet, detailed.",
            |c| &mut c.base_mut().verbosity,
        )
        .flag(
            "NonInteractive",
            "Do not prompt for user input or confirmations.",
            |c| &mut c.base_mut().non_interactive,
        )
        .value(
            "ConfigFile",
            "The settings file to apply. Defaults to the user settings file.",
            |c| &mut c.base_mut().config_file,
        )
        .flag(
            "ForceEnglishOutput",
            "Forces the application to run using an invariant, English-based culture.",
            |c| &mut c.base_mut().force_english_output,
        )
    }

    pub fn build(self) -> OptionCatalog {
        let own = self.options.len();
        let mut builder = self.common();
        for option in &mut builder.options[own..] {
            option.shared = true;
        }
        for name in std::mem::take(&mut builder.hide) {
            if let Some(option) = builder
                .options
                .iter_mut()
                .find(|option| option.is_named(&name))
            {
                option.hidden = true;
            }
        }
        OptionCatalog {
            options: builder.options,
        }
    }

    fn push<F>(mut self, name: &str, description: &str, kind: OptionKind, apply: F) -> Self
    where
        F: Fn(&mut T, Option<String>) + Send + Sync + 'static,
    {
        let binder: Binder = Box::new(move |target, value| match target.downcast_mut::<T>() {
            Some(command) => {
                apply(command, value);
                true
            }
            None => false,
        });
        self.options.push(OptionSpec {
            name: name.to_string(),
            aliases: Vec::new(),
            description: description.to_string(),
            kind,
            hidden: false,
            deprecated: false,
            replacement: None,
            shared: false,
            binder,
        });
        self
    }
}

impl<T: CommandInstance> Default for CatalogBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
