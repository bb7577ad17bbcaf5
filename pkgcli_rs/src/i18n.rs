//! User-facing message catalogue.
//!
//! The UI language comes from `PKGCLI_CLI_LANGUAGE` and is resolved once per
//! process. `-ForceEnglishOutput` bypasses it for a single invocation.

use once_cell::sync::OnceCell;

/// Environment variable selecting the UI language.
pub const LANGUAGE_ENV: &str = "PKGCLI_CLI_LANGUAGE";

static PROCESS_LANGUAGE: OnceCell<Language> = OnceCell::new();

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// Parse a language tag such as `es`, `es-ES` or `en_US`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_', '.']).next()?;
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "es" => Some(Language::Spanish),
            _ => None,
        }
    }
}

/// Resolve the language from the raw environment value.
///
/// An unusable value is logged and the default language is kept.
pub fn resolve_language(raw: Option<&str>) -> Language {
    let Some(raw) = raw else {
        return Language::default();
    };
    if raw.trim().is_empty() {
        return Language::default();
    }
    match Language::from_tag(raw) {
        Some(language) => language,
        None => {
            tracing::error!(
                variable = LANGUAGE_ENV,
                value = raw,
                "Invalid value for {}: '{}'. Falling back to English.",
                LANGUAGE_ENV,
                raw
            );
            Language::default()
        }
    }
}

/// Language configured for this process; reads the environment on first use.
pub fn process_language() -> Language {
    *PROCESS_LANGUAGE.get_or_init(|| {
        let raw = std::env::var(LANGUAGE_ENV).ok();
        resolve_language(raw.as_deref())
    })
}

/// Keys of every translated message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Msg {
    CommandDeprecated,
    CommandDeprecatedUseInstead,
    OptionDeprecated,
    OptionDeprecatedUseInstead,
    DeprecatedMarker,
    HelpUsage,
    HelpOptions,
    HelpAlias,
    HelpMultiple,
    HelpAvailableCommands,
    HelpMoreInfo,
    HelpVersion,
    HelpExamples,
    HelpReference,
}

impl Msg {
    fn english(self) -> &'static str {
        match self {
            Msg::CommandDeprecated => {
                "'{command}' is deprecated and will be removed in a future release."
            }
            Msg::CommandDeprecatedUseInstead => {
                "'{command}' is deprecated and will be removed in a future release. Use '{alternative}' instead."
            }
            Msg::OptionDeprecated => "Option '{option}' is deprecated.",
            Msg::OptionDeprecatedUseInstead => {
                "Option '{option}' is deprecated. Use '{replacement}' instead."
            }
            Msg::DeprecatedMarker => "(deprecated)",
            Msg::HelpUsage => "usage",
            Msg::HelpOptions => "options",
            Msg::HelpAlias => "alias",
            Msg::HelpMultiple => "may be specified more than once",
            Msg::HelpAvailableCommands => "Available commands:",
            Msg::HelpMoreInfo => "Type '{binary} help <command>' for help on a specific command.",
            Msg::HelpVersion => "{binary} Version: {version}",
            Msg::HelpExamples => "examples",
            Msg::HelpReference => "Command Reference",
        }
    }

    fn spanish(self) -> &'static str {
        match self {
            Msg::CommandDeprecated => {
                "'{command}' está en desuso y se eliminará en una versión futura."
            }
            Msg::CommandDeprecatedUseInstead => {
                "'{command}' está en desuso y se eliminará en una versión futura. Use '{alternative}' en su lugar."
            }
            Msg::OptionDeprecated => "La opción '{option}' está en desuso.",
            Msg::OptionDeprecatedUseInstead => {
                "La opción '{option}' está en desuso. Use '{replacement}' en su lugar."
            }
            Msg::DeprecatedMarker => "(en desuso)",
            Msg::HelpUsage => "uso",
            Msg::HelpOptions => "opciones",
            Msg::HelpAlias => "alias",
            Msg::HelpMultiple => "se puede especificar más de una vez",
            Msg::HelpAvailableCommands => "Comandos disponibles:",
            Msg::HelpMoreInfo => {
                "Escriba '{binary} help <comando>' para obtener ayuda sobre un comando."
            }
            Msg::HelpVersion => "{binary} Versión: {version}",
            Msg::HelpExamples => "ejemplos",
            Msg::HelpReference => "Referencia de comandos",
        }
    }
}

/// Renders catalogue messages in one language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Localizer {
    language: Language,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Message text without placeholder substitution.
    pub fn text(&self, msg: Msg) -> &'static str {
        match self.language {
            Language::English => msg.english(),
            Language::Spanish => msg.spanish(),
        }
    }

    /// Message text with `{name}` placeholders replaced.
    pub fn format(&self, msg: Msg, args: &[(&str, &str)]) -> String {
        let mut rendered = self.text(msg).to_string();
        for (name, value) in args {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }
        rendered
    }
}
