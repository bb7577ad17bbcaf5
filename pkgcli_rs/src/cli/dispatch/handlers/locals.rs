//! `locals`: list or clear the local package folders.

use std::any::Any;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;

use super::expect_arguments;
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::fs_utils;
use crate::settings::{SettingsStore, sections};

/// One kind of local folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFolder {
    HttpCache,
    GlobalPackages,
    Temp,
    PluginsCache,
}

impl LocalFolder {
    pub const ALL: [LocalFolder; 4] = [
        LocalFolder::HttpCache,
        LocalFolder::GlobalPackages,
        LocalFolder::Temp,
        LocalFolder::PluginsCache,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LocalFolder::HttpCache => "http-cache",
            LocalFolder::GlobalPackages => "global-packages",
            LocalFolder::Temp => "temp",
            LocalFolder::PluginsCache => "plugins-cache",
        }
    }

    /// `config` section key that overrides the folder.
    fn setting_key(self) -> &'static str {
        match self {
            LocalFolder::HttpCache => "httpCacheFolder",
            LocalFolder::GlobalPackages => "globalPackagesFolder",
            LocalFolder::Temp => "tempFolder",
            LocalFolder::PluginsCache => "pluginsCacheFolder",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            LocalFolder::HttpCache => "PKGCLI_HTTP_CACHE_PATH",
            LocalFolder::GlobalPackages => "PKGCLI_PACKAGES",
            LocalFolder::Temp => "PKGCLI_SCRATCH",
            LocalFolder::PluginsCache => "PKGCLI_PLUGINS_CACHE_PATH",
        }
    }

    fn default_path(self) -> Option<PathBuf> {
        match self {
            LocalFolder::HttpCache => dirs::cache_dir().map(|dir| dir.join("pkgcli").join("v3-cache")),
            LocalFolder::GlobalPackages => {
                dirs::home_dir().map(|dir| dir.join(".pkgcli").join("packages"))
            }
            LocalFolder::Temp => Some(std::env::temp_dir().join("PkgCliScratch")),
            LocalFolder::PluginsCache => {
                dirs::cache_dir().map(|dir| dir.join("pkgcli").join("plugins-cache"))
            }
        }
    }

    /// Settings first, then the environment, then the platform default.
    pub fn resolve(self, settings: &dyn SettingsStore) -> Option<PathBuf> {
        settings
            .get(sections::CONFIG, self.setting_key())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os(self.env_var())
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .or_else(|| self.default_path())
    }
}

/// The positional argument: one folder or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalsTarget {
    All,
    One(LocalFolder),
}

impl LocalsTarget {
    fn folders(self) -> Vec<LocalFolder> {
        match self {
            LocalsTarget::All => LocalFolder::ALL.to_vec(),
            LocalsTarget::One(folder) => vec![folder],
        }
    }
}

impl FromStr for LocalsTarget {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(LocalsTarget::All);
        }
        LocalFolder::ALL
            .into_iter()
            .find(|folder| folder.as_str().eq_ignore_ascii_case(s))
            .map(LocalsTarget::One)
            .ok_or_else(|| {
                CommandError::Usage(format!(
                    "'{}' is not a local resource. Use all, http-cache, global-packages, temp or plugins-cache.",
                    s
                ))
            })
    }
}

#[derive(Debug, Default)]
pub struct LocalsCommand {
    base: CommandBase,
    clear: bool,
    list: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<LocalsCommand>("locals")
        .summary("Clears or lists local package folders.")
        .usage("<all | http-cache | global-packages | temp | plugins-cache>")
        .description(
            "Clears or lists the HTTP cache, the global packages folder, the temp folder \
             or the plugins cache. Exactly one of -Clear or -List is required.",
        )
        .example("pkgcli locals all -List")
        .example("pkgcli locals http-cache -Clear")
        .options(|o| {
            o.flag("Clear", "Clear the selected local resources.", |c| &mut c.clear)
                .flag("List", "List the selected local resources.", |c| &mut c.list)
        })
        .build()
}

#[async_trait]
impl CommandInstance for LocalsCommand {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    async fn execute(&mut self, ctx: &CommandContext<'_>) -> anyhow::Result<i32> {
        expect_arguments(
            &self.base.arguments,
            1..=1,
            "locals requires exactly one resource name.",
        )?;
        if self.clear == self.list {
            return Err(CommandError::Usage("Specify exactly one of -Clear or -List.".into()).into());
        }
        let target: LocalsTarget = self.base.arguments[0].parse()?;
        let settings = ctx.settings()?;

        if self.list {
            for folder in target.folders() {
                let path = folder
                    .resolve(settings.as_ref())
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                ctx.console.output(&format!("{}: {}", folder.as_str(), path));
            }
            return Ok(0);
        }

        let mut failed = Vec::new();
        for folder in target.folders() {
            let Some(path) = folder.resolve(settings.as_ref()) else {
                continue;
            };
            ctx.console.info(&format!(
                "Clearing local resources folder: {}",
                path.display()
            ));
            let leftovers = fs_utils::clear_directory(&path)
                .map_err(|err| CommandError::io(format!("Failed to clear {}", path.display()), err))?;
            for leftover in leftovers {
                ctx.console
                    .error(&format!("Failed to delete '{}'.", leftover.display()));
                failed.push(leftover);
            }
        }

        if failed.is_empty() {
            ctx.console.info("Local resources cleared.");
            Ok(0)
        } else {
            Err(CommandError::Failed("Local resources partially cleared.".into()).into())
        }
    }
}
