//! `sources`: manage the configured package sources.
//!
//! Sources live in `packageSources` as `name = location`. Disabled sources
//! are flagged in `disabledPackageSources`; credentials are stored under
//! `packageSourceCredentials` as `<name>.username` and `<name>.password`.

use std::any::Any;
use std::str::FromStr;

use async_trait::async_trait;

use super::{expect_arguments, settings_error};
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::settings::{SettingsStore, sections};
use crate::types::SourceListFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourcesAction {
    List,
    Add,
    Remove,
    Enable,
    Disable,
    Update,
}

impl FromStr for SourcesAction {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(SourcesAction::List),
            "add" => Ok(SourcesAction::Add),
            "remove" => Ok(SourcesAction::Remove),
            "enable" => Ok(SourcesAction::Enable),
            "disable" => Ok(SourcesAction::Disable),
            "update" => Ok(SourcesAction::Update),
            _ => Err(CommandError::Usage(format!(
                "Unknown action '{}'. Use list, add, remove, enable, disable or update.",
                s
            ))),
        }
    }
}

#[derive(Debug, Default)]
pub struct SourcesCommand {
    base: CommandBase,
    name: Option<String>,
    source: Option<String>,
    username: Option<String>,
    password: Option<String>,
    store_password_in_clear_text: bool,
    format: Option<String>,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<SourcesCommand>("sources")
        .summary("Manages the list of package sources.")
        .usage("<list | add | remove | enable | disable | update> -Name <name> -Source <source>")
        .description(
            "Lists, adds, removes, enables, disables or updates package sources in the \
             settings file. Without an action the sources are listed.",
        )
        .example("pkgcli sources add -Name local -Source /srv/feed")
        .example("pkgcli sources list -Format Short")
        .options(|o| {
            o.value("Name", "Name of the source.", |c| &mut c.name)
                .value("Source", "Path or URL of the source.", |c| &mut c.source)
                .value(
                    "Username",
                    "User name for an authenticated source.",
                    |c| &mut c.username,
                )
                .value(
                    "Password",
                    "Password for an authenticated source.",
                    |c| &mut c.password,
                )
                .flag(
                    "StorePasswordInClearText",
                    "Store the password unencrypted in the settings file.",
                    |c| &mut c.store_password_in_clear_text,
                )
                .value(
                    "Format",
                    "Output format of list: Detailed (default) or Short.",
                    |c| &mut c.format,
                )
        })
        .build()
}

fn is_disabled(settings: &dyn SettingsStore, name: &str) -> bool {
    settings
        .get(sections::DISABLED_PACKAGE_SOURCES, name)
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Stored source name matching `name` case-insensitively.
fn find_source(settings: &dyn SettingsStore, name: &str) -> Option<(String, String)> {
    settings
        .entries(sections::PACKAGE_SOURCES)
        .into_iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

impl SourcesCommand {
    fn required_name(&self) -> Result<&str, CommandError> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CommandError::Usage("The -Name option is required.".into()))
    }

    fn existing(&self, settings: &dyn SettingsStore) -> Result<(String, String), CommandError> {
        let name = self.required_name()?;
        find_source(settings, name).ok_or_else(|| {
            CommandError::Failed(format!(
                "Unable to find any package source(s) matching name: {}.",
                name
            ))
        })
    }

    fn save_credentials(&self, settings: &dyn SettingsStore, name: &str) -> Result<(), CommandError> {
        if self.username.is_none() && self.password.is_none() {
            return Ok(());
        }
        if self.password.is_some() && !self.store_password_in_clear_text {
            return Err(CommandError::Failed(
                "Password encryption is not supported. Pass -StorePasswordInClearText to store the password as plain text."
                    .into(),
            ));
        }
        if let Some(username) = self.username.as_deref() {
            settings
                .set(
                    sections::PACKAGE_SOURCE_CREDENTIALS,
                    &format!("{}.username", name),
                    username,
                )
                .map_err(settings_error)?;
        }
        if let Some(password) = self.password.as_deref() {
            settings
                .set(
                    sections::PACKAGE_SOURCE_CREDENTIALS,
                    &format!("{}.password", name),
                    password,
                )
                .map_err(settings_error)?;
        }
        Ok(())
    }

    fn list(&self, ctx: &CommandContext<'_>, settings: &dyn SettingsStore) -> Result<(), CommandError> {
        let format = match self.format.as_deref() {
            Some(raw) => raw
                .parse::<SourceListFormat>()
                .map_err(CommandError::Usage)?,
            None => SourceListFormat::default(),
        };
        let sources = settings.entries(sections::PACKAGE_SOURCES);
        if sources.is_empty() {
            ctx.console.info("No sources found.");
            return Ok(());
        }

        match format {
            SourceListFormat::Short => {
                for (name, location) in &sources {
                    let flag = if is_disabled(settings, name) { 'D' } else { 'E' };
                    ctx.console.output(&format!("{} {}", flag, location));
                }
            }
            SourceListFormat::Detailed => {
                ctx.console.output("Registered Sources:");
                ctx.console.output("");
                for (index, (name, location)) in sources.iter().enumerate() {
                    let state = if is_disabled(settings, name) {
                        "Disabled"
                    } else {
                        "Enabled"
                    };
                    ctx.console
                        .output(&format!("  {}.  {} [{}]", index + 1, name, state));
                    ctx.console.output(&format!("      {}", location));
                }
            }
        }
        Ok(())
    }

    fn add(&self, ctx: &CommandContext<'_>, settings: &dyn SettingsStore) -> Result<(), CommandError> {
        let name = self.required_name()?;
        let location = self
            .source
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .ok_or_else(|| CommandError::Usage("The -Source option is required.".into()))?;

        let sources = settings.entries(sections::PACKAGE_SOURCES);
        if sources.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
            return Err(CommandError::Failed(
                "The name specified has already been added to the list of available package sources. Provide a unique name."
                    .into(),
            ));
        }
        if sources.iter().any(|(_, existing)| existing.eq_ignore_ascii_case(location)) {
            return Err(CommandError::Failed(
                "The source specified has already been added to the list of available package sources. Provide a unique source."
                    .into(),
            ));
        }

        self.save_credentials(settings, name)?;
        settings
            .set(sections::PACKAGE_SOURCES, name, location)
            .map_err(settings_error)?;
        ctx.console.info(&format!(
            "Package source with Name: {} added successfully.",
            name
        ));
        Ok(())
    }

    fn remove(&self, ctx: &CommandContext<'_>, settings: &dyn SettingsStore) -> Result<(), CommandError> {
        let (name, _) = self.existing(settings)?;
        settings
            .remove(sections::PACKAGE_SOURCES, &name)
            .map_err(settings_error)?;
        settings
            .remove(sections::DISABLED_PACKAGE_SOURCES, &name)
            .map_err(settings_error)?;
        for suffix in ["username", "password"] {
            settings
                .remove(
                    sections::PACKAGE_SOURCE_CREDENTIALS,
                    &format!("{}.{}", name, suffix),
                )
                .map_err(settings_error)?;
        }
        ctx.console.info(&format!(
            "Package source with Name: {} removed successfully.",
            name
        ));
        Ok(())
    }

    fn toggle(
        &self,
        ctx: &CommandContext<'_>,
        settings: &dyn SettingsStore,
        enable: bool,
    ) -> Result<(), CommandError> {
        let (name, _) = self.existing(settings)?;
        if enable {
            settings
                .remove(sections::DISABLED_PACKAGE_SOURCES, &name)
                .map_err(settings_error)?;
        } else {
            settings
                .set(sections::DISABLED_PACKAGE_SOURCES, &name, "true")
                .map_err(settings_error)?;
        }
        ctx.console.info(&format!(
            "Package source with Name: {} {} successfully.",
            name,
            if enable { "enabled" } else { "disabled" }
        ));
        Ok(())
    }

    fn update(&self, ctx: &CommandContext<'_>, settings: &dyn SettingsStore) -> Result<(), CommandError> {
        let (name, _) = self.existing(settings)?;
        if let Some(location) = self.source.as_deref().filter(|s| !s.trim().is_empty()) {
            let taken = settings
                .entries(sections::PACKAGE_SOURCES)
                .into_iter()
                .any(|(other, existing)| {
                    !other.eq_ignore_ascii_case(&name) && existing.eq_ignore_ascii_case(location)
                });
            if taken {
                return Err(CommandError::Failed(
                    "The source specified has already been added to the list of available package sources. Provide a unique source."
                        .into(),
                ));
            }
            settings
                .set(sections::PACKAGE_SOURCES, &name, location)
                .map_err(settings_error)?;
        }
        self.save_credentials(settings, &name)?;
        ctx.console.info(&format!(
            "Package source \"{}\" was successfully updated.",
            name
        ));
        Ok(())
    }
}

#[async_trait]
impl CommandInstance for SourcesCommand {
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
            0..=1,
            "sources takes at most one action.",
        )?;
        let action = match self.base.argument(0) {
            Some(raw) => raw.parse()?,
            None => SourcesAction::List,
        };
        let settings = ctx.settings()?;
        let settings = settings.as_ref();

        match action {
            SourcesAction::List => self.list(ctx, settings)?,
            SourcesAction::Add => self.add(ctx, settings)?,
            SourcesAction::Remove => self.remove(ctx, settings)?,
            SourcesAction::Enable => self.toggle(ctx, settings, true)?,
            SourcesAction::Disable => self.toggle(ctx, settings, false)?,
            SourcesAction::Update => self.update(ctx, settings)?,
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use tempfile::TempDir;

    fn run(fixture: &Fixture, args: &[&str]) -> anyhow::Result<i32> {
        let dir = TempDir::new().expect("temp dir");
        fixture.run(&descriptor(), args, dir.path())
    }

    #[test]
    fn test_add_list_disable_remove() {
        let fixture = Fixture::new();
        run(&fixture, &["add", "-Name", "local", "-Source", "/srv/feed"]).expect("add");
        run(&fixture, &["Add", "-Name", "remote", "-Source", "https://feed.example"])
            .expect("add");
        run(&fixture, &["disable", "-Name", "REMOTE"]).expect("disable");
        run(&fixture, &["list", "-Format", "short"]).expect("list");
        assert!(
            fixture
                .console
                .stdout()
                .ends_with("E /srv/feed\nD https://feed.example\n")
        );

        run(&fixture, &["enable", "-Name", "remote"]).expect("enable");
        assert!(
            fixture
                .settings
                .get(sections::DISABLED_PACKAGE_SOURCES, "remote")
                .is_none()
        );

        run(&fixture, &["remove", "-Name", "local"]).expect("remove");
        assert_eq!(
            fixture.settings.entries(sections::PACKAGE_SOURCES),
            vec![("remote".to_string(), "https://feed.example".to_string())]
        );
    }

    #[test]
    fn test_default_action_lists_detailed() {
        let fixture = Fixture::new();
        run(&fixture, &["add", "-Name", "local", "-Source", "/srv/feed"]).expect("add");
        run(&fixture, &[]).expect("list");
        let out = fixture.console.stdout();
        assert!(out.contains("Registered Sources:"));
        assert!(out.contains("  1.  local [Enabled]\n      /srv/feed\n"));
    }

    #[test]
    fn test_duplicates_rejected() {
        let fixture = Fixture::new();
        run(&fixture, &["add", "-Name", "local", "-Source", "/srv/feed"]).expect("add");
        let err = run(&fixture, &["add", "-Name", "LOCAL", "-Source", "/other"])
            .expect_err("duplicate name");
        assert!(err.to_string().contains("unique name"));
        let err = run(&fixture, &["add", "-Name", "other", "-Source", "/srv/feed"])
            .expect_err("duplicate source");
        assert!(err.to_string().contains("unique source"));
    }

    #[test]
    fn test_password_requires_clear_text_opt_in() {
        let fixture = Fixture::new();
        let err = run(
            &fixture,
            &["add", "-Name", "priv", "-Source", "https://p", "-Password", "pw"],
        )
        .expect_err("encryption unsupported");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Failed(_))
        ));
        assert!(find_source(fixture.settings.as_ref(), "priv").is_none());

        run(
            &fixture,
            &[
                "add",
                "-Name",
                "priv",
                "-Source",
                "https://p",
                "-Username",
                "me",
                "-Password",
                "pw",
                "-StorePasswordInClearText",
            ],
        )
        .expect("add");
        assert_eq!(
            fixture
                .settings
                .get(sections::PACKAGE_SOURCE_CREDENTIALS, "priv.password")
                .as_deref(),
            Some("pw")
        );
    }

    #[test]
    fn test_update_and_missing_source() {
        let fixture = Fixture::new();
        run(&fixture, &["add", "-Name", "local", "-Source", "/srv/feed"]).expect("add");
        run(&fixture, &["update", "-Name", "local", "-Source", "/srv/new"]).expect("update");
        assert_eq!(
            fixture.settings.get(sections::PACKAGE_SOURCES, "local").as_deref(),
            Some("/srv/new")
        );
        let err = run(&fixture, &["remove", "-Name", "ghost"]).expect_err("missing");
        assert!(err.to_string().contains("ghost"));
        let err = run(&fixture, &["frobnicate"]).expect_err("unknown action");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Usage(_))
        ));
    }
}
