//! `config`: read or write values in the `config` settings section.

use std::any::Any;
use std::path::Path;

use async_trait::async_trait;

use super::{expect_arguments, settings_error};
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::settings::sections;

#[derive(Debug, Default)]
pub struct ConfigCommand {
    base: CommandBase,
    set: Vec<String>,
    as_path: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<ConfigCommand>("config")
        .summary("Gets or sets pkgcli config values.")
        .usage("<-Set name=value | name>")
        .description(
            "Gets or sets config values. A -Set pair with an empty value removes the key.",
        )
        .example("pkgcli config globalPackagesFolder")
        .example("pkgcli config -Set globalPackagesFolder=/srv/packages -Set http_proxy=")
        .options(|o| {
            o.multi(
                "Set",
                "A key/value pair to set, as name=value.",
                |c| &mut c.set,
            )
            .flag(
                "AsPath",
                "Return the value as a path resolved against the config file's folder.",
                |c| &mut c.as_path,
            )
        })
        .build()
}

/// Split `name=value`. The value may be empty; the name may not.
fn parse_pair(pair: &str) -> Result<(&str, &str), CommandError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(CommandError::Usage(format!(
            "'{}' is not a valid name=value pair.",
            pair
        ))),
    }
}

#[async_trait]
impl CommandInstance for ConfigCommand {
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
        let settings = ctx.settings()?;

        if !self.set.is_empty() {
            expect_arguments(
                &self.base.arguments,
                0..=0,
                "config does not take a key together with -Set.",
            )?;
            // Validate every pair before writing any of them.
            let pairs = self
                .set
                .iter()
                .map(|pair| parse_pair(pair))
                .collect::<Result<Vec<_>, _>>()?;
            for (key, value) in pairs {
                if value.is_empty() {
                    settings
                        .remove(sections::CONFIG, key)
                        .map_err(settings_error)?;
                    ctx.console.detail(&format!("Removed config key '{}'.", key));
                } else {
                    settings
                        .set(sections::CONFIG, key, value)
                        .map_err(settings_error)?;
                    ctx.console.detail(&format!("Set config key '{}'.", key));
                }
            }
            return Ok(0);
        }

        expect_arguments(
            &self.base.arguments,
            1..=1,
            "config requires a key name or at least one -Set pair.",
        )?;
        let key = self.base.arguments[0].as_str();
        let value = settings
            .get(sections::CONFIG, key)
            .ok_or_else(|| CommandError::Failed(format!("Key '{}' not found.", key)))?;

        if self.as_path {
            let origin = settings.origin();
            let base = origin
                .as_deref()
                .and_then(Path::parent)
                .unwrap_or(ctx.working_dir);
            let path = Path::new(&value);
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            };
            ctx.console.output(&resolved.display().to_string());
        } else {
            ctx.console.output(&value);
        }
        Ok(0)
    }
}
