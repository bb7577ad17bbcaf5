//! `setApiKey`: remember the API key for a push source.

use std::any::Any;

use async_trait::async_trait;

use super::{expect_arguments, push_source, settings_error};
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::settings::sections;

#[derive(Debug, Default)]
pub struct SetApiKeyCommand {
    base: CommandBase,
    source: Option<String>,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<SetApiKeyCommand>("setApiKey")
        .summary("Saves an API key for a given server URL.")
        .usage("<API key>")
        .description(
            "Saves an API key for a server URL. Without -Source the key is stored for \
             the default push source.",
        )
        .example("pkgcli setApiKey 4003d786-cc37-4004-bfdf-c4f3e8ef9b3a")
        .example("pkgcli setApiKey 4003d786-cc37-4004-bfdf-c4f3e8ef9b3a -Source https://feed.example")
        .options(|o| {
            o.value(
                "Source",
                "Server URL the API key is valid for.",
                |c| &mut c.source,
            )
        })
        .build()
}

#[async_trait]
impl CommandInstance for SetApiKeyCommand {
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
            "setApiKey requires exactly one API key.",
        )?;
        let settings = ctx.settings()?;
        let source = push_source(self.source.as_deref(), settings.as_ref());
        settings
            .set(sections::API_KEYS, &source, &self.base.arguments[0])
            .map_err(settings_error)?;
        ctx.console
            .info(&format!("The API Key was saved for '{}'.", source));
        Ok(0)
    }
}
