//! `delete`: remove a package version from a source.

use std::any::Any;

use async_trait::async_trait;

use super::{expect_arguments, push_source};
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::engine::DeleteRequest;
use crate::settings::sections;

#[derive(Debug, Default)]
pub struct DeleteCommand {
    base: CommandBase,
    source: Option<String>,
    api_key: Option<String>,
    no_prompt: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<DeleteCommand>("delete")
        .summary("Deletes a package from the server.")
        .usage("<package Id> <package version>")
        .description(
            "Deletes or unlists a package from a package source. Prompts for confirmation \
             unless -NoPrompt or -NonInteractive is given.",
        )
        .example("pkgcli delete MyPackage 1.0")
        .example("pkgcli delete MyPackage 1.0 -Source https://feed.example -NoPrompt")
        .options(|o| {
            o.value(
                "Source",
                "Package source (URL, folder path or source name) to delete from.",
                |c| &mut c.source,
            )
            .value(
                "ApiKey",
                "The API key for the target source. Defaults to the stored key.",
                |c| &mut c.api_key,
            )
            .flag(
                "NoPrompt",
                "Do not prompt before deleting.",
                |c| &mut c.no_prompt,
            )
            .alias("np")
        })
        .build()
}

#[async_trait]
impl CommandInstance for DeleteCommand {
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
            2..=2,
            "delete requires a package id and a package version.",
        )?;
        let package_id = self.base.arguments[0].clone();
        let version = self.base.arguments[1].clone();

        let settings = ctx.settings()?;
        let source = push_source(self.source.as_deref(), settings.as_ref());
        let api_key = self
            .api_key
            .clone()
            .or_else(|| settings.get(sections::API_KEYS, &source));

        if !self.no_prompt && !self.base.non_interactive {
            let prompt = format!(
                "{} {} will be deleted from '{}'. Would you like to continue?",
                package_id, version, source
            );
            if !ctx.console.confirm(&prompt) {
                ctx.console.info("Package was not deleted.");
                return Ok(0);
            }
        }

        ctx.console
            .info(&format!("Deleting {} {} from '{}'.", package_id, version, source));
        ctx.engine
            .delete(DeleteRequest {
                package_id: package_id.clone(),
                version: version.clone(),
                source,
                api_key,
            })
            .await?;
        ctx.console
            .info(&format!("{} {} was deleted successfully.", package_id, version));
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::DEFAULT_SOURCE;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use crate::cli::error::CommandError;
    use crate::console::BufferConsole;
    use crate::settings::SettingsStore;
    use tempfile::TempDir;

    #[test]
    fn test_requires_id_and_version() {
        let dir = TempDir::new().expect("temp dir");
        let err = Fixture::new()
            .run(&descriptor(), &["OnlyId"], dir.path())
            .expect_err("usage");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_no_prompt_deletes_with_stored_key() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        fixture
            .settings
            .set(sections::API_KEYS, "https://feed.example", "secret")
            .expect("set");
        let code = fixture
            .run(
                &descriptor(),
                &["Pkg", "1.0.0", "-Source", "https://feed.example", "-np"],
                dir.path(),
            )
            .expect("delete");
        assert_eq!(code, 0);
        assert_eq!(
            fixture.engine.deletes(),
            vec![DeleteRequest {
                package_id: "Pkg".into(),
                version: "1.0.0".into(),
                source: "https://feed.example".into(),
                api_key: Some("secret".into()),
            }]
        );
    }

    #[test]
    fn test_declined_confirmation_keeps_package() {
        let dir = TempDir::new().expect("temp dir");
        let mut fixture = Fixture::new();
        fixture.console = BufferConsole::new().with_input(["n"]);
        let code = fixture
            .run(&descriptor(), &["Pkg", "1.0.0"], dir.path())
            .expect("delete");
        assert_eq!(code, 0);
        assert!(fixture.engine.deletes().is_empty());
        assert!(fixture.console.stdout().contains("Package was not deleted."));
    }

    #[test]
    fn test_confirmed_delete_uses_default_source() {
        let dir = TempDir::new().expect("temp dir");
        let mut fixture = Fixture::new();
        fixture.console = BufferConsole::new().with_input(["yes"]);
        fixture
            .run(&descriptor(), &["Pkg", "2.0.0", "-ApiKey", "k"], dir.path())
            .expect("delete");
        let deletes = fixture.engine.deletes();
        assert_eq!(deletes[0].source, DEFAULT_SOURCE);
        assert_eq!(deletes[0].api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_non_interactive_skips_prompt() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        fixture
            .run(&descriptor(), &["Pkg", "1.0.0", "-NonInteractive"], dir.path())
            .expect("delete");
        assert_eq!(fixture.engine.deletes().len(), 1);
    }
}
