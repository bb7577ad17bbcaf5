//! `help`: catalog help, or help for one command.

use std::any::Any;

use async_trait::async_trait;

use super::expect_arguments;
use crate::cli::command::{
    CommandBase, CommandContext, CommandDescriptor, CommandInstance, render_catalog_help,
    render_command_help,
};
use crate::cli::error::CommandError;

#[derive(Debug, Default)]
pub struct HelpCommand {
    base: CommandBase,
    all: bool,
    markdown: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<HelpCommand>("help")
        .alias("?")
        .summary("Displays general help information and help for other commands.")
        .usage("[command]")
        .description(
            "Lists the available commands, or shows the usage, options and examples of \
             one command.",
        )
        .example("pkgcli help")
        .example("pkgcli help restore")
        .example("pkgcli help -All -Markdown")
        .options(|o| {
            o.flag(
                "All",
                "Print detailed help for every command, deprecated ones included.",
                |c| &mut c.all,
            )
            .flag("Markdown", "Print help as Markdown.", |c| &mut c.markdown)
            .hide("ConfigFile")
        })
        .build()
}

#[async_trait]
impl CommandInstance for HelpCommand {
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
        expect_arguments(&self.base.arguments, 0..=1, "help takes at most one command name.")?;

        let text = match self.base.argument(0) {
            Some(name) => {
                let descriptor = ctx
                    .registry
                    .resolve(name)
                    .map_err(|err| CommandError::Failed(err.to_string()))?;
                render_command_help(descriptor, self.markdown, &ctx.localizer)
            }
            None => render_catalog_help(ctx.registry.iter(), self.all, self.markdown, &ctx.localizer),
        };
        ctx.console.output(text.trim_end_matches('\n'));
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use tempfile::TempDir;

    fn help(args: &[&str]) -> (anyhow::Result<i32>, Fixture) {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        let result = fixture.run(&descriptor(), args, dir.path());
        (result, fixture)
    }

    #[test]
    fn test_catalog_lists_commands_sorted() {
        let (result, fixture) = help(&[]);
        assert_eq!(result.expect("help"), 0);
        let out = fixture.console.stdout();
        let config = out.find(" config").expect("config listed");
        let verify = out.find(" verify").expect("verify listed");
        assert!(config < verify);
        assert!(out.contains("setApiKey"));
    }

    #[test]
    fn test_command_help_by_alias_case() {
        let (result, fixture) = help(&["RESTORE"]);
        result.expect("help");
        let out = fixture.console.stdout();
        assert!(out.starts_with("usage: pkgcli restore"));
        assert!(out.contains("-NoHttpCache"));
    }

    #[test]
    fn test_help_options_hide_config_file() {
        let (result, fixture) = help(&["help", "-Markdown"]);
        result.expect("help");
        let out = fixture.console.stdout();
        assert!(out.contains("## help"));
        assert!(out.contains("`-Markdown`"));
        assert!(!out.contains("ConfigFile"));
    }

    #[test]
    fn test_unknown_command_fails() {
        let (result, _) = help(&["nope"]);
        let err = result.expect_err("unknown");
        assert!(err.to_string().contains("Unknown command: 'nope'"));
    }
}
