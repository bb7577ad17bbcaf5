//! Dispatcher: from argv to an exit code.
//!
//! Each invocation walks the same states:
//!
//! ```text
//! Start → ExpandResponseFiles → ResolveCommand → BindOptions
//!       → (DeprecationWarning) → Execute → Done
//! ```
//!
//! Any state may end in `Failed`. Parse and resolution failures print the
//! error plus usage text and yield exit code 1. Command bodies report
//! ordinary failures as [`CommandError`], which is printed and also yields 1.
//! Every other error from a command body leaves [`Dispatcher::run`]
//! unchanged so defects are not disguised as user errors.

mod handlers;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use super::command::{CommandContext, CommandDescriptor, render_catalog_help, render_command_help};
use super::error::{CliError, CommandError};
use super::parser::extract_options;
use super::registry::CommandRegistry;
use super::response_file;
use crate::console::Console;
use crate::engine::PackageEngine;
use crate::i18n::{Language, Localizer, process_language};
use crate::settings::SettingsLoader;
use crate::types::Verbosity;

pub(crate) use handlers::builtin_descriptors;

/// Collaborators shared by every command.
#[derive(Clone)]
pub struct Services {
    pub console: Arc<dyn Console>,
    pub settings: Arc<dyn SettingsLoader>,
    pub engine: Arc<dyn PackageEngine>,
    /// Base for relative paths, including response files.
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Start,
    ExpandResponseFiles,
    ResolveCommand,
    BindOptions,
    DeprecationWarning,
    Execute,
    Done,
    Failed,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Start => "start",
            DispatchState::ExpandResponseFiles => "expand-response-files",
            DispatchState::ResolveCommand => "resolve-command",
            DispatchState::BindOptions => "bind-options",
            DispatchState::DeprecationWarning => "deprecation-warning",
            DispatchState::Execute => "execute",
            DispatchState::Done => "done",
            DispatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(state: DispatchState) {
    tracing::debug!(state = %state, "dispatch");
}

/// Tokens that ask for the command list instead of a command.
fn is_help_switch(token: &str) -> bool {
    ["-?", "-help", "--help", "/?"]
        .iter()
        .any(|switch| switch.eq_ignore_ascii_case(token))
}

pub struct Dispatcher {
    registry: CommandRegistry,
    services: Services,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, services: Services) -> Self {
        Self { registry, services }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run one invocation to completion on a current-thread runtime.
    ///
    /// `argv` excludes the executable name. Must not be called from inside an
    /// async runtime; use [`run_async`](Self::run_async) there.
    pub fn run(&self, argv: &[String]) -> anyhow::Result<i32> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start the async runtime")?;
        runtime.block_on(self.run_async(argv))
    }

    pub async fn run_async(&self, argv: &[String]) -> anyhow::Result<i32> {
        let console = self.services.console.as_ref();
        let mut localizer = Localizer::new(process_language());

        enter(DispatchState::Start);
        enter(DispatchState::ExpandResponseFiles);
        let tokens = match response_file::expand_from(&self.services.working_dir, argv) {
            Ok(tokens) => tokens,
            Err(err) => return Ok(self.fail_with_catalog(&CliError::from(err), &localizer)),
        };

        let Some((command_token, rest)) = tokens.split_first() else {
            console.output(&self.catalog_help(&localizer));
            enter(DispatchState::Done);
            return Ok(0);
        };
        if is_help_switch(command_token) {
            console.output(&self.catalog_help(&localizer));
            enter(DispatchState::Done);
            return Ok(0);
        }

        enter(DispatchState::ResolveCommand);
        let descriptor = match self.registry.resolve(command_token) {
            Ok(descriptor) => descriptor,
            Err(err) => return Ok(self.fail_with_catalog(&err, &localizer)),
        };
        tracing::debug!(command = descriptor.name(), "resolved command");

        enter(DispatchState::BindOptions);
        let mut command = descriptor.instantiate();
        let parsed = match extract_options(command.as_mut(), descriptor, rest.iter().cloned()) {
            Ok(parsed) => parsed,
            Err(err) => return Ok(self.fail_with_command(&err, descriptor, &localizer)),
        };

        let base = command.base().clone();
        if base.force_english_output {
            localizer = Localizer::new(Language::English);
        }
        if let Some(raw) = base.verbosity.as_deref() {
            match raw.parse::<Verbosity>() {
                Ok(verbosity) => console.set_verbosity(verbosity),
                Err(message) => {
                    let err = CommandError::Usage(message);
                    return Ok(self.fail_with_command(&err, descriptor, &localizer));
                }
            }
        }
        if base.non_interactive {
            console.set_interactive(false);
        }
        if base.help {
            console.output(&render_command_help(descriptor, false, &localizer));
            enter(DispatchState::Done);
            return Ok(0);
        }

        if let Some(warning) = descriptor.deprecation_warning(&localizer) {
            enter(DispatchState::DeprecationWarning);
            console.warning(&warning);
        }
        handlers::deprecation::warn_deprecated_options(
            console,
            &parsed.deprecated_options,
            &localizer,
        );

        enter(DispatchState::Execute);
        let ctx = CommandContext::new(
            console,
            &self.registry,
            self.services.engine.as_ref(),
            self.services.settings.as_ref(),
            &self.services.working_dir,
        )
        .with_localizer(localizer)
        .with_config_file(base.config_file.as_deref());

        match command.execute(&ctx).await {
            Ok(code) => {
                enter(DispatchState::Done);
                tracing::debug!(command = descriptor.name(), code, "command finished");
                Ok(code)
            }
            Err(err) => match err.downcast::<CommandError>() {
                Ok(command_error) => {
                    Ok(self.fail_with_command(&command_error, descriptor, &localizer))
                }
                Err(other) => {
                    enter(DispatchState::Failed);
                    Err(other)
                }
            },
        }
    }

    fn catalog_help(&self, localizer: &Localizer) -> String {
        render_catalog_help(self.registry.iter(), false, false, localizer)
    }

    /// Report an error that occurred before a command was known.
    fn fail_with_catalog(&self, err: &CliError, localizer: &Localizer) -> i32 {
        enter(DispatchState::Failed);
        self.services.console.error(&err.to_string());
        self.services.console.output(&self.catalog_help(localizer));
        1
    }

    /// Report an error tied to a resolved command.
    fn fail_with_command(
        &self,
        err: &(dyn std::error::Error + 'static),
        descriptor: &CommandDescriptor,
        localizer: &Localizer,
    ) -> i32 {
        enter(DispatchState::Failed);
        self.services.console.error(&err.to_string());
        let wants_usage = match err.downcast_ref::<CommandError>() {
            Some(command_error) => matches!(command_error, CommandError::Usage(_)),
            None => err.is::<CliError>(),
        };
        if wants_usage {
            self.services
                .console
                .output(&render_command_help(descriptor, false, localizer));
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::{CommandBase, CommandInstance, OptionMatch};
    use crate::cli::registry::ExtensionProvider;
    use crate::console::BufferConsole;
    use crate::engine::UnconfiguredEngine;
    use crate::settings::{MemorySettings, SharedSettings, SettingsStore, sections};
    use async_trait::async_trait;
    use std::any::Any;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Hello {
        base: CommandBase,
        shout: bool,
    }

    #[async_trait]
    impl CommandInstance for Hello {
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
            let greeting = if self.shout { "HELLO" } else { "hello" };
            ctx.console.info(greeting);
            Ok(0)
        }
    }

    #[derive(Default)]
    struct Broken {
        base: CommandBase,
    }

    #[async_trait]
    impl CommandInstance for Broken {
        fn base(&self) -> &CommandBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut CommandBase {
            &mut self.base
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        async fn execute(&mut self, _ctx: &CommandContext<'_>) -> anyhow::Result<i32> {
            match self.base.argument(0) {
                Some("domain") => Err(CommandError::Failed("feed not found".into()).into()),
                Some("usage") => Err(CommandError::Usage("bad arguments".into()).into()),
                _ => Err(std::io::Error::other("disk on fire").into()),
            }
        }
    }

    struct TestCommands;

    impl ExtensionProvider for TestCommands {
        fn descriptors(&self) -> Vec<CommandDescriptor> {
            vec![
                CommandDescriptor::builder::<Hello>("hello")
                    .summary("Greets.")
                    .options(|o| o.flag("Shout", "Greet loudly.", |c| &mut c.shout))
                    .build(),
                CommandDescriptor::builder::<Hello>("hi")
                    .summary("Greets, briefly.")
                    .deprecated(Some("hello"))
                    .build(),
                CommandDescriptor::builder::<Broken>("broken")
                    .summary("Fails on purpose.")
                    .hidden()
                    .build(),
            ]
        }
    }

    struct Harness {
        console: Arc<BufferConsole>,
        settings: Arc<MemorySettings>,
        dispatcher: Dispatcher,
        dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().expect("temp dir");
        let console = Arc::new(BufferConsole::new());
        let settings = Arc::new(MemorySettings::new());
        let registry = CommandRegistry::builtin()
            .expect("builtin")
            .with_extensions(&TestCommands)
            .expect("extensions");
        let services = Services {
            console: console.clone(),
            settings: Arc::new(SharedSettings(settings.clone())),
            engine: Arc::new(UnconfiguredEngine),
            working_dir: dir.path().to_path_buf(),
        };
        Harness {
            console,
            settings,
            dispatcher: Dispatcher::new(registry, services),
            dir,
        }
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_prints_catalog() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&[]).expect("run"), 0);
        assert!(h.console.stdout().contains("Available commands:"));
        assert!(h.console.stdout().contains(" restore"));
    }

    #[test]
    fn test_executes_command_with_bound_options() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["hello", "-shout"])).expect("run"), 0);
        assert_eq!(h.console.stdout(), "HELLO\n");
    }

    #[test]
    fn test_unknown_option_for_command_fails_with_usage() {
        let h = harness();
        let code = h
            .dispatcher
            .run(&argv(&["delete", "pkg", "1.0", "-NoHttpCache"]))
            .expect("run");
        assert_eq!(code, 1);
        assert!(h.console.stderr().contains("'-NoHttpCache' is not a valid option"));
        assert!(h.console.stdout().contains("usage: pkgcli delete"));
    }

    #[test]
    fn test_missing_option_value_fails_with_usage() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["config", "-Set"])).expect("run"), 1);
        assert_eq!(
            h.console.stderr(),
            "Missing value for option '-Set' of the 'config' command.\n"
        );
        assert!(h.console.stdout().starts_with("usage: pkgcli config"));
        assert!(h.settings.entries(sections::CONFIG).is_empty());
    }

    #[test]
    fn test_ambiguous_option_fails_with_usage() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["restore", "-No"])).expect("run"), 1);
        assert_eq!(
            h.console.stderr(),
            "'-No' is ambiguous for the 'restore' command. It matches: -NoCache, -NoHttpCache.\n"
        );
        assert!(h.console.stdout().starts_with("usage: pkgcli restore"));
    }

    #[test]
    fn test_shared_option_prefix_is_unknown() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["delete", "pkg", "1.0", "-Force"])).expect("run"), 1);
        assert!(
            h.console
                .stderr()
                .contains("'-Force' is not a valid option for the 'delete' command.")
        );
    }

    #[test]
    fn test_every_command_rejects_options_of_other_commands() {
        let registry = CommandRegistry::builtin().expect("builtin");
        for descriptor in registry.iter() {
            let foreign: Vec<&str> = registry
                .iter()
                .filter(|other| other.name() != descriptor.name())
                .flat_map(|other| other.catalog().options())
                .filter(|option| !option.is_shared())
                .map(|option| option.name())
                .filter(|name| matches!(descriptor.catalog().find(name), OptionMatch::NotFound))
                .collect();
            assert!(!foreign.is_empty(), "no foreign option for {}", descriptor.name());

            for name in foreign {
                let token = format!("-{}", name);
                let mut command = descriptor.instantiate();
                match extract_options(command.as_mut(), descriptor, [token.clone()]) {
                    Err(CliError::UnknownOption { token: reported, command }) => {
                        assert_eq!(reported, token);
                        assert_eq!(command, descriptor.name());
                    }
                    other => panic!("{} {}: expected unknown option, got {:?}", descriptor.name(), token, other),
                }
            }
        }
    }

    #[test]
    fn test_cross_command_options_exit_one() {
        for args in [["init", "-Clear"], ["locals", "-Expand"]] {
            let h = harness();
            assert_eq!(h.dispatcher.run(&argv(&args)).expect("run"), 1);
            assert!(
                h.console
                    .stderr()
                    .contains(&format!("'{}' is not a valid option for the '{}' command.", args[1], args[0]))
            );
            assert!(h.console.stdout().contains(&format!("usage: pkgcli {}", args[0])));
        }
    }

    #[test]
    fn test_unknown_command_fails_with_catalog() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["restor"])).expect("run"), 1);
        assert!(h.console.stderr().contains("Unknown command: 'restor'"));
        assert!(h.console.stdout().contains("Available commands:"));
    }

    #[test]
    fn test_deprecated_command_warns_before_output() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["hi"])).expect("run"), 0);
        let out = h.console.stdout();
        let warning = out.find("WARNING: 'hi' is deprecated").expect("warning");
        assert!(out[warning..].contains("Use 'hello' instead."));
        let greeting = out.find("hello\n").expect("greeting");
        assert!(warning < greeting);
    }

    #[test]
    fn test_deprecated_option_warns_and_binds() {
        let h = harness();
        let code = h
            .dispatcher
            .run(&argv(&["restore", "-NoCache"]))
            .expect("run");
        // No engine is wired in, so restore itself fails after the warning.
        assert_eq!(code, 1);
        assert!(h.console.stdout().contains("'NoCache' is deprecated. Use 'NoHttpCache'"));
        assert!(h.console.stderr().contains("no package engine"));
    }

    #[test]
    fn test_quiet_success_writes_nothing() {
        let h = harness();
        let code = h
            .dispatcher
            .run(&argv(&["hello", "-Verbosity", "quiet"]))
            .expect("run");
        assert_eq!(code, 0);
        assert!(h.console.stdout().is_empty());
    }

    #[test]
    fn test_invalid_verbosity_is_usage_error() {
        let h = harness();
        let code = h
            .dispatcher
            .run(&argv(&["hello", "-Verbosity", "loud"]))
            .expect("run");
        assert_eq!(code, 1);
        assert!(h.console.stdout().contains("usage: pkgcli hello"));
    }

    #[test]
    fn test_help_switch_on_command() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["delete", "-?"])).expect("run"), 0);
        assert!(h.console.stdout().contains("usage: pkgcli delete"));
        assert!(h.console.stderr().is_empty());
    }

    #[test]
    fn test_command_error_is_caught() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["broken", "domain"])).expect("run"), 1);
        assert_eq!(h.console.stderr(), "feed not found\n");
        assert!(!h.console.stdout().contains("usage:"));

        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["broken", "usage"])).expect("run"), 1);
        assert!(h.console.stdout().contains("usage: pkgcli broken"));
    }

    #[test]
    fn test_other_errors_propagate_unchanged() {
        let h = harness();
        let err = h
            .dispatcher
            .run(&argv(&["broken", "defect"]))
            .expect_err("defect propagates");
        assert!(err.downcast_ref::<std::io::Error>().is_some());
        assert_eq!(err.to_string(), "disk on fire");
        assert!(h.console.stderr().is_empty());
    }

    #[test]
    fn test_response_file_feeds_command() {
        let h = harness();
        std::fs::write(h.dir.path().join("args.rsp"), "hello\r\n\r\n-Shout\r\n").expect("write");
        assert_eq!(h.dispatcher.run(&argv(&["@args.rsp"])).expect("run"), 0);
        assert_eq!(h.console.stdout(), "HELLO\n");
    }

    #[test]
    fn test_missing_response_file_fails() {
        let h = harness();
        assert_eq!(h.dispatcher.run(&argv(&["@nope.rsp"])).expect("run"), 1);
        assert!(h.console.stderr().contains("nope.rsp"));
    }

    #[test]
    fn test_commands_see_shared_settings() {
        let h = harness();
        let code = h
            .dispatcher
            .run(&argv(&["config", "-Set", "color=blue"]))
            .expect("run");
        assert_eq!(code, 0);
        assert_eq!(
            h.settings.get(sections::CONFIG, "color").as_deref(),
            Some("blue")
        );
    }
}
