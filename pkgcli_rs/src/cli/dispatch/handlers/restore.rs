//! `restore`: collect restore inputs and hand them to the package engine.

use std::any::Any;

use async_trait::async_trait;

use super::expect_arguments;
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::engine::RestoreRequest;
use crate::settings::sections;

const SAVE_MODES: [&str; 3] = ["nuspec", "nupkg", "nuspec;nupkg"];

#[derive(Debug, Default)]
pub struct RestoreCommand {
    base: CommandBase,
    sources: Vec<String>,
    fallback_sources: Vec<String>,
    packages_directory: Option<String>,
    solution_directory: Option<String>,
    no_cache: bool,
    no_http_cache: bool,
    direct_download: bool,
    disable_parallel_processing: bool,
    require_consent: bool,
    force: bool,
    recursive: bool,
    locked_mode: bool,
    use_lock_file: bool,
    package_save_mode: Option<String>,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<RestoreCommand>("restore")
        .summary("Restores packages for a solution, project or packages file.")
        .usage("[<solution> | <project> | <packages file>]")
        .description(
            "Restores packages. Without an argument the working directory is searched for \
             a solution or project file.",
        )
        .example("pkgcli restore MySolution.sln")
        .example("pkgcli restore -Source https://feed.example/v3/index.json -NoHttpCache")
        .options(|o| {
            o.multi(
                "Source",
                "A package source to use for this restore.",
                |c| &mut c.sources,
            )
            .multi(
                "FallbackSource",
                "A package source to use when the primary sources fail.",
                |c| &mut c.fallback_sources,
            )
            .value(
                "PackagesDirectory",
                "Folder the packages are installed into.",
                |c| &mut c.packages_directory,
            )
            .alias("OutputDirectory")
            .value(
                "SolutionDirectory",
                "Solution folder. Not valid when restoring a solution.",
                |c| &mut c.solution_directory,
            )
            .flag(
                "NoCache",
                "Disable the machine HTTP cache.",
                |c| &mut c.no_cache,
            )
            .deprecated(Some("NoHttpCache"))
            .flag(
                "NoHttpCache",
                "Disable the machine HTTP cache.",
                |c| &mut c.no_http_cache,
            )
            .flag(
                "DirectDownload",
                "Download directly without populating any caches with metadata or binaries.",
                |c| &mut c.direct_download,
            )
            .flag(
                "DisableParallelProcessing",
                "Restore packages one at a time.",
                |c| &mut c.disable_parallel_processing,
            )
            .flag(
                "RequireConsent",
                "Check that package restore consent is granted before restoring.",
                |c| &mut c.require_consent,
            )
            .flag(
                "Force",
                "Re-evaluate all dependencies even if a previous restore succeeded.",
                |c| &mut c.force,
            )
            .flag(
                "Recursive",
                "Restore all referenced projects as well.",
                |c| &mut c.recursive,
            )
            .flag(
                "LockedMode",
                "Fail if the lock file would change.",
                |c| &mut c.locked_mode,
            )
            .flag(
                "UseLockFile",
                "Generate and use a lock file.",
                |c| &mut c.use_lock_file,
            )
            .value(
                "PackageSaveMode",
                "Package file types to save after install: nuspec, nupkg or nuspec;nupkg.",
                |c| &mut c.package_save_mode,
            )
        })
        .build()
}

impl RestoreCommand {
    fn package_save_mode(&self) -> Result<Option<String>, CommandError> {
        let Some(mode) = self.package_save_mode.as_deref() else {
            return Ok(None);
        };
        SAVE_MODES
            .iter()
            .find(|known| known.eq_ignore_ascii_case(mode))
            .map(|known| Some(known.to_string()))
            .ok_or_else(|| {
                CommandError::Usage(format!("Invalid PackageSaveMode value '{}'.", mode))
            })
    }

    /// Enabled sources from settings, used when none are given.
    fn configured_sources(ctx: &CommandContext<'_>) -> Result<Vec<String>, CommandError> {
        let settings = ctx.settings()?;
        Ok(settings
            .entries(sections::PACKAGE_SOURCES)
            .into_iter()
            .filter(|(name, _)| {
                settings
                    .get(sections::DISABLED_PACKAGE_SOURCES, name)
                    .is_none_or(|value| !value.eq_ignore_ascii_case("true"))
            })
            .map(|(_, source)| source)
            .collect())
    }
}

#[async_trait]
impl CommandInstance for RestoreCommand {
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
            "restore accepts at most one solution, project or packages file.",
        )?;

        let input = match self.base.argument(0) {
            Some(path) => {
                let resolved = ctx.resolve_path(path);
                if !resolved.exists() {
                    return Err(CommandError::Failed(format!(
                        "Input file does not exist: {}.",
                        resolved.display()
                    ))
                    .into());
                }
                Some(resolved)
            }
            None => None,
        };

        if input.is_some() && self.solution_directory.is_some() {
            let is_solution = input
                .as_ref()
                .and_then(|path| path.extension())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sln"));
            if is_solution {
                return Err(CommandError::Usage(
                    "-SolutionDirectory is not valid when restoring a solution file.".into(),
                )
                .into());
            }
        }

        let sources = if self.sources.is_empty() {
            Self::configured_sources(ctx)?
        } else {
            self.sources.clone()
        };

        let request = RestoreRequest {
            input,
            sources,
            fallback_sources: self.fallback_sources.clone(),
            packages_directory: self
                .packages_directory
                .as_deref()
                .map(|dir| ctx.resolve_path(dir)),
            solution_directory: self
                .solution_directory
                .as_deref()
                .map(|dir| ctx.resolve_path(dir)),
            no_http_cache: self.no_http_cache || self.no_cache,
            direct_download: self.direct_download,
            disable_parallel_processing: self.disable_parallel_processing,
            require_consent: self.require_consent,
            force: self.force,
            recursive: self.recursive,
            locked_mode: self.locked_mode,
            use_lock_file: self.use_lock_file,
            package_save_mode: self.package_save_mode()?,
            non_interactive: self.base.non_interactive,
        };
        tracing::debug!(?request, "restore request");

        let summary = ctx.engine.restore(request).await?;
        if summary.restored == 0 {
            ctx.console
                .info("All packages listed in the input are already installed.");
        } else {
            ctx.console.info(&format!(
                "Restored {} package(s); {} already installed.",
                summary.restored, summary.already_installed
            ));
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use crate::settings::SettingsStore;
    use tempfile::TempDir;

    #[test]
    fn test_deprecated_no_cache_maps_to_no_http_cache() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        let code = fixture
            .run(&descriptor(), &["-NoCache"], dir.path())
            .expect("restore");
        assert_eq!(code, 0);
        assert!(fixture.engine.restores()[0].no_http_cache);
        assert!(fixture.console.stdout().contains("Restored 2 package(s)"));
    }

    #[test]
    fn test_sources_fall_back_to_enabled_settings() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        let settings = &fixture.settings;
        settings.set(sections::PACKAGE_SOURCES, "a", "https://a").expect("set");
        settings.set(sections::PACKAGE_SOURCES, "b", "https://b").expect("set");
        settings
            .set(sections::DISABLED_PACKAGE_SOURCES, "b", "true")
            .expect("set");

        fixture.run(&descriptor(), &[], dir.path()).expect("restore");
        fixture
            .run(&descriptor(), &["-Source", "x", "-Source", "y"], dir.path())
            .expect("restore");
        let restores = fixture.engine.restores();
        assert_eq!(restores[0].sources, vec!["https://a"]);
        assert_eq!(restores[1].sources, vec!["x", "y"]);
    }

    #[test]
    fn test_input_path_must_exist() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        let err = fixture
            .run(&descriptor(), &["missing.sln"], dir.path())
            .expect_err("missing input");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Failed(_))
        ));
        assert!(fixture.engine.restores().is_empty());

        std::fs::write(dir.path().join("app.sln"), "").expect("write");
        fixture
            .run(&descriptor(), &["app.sln"], dir.path())
            .expect("restore");
        assert_eq!(
            fixture.engine.restores()[0].input,
            Some(dir.path().join("app.sln"))
        );
    }

    #[test]
    fn test_too_many_arguments_is_usage_error() {
        let dir = TempDir::new().expect("temp dir");
        let err = Fixture::new()
            .run(&descriptor(), &["a", "b"], dir.path())
            .expect_err("usage");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_package_save_mode_and_output_alias() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        fixture
            .run(
                &descriptor(),
                &["-PackageSaveMode", "NUSPEC;nupkg", "-OutputDirectory", "out"],
                dir.path(),
            )
            .expect("restore");
        let restores = fixture.engine.restores();
        assert_eq!(restores[0].package_save_mode.as_deref(), Some("nuspec;nupkg"));
        assert_eq!(restores[0].packages_directory, Some(dir.path().join("out")));

        assert!(
            fixture
                .run(&descriptor(), &["-PackageSaveMode", "zip"], dir.path())
                .is_err()
        );
    }
}
