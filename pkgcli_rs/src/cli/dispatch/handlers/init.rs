//! `init`: copy every package from one folder feed into another.

use std::any::Any;

use async_trait::async_trait;

use super::expect_arguments;
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::fs_utils;

#[derive(Debug, Default)]
pub struct InitCommand {
    base: CommandBase,
    expand: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<InitCommand>("init")
        .summary("Adds all packages from a source folder to a destination feed.")
        .usage("<source> <destination>")
        .description(
            "Copies every package found below the source folder into the destination \
             folder. Packages already present in the destination are skipped.",
        )
        .example("pkgcli init ./build/packages /srv/feed")
        .example("pkgcli init ./build/packages /srv/feed -Expand")
        .options(|o| {
            o.flag(
                "Expand",
                "Lay packages out as <id>/<version>/ in the destination.",
                |c| &mut c.expand,
            )
        })
        .build()
}

#[async_trait]
impl CommandInstance for InitCommand {
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
            "init requires a source folder and a destination.",
        )?;
        let source = ctx.resolve_path(&self.base.arguments[0]);
        let destination = ctx.resolve_path(&self.base.arguments[1]);
        if !source.is_dir() {
            return Err(CommandError::Failed(format!(
                "Source folder '{}' does not exist.",
                source.display()
            ))
            .into());
        }

        let packages = fs_utils::find_packages(&source)
            .map_err(|err| CommandError::io(format!("Failed to read {}", source.display()), err))?;
        if packages.is_empty() {
            ctx.console.warning(&format!(
                "No packages were found in '{}'.",
                source.display()
            ));
            return Ok(0);
        }

        let mut copied = 0usize;
        for package in &packages {
            let target_dir = if self.expand {
                let stem = package
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match fs_utils::split_package_file_name(&stem) {
                    Some((id, version)) => destination.join(id).join(version),
                    None => {
                        ctx.console.warning(&format!(
                            "Skipping '{}': no version in the file name.",
                            package.display()
                        ));
                        continue;
                    }
                }
            } else {
                destination.clone()
            };

            let added = fs_utils::copy_into(package, &target_dir).map_err(|err| {
                CommandError::io(format!("Failed to copy {}", package.display()), err)
            })?;
            if added {
                copied += 1;
                ctx.console
                    .detail(&format!("Added package '{}'.", package.display()));
            } else {
                ctx.console.detail(&format!(
                    "Package '{}' already exists in '{}'.",
                    package.display(),
                    target_dir.display()
                ));
            }
        }

        tracing::debug!(found = packages.len(), copied, "init finished");
        ctx.console.info(&format!(
            "Added {} of {} package(s) to '{}'.",
            copied,
            packages.len(),
            destination.display()
        ));
        Ok(0)
    }
}
