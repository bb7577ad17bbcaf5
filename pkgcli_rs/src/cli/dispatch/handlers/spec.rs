//! `spec`: write a starter `.nuspec` manifest.

use std::any::Any;
use std::path::Path;

use async_trait::async_trait;

use super::expect_arguments;
use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;

const DEFAULT_ID: &str = "Package";

#[derive(Debug, Default)]
pub struct SpecCommand {
    base: CommandBase,
    assembly_path: Option<String>,
    force: bool,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<SpecCommand>("spec")
        .summary("Generates a .nuspec for a new package.")
        .usage("[package id]")
        .description(
            "Writes <id>.nuspec into the working directory with placeholder metadata. \
             The id comes from the argument, then from -AssemblyPath, then defaults to Package.",
        )
        .example("pkgcli spec")
        .example("pkgcli spec MyPackage")
        .example("pkgcli spec -AssemblyPath ./bin/MyLib.dll -Force")
        .options(|o| {
            o.value(
                "AssemblyPath",
                "Assembly whose file name provides the package id.",
                |c| &mut c.assembly_path,
            )
            .flag("Force", "Overwrite an existing .nuspec file.", |c| &mut c.force)
        })
        .build()
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn manifest(id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package>
  <metadata>
    <id>{id}</id>
    <version>1.0.0</version>
    <authors>Author here</authors>
    <description>Package description</description>
    <license type="expression">MIT</license>
    <projectUrl>http://project_url_here_or_delete_this_line/</projectUrl>
    <releaseNotes>Summary of changes made in this release of the package.</releaseNotes>
    <tags>Tag1 Tag2</tags>
  </metadata>
</package>
"#,
        id = escape_xml(id)
    )
}

impl SpecCommand {
    fn package_id(&self) -> String {
        if let Some(id) = self.base.argument(0) {
            return id.to_string();
        }
        self.assembly_path
            .as_deref()
            .and_then(|path| Path::new(path).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| DEFAULT_ID.to_string())
    }
}

#[async_trait]
impl CommandInstance for SpecCommand {
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
        expect_arguments(&self.base.arguments, 0..=1, "spec takes at most one package id.")?;
        let id = self.package_id();
        let file_name = format!("{}.nuspec", id);
        let target = ctx.working_dir.join(&file_name);

        if target.exists() && !self.force {
            return Err(CommandError::Failed(format!(
                "'{}' already exists, use -Force to overwrite it.",
                file_name
            ))
            .into());
        }

        std::fs::write(&target, manifest(&id))
            .map_err(|err| CommandError::io(format!("Failed to write {}", target.display()), err))?;
        ctx.console
            .info(&format!("Created '{}' successfully.", file_name));
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_id() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        fixture.run(&descriptor(), &[], dir.path()).expect("spec");
        let written = fs::read_to_string(dir.path().join("Package.nuspec")).expect("read");
        assert!(written.contains("<id>Package</id>"));
        assert_eq!(fixture.console.stdout(), "Created 'Package.nuspec' successfully.\n");
    }

    #[test]
    fn test_id_from_argument_or_assembly() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        fixture
            .run(&descriptor(), &["Tools&Co"], dir.path())
            .expect("spec");
        let written = fs::read_to_string(dir.path().join("Tools&Co.nuspec")).expect("read");
        assert!(written.contains("<id>Tools&amp;Co</id>"));

        fixture
            .run(&descriptor(), &["-AssemblyPath", "bin/MyLib.dll"], dir.path())
            .expect("spec");
        assert!(dir.path().join("MyLib.nuspec").exists());
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = TempDir::new().expect("temp dir");
        let target = dir.path().join("Package.nuspec");
        fs::write(&target, "keep").expect("write");
        let fixture = Fixture::new();
        let err = fixture
            .run(&descriptor(), &[], dir.path())
            .expect_err("exists");
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Failed(_))
        ));
        assert_eq!(fs::read_to_string(&target).expect("read"), "keep");

        fixture
            .run(&descriptor(), &["-Force"], dir.path())
            .expect("force");
        assert!(fs::read_to_string(&target).expect("read").contains("<package>"));
    }
}
