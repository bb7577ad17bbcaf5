//! `verify`: check package signatures through the engine.

use std::any::Any;

use async_trait::async_trait;

use crate::cli::command::{CommandBase, CommandContext, CommandDescriptor, CommandInstance};
use crate::cli::error::CommandError;
use crate::engine::VerifyRequest;

#[derive(Debug, Default)]
pub struct VerifyCommand {
    base: CommandBase,
    signatures: bool,
    all: bool,
    certificate_fingerprints: Vec<String>,
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::builder::<VerifyCommand>("verify")
        .summary("Verifies the signature of a package.")
        .usage("<-Signatures | -All> <package paths>")
        .description(
            "Verifies one or more packages. Either -Signatures or -All selects the checks \
             to run. Exits with 1 when any package fails.",
        )
        .example("pkgcli verify -Signatures ./MyPackage.1.0.0.nupkg")
        .example("pkgcli verify -Signatures ./a.nupkg -CertificateFingerprint CE40881F...")
        .options(|o| {
            o.flag(
                "Signatures",
                "Verify that the package signature is valid.",
                |c| &mut c.signatures,
            )
            .flag("All", "Run every available verification.", |c| &mut c.all)
            .multi(
                "CertificateFingerprint",
                "SHA-256 fingerprint of a certificate the signer must match.",
                |c| &mut c.certificate_fingerprints,
            )
        })
        .build()
}

#[async_trait]
impl CommandInstance for VerifyCommand {
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
        if self.base.arguments.is_empty() {
            return Err(CommandError::Usage("verify requires at least one package path.".into()).into());
        }
        if !self.signatures && !self.all {
            return Err(CommandError::Usage(
                "Specify the verification to run: -Signatures or -All.".into(),
            )
            .into());
        }

        let packages = self
            .base
            .arguments
            .iter()
            .map(|path| ctx.resolve_path(path))
            .collect();
        let results = ctx
            .engine
            .verify(VerifyRequest {
                packages,
                signatures: self.signatures,
                all: self.all,
                certificate_fingerprints: self.certificate_fingerprints.clone(),
            })
            .await?;

        let mut failures = 0usize;
        for result in &results {
            if result.passed {
                ctx.console.info(&format!(
                    "Successfully verified package '{}'.",
                    result.package.display()
                ));
            } else {
                failures += 1;
                ctx.console.error(&format!(
                    "Package signature validation failed for '{}'.",
                    result.package.display()
                ));
                for issue in &result.issues {
                    ctx.console.error(&format!("  {}", issue));
                }
            }
        }
        Ok(if failures == 0 { 0 } else { 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::dispatch::handlers::test_support::Fixture;
    use crate::engine::Verification;
    use tempfile::TempDir;

    #[test]
    fn test_requires_paths_and_mode() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        for args in [&["-Signatures"][..], &["a.nupkg"][..]] {
            let err = fixture
                .run(&descriptor(), args, dir.path())
                .expect_err("usage");
            assert!(matches!(
                err.downcast_ref::<CommandError>(),
                Some(CommandError::Usage(_))
            ));
        }
        assert!(fixture.engine.verifies().is_empty());
    }

    #[test]
    fn test_passes_request_to_engine() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        let code = fixture
            .run(
                &descriptor(),
                &[
                    "a.nupkg",
                    "-Signatures",
                    "-CertificateFingerprint",
                    "AA",
                    "-CertificateFingerprint",
                    "BB",
                ],
                dir.path(),
            )
            .expect("verify");
        assert_eq!(code, 0);
        assert_eq!(
            fixture.engine.verifies(),
            vec![VerifyRequest {
                packages: vec![dir.path().join("a.nupkg")],
                signatures: true,
                all: false,
                certificate_fingerprints: vec!["AA".into(), "BB".into()],
            }]
        );
    }

    #[test]
    fn test_failed_verification_exits_one() {
        let dir = TempDir::new().expect("temp dir");
        let fixture = Fixture::new();
        *fixture.engine.verifications.lock().expect("lock") = vec![
            Verification {
                package: "good.nupkg".into(),
                passed: true,
                issues: Vec::new(),
            },
            Verification {
                package: "bad.nupkg".into(),
                passed: false,
                issues: vec!["signature is not trusted".into()],
            },
        ];
        let code = fixture
            .run(&descriptor(), &["good.nupkg", "bad.nupkg", "-All"], dir.path())
            .expect("verify");
        assert_eq!(code, 1);
        assert!(fixture.console.stdout().contains("good.nupkg"));
        let err = fixture.console.stderr();
        assert!(err.contains("bad.nupkg"));
        assert!(err.contains("  signature is not trusted"));
    }
}
