//! Package operations the CLI delegates to.
//!
//! Restoring, deleting and verifying packages require a resolver and feed
//! protocols that live outside this crate. Commands describe the work as a
//! request and hand it to a [`PackageEngine`].

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::cli::CommandError;

/// Inputs collected by `restore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Solution, project or packages file; `None` means the working directory.
    pub input: Option<PathBuf>,
    pub sources: Vec<String>,
    pub fallback_sources: Vec<String>,
    pub packages_directory: Option<PathBuf>,
    pub solution_directory: Option<PathBuf>,
    pub no_http_cache: bool,
    pub direct_download: bool,
    pub disable_parallel_processing: bool,
    pub require_consent: bool,
    pub force: bool,
    pub recursive: bool,
    pub locked_mode: bool,
    pub use_lock_file: bool,
    pub package_save_mode: Option<String>,
    pub non_interactive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub already_installed: usize,
}

/// Inputs collected by `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub package_id: String,
    pub version: String,
    pub source: String,
    pub api_key: Option<String>,
}

/// Inputs collected by `verify`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyRequest {
    pub packages: Vec<PathBuf>,
    pub signatures: bool,
    pub all: bool,
    pub certificate_fingerprints: Vec<String>,
}

/// Outcome for one verified package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub package: PathBuf,
    pub passed: bool,
    pub issues: Vec<String>,
}

/// Collaborator performing package operations.
#[async_trait]
pub trait PackageEngine: Send + Sync {
    async fn restore(&self, request: RestoreRequest) -> Result<RestoreSummary>;

    async fn delete(&self, request: DeleteRequest) -> Result<()>;

    async fn verify(&self, request: VerifyRequest) -> Result<Vec<Verification>>;
}

/// Engine used when no package engine has been wired in.
///
/// Every operation fails with a [`CommandError`], so the user sees a normal
/// error message and exit code 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredEngine;

impl UnconfiguredEngine {
    fn unavailable(operation: &str) -> anyhow::Error {
        CommandError::Failed(format!(
            "Cannot {}: no package engine is configured for this build.",
            operation
        ))
        .into()
    }
}

#[async_trait]
impl PackageEngine for UnconfiguredEngine {
    async fn restore(&self, _request: RestoreRequest) -> Result<RestoreSummary> {
        Err(Self::unavailable("restore packages"))
    }

    async fn delete(&self, request: DeleteRequest) -> Result<()> {
        Err(Self::unavailable(&format!(
            "delete {} {} from {}",
            request.package_id, request.version, request.source
        )))
    }

    async fn verify(&self, _request: VerifyRequest) -> Result<Vec<Verification>> {
        Err(Self::unavailable("verify packages"))
    }
}
