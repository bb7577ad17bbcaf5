//! Shared fixtures for handler tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::cli::command::{CommandContext, CommandDescriptor};
use crate::cli::parser::extract_options;
use crate::cli::registry::CommandRegistry;
use crate::console::BufferConsole;
use crate::engine::{
    DeleteRequest, PackageEngine, RestoreRequest, RestoreSummary, Verification, VerifyRequest,
};
use crate::settings::{MemorySettings, SharedSettings};

/// Engine that records requests and answers from canned results.
#[derive(Default)]
pub struct RecordingEngine {
    pub restores: Mutex<Vec<RestoreRequest>>,
    pub deletes: Mutex<Vec<DeleteRequest>>,
    pub verifies: Mutex<Vec<VerifyRequest>>,
    pub verifications: Mutex<Vec<Verification>>,
}

impl RecordingEngine {
    pub fn restores(&self) -> Vec<RestoreRequest> {
        self.restores.lock().expect("lock").clone()
    }

    pub fn deletes(&self) -> Vec<DeleteRequest> {
        self.deletes.lock().expect("lock").clone()
    }

    pub fn verifies(&self) -> Vec<VerifyRequest> {
        self.verifies.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PackageEngine for RecordingEngine {
    async fn restore(&self, request: RestoreRequest) -> anyhow::Result<RestoreSummary> {
        self.restores.lock().expect("lock").push(request);
        Ok(RestoreSummary {
            restored: 2,
            already_installed: 1,
        })
    }

    async fn delete(&self, request: DeleteRequest) -> anyhow::Result<()> {
        self.deletes.lock().expect("lock").push(request);
        Ok(())
    }

    async fn verify(&self, request: VerifyRequest) -> anyhow::Result<Vec<Verification>> {
        self.verifies.lock().expect("lock").push(request);
        Ok(self.verifications.lock().expect("lock").clone())
    }
}

/// Everything one handler invocation needs, with inspectable outputs.
pub struct Fixture {
    pub console: BufferConsole,
    pub settings: Arc<MemorySettings>,
    pub engine: RecordingEngine,
    pub registry: CommandRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            console: BufferConsole::new(),
            settings: Arc::new(MemorySettings::new()),
            engine: RecordingEngine::default(),
            registry: CommandRegistry::builtin().expect("builtin registry"),
        }
    }

    /// Bind `args` onto a fresh instance of `descriptor` and execute it.
    pub fn run(
        &self,
        descriptor: &CommandDescriptor,
        args: &[&str],
        working_dir: &Path,
    ) -> anyhow::Result<i32> {
        let mut command = descriptor.instantiate();
        extract_options(command.as_mut(), descriptor, args.iter().map(|a| a.to_string()))
            .expect("arguments bind");

        let loader = SharedSettings(self.settings.clone());
        let ctx = CommandContext::new(
            &self.console,
            &self.registry,
            &self.engine,
            &loader,
            working_dir,
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(command.execute(&ctx))
    }
}
