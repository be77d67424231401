use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::mount::MountTree;

/// Event emitted by a sandbox while processes run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SandboxEvent {
    Output { command: String, line: String },
    ServerReady { port: u16, url: String },
    Exited { command: String, exit_code: i32 },
}

/// Result of a command run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub output: String,
}

impl ProcessOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Execution environment that mounts a file tree and runs shell commands
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Replace the mounted filesystem
    async fn mount(&self, tree: &MountTree) -> Result<()>;

    /// Run a command and wait for it to exit
    async fn run(&self, command: &str) -> Result<ProcessOutput>;

    /// Start a long-running command (dev server) without waiting for exit.
    /// Readiness is reported through [`SandboxEvent::ServerReady`].
    async fn start(&self, command: &str) -> Result<()>;

    /// Subscribe to process events
    fn subscribe(&self) -> broadcast::Receiver<SandboxEvent>;
}
