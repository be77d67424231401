//! # Forge Workbench
//!
//! The async edge around the artifact parser: feeding streamed chunks into a
//! [`StreamingProjector`](forge_artifact_parser::StreamingProjector) in order,
//! and handing the parsed file set and commands to a sandbox.
//!
//! ```text
//! model stream ──chunks──> GenerationSession ──Projection──> UI (watch)
//!                                 │
//!                          final ParsedResponse
//!                                 │
//!                           ProjectRunner ──mount / run / start──> Sandbox
//! ```

mod error;
mod memory;
mod mount;
mod runner;
mod sandbox;
mod session;
mod shared;

pub use error::{Result, WorkbenchError};
pub use memory::MemorySandbox;
pub use mount::{MountNode, MountTree};
pub use runner::{CommandOutcome, MountOutcome, ProjectRunner, RunReport, RunnerConfig};
pub use sandbox::{ProcessOutput, Sandbox, SandboxEvent};
pub use session::{GenerationSession, ProjectionSender};
pub use shared::SharedSandbox;
