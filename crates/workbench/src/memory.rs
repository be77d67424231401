use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::mount::MountTree;
use crate::sandbox::{ProcessOutput, Sandbox, SandboxEvent};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct MemoryState {
    mounted: Option<MountTree>,
    mount_count: usize,
    commands: Vec<String>,
    started: Vec<String>,
}

/// In-process sandbox that records what it is asked to do.
///
/// Commands exit with 0 unless scripted otherwise; started commands report
/// a ready server when a port is configured.
#[derive(Debug)]
pub struct MemorySandbox {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<SandboxEvent>,
    exit_codes: HashMap<String, i32>,
    server_port: Option<u16>,
}

impl Default for MemorySandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySandbox {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
            exit_codes: HashMap::new(),
            server_port: None,
        }
    }

    /// Script the exit code of a command
    #[must_use]
    pub fn with_exit_code(mut self, command: impl Into<String>, exit_code: i32) -> Self {
        self.exit_codes.insert(command.into(), exit_code);
        self
    }

    /// Report a ready server on `port` whenever a command is started
    #[must_use]
    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The currently mounted tree
    pub fn mounted(&self) -> Option<MountTree> {
        self.state().mounted.clone()
    }

    /// How many times `mount` was called
    pub fn mount_count(&self) -> usize {
        self.state().mount_count
    }

    /// Commands run to completion, in call order
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Commands started in the background, in call order
    pub fn started(&self) -> Vec<String> {
        self.state().started.clone()
    }

    fn emit(&self, event: SandboxEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Sandbox for MemorySandbox {
    async fn mount(&self, tree: &MountTree) -> Result<()> {
        let mut state = self.state();
        state.mounted = Some(tree.clone());
        state.mount_count += 1;
        Ok(())
    }

    async fn run(&self, command: &str) -> Result<ProcessOutput> {
        self.state().commands.push(command.to_string());

        let exit_code = self.exit_codes.get(command).copied().unwrap_or(0);
        let output = format!("$ {command}\n");
        self.emit(SandboxEvent::Output {
            command: command.to_string(),
            line: output.trim_end().to_string(),
        });
        self.emit(SandboxEvent::Exited {
            command: command.to_string(),
            exit_code,
        });

        Ok(ProcessOutput { exit_code, output })
    }

    async fn start(&self, command: &str) -> Result<()> {
        self.state().started.push(command.to_string());

        if let Some(port) = self.server_port {
            self.emit(SandboxEvent::ServerReady {
                port,
                url: format!("http://localhost:{port}"),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SandboxEvent> {
        self.events.subscribe()
    }
}
