use std::sync::Arc;

use forge_artifact_parser::{ParsedFile, ParsedResponse};
use tokio::sync::Mutex;

use crate::error::{Result, WorkbenchError};
use crate::mount::MountTree;
use crate::sandbox::Sandbox;

/// How the runner treats commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Refuse to run commands when the mounted tree has no `package.json`
    pub require_package_json: bool,

    /// Command prefixes that install dependencies
    pub install_prefixes: Vec<String>,

    /// Command prefixes that start servers and never exit on their own
    pub long_running_prefixes: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_string()).collect() };
        Self {
            require_package_json: true,
            install_prefixes: owned(&[
                "npm install",
                "npm i",
                "npm ci",
                "yarn install",
                "pnpm install",
            ]),
            long_running_prefixes: owned(&[
                "npm run dev",
                "npm start",
                "npm run start",
                "yarn dev",
                "pnpm dev",
                "next dev",
            ]),
        }
    }
}

impl RunnerConfig {
    fn matches(prefixes: &[String], command: &str) -> bool {
        let command = command.trim();
        prefixes.iter().any(|prefix| {
            command == prefix.as_str()
                || command
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }

    pub fn is_install(&self, command: &str) -> bool {
        Self::matches(&self.install_prefixes, command)
    }

    pub fn is_long_running(&self, command: &str) -> bool {
        Self::matches(&self.long_running_prefixes, command)
    }
}

/// Whether a mount call reached the sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    Unchanged,
}

/// What happened to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed { command: String, output: String },
    Started { command: String },
}

/// Summary of one `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mount: MountOutcome,
    pub commands: Vec<CommandOutcome>,
}

/// Mounts parsed files into a sandbox and runs the response's commands
pub struct ProjectRunner<S: ?Sized> {
    sandbox: Arc<S>,
    config: RunnerConfig,
    mounted_fingerprint: Mutex<Option<String>>,
}

impl<S: Sandbox + ?Sized> ProjectRunner<S> {
    pub fn new(sandbox: Arc<S>, config: RunnerConfig) -> Self {
        Self {
            sandbox,
            config,
            mounted_fingerprint: Mutex::new(None),
        }
    }

    pub fn sandbox(&self) -> &Arc<S> {
        &self.sandbox
    }

    /// Mount `files` unless the same set is already mounted
    pub async fn mount(&self, files: &[ParsedFile]) -> Result<MountOutcome> {
        let tree = MountTree::from_files(files);
        self.mount_tree(&tree).await
    }

    async fn mount_tree(&self, tree: &MountTree) -> Result<MountOutcome> {
        let fingerprint = tree.fingerprint();
        let mut mounted = self.mounted_fingerprint.lock().await;
        if mounted.as_deref() == Some(fingerprint.as_str()) {
            log::debug!("mount skipped, file set unchanged");
            return Ok(MountOutcome::Unchanged);
        }

        self.sandbox.mount(tree).await?;
        *mounted = Some(fingerprint);
        Ok(MountOutcome::Mounted)
    }

    /// Run commands strictly in order, stopping at the first failure.
    /// Long-running commands are started and not awaited.
    pub async fn run_commands(&self, commands: &[String]) -> Result<Vec<CommandOutcome>> {
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            if self.config.is_long_running(command) {
                log::debug!("starting `{command}`");
                self.sandbox.start(command).await?;
                outcomes.push(CommandOutcome::Started {
                    command: command.clone(),
                });
                continue;
            }

            log::debug!("running `{command}`");
            let result = self.sandbox.run(command).await?;
            if !result.success() {
                log::warn!("`{command}` exited with {}", result.exit_code);
                return Err(if self.config.is_install(command) {
                    WorkbenchError::DependencyInstallFailed {
                        command: command.clone(),
                        exit_code: result.exit_code,
                        output: result.output,
                    }
                } else {
                    WorkbenchError::CommandFailed {
                        command: command.clone(),
                        exit_code: result.exit_code,
                        output: result.output,
                    }
                });
            }
            outcomes.push(CommandOutcome::Completed {
                command: command.clone(),
                output: result.output,
            });
        }
        Ok(outcomes)
    }

    /// Mount the response's files, then run its commands
    pub async fn execute(&self, response: &ParsedResponse) -> Result<RunReport> {
        let tree = MountTree::from_files(&response.files);
        let commands = response.shell_commands();

        if self.config.require_package_json
            && !commands.is_empty()
            && !tree.contains_file("package.json")
        {
            return Err(WorkbenchError::NoPackageJson);
        }

        let mount = self.mount_tree(&tree).await?;
        let commands = self.run_commands(commands).await?;
        Ok(RunReport { mount, commands })
    }
}
