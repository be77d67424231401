use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkbenchError>;

/// Failures of the sandbox collaborator or the session plumbing
#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Sandbox boot failed: {0}")]
    BootFailed(String),

    #[error("Mount failed: {0}")]
    MountFailed(String),

    #[error("No package.json found in the project")]
    NoPackageJson,

    #[error("Dependency install failed: `{command}` exited with {exit_code}")]
    DependencyInstallFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Command `{command}` exited with {exit_code}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Projection receiver dropped")]
    UpdatesClosed,
}

impl WorkbenchError {
    pub fn boot(msg: impl Into<String>) -> Self {
        Self::BootFailed(msg.into())
    }

    pub fn mount(msg: impl Into<String>) -> Self {
        Self::MountFailed(msg.into())
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }
}
