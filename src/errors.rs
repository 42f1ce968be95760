// Error type shared by both installer flows.
// Each variant is terminal for the run; `exit_code` decides what the process returns.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    /// An external command ran and exited unsuccessfully.
    #[error("command `{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },

    /// An external command could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// The download step finished but left no file behind.
    #[error("installer artifact {} is missing after download", .0.display())]
    ArtifactMissing(PathBuf),

    /// The installed tool cannot be found on the search path.
    #[error("`{tool}` is not resolvable on the search path")]
    NotResolvable { tool: String },

    #[error("could not determine the home directory")]
    HomeNotFound,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InstallError {
    /// Process exit status for this failure.
    ///
    /// A failing external command hands its own status through, the way a shell
    /// script aborting on error would. Everything detected by this tool itself is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::CommandFailed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}
