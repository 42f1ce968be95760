// In-memory stand-ins for the command runner and downloader.

use crate::errors::InstallError;
use crate::libs::command_runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::libs::utilities::download::Downloader;
use std::fs;
use std::path::{Path, PathBuf};

type Handler = Box<dyn FnMut(&CommandSpec) -> Result<CommandOutput, InstallError>>;

/// Records every command and answers through a handler.
pub struct FakeRunner {
    pub calls: Vec<CommandSpec>,
    handler: Handler,
}

impl FakeRunner {
    /// Every command succeeds with empty output.
    pub fn succeeding() -> Self {
        Self::with_handler(|_| Ok(CommandOutput::default()))
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: FnMut(&CommandSpec) -> Result<CommandOutput, InstallError> + 'static,
    {
        FakeRunner {
            calls: Vec::new(),
            handler: Box::new(handler),
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls.iter().map(CommandSpec::display).collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.rendered().iter().any(|line| line.contains(needle))
    }
}

impl CommandRunner for FakeRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, InstallError> {
        self.calls.push(spec.clone());
        (self.handler)(spec)
    }
}

pub enum DownloadBehavior {
    /// Writes the given bytes to the destination.
    Write(Vec<u8>),
    /// Reports a transport error and leaves nothing behind.
    Fail,
    /// Reports success but writes nothing.
    Vanish,
}

pub struct FakeDownloader {
    pub requests: Vec<(String, PathBuf)>,
    behavior: DownloadBehavior,
}

impl FakeDownloader {
    pub fn new(behavior: DownloadBehavior) -> Self {
        FakeDownloader {
            requests: Vec::new(),
            behavior,
        }
    }
}

impl Downloader for FakeDownloader {
    fn download(&mut self, url: &str, dest: &Path) -> Result<(), InstallError> {
        self.requests.push((url.to_string(), dest.to_path_buf()));
        match &self.behavior {
            DownloadBehavior::Write(bytes) => {
                fs::write(dest, bytes)?;
                Ok(())
            }
            DownloadBehavior::Fail => Err(InstallError::Download {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            DownloadBehavior::Vanish => Ok(()),
        }
    }
}
