// External command execution.
//
// Installer steps describe the command they want as a `CommandSpec` and hand it to a
// `CommandRunner`. The system runner blocks until the child exits; tests swap in a
// recording fake so no real package manager or installer is ever touched.

use crate::errors::InstallError;
use crate::{log_debug, log_error};
use colored::Colorize;
use std::ffi::OsString;
use std::process::{Command, Stdio};

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, OsString)>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
}

impl CommandSpec {
    /// Starts a spec for `program` with no arguments, no extra variables and inherited
    /// stdio. Builder methods below fill in the rest.
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets a variable for the child only.
    ///
    /// Privilege wrapping turns these into `NAME=value` arguments, since the escalation
    /// helper would drop them otherwise.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Collects stdout and stderr into the `CommandOutput` instead of the terminal.
    /// Used for commands whose output is parsed, such as shell hooks or `dpkg-query`.
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Shell-like rendering used in logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands. A non-zero exit is an `Err`, never an `Ok`.
///
/// # Returns
/// * `Ok(CommandOutput)` when the child exited with status 0; output is empty unless
///   the spec asked for capture.
/// * `Err(InstallError::CommandSpawn)` when the program could not be started.
/// * `Err(InstallError::CommandFailed)` carrying the child's exit status otherwise.
pub trait CommandRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, InstallError>;
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, InstallError> {
        let rendered = spec.display();
        log_debug!("[SDS::Runner] Executing: {}", rendered.cyan());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        // Spawn failures (missing binary, permissions) are kept apart from non-zero exits.
        let spawn_error = |source| InstallError::CommandSpawn {
            command: rendered.clone(),
            source,
        };

        let (status, output) = if spec.capture {
            let out = command
                .stdin(Stdio::null())
                .output()
                .map_err(spawn_error)?;
            let captured = CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            };
            (out.status, captured)
        } else {
            let status = command.status().map_err(spawn_error)?;
            (status, CommandOutput::default())
        };

        if status.success() {
            return Ok(output);
        }

        // Killed by a signal: there is no status, which maps to exit code 1 later on.
        let code = status.code().unwrap_or(-1);
        log_error!(
            "[SDS::Runner] `{}` exited with status {}",
            rendered.red(),
            code
        );
        if !output.stderr.trim().is_empty() {
            log_debug!("[SDS::Runner] Stderr: {}", output.stderr.trim());
        }
        Err(InstallError::CommandFailed {
            command: rendered,
            code,
        })
    }
}

/// Wraps privileged commands in an escalation helper such as `sudo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    escalate_with: Option<String>,
}

impl Privilege {
    /// Uses `escalate_with` as the helper. `None` or a blank string means no escalation.
    pub fn new(escalate_with: Option<String>) -> Self {
        Privilege {
            escalate_with: escalate_with.filter(|helper| !helper.trim().is_empty()),
        }
    }

    /// Commands are run as-is, for hosts where we already are root.
    pub fn none() -> Self {
        Privilege { escalate_with: None }
    }

    /// Rewrites `spec` so it runs through the helper.
    ///
    /// `apt-get update` with `DEBIAN_FRONTEND=noninteractive` becomes
    /// `sudo DEBIAN_FRONTEND=noninteractive apt-get update`. Without a helper the spec is
    /// returned untouched.
    pub fn wrap(&self, spec: CommandSpec) -> CommandSpec {
        let Some(helper) = &self.escalate_with else {
            return spec;
        };
        // `sudo` resets the environment, so variables are passed as `NAME=value` arguments.
        let mut args: Vec<String> = spec
            .env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value.to_string_lossy()))
            .collect();
        args.push(spec.program);
        args.extend(spec.args);
        CommandSpec {
            program: helper.clone(),
            args,
            env: Vec::new(),
            capture: spec.capture,
        }
    }
}
