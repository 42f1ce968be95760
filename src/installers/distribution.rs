//! # Distribution Installer
//!
//! Installs a conda-based scientific-Python distribution (Anaconda or Miniconda) from its
//! self-extracting batch installer.
//!
//! ## Phases
//!
//! 1. **checking-existing** - an existing install directory ends the run successfully
//! 2. **downloading** - fetch the version-pinned installer; no file afterwards is fatal
//! 3. **installing** - run the installer in batch mode into the install directory
//! 4. **configuring** - evaluate the shell hook, extend the profile's PATH, re-source it,
//!    run `conda init`, delete the installer, create the named environment, and for
//!    flavors with `verify_after_configure` activate it, check `conda` resolves and
//!    fall back to `base`
//!
//! Every phase returns the next one or an error; the first error ends the run.

use crate::errors::InstallError;
use crate::installers::shellrc::{flush_profile_lines, source_profile};
use crate::libs::command_runner::{CommandOutput, CommandRunner, CommandSpec};
use crate::libs::utilities::download::Downloader;
use crate::schemas::configuration::{DistributionSettings, ShellKind};
use crate::schemas::environment::{EnvironmentDescription, parse_exports};
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Environment every conda install starts with.
const BASE_ENVIRONMENT: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    CheckingExisting,
    Downloading,
    Installing,
    Configuring,
    Done,
    Failed,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InstallPhase::CheckingExisting => "checking-existing",
            InstallPhase::Downloading => "downloading",
            InstallPhase::Installing => "installing",
            InstallPhase::Configuring => "configuring",
            InstallPhase::Done => "done",
            InstallPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The install directory was already there; nothing was touched.
    AlreadyInstalled,
    Installed,
}

#[derive(Debug)]
pub struct InstallReport {
    pub outcome: InstallOutcome,
    /// Phases in the order they were entered, ending with `Done`.
    pub phases: Vec<InstallPhase>,
    /// The description after the last step.
    pub environment: EnvironmentDescription,
}

pub struct DistributionInstaller<'a> {
    settings: &'a DistributionSettings,
    shell: ShellKind,
    download_dir: PathBuf,
    runner: &'a mut dyn CommandRunner,
    downloader: &'a mut dyn Downloader,
}

impl<'a> DistributionInstaller<'a> {
    /// Builds an installer for one flavor.
    ///
    /// # Arguments
    /// * `settings`: Flavor preset with config and command-line overrides applied.
    /// * `shell`: Shell whose hook is evaluated and which `conda init` targets.
    /// * `download_dir`: Where the installer file is saved before it runs.
    /// * `runner`: Executes the installer and every `conda` command.
    /// * `downloader`: Fetches the installer.
    pub fn new(
        settings: &'a DistributionSettings,
        shell: ShellKind,
        download_dir: PathBuf,
        runner: &'a mut dyn CommandRunner,
        downloader: &'a mut dyn Downloader,
    ) -> Self {
        DistributionInstaller {
            settings,
            shell,
            download_dir,
            runner,
            downloader,
        }
    }

    /// Drives the phases from `checking-existing` to `done`, stopping at the first error.
    ///
    /// # Arguments
    /// * `env`: The starting environment description. Every command runs with its
    ///   `PATH` and variables, and configuring steps update it as they go.
    ///
    /// # Returns
    /// An `InstallReport` with the outcome, the phases entered and the final description,
    /// or the error of the phase that failed. Nothing is rolled back on failure.
    pub fn run(&mut self, mut env: EnvironmentDescription) -> Result<InstallReport, InstallError> {
        log_info!(
            "[SDS::Distribution] Installing {} {} into {}",
            self.settings.flavor.bold(),
            self.settings.version,
            self.settings.install_dir.display().to_string().cyan()
        );

        let mut phases = Vec::new();
        let mut phase = InstallPhase::CheckingExisting;
        loop {
            phases.push(phase);
            log_debug!("[SDS::Distribution] Entering phase: {}", phase.to_string().magenta());

            let next = match phase {
                InstallPhase::CheckingExisting => self.check_existing(),
                InstallPhase::Downloading => self.download(),
                InstallPhase::Installing => self.install(&env),
                InstallPhase::Configuring => self.configure(&mut env),
                InstallPhase::Done | InstallPhase::Failed => break,
            };

            match next {
                Ok(next_phase) => phase = next_phase,
                Err(err) => {
                    phases.push(InstallPhase::Failed);
                    log_error!(
                        "[SDS::Distribution] {} failed during {}: {}",
                        self.settings.flavor.red(),
                        phase,
                        err
                    );
                    return Err(err);
                }
            }
        }

        let outcome = if phases.contains(&InstallPhase::Downloading) {
            InstallOutcome::Installed
        } else {
            InstallOutcome::AlreadyInstalled
        };
        Ok(InstallReport {
            outcome,
            phases,
            environment: env,
        })
    }

    fn artifact_path(&self) -> Result<PathBuf, InstallError> {
        let name = self.settings.artifact_name().ok_or_else(|| {
            InstallError::Config(format!(
                "cannot derive an installer file name from {}",
                self.settings.download_url()
            ))
        })?;
        Ok(self.download_dir.join(name))
    }

    fn check_existing(&mut self) -> Result<InstallPhase, InstallError> {
        if self.settings.install_dir.exists() {
            log_info!(
                "[SDS::Distribution] {} already exists; skipping installation",
                self.settings.install_dir.display().to_string().green()
            );
            return Ok(InstallPhase::Done);
        }
        Ok(InstallPhase::Downloading)
    }

    fn download(&mut self) -> Result<InstallPhase, InstallError> {
        let url = self.settings.download_url();
        let artifact = self.artifact_path()?;

        // A leftover installer from an earlier run must not stand in for this download.
        if artifact.exists() {
            log_debug!(
                "[SDS::Distribution] Removing stale installer {}",
                artifact.display()
            );
            fs::remove_file(&artifact)?;
        }

        // Transport and write errors are only reported here; whether a file exists
        // afterwards is what decides the phase.
        if let Err(e) = self.downloader.download(&url, &artifact) {
            log_warn!("[SDS::Distribution] Download reported an error: {}", e);
        }

        if !artifact.is_file() {
            log_error!(
                "[SDS::Distribution] Failed to download {} to {}",
                url.red(),
                artifact.display()
            );
            return Err(InstallError::ArtifactMissing(artifact));
        }
        Ok(InstallPhase::Installing)
    }

    fn install(&mut self, env: &EnvironmentDescription) -> Result<InstallPhase, InstallError> {
        let artifact = self.artifact_path()?;
        let spec = CommandSpec::new("bash")
            .arg(artifact.display().to_string())
            .arg("-b")
            .arg("-p")
            .arg(self.settings.install_dir.display().to_string());
        log_info!("[SDS::Distribution] Running installer in batch mode");
        self.run_in(env, spec)?;
        Ok(InstallPhase::Configuring)
    }

    fn configure(&mut self, env: &mut EnvironmentDescription) -> Result<InstallPhase, InstallError> {
        self.evaluate_shell_hook(env)?;

        env.queue_profile_line(self.settings.profile_path_line());
        flush_profile_lines(env)?;
        source_profile(env)?;

        let conda = self.settings.conda_executable().display().to_string();
        self.run_in(env, CommandSpec::new(&conda).arg("init").arg(self.shell.as_str()))?;

        let artifact = self.artifact_path()?;
        fs::remove_file(&artifact)?;
        log_debug!("[SDS::Distribution] Removed installer {}", artifact.display());

        let name = self.settings.environment.clone();
        log_info!(
            "[SDS::Distribution] Creating environment {} with python {}",
            name.bold(),
            self.settings.python_version
        );
        self.run_in(
            env,
            CommandSpec::new(&conda)
                .args(["create", "-y", "-n"])
                .arg(&name)
                .arg(format!("python={}", self.settings.python_version)),
        )?;

        if self.settings.verify_after_configure {
            self.verify_and_reset(env, &name)?;
        }

        log_info!(
            "[SDS::Distribution] {} installed successfully",
            self.settings.flavor.green()
        );
        Ok(InstallPhase::Done)
    }

    /// Runs the tool's shell hook and folds its effect into the description.
    fn evaluate_shell_hook(&mut self, env: &mut EnvironmentDescription) -> Result<(), InstallError> {
        let spec = CommandSpec::new(self.settings.conda_executable().display().to_string())
            .arg(format!("shell.{}", self.shell.as_str()))
            .arg("hook")
            .captured();
        let output = self.run_in(env, spec)?;
        let exports = parse_exports(&output.stdout);
        log_debug!("[SDS::Distribution] Shell hook exported {} variable(s)", exports.len());
        for (key, value) in exports {
            env.set_var(key, value);
        }
        env.prepend_path(self.settings.condabin_dir());
        Ok(())
    }

    /// Activates the new environment, checks the tool resolves, then activates `base`.
    fn verify_and_reset(&mut self, env: &mut EnvironmentDescription, name: &str) -> Result<(), InstallError> {
        let env_bin = self.settings.environment_bin_dir(name);
        env.activate(name, env_bin.clone(), None);
        env.set_var("CONDA_PREFIX", self.settings.install_dir.join("envs").join(name).display().to_string());

        match env.resolve_executable("conda") {
            Some(found) => log_info!(
                "[SDS::Distribution] conda resolves to {}",
                found.display().to_string().green()
            ),
            None => {
                log_error!(
                    "[SDS::Distribution] conda is not on the search path after activating {}",
                    name.red()
                );
                return Err(InstallError::NotResolvable {
                    tool: "conda".to_string(),
                });
            }
        }

        env.activate(BASE_ENVIRONMENT, self.settings.bin_dir(), Some(env_bin.as_path()));
        env.set_var("CONDA_PREFIX", self.settings.install_dir.display().to_string());
        log_debug!("[SDS::Distribution] Activated {}", BASE_ENVIRONMENT);
        Ok(())
    }

    fn run_in(&mut self, env: &EnvironmentDescription, spec: CommandSpec) -> Result<CommandOutput, InstallError> {
        let spec = env.apply_to(spec)?;
        log_debug!("[SDS::Distribution] Executing: {}", spec.display().cyan());
        self.runner.run(&spec)
    }
}
