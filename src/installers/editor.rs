//! # Editor Installer
//!
//! Installs the VS Code package from Microsoft's APT repository on a Debian-family host:
//!
//! 1. refresh the package index
//! 2. install the prerequisites (download client, key tool)
//! 3. fetch the vendor signing key, de-armor it, and install it into the keyring
//! 4. register the vendor repository
//! 5. refresh the index again so the repository is visible
//! 6. install the editor package
//! 7. autoremove dependencies nothing needs any more
//!
//! `refresh` purges the package and its per-user configuration, then runs the same
//! sequence from the top.
//!
//! Nothing is retried. The first failing step ends the run with that step's error.
//! Every step is safe to repeat; the package manager makes re-runs no-ops.

use crate::errors::InstallError;
use crate::libs::command_runner::{CommandRunner, CommandSpec, Privilege};
use crate::libs::utilities::download::Downloader;
use crate::libs::utilities::path_helpers::expand_with_home;
use crate::schemas::configuration::EditorSettings;
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

const ARMORED_KEY_FILE: &str = "vendor-key.asc";
const DEARMORED_KEY_FILE: &str = "vendor-key.gpg";
const STAGED_SOURCE_FILE: &str = "vendor.list";
/// `dpkg-query` status of a fully installed package.
const INSTALLED_STATUS: &str = "install ok installed";

/// What `remove` actually did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub purged: bool,
    pub removed_paths: Vec<PathBuf>,
}

pub struct EditorInstaller<'a> {
    settings: &'a EditorSettings,
    privilege: Privilege,
    runner: &'a mut dyn CommandRunner,
    downloader: &'a mut dyn Downloader,
}

impl<'a> EditorInstaller<'a> {
    /// Builds an installer over the given settings.
    ///
    /// # Arguments
    /// * `settings`: Package, vendor key and repository locations to install from.
    /// * `privilege`: How root-only steps are escalated (`sudo` or nothing).
    /// * `runner`: Executes every external command.
    /// * `downloader`: Fetches the vendor signing key.
    pub fn new(
        settings: &'a EditorSettings,
        privilege: Privilege,
        runner: &'a mut dyn CommandRunner,
        downloader: &'a mut dyn Downloader,
    ) -> Self {
        EditorInstaller {
            settings,
            privilege,
            runner,
            downloader,
        }
    }

    /// Runs the full installation sequence.
    ///
    /// Steps run in a fixed order (index refresh, prerequisites, signing key, repository
    /// entry, second refresh, package, autoremove) and each one must succeed before the
    /// next starts. Re-running on an installed host is harmless.
    ///
    /// # Arguments
    /// * `verify`: When `true`, runs the editor with `--version` afterwards and fails with
    ///   `InstallError::NotResolvable` if it does not start.
    ///
    /// # Returns
    /// The error of the first failing step, if any.
    pub fn install(&mut self, verify: bool) -> Result<(), InstallError> {
        log_info!(
            "[SDS::Editor] Installing package {} from {}",
            self.settings.package.bold(),
            self.settings.repository_url.blue()
        );

        // Key and source entry are staged here before being installed as root.
        let staging = tempfile::Builder::new()
            .prefix("setup-devstack-editor-")
            .tempdir()?;
        log_debug!("[SDS::Editor] Staging directory: {}", staging.path().display());

        self.refresh_index()?;

        let prerequisites = self.settings.prerequisites.clone();
        if prerequisites.is_empty() {
            log_debug!("[SDS::Editor] No prerequisites configured");
        } else {
            self.install_packages(&prerequisites)?;
        }

        self.import_signing_key(staging.path())?;
        self.register_repository(staging.path())?;
        self.refresh_index()?;

        let package = self.settings.package.clone();
        self.install_packages(std::slice::from_ref(&package))?;
        self.autoremove()?;

        if verify {
            self.verify()?;
        }

        log_info!(
            "[SDS::Editor] {} has been installed successfully",
            package.green()
        );
        Ok(())
    }

    /// Purges the package (when installed) and clears per-user configuration.
    ///
    /// A package `dpkg-query` does not know is not an error; the purge is skipped. Paths
    /// that fail to delete are logged and left behind.
    ///
    /// # Arguments
    /// * `home`: Directory that `~` in the configured config paths expands to.
    ///
    /// # Returns
    /// A `RemovalReport` saying whether a purge ran and which paths were deleted.
    pub fn remove(&mut self, home: &Path) -> Result<RemovalReport, InstallError> {
        let mut report = RemovalReport::default();

        if self.is_installed()? {
            log_info!("[SDS::Editor] Purging package {}", self.settings.package.bold());
            let spec = apt(["purge", "-y"]).arg(&self.settings.package);
            self.run_privileged(spec)?;
            report.purged = true;
        } else {
            log_info!(
                "[SDS::Editor] {} is not installed as a package; skipping purge",
                self.settings.package.yellow()
            );
        }

        for raw in &self.settings.config_paths {
            let path = expand_with_home(raw, home);
            if !path.exists() {
                continue;
            }
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    log_debug!("[SDS::Editor] Removed {}", path.display());
                    report.removed_paths.push(path);
                }
                Err(e) => log_warn!(
                    "[SDS::Editor] Failed to remove {}: {}",
                    path.display().to_string().yellow(),
                    e
                ),
            }
        }
        Ok(report)
    }

    /// Removes the editor and installs it again from scratch.
    ///
    /// # Arguments
    /// * `home`: Passed to `remove` for config path expansion.
    /// * `verify`: Passed to `install`.
    ///
    /// # Returns
    /// The report of the removal half; the install half only contributes errors.
    pub fn refresh(&mut self, home: &Path, verify: bool) -> Result<RemovalReport, InstallError> {
        log_info!("[SDS::Editor] Refreshing {}", self.settings.package.bold());
        let report = self.remove(home)?;
        self.install(verify)?;
        Ok(report)
    }

    /// Asks `dpkg-query` whether the package is fully installed.
    pub fn is_installed(&mut self) -> Result<bool, InstallError> {
        let spec = CommandSpec::new("dpkg-query")
            .args(["-W", "-f=${Status}"])
            .arg(&self.settings.package)
            .captured();
        match self.runner.run(&spec) {
            Ok(output) => Ok(output.stdout.trim() == INSTALLED_STATUS),
            // dpkg-query exits non-zero for packages it has never seen.
            Err(InstallError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn refresh_index(&mut self) -> Result<(), InstallError> {
        log_info!("[SDS::Editor] Updating package lists");
        self.run_privileged(apt(["update"]))
    }

    fn install_packages(&mut self, packages: &[String]) -> Result<(), InstallError> {
        log_info!("[SDS::Editor] Installing packages: {}", packages.join(" ").cyan());
        self.run_privileged(apt(["install", "-y"]).args(packages.iter().cloned()))
    }

    fn import_signing_key(&mut self, staging: &Path) -> Result<(), InstallError> {
        let armored = staging.join(ARMORED_KEY_FILE);
        let dearmored = staging.join(DEARMORED_KEY_FILE);

        log_info!("[SDS::Editor] Downloading signing key from {}", self.settings.key_url.blue());
        self.downloader.download(&self.settings.key_url, &armored)?;

        let dearmor = CommandSpec::new("gpg")
            .args(["--batch", "--yes", "--dearmor", "-o"])
            .arg(dearmored.display().to_string())
            .arg(armored.display().to_string());
        self.runner.run(&dearmor)?;

        log_info!(
            "[SDS::Editor] Installing signing key to {}",
            self.settings.keyring.cyan()
        );
        self.run_privileged(install_root_file(&dearmored, &self.settings.keyring))
    }

    fn register_repository(&mut self, staging: &Path) -> Result<(), InstallError> {
        let entry = self.settings.repository_entry();
        let staged = staging.join(STAGED_SOURCE_FILE);
        fs::write(&staged, format!("{}\n", entry))?;

        log_info!(
            "[SDS::Editor] Adding repository to {}",
            self.settings.repository_file.cyan()
        );
        log_debug!("[SDS::Editor] Repository entry: {}", entry);
        self.run_privileged(install_root_file(&staged, &self.settings.repository_file))
    }

    fn autoremove(&mut self) -> Result<(), InstallError> {
        log_info!("[SDS::Editor] Removing unnecessary packages");
        self.run_privileged(apt(["autoremove", "-y"]))
    }

    fn verify(&mut self) -> Result<(), InstallError> {
        let spec = CommandSpec::new(&self.settings.package)
            .arg("--version")
            .captured();
        match self.runner.run(&spec) {
            Ok(output) => {
                let version = output.stdout.lines().next().unwrap_or("unknown");
                log_info!(
                    "[SDS::Editor] {} reports version {}",
                    self.settings.package.green(),
                    version.bold()
                );
                Ok(())
            }
            Err(e) => {
                log_error!("[SDS::Editor] Installation check failed: {}", e);
                Err(InstallError::NotResolvable {
                    tool: self.settings.package.clone(),
                })
            }
        }
    }

    /// Runs a root-only step through the configured escalation helper.
    /// Output is discarded; only the exit status matters.
    fn run_privileged(&mut self, spec: CommandSpec) -> Result<(), InstallError> {
        let spec = self.privilege.wrap(spec);
        self.runner.run(&spec).map(|_| ())
    }
}

/// Builds an `apt-get` invocation with prompts suppressed.
///
/// `DEBIAN_FRONTEND=noninteractive` keeps debconf from asking questions. When the
/// command is escalated, `Privilege::wrap` moves the variable into the argument list
/// because `sudo` does not pass the caller's environment through.
///
/// # Arguments
/// * `args`: Everything after `apt-get`, such as `["install", "-y"]`.
fn apt<I, S>(args: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandSpec::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
}

/// Builds the command that copies a staged file into a root-owned location.
///
/// `install -D` creates missing parent directories; the result is owned by
/// `root:root` with mode 644 so APT can read it.
///
/// # Arguments
/// * `source`: The staged file in the temporary directory.
/// * `destination`: Absolute target path, such as the keyring or sources list entry.
fn install_root_file(source: &Path, destination: &str) -> CommandSpec {
    CommandSpec::new("install")
        .args(["-D", "-o", "root", "-g", "root", "-m", "644"])
        .arg(source.display().to_string())
        .arg(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::command_runner::CommandOutput;
    use crate::libs::test_support::{DownloadBehavior, FakeDownloader, FakeRunner};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sudo() -> Privilege {
        Privilege::new(Some("sudo".to_string()))
    }

    fn key_downloader() -> FakeDownloader {
        FakeDownloader::new(DownloadBehavior::Write(
            b"-----BEGIN PGP PUBLIC KEY BLOCK-----".to_vec(),
        ))
    }

    #[test]
    fn installs_in_order_with_escalation() {
        let settings = EditorSettings::default();
        let mut runner = FakeRunner::succeeding();
        let mut downloader = key_downloader();

        EditorInstaller::new(&settings, sudo(), &mut runner, &mut downloader)
            .install(false)
            .unwrap();

        let rendered = runner.rendered();
        assert_eq!(rendered.len(), 8);
        assert_eq!(rendered[0], "sudo DEBIAN_FRONTEND=noninteractive apt-get update");
        assert_eq!(
            rendered[1],
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y wget gpg"
        );
        assert!(rendered[2].starts_with("gpg --batch --yes --dearmor -o "));
        assert!(rendered[3].starts_with("sudo install -D -o root -g root -m 644 "));
        assert!(rendered[3].ends_with(" /usr/share/keyrings/microsoft.gpg"));
        assert!(rendered[4].ends_with(" /etc/apt/sources.list.d/vscode.list"));
        assert_eq!(rendered[5], rendered[0]);
        assert_eq!(
            rendered[6],
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y code"
        );
        assert_eq!(
            rendered[7],
            "sudo DEBIAN_FRONTEND=noninteractive apt-get autoremove -y"
        );

        assert_eq!(downloader.requests.len(), 1);
        assert_eq!(downloader.requests[0].0, settings.key_url);
    }

    #[test]
    fn staged_repository_entry_is_signed_by_keyring() {
        let settings = EditorSettings::default();
        let captured = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&captured);
        let target = settings.repository_file.clone();
        let mut runner = FakeRunner::with_handler(move |spec| {
            if spec.args.last() == Some(&target) {
                let source = &spec.args[spec.args.len() - 2];
                *sink.borrow_mut() = fs::read_to_string(source)?;
            }
            Ok(CommandOutput::default())
        });
        let mut downloader = key_downloader();

        EditorInstaller::new(&settings, Privilege::none(), &mut runner, &mut downloader)
            .install(false)
            .unwrap();

        assert_eq!(
            captured.borrow().as_str(),
            "deb [arch=amd64 signed-by=/usr/share/keyrings/microsoft.gpg] https://packages.microsoft.com/repos/code stable main\n"
        );
    }

    #[test]
    fn first_failure_aborts_with_its_status() {
        let settings = EditorSettings::default();
        let mut runner = FakeRunner::with_handler(|spec| {
            if spec.args.iter().any(|a| a == "code") {
                return Err(InstallError::CommandFailed {
                    command: spec.display(),
                    code: 100,
                });
            }
            Ok(CommandOutput::default())
        });
        let mut downloader = key_downloader();

        let err = EditorInstaller::new(&settings, Privilege::none(), &mut runner, &mut downloader)
            .install(true)
            .unwrap_err();

        assert_eq!(err.exit_code(), 100);
        assert!(!runner.ran("autoremove"));
        assert!(!runner.ran("--version"));
    }

    #[test]
    fn key_download_failure_stops_before_dearmor() {
        let settings = EditorSettings::default();
        let mut runner = FakeRunner::succeeding();
        let mut downloader = FakeDownloader::new(DownloadBehavior::Fail);

        let err = EditorInstaller::new(&settings, Privilege::none(), &mut runner, &mut downloader)
            .install(false)
            .unwrap_err();

        assert!(matches!(err, InstallError::Download { .. }));
        assert_eq!(runner.calls.len(), 2);
        assert!(!runner.ran("--dearmor"));
    }

    #[test]
    fn failed_version_check_is_not_resolvable() {
        let settings = EditorSettings::default();
        let mut runner = FakeRunner::with_handler(|spec| {
            if spec.args.iter().any(|a| a == "--version") {
                return Err(InstallError::CommandSpawn {
                    command: spec.display(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(CommandOutput::default())
        });
        let mut downloader = key_downloader();

        let err = EditorInstaller::new(&settings, Privilege::none(), &mut runner, &mut downloader)
            .install(true)
            .unwrap_err();
        assert!(matches!(err, InstallError::NotResolvable { ref tool } if tool == "code"));
    }

    #[test]
    fn remove_purges_installed_package_and_clears_config() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(home.path().join(".config/Code/User")).unwrap();
        fs::create_dir_all(home.path().join(".vscode")).unwrap();

        let settings = EditorSettings::default();
        let mut runner = FakeRunner::with_handler(|spec| {
            if spec.program == "dpkg-query" {
                return Ok(CommandOutput {
                    stdout: "install ok installed".to_string(),
                    stderr: String::new(),
                });
            }
            Ok(CommandOutput::default())
        });
        let mut downloader = key_downloader();

        let report = EditorInstaller::new(&settings, sudo(), &mut runner, &mut downloader)
            .remove(home.path())
            .unwrap();

        assert!(report.purged);
        assert!(runner.ran("sudo DEBIAN_FRONTEND=noninteractive apt-get purge -y code"));
        assert_eq!(
            report.removed_paths,
            vec![home.path().join(".config/Code"), home.path().join(".vscode")]
        );
        assert!(!home.path().join(".config/Code").exists());
    }

    #[test]
    fn refresh_purges_then_runs_full_install() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(home.path().join(".vscode")).unwrap();

        let settings = EditorSettings::default();
        let config_dir = home.path().join(".vscode");
        let cleared_before_install = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&cleared_before_install);
        let mut runner = FakeRunner::with_handler(move |spec| {
            if spec.program == "dpkg-query" {
                return Ok(CommandOutput {
                    stdout: "install ok installed".to_string(),
                    stderr: String::new(),
                });
            }
            if spec.args.iter().any(|a| a == "update") && seen.borrow().is_none() {
                *seen.borrow_mut() = Some(!config_dir.exists());
            }
            Ok(CommandOutput::default())
        });
        let mut downloader = key_downloader();

        let report = EditorInstaller::new(&settings, Privilege::none(), &mut runner, &mut downloader)
            .refresh(home.path(), false)
            .unwrap();

        assert!(report.purged);
        assert_eq!(report.removed_paths, vec![home.path().join(".vscode")]);
        assert_eq!(*cleared_before_install.borrow(), Some(true));

        let rendered = runner.rendered();
        assert_eq!(rendered.len(), 10);
        assert!(rendered[0].starts_with("dpkg-query "));
        assert_eq!(rendered[1], "apt-get purge -y code");
        assert_eq!(rendered[2], "apt-get update");
        assert!(rendered[4].starts_with("gpg --batch --yes --dearmor -o "));
        assert_eq!(rendered[8], "apt-get install -y code");
        assert_eq!(rendered[9], "apt-get autoremove -y");
        assert_eq!(downloader.requests.len(), 1);
    }

    #[test]
    fn remove_skips_purge_for_unknown_package() {
        let home = tempfile::tempdir().unwrap();
        let settings = EditorSettings::default();
        let mut runner = FakeRunner::with_handler(|spec| {
            Err(InstallError::CommandFailed {
                command: spec.display(),
                code: 1,
            })
        });
        let mut downloader = key_downloader();

        let report = EditorInstaller::new(&settings, sudo(), &mut runner, &mut downloader)
            .remove(home.path())
            .unwrap();

        assert_eq!(report, RemovalReport::default());
        assert_eq!(runner.calls.len(), 1);
    }
}
