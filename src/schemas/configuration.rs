// Configuration schema for `config.yaml`.
//
// Every field is optional. A missing file, or a file with only some keys, falls back to
// the built-in constants below, so a bare `setup-devstack distribution miniconda` works
// on a fresh machine.

use crate::libs::command_runner::Privilege;
use crate::libs::utilities::path_helpers::{expand_path, file_name_from_url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the environment both distribution flavors create.
pub const DEFAULT_ENVIRONMENT: &str = "default_env";
/// Python runtime pinned into the created environment.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

pub const ANACONDA_VERSION: &str = "2024.10-1";
pub const ANACONDA_URL_TEMPLATE: &str =
    "https://repo.anaconda.com/archive/Anaconda3-{version}-Linux-x86_64.sh";
pub const ANACONDA_INSTALL_DIR: &str = "~/anaconda3";

pub const MINICONDA_VERSION: &str = "py311_24.9.2-0";
pub const MINICONDA_URL_TEMPLATE: &str =
    "https://repo.anaconda.com/miniconda/Miniconda3-{version}-Linux-x86_64.sh";
pub const MINICONDA_INSTALL_DIR: &str = "~/miniconda3";

/// Top-level `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevStackConfig {
    pub shell: ShellKind,
    /// Explicit profile path; derived from `shell` when absent.
    pub profile: Option<String>,
    /// Where installer artifacts are downloaded; the home directory when absent.
    pub download_dir: Option<String>,
    /// Escalation helper for privileged commands. `None` means `sudo`, `""` disables.
    pub escalate_with: Option<String>,
    pub editor: EditorSettings,
    pub distributions: DistributionOverridesByFlavor,
}

impl DevStackConfig {
    pub fn profile_path(&self, home: &Path) -> PathBuf {
        match &self.profile {
            Some(profile) => expand_path(profile),
            None => home.join(self.shell.rc_file_name()),
        }
    }

    pub fn download_dir(&self, home: &Path) -> PathBuf {
        self.download_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| home.to_path_buf())
    }

    pub fn privilege(&self) -> Privilege {
        Privilege::new(Some(
            self.escalate_with
                .clone()
                .unwrap_or_else(|| "sudo".to_string()),
        ))
    }

    /// Built-in flavor constants with the configured overrides laid on top.
    pub fn distribution(&self, flavor: DistributionFlavor) -> DistributionSettings {
        let overrides = match flavor {
            DistributionFlavor::Anaconda => &self.distributions.anaconda,
            DistributionFlavor::Miniconda => &self.distributions.miniconda,
        };
        DistributionSettings::preset(flavor).with_overrides(overrides)
    }
}

/// Shell whose profile receives the PATH line and whose hook is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    #[default]
    Bash,
    Zsh,
}

impl ShellKind {
    pub fn rc_file_name(self) -> &'static str {
        match self {
            ShellKind::Bash => ".bashrc",
            ShellKind::Zsh => ".zshrc",
        }
    }

    /// Name passed to `conda shell.<name> hook` and `conda init <name>`.
    pub fn as_str(self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
        }
    }
}

/// Vendor repository and package for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorSettings {
    pub package: String,
    pub key_url: String,
    pub keyring: String,
    pub repository_url: String,
    pub suite: String,
    pub component: String,
    pub architecture: String,
    pub repository_file: String,
    /// Download client and key tool installed before the key is imported.
    pub prerequisites: Vec<String>,
    /// Per-user directories cleared by `editor remove`.
    pub config_paths: Vec<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            package: "code".to_string(),
            key_url: "https://packages.microsoft.com/keys/microsoft.asc".to_string(),
            keyring: "/usr/share/keyrings/microsoft.gpg".to_string(),
            repository_url: "https://packages.microsoft.com/repos/code".to_string(),
            suite: "stable".to_string(),
            component: "main".to_string(),
            architecture: "amd64".to_string(),
            repository_file: "/etc/apt/sources.list.d/vscode.list".to_string(),
            prerequisites: vec!["wget".to_string(), "gpg".to_string()],
            config_paths: vec![
                "~/.config/Code".to_string(),
                "~/.vscode".to_string(),
                "~/.cache/Code".to_string(),
                "~/.local/share/code".to_string(),
            ],
        }
    }
}

impl EditorSettings {
    /// The one-line APT source entry, signed by the vendor keyring.
    pub fn repository_entry(&self) -> String {
        format!(
            "deb [arch={} signed-by={}] {} {} {}",
            self.architecture, self.keyring, self.repository_url, self.suite, self.component
        )
    }
}

/// The two distribution installers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionFlavor {
    Anaconda,
    Miniconda,
}

impl FromStr for DistributionFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anaconda" => Ok(DistributionFlavor::Anaconda),
            "miniconda" => Ok(DistributionFlavor::Miniconda),
            _ => Err(format!(
                "Invalid distribution '{s}'. Must be one of: anaconda, miniconda"
            )),
        }
    }
}

impl fmt::Display for DistributionFlavor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DistributionFlavor::Anaconda => write!(f, "anaconda"),
            DistributionFlavor::Miniconda => write!(f, "miniconda"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionOverridesByFlavor {
    pub anaconda: DistributionOverrides,
    pub miniconda: DistributionOverrides,
}

/// Optional per-flavor overrides from `config.yaml` or the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionOverrides {
    pub version: Option<String>,
    pub url_template: Option<String>,
    pub install_dir: Option<String>,
    pub python_version: Option<String>,
    pub environment: Option<String>,
    pub verify_after_configure: Option<bool>,
}

/// Everything one distribution run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSettings {
    pub flavor: String,
    pub version: String,
    /// URL with a `{version}` placeholder.
    pub url_template: String,
    pub install_dir: PathBuf,
    pub python_version: String,
    pub environment: String,
    /// Activate the new environment and check the tool resolves. Miniconda only by default.
    pub verify_after_configure: bool,
}

impl DistributionSettings {
    pub fn preset(flavor: DistributionFlavor) -> Self {
        let (version, url_template, install_dir, verify) = match flavor {
            DistributionFlavor::Anaconda => (
                ANACONDA_VERSION,
                ANACONDA_URL_TEMPLATE,
                ANACONDA_INSTALL_DIR,
                false,
            ),
            DistributionFlavor::Miniconda => (
                MINICONDA_VERSION,
                MINICONDA_URL_TEMPLATE,
                MINICONDA_INSTALL_DIR,
                true,
            ),
        };
        DistributionSettings {
            flavor: flavor.to_string(),
            version: version.to_string(),
            url_template: url_template.to_string(),
            install_dir: expand_path(install_dir),
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            verify_after_configure: verify,
        }
    }

    pub fn with_overrides(mut self, overrides: &DistributionOverrides) -> Self {
        if let Some(version) = &overrides.version {
            self.version = version.clone();
        }
        if let Some(template) = &overrides.url_template {
            self.url_template = template.clone();
        }
        if let Some(dir) = &overrides.install_dir {
            self.install_dir = expand_path(dir);
        }
        if let Some(python) = &overrides.python_version {
            self.python_version = python.clone();
        }
        if let Some(environment) = &overrides.environment {
            self.environment = environment.clone();
        }
        if let Some(verify) = overrides.verify_after_configure {
            self.verify_after_configure = verify;
        }
        self
    }

    pub fn download_url(&self) -> String {
        self.url_template.replace("{version}", &self.version)
    }

    pub fn artifact_name(&self) -> Option<String> {
        file_name_from_url(&self.download_url()).map(str::to_string)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.install_dir.join("bin")
    }

    pub fn condabin_dir(&self) -> PathBuf {
        self.install_dir.join("condabin")
    }

    pub fn conda_executable(&self) -> PathBuf {
        self.bin_dir().join("conda")
    }

    pub fn environment_bin_dir(&self, name: &str) -> PathBuf {
        self.install_dir.join("envs").join(name).join("bin")
    }

    /// The single line appended to the shell profile.
    pub fn profile_path_line(&self) -> String {
        format!("export PATH=\"{}:$PATH\"", self.bin_dir().display())
    }
}
