use crate::schemas::configuration::DistributionFlavor;
use clap::{Parser, Subcommand};

/// Defines the command-line interface for `setup-devstack`.
#[derive(Parser, Debug)]
#[command(name = "setup-devstack")]
#[command(about = "Unattended installers for VS Code and the Anaconda/Miniconda distributions", long_about = None)]
pub struct Cli {
    /// Enables detailed debug output.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Path to config.yaml (defaults to ~/.setup-devstack/config.yaml).
    #[arg(long, global = true, env = "SETUP_DEVSTACK_CONFIG")]
    pub(crate) config: Option<String>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install, remove or refresh the VS Code editor package.
    Editor {
        #[command(subcommand)]
        action: EditorCommands,
    },
    /// Install a scientific-Python distribution [possible values: anaconda, miniconda].
    Distribution {
        flavor: DistributionFlavor,
        /// Install into this directory instead of the flavor's default.
        #[arg(long)]
        install_dir: Option<String>,
        /// Installer version to download.
        #[arg(long)]
        version: Option<String>,
        /// Python version pinned into the created environment.
        #[arg(long)]
        python: Option<String>,
    },
    /// Writes a default config.yaml.
    Generate {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show the current version and check for a newer release.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum EditorCommands {
    /// Add the vendor repository and install the editor package.
    Install {
        /// Run the editor's `--version` afterwards to confirm it works.
        #[arg(long)]
        verify: bool,
        /// Run privileged commands without an escalation helper.
        #[arg(long)]
        no_sudo: bool,
    },
    /// Purge the editor package and remove its per-user configuration.
    Remove {
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
        /// Run privileged commands without an escalation helper.
        #[arg(long)]
        no_sudo: bool,
    },
    /// Remove the editor and its configuration, then install it again.
    Refresh {
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
        /// Run the editor's `--version` afterwards to confirm it works.
        #[arg(long)]
        verify: bool,
        /// Run privileged commands without an escalation helper.
        #[arg(long)]
        no_sudo: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_distribution_with_overrides() {
        let cli = Cli::try_parse_from([
            "setup-devstack",
            "--debug",
            "distribution",
            "miniconda",
            "--install-dir",
            "/opt/mc",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Distribution {
                flavor,
                install_dir,
                version,
                ..
            } => {
                assert_eq!(flavor, DistributionFlavor::Miniconda);
                assert_eq!(install_dir.as_deref(), Some("/opt/mc"));
                assert!(version.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_flavor() {
        assert!(Cli::try_parse_from(["setup-devstack", "distribution", "mamba"]).is_err());
    }

    #[test]
    fn parses_editor_subcommands() {
        let cli =
            Cli::try_parse_from(["setup-devstack", "editor", "remove", "--yes", "--no-sudo"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Editor {
                action: EditorCommands::Remove {
                    yes: true,
                    no_sudo: true
                }
            }
        ));
    }

    #[test]
    fn parses_editor_refresh() {
        let cli = Cli::try_parse_from(["setup-devstack", "editor", "refresh", "-y", "--verify"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Editor {
                action: EditorCommands::Refresh {
                    yes: true,
                    verify: true,
                    no_sudo: false
                }
            }
        ));
    }
}
