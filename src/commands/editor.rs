// `setup-devstack editor install|remove|refresh`.

use crate::installers::editor::EditorInstaller;
use crate::libs::command_runner::{Privilege, SystemRunner};
use crate::libs::config_loading::load_config;
use crate::libs::paths::resolve_config_path;
use crate::libs::utilities::download::HttpDownloader;
use crate::libs::utilities::path_helpers::home_dir;
use crate::schemas::configuration::DevStackConfig;
use crate::{log_debug, log_info};
use colored::Colorize;
use dialoguer::Confirm;

pub fn install(config_path: Option<String>, verify: bool, no_sudo: bool) -> anyhow::Result<()> {
    let config = load_config(&resolve_config_path(config_path))?;
    let privilege = privilege_for(&config, no_sudo);

    let mut runner = SystemRunner;
    let mut downloader = HttpDownloader::new();
    EditorInstaller::new(&config.editor, privilege, &mut runner, &mut downloader).install(verify)?;
    Ok(())
}

pub fn remove(config_path: Option<String>, yes: bool, no_sudo: bool) -> anyhow::Result<()> {
    let config = load_config(&resolve_config_path(config_path))?;

    let prompt = format!(
        "Purge '{}' and delete its configuration directories?",
        config.editor.package
    );
    if !yes && !confirm(&prompt)? {
        log_info!("Removal cancelled.");
        return Ok(());
    }

    let home = home_dir()?;
    let privilege = privilege_for(&config, no_sudo);
    let mut runner = SystemRunner;
    let mut downloader = HttpDownloader::new();
    let report =
        EditorInstaller::new(&config.editor, privilege, &mut runner, &mut downloader).remove(&home)?;

    log_info!(
        "Removed {} configuration path(s){}",
        report.removed_paths.len().to_string().bold(),
        if report.purged { " and purged the package" } else { "" }
    );
    Ok(())
}

/// Purges the editor and its configuration, then installs it again.
pub fn refresh(config_path: Option<String>, yes: bool, verify: bool, no_sudo: bool) -> anyhow::Result<()> {
    let config = load_config(&resolve_config_path(config_path))?;

    let prompt = format!(
        "Purge '{}', delete its configuration and install it again?",
        config.editor.package
    );
    if !yes && !confirm(&prompt)? {
        log_info!("Refresh cancelled.");
        return Ok(());
    }

    let home = home_dir()?;
    let privilege = privilege_for(&config, no_sudo);
    let mut runner = SystemRunner;
    let mut downloader = HttpDownloader::new();
    let report = EditorInstaller::new(&config.editor, privilege, &mut runner, &mut downloader)
        .refresh(&home, verify)?;

    log_info!(
        "Reinstalled {} after clearing {} configuration path(s)",
        config.editor.package.green(),
        report.removed_paths.len().to_string().bold()
    );
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn privilege_for(config: &DevStackConfig, no_sudo: bool) -> Privilege {
    if no_sudo {
        log_debug!("[SDS::Editor] --no-sudo given; running privileged commands directly");
        Privilege::none()
    } else {
        config.privilege()
    }
}
