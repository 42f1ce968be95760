// `setup-devstack distribution <flavor>`: wires the real runner, downloader and process
// environment into the distribution installer.

use crate::installers::distribution::{DistributionInstaller, InstallOutcome};
use crate::libs::command_runner::SystemRunner;
use crate::libs::config_loading::load_config;
use crate::libs::paths::resolve_config_path;
use crate::libs::utilities::download::HttpDownloader;
use crate::libs::utilities::path_helpers::home_dir;
use crate::schemas::configuration::{DistributionFlavor, DistributionOverrides};
use crate::schemas::environment::EnvironmentDescription;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;

pub fn run(
    config_path: Option<String>,
    flavor: DistributionFlavor,
    install_dir: Option<String>,
    version: Option<String>,
    python: Option<String>,
) -> anyhow::Result<()> {
    log_debug!("Entered distribution::run() for {}", flavor);

    let config = load_config(&resolve_config_path(config_path))?;
    let cli_overrides = DistributionOverrides {
        version,
        install_dir,
        python_version: python,
        ..Default::default()
    };
    let settings = config.distribution(flavor).with_overrides(&cli_overrides);

    match serde_json::to_string_pretty(&settings) {
        Ok(pretty) => log_debug!("[SDS::Distribution] Resolved settings:\n{}", pretty),
        Err(e) => log_warn!("[SDS::Distribution] Failed to pretty-print settings: {}", e),
    }

    let home = home_dir()?;
    let profile = config.profile_path(&home);
    let env = EnvironmentDescription::from_process(profile)?;

    let mut runner = SystemRunner;
    let mut downloader = HttpDownloader::new();
    let report = DistributionInstaller::new(
        &settings,
        config.shell,
        config.download_dir(&home),
        &mut runner,
        &mut downloader,
    )
    .run(env)?;

    let env = &report.environment;
    match report.outcome {
        InstallOutcome::AlreadyInstalled => log_info!(
            "{} is already installed at {}",
            flavor.to_string().bold(),
            settings.install_dir.display().to_string().green()
        ),
        InstallOutcome::Installed => {
            log_info!("{} installed!!", flavor.to_string().green());
            if let Some(active) = env.active_environment.as_deref() {
                log_info!("Active environment after setup: {}", active.bold());
            }
            log_info!(
                "Open a new shell or run `source {}` to pick up the new PATH",
                env.tilde_path(&env.profile).cyan()
            );
        }
    }
    log_debug!("Final phases: {:?}", report.phases);
    if let Some(first) = env.search_path.first() {
        log_debug!("Search path now starts with {}", env.tilde_path(first));
    }
    Ok(())
}
