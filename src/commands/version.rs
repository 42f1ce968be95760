// This file handles version checking for `setup-devstack`.
// It prints the compiled-in version and compares it against the latest release on GitHub.

use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use serde::Deserialize;
use std::time::Duration;

// Release checks follow the `repository` key of Cargo.toml.
const REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");

/// The part of a GitHub release response we care about.
#[derive(Deserialize)]
struct GitHubRelease {
    tag_name: String,
}

/// Turns `https://github.com/<owner>/<name>` into its latest-release API endpoint.
///
/// # Returns
/// `None` when the repository is unset or not hosted on GitHub.
fn release_api_url(repository: &str) -> Option<String> {
    let path = repository
        .trim()
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .strip_prefix("https://github.com/")?;
    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!(
        "https://api.github.com/repos/{}/{}/releases/latest",
        owner, name
    ))
}

fn get_latest_github_release(url: &str) -> Result<String, Box<dyn std::error::Error>> {
    let agent = ureq::AgentBuilder::new()
        .user_agent("setup-devstack-version-checker")
        .timeout(Duration::from_secs(10))
        .build();

    let response = agent.get(url).call()?;

    let is_json = response
        .header("content-type")
        .is_some_and(|value| value.contains("application/json"));
    if !is_json {
        return Err("GitHub returned unexpected content type, not JSON.".into());
    }

    let release: GitHubRelease = response.into_json()?;
    Ok(release.tag_name)
}

/// `v1.2.3` and `1.2.3` name the same release.
fn is_same_version(local: &str, latest: &str) -> bool {
    local.trim().trim_start_matches('v') == latest.trim().trim_start_matches('v')
}

pub fn run() -> anyhow::Result<()> {
    let local_version = env!("CARGO_PKG_VERSION");
    log_info!("setup-devstack version: {}", local_version.bold());

    let Some(url) = release_api_url(REPOSITORY) else {
        log_debug!("No GitHub repository configured; skipping the release check.");
        return Ok(());
    };

    match get_latest_github_release(&url) {
        Ok(latest_version) => {
            log_info!("Latest GitHub release: {}", latest_version);
            if is_same_version(local_version, &latest_version) {
                log_info!("You are running the latest version.");
            } else {
                log_warn!("A different release is available. Consider upgrading.");
            }
        }
        Err(e) => {
            log_warn!("Failed to fetch the latest release from GitHub: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_prefix_is_ignored() {
        assert!(is_same_version("0.3.0", "v0.3.0"));
        assert!(is_same_version("0.3.0\n", "0.3.0"));
        assert!(!is_same_version("0.3.0", "v0.4.0"));
    }

    #[test]
    fn release_url_needs_a_github_repository() {
        assert_eq!(
            release_api_url("https://github.com/acme/setup-devstack.git"),
            Some("https://api.github.com/repos/acme/setup-devstack/releases/latest".to_string())
        );
        assert_eq!(release_api_url(""), None);
        assert_eq!(release_api_url("https://gitlab.com/acme/setup-devstack"), None);
        assert_eq!(release_api_url("https://github.com/acme"), None);
    }
}
