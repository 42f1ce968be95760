// Resolves where `config.yaml` lives.
use crate::libs::utilities::path_helpers::expand_path;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::path::PathBuf;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "~/.setup-devstack/config.yaml";

/// Resolves the configuration file path, falling back to the default location.
pub fn resolve_config_path(config_path: Option<String>) -> PathBuf {
    log_debug!("[SDS::Paths] Requested config path: {:?}", config_path);
    let resolved = expand_path(config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    log_info!(
        "Using configuration file: {}",
        resolved.display().to_string().cyan()
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_default() {
        assert_eq!(
            resolve_config_path(Some("/etc/sds.yaml".to_string())),
            PathBuf::from("/etc/sds.yaml")
        );
        let default = resolve_config_path(None);
        assert!(default.ends_with(".setup-devstack/config.yaml"));
        assert!(!default.starts_with("~"));
    }
}
