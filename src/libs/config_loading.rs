use crate::schemas::configuration::DevStackConfig;
use crate::{log_debug, log_warn};
use anyhow::Context;
use colored::Colorize;
use std::fs;
use std::io;
use std::path::Path;

/// Loads `config.yaml`.
///
/// A missing file is not an error: every setting has a built-in default. A file that
/// exists but cannot be read or parsed is, so a typo never silently installs the
/// wrong thing.
pub fn load_config(path: &Path) -> anyhow::Result<DevStackConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log_debug!(
                "[SDS::Config] No configuration at {}; using built-in defaults",
                path.display()
            );
            return Ok(DevStackConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    if contents.trim().is_empty() {
        log_warn!(
            "[SDS::Config] {} is empty; using built-in defaults",
            path.display().to_string().yellow()
        );
        return Ok(DevStackConfig::default());
    }

    let config: DevStackConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse {}; please check its YAML syntax", path.display()))?;
    log_debug!(
        "[SDS::Config] Loaded configuration from {}",
        path.display().to_string().green()
    );
    Ok(config)
}
