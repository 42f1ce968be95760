// src/commands/generate.rs
// Writes a starter `config.yaml` so users can see every knob and its default.

use crate::libs::paths::resolve_config_path;
use crate::{log_info, log_warn};
use anyhow::Context;
use colored::Colorize;
use std::fs;

/// Default `config.yaml`. Every value shown is the built-in default.
pub const CONFIG_TEMPLATE: &str = r#"# setup-devstack configuration. Every key is optional.
shell: bash                      # bash or zsh; picks the profile and the conda hook
# profile: ~/.bashrc             # explicit profile path
# download_dir: ~                # where installer artifacts are downloaded
escalate_with: sudo              # helper for privileged commands; "" runs them directly

editor:
  package: code
  key_url: https://packages.microsoft.com/keys/microsoft.asc
  keyring: /usr/share/keyrings/microsoft.gpg
  repository_url: https://packages.microsoft.com/repos/code
  suite: stable
  component: main
  architecture: amd64
  repository_file: /etc/apt/sources.list.d/vscode.list
  prerequisites: [wget, gpg]
  config_paths:
    - ~/.config/Code
    - ~/.vscode
    - ~/.cache/Code
    - ~/.local/share/code

distributions:
  anaconda:
    version: 2024.10-1
    url_template: https://repo.anaconda.com/archive/Anaconda3-{version}-Linux-x86_64.sh
    install_dir: ~/anaconda3
    python_version: "3.11"
    environment: default_env
    verify_after_configure: false
  miniconda:
    version: py311_24.9.2-0
    url_template: https://repo.anaconda.com/miniconda/Miniconda3-{version}-Linux-x86_64.sh
    install_dir: ~/miniconda3
    python_version: "3.11"
    environment: default_env
    verify_after_configure: true
"#;

pub fn run(config_path: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = resolve_config_path(config_path);

    if path.exists() && !force {
        log_warn!(
            "{} already exists. Use --force to overwrite it.",
            path.display().to_string().yellow()
        );
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log_info!("Wrote {}", path.display().to_string().green());
    Ok(())
}
