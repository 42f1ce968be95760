//! # Environment Description
//!
//! Installer steps never touch the process environment or the shell profile directly.
//! They receive an `EnvironmentDescription`, change it, and hand it on. The real world
//! sees those changes only at two boundaries:
//!
//! - child processes get the described `PATH` and variables through
//!   [`EnvironmentDescription::apply_to`], and
//! - pending profile lines are written by the profile writer in `installers::shellrc`.
//!
//! This keeps every configuring step testable without a real shell.

use crate::errors::InstallError;
use crate::libs::command_runner::CommandSpec;
use crate::libs::utilities::path_helpers::{find_on_search_path, home_dir};
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Variable naming the active named environment, as conda's own activation sets it.
pub const ACTIVE_ENV_VAR: &str = "CONDA_DEFAULT_ENV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescription {
    pub home: PathBuf,
    /// Ordered search path; earlier entries win.
    pub search_path: Vec<PathBuf>,
    /// Variables exported on top of the inherited environment.
    pub variables: BTreeMap<String, String>,
    /// Shell profile that receives appended lines.
    pub profile: PathBuf,
    /// Lines waiting to be appended to `profile`.
    pub pending_profile_lines: Vec<String>,
    pub active_environment: Option<String>,
}

impl EnvironmentDescription {
    /// Captures the invoking process: home directory and `PATH`.
    pub fn from_process(profile: PathBuf) -> Result<Self, InstallError> {
        let home = home_dir()?;
        let search_path = env::var_os("PATH")
            .map(|raw| env::split_paths(&raw).collect())
            .unwrap_or_default();
        Ok(Self::new(home, search_path, profile))
    }

    pub fn new(home: PathBuf, search_path: Vec<PathBuf>, profile: PathBuf) -> Self {
        EnvironmentDescription {
            home,
            search_path,
            variables: BTreeMap::new(),
            profile,
            pending_profile_lines: Vec::new(),
            active_environment: None,
        }
    }

    /// Puts `dir` at the front of the search path, dropping any later duplicate.
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.search_path.retain(|existing| existing != &dir);
        self.search_path.insert(0, dir);
    }

    pub fn remove_path(&mut self, dir: &Path) {
        self.search_path.retain(|existing| existing != dir);
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Queues a line for the profile. Nothing is written until the boundary.
    pub fn queue_profile_line(&mut self, line: impl Into<String>) {
        self.pending_profile_lines.push(line.into());
    }

    /// Switches the active named environment.
    ///
    /// `bin_dir` is that environment's executable directory; the previous environment's
    /// directory (if any) is taken off the search path first.
    pub fn activate(&mut self, name: &str, bin_dir: PathBuf, previous_bin_dir: Option<&Path>) {
        if let Some(previous) = previous_bin_dir {
            self.remove_path(previous);
        }
        self.prepend_path(bin_dir);
        self.set_var(ACTIVE_ENV_VAR, name);
        self.active_environment = Some(name.to_string());
    }

    /// The described search path in `PATH` syntax.
    pub fn search_path_value(&self) -> Result<OsString, InstallError> {
        env::join_paths(&self.search_path)
            .map_err(|e| InstallError::Config(format!("search path entry cannot be joined: {}", e)))
    }

    /// Where `name` would resolve, if anywhere.
    pub fn resolve_executable(&self, name: &str) -> Option<PathBuf> {
        find_on_search_path(name, &self.search_path)
    }

    /// Renders `path` with the home directory shortened to `~`, for user-facing messages.
    pub fn tilde_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        }
    }

    /// Gives a child process the described `PATH` and variables.
    pub fn apply_to(&self, spec: CommandSpec) -> Result<CommandSpec, InstallError> {
        let mut spec = spec.env("PATH", self.search_path_value()?);
        for (key, value) in &self.variables {
            spec = spec.env(key.clone(), value.clone());
        }
        Ok(spec)
    }
}

/// Pulls `export NAME='value'` assignments out of shell hook output.
///
/// Only plain assignments are understood: single-quoted, double-quoted or bare values,
/// optionally written as `\export`. Anything else (functions, conditionals) is skipped.
pub fn parse_exports(script: &str) -> Vec<(String, String)> {
    script
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line
                .strip_prefix("\\export ")
                .or_else(|| line.strip_prefix("export "))?;
            let (name, raw_value) = rest.split_once('=')?;
            let name = name.trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            let raw_value = raw_value.trim();
            let value = if let Some(inner) = raw_value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
            {
                inner
            } else if let Some(inner) = raw_value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
            {
                inner
            } else if raw_value.contains(char::is_whitespace) || raw_value.contains('$') {
                return None;
            } else {
                raw_value
            };
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> EnvironmentDescription {
        EnvironmentDescription::new(
            PathBuf::from("/home/dev"),
            vec![PathBuf::from("/usr/bin"), PathBuf::from("/bin")],
            PathBuf::from("/home/dev/.bashrc"),
        )
    }

    #[test]
    fn prepend_moves_existing_entry_to_front() {
        let mut env = description();
        env.prepend_path("/bin");
        assert_eq!(
            env.search_path,
            vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")]
        );
    }

    #[test]
    fn activation_swaps_environment_directories() {
        let mut env = description();
        let envs = PathBuf::from("/home/dev/miniconda3/envs/default_env/bin");
        env.activate("default_env", envs.clone(), None);
        assert_eq!(env.search_path[0], envs);
        assert_eq!(env.variables.get(ACTIVE_ENV_VAR).map(String::as_str), Some("default_env"));

        let base = PathBuf::from("/home/dev/miniconda3/bin");
        env.activate("base", base.clone(), Some(envs.as_path()));
        assert_eq!(env.search_path[0], base);
        assert!(!env.search_path.contains(&envs));
        assert_eq!(env.active_environment.as_deref(), Some("base"));
    }

    #[test]
    fn apply_to_sets_path_and_variables() {
        let mut env = description();
        env.set_var("CONDA_EXE", "/home/dev/miniconda3/bin/conda");
        let spec = env.apply_to(CommandSpec::new("conda").arg("info")).unwrap();
        assert_eq!(spec.env[0].0, "PATH");
        assert_eq!(spec.env[0].1, OsString::from("/usr/bin:/bin"));
        assert_eq!(spec.env[1].0, "CONDA_EXE");
    }

    #[test]
    fn paths_under_home_are_shortened() {
        let env = description();
        assert_eq!(env.tilde_path(Path::new("/home/dev/.bashrc")), "~/.bashrc");
        assert_eq!(env.tilde_path(Path::new("/home/dev")), "~");
        assert_eq!(env.tilde_path(Path::new("/opt/conda")), "/opt/conda");
    }

    #[test]
    fn parses_hook_exports() {
        let hook = r#"
export CONDA_EXE='/home/dev/miniconda3/bin/conda'
export _CE_M=''
\export CONDA_PYTHON_EXE="/home/dev/miniconda3/bin/python"
export CONDA_SHLVL=0
__conda_exe() (
    "$CONDA_EXE" $_CE_M $_CE_CONDA "$@"
)
export PATH=/x:$PATH
"#;
        let exports = parse_exports(hook);
        assert_eq!(
            exports,
            vec![
                ("CONDA_EXE".to_string(), "/home/dev/miniconda3/bin/conda".to_string()),
                ("_CE_M".to_string(), String::new()),
                (
                    "CONDA_PYTHON_EXE".to_string(),
                    "/home/dev/miniconda3/bin/python".to_string()
                ),
                ("CONDA_SHLVL".to_string(), "0".to_string()),
            ]
        );
    }
}
