// Shared plumbing used by the commands and installers.

// External command execution and privilege escalation.
pub mod command_runner;
// Loads `config.yaml`.
pub mod config_loading;
// Resolves the configuration file location.
pub mod paths;
pub mod utilities;

#[cfg(test)]
pub mod test_support;
