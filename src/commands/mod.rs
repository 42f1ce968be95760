// Register application subcommands.
// Each module corresponds to a specific `setup-devstack` command-line action.

// Installs one of the conda distributions.
pub mod distribution;
// Installs or removes the editor package.
pub mod editor;
// Writes a default configuration file.
pub mod generate;
// Displays the version of setup-devstack.
pub mod version;
