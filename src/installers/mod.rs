// The installer flows. Each one is a standalone sequence of steps; they share only the
// command runner, downloader and error type.

/// Anaconda/Miniconda: guard, download, batch install, shell configuration.
pub(crate) mod distribution;

/// VS Code from the vendor APT repository.
pub(crate) mod editor;

/// Appending to and re-sourcing the shell profile.
pub(crate) mod shellrc;
