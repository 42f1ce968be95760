// Low-level helpers shared by the installers.

// HTTP downloads behind the `Downloader` trait.
pub mod download;
// Path expansion and executable lookup.
pub mod path_helpers;
