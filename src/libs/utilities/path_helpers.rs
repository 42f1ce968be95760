// Path expansion and executable lookup.

use crate::errors::InstallError;
use crate::log_debug;
use std::path::{Path, PathBuf};

/// Expands `~` and `$VARS` in a configured path.
///
/// Unknown variables are left untouched rather than failing, so a typo in the
/// config shows up as a literal path in the logs.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            log_debug!("[SDS::Paths] Could not expand '{}': {}. Using tilde expansion only.", path, e);
            PathBuf::from(shellexpand::tilde(path).into_owned())
        }
    }
}

/// Like `expand_path`, but `~` means `home` instead of the process's home directory.
pub fn expand_with_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => expand_path(path),
    }
}

/// The invoking user's home directory.
pub fn home_dir() -> Result<PathBuf, InstallError> {
    dirs::home_dir().ok_or(InstallError::HomeNotFound)
}

/// Returns the last path segment of a URL, which names the downloaded artifact.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
}

/// A regular file with at least one executable bit set.
pub fn is_executable_file(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) if meta.is_file() => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                meta.permissions().mode() & 0o111 != 0
            }
            #[cfg(not(unix))]
            {
                true
            }
        }
        _ => false,
    }
}

/// First match for `name` across `dirs`, in order.
pub fn find_on_search_path<'a, I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable_file(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn url_file_name_ignores_query_and_fragment() {
        assert_eq!(
            file_name_from_url("https://repo.anaconda.com/archive/Anaconda3-2024.10-1-Linux-x86_64.sh"),
            Some("Anaconda3-2024.10-1-Linux-x86_64.sh")
        );
        assert_eq!(
            file_name_from_url("https://example.com/dl/tool.sh?token=abc#top"),
            Some("tool.sh")
        );
        assert_eq!(file_name_from_url("https://example.com/"), None);
        assert_eq!(file_name_from_url("https:"), None);
    }

    #[test]
    fn expands_home_and_variables() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/anaconda3"), home.join("anaconda3"));
        assert_eq!(expand_path("/opt/conda"), PathBuf::from("/opt/conda"));
    }

    #[cfg(unix)]
    #[test]
    fn search_path_lookup_requires_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let plain = first.path().join("conda");
        fs::write(&plain, "#!/bin/sh\n").unwrap();
        let exec = second.path().join("conda");
        fs::write(&exec, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o755)).unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_on_search_path("conda", &dirs), Some(exec));
        assert_eq!(find_on_search_path("python", &dirs), None);
    }
}
