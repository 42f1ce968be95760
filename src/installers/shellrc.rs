// Shell profile handling.
//
// This is the only place that writes the user's profile. Steps queue lines on the
// `EnvironmentDescription`; `flush_profile_lines` appends them. `source_profile` replays
// the profile's PATH exports back into the description, which is what re-sourcing the
// file would do to a live shell.
//
// Appends are not de-duplicated: the install-directory guard is what keeps repeat runs
// from adding the same line twice.

use crate::errors::InstallError;
use crate::schemas::environment::EnvironmentDescription;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Appends every queued line to the profile and clears the queue.
///
/// Returns how many lines were written.
pub fn flush_profile_lines(env: &mut EnvironmentDescription) -> Result<usize, InstallError> {
    if env.pending_profile_lines.is_empty() {
        log_debug!("[SDS::Profile] Nothing queued for {}", env.profile.display());
        return Ok(0);
    }

    if let Some(parent) = env.profile.parent() {
        fs::create_dir_all(parent)?;
    }

    // Keep our line from being glued onto an unterminated last line.
    let needs_newline = match fs::read(&env.profile) {
        Ok(existing) => !existing.is_empty() && !existing.ends_with(b"\n"),
        Err(_) => false,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&env.profile)?;
    if needs_newline {
        writeln!(file)?;
    }

    let lines = std::mem::take(&mut env.pending_profile_lines);
    for line in &lines {
        writeln!(file, "{}", line)?;
        log_info!(
            "[SDS::Profile] Appended to {}: {}",
            env.profile.display().to_string().cyan(),
            line.green()
        );
    }
    Ok(lines.len())
}

/// Replays `export PATH="<dir>:$PATH"` lines from the profile into the description.
///
/// Lines are applied top to bottom, so the last export ends up first on the search path.
pub fn source_profile(env: &mut EnvironmentDescription) -> Result<(), InstallError> {
    let contents = match fs::read_to_string(&env.profile) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log_debug!("[SDS::Profile] {} does not exist; nothing to source", env.profile.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut applied = 0usize;
    for dir in contents.lines().filter_map(path_prepend_target) {
        env.prepend_path(dir);
        applied += 1;
    }
    log_debug!(
        "[SDS::Profile] Sourced {}: {} PATH export(s) applied",
        env.profile.display(),
        applied
    );
    Ok(())
}

/// The directory a `PATH` prepend line adds, if the line is one.
fn path_prepend_target(line: &str) -> Option<PathBuf> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let value = line.strip_prefix("export ")?.trim().strip_prefix("PATH=")?;
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let dir = value
        .strip_suffix(":$PATH")
        .or_else(|| value.strip_suffix(":${PATH}"))?;
    if dir.is_empty() || dir.contains('$') {
        return None;
    }
    Some(PathBuf::from(dir))
}
