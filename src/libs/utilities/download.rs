// HTTP downloads for installer artifacts and signing keys.

use crate::errors::InstallError;
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("setup-devstack/", env!("CARGO_PKG_VERSION"));

/// Fetches a URL into a local file.
pub trait Downloader {
    fn download(&mut self, url: &str, dest: &Path) -> Result<(), InstallError>;
}

/// `ureq`-backed downloader that streams the body straight to disk.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(Duration::from_secs(300))
            .build();
        HttpDownloader { agent }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn download(&mut self, url: &str, dest: &Path) -> Result<(), InstallError> {
        log_info!("[SDS::Download] Fetching {}", url.blue());

        let response = self.agent.get(url).call().map_err(|e| {
            log_error!("[SDS::Download] HTTP request failed for {}: {}", url.red(), e);
            InstallError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let bytes = write_body(response.into_reader(), dest).map_err(|e| InstallError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        log_debug!(
            "[SDS::Download] Saved {} ({} bytes) to {}",
            url,
            bytes,
            dest.display().to_string().green()
        );
        Ok(())
    }
}

/// Streams a response body into `dest`, creating parent directories as needed.
///
/// On a read or write error the partially written file is deleted, so a truncated
/// download never passes for a complete one.
///
/// # Returns
/// The number of bytes written.
fn write_body(mut reader: impl Read, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(dest)?;
    match io::copy(&mut reader, &mut file) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(file);
            if let Err(remove_err) = fs::remove_file(dest) {
                log_warn!(
                    "[SDS::Download] Could not remove partial download {}: {}",
                    dest.display(),
                    remove_err
                );
            }
            Err(e)
        }
    }
}
