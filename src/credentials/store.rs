use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::envelope::{Envelope, UserRecord, V1Envelope};
use super::migrate::migrate;
use crate::error::{CliError, Result};

/// Credential file keyed by API host.
///
/// Every operation is a fresh read of the file; nothing is cached between
/// calls. There is no locking: two invocations updating the file at the same
/// time race and the last writer wins. Each write lands atomically, so a
/// reader sees either the old or the new file, never a truncated one.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored record for `host`, or `None` when the file, the host key or the
    /// record itself is missing. A legacy file is upgraded on disk first.
    pub fn load(&self, host: &str) -> Result<Option<UserRecord>> {
        let Some(envelope) = self.read()? else {
            debug!(path = %self.path.display(), "no credential file");
            return Ok(None);
        };

        let envelope = match envelope {
            Envelope::V1(envelope) => envelope,
            legacy @ Envelope::Legacy(_) => {
                debug!("credential file should be updated");
                let migrated = migrate(legacy, host)?;
                self.write(&migrated)?;
                info!(path = %self.path.display(), "credential file migrated to v1");
                migrated
            }
        };

        let entry = envelope.entry(host);
        debug!(host, ?entry, "credential lookup");
        Ok(entry.user().cloned())
    }

    /// Insert or replace the record for `host`, leaving other hosts intact.
    pub fn store(&self, host: &str, user: &UserRecord) -> Result<()> {
        let mut envelope = self.existing(host)?;
        envelope.insert(host, user.clone());
        self.write(&envelope)
    }

    /// Drop the record for `host`. Returns whether there was anything to drop.
    pub fn remove(&self, host: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut envelope = self.existing(host)?;
        if !envelope.remove(host) {
            return Ok(false);
        }
        self.write(&envelope)?;
        Ok(true)
    }

    fn read(&self) -> Result<Option<Envelope>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Envelope::decode(&content).map(Some)
    }

    /// Envelope to update in place. A missing file is an empty envelope; a
    /// corrupted one is discarded and recreated. A file written by a newer
    /// CLI is an error and stays untouched.
    fn existing(&self, host: &str) -> Result<V1Envelope> {
        let decoded = match self.read() {
            Ok(Some(envelope)) => migrate(envelope, host),
            Ok(None) => return Ok(V1Envelope::empty()),
            Err(e) => Err(e),
        };

        match decoded {
            Ok(envelope) => Ok(envelope),
            Err(CliError::DataCorruption(reason)) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "error while reading credential file, recreating a new one"
                );
                Ok(V1Envelope::empty())
            }
            Err(e) => Err(e),
        }
    }

    fn write(&self, envelope: &V1Envelope) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, envelope)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.persist(&self.path).map_err(|e| CliError::Io(e.error))?;
        debug!(path = %self.path.display(), "credential file written");
        Ok(())
    }
}
