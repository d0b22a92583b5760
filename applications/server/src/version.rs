//! Version history store.
//!
//! Before a user's canonical snapshot is overwritten, the previous document
//! is archived to `library-{seq:06}-{timestamp}.json` in the user directory
//! and recorded in `manifest.json`, an explicit persisted index keyed by a
//! monotonic sequence number. Entries are append-only and never deleted.
//!
//! Retention is write-only: nothing in the protocol ever reads an entry
//! back. The log exposes only append and most-recent access.
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Manifest file name inside each user directory
pub const MANIFEST_FILE: &str = "manifest.json";

const ENTRY_PREFIX: &str = "library-";
const ENTRY_SUFFIX: &str = ".json";

/// One archived snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Monotonic sequence number, starting at 1
    pub seq: u64,

    /// Creation time, `YYYYMMDDHHMMSS` in UTC
    pub timestamp: String,

    /// File name of the archived snapshot within the user directory
    pub filename: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: Vec<VersionEntry>,
}

/// Append-only version log for one user.
#[derive(Debug)]
pub struct VersionLog {
    dir: PathBuf,
    entries: Vec<VersionEntry>,
}

impl VersionLog {
    /// Open the log for a user directory.
    ///
    /// Reads `manifest.json` when present; otherwise reconstructs the log by
    /// scanning for archived snapshot file names (directories written before
    /// the manifest existed) and persists nothing until the next append.
    pub async fn open(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let entries = if manifest_path.exists() {
            let raw = fs::read_to_string(&manifest_path).await?;
            let manifest: Manifest = serde_json::from_str(&raw)
                .map_err(|e| ServerError::storage(format!("unreadable manifest: {e}")))?;
            manifest.entries
        } else {
            Self::scan(dir).await?
        };

        debug!(dir = %dir.display(), entries = entries.len(), "version log opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    /// Rebuild entries from `library-{seq}-{timestamp}.json` file names.
    async fn scan(dir: &Path) -> Result<Vec<VersionEntry>> {
        let mut entries = Vec::new();
        let mut dir_entries = fs::read_dir(dir).await?;
        while let Some(entry) = dir_entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some((seq, timestamp)) = parse_entry_name(&name) {
                entries.push(VersionEntry {
                    seq,
                    timestamp,
                    filename: name,
                });
            }
        }
        entries.sort_by_key(|e| e.seq);
        if !entries.is_empty() {
            info!(
                dir = %dir.display(),
                entries = entries.len(),
                "reconstructed version log from snapshot files"
            );
        }
        Ok(entries)
    }

    /// Archive one snapshot document and persist the updated manifest.
    pub async fn append(&mut self, document: &str) -> Result<VersionEntry> {
        let seq = self.entries.last().map_or(0, |e| e.seq) + 1;
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
        let filename = format!("{ENTRY_PREFIX}{seq:06}-{timestamp}{ENTRY_SUFFIX}");

        fs::write(self.dir.join(&filename), document).await?;

        let entry = VersionEntry {
            seq,
            timestamp,
            filename,
        };
        self.entries.push(entry.clone());
        self.persist_manifest().await?;

        info!(seq, filename = %entry.filename, "archived snapshot version");
        Ok(entry)
    }

    /// Write the manifest via a temp file and rename, so a crash never
    /// leaves a half-written index.
    async fn persist_manifest(&self) -> Result<()> {
        let manifest = Manifest {
            entries: self.entries.clone(),
        };
        let raw = serde_json::to_string_pretty(&manifest)
            .map_err(|e| ServerError::storage(format!("manifest encode: {e}")))?;

        let tmp = self.dir.join(format!("{MANIFEST_FILE}.tmp"));
        fs::write(&tmp, raw).await?;
        fs::rename(&tmp, self.dir.join(MANIFEST_FILE)).await?;
        Ok(())
    }

    /// The most recent entry, if any
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.entries.last()
    }

    /// Number of archived versions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no version has been archived yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in sequence order
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }
}

fn parse_entry_name(name: &str) -> Option<(u64, String)> {
    let middle = name.strip_prefix(ENTRY_PREFIX)?.strip_suffix(ENTRY_SUFFIX)?;
    let (seq, timestamp) = middle.split_once('-')?;
    let seq = seq.parse().ok()?;
    Some((seq, timestamp.to_string()))
}

/// Per-user version logs for one server process.
///
/// Logs are opened lazily on a user's first session of the process lifetime
/// and kept in memory afterwards. The map is shared across connection tasks,
/// so access is serialized behind an async mutex.
#[derive(Debug)]
pub struct VersionStore {
    data_dir: PathBuf,
    logs: tokio::sync::Mutex<HashMap<String, VersionLog>>,
}

impl VersionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            logs: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Archive the current canonical document for `username`.
    ///
    /// Callers invoke this only when a prior canonical file exists and is
    /// non-empty; an empty document is refused to keep the history free of
    /// vacuous entries.
    pub async fn archive(&self, username: &str, document: &str) -> Result<VersionEntry> {
        if document.is_empty() {
            warn!(%username, "refusing to archive an empty snapshot");
            return Err(ServerError::storage("refusing to archive empty snapshot"));
        }
        let mut logs = self.logs.lock().await;
        let log = self.entry(&mut logs, username).await?;
        log.append(document).await
    }

    /// Most recent archived entry for `username`, if any.
    pub async fn latest(&self, username: &str) -> Result<Option<VersionEntry>> {
        let mut logs = self.logs.lock().await;
        let log = self.entry(&mut logs, username).await?;
        Ok(log.latest().cloned())
    }

    /// Number of archived versions for `username`.
    pub async fn version_count(&self, username: &str) -> Result<usize> {
        let mut logs = self.logs.lock().await;
        let log = self.entry(&mut logs, username).await?;
        Ok(log.len())
    }

    async fn entry<'a>(
        &self,
        logs: &'a mut HashMap<String, VersionLog>,
        username: &str,
    ) -> Result<&'a mut VersionLog> {
        match logs.entry(username.to_string()) {
            std::collections::hash_map::Entry::Occupied(o) => Ok(o.into_mut()),
            std::collections::hash_map::Entry::Vacant(v) => {
                let dir = self.data_dir.join(username);
                fs::create_dir_all(&dir).await?;
                Ok(v.insert(VersionLog::open(&dir).await?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_parse_back() {
        let (seq, ts) = parse_entry_name("library-000042-20260824153000.json").unwrap();
        assert_eq!(seq, 42);
        assert_eq!(ts, "20260824153000");

        assert!(parse_entry_name("library.json").is_none());
        assert!(parse_entry_name("manifest.json").is_none());
        assert!(parse_entry_name("track.mp3").is_none());
    }
}
