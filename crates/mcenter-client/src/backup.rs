use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::payload::Action;
use crate::ClientResult;

pub const BACKUP_PREFIX: &str = "mcenter_backup_";

/// An unsent payload kept for manual recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: Action,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub saved_at: DateTime<Utc>,
    pub reason: String,
    pub payload: Value,
}

/// Directory of `mcenter_backup_<type>_<timestamp>.json` files.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` to a fresh entry and return its path.
    pub fn save(&self, action: Action, payload: &Value, reason: &str) -> ClientResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let saved_at = Utc::now();
        let mut timestamp = saved_at.timestamp_millis();
        let mut path = self.entry_path(action, timestamp);
        // Same-millisecond saves get the next free timestamp
        while path.exists() {
            timestamp += 1;
            path = self.entry_path(action, timestamp);
        }

        let entry = BackupEntry {
            kind: action.backup_type().to_string(),
            action,
            timestamp,
            saved_at,
            reason: reason.to_string(),
            payload: payload.clone(),
        };
        fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        info!(path = %path.display(), action = %action, "payload backed up");
        Ok(path)
    }

    fn entry_path(&self, action: Action, timestamp: i64) -> PathBuf {
        self.dir
            .join(format!("{BACKUP_PREFIX}{}_{timestamp}.json", action.backup_type()))
    }

    /// All readable entries, oldest first. Unparseable files are skipped.
    pub fn list(&self) -> ClientResult<Vec<(PathBuf, BackupEntry)>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for item in fs::read_dir(&self.dir)? {
            let path = item?.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"));
            if !is_backup {
                continue;
            }
            match self.load(&path) {
                Ok(entry) => entries.push((path, entry)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable backup"),
            }
        }
        entries.sort_by_key(|(_, e)| e.timestamp);
        Ok(entries)
    }

    pub fn load(&self, path: &Path) -> ClientResult<BackupEntry> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn remove(&self, path: &Path) -> ClientResult<()> {
        fs::remove_file(path)?;
        debug!(path = %path.display(), "backup removed");
        Ok(())
    }
}
