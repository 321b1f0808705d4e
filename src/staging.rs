//! Upload staging directory
//!
//! Uploaded bytes are written here before parsing, and whatever is already
//! present at startup is parsed and loaded into the store.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::records::{self, Record, RecordError, RecordResult};
use crate::store::CursorStore;

/// Write an upload into `dir` under a generated name and return its path.
pub async fn stage_upload(dir: &Path, data: &[u8]) -> RecordResult<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(uuid::Uuid::new_v4().simple().to_string());
    fs::write(&path, data).await?;
    debug!(path = %path.display(), bytes = data.len(), "upload staged");
    Ok(path)
}

/// Parse a staged file on the blocking pool.
pub async fn parse_staged(path: PathBuf) -> RecordResult<Vec<Record>> {
    tokio::task::spawn_blocking(move || records::parse_file(&path))
        .await
        .map_err(|e| RecordError::Io(std::io::Error::other(e)))?
}

/// Load every regular file in `dir` into `store`, keyed by file name.
///
/// Files that cannot be read or parsed are logged and skipped. Returns the
/// number of datasets loaded.
pub async fn ingest_staged(store: &CursorStore, dir: &Path) -> usize {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(dir = %dir.display(), "Error reading uploads directory: {}", e);
            return 0;
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_file = entry
                    .file_type()
                    .await
                    .map(|t| t.is_file())
                    .unwrap_or(false);
                if !is_file {
                    debug!(path = %entry.path().display(), "skipping non-file entry");
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                files.push((name, entry.path()));
            }
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), "Error listing uploads directory: {}", e);
                break;
            }
        }
    }

    let loads = files.into_iter().map(|(name, path)| async move {
        match parse_staged(path).await {
            Ok(records) => {
                let count = records.len();
                store.load(&name, records).await;
                info!(dataset = %name, "File {} initialized with {} records.", name, count);
                true
            }
            Err(e) => {
                error!(dataset = %name, "Failed to ingest staged file: {}", e);
                false
            }
        }
    });

    join_all(loads).await.into_iter().filter(|loaded| *loaded).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_upload_uses_generated_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("uploads");

        let path = stage_upload(&dir, b"a\n1\n").await.unwrap();

        assert!(path.starts_with(&dir));
        assert_eq!(path.file_name().unwrap().len(), 32);
        assert_eq!(std::fs::read(&path).unwrap(), b"a\n1\n");
    }

    #[tokio::test]
    async fn test_ingest_staged_loads_by_file_name() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("one.csv"), "x\n1\n2\n").unwrap();
        std::fs::write(temp_dir.path().join("two.csv"), "y\n3\n").unwrap();
        std::fs::write(temp_dir.path().join("bad.csv"), b"y\n\xff\n").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

        let store = CursorStore::new(Duration::from_secs(60));
        let loaded = ingest_staged(&store, temp_dir.path()).await;

        assert_eq!(loaded, 2);
        assert_eq!(store.fetch("one.csv", 10).await.unwrap().len(), 2);
        assert!(store.contains("two.csv").await);
        assert!(!store.contains("bad.csv").await);
        assert!(!store.contains("nested").await);
    }

    #[tokio::test]
    async fn test_ingest_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = CursorStore::new(Duration::from_secs(60));

        let loaded = ingest_staged(&store, &temp_dir.path().join("absent")).await;

        assert_eq!(loaded, 0);
        assert!(store.is_empty().await);
    }
}
