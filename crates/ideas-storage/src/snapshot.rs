//! On-disk snapshot of every collection.
//!
//! The whole store is one JSON document. Writes go to a sibling temporary
//! file which is then renamed over the snapshot, so a crash mid-write leaves
//! the previous snapshot intact.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ideas_model::{Idea, Review, User};

use crate::StoreError;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Collections {
    #[serde(default)]
    pub ideas: Vec<Idea>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    #[serde(flatten)]
    collections: &'a Collections,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    version: u32,
    #[serde(flatten)]
    collections: Collections,
}

/// Open (creating the directory if needed) and read the snapshot at `path`.
pub(crate) async fn load(path: &Path) -> Result<Collections, StoreError> {
    let connection_error = |reason: String| StoreError::Connection {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| connection_error(format!("cannot create data directory: {e}")))?;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Collections::default());
        }
        Err(e) => return Err(connection_error(format!("cannot read snapshot: {e}"))),
    };

    let snapshot: SnapshotOwned = serde_json::from_slice(&bytes)
        .map_err(|e| connection_error(format!("corrupt snapshot: {e}")))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(connection_error(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        )));
    }
    Ok(snapshot.collections)
}

pub(crate) fn encode(collections: &Collections) -> std::io::Result<Vec<u8>> {
    serde_json::to_vec_pretty(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        collections,
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

pub(crate) async fn write(path: &Path, bytes: Vec<u8>) -> Result<(), StoreError> {
    let persist_error = |source: std::io::Error| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await.map_err(persist_error)?;
    tokio::fs::rename(&tmp, path).await.map_err(persist_error)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
