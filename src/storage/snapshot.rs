//! Snapshot file format shared by all storage backends.
//!
//! A snapshot is an ordered sequence of (key, encoded-value bytes) pairs,
//! written as a JSON array with base64 payloads. The format carries no
//! backend-specific state, which is what lets a save from the in-memory
//! variant load into the Redis variant and vice versa.

use std::fs;
use std::path::Path;

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{BlackboardError, Result};

/// One (key, bytes) pair in a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    data: String,
}

/// Write the given entries to a snapshot file, creating parent
/// directories as needed.
pub fn write<I>(path: &Path, entries: I) -> Result<()>
where
    I: IntoIterator<Item = (String, Bytes)>,
{
    let encoded: Vec<SnapshotEntry> = entries
        .into_iter()
        .map(|(key, data)| SnapshotEntry {
            key,
            data: base64::engine::general_purpose::STANDARD.encode(&data),
        })
        .collect();

    let body = serde_json::to_vec_pretty(&encoded).map_err(BlackboardError::serialization)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| BlackboardError::Snapshot {
                message: format!("creating {}: {}", parent.display(), e),
            })?;
        }
    }
    fs::write(path, body).map_err(|e| BlackboardError::Snapshot {
        message: format!("writing {}: {}", path.display(), e),
    })?;

    log::debug!("wrote snapshot with {} entries to {}", encoded.len(), path.display());
    Ok(())
}

/// Read the (key, bytes) pairs from a snapshot file, in file order.
pub fn read(path: &Path) -> Result<Vec<(String, Bytes)>> {
    let body = fs::read(path).map_err(|e| BlackboardError::Snapshot {
        message: format!("reading {}: {}", path.display(), e),
    })?;

    let entries: Vec<SnapshotEntry> =
        serde_json::from_slice(&body).map_err(BlackboardError::corrupt)?;

    entries
        .into_iter()
        .map(|entry| {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&entry.data)
                .map_err(|e| {
                    BlackboardError::corrupt(format!("key '{}': {}", entry.key, e))
                })?;
            Ok((entry.key, Bytes::from(data)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.snapshot");

        let entries = vec![
            ("zeta".to_string(), Bytes::from_static(b"\x00\x01\x02")),
            ("alpha".to_string(), Bytes::from_static(b"{\"a\":1}")),
            ("empty".to_string(), Bytes::new()),
        ];
        write(&path, entries.clone()).unwrap();

        let restored = read(&path).unwrap();
        assert_eq!(restored, entries);
    }

    #[test]
    fn test_snapshot_missing_file() {
        let err = read(Path::new("/nonexistent/board.snapshot")).unwrap_err();
        assert!(matches!(err, BlackboardError::Snapshot { .. }));
    }

    #[test]
    fn test_snapshot_malformed_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.snapshot");
        fs::write(&path, b"not a snapshot").unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, BlackboardError::CorruptData { .. }));
    }

    #[test]
    fn test_snapshot_bad_base64_names_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad64.snapshot");
        fs::write(&path, br#"[{"key": "user", "data": "@@not-base64@@"}]"#).unwrap();

        let err = read(&path).unwrap_err();
        assert!(err.to_string().contains("user"));
    }
}
