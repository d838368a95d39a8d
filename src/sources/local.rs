//! Local cache file access.
//!
//! The local file is both the fallback source and the persistence target
//! for remote data. Remote data is staged in a temporary sibling file and
//! renamed over the cache file only after listeners accepted it.

use crate::core::Fingerprint;
use crate::error::{ReloadError, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Read the whole local file.
pub(crate) async fn read(path: &Path) -> Result<Bytes> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|e| ReloadError::io(path, e))
}

/// Temporary path used to stage data with fingerprint `fp` for `path`.
pub(crate) fn temp_path(path: &Path, fp: &Fingerprint) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.tmp", fp.short()));
    PathBuf::from(name)
}

/// Write `data` to the staging file for `path` and return the staging path.
pub(crate) async fn write_temp(path: &Path, fp: &Fingerprint, data: &[u8]) -> Result<PathBuf> {
    let temp = temp_path(path, fp);
    tokio::fs::write(&temp, data)
        .await
        .map_err(|e| ReloadError::io(&temp, e))?;
    Ok(temp)
}

/// Atomically replace `path` with the staged file.
pub(crate) async fn commit(temp: &Path, path: &Path) -> Result<()> {
    tokio::fs::rename(temp, path)
        .await
        .map_err(|e| ReloadError::io(path, e))
}

/// Remove a staging file, ignoring errors.
pub(crate) async fn discard(temp: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        tracing::debug!(path = %temp.display(), error = %e, "failed to remove staging file");
    }
}
