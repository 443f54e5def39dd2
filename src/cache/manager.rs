use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Subdirectory of the platform cache directory that holds our archives.
const APP_NAME: &str = "tigris";

/// Owns the on-disk archive cache.
///
/// Archives are stored under their remote file name, e.g.
/// `cb_2021_us_county_500k.zip`. Writes go through a temp file in the
/// same directory and are renamed into place, so a partially written
/// download is never mistaken for a cached archive.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Open (and create if needed) the default platform cache directory.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine the platform cache directory",
            ))
        })?;
        Self::with_dir(base.join(APP_NAME))
    }

    /// Open a cache rooted at an explicit directory.
    pub fn with_dir(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path a file with the given name would live at, whether or not it
    /// has been cached yet.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }

    /// Return the cached path for `file_name` if it exists on disk.
    pub fn lookup(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.path_for(file_name);
        if path.is_file() {
            debug!(?path, "cache hit");
            Some(path)
        } else {
            None
        }
    }

    /// Start a cache write. The returned temp file lives in the cache
    /// directory; pass it to [`CacheManager::commit`] once the download
    /// has completed to make it visible under `file_name`. The directory
    /// is recreated if it was cleared since construction.
    pub fn begin_write(&self) -> Result<NamedTempFile> {
        fs::create_dir_all(&self.cache_dir)?;
        Ok(NamedTempFile::new_in(&self.cache_dir)?)
    }

    /// Atomically publish a completed download under `file_name`.
    pub fn commit(&self, staged: NamedTempFile, file_name: &str) -> Result<PathBuf> {
        let path = self.path_for(file_name);
        staged.persist(&path).map_err(|e| Error::Io(e.error))?;
        debug!(?path, "cached archive");
        Ok(path)
    }

    /// Remove every cached archive and the directory itself.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Remove a single cached archive, ignoring a missing file.
    pub fn evict(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(file_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
