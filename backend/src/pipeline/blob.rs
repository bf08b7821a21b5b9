//! Temporary storage for an upload while it is being processed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Opaque reference to a staged upload.
///
/// Not `Clone`: [`TempBlobStorage::delete`] consumes it, so a staged file can
/// only be released once.
#[derive(Debug, PartialEq, Eq)]
pub struct BlobHandle {
    key: String,
}

impl BlobHandle {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

pub trait TempBlobStorage: Send + Sync {
    /// Stages `bytes`; `extension` is the already validated, lower-case file
    /// extension without the dot.
    fn store(&self, extension: &str, bytes: &[u8]) -> io::Result<BlobHandle>;

    fn read(&self, handle: &BlobHandle) -> io::Result<Vec<u8>>;

    fn delete(&self, handle: BlobHandle) -> io::Result<()>;
}

/// Stages uploads as uniquely named files inside one directory.
pub struct DiskBlobStorage {
    dir: PathBuf,
}

impl DiskBlobStorage {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, handle: &BlobHandle) -> PathBuf {
        self.dir.join(&handle.key)
    }
}

impl TempBlobStorage for DiskBlobStorage {
    fn store(&self, extension: &str, bytes: &[u8]) -> io::Result<BlobHandle> {
        let suffix = format!(".{extension}");
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let (_, path) = file.keep().map_err(|e| e.error)?;
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "non UTF-8 temp file name"))?;
        Ok(BlobHandle::new(key))
    }

    fn read(&self, handle: &BlobHandle) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(handle))
    }

    fn delete(&self, handle: BlobHandle) -> io::Result<()> {
        fs::remove_file(self.path_of(&handle))
    }
}
