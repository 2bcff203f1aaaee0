//! Root pointer sidecar.
//!
//! The root page number lives in a small file next to the index file
//! (`<index>.root`) holding a single little-endian `u32`. It is rewritten
//! only when the tree grows a new root.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::config::ROOT_FILE_SUFFIX;
use crate::common::{Error, PageId, Result};

/// The persisted root page number of one index file.
#[derive(Debug)]
pub struct RootPointer {
    path: PathBuf,
    root: PageId,
}

impl RootPointer {
    /// Sidecar path for an index file: the index path with `.root` appended.
    pub fn sidecar_path(index_path: &Path) -> PathBuf {
        let mut name = OsString::from(index_path.as_os_str());
        name.push(ROOT_FILE_SUFFIX);
        PathBuf::from(name)
    }

    /// Create the sidecar for a new index.
    ///
    /// # Errors
    /// Returns an error if the sidecar already exists.
    pub fn create(index_path: &Path, root: PageId) -> Result<Self> {
        let path = Self::sidecar_path(index_path);
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(&root.to_le_bytes())?;
        file.sync_all()?;
        Ok(Self { path, root })
    }

    /// Read the sidecar of an existing index.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the sidecar does not hold exactly four bytes.
    pub fn open(index_path: &Path) -> Result<Self> {
        let path = Self::sidecar_path(index_path);
        let bytes = fs::read(&path)?;
        let bytes: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
            Error::corrupted(
                PageId::INVALID,
                format!("root pointer file holds {} bytes, expected 4", bytes.len()),
            )
        })?;
        Ok(Self {
            path,
            root: PageId::from_le_bytes(bytes),
        })
    }

    /// Remove the sidecar of an index.
    pub fn destroy(index_path: &Path) -> Result<()> {
        fs::remove_file(Self::sidecar_path(index_path))?;
        Ok(())
    }

    #[inline]
    pub fn get(&self) -> PageId {
        self.root
    }

    /// Persist a new root page number.
    pub fn set(&mut self, root: PageId) -> Result<()> {
        fs::write(&self.path, root.to_le_bytes())?;
        debug!(old = %self.root, new = %root, "root pointer moved");
        self.root = root;
        Ok(())
    }
}
