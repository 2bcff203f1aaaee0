//! Disk Manager - whole-page file I/O for index files.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Creating, opening and destroying the page file
//! - Reading and writing pages by page number
//! - Appending pages to the end of the file

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use tracing::trace;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{IoSnapshot, IoStats};

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// The file is a flat sequence of pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. Callers serialize all access to one
/// open file.
///
/// # Durability
/// Writes go to the OS page cache. [`DiskManager::sync`] forces them to disk;
/// there is no write-ahead log and no atomicity across pages.
pub struct DiskManager {
    file: File,
    path: PathBuf,
    /// Number of pages in the file.
    page_count: u32,
    stats: IoStats,
}

impl DiskManager {
    /// Create a new, empty page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        trace!(path = %path.as_ref().display(), "created page file");
        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            page_count: 0,
            stats: IoStats::new(),
        })
    }

    /// Open an existing page file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            page_count,
            stats: IoStats::new(),
        })
    }

    /// Remove a page file from disk.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be removed.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        fs::remove_file(path.as_ref())?;
        trace!(path = %path.as_ref().display(), "destroyed page file");
        Ok(())
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        let mut page = Page::new();
        self.read_page_into(page_id, &mut page)?;
        Ok(page)
    }

    /// Read a page from disk into an existing buffer.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page_into(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.check_exists(page_id)?;

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(page.as_mut_slice())?;

        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Write a page in place.
    ///
    /// The page must already exist (see [`DiskManager::append_page`]).
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been appended yet.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_exists(page_id)?;

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;

        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Append a page to the end of the file.
    ///
    /// Returns the `PageId` of the new page.
    pub fn append_page(&mut self, page: &Page) -> Result<PageId> {
        if self.page_count == PageId::INVALID.0 {
            return Err(Error::PageNotFound(self.page_count));
        }
        let page_id = PageId::new(self.page_count);

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;

        self.page_count += 1;
        self.stats.pages_appended.fetch_add(1, Ordering::Relaxed);
        Ok(page_id)
    }

    /// Force all written pages to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    /// Path this manager was created or opened with.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page I/O counters for this file.
    #[inline]
    pub fn stats(&self) -> IoSnapshot {
        self.stats.snapshot()
    }

    /// Whether `page_id` names a page inside the file.
    #[inline]
    pub fn contains(&self, page_id: PageId) -> bool {
        page_id.is_valid() && page_id.0 < self.page_count
    }

    fn check_exists(&self, page_id: PageId) -> Result<()> {
        if !self.contains(page_id) {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(())
    }
}
