//! The caller-owned index file handle.
//!
//! An [`IndexFile`] pairs the page file with its root pointer sidecar. The
//! tree operations themselves live in `insert`, `delete`, `scan` and `dump`,
//! each adding an `impl IndexFile` block.

use std::path::Path;

use tracing::{debug, warn};

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{DiskManager, IoSnapshot};

use super::header::{read_u32, NodeHeader, NodeKind};
use super::key::AttrType;
use super::node::LeafNode;
use super::root::RootPointer;

/// An open B+-tree index file.
///
/// # File Layout
/// ```text
/// <path>        flat sequence of 4KB node pages
/// <path>.root   current root page number (u32, little-endian)
/// ```
/// A new index holds one empty leaf at page 0, which is also the root.
///
/// # Thread Safety
/// Single-threaded. Every operation takes `&mut self`, and an open
/// [`ScanIterator`](super::ScanIterator) borrows the handle until it is dropped.
///
/// # Example
/// ```
/// use secidx::{Attribute, IndexFile, Key, Rid};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("age.idx");
/// let age = Attribute::int("age");
///
/// IndexFile::create(&path).unwrap();
/// let mut index = IndexFile::open(&path).unwrap();
/// index.insert_entry(&age, &Key::Int(30), Rid::new(1, 0)).unwrap();
///
/// let mut scan = index.scan(&age, None, None, true, true).unwrap();
/// assert_eq!(scan.get_next().unwrap(), Some((Rid::new(1, 0), Key::Int(30))));
/// assert_eq!(scan.get_next().unwrap(), None);
/// ```
pub struct IndexFile {
    pub(super) disk: DiskManager,
    pub(super) root: RootPointer,
}

impl IndexFile {
    /// Create a new index file with an empty root leaf.
    ///
    /// # Errors
    /// Returns an error if either the index file or its sidecar already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let mut disk = DiskManager::create(path)?;

        let result = Self::format(&mut disk, path);
        if result.is_err() {
            // Leave nothing half-created behind.
            if let Err(e) = DiskManager::destroy(path) {
                warn!(path = %path.display(), error = %e, "failed to remove partial index file");
            }
        }
        result
    }

    fn format(disk: &mut DiskManager, path: &Path) -> Result<()> {
        let mut page = Page::new();
        // The leaf view only writes the header; the key type is irrelevant here.
        LeafNode::init(
            PageId::new(0),
            AttrType::Int,
            page.as_mut_slice(),
            PageId::INVALID,
            PageId::INVALID,
        );
        let root = disk.append_page(&page)?;
        RootPointer::create(path, root)?;
        disk.sync()?;

        debug!(path = %path.display(), root = %root, "created index file");
        Ok(())
    }

    /// Remove an index file and its root pointer sidecar.
    ///
    /// Both removals are attempted; the first failure is returned.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let pages = DiskManager::destroy(path);
        let root = RootPointer::destroy(path);
        pages.and(root)?;

        debug!(path = %path.display(), "destroyed index file");
        Ok(())
    }

    /// Open an existing index file.
    ///
    /// # Errors
    /// - I/O errors if either file is missing
    /// - `Error::PageNotFound` if the root pointer is past the end of the file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let disk = DiskManager::open(path)?;
        let root = RootPointer::open(path)?;

        if !disk.contains(root.get()) {
            return Err(Error::PageNotFound(root.get().0));
        }

        debug!(path = %path.display(), root = %root.get(), pages = disk.page_count(), "opened index file");
        Ok(Self { disk, root })
    }

    /// Flush and close the handle.
    pub fn close(mut self) -> Result<()> {
        self.disk.sync()?;
        debug!(path = %self.disk.path().display(), "closed index file");
        Ok(())
    }

    /// Current root page.
    #[inline]
    pub fn root_page(&self) -> PageId {
        self.root.get()
    }

    /// Path of the page file.
    #[inline]
    pub fn path(&self) -> &Path {
        self.disk.path()
    }

    /// Number of pages in the file, including free ones.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.disk.page_count()
    }

    /// Page reads, writes and appends issued through this handle.
    pub fn collect_counter_values(&self) -> IoSnapshot {
        self.disk.stats()
    }

    /// Number of levels from the root down to the leaves.
    ///
    /// A lone root leaf has height 1. Every leaf sits at the same depth, so
    /// following leftmost children is enough.
    pub fn height(&mut self) -> Result<usize> {
        let mut page_id = self.root.get();
        let mut height = 1;
        loop {
            let page = self.disk.read_page(page_id)?;
            let header = NodeHeader::read(page_id, page.as_slice())?;
            if header.kind == NodeKind::Leaf {
                return Ok(height);
            }
            let child = PageId::new(read_u32(page.as_slice(), NodeHeader::OFFSET_LEFTMOST_CHILD));
            self.check_child(page_id, child)?;
            page_id = child;
            height += 1;
        }
    }

    /// Ensure an interior node's child pointer names a page in the file.
    pub(super) fn check_child(&self, parent: PageId, child: PageId) -> Result<()> {
        if !self.disk.contains(child) {
            return Err(Error::ChildNotFound { parent, child });
        }
        Ok(())
    }
}
