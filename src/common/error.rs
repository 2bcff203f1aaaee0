//! Error types for the index engine.

use thiserror::Error;

use super::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the index engine.
///
/// The variants fall into four groups:
/// - storage failures, propagated unchanged from the paged file
/// - structural corruption detected while decoding a page
/// - logical errors reported for a single operation
/// - iterator misuse
///
/// Reaching the end of a scan is not an error: `ScanIterator::get_next`
/// returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the file.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// A page's header or entries fall outside their valid bounds.
    ///
    /// Fatal to the current operation, but the handle stays usable.
    #[error("{page_id} corrupted: {reason}")]
    Corrupted { page_id: PageId, reason: String },

    /// The exact `(key, rid)` pair is already indexed.
    #[error("Duplicate (key, rid) entry")]
    DuplicateEntry,

    /// No entry matches the `(key, rid)` pair.
    #[error("No matching (key, rid) entry")]
    EntryNotFound,

    /// An interior node routed to a page that is not in the file.
    #[error("{parent} routes to missing child {child}")]
    ChildNotFound { parent: PageId, child: PageId },

    /// A leaf view was requested over a page tagged interior.
    #[error("{0} is not a leaf node")]
    NotALeaf(PageId),

    /// An interior view was requested over a page tagged leaf.
    #[error("{0} is not an interior node")]
    NotAnInterior(PageId),

    /// The key's type differs from the attribute's declared type.
    #[error("Key type mismatch: expected {expected}, got {actual}")]
    KeyTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The encoded key is larger than the attribute or the page allows.
    #[error("Key too large: {size} bytes (max {max})")]
    KeyTooLarge { size: usize, max: usize },

    /// The diagnostic tree dump could not be rendered.
    #[error("Tree dump failed: {0}")]
    Dump(#[from] serde_json::Error),

    /// `get_next` was called after the scan iterator was closed.
    #[error("Scan iterator is closed")]
    IteratorClosed,
}

impl Error {
    /// Shorthand for building a [`Error::Corrupted`].
    pub(crate) fn corrupted(page_id: PageId, reason: impl Into<String>) -> Self {
        Error::Corrupted {
            page_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::corrupted(PageId::new(3), "free space offset 9000 past page end");
        assert_eq!(
            format!("{}", err),
            "Page(3) corrupted: free space offset 9000 past page end"
        );

        let err = Error::ChildNotFound {
            parent: PageId::new(1),
            child: PageId::new(77),
        };
        assert_eq!(format!("{}", err), "Page(1) routes to missing child Page(77)");

        assert_eq!(
            Error::NotALeaf(PageId::new(4)).to_string(),
            "Page(4) is not a leaf node"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = Error::from(io_err);
        assert!(err.source().is_some());
        assert!(Error::DuplicateEntry.source().is_none());
    }
}
