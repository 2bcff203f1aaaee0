//! Configuration constants for the index engine.

/// Size of a page in bytes (4KB).
///
/// Every index file is a flat sequence of pages of exactly this size, and
/// every node header offset is computed against it.
///
/// # Memory Layout
/// With 4KB pages and 32-bit page numbers:
/// - Max pages: 2^32 - 1 (the all-ones value is reserved as "no page")
/// - Max index file size: just under 16TB
pub const PAGE_SIZE: usize = 4096;

/// Size of a RID on disk: `pageNum:u32` followed by `slotNum:u32`.
pub const RID_SIZE: usize = 8;

/// Size of a child page pointer inside an interior node.
pub const CHILD_POINTER_SIZE: usize = 4;

/// Largest encoded key accepted by the index, in bytes.
///
/// A VarChar key is `4 + length` bytes, so the longest string is
/// `MAX_KEY_SIZE - 4` bytes. At this size at least four leaf entries fit in a
/// page, which keeps both halves of every split non-empty.
pub const MAX_KEY_SIZE: usize = 1000;

/// Suffix appended to the index file name to form the root-pointer sidecar.
pub const ROOT_FILE_SUFFIX: &str = ".root";
