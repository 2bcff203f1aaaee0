//! secidx - a disk-resident B+-tree secondary index.
//!
//! Maps attribute values to record locators ([`Rid`]s) and answers point and
//! range lookups in key order. Records themselves live in an external heap
//! file; the index only stores and compares their locators.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            secidx                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   IndexFile: insert / delete / scan / dump               │   │
//! │  │   navigator + split + allocator + root pointer           │   │
//! │  │   node views (leaf, interior) + key codec                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │        DiskManager + Page + IoStats                      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Rid, Error, config)
//! - [`storage`] - Page file I/O and the page buffer
//! - [`index`] - The B+-tree
//!
//! # Quick Start
//! ```
//! use secidx::{Attribute, IndexFile, Key, Rid};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("name.idx");
//! let name = Attribute::varchar("name", 32);
//!
//! IndexFile::create(&path).unwrap();
//! let mut index = IndexFile::open(&path).unwrap();
//! index.insert_entry(&name, &Key::varchar("carol"), Rid::new(4, 1)).unwrap();
//! index.insert_entry(&name, &Key::varchar("alice"), Rid::new(2, 7)).unwrap();
//!
//! let first = index.scan(&name, None, None, true, true).unwrap().next();
//! assert_eq!(first.unwrap().unwrap(), (Rid::new(2, 7), Key::varchar("alice")));
//!
//! index.close().unwrap();
//! IndexFile::destroy(&path).unwrap();
//! ```
//!
//! # Logging
//! Structural events (splits, root growth, page reuse) are reported through
//! `tracing`. No subscriber is installed; the embedding application picks one.

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, PageId, Result, Rid};

pub use index::btree::{AttrType, Attribute, IndexFile, Key, KeyRef, ScanIterator};
pub use storage::{DiskManager, IoSnapshot};
