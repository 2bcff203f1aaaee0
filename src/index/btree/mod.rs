//! Disk-resident B+-tree index.
//!
//! # Structure
//! ```text
//!                 ┌───────────────────────┐
//!                 │   interior (root)     │   leftmost child + (key, child)*
//!                 └───────────────────────┘
//!                   │         │         │
//!        ┌──────────┘         │         └──────────┐
//!        ▼                    ▼                    ▼
//!   ┌─────────┐  <──>   ┌─────────┐  <──>   ┌─────────┐
//!   │  leaf   │         │  leaf   │         │  leaf   │   (key, rid)* + sibling links
//!   └─────────┘         └─────────┘         └─────────┘
//! ```
//! Every node is one 4KB page. Leaves form a doubly linked list in key order,
//! which range scans walk. The root page number lives in a sidecar file and
//! changes only when the tree grows a level.
//!
//! # Modules
//! - `key` - attribute types and the key codec
//! - `header` / `node` - on-disk node layout and typed views over it
//! - `navigator` - child selection in interior nodes
//! - `split` - dividing overfull nodes
//! - `allocator` - page allocation and reuse
//! - `root` - the root pointer sidecar
//! - `insert` / `delete` / `scan` / `dump` - operations on [`IndexFile`]

mod allocator;
mod delete;
mod dump;
mod header;
mod index_file;
mod insert;
mod key;
mod navigator;
mod node;
mod root;
mod scan;
mod split;

pub use header::{NodeHeader, NodeKind};
pub use index_file::IndexFile;
pub use key::{compare_bounded, AttrType, Attribute, Key, KeyRef};
pub use navigator::{route, route_leftmost};
pub use node::{InteriorEntry, InteriorNode, LeafEntry, LeafNode};
pub use scan::ScanIterator;
