//! Page type.
//!
//! This module contains [`Page`], the raw 4KB data container. Node layouts
//! on top of it live in [`crate::index::btree`].

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
