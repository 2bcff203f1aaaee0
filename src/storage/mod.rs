//! Storage layer - disk I/O and the page type.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Whole-page file I/O
//! - [`page`] - The 4KB page buffer
//! - [`IoStats`] - Page read/write/append counters

mod disk_manager;
pub mod page;
mod stats;

pub use disk_manager::DiskManager;
pub use stats::{IoSnapshot, IoStats};
