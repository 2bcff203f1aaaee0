//! Common types and utilities shared across the index engine.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (PageId, Rid)

pub mod config;
pub mod error;
mod page_id;
mod rid;

pub use error::{Error, Result};
pub use page_id::PageId;
pub use rid::Rid;
