//! Index structures.
//!
//! - [`btree`] - disk-resident B+-tree secondary index

pub mod btree;
