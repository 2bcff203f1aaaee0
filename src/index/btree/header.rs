//! Node header and kind definitions.
//!
//! Every index page starts with a [`NodeHeader`]. The first byte says whether
//! the page is a leaf; leaves additionally carry their sibling links.

use crate::common::config::{CHILD_POINTER_SIZE, RID_SIZE};
use crate::common::{Error, PageId, Result};

/// Kind of B+-tree node stored in a page.
///
/// Uses `#[repr(u8)]` so the discriminant is exactly the on-disk flag byte.
/// A zeroed page reads as an `Interior` with no entries, which is how the
/// allocator recognises a free page.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Routing node: leftmost child pointer followed by `(key, child)` entries.
    Interior = 0,
    /// Data node: `(key, rid)` entries plus sibling links.
    Leaf = 1,
}

impl NodeKind {
    /// Convert from the flag byte, returning `None` for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NodeKind::Interior),
            1 => Some(NodeKind::Leaf),
            _ => None,
        }
    }
}

/// Metadata stored at the beginning of every index page.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     is_leaf (1 = leaf, 0 = interior)
/// 1       4     num_entries (u32, little-endian)
/// 5       4     free_space_offset (u32, little-endian)
/// 9       4     left_sibling (i32, -1 = none)       leaf only
/// 13      4     right_sibling (i32, -1 = none)      leaf only
/// ```
///
/// Leaf entries begin at byte 17. Interior pages store their leftmost child
/// pointer at byte 9 and their entries begin at byte 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub kind: NodeKind,
    /// Number of entries packed before `free_space_offset`.
    pub num_entries: u32,
    /// First unused byte of the page.
    pub free_space_offset: u32,
    /// Previous leaf in key order. Always `INVALID` for interior nodes.
    pub left_sibling: PageId,
    /// Next leaf in key order. Always `INVALID` for interior nodes.
    pub right_sibling: PageId,
}

impl NodeHeader {
    /// Offset of each field within the header.
    pub const OFFSET_IS_LEAF: usize = 0;
    pub const OFFSET_NUM_ENTRIES: usize = 1;
    pub const OFFSET_FREE_SPACE_OFFSET: usize = 5;
    pub const OFFSET_LEFT_SIBLING: usize = 9;
    pub const OFFSET_RIGHT_SIBLING: usize = 13;
    /// Interior nodes reuse the sibling slot for their leftmost child.
    pub const OFFSET_LEFTMOST_CHILD: usize = 9;

    /// Size of the leaf header in bytes.
    pub const LEAF_SIZE: usize = 17;
    /// Size of the interior header in bytes.
    pub const INTERIOR_SIZE: usize = 9;

    /// Header for an empty leaf spliced between `left` and `right`.
    pub fn new_leaf(left_sibling: PageId, right_sibling: PageId) -> Self {
        Self {
            kind: NodeKind::Leaf,
            num_entries: 0,
            free_space_offset: Self::LEAF_SIZE as u32,
            left_sibling,
            right_sibling,
        }
    }

    /// Header for an interior node holding only its leftmost child pointer.
    pub fn new_interior() -> Self {
        Self {
            kind: NodeKind::Interior,
            num_entries: 0,
            free_space_offset: (Self::INTERIOR_SIZE + CHILD_POINTER_SIZE) as u32,
            left_sibling: PageId::INVALID,
            right_sibling: PageId::INVALID,
        }
    }

    /// Header size for this node's kind.
    #[inline]
    pub fn size(&self) -> usize {
        match self.kind {
            NodeKind::Leaf => Self::LEAF_SIZE,
            NodeKind::Interior => Self::INTERIOR_SIZE,
        }
    }

    /// Offset of the first entry.
    #[inline]
    pub fn entries_start(&self) -> usize {
        match self.kind {
            NodeKind::Leaf => Self::LEAF_SIZE,
            NodeKind::Interior => Self::INTERIOR_SIZE + CHILD_POINTER_SIZE,
        }
    }

    /// Bytes currently occupied by entries.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        (self.free_space_offset as usize).saturating_sub(self.entries_start())
    }

    /// Read the flag byte without decoding the rest of the header.
    pub fn kind_of(data: &[u8]) -> Option<NodeKind> {
        data.first().and_then(|&b| NodeKind::from_u8(b))
    }

    /// Read the entry count without validating anything else.
    ///
    /// # Panics
    /// Panics if `data.len() < NodeHeader::INTERIOR_SIZE`.
    pub fn raw_num_entries(data: &[u8]) -> u32 {
        read_u32(data, Self::OFFSET_NUM_ENTRIES)
    }

    /// Read and validate a header.
    ///
    /// `data` is the whole node buffer; its length is the node's capacity.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the flag byte is unknown, the free space
    /// offset lies outside `[entries_start, data.len()]`, or the entry count
    /// cannot fit in the used bytes.
    pub fn read(page_id: PageId, data: &[u8]) -> Result<Self> {
        if data.len() < Self::LEAF_SIZE {
            return Err(Error::corrupted(page_id, "buffer smaller than a node header"));
        }

        let flag = data[Self::OFFSET_IS_LEAF];
        let kind = NodeKind::from_u8(flag)
            .ok_or_else(|| Error::corrupted(page_id, format!("unknown node flag {}", flag)))?;

        let (left_sibling, right_sibling) = match kind {
            NodeKind::Leaf => (
                PageId::new(read_u32(data, Self::OFFSET_LEFT_SIBLING)),
                PageId::new(read_u32(data, Self::OFFSET_RIGHT_SIBLING)),
            ),
            NodeKind::Interior => (PageId::INVALID, PageId::INVALID),
        };

        let header = Self {
            kind,
            num_entries: read_u32(data, Self::OFFSET_NUM_ENTRIES),
            free_space_offset: read_u32(data, Self::OFFSET_FREE_SPACE_OFFSET),
            left_sibling,
            right_sibling,
        };

        let fso = header.free_space_offset as usize;
        if fso < header.entries_start() || fso > data.len() {
            return Err(Error::corrupted(
                page_id,
                format!("free space offset {} outside [{}, {}]", fso, header.entries_start(), data.len()),
            ));
        }

        let min_entry = match kind {
            NodeKind::Leaf => 4 + RID_SIZE,
            NodeKind::Interior => 4 + CHILD_POINTER_SIZE,
        };
        if header.num_entries as usize * min_entry > header.used_bytes() {
            return Err(Error::corrupted(
                page_id,
                format!("{} entries cannot fit in {} bytes", header.num_entries, header.used_bytes()),
            ));
        }

        Ok(header)
    }

    /// Write this header to the beginning of a node buffer.
    ///
    /// Interior headers leave bytes 9.. untouched (the leftmost child lives there).
    ///
    /// # Panics
    /// Panics if `data` is smaller than the header.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= self.size(), "buffer too small for NodeHeader");

        data[Self::OFFSET_IS_LEAF] = self.kind as u8;
        write_u32(data, Self::OFFSET_NUM_ENTRIES, self.num_entries);
        write_u32(data, Self::OFFSET_FREE_SPACE_OFFSET, self.free_space_offset);

        if self.kind == NodeKind::Leaf {
            write_u32(data, Self::OFFSET_LEFT_SIBLING, self.left_sibling.0);
            write_u32(data, Self::OFFSET_RIGHT_SIBLING, self.right_sibling.0);
        }
    }
}

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn test_node_kind_from_u8() {
        assert_eq!(NodeKind::from_u8(0), Some(NodeKind::Interior));
        assert_eq!(NodeKind::from_u8(1), Some(NodeKind::Leaf));
        assert_eq!(NodeKind::from_u8(2), None);
    }

    #[test]
    fn test_leaf_header_byte_layout() {
        let header = NodeHeader {
            kind: NodeKind::Leaf,
            num_entries: 0x04030201,
            free_space_offset: 0x00000100,
            left_sibling: PageId::INVALID,
            right_sibling: PageId::new(7),
        };

        let mut buf = [0u8; PAGE_SIZE];
        header.write_to(&mut buf);

        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&buf[5..9], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&buf[9..13], &[0xFF; 4]);
        assert_eq!(&buf[13..17], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_interior_header_leaves_child_slot_alone() {
        let mut buf = [0u8; PAGE_SIZE];
        buf[9..13].copy_from_slice(&[9, 9, 9, 9]);

        NodeHeader::new_interior().write_to(&mut buf);

        assert_eq!(buf[0], 0);
        assert_eq!(&buf[5..9], &13u32.to_le_bytes());
        assert_eq!(&buf[9..13], &[9, 9, 9, 9]);
    }

    #[test]
    fn test_header_roundtrip() {
        let mut buf = [0u8; PAGE_SIZE];
        let leaf = NodeHeader::new_leaf(PageId::new(3), PageId::new(4));
        leaf.write_to(&mut buf);
        assert_eq!(NodeHeader::read(PageId::new(0), &buf).unwrap(), leaf);

        let mut buf = [0u8; PAGE_SIZE];
        let interior = NodeHeader::new_interior();
        interior.write_to(&mut buf);
        assert_eq!(NodeHeader::read(PageId::new(0), &buf).unwrap(), interior);
    }

    #[test]
    fn test_entries_start() {
        assert_eq!(NodeHeader::new_leaf(PageId::INVALID, PageId::INVALID).entries_start(), 17);
        assert_eq!(NodeHeader::new_interior().entries_start(), 13);
        assert_eq!(NodeHeader::new_interior().used_bytes(), 0);
    }

    #[test]
    fn test_read_rejects_bad_flag() {
        let mut buf = [0u8; PAGE_SIZE];
        NodeHeader::new_leaf(PageId::INVALID, PageId::INVALID).write_to(&mut buf);
        buf[0] = 9;
        assert!(matches!(
            NodeHeader::read(PageId::new(2), &buf),
            Err(Error::Corrupted { .. })
        ));
    }

    #[test]
    fn test_read_rejects_bad_free_space_offset() {
        let mut buf = [0u8; PAGE_SIZE];
        let mut header = NodeHeader::new_leaf(PageId::INVALID, PageId::INVALID);
        header.free_space_offset = PAGE_SIZE as u32 + 1;
        header.write_to(&mut buf);
        assert!(NodeHeader::read(PageId::new(0), &buf).is_err());

        header.free_space_offset = 10;
        header.write_to(&mut buf);
        assert!(NodeHeader::read(PageId::new(0), &buf).is_err());

        // A zeroed page is not a valid node.
        assert!(NodeHeader::read(PageId::new(0), &[0u8; PAGE_SIZE]).is_err());
    }

    #[test]
    fn test_read_rejects_impossible_entry_count() {
        let mut buf = [0u8; PAGE_SIZE];
        let mut header = NodeHeader::new_leaf(PageId::INVALID, PageId::INVALID);
        header.free_space_offset = (NodeHeader::LEAF_SIZE + 24) as u32;
        header.num_entries = 3;
        header.write_to(&mut buf);
        assert!(NodeHeader::read(PageId::new(0), &buf).is_err());

        header.num_entries = 2;
        header.write_to(&mut buf);
        assert!(NodeHeader::read(PageId::new(0), &buf).is_ok());
    }

    #[test]
    fn test_raw_num_entries_and_kind_of_zero_page() {
        let buf = [0u8; PAGE_SIZE];
        assert_eq!(NodeHeader::raw_num_entries(&buf), 0);
        assert_eq!(NodeHeader::kind_of(&buf), Some(NodeKind::Interior));
    }
}
