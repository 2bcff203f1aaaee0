//! Splitting overfull nodes.
//!
//! An insert that does not fit is first applied to an oversized scratch copy
//! of the node. The functions here divide that scratch node into two fresh
//! pages and return the separator the parent must absorb.
//!
//! The split point is the first entry whose end offset reaches the midpoint
//! of the used entry bytes. A leaf keeps that entry on the left; an interior
//! node promotes it to the parent.

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

use super::key::{AttrType, Key};
use super::node::{InteriorNode, LeafNode};

/// Both halves of a split leaf.
pub struct LeafSplit {
    /// The original page, now holding the lower half.
    pub left: Page,
    /// The new page, spliced in right after `left`.
    pub right: Page,
    /// Copy of the first key in `right`.
    pub separator: Key,
    /// Leaf that followed the original page, whose left link must move to the new page.
    pub old_right_sibling: PageId,
}

/// Both halves of a split interior node.
pub struct InteriorSplit {
    pub left: Page,
    pub right: Page,
    /// The promoted key; it appears in neither half.
    pub separator: Key,
}

/// Index of the entry that ends at or past the byte midpoint.
fn split_index(ends: &[usize], entries_start: usize, used: usize) -> usize {
    let midpoint = entries_start + used / 2;
    ends.iter()
        .position(|&end| end >= midpoint)
        .unwrap_or(ends.len().saturating_sub(1))
}

/// Split an overfull leaf held in `scratch`.
///
/// `page_id` keeps the lower half and `new_page_id` receives the upper half;
/// the leaf links become `left <-> new <-> old right`.
///
/// # Errors
/// Returns `Error::Corrupted` if the node cannot be decoded or has fewer than
/// two entries.
pub fn split_leaf(
    scratch: &[u8],
    page_id: PageId,
    new_page_id: PageId,
    attr_type: AttrType,
) -> Result<LeafSplit> {
    let full = LeafNode::load(page_id, attr_type, scratch)?;
    let entries = full.entries().collect::<Result<Vec<_>>>()?;
    if entries.len() < 2 {
        return Err(Error::corrupted(page_id, "cannot split a leaf with fewer than two entries"));
    }

    let header = full.header();
    let ends: Vec<usize> = entries.iter().map(|e| e.end()).collect();
    // The right half must keep at least one entry.
    let keep = split_index(&ends, header.entries_start(), header.used_bytes()).min(entries.len() - 2);

    let start = header.entries_start();
    let split_at = entries[keep].end();
    let fso = header.free_space_offset as usize;
    let left_count = (keep + 1) as u32;
    let right_count = (entries.len() - keep - 1) as u32;

    let mut left = Page::new();
    LeafNode::init(page_id, attr_type, left.as_mut_slice(), full.left_sibling(), new_page_id)
        .extend_raw(&scratch[start..split_at], left_count);

    let mut right = Page::new();
    LeafNode::init(new_page_id, attr_type, right.as_mut_slice(), page_id, full.right_sibling())
        .extend_raw(&scratch[split_at..fso], right_count);

    Ok(LeafSplit {
        left,
        right,
        separator: entries[keep + 1].key.to_key(),
        old_right_sibling: full.right_sibling(),
    })
}

/// Split an overfull interior node held in `scratch`.
///
/// The entry at the split point is promoted: its key becomes the separator
/// and its child becomes the new page's leftmost child.
///
/// # Errors
/// Returns `Error::Corrupted` if the node cannot be decoded or has fewer than
/// three entries.
pub fn split_interior(
    scratch: &[u8],
    page_id: PageId,
    new_page_id: PageId,
    attr_type: AttrType,
) -> Result<InteriorSplit> {
    let full = InteriorNode::load(page_id, attr_type, scratch)?;
    let entries = full.entries().collect::<Result<Vec<_>>>()?;
    if entries.len() < 3 {
        return Err(Error::corrupted(
            page_id,
            "cannot split an interior node with fewer than three entries",
        ));
    }

    let header = full.header();
    let ends: Vec<usize> = entries.iter().map(|e| e.end()).collect();
    // Both halves must keep at least one key.
    let promote = split_index(&ends, header.entries_start(), header.used_bytes())
        .clamp(1, entries.len() - 2);
    let promoted = entries[promote];

    let start = header.entries_start();
    let fso = header.free_space_offset as usize;

    let mut left = Page::new();
    InteriorNode::init(page_id, attr_type, left.as_mut_slice(), full.leftmost_child())
        .extend_raw(&scratch[start..promoted.offset], promote as u32);

    let mut right = Page::new();
    InteriorNode::init(new_page_id, attr_type, right.as_mut_slice(), promoted.child)
        .extend_raw(&scratch[promoted.end()..fso], (entries.len() - promote - 1) as u32);

    Ok(InteriorSplit {
        left,
        right,
        separator: promoted.key.to_key(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;
    use crate::common::Rid;
    use crate::index::btree::header::NodeHeader;

    fn overfull_leaf(count: i32) -> Vec<u8> {
        let mut scratch = vec![0u8; PAGE_SIZE * 2];
        let mut leaf = LeafNode::init(
            PageId::new(4),
            AttrType::Int,
            &mut scratch[..],
            PageId::new(1),
            PageId::new(9),
        );
        for v in 0..count {
            leaf.insert(Key::Int(v).as_key_ref(), Rid::new(v as u32, 0)).unwrap();
        }
        scratch
    }

    fn leaf_keys(page: &Page, page_id: PageId) -> Vec<Key> {
        let leaf = LeafNode::load(page_id, AttrType::Int, page.as_slice()).unwrap();
        leaf.entries().map(|e| e.unwrap().key.to_key()).collect()
    }

    #[test]
    fn test_split_index() {
        // Four 10-byte entries starting at 17.
        let ends = [27, 37, 47, 57];
        assert_eq!(split_index(&ends, 17, 40), 1);
        assert_eq!(split_index(&ends, 17, 0), 0);
        assert_eq!(split_index(&[27], 17, 10), 0);
    }

    #[test]
    fn test_split_leaf_halves() {
        let per_page = ((PAGE_SIZE - NodeHeader::LEAF_SIZE) / 12) as i32;
        let scratch = overfull_leaf(per_page + 1);

        let split = split_leaf(&scratch, PageId::new(4), PageId::new(7), AttrType::Int).unwrap();

        let left = leaf_keys(&split.left, PageId::new(4));
        let right = leaf_keys(&split.right, PageId::new(7));
        assert!(!left.is_empty());
        assert!(!right.is_empty());
        assert_eq!(left.len() + right.len(), (per_page + 1) as usize);
        assert!(left.len().abs_diff(right.len()) <= 1);

        assert_eq!(split.separator, right[0]);
        assert!(left.last().unwrap() < &split.separator);

        let all: Vec<Key> = left.into_iter().chain(right).collect();
        assert_eq!(all, (0..=per_page).map(Key::Int).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_leaf_links() {
        let per_page = ((PAGE_SIZE - NodeHeader::LEAF_SIZE) / 12) as i32;
        let scratch = overfull_leaf(per_page + 1);

        let split = split_leaf(&scratch, PageId::new(4), PageId::new(7), AttrType::Int).unwrap();

        let left = LeafNode::load(PageId::new(4), AttrType::Int, split.left.as_slice()).unwrap();
        let right = LeafNode::load(PageId::new(7), AttrType::Int, split.right.as_slice()).unwrap();
        assert_eq!(left.left_sibling(), PageId::new(1));
        assert_eq!(left.right_sibling(), PageId::new(7));
        assert_eq!(right.left_sibling(), PageId::new(4));
        assert_eq!(right.right_sibling(), PageId::new(9));
        assert_eq!(split.old_right_sibling, PageId::new(9));
    }

    #[test]
    fn test_split_leaf_rejects_single_entry() {
        let scratch = overfull_leaf(1);
        assert!(matches!(
            split_leaf(&scratch, PageId::new(4), PageId::new(7), AttrType::Int),
            Err(Error::Corrupted { .. })
        ));
    }

    #[test]
    fn test_split_interior_promotes_middle() {
        let mut scratch = vec![0u8; PAGE_SIZE * 2];
        let count = ((PAGE_SIZE - NodeHeader::INTERIOR_SIZE - 4) / 8 + 1) as u32;
        {
            let mut node =
                InteriorNode::init(PageId::new(2), AttrType::Int, &mut scratch[..], PageId::new(1000));
            for i in 0..count {
                node.insert_at(i as usize, Key::Int(i as i32 * 10).as_key_ref(), PageId::new(1001 + i))
                    .unwrap();
            }
        }

        let split = split_interior(&scratch, PageId::new(2), PageId::new(3), AttrType::Int).unwrap();

        let left = InteriorNode::load(PageId::new(2), AttrType::Int, split.left.as_slice()).unwrap();
        let right = InteriorNode::load(PageId::new(3), AttrType::Int, split.right.as_slice()).unwrap();
        let left_keys = left.keys().unwrap();
        let right_keys = right.keys().unwrap();

        // The promoted key lives in neither half.
        assert_eq!(left_keys.len() + right_keys.len() + 1, count as usize);
        assert!(!left_keys.contains(&split.separator));
        assert!(!right_keys.contains(&split.separator));
        assert!(left_keys.last().unwrap() < &split.separator);
        assert!(split.separator < right_keys[0]);

        let Key::Int(sep) = split.separator else {
            panic!("expected an Int separator");
        };
        assert_eq!(left.leftmost_child(), PageId::new(1000));
        assert_eq!(right.leftmost_child(), PageId::new(1001 + (sep / 10) as u32));

        let mut children = left.children().unwrap();
        children.extend(right.children().unwrap());
        assert_eq!(children, (1000..=1000 + count).map(PageId::new).collect::<Vec<_>>());
    }
}
