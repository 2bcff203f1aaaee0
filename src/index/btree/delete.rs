//! Deletion without rebalancing.
//!
//! Entries are removed from their leaf and underfull leaves are tolerated.
//! The tree never shrinks. The one structural change is reclaiming a leaf
//! that a deletion emptied: if its parent has at least two separators, the
//! leaf is unlinked from its neighbours, dropped from the parent together with
//! one separator, and reset so the allocator can reuse the page. Otherwise the
//! empty leaf stays in place and scans step over it.

use tracing::{debug, trace};

use crate::common::{Error, PageId, Result, Rid};
use crate::storage::page::Page;

use super::allocator;
use super::header::{NodeHeader, NodeKind};
use super::index_file::IndexFile;
use super::key::{AttrType, Attribute, Key, KeyRef};
use super::navigator::{route, route_leftmost};
use super::node::{InteriorNode, LeafNode};

/// What a subtree delete reports to its parent.
enum Removal {
    Done,
    /// A non-root leaf lost its last entry.
    LeafEmptied { left: PageId, right: PageId },
}

impl IndexFile {
    /// Remove the exact `(key, rid)` entry from the index.
    ///
    /// # Errors
    /// - `Error::EntryNotFound` if no entry matches both key and RID
    /// - `Error::KeyTypeMismatch` / `Error::KeyTooLarge` if the key does not
    ///   suit `attribute`
    pub fn delete_entry(&mut self, attribute: &Attribute, key: &Key, rid: Rid) -> Result<()> {
        key.validate(attribute)?;

        let root = self.root.get();
        match self.delete_from(root, true, attribute.attr_type, key.as_key_ref(), rid)? {
            Some(_) => Ok(()),
            None => Err(Error::EntryNotFound),
        }
    }

    /// Returns `None` if the subtree does not hold the entry.
    fn delete_from(
        &mut self,
        page_id: PageId,
        is_root: bool,
        attr_type: AttrType,
        key: KeyRef<'_>,
        rid: Rid,
    ) -> Result<Option<Removal>> {
        let mut page = self.disk.read_page(page_id)?;
        let header = NodeHeader::read(page_id, page.as_slice())?;

        if header.kind == NodeKind::Leaf {
            let mut leaf = LeafNode::load(page_id, attr_type, page.as_mut_slice())?;
            if !leaf.remove(key, rid)? {
                return Ok(None);
            }
            let removal = if leaf.is_empty() && !is_root {
                Removal::LeafEmptied {
                    left: leaf.left_sibling(),
                    right: leaf.right_sibling(),
                }
            } else {
                Removal::Done
            };
            self.disk.write_page(page_id, &page)?;
            return Ok(Some(removal));
        }

        // Equal keys may sit in every child between these two.
        let candidates = {
            let node = InteriorNode::load(page_id, attr_type, page.as_slice())?;
            let (first, _) = route_leftmost(&node, Some(key))?;
            let (last, _) = route(&node, Some(key))?;
            (first..=last)
                .map(|index| node.child_at(index).map(|child| (index, child)))
                .collect::<Result<Vec<_>>>()?
        };

        for (index, child) in candidates {
            self.check_child(page_id, child)?;
            match self.delete_from(child, false, attr_type, key, rid)? {
                None => continue,
                Some(Removal::Done) => return Ok(Some(Removal::Done)),
                Some(Removal::LeafEmptied { left, right }) => {
                    self.reclaim_leaf(page_id, page, attr_type, index, child, left, right)?;
                    return Ok(Some(Removal::Done));
                }
            }
        }
        Ok(None)
    }

    /// Drop the emptied leaf at child `index` of `parent_id`, if the parent can spare a key.
    #[allow(clippy::too_many_arguments)]
    fn reclaim_leaf(
        &mut self,
        parent_id: PageId,
        mut parent_page: Page,
        attr_type: AttrType,
        index: usize,
        leaf_id: PageId,
        left: PageId,
        right: PageId,
    ) -> Result<()> {
        let mut parent = InteriorNode::load(parent_id, attr_type, parent_page.as_mut_slice())?;
        if parent.num_entries() < 2 {
            trace!(page = %leaf_id, parent = %parent_id, "keeping empty leaf");
            return Ok(());
        }
        parent.remove_child(index)?;
        self.disk.write_page(parent_id, &parent_page)?;

        if left.is_valid() {
            let mut page = self.disk.read_page(left)?;
            LeafNode::load(left, attr_type, page.as_mut_slice())?.set_right_sibling(right);
            self.disk.write_page(left, &page)?;
        }
        if right.is_valid() {
            let mut page = self.disk.read_page(right)?;
            LeafNode::load(right, attr_type, page.as_mut_slice())?.set_left_sibling(left);
            self.disk.write_page(right, &page)?;
        }

        allocator::release(&mut self.disk, leaf_id)?;
        debug!(page = %leaf_id, parent = %parent_id, "reclaimed empty leaf");
        Ok(())
    }
}
