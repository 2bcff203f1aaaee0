//! Insertion with node splitting and root growth.
//!
//! Insertion descends from the root. Where several children could hold the
//! key, it picks the one that keeps the leaf list ordered by `(key, rid)`.
//! A leaf that cannot take the new entry is split; the separator then
//! travels back up the recursion and may split each ancestor in turn. When it
//! reaches the top, a new root is created above the old one.

use std::cmp::Ordering;

use tracing::debug;

use crate::common::config::{CHILD_POINTER_SIZE, PAGE_SIZE, RID_SIZE};
use crate::common::{Error, PageId, Result, Rid};
use crate::storage::page::Page;

use super::allocator;
use super::header::{NodeHeader, NodeKind};
use super::index_file::IndexFile;
use super::key::{AttrType, Attribute, Key, KeyRef};
use super::navigator::{route, route_leftmost};
use super::node::{InteriorNode, LeafNode};
use super::split::{split_interior, split_leaf};

/// What a subtree insert reports to its parent.
enum InsertOutcome {
    /// The entry was absorbed without changing the parent.
    Done,
    /// The child split; `right` must be linked into the parent after it.
    Split { separator: Key, right: PageId },
}

impl IndexFile {
    /// Add `(key, rid)` to the index.
    ///
    /// # Errors
    /// - `Error::KeyTypeMismatch` / `Error::KeyTooLarge` if the key does not
    ///   suit `attribute`
    /// - `Error::DuplicateEntry` if the exact pair is already indexed
    pub fn insert_entry(&mut self, attribute: &Attribute, key: &Key, rid: Rid) -> Result<()> {
        key.validate(attribute)?;
        if self.contains_entry(attribute, key, rid)? {
            return Err(Error::DuplicateEntry);
        }

        let attr_type = attribute.attr_type;
        let root = self.root.get();
        match self.insert_into(root, attr_type, key.as_key_ref(), rid)? {
            InsertOutcome::Done => Ok(()),
            InsertOutcome::Split { separator, right } => {
                self.grow_root(attr_type, root, &separator, right)
            }
        }
    }

    /// Whether the exact `(key, rid)` pair is indexed.
    ///
    /// Equal keys may span several leaves, so this walks every entry equal to
    /// `key` rather than a single leaf.
    pub fn contains_entry(&mut self, attribute: &Attribute, key: &Key, rid: Rid) -> Result<bool> {
        let mut scan = self.scan(attribute, Some(key), Some(key), true, true)?;
        while let Some((found, _)) = scan.get_next()? {
            if found == rid {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn insert_into(
        &mut self,
        page_id: PageId,
        attr_type: AttrType,
        key: KeyRef<'_>,
        rid: Rid,
    ) -> Result<InsertOutcome> {
        let page = self.disk.read_page(page_id)?;
        let header = NodeHeader::read(page_id, page.as_slice())?;
        if header.kind == NodeKind::Leaf {
            return self.insert_into_leaf(page_id, page, attr_type, key, rid);
        }

        let candidates = {
            let node = InteriorNode::load(page_id, attr_type, page.as_slice())?;
            let (first, _) = route_leftmost(&node, Some(key))?;
            let (last, _) = route(&node, Some(key))?;
            (first..=last)
                .map(|index| node.child_at(index).map(|child| (index, child)))
                .collect::<Result<Vec<_>>>()?
        };
        let (index, child) = self.choose_child(page_id, attr_type, &candidates, key, rid)?;
        self.check_child(page_id, child)?;

        match self.insert_into(child, attr_type, key, rid)? {
            InsertOutcome::Done => Ok(InsertOutcome::Done),
            InsertOutcome::Split { separator, right } => {
                self.insert_separator(page_id, page, attr_type, index, &separator, right)
            }
        }
    }

    /// Pick the child of `parent` where `(key, rid)` belongs.
    ///
    /// `candidates` are the children that may hold `key`, in order. Equal keys
    /// can span all of them, so the pair goes to the last child whose first
    /// entry does not sort after it, or to the first candidate if none does.
    fn choose_child(
        &mut self,
        parent: PageId,
        attr_type: AttrType,
        candidates: &[(usize, PageId)],
        key: KeyRef<'_>,
        rid: Rid,
    ) -> Result<(usize, PageId)> {
        let Some((&first, rest)) = candidates.split_first() else {
            return Err(Error::corrupted(parent, "no child routes the key"));
        };
        for &(index, child) in rest.iter().rev() {
            self.check_child(parent, child)?;
            if let Some((found_key, found_rid)) = self.first_entry_from(child, attr_type)? {
                let order = found_key.as_key_ref().cmp(&key).then(found_rid.cmp(&rid));
                if order != Ordering::Greater {
                    return Ok((index, child));
                }
            }
        }
        Ok(first)
    }

    /// First entry in leaf order, starting at the leftmost leaf under `page_id`.
    ///
    /// Empty leaves are stepped over, so the entry may lie outside the subtree.
    fn first_entry_from(&mut self, page_id: PageId, attr_type: AttrType) -> Result<Option<(Key, Rid)>> {
        let mut page_id = page_id;
        let mut page = self.disk.read_page(page_id)?;
        while NodeHeader::read(page_id, page.as_slice())?.kind == NodeKind::Interior {
            let child = InteriorNode::load(page_id, attr_type, page.as_slice())?.leftmost_child();
            self.check_child(page_id, child)?;
            page_id = child;
            self.disk.read_page_into(page_id, &mut page)?;
        }

        loop {
            let leaf = LeafNode::load(page_id, attr_type, page.as_slice())?;
            let first = leaf.entries().next().transpose()?;
            if let Some(entry) = first {
                return Ok(Some((entry.key.to_key(), entry.rid)));
            }
            let next = leaf.right_sibling();
            if !next.is_valid() {
                return Ok(None);
            }
            page_id = next;
            self.disk.read_page_into(page_id, &mut page)?;
        }
    }

    fn insert_into_leaf(
        &mut self,
        page_id: PageId,
        mut page: Page,
        attr_type: AttrType,
        key: KeyRef<'_>,
        rid: Rid,
    ) -> Result<InsertOutcome> {
        let size = key.encoded_len() + RID_SIZE;
        let mut leaf = LeafNode::load(page_id, attr_type, page.as_mut_slice())?;
        if leaf.fits(size) {
            leaf.insert(key, rid)?;
            self.disk.write_page(page_id, &page)?;
            return Ok(InsertOutcome::Done);
        }

        // Insert into an oversized copy, then divide it between two pages.
        let mut scratch = vec![0u8; PAGE_SIZE * 2];
        scratch[..PAGE_SIZE].copy_from_slice(page.as_slice());
        LeafNode::load(page_id, attr_type, &mut scratch[..])?.insert(key, rid)?;

        let new_page_id = allocator::allocate(&mut self.disk)?;
        let split = split_leaf(&scratch, page_id, new_page_id, attr_type)?;
        self.disk.write_page(new_page_id, &split.right)?;
        self.disk.write_page(page_id, &split.left)?;

        let neighbour = split.old_right_sibling;
        if neighbour.is_valid() {
            let mut page = self.disk.read_page(neighbour)?;
            LeafNode::load(neighbour, attr_type, page.as_mut_slice())?.set_left_sibling(new_page_id);
            self.disk.write_page(neighbour, &page)?;
        }

        debug!(page = %page_id, new_page = %new_page_id, separator = %split.separator, "split leaf");
        Ok(InsertOutcome::Split {
            separator: split.separator,
            right: new_page_id,
        })
    }

    /// Link a split child's new sibling into this interior node.
    ///
    /// `index` is the child that split; the new entry goes right after it.
    fn insert_separator(
        &mut self,
        page_id: PageId,
        mut page: Page,
        attr_type: AttrType,
        index: usize,
        separator: &Key,
        right: PageId,
    ) -> Result<InsertOutcome> {
        let size = separator.encoded_len() + CHILD_POINTER_SIZE;
        let mut node = InteriorNode::load(page_id, attr_type, page.as_mut_slice())?;
        if node.fits(size) {
            node.insert_at(index, separator.as_key_ref(), right)?;
            self.disk.write_page(page_id, &page)?;
            return Ok(InsertOutcome::Done);
        }

        let mut scratch = vec![0u8; PAGE_SIZE * 2];
        scratch[..PAGE_SIZE].copy_from_slice(page.as_slice());
        InteriorNode::load(page_id, attr_type, &mut scratch[..])?.insert_at(
            index,
            separator.as_key_ref(),
            right,
        )?;

        let new_page_id = allocator::allocate(&mut self.disk)?;
        let split = split_interior(&scratch, page_id, new_page_id, attr_type)?;
        self.disk.write_page(new_page_id, &split.right)?;
        self.disk.write_page(page_id, &split.left)?;

        debug!(page = %page_id, new_page = %new_page_id, separator = %split.separator, "split interior node");
        Ok(InsertOutcome::Split {
            separator: split.separator,
            right: new_page_id,
        })
    }

    /// Put a new interior root above `old_root` and its new sibling.
    fn grow_root(
        &mut self,
        attr_type: AttrType,
        old_root: PageId,
        separator: &Key,
        right: PageId,
    ) -> Result<()> {
        let new_root = allocator::allocate(&mut self.disk)?;

        let mut page = Page::new();
        InteriorNode::init(new_root, attr_type, page.as_mut_slice(), old_root).insert_at(
            0,
            separator.as_key_ref(),
            right,
        )?;
        self.disk.write_page(new_root, &page)?;
        self.root.set(new_root)?;

        debug!(old_root = %old_root, new_root = %new_root, "tree grew a level");
        Ok(())
    }
}
