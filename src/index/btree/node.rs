//! Typed views over leaf and interior node bytes.
//!
//! A node view wraps any `AsRef<[u8]>` buffer (a [`Page`](crate::storage::page::Page),
//! a borrowed slice, or an oversized scratch `Vec<u8>` during a split) and
//! reads and writes entries in place. The buffer length is the node's capacity.
//!
//! There is no slot directory: entries are variable length and packed back to
//! back, so locating the i-th entry walks from the first one.

use std::cmp::Ordering;

use crate::common::config::{CHILD_POINTER_SIZE, RID_SIZE};
use crate::common::{Error, PageId, Result, Rid};

use super::header::{read_u32, write_u32, NodeHeader, NodeKind};
use super::key::{AttrType, Key, KeyRef};

// =============================================================================
// Entry walking
// =============================================================================

/// One decoded `(key, rid)` entry of a leaf.
#[derive(Debug, Clone, Copy)]
pub struct LeafEntry<'a> {
    pub key: KeyRef<'a>,
    pub rid: Rid,
    /// Byte offset of the entry within the node.
    pub offset: usize,
    /// Encoded size of the entry.
    pub len: usize,
}

impl LeafEntry<'_> {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// One decoded `(key, child)` entry of an interior node.
///
/// `child` holds keys greater than or equal to `key`.
#[derive(Debug, Clone, Copy)]
pub struct InteriorEntry<'a> {
    pub key: KeyRef<'a>,
    pub child: PageId,
    pub offset: usize,
    pub len: usize,
}

impl InteriorEntry<'_> {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

struct RawEntry<'a> {
    key: KeyRef<'a>,
    offset: usize,
    key_len: usize,
    len: usize,
}

/// Walks the packed entries between the header and the free space offset.
///
/// Yields a corruption error (once) if an entry is truncated, runs past the
/// free space offset, or the entry count disagrees with the bytes present.
struct RawEntries<'a> {
    page_id: PageId,
    attr_type: AttrType,
    data: &'a [u8],
    offset: usize,
    end: usize,
    remaining: u32,
    payload: usize,
    done: bool,
}

impl<'a> RawEntries<'a> {
    fn new(page_id: PageId, attr_type: AttrType, data: &'a [u8], header: &NodeHeader) -> Self {
        Self::starting_at(page_id, attr_type, data, header, header.entries_start(), 0)
    }

    /// Resume a walk at byte `offset`, with `consumed` entries already behind it.
    fn starting_at(
        page_id: PageId,
        attr_type: AttrType,
        data: &'a [u8],
        header: &NodeHeader,
        offset: usize,
        consumed: u32,
    ) -> Self {
        let payload = match header.kind {
            NodeKind::Leaf => RID_SIZE,
            NodeKind::Interior => CHILD_POINTER_SIZE,
        };
        Self {
            page_id,
            attr_type,
            data,
            offset,
            end: header.free_space_offset as usize,
            remaining: header.num_entries.saturating_sub(consumed),
            payload,
            done: false,
        }
    }

    fn fail(&mut self, reason: String) -> Option<Result<RawEntry<'a>>> {
        self.done = true;
        Some(Err(Error::corrupted(self.page_id, reason)))
    }
}

impl<'a> Iterator for RawEntries<'a> {
    type Item = Result<RawEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.offset > self.end {
            let reason = format!("entry offset {} past free space offset {}", self.offset, self.end);
            return self.fail(reason);
        }

        if self.remaining == 0 {
            self.done = true;
            if self.offset != self.end {
                let reason = format!(
                    "entries end at {} but free space offset is {}",
                    self.offset, self.end
                );
                return self.fail(reason);
            }
            return None;
        }

        let data = self.data;
        let key = match KeyRef::decode(self.attr_type, &data[self.offset..self.end]) {
            Some(key) => key,
            None => {
                let reason = format!("truncated key at offset {}", self.offset);
                return self.fail(reason);
            }
        };

        let key_len = key.encoded_len();
        let len = key_len + self.payload;
        if self.offset + len > self.end {
            let reason = format!(
                "entry at offset {} runs past free space offset {}",
                self.offset, self.end
            );
            return self.fail(reason);
        }

        let entry = RawEntry {
            key,
            offset: self.offset,
            key_len,
            len,
        };
        self.offset += len;
        self.remaining -= 1;
        Some(Ok(entry))
    }
}

/// Shift `data[at..fso]` right by `size` bytes to open a gap at `at`.
fn open_gap(data: &mut [u8], at: usize, fso: usize, size: usize) {
    data.copy_within(at..fso, at + size);
}

/// Remove `len` bytes at `at`, shifting the tail left and zeroing the freed bytes.
fn close_gap(data: &mut [u8], at: usize, len: usize, fso: usize) {
    data.copy_within(at + len..fso, at);
    data[fso - len..fso].fill(0);
}

// =============================================================================
// Leaf nodes
// =============================================================================

/// A leaf node: `(key, rid)` entries plus links to neighbouring leaves.
///
/// Entries are kept sorted by `(key, rid)`, so equal keys are ordered by RID.
///
/// # Example
/// ```
/// use secidx::index::btree::{AttrType, Key, LeafNode};
/// use secidx::{PageId, Rid};
///
/// let mut buf = vec![0u8; 4096];
/// let mut leaf = LeafNode::init(PageId::new(0), AttrType::Int, &mut buf[..], PageId::INVALID, PageId::INVALID);
/// leaf.insert(Key::Int(7).as_key_ref(), Rid::new(1, 1)).unwrap();
/// leaf.insert(Key::Int(3).as_key_ref(), Rid::new(1, 2)).unwrap();
///
/// let keys: Vec<Key> = leaf.entries().map(|e| e.unwrap().key.to_key()).collect();
/// assert_eq!(keys, vec![Key::Int(3), Key::Int(7)]);
/// ```
pub struct LeafNode<B> {
    page_id: PageId,
    attr_type: AttrType,
    header: NodeHeader,
    data: B,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    /// Interpret `data` as a leaf, validating its header.
    ///
    /// # Errors
    /// - `Error::Corrupted` if the header is out of bounds
    /// - `Error::NotALeaf` if the page is tagged interior
    pub fn load(page_id: PageId, attr_type: AttrType, data: B) -> Result<Self> {
        let header = NodeHeader::read(page_id, data.as_ref())?;
        if header.kind != NodeKind::Leaf {
            return Err(Error::NotALeaf(page_id));
        }
        Ok(Self {
            page_id,
            attr_type,
            header,
            data,
        })
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    #[inline]
    pub fn num_entries(&self) -> u32 {
        self.header.num_entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.num_entries == 0
    }

    #[inline]
    pub fn left_sibling(&self) -> PageId {
        self.header.left_sibling
    }

    #[inline]
    pub fn right_sibling(&self) -> PageId {
        self.header.right_sibling
    }

    /// Whether an entry of `entry_size` bytes fits in the remaining space.
    #[inline]
    pub fn fits(&self, entry_size: usize) -> bool {
        self.header.free_space_offset as usize + entry_size <= self.data.as_ref().len()
    }

    /// Entries in stored order.
    pub fn entries(&self) -> impl Iterator<Item = Result<LeafEntry<'_>>> + '_ {
        self.entries_from(self.header.entries_start(), 0)
    }

    /// Entries from byte `offset` on, where `offset` is the end of the
    /// `consumed`-th entry. Lets a cursor resume without rescanning the node.
    pub fn entries_from(
        &self,
        offset: usize,
        consumed: u32,
    ) -> impl Iterator<Item = Result<LeafEntry<'_>>> + '_ {
        let data = self.data.as_ref();
        let raw = RawEntries::starting_at(
            self.page_id,
            self.attr_type,
            data,
            &self.header,
            offset,
            consumed,
        );
        raw.map(move |raw| {
            raw.map(|raw| {
                let rid_at = raw.offset + raw.key_len;
                LeafEntry {
                    key: raw.key,
                    rid: Rid::from_bytes(&data[rid_at..rid_at + RID_SIZE]),
                    offset: raw.offset,
                    len: raw.len,
                }
            })
        })
    }

    /// Whether the exact `(key, rid)` pair is stored here.
    pub fn contains(&self, key: KeyRef<'_>, rid: Rid) -> Result<bool> {
        Ok(self.find(key, rid)?.is_some())
    }

    /// Raw node bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.data
    }

    /// Offset and length of the exact `(key, rid)` entry.
    fn find(&self, key: KeyRef<'_>, rid: Rid) -> Result<Option<(usize, usize)>> {
        for entry in self.entries() {
            let entry = entry?;
            match entry.key.cmp(&key).then(entry.rid.cmp(&rid)) {
                Ordering::Less => continue,
                Ordering::Equal => return Ok(Some((entry.offset, entry.len))),
                Ordering::Greater => break,
            }
        }
        Ok(None)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Format `data` as an empty leaf between `left_sibling` and `right_sibling`.
    pub fn init(
        page_id: PageId,
        attr_type: AttrType,
        mut data: B,
        left_sibling: PageId,
        right_sibling: PageId,
    ) -> Self {
        let header = NodeHeader::new_leaf(left_sibling, right_sibling);
        header.write_to(data.as_mut());
        Self {
            page_id,
            attr_type,
            header,
            data,
        }
    }

    /// Insert `(key, rid)` in sorted position.
    ///
    /// # Errors
    /// Returns `Error::DuplicateEntry` if the pair is already present.
    ///
    /// # Panics
    /// Panics if the entry does not fit; check [`LeafNode::fits`] first.
    pub fn insert(&mut self, key: KeyRef<'_>, rid: Rid) -> Result<()> {
        let size = key.encoded_len() + RID_SIZE;
        assert!(self.fits(size), "leaf entry does not fit");

        let fso = self.header.free_space_offset as usize;
        let mut at = fso;
        for entry in self.entries() {
            let entry = entry?;
            match entry.key.cmp(&key).then(entry.rid.cmp(&rid)) {
                Ordering::Less => continue,
                Ordering::Equal => return Err(Error::DuplicateEntry),
                Ordering::Greater => {
                    at = entry.offset;
                    break;
                }
            }
        }

        let data = self.data.as_mut();
        open_gap(data, at, fso, size);
        key.encode_into(&mut data[at..]);
        rid.write_to(&mut data[at + key.encoded_len()..at + size]);

        self.header.num_entries += 1;
        self.header.free_space_offset += size as u32;
        self.flush_header();
        Ok(())
    }

    /// Remove the exact `(key, rid)` entry.
    ///
    /// Returns `false` if no such entry exists.
    pub fn remove(&mut self, key: KeyRef<'_>, rid: Rid) -> Result<bool> {
        let Some((at, len)) = self.find(key, rid)? else {
            return Ok(false);
        };

        let fso = self.header.free_space_offset as usize;
        close_gap(self.data.as_mut(), at, len, fso);

        self.header.num_entries -= 1;
        self.header.free_space_offset -= len as u32;
        self.flush_header();
        Ok(true)
    }

    pub fn set_left_sibling(&mut self, page_id: PageId) {
        self.header.left_sibling = page_id;
        self.flush_header();
    }

    pub fn set_right_sibling(&mut self, page_id: PageId) {
        self.header.right_sibling = page_id;
        self.flush_header();
    }

    /// Append `count` already-encoded entries after the last one.
    ///
    /// The caller guarantees `bytes` sort after every stored entry.
    pub(crate) fn extend_raw(&mut self, bytes: &[u8], count: u32) {
        let fso = self.header.free_space_offset as usize;
        self.data.as_mut()[fso..fso + bytes.len()].copy_from_slice(bytes);
        self.header.num_entries += count;
        self.header.free_space_offset += bytes.len() as u32;
        self.flush_header();
    }

    fn flush_header(&mut self) {
        self.header.write_to(self.data.as_mut());
    }
}

// =============================================================================
// Interior nodes
// =============================================================================

/// An interior node: a leftmost child followed by `(key, child)` entries.
///
/// With keys `k1 < ... < kn` and children `c0..cn`, child `ci` (i > 0) is
/// stored alongside `ki` and holds keys `>= ki`; `c0` holds keys `< k1`.
/// Child indexes used by this type run over `0..=n`.
pub struct InteriorNode<B> {
    page_id: PageId,
    attr_type: AttrType,
    header: NodeHeader,
    data: B,
}

impl<B: AsRef<[u8]>> InteriorNode<B> {
    /// Interpret `data` as an interior node, validating its header.
    ///
    /// # Errors
    /// - `Error::Corrupted` if the header is out of bounds
    /// - `Error::NotAnInterior` if the page is tagged leaf
    pub fn load(page_id: PageId, attr_type: AttrType, data: B) -> Result<Self> {
        let header = NodeHeader::read(page_id, data.as_ref())?;
        if header.kind != NodeKind::Interior {
            return Err(Error::NotAnInterior(page_id));
        }
        Ok(Self {
            page_id,
            attr_type,
            header,
            data,
        })
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    /// Number of separator keys.
    #[inline]
    pub fn num_entries(&self) -> u32 {
        self.header.num_entries
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.header.num_entries as usize + 1
    }

    #[inline]
    pub fn leftmost_child(&self) -> PageId {
        PageId::new(read_u32(self.data.as_ref(), NodeHeader::OFFSET_LEFTMOST_CHILD))
    }

    #[inline]
    pub fn fits(&self, entry_size: usize) -> bool {
        self.header.free_space_offset as usize + entry_size <= self.data.as_ref().len()
    }

    /// Entries in stored order.
    pub fn entries(&self) -> impl Iterator<Item = Result<InteriorEntry<'_>>> + '_ {
        let data = self.data.as_ref();
        RawEntries::new(self.page_id, self.attr_type, data, &self.header).map(move |raw| {
            raw.map(|raw| InteriorEntry {
                key: raw.key,
                child: PageId::new(read_u32(data, raw.offset + raw.key_len)),
                offset: raw.offset,
                len: raw.len,
            })
        })
    }

    /// Page number of child `index` (0 is the leftmost child).
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if `index` is past the last child.
    pub fn child_at(&self, index: usize) -> Result<PageId> {
        if index == 0 {
            return Ok(self.leftmost_child());
        }
        Ok(self.entry_at(index - 1)?.child)
    }

    /// Every child in order, leftmost first.
    pub fn children(&self) -> Result<Vec<PageId>> {
        let mut children = Vec::with_capacity(self.num_children());
        children.push(self.leftmost_child());
        for entry in self.entries() {
            children.push(entry?.child);
        }
        Ok(children)
    }

    /// Every separator key, copied out.
    pub fn keys(&self) -> Result<Vec<Key>> {
        self.entries().map(|e| e.map(|e| e.key.to_key())).collect()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.data
    }

    fn entry_at(&self, index: usize) -> Result<InteriorEntry<'_>> {
        match self.entries().nth(index) {
            Some(entry) => entry,
            None => Err(Error::corrupted(
                self.page_id,
                format!("no entry {} among {}", index, self.header.num_entries),
            )),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InteriorNode<B> {
    /// Format `data` as an interior node whose only child is `leftmost_child`.
    pub fn init(page_id: PageId, attr_type: AttrType, mut data: B, leftmost_child: PageId) -> Self {
        let header = NodeHeader::new_interior();
        header.write_to(data.as_mut());
        write_u32(data.as_mut(), NodeHeader::OFFSET_LEFTMOST_CHILD, leftmost_child.0);
        Self {
            page_id,
            attr_type,
            header,
            data,
        }
    }

    pub fn set_leftmost_child(&mut self, page_id: PageId) {
        write_u32(self.data.as_mut(), NodeHeader::OFFSET_LEFTMOST_CHILD, page_id.0);
    }

    /// Insert `(key, child)` as entry `index`, so `child` becomes child `index + 1`.
    ///
    /// A split of child `i` pushes its separator with `index = i`, placing the
    /// new page directly after the page that split.
    ///
    /// # Panics
    /// Panics if the entry does not fit; check [`InteriorNode::fits`] first.
    pub fn insert_at(&mut self, index: usize, key: KeyRef<'_>, child: PageId) -> Result<()> {
        let size = key.encoded_len() + CHILD_POINTER_SIZE;
        assert!(self.fits(size), "interior entry does not fit");

        let fso = self.header.free_space_offset as usize;
        let at = if index == self.header.num_entries as usize {
            fso
        } else {
            self.entry_at(index)?.offset
        };

        let data = self.data.as_mut();
        open_gap(data, at, fso, size);
        key.encode_into(&mut data[at..]);
        write_u32(data, at + key.encoded_len(), child.0);

        self.header.num_entries += 1;
        self.header.free_space_offset += size as u32;
        self.flush_header();
        Ok(())
    }

    /// Drop child `index` together with one neighbouring separator.
    ///
    /// Removing the leftmost child promotes the first entry's child to
    /// leftmost and drops that entry; removing child `i > 0` drops entry `i - 1`.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the node has no entries to drop.
    pub fn remove_child(&mut self, index: usize) -> Result<()> {
        let (at, len, promoted) = if index == 0 {
            let first = self.entry_at(0)?;
            (first.offset, first.len, Some(first.child))
        } else {
            let entry = self.entry_at(index - 1)?;
            (entry.offset, entry.len, None)
        };

        if let Some(child) = promoted {
            self.set_leftmost_child(child);
        }

        let fso = self.header.free_space_offset as usize;
        close_gap(self.data.as_mut(), at, len, fso);

        self.header.num_entries -= 1;
        self.header.free_space_offset -= len as u32;
        self.flush_header();
        Ok(())
    }

    /// Append `count` already-encoded entries after the last one.
    pub(crate) fn extend_raw(&mut self, bytes: &[u8], count: u32) {
        let fso = self.header.free_space_offset as usize;
        self.data.as_mut()[fso..fso + bytes.len()].copy_from_slice(bytes);
        self.header.num_entries += count;
        self.header.free_space_offset += bytes.len() as u32;
        self.flush_header();
    }

    fn flush_header(&mut self) {
        self.header.write_to(self.data.as_mut());
    }
}
