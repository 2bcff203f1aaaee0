//! Range scans over the leaf list.
//!
//! A scan descends once to the leftmost leaf that could hold the low bound,
//! then walks right through sibling links. It holds one leaf page at a time
//! and stops at the first entry past the high bound, since every later entry
//! sorts at or after it.

use std::cmp::Ordering;

use tracing::trace;

use crate::common::{Error, PageId, Result, Rid};
use crate::storage::page::Page;
use crate::storage::DiskManager;

use super::header::{NodeHeader, NodeKind};
use super::index_file::IndexFile;
use super::key::{compare_bounded, AttrType, Attribute, Key, KeyRef};
use super::navigator::route_leftmost;
use super::node::{InteriorNode, LeafNode};

impl IndexFile {
    /// Open a scan over entries with keys between `low` and `high`.
    ///
    /// `None` leaves that end unbounded. Entries come back in ascending key
    /// order as `(rid, key)` pairs.
    ///
    /// # Errors
    /// Returns `Error::KeyTypeMismatch` / `Error::KeyTooLarge` if a bound does
    /// not suit `attribute`, or a storage error if the descent fails.
    ///
    /// # Example
    /// ```
    /// use secidx::{Attribute, IndexFile, Key, Rid};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("score.idx");
    /// let score = Attribute::int("score");
    /// IndexFile::create(&path).unwrap();
    /// let mut index = IndexFile::open(&path).unwrap();
    /// for v in 0..10 {
    ///     index.insert_entry(&score, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
    /// }
    ///
    /// // 3 < key <= 6
    /// let keys: Vec<Key> = index
    ///     .scan(&score, Some(&Key::Int(3)), Some(&Key::Int(6)), false, true)
    ///     .unwrap()
    ///     .map(|entry| entry.unwrap().1)
    ///     .collect();
    /// assert_eq!(keys, vec![Key::Int(4), Key::Int(5), Key::Int(6)]);
    /// ```
    pub fn scan(
        &mut self,
        attribute: &Attribute,
        low: Option<&Key>,
        high: Option<&Key>,
        low_inclusive: bool,
        high_inclusive: bool,
    ) -> Result<ScanIterator<'_>> {
        for bound in [low, high].into_iter().flatten() {
            bound.validate(attribute)?;
        }

        let attr_type = attribute.attr_type;
        let (page_id, page) = self.find_leaf(attr_type, low.map(Key::as_key_ref))?;
        trace!(leaf = %page_id, "opened scan");

        Ok(ScanIterator {
            disk: &mut self.disk,
            attr_type,
            bounds: Bounds {
                low: low.cloned(),
                high: high.cloned(),
                low_inclusive,
                high_inclusive,
            },
            state: ScanState::Open(Cursor {
                page_id,
                page,
                offset: NodeHeader::LEAF_SIZE,
                consumed: 0,
            }),
        })
    }

    /// Descend to the leftmost leaf that could hold `key`.
    fn find_leaf(&mut self, attr_type: AttrType, key: Option<KeyRef<'_>>) -> Result<(PageId, Page)> {
        let mut page_id = self.root.get();
        loop {
            let page = self.disk.read_page(page_id)?;
            let header = NodeHeader::read(page_id, page.as_slice())?;
            if header.kind == NodeKind::Leaf {
                return Ok((page_id, page));
            }

            let node = InteriorNode::load(page_id, attr_type, page.as_slice())?;
            let (_, child) = route_leftmost(&node, key)?;
            self.check_child(page_id, child)?;
            page_id = child;
        }
    }
}

/// Scan bounds; `None` is unbounded.
struct Bounds {
    low: Option<Key>,
    high: Option<Key>,
    low_inclusive: bool,
    high_inclusive: bool,
}

impl Bounds {
    fn below_low(&self, key: KeyRef<'_>) -> bool {
        match compare_bounded(self.low.as_ref().map(Key::as_key_ref), Some(key)) {
            Ordering::Greater => true,
            Ordering::Equal => !self.low_inclusive,
            Ordering::Less => false,
        }
    }

    fn above_high(&self, key: KeyRef<'_>) -> bool {
        match compare_bounded(Some(key), self.high.as_ref().map(Key::as_key_ref)) {
            Ordering::Greater => true,
            Ordering::Equal => !self.high_inclusive,
            Ordering::Less => false,
        }
    }
}

/// Position inside the current leaf.
struct Cursor {
    page_id: PageId,
    page: Page,
    /// End of the last consumed entry.
    offset: usize,
    consumed: u32,
}

enum ScanState {
    Open(Cursor),
    /// Past the high bound or the last leaf; the page has been released.
    Exhausted,
    Closed,
}

/// What the cursor found at its current position.
enum Step {
    Emit(Rid, Key),
    Skip,
    Stop,
    NextLeaf(PageId),
}

/// A forward-only, single-pass cursor over a key range.
///
/// Holds the index mutably borrowed, so the tree cannot change under it.
/// Entries are produced as `(rid, key)`:
/// - `get_next()` returns `Ok(None)` once the range is exhausted, and keeps
///   doing so on later calls
/// - after `close()`, `get_next()` returns `Error::IteratorClosed`
/// - any other error ends the scan
///
/// Also usable as an `Iterator` of `Result<(Rid, Key)>`.
pub struct ScanIterator<'a> {
    disk: &'a mut DiskManager,
    attr_type: AttrType,
    bounds: Bounds,
    state: ScanState,
}

impl ScanIterator<'_> {
    /// Produce the next entry in range.
    pub fn get_next(&mut self) -> Result<Option<(Rid, Key)>> {
        let result = self.advance();
        if result.is_err() && matches!(self.state, ScanState::Open(_)) {
            self.state = ScanState::Exhausted;
        }
        result
    }

    /// Release the held page. Later `get_next` calls fail.
    pub fn close(&mut self) {
        self.state = ScanState::Closed;
    }

    /// Whether [`ScanIterator::close`] has been called.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ScanState::Closed)
    }

    fn advance(&mut self) -> Result<Option<(Rid, Key)>> {
        loop {
            let cursor = match &mut self.state {
                ScanState::Open(cursor) => cursor,
                ScanState::Exhausted => return Ok(None),
                ScanState::Closed => return Err(Error::IteratorClosed),
            };

            let step = {
                let leaf = LeafNode::load(cursor.page_id, self.attr_type, cursor.page.as_slice())?;
                let next = leaf.entries_from(cursor.offset, cursor.consumed).next();
                let step = match next {
                    None => Step::NextLeaf(leaf.right_sibling()),
                    Some(entry) => {
                        let entry = entry?;
                        cursor.offset = entry.end();
                        cursor.consumed += 1;
                        if self.bounds.above_high(entry.key) {
                            Step::Stop
                        } else if self.bounds.below_low(entry.key) {
                            Step::Skip
                        } else {
                            Step::Emit(entry.rid, entry.key.to_key())
                        }
                    }
                };
                step
            };

            match step {
                Step::Emit(rid, key) => return Ok(Some((rid, key))),
                Step::Skip => continue,
                Step::Stop => {
                    self.state = ScanState::Exhausted;
                    return Ok(None);
                }
                Step::NextLeaf(next) if !next.is_valid() => {
                    self.state = ScanState::Exhausted;
                    return Ok(None);
                }
                Step::NextLeaf(next) => {
                    self.disk.read_page_into(next, &mut cursor.page)?;
                    cursor.page_id = next;
                    cursor.offset = NodeHeader::LEAF_SIZE;
                    cursor.consumed = 0;
                }
            }
        }
    }
}

impl Iterator for ScanIterator<'_> {
    type Item = Result<(Rid, Key)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn index_with(keys: impl IntoIterator<Item = i32>) -> (TempDir, IndexFile, Attribute) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.idx");
        IndexFile::create(&path).unwrap();
        let mut index = IndexFile::open(&path).unwrap();
        let attr = Attribute::int("a");
        for v in keys {
            index.insert_entry(&attr, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
        }
        (dir, index, attr)
    }

    fn collect(scan: ScanIterator<'_>) -> Vec<i32> {
        scan.map(|r| match r.unwrap().1 {
            Key::Int(v) => v,
            other => panic!("unexpected key {}", other),
        })
        .collect()
    }

    #[test]
    fn test_bounds_inclusive_and_exclusive() {
        let (_dir, mut index, attr) = index_with(0..20);
        let (lo, hi) = (Key::Int(5), Key::Int(8));

        let cases = [
            (true, true, vec![5, 6, 7, 8]),
            (false, true, vec![6, 7, 8]),
            (true, false, vec![5, 6, 7]),
            (false, false, vec![6, 7]),
        ];
        for (low_inclusive, high_inclusive, expected) in cases {
            let scan = index
                .scan(&attr, Some(&lo), Some(&hi), low_inclusive, high_inclusive)
                .unwrap();
            assert_eq!(collect(scan), expected);
        }
    }

    #[test]
    fn test_unbounded_ends() {
        let (_dir, mut index, attr) = index_with((0..10).rev());

        let scan = index.scan(&attr, None, Some(&Key::Int(2)), true, true).unwrap();
        assert_eq!(collect(scan), vec![0, 1, 2]);

        let scan = index.scan(&attr, Some(&Key::Int(7)), None, true, true).unwrap();
        assert_eq!(collect(scan), vec![7, 8, 9]);

        let scan = index.scan(&attr, None, None, false, false).unwrap();
        assert_eq!(collect(scan), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_ranges() {
        let (_dir, mut index, attr) = index_with(0..10);

        let five = Key::Int(5);
        let scan = index.scan(&attr, Some(&five), Some(&five), false, false).unwrap();
        assert!(collect(scan).is_empty());

        let scan = index
            .scan(&attr, Some(&Key::Int(8)), Some(&Key::Int(2)), true, true)
            .unwrap();
        assert!(collect(scan).is_empty());

        let scan = index.scan(&attr, Some(&Key::Int(100)), None, true, true).unwrap();
        assert!(collect(scan).is_empty());
    }

    #[test]
    fn test_scan_crosses_leaves() {
        let (_dir, mut index, attr) = index_with(0..3000);
        assert!(index.height().unwrap() >= 2);

        let scan = index
            .scan(&attr, Some(&Key::Int(1000)), Some(&Key::Int(2500)), true, false)
            .unwrap();
        assert_eq!(collect(scan), (1000..2500).collect::<Vec<_>>());
    }

    #[test]
    fn test_exhausted_scan_keeps_returning_none() {
        let (_dir, mut index, attr) = index_with(0..3);
        let mut scan = index.scan(&attr, None, None, true, true).unwrap();
        for _ in 0..3 {
            assert!(scan.get_next().unwrap().is_some());
        }
        assert_eq!(scan.get_next().unwrap(), None);
        assert_eq!(scan.get_next().unwrap(), None);
    }

    #[test]
    fn test_closed_scan_errors() {
        let (_dir, mut index, attr) = index_with(0..3);
        let mut scan = index.scan(&attr, None, None, true, true).unwrap();
        assert!(scan.get_next().unwrap().is_some());

        scan.close();
        assert!(scan.is_closed());
        assert!(matches!(scan.get_next(), Err(Error::IteratorClosed)));
        assert!(matches!(scan.get_next(), Err(Error::IteratorClosed)));
    }

    #[test]
    fn test_scan_rejects_mismatched_bound() {
        let (_dir, mut index, attr) = index_with(0..3);
        assert!(matches!(
            index.scan(&attr, Some(&Key::Real(1.0)), None, true, true),
            Err(Error::KeyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_scan_stops_reading_past_high_bound() {
        let (_dir, mut index, attr) = index_with(0..3000);

        let before = index.collect_counter_values();
        let scan = index.scan(&attr, None, Some(&Key::Int(10)), true, true).unwrap();
        assert_eq!(collect(scan).len(), 11);
        let reads = index.collect_counter_values().since(&before).pages_read;

        // Root, one leaf, nothing more.
        assert_eq!(reads as usize, index.height().unwrap());
    }
}
