//! Page allocation with reuse of reset pages.
//!
//! Pages are never removed from an index file. A page that no longer holds a
//! node is reset to zeros; since a zero tag byte means "interior" and a live
//! interior node always has at least one key, "interior with no entries"
//! identifies a free page unambiguously. Empty leaves keep their leaf tag and
//! are never handed out.

use tracing::{debug, trace};

use crate::common::{PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

use super::header::{NodeHeader, NodeKind};

/// Whether a page can be handed out by [`allocate`].
pub fn is_free(data: &[u8]) -> bool {
    NodeHeader::kind_of(data) == Some(NodeKind::Interior) && NodeHeader::raw_num_entries(data) == 0
}

/// Find a free page, or append a zeroed one.
///
/// Scans the file from the first page, so the cost is one read per page in
/// the file. The caller must write the returned page before allocating again,
/// otherwise the same page is returned twice.
pub fn allocate(disk: &mut DiskManager) -> Result<PageId> {
    let mut page = Page::new();
    for n in 0..disk.page_count() {
        let page_id = PageId::new(n);
        disk.read_page_into(page_id, &mut page)?;
        if is_free(page.as_slice()) {
            debug!(page = %page_id, "reusing free page");
            return Ok(page_id);
        }
    }

    let page_id = disk.append_page(&Page::new())?;
    debug!(page = %page_id, "appended page");
    Ok(page_id)
}

/// Reset a page so a later [`allocate`] can reuse it.
pub fn release(disk: &mut DiskManager, page_id: PageId) -> Result<()> {
    disk.write_page(page_id, &Page::new())?;
    trace!(page = %page_id, "released page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::btree::key::{AttrType, Key};
    use crate::index::btree::node::{InteriorNode, LeafNode};
    use crate::Rid;
    use tempfile::tempdir;

    fn leaf_page(entries: i32) -> Page {
        let mut page = Page::new();
        let mut leaf = LeafNode::init(
            PageId::new(0),
            AttrType::Int,
            page.as_mut_slice(),
            PageId::INVALID,
            PageId::INVALID,
        );
        for v in 0..entries {
            leaf.insert(Key::Int(v).as_key_ref(), Rid::new(0, 0)).unwrap();
        }
        page
    }

    #[test]
    fn test_is_free() {
        assert!(is_free(Page::new().as_slice()));
        assert!(!is_free(leaf_page(0).as_slice()));
        assert!(!is_free(leaf_page(3).as_slice()));

        let mut page = Page::new();
        let mut node =
            InteriorNode::init(PageId::new(0), AttrType::Int, page.as_mut_slice(), PageId::new(1));
        node.insert_at(0, Key::Int(5).as_key_ref(), PageId::new(2)).unwrap();
        assert!(!is_free(page.as_slice()));
    }

    #[test]
    fn test_allocate_appends_when_nothing_is_free() {
        let dir = tempdir().unwrap();
        let mut disk = DiskManager::create(dir.path().join("a.idx")).unwrap();
        disk.append_page(&leaf_page(0)).unwrap();

        let page_id = allocate(&mut disk).unwrap();
        assert_eq!(page_id, PageId::new(1));
        assert_eq!(disk.page_count(), 2);
    }

    #[test]
    fn test_allocate_reuses_released_page() {
        let dir = tempdir().unwrap();
        let mut disk = DiskManager::create(dir.path().join("a.idx")).unwrap();
        for _ in 0..3 {
            disk.append_page(&leaf_page(2)).unwrap();
        }

        release(&mut disk, PageId::new(1)).unwrap();
        assert_eq!(allocate(&mut disk).unwrap(), PageId::new(1));
        assert_eq!(disk.page_count(), 3);

        // Until it is written, the same page keeps coming back.
        assert_eq!(allocate(&mut disk).unwrap(), PageId::new(1));
        disk.write_page(PageId::new(1), &leaf_page(1)).unwrap();
        assert_eq!(allocate(&mut disk).unwrap(), PageId::new(3));
    }
}
