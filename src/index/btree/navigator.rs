//! Child selection inside interior nodes.
//!
//! Both functions return the child index (0 is the leftmost child) together
//! with its page number, so callers can hand the index back to
//! [`InteriorNode::insert_at`] or [`InteriorNode::remove_child`].
//!
//! A leaf split copies its separator out of the right half, so equal keys may
//! sit on both sides of a separator. Writers descend with [`route`]; readers
//! that must find the first occurrence of a key descend with [`route_leftmost`]
//! and walk right through the leaf list.

use std::cmp::Ordering;

use crate::common::{PageId, Result};

use super::key::KeyRef;
use super::node::InteriorNode;

/// Child for `key`, sending keys equal to a separator to the right.
///
/// Returns the child preceding the first separator strictly greater than
/// `key`, or the rightmost child if no such separator exists. An unbounded
/// (`None`) key routes to the leftmost child.
pub fn route<B: AsRef<[u8]>>(
    node: &InteriorNode<B>,
    key: Option<KeyRef<'_>>,
) -> Result<(usize, PageId)> {
    descend(node, key, |ord| ord != Ordering::Greater)
}

/// Child for `key`, sending keys equal to a separator to the left.
///
/// Returns the child preceding the first separator greater than or equal to
/// `key`. This is the leftmost child that could contain `key`.
pub fn route_leftmost<B: AsRef<[u8]>>(
    node: &InteriorNode<B>,
    key: Option<KeyRef<'_>>,
) -> Result<(usize, PageId)> {
    descend(node, key, |ord| ord == Ordering::Less)
}

/// Walk separators while `pass(separator.cmp(key))` holds.
fn descend<B, F>(node: &InteriorNode<B>, key: Option<KeyRef<'_>>, pass: F) -> Result<(usize, PageId)>
where
    B: AsRef<[u8]>,
    F: Fn(Ordering) -> bool,
{
    let mut index = 0;
    let mut child = node.leftmost_child();

    let Some(key) = key else {
        return Ok((index, child));
    };

    for entry in node.entries() {
        let entry = entry?;
        if !pass(entry.key.cmp(&key)) {
            break;
        }
        index += 1;
        child = entry.child;
    }

    Ok((index, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::btree::key::{AttrType, Key};
    use crate::storage::page::Page;

    /// Interior node with keys 10, 20, 20, 30 and children 100..=104.
    fn sample(page: &mut Page) -> InteriorNode<&mut [u8]> {
        let mut node =
            InteriorNode::init(PageId::new(1), AttrType::Int, page.as_mut_slice(), PageId::new(100));
        for (i, k) in [10, 20, 20, 30].into_iter().enumerate() {
            node.insert_at(i, Key::Int(k).as_key_ref(), PageId::new(101 + i as u32))
                .unwrap();
        }
        node
    }

    fn at(node: &InteriorNode<&mut [u8]>, k: i32) -> usize {
        route(node, Some(Key::Int(k).as_key_ref())).unwrap().0
    }

    fn at_leftmost(node: &InteriorNode<&mut [u8]>, k: i32) -> usize {
        route_leftmost(node, Some(Key::Int(k).as_key_ref())).unwrap().0
    }

    #[test]
    fn test_route_ties_go_right() {
        let mut page = Page::new();
        let node = sample(&mut page);

        assert_eq!(at(&node, 5), 0);
        assert_eq!(at(&node, 10), 1);
        assert_eq!(at(&node, 15), 1);
        assert_eq!(at(&node, 20), 3);
        assert_eq!(at(&node, 30), 4);
        assert_eq!(at(&node, 99), 4);
    }

    #[test]
    fn test_route_leftmost_ties_go_left() {
        let mut page = Page::new();
        let node = sample(&mut page);

        assert_eq!(at_leftmost(&node, 5), 0);
        assert_eq!(at_leftmost(&node, 10), 0);
        assert_eq!(at_leftmost(&node, 15), 1);
        assert_eq!(at_leftmost(&node, 20), 1);
        assert_eq!(at_leftmost(&node, 30), 3);
        assert_eq!(at_leftmost(&node, 31), 4);
    }

    #[test]
    fn test_route_returns_matching_page() {
        let mut page = Page::new();
        let node = sample(&mut page);

        let (index, child) = route(&node, Some(Key::Int(25).as_key_ref())).unwrap();
        assert_eq!(index, 3);
        assert_eq!(child, PageId::new(103));
        assert_eq!(node.child_at(index).unwrap(), child);
    }

    #[test]
    fn test_unbounded_and_empty_route_leftmost() {
        let mut page = Page::new();
        let node = sample(&mut page);
        assert_eq!(route(&node, None).unwrap(), (0, PageId::new(100)));
        assert_eq!(route_leftmost(&node, None).unwrap(), (0, PageId::new(100)));

        let mut page = Page::new();
        let lone =
            InteriorNode::init(PageId::new(2), AttrType::Int, page.as_mut_slice(), PageId::new(7));
        let key = Key::Int(1);
        assert_eq!(route(&lone, Some(key.as_key_ref())).unwrap(), (0, PageId::new(7)));
    }
}
