//! Diagnostic tree dump.
//!
//! Renders every node depth-first as pretty-printed JSON:
//! ```text
//! {
//!   "keys": [170],
//!   "children": [
//!     { "keys": ["0:[(0,1)]", ..., "169:[(169,1)]"] },
//!     { "keys": ["170:[(170,1)]", ...] }
//!   ]
//! }
//! ```
//! Interior keys are JSON numbers or strings; leaf keys are strings of the
//! form `key:[(page,slot),...]` with equal keys grouped together.

use serde::Serialize;
use serde_json::Value;

use crate::common::{PageId, Result};

use super::header::{NodeHeader, NodeKind};
use super::index_file::IndexFile;
use super::key::{AttrType, Attribute, KeyRef};
use super::node::{InteriorNode, LeafNode};

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum DumpNode {
    Interior {
        keys: Vec<Value>,
        children: Vec<DumpNode>,
    },
    Leaf {
        keys: Vec<String>,
    },
}

impl IndexFile {
    /// Render the whole tree for debugging.
    ///
    /// Not part of the functional contract; the format may change.
    pub fn dump(&mut self, attribute: &Attribute) -> Result<String> {
        let root = self.root.get();
        let tree = self.dump_node(root, attribute.attr_type)?;
        Ok(serde_json::to_string_pretty(&tree)?)
    }

    fn dump_node(&mut self, page_id: PageId, attr_type: AttrType) -> Result<DumpNode> {
        let page = self.disk.read_page(page_id)?;
        let header = NodeHeader::read(page_id, page.as_slice())?;

        if header.kind == NodeKind::Leaf {
            let leaf = LeafNode::load(page_id, attr_type, page.as_slice())?;
            let mut groups: Vec<(KeyRef<'_>, Vec<String>)> = Vec::new();
            for entry in leaf.entries() {
                let entry = entry?;
                if let Some((key, rids)) = groups.last_mut() {
                    if *key == entry.key {
                        rids.push(entry.rid.to_string());
                        continue;
                    }
                }
                groups.push((entry.key, vec![entry.rid.to_string()]));
            }
            let keys = groups
                .into_iter()
                .map(|(key, rids)| format!("{}:[{}]", key, rids.join(",")))
                .collect();
            return Ok(DumpNode::Leaf { keys });
        }

        let (keys, children) = {
            let node = InteriorNode::load(page_id, attr_type, page.as_slice())?;
            let keys = node
                .entries()
                .map(|e| e.map(|e| key_value(e.key)))
                .collect::<Result<Vec<_>>>()?;
            (keys, node.children()?)
        };

        let mut dumped = Vec::with_capacity(children.len());
        for child in children {
            self.check_child(page_id, child)?;
            dumped.push(self.dump_node(child, attr_type)?);
        }
        Ok(DumpNode::Interior {
            keys,
            children: dumped,
        })
    }
}

fn key_value(key: KeyRef<'_>) -> Value {
    match key {
        KeyRef::Int(v) => Value::from(v),
        // Non-finite reals have no JSON number form and become null.
        KeyRef::Real(v) => Value::from(v as f64),
        KeyRef::VarChar(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Rid;
    use crate::index::btree::key::Key;
    use tempfile::tempdir;

    #[test]
    fn test_dump_single_leaf_groups_equal_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.idx");
        IndexFile::create(&path).unwrap();
        let mut index = IndexFile::open(&path).unwrap();
        let attr = Attribute::int("a");

        index.insert_entry(&attr, &Key::Int(1), Rid::new(1, 1)).unwrap();
        index.insert_entry(&attr, &Key::Int(2), Rid::new(2, 2)).unwrap();
        index.insert_entry(&attr, &Key::Int(1), Rid::new(3, 0)).unwrap();

        let dump: Value = serde_json::from_str(&index.dump(&attr).unwrap()).unwrap();
        assert_eq!(
            dump,
            serde_json::json!({ "keys": ["1:[(1,1),(3,0)]", "2:[(2,2)]"] })
        );
    }

    #[test]
    fn test_dump_two_levels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.idx");
        IndexFile::create(&path).unwrap();
        let mut index = IndexFile::open(&path).unwrap();
        let attr = Attribute::int("a");
        for v in 0..400 {
            index.insert_entry(&attr, &Key::Int(v), Rid::new(v as u32, 0)).unwrap();
        }

        let dump: Value = serde_json::from_str(&index.dump(&attr).unwrap()).unwrap();
        assert_eq!(dump["keys"], serde_json::json!([170]));

        let children = dump["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["keys"][0], "0:[(0,0)]");
        assert_eq!(children[1]["keys"][0], "170:[(170,0)]");
        assert!(children[1].get("children").is_none());
    }

    #[test]
    fn test_key_value() {
        assert_eq!(key_value(KeyRef::Int(-3)), Value::from(-3));
        assert_eq!(key_value(KeyRef::Real(1.5)), Value::from(1.5));
        assert_eq!(key_value(KeyRef::VarChar(b"ab")), Value::from("ab"));
        assert_eq!(key_value(KeyRef::Real(f32::NAN)), Value::Null);
    }
}
