//! Tree folding: normalized paths -> flat node rows
//!
//! Each path is walked segment by segment. A prefix key (the segments walked
//! so far) identifies a node across listing batches, so a folder reached by
//! several batches is inserted exactly once.

use rustc_hash::FxHashMap;

use crate::error::CrawlError;
use crate::model::{NodeKind, ROOT_PARENT_ID, TreeNode};
use crate::util::{SEPARATOR, split_segments};

/// What the index knows about one prefix key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: u64,
    pub parent_id: i64,
    pub is_file: bool,
}

/// Per-crawl cache of every node created so far, keyed by prefix.
///
/// Grows monotonically during a crawl and is never reloaded from the store.
#[derive(Debug, Default)]
pub struct IdIndex {
    entries: FxHashMap<String, IndexEntry>,
    last_id: u64,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, prefix: &str) -> Option<&IndexEntry> {
        self.entries.get(prefix)
    }

    /// Last id handed out (0 while empty)
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Destination for newly created nodes
pub trait NodeSink {
    fn insert_node(&mut self, node: TreeNode);
}

impl NodeSink for Vec<TreeNode> {
    fn insert_node(&mut self, node: TreeNode) {
        self.push(node);
    }
}

/// Fold a sequence of normalized paths into `index`, sending every new node to `sink`.
///
/// Returns the number of nodes inserted. A segment whose file/folder kind
/// contradicts what was indexed earlier is an [`CrawlError::Inconsistency`].
pub fn fold<P: AsRef<str>>(
    paths: &[P],
    index: &mut IdIndex,
    sink: &mut impl NodeSink,
) -> Result<u64, CrawlError> {
    let mut inserted = 0u64;
    let mut key = String::new();

    for path in paths {
        let path = path.as_ref();
        let (is_file, segments) = split_segments(path);
        let last = segments.len().saturating_sub(1);

        let mut parent_id = ROOT_PARENT_ID;
        key.clear();

        for (i, segment) in segments.iter().enumerate() {
            if !key.is_empty() {
                key.push(SEPARATOR);
            }
            key.push_str(segment);

            // Only the final segment of a file entry is a file
            let segment_is_file = is_file && i == last;

            let id = match index.entries.get(key.as_str()) {
                Some(entry) if entry.is_file != segment_is_file => {
                    return Err(CrawlError::Inconsistency {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        indexed_as: NodeKind::from_is_file(entry.is_file),
                    });
                }
                Some(entry) => entry.id,
                None => {
                    let id = index.allocate_id();
                    index.entries.insert(
                        key.clone(),
                        IndexEntry {
                            id,
                            parent_id,
                            is_file: segment_is_file,
                        },
                    );
                    sink.insert_node(TreeNode::new(id, parent_id, segment_is_file, *segment));
                    inserted += 1;
                    id
                }
            };

            parent_id = id as i64;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fold_all(paths: &[&str]) -> (IdIndex, Vec<TreeNode>) {
        let mut index = IdIndex::new();
        let mut nodes = Vec::new();
        fold(paths, &mut index, &mut nodes).unwrap();
        (index, nodes)
    }

    #[test]
    fn test_basic_fold() {
        let (_, nodes) = fold_all(&["a/", "a/b.txt", "a/c/", "a/c/d.txt"]);
        assert_eq!(
            nodes,
            vec![
                TreeNode::new(1, -1, false, "a"),
                TreeNode::new(2, 1, true, "b.txt"),
                TreeNode::new(3, 1, false, "c"),
                TreeNode::new(4, 3, true, "d.txt"),
            ]
        );
    }

    #[test]
    fn test_repeated_folder_is_not_duplicated() {
        let mut index = IdIndex::new();
        let mut nodes = Vec::new();
        fold(&["a/"], &mut index, &mut nodes).unwrap();
        let inserted = fold(&["a/"], &mut index, &mut nodes).unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(nodes.len(), 1);
        assert!(!index.get("a").unwrap().is_file);
    }

    #[test]
    fn test_ids_continue_across_batches() {
        let mut index = IdIndex::new();
        let mut first = Vec::new();
        fold(&["repo/a/", "repo/b/"], &mut index, &mut first).unwrap();

        let mut second = Vec::new();
        fold(&["repo/a/x.txt", "repo/b/y.txt"], &mut index, &mut second).unwrap();

        assert_eq!(
            second,
            vec![
                TreeNode::new(4, 2, true, "x.txt"),
                TreeNode::new(5, 3, true, "y.txt"),
            ]
        );
        assert_eq!(index.last_id(), 5);
    }

    #[test]
    fn test_intermediate_segments_are_folders() {
        let (index, nodes) = fold_all(&["repo/deep/nested/file.txt"]);
        assert_eq!(nodes.len(), 4);
        assert!(nodes[..3].iter().all(|n| !n.is_file));
        assert!(nodes[3].is_file);
        assert!(!index.get("repo/deep").unwrap().is_file);
        assert_eq!(index.get("repo/deep/nested/file.txt").unwrap().parent_id, 3);
    }

    #[test]
    fn test_file_used_as_folder_is_inconsistent() {
        let mut index = IdIndex::new();
        let mut nodes = Vec::new();
        fold(&["repo/a.txt"], &mut index, &mut nodes).unwrap();

        let err = fold(&["repo/a.txt/b"], &mut index, &mut nodes).unwrap_err();
        match err {
            CrawlError::Inconsistency {
                segment,
                indexed_as,
                ..
            } => {
                assert_eq!(segment, "a.txt");
                assert_eq!(indexed_as, NodeKind::File);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_folder_listed_as_file_is_inconsistent() {
        let mut index = IdIndex::new();
        let mut nodes = Vec::new();
        fold(&["repo/a/"], &mut index, &mut nodes).unwrap();
        assert!(fold(&["repo/a"], &mut index, &mut nodes).is_err());
    }

    #[test]
    fn test_parents_precede_children_and_prefixes_unique() {
        let paths = [
            "repo/x/",
            "repo/y/",
            "repo/top.txt",
            "repo/x/1.txt",
            "repo/x/sub/",
            "repo/y/sub/deep/leaf.txt",
            "repo/x/sub/2.txt",
            "repo/top.txt",
        ];
        let (index, nodes) = fold_all(&paths);

        let mut seen: HashSet<i64> = HashSet::new();
        for node in &nodes {
            assert!(node.parent_id == -1 || seen.contains(&node.parent_id));
            assert!(seen.insert(node.id as i64), "duplicate id {}", node.id);
        }
        assert_eq!(index.len(), nodes.len());
        let ids: Vec<u64> = nodes.iter().map(|n| n.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_fold_is_deterministic() {
        let paths = ["repo/b/", "repo/a/", "repo/a/f.txt", "repo/c.txt"];
        let (_, first) = fold_all(&paths);
        let (_, second) = fold_all(&paths);
        assert_eq!(first, second);
    }
}
