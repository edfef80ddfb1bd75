/// Parent id recorded for top-level nodes
pub const ROOT_PARENT_ID: i64 = -1;

/// Whether a node is a file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub fn from_is_file(is_file: bool) -> Self {
        if is_file { NodeKind::File } else { NodeKind::Folder }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Folder => f.write_str("folder"),
        }
    }
}

/// One persisted row of the flat node table.
///
/// `name` is a single path segment; full paths are rebuilt by following
/// `parent_id` links up to [`ROOT_PARENT_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeNode {
    pub id: u64,
    pub parent_id: i64,
    pub is_file: bool,
    pub name: String,
}

impl TreeNode {
    pub fn new(id: u64, parent_id: i64, is_file: bool, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            is_file,
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }

    /// Name with a trailing separator for folders, as listings display them
    pub fn display_name(&self) -> String {
        if self.is_file {
            self.name.clone()
        } else {
            format!("{}/", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(TreeNode::new(1, -1, false, "repo").display_name(), "repo/");
        assert_eq!(TreeNode::new(2, 1, true, "a.txt").display_name(), "a.txt");
    }

    #[test]
    fn test_is_root() {
        assert!(TreeNode::new(1, ROOT_PARENT_ID, false, "repo").is_root());
        assert!(!TreeNode::new(2, 1, false, "trunk").is_root());
    }
}
