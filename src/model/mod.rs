mod node;
mod search;
mod tree;

pub use node::{NodeKind, TreeNode, ROOT_PARENT_ID};
pub use search::FileLocation;
pub use tree::PathTree;
