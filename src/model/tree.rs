use std::collections::HashMap;

use crate::util::natural_cmp;

/// Nested folder view assembled from full paths (e.g. every location of a file name).
///
/// The index itself is a flat table; this is only built for display.
#[derive(Debug, Clone)]
pub struct PathTree {
    pub name: String,
    pub children: HashMap<String, PathTree>,
}

impl PathTree {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: HashMap::new(),
        }
    }

    pub fn add_path(&mut self, path_parts: &[&str]) {
        let Some((first, rest)) = path_parts.split_first() else {
            return;
        };

        let child = self
            .children
            .entry(first.to_string())
            .or_insert_with(|| PathTree::new(first));
        child.add_path(rest);
    }

    /// Children in natural order
    pub fn sorted_children(&self) -> Vec<&PathTree> {
        let mut children: Vec<&PathTree> = self.children.values().collect();
        children.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        children
    }

    /// Visits all leaf nodes in natural order, calling `f` with the full path.
    /// Uses a reusable path buffer.
    pub fn visit_leaves(&self, mut f: impl FnMut(&str)) {
        // Stack stores (node, base_len) where base_len is path length before this node
        let mut stack: Vec<(&PathTree, usize)> = Vec::new();
        let mut path = String::new();

        for child in self.sorted_children().into_iter().rev() {
            stack.push((child, 0));
        }

        while let Some((node, base_len)) = stack.pop() {
            path.truncate(base_len);
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&node.name);

            if node.children.is_empty() {
                f(&path);
            } else {
                let current_len = path.len();
                for child in node.sorted_children().into_iter().rev() {
                    stack.push((child, current_len));
                }
            }
        }
    }

    /// Render the subtree below this node as indented lines
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut stack: Vec<(&PathTree, usize)> = self
            .sorted_children()
            .into_iter()
            .rev()
            .map(|child| (child, 0))
            .collect();

        while let Some((node, depth)) = stack.pop() {
            let marker = if node.children.is_empty() { "" } else { "/" };
            lines.push(format!("{}{}{}", "  ".repeat(depth), node.name, marker));
            for child in node.sorted_children().into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        lines
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.visit_leaves(|_| count += 1);
        count
    }
}
