//! Expanded-tree state for the host.
//!
//! The provider hands out fresh nodes on every expansion. The host keeps
//! the nodes it has seen in a nested [`TreeEntry`] structure and carries
//! expansion state across reloads by matching `(tag, label)`.

use std::collections::HashSet;

use uuid::Uuid;

use crate::explorer::{CollapsibleState, Icon, Node};

/// One node in the host tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// The node; its [`CollapsibleState`] records whether it is expanded.
    pub node: Node,
    /// Children are being fetched.
    pub loading: bool,
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    fn new(node: Node) -> Self {
        Self {
            node,
            loading: false,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.node.state() == CollapsibleState::Expanded
    }

    fn key(&self) -> (&'static str, String) {
        (self.node.tag(), self.node.label().to_string())
    }
}

/// A row as drawn by the tree widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: Uuid,
    pub depth: usize,
    pub label: String,
    pub description: Option<String>,
    pub icon: Option<Icon>,
    pub expandable: bool,
    pub expanded: bool,
    pub loading: bool,
}

/// Host-side tree with a selection cursor.
#[derive(Debug, Default)]
pub struct ExplorerTree {
    roots: Vec<TreeEntry>,
    selected: usize,
}

fn find_mut(entries: &mut [TreeEntry], id: Uuid) -> Option<&mut TreeEntry> {
    for entry in entries {
        if entry.node.id() == id {
            return Some(entry);
        }
        if let Some(found) = find_mut(&mut entry.children, id) {
            return Some(found);
        }
    }
    None
}

fn find(entries: &[TreeEntry], id: Uuid) -> Option<&TreeEntry> {
    for entry in entries {
        if entry.node.id() == id {
            return Some(entry);
        }
        if let Some(found) = find(&entry.children, id) {
            return Some(found);
        }
    }
    None
}

/// Returns the id of the entry whose children contain `id`.
fn parent_of(entries: &[TreeEntry], id: Uuid) -> Option<Uuid> {
    for entry in entries {
        if entry.children.iter().any(|c| c.node.id() == id) {
            return Some(entry.node.id());
        }
        if let Some(found) = parent_of(&entry.children, id) {
            return Some(found);
        }
    }
    None
}

fn flatten(entries: &[TreeEntry], depth: usize, rows: &mut Vec<TreeRow>) {
    for entry in entries {
        rows.push(TreeRow {
            id: entry.node.id(),
            depth,
            label: entry.node.label().to_string(),
            description: entry.node.description().map(str::to_string),
            icon: entry.node.icon(),
            expandable: entry.node.is_expandable(),
            expanded: entry.is_expanded(),
            loading: entry.loading,
        });
        if entry.is_expanded() {
            flatten(&entry.children, depth + 1, rows);
        }
    }
}

/// Builds entries for `nodes`, re-expanding those whose key was expanded
/// in `previous`. Re-expanded nodes are appended to `reload`.
fn rebuild(previous: &[TreeEntry], nodes: Vec<Node>, reload: &mut Vec<Node>) -> Vec<TreeEntry> {
    let expanded: HashSet<(&'static str, String)> = previous
        .iter()
        .filter(|e| e.is_expanded())
        .map(TreeEntry::key)
        .collect();

    nodes
        .into_iter()
        .map(|node| {
            let mut entry = TreeEntry::new(node);
            if entry.node.is_expandable() && expanded.contains(&entry.key()) {
                entry.node.set_expanded(true);
                entry.loading = true;
                reload.push(entry.node.clone());
            }
            entry
        })
        .collect()
}

impl ExplorerTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roots. Returns nodes whose children must be fetched.
    pub fn set_roots(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        let mut reload = Vec::new();
        self.roots = rebuild(&self.roots, nodes, &mut reload);
        self.clamp_selection();
        reload
    }

    /// Replaces the children of `parent`. Returns nodes whose children must
    /// be fetched. Unknown parents (collapsed or replaced meanwhile) are
    /// ignored.
    pub fn set_children(&mut self, parent: Uuid, children: Vec<Node>) -> Vec<Node> {
        let mut reload = Vec::new();
        if let Some(entry) = find_mut(&mut self.roots, parent) {
            entry.children = rebuild(&entry.children, children, &mut reload);
            entry.loading = false;
        }
        self.clamp_selection();
        reload
    }

    /// Marks an expanded node as reloading. Returns it if a fetch is needed.
    pub fn reload(&mut self, id: Uuid) -> Option<Node> {
        let entry = find_mut(&mut self.roots, id)?;
        if !entry.is_expanded() {
            return None;
        }
        entry.loading = true;
        Some(entry.node.clone())
    }

    /// Returns the visible rows in display order.
    #[must_use]
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        flatten(&self.roots, 0, &mut rows);
        rows
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Returns the node under the cursor.
    #[must_use]
    pub fn selected_node(&self) -> Option<&Node> {
        let row = self.rows().into_iter().nth(self.selected)?;
        find(&self.roots, row.id).map(|e| &e.node)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let count = self.rows().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    /// Expands the selected node. Returns it if its children must be
    /// fetched.
    pub fn expand_selected(&mut self) -> Option<Node> {
        let id = self.selected_node()?.id();
        let entry = find_mut(&mut self.roots, id)?;
        if !entry.node.is_expandable() || entry.is_expanded() {
            return None;
        }
        entry.node.set_expanded(true);
        entry.loading = true;
        Some(entry.node.clone())
    }

    /// Collapses the selected node, or moves to its parent if it is
    /// already collapsed.
    pub fn collapse_selected(&mut self) {
        let Some(id) = self.selected_node().map(Node::id) else {
            return;
        };

        if let Some(entry) = find_mut(&mut self.roots, id) {
            if entry.is_expanded() {
                entry.node.set_expanded(false);
                entry.loading = false;
                entry.children.clear();
                return;
            }
        }

        if let Some(parent) = parent_of(&self.roots, id) {
            if let Some(index) = self.rows().iter().position(|r| r.id == parent) {
                self.selected = index;
            }
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.rows().len();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::docker::ImageDescriptor;
    use crate::explorer::{Category, NodeKind};

    fn roots() -> Vec<Node> {
        Category::ALL.iter().map(|c| Node::category(*c)).collect()
    }

    fn image(label: &str) -> Node {
        Node::new(label, NodeKind::LocalImage(ImageDescriptor::new("sha256:1", vec![])))
    }

    #[test]
    fn test_expand_and_fill_children() {
        let mut tree = ExplorerTree::new();
        assert!(tree.set_roots(roots()).is_empty());
        assert_eq!(tree.rows().len(), 3);

        let images = tree.expand_selected().unwrap();
        assert_eq!(images.tag(), "imagesLabel");
        assert_eq!(images.state(), CollapsibleState::Expanded);
        assert_eq!(
            tree.selected_node().unwrap().state(),
            CollapsibleState::Expanded
        );
        assert!(tree.rows()[0].loading);
        assert!(tree.expand_selected().is_none());

        tree.set_children(images.id(), vec![image("a:1"), image("b:2")]);
        let rows = tree.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].label, "a:1");
        assert_eq!(rows[1].depth, 1);
        assert!(!rows[0].loading);
    }

    #[test]
    fn test_leaf_does_not_expand() {
        let mut tree = ExplorerTree::new();
        tree.set_roots(roots());
        let images = tree.expand_selected().unwrap();
        tree.set_children(images.id(), vec![image("a:1")]);

        tree.move_down();
        assert_eq!(tree.selected_node().unwrap().label(), "a:1");
        assert!(tree.expand_selected().is_none());
    }

    #[test]
    fn test_collapse_moves_to_parent_then_collapses() {
        let mut tree = ExplorerTree::new();
        tree.set_roots(roots());
        let images = tree.expand_selected().unwrap();
        tree.set_children(images.id(), vec![image("a:1")]);

        tree.move_down();
        tree.collapse_selected();
        assert_eq!(tree.selected(), 0);

        tree.collapse_selected();
        assert_eq!(tree.rows().len(), 3);
        assert_eq!(
            tree.selected_node().unwrap().state(),
            CollapsibleState::Collapsed
        );
    }

    #[test]
    fn test_new_roots_keep_expansion() {
        let mut tree = ExplorerTree::new();
        tree.set_roots(roots());
        tree.move_down();
        tree.expand_selected().unwrap();

        let reload = tree.set_roots(roots());
        assert_eq!(reload.len(), 1);
        assert_eq!(reload[0].tag(), "containersLabel");
        assert!(tree.rows()[1].expanded);
        tree.move_down();
        assert_eq!(
            tree.selected_node().unwrap().state(),
            CollapsibleState::Expanded
        );
    }

    #[test]
    fn test_reload_only_expanded() {
        let mut tree = ExplorerTree::new();
        tree.set_roots(roots());
        let rows = tree.rows();

        assert!(tree.reload(rows[1].id).is_none());
        let images = tree.expand_selected().unwrap();
        assert_eq!(tree.reload(images.id()).unwrap().id(), images.id());
    }

    #[test]
    fn test_stale_children_ignored() {
        let mut tree = ExplorerTree::new();
        tree.set_roots(roots());
        assert!(tree.set_children(Uuid::new_v4(), vec![image("x")]).is_empty());
        assert_eq!(tree.rows().len(), 3);
    }

    #[test]
    fn test_selection_bounds() {
        let mut tree = ExplorerTree::new();
        tree.move_up();
        tree.move_down();
        assert_eq!(tree.selected(), 0);

        tree.set_roots(roots());
        for _ in 0..10 {
            tree.move_down();
        }
        assert_eq!(tree.selected(), 2);
    }
}
