use std::collections::BTreeMap;

use super::{Dock, DockWindow, Dockable, NodeId, WindowId};

/// Arena of every dockable in a loaded layout, plus the floating windows.
///
/// Reads are public; structural writes go through [`crate::Factory`].
#[derive(Debug, Default)]
pub struct DockTree {
    pub(crate) nodes: BTreeMap<NodeId, Dockable>,
    pub(crate) index: ahash::HashMap<String, NodeId>,
    pub(crate) windows: BTreeMap<WindowId, DockWindow>,
    pub(crate) main_root: Option<NodeId>,
    pub(crate) next_node: u64,
    pub(crate) next_window: u64,
}

impl DockTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn main_root(&self) -> Option<NodeId> {
        self.main_root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Dockable> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Dockable> {
        self.nodes.get_mut(&id)
    }

    pub fn dock(&self, id: NodeId) -> Option<&Dock> {
        self.get(id)?.as_dock()
    }

    pub(crate) fn dock_mut(&mut self, id: NodeId) -> Option<&mut Dock> {
        self.get_mut(id)?.as_dock_mut()
    }

    /// Look a dockable up by its string identifier.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn dockables(&self) -> impl Iterator<Item = (NodeId, &Dockable)> {
        self.nodes.iter().map(|(&id, d)| (id, d))
    }

    pub fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.owner
    }

    /// Position of `id` inside its owner's visible collection.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let owner = self.owner_of(id)?;
        self.dock(owner)?.index_of(id)
    }

    pub fn visible_of(&self, dock: NodeId) -> &[NodeId] {
        self.dock(dock).map(|d| d.visible()).unwrap_or(&[])
    }

    /// Owner chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.owner_of(id);
        while let Some(owner) = current {
            if out.contains(&owner) {
                // Owner cycle: corrupted tree, stop rather than loop forever.
                log::debug!("ancestors: owner cycle at {owner:?}");
                break;
            }
            out.push(owner);
            current = self.owner_of(owner);
        }
        out
    }

    /// The root dock `id` lives under (which may be `id` itself).
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let top = self.ancestors(id).last().copied().unwrap_or(id);
        self.get(top)?.is_root().then_some(top)
    }

    /// Is `node` strictly inside the subtree rooted at `ancestor`?
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Every dockable owned directly by `id`: visible children, plus pin strips and hidden
    /// dockables for a root.
    pub fn members_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(dock) = self.dock(id) else {
            return Vec::new();
        };
        let mut out = dock.visible.clone();
        if let Some(root) = dock.root() {
            out.extend(root.pinned.iter().filter_map(|(_, pin)| *pin));
            out.extend(root.hidden.iter().copied());
        }
        out
    }

    /// `id` and everything below it, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if out.contains(&node) || !self.contains(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.members_of(node).into_iter().rev());
        }
        out
    }

    /// Non-splitter leaves reachable through visible collections, in layout order.
    pub fn visible_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_visible_leaves(id, &mut out);
        out
    }

    fn collect_visible_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(dockable) = self.get(id) else {
            return;
        };
        match dockable.as_dock() {
            Some(dock) => {
                for &child in &dock.visible {
                    self.collect_visible_leaves(child, out);
                }
            }
            None if !dockable.is_splitter() => out.push(id),
            None => {}
        }
    }

    /// Visible children that are not splitters.
    pub fn content_children(&self, dock: NodeId) -> Vec<NodeId> {
        self.visible_of(dock)
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(|d| !d.is_splitter()))
            .collect()
    }

    pub fn windows(&self) -> impl Iterator<Item = &DockWindow> {
        self.windows.values()
    }

    pub fn window(&self, id: WindowId) -> Option<&DockWindow> {
        self.windows.get(&id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut DockWindow> {
        self.windows.get_mut(&id)
    }

    /// The window whose layout contains `id`, if `id` is floating.
    pub fn window_of(&self, id: NodeId) -> Option<WindowId> {
        let root = self.root_of(id)?;
        self.dock(root)?.root()?.window
    }

    pub(crate) fn insert(&mut self, dockable: Dockable) -> Option<NodeId> {
        if self.index.contains_key(&dockable.id) {
            log::debug!("insert: duplicate dockable id {:?}", dockable.id);
            return None;
        }
        self.next_node = self.next_node.max(1);
        let id = NodeId(self.next_node);
        self.next_node = self.next_node.saturating_add(1);
        self.index.insert(dockable.id.clone(), id);
        self.nodes.insert(id, dockable);
        Some(id)
    }

    pub(crate) fn delete(&mut self, id: NodeId) -> Option<Dockable> {
        let dockable = self.nodes.remove(&id)?;
        self.index.remove(&dockable.id);
        Some(dockable)
    }

    pub(crate) fn alloc_window_id(&mut self) -> WindowId {
        self.next_window = self.next_window.max(1);
        let id = WindowId(self.next_window);
        self.next_window = self.next_window.saturating_add(1);
        id
    }

    /// First unused string id of the form `{prefix}{n}`, counting up from the node count.
    pub(crate) fn unique_id(&self, prefix: &str) -> String {
        let mut n = self.nodes.len() as u64;
        loop {
            let candidate = format!("{prefix}{n}");
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
            n = n.wrapping_add(1);
        }
    }

    /// Structural invariant violations, empty for a healthy tree.
    pub fn integrity_issues(&self) -> Vec<String> {
        super::integrity::tree_integrity_issues(self)
    }
}
