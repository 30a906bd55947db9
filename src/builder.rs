use std::collections::BTreeMap;

use crate::factory::Factory;
use crate::model::{Alignment, Dockable, LeafKind, NodeId, Orientation};

/// Split direction with Dear ImGui `DockBuilder::SplitNode`-like semantics.
///
/// The direction indicates where the *side* node is placed relative to the *main* node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SplitDirection {
    fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Horizontal,
            Self::Up | Self::Down => Orientation::Vertical,
        }
    }

    fn side_first(self) -> bool {
        matches!(self, Self::Left | Self::Up)
    }

    fn alignment(self) -> Alignment {
        match self {
            Self::Left => Alignment::Left,
            Self::Right => Alignment::Right,
            Self::Up => Alignment::Top,
            Self::Down => Alignment::Bottom,
        }
    }
}

/// A logical node id used by [`DockBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DockNodeId(u64);

#[derive(Clone, Debug)]
enum Node {
    Leaf {
        dockables: Vec<Dockable>,
    },
    Split {
        dir: SplitDirection,
        side_fraction: f32,
        main: DockNodeId,
        side: DockNodeId,
    },
}

/// Scripted default layouts, in the manner of Dear ImGui's `DockBuilder`:
/// create empty nodes, split them, dock dockables into leaf nodes, then [`Self::finish`].
///
/// Each leaf becomes a tool dock or a document dock depending on what was docked into it; tool
/// docks are aligned to the edge their node was split off towards. Leaves left empty become
/// non-collapsable document docks, reserving the area.
#[derive(Debug)]
pub struct DockBuilder {
    next_node_id: u64,
    nodes: BTreeMap<DockNodeId, Node>,
}

impl Default for DockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DockBuilder {
    pub fn new() -> Self {
        Self {
            next_node_id: 1,
            nodes: BTreeMap::new(),
        }
    }

    fn alloc_node_id(&mut self) -> DockNodeId {
        let id = DockNodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        id
    }

    /// Create an empty leaf node.
    #[must_use]
    pub fn add_node(&mut self) -> DockNodeId {
        let id = self.alloc_node_id();
        self.nodes.insert(
            id,
            Node::Leaf {
                dockables: Vec::new(),
            },
        );
        id
    }

    /// Split an existing node and return `(side, main)` (Dear ImGui semantics).
    ///
    /// The `node` itself becomes the split, and its original content moves into the returned
    /// `main` child. `side_fraction` is the share given to `side`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn split_node(
        &mut self,
        node: DockNodeId,
        dir: SplitDirection,
        side_fraction: f32,
    ) -> (DockNodeId, DockNodeId) {
        let old = self.nodes.remove(&node).unwrap_or(Node::Leaf {
            dockables: Vec::new(),
        });
        let main = self.alloc_node_id();
        self.nodes.insert(main, old);

        let side = self.add_node();

        self.nodes.insert(
            node,
            Node::Split {
                dir,
                side_fraction: side_fraction.clamp(0.0, 1.0),
                main,
                side,
            },
        );

        (side, main)
    }

    /// Dock a tool or document into a leaf node.
    ///
    /// Refused (returns false) for split nodes, unknown nodes, docks and splitters, and for a
    /// leaf that already holds dockables of the other kind.
    pub fn dock(&mut self, dockable: Dockable, node: DockNodeId) -> bool {
        let Some(kind) = dockable.leaf_kind() else {
            log::debug!("dock: {:?} is not a tool or document", dockable.id);
            return false;
        };
        match self.nodes.get_mut(&node) {
            Some(Node::Leaf { dockables }) => {
                if dockables.first().and_then(Dockable::leaf_kind).is_some_and(|k| k != kind) {
                    log::debug!("dock: node {node:?} already holds {kind:?}s of the other kind");
                    return false;
                }
                dockables.push(dockable);
                true
            }
            Some(Node::Split { .. }) => {
                log::debug!("dock: node {node:?} is not a leaf node");
                false
            }
            None => {
                log::debug!("dock: node {node:?} does not exist");
                false
            }
        }
    }

    /// Dock several dockables into one leaf node, tabbed together. Returns how many were docked.
    pub fn dock_many(
        &mut self,
        dockables: impl IntoIterator<Item = Dockable>,
        node: DockNodeId,
    ) -> usize {
        dockables
            .into_iter()
            .map(|d| self.dock(d, node))
            .filter(|&docked| docked)
            .count()
    }

    /// Create the layout in `factory` under a new root dock with id `root_id`.
    ///
    /// `root` is typically the id returned by the first [`Self::add_node`], later mutated by
    /// splits. Returns `None` if the root could not be created (e.g. `root_id` is taken).
    /// Dockables whose ids are taken are skipped.
    pub fn finish(self, factory: &mut Factory, root_id: &str, root: DockNodeId) -> Option<NodeId> {
        let root_dock = factory.create(Dockable::root(root_id))?;
        let mut nodes = self.nodes;
        if let Some(layout) = build_node(factory, &mut nodes, root, None, Alignment::Unset) {
            factory.add_dockable(root_dock, layout);
        }
        Some(root_dock)
    }
}

fn build_node(
    factory: &mut Factory,
    nodes: &mut BTreeMap<DockNodeId, Node>,
    node_id: DockNodeId,
    proportion: Option<f32>,
    edge: Alignment,
) -> Option<NodeId> {
    let with_proportion = |d: Dockable| match proportion {
        Some(p) => d.with_proportion(p),
        None => d,
    };
    match nodes.remove(&node_id) {
        Some(Node::Split {
            dir,
            side_fraction,
            main,
            side,
        }) => {
            let main_dock = build_node(factory, nodes, main, Some(1.0 - side_fraction), edge);
            let side_dock =
                build_node(factory, nodes, side, Some(side_fraction), dir.alignment());
            let (first, second) = if dir.side_first() {
                (side_dock, main_dock)
            } else {
                (main_dock, side_dock)
            };
            let (first, second) = match (first, second) {
                (Some(first), Some(second)) => (first, second),
                (Some(only), None) | (None, Some(only)) => return Some(only),
                (None, None) => return None,
            };

            let orientation = dir.orientation();
            let split = factory.create_generated("Proportional", |id| {
                with_proportion(Dockable::proportional(id, orientation))
            })?;
            let splitter = factory.create_generated("Splitter", Dockable::splitter)?;
            for child in [first, splitter, second] {
                factory.add_dockable(split, child);
            }
            Some(split)
        }
        Some(Node::Leaf { dockables }) => {
            let kind = dockables.first().and_then(Dockable::leaf_kind);
            let dock = match kind {
                Some(LeafKind::Tool) => factory.create_generated("ToolDock", |id| {
                    with_proportion(Dockable::tool_dock(id, edge))
                })?,
                Some(LeafKind::Document) => factory.create_generated("DocumentDock", |id| {
                    with_proportion(Dockable::document_dock(id))
                })?,
                None => factory.create_generated("DocumentDock", |id| {
                    with_proportion(Dockable::document_dock(id).with_collapsable(false))
                })?,
            };
            for dockable in dockables {
                let id = dockable.id.clone();
                match factory.create(dockable) {
                    Some(created) => {
                        factory.add_dockable(dock, created);
                    }
                    None => log::debug!("finish: skipping {id:?}, the id is taken"),
                }
            }
            Some(dock)
        }
        None => {
            log::debug!("finish: node {node_id:?} does not exist");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Arrangement;
    use crate::test_support::{assert_tree_ok, strict_factory, visible_ids};

    fn arrangement(f: &Factory, id: NodeId) -> &Arrangement {
        &f.tree().dock(id).expect("dock").arrangement
    }

    fn proportion(f: &Factory, id: NodeId) -> Option<f32> {
        f.tree().get(id).and_then(|d| d.proportion)
    }

    #[test]
    fn split_node_semantics_match_imgui() {
        let mut f = strict_factory();
        let mut b = DockBuilder::new();
        let dockspace = b.add_node();

        let (right, main) = b.split_node(dockspace, SplitDirection::Right, 0.25);
        assert!(b.dock(Dockable::document("doc", "Doc"), main));
        assert!(b.dock(Dockable::tool("inspector", "Inspector"), right));

        let root = b.finish(&mut f, "root", dockspace).expect("root");
        assert_eq!(f.tree().main_root(), Some(root));

        let [split] = f.tree().visible_of(root) else {
            panic!("root should hold the split");
        };
        let split = *split;
        assert!(matches!(
            arrangement(&f, split),
            Arrangement::Proportional(p) if p.orientation == Orientation::Horizontal && !p.auto_created
        ));
        let children = f.tree().visible_of(split).to_vec();
        assert_eq!(children.len(), 3);

        // Right split: main is first (left), side is second (right).
        assert!(matches!(arrangement(&f, children[0]), Arrangement::Document(_)));
        assert_eq!(visible_ids(&f, children[0]), ["doc"]);
        assert!(matches!(
            arrangement(&f, children[2]),
            Arrangement::Tool(t) if t.alignment == Alignment::Right
        ));
        assert_eq!(visible_ids(&f, children[2]), ["inspector"]);
        assert_eq!(proportion(&f, children[0]), Some(0.75));
        assert_eq!(proportion(&f, children[2]), Some(0.25));
        assert_tree_ok(f.tree());
    }

    #[test]
    fn nested_splits_and_reserved_areas() {
        let mut f = strict_factory();
        let mut b = DockBuilder::new();
        let dockspace = b.add_node();
        let (left, rest) = b.split_node(dockspace, SplitDirection::Left, 0.2);
        let (bottom, _center) = b.split_node(rest, SplitDirection::Down, 0.3);
        let (top, _) = b.split_node(left, SplitDirection::Up, 0.5);
        b.dock(Dockable::tool("explorer", "Explorer"), top);
        assert_eq!(
            b.dock_many(
                [Dockable::tool("log", "Log"), Dockable::tool("console", "Console")],
                bottom
            ),
            2
        );

        let root = b.finish(&mut f, "root", dockspace).expect("root");
        let outer = f.tree().visible_of(root)[0];
        let [left_col, _, right_col] = f.tree().visible_of(outer) else {
            panic!("outer split should have two panes");
        };
        let (left_col, right_col) = (*left_col, *right_col);

        // The left column: explorer on top, an empty reserved area below.
        let left_children = f.tree().visible_of(left_col).to_vec();
        assert!(matches!(
            arrangement(&f, left_children[0]),
            Arrangement::Tool(t) if t.alignment == Alignment::Top
        ));
        let reserved = left_children[2];
        assert!(f.tree().visible_of(reserved).is_empty());
        assert!(f.tree().dock(reserved).is_some_and(|d| !d.collapsable));

        // The right column: center documents area first, tools at the bottom.
        let right_children = f.tree().visible_of(right_col).to_vec();
        assert!(matches!(arrangement(&f, right_children[0]), Arrangement::Document(_)));
        assert_eq!(visible_ids(&f, right_children[2]), ["log", "console"]);
        assert!(matches!(
            arrangement(&f, right_children[2]),
            Arrangement::Tool(t) if t.alignment == Alignment::Bottom
        ));
        assert_tree_ok(f.tree());
    }

    #[test]
    fn docking_is_refused_into_splits_and_mixed_leaves() {
        let mut b = DockBuilder::new();
        let dockspace = b.add_node();
        let (side, _main) = b.split_node(dockspace, SplitDirection::Left, 0.5);
        assert!(!b.dock(Dockable::tool("t", "T"), dockspace));
        assert!(b.dock(Dockable::tool("t", "T"), side));
        assert!(!b.dock(Dockable::document("d", "D"), side));
        assert!(!b.dock(Dockable::tool_dock("nested", Alignment::Left), side));
        assert!(!b.dock(Dockable::tool("u", "U"), DockNodeId(99)));
    }

    #[test]
    fn finish_refuses_a_taken_root_id() {
        let mut f = strict_factory();
        f.create(Dockable::root("root")).expect("first root");
        let mut b = DockBuilder::new();
        let node = b.add_node();
        assert!(b.finish(&mut f, "root", node).is_none());
        assert_eq!(f.tree().len(), 1);
    }
}
