//! Serde snapshots of a whole layout.
//!
//! A [`LayoutSnapshot`] flattens the arena into a list of nodes that refer to each other by
//! position in that list, so it can go through any serde format. String ids, flags,
//! proportions, arrangement payloads, pin and hide origins and floating windows all survive a
//! round trip; arena handles do not (they are reassigned on restore).

use std::collections::BTreeMap;

use egui::Rect;

use crate::factory::Factory;
use crate::model::{
    Alignment, Arrangement, Dock, DockTree, DockWindow, Dockable, DockableKind, DocumentDock,
    EdgeMap, GridCell, GridDock, NodeId, Orientation, OverlayDock, OverlayPanel,
    OverlaySplitter, OverlaySplitterGroup, PanelAnchor, PinDock, PinOrigin, ProportionalDock,
    ProportionalSplitter, RootDock, SplitViewDock, SplitViewMode, StackDock, ToolDock,
    WindowId, WrapDock,
};
use crate::options::DockOptions;

pub const LAYOUT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum LayoutPersistenceError {
    UnsupportedVersion { found: u32, expected: u32 },
    DuplicateId(String),
    /// A node or window index points outside the snapshot.
    DanglingIndex { context: &'static str, index: usize },
    /// The restored tree violates structural invariants.
    Integrity(Vec<String>),
}

impl std::fmt::Display for LayoutPersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => {
                write!(
                    f,
                    "unsupported layout snapshot version: {found} (expected {expected})"
                )
            }
            Self::DuplicateId(id) => write!(f, "duplicate dockable id {id:?}"),
            Self::DanglingIndex { context, index } => {
                write!(f, "dangling {context} index {index}")
            }
            Self::Integrity(issues) => {
                write!(f, "restored layout is inconsistent: {}", issues.join("; "))
            }
        }
    }
}

impl std::error::Error for LayoutPersistenceError {}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub main_root: Option<usize>,
    pub nodes: Vec<NodeSnapshot>,
    pub windows: Vec<WindowSnapshot>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub title: String,
    pub can_close: bool,
    pub can_pin: bool,
    pub can_float: bool,
    pub can_drag: bool,
    pub can_drop: bool,
    pub is_active: bool,
    pub proportion: Option<f32>,
    pub grid_cell: GridCell,
    /// Where a pinned or hidden node goes back to.
    pub origin: Option<OriginSnapshot>,
    pub kind: KindSnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OriginSnapshot {
    pub owner: usize,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum KindSnapshot {
    Document,
    Tool,
    Splitter(ProportionalSplitter),
    OverlaySplitter(OverlaySplitter),
    Dock(DockSnapshot),
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DockSnapshot {
    pub visible: Vec<usize>,
    pub active: Option<usize>,
    pub focused: Option<usize>,
    pub collapsable: bool,
    pub arrangement: ArrangementSnapshot,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ArrangementSnapshot {
    Root {
        pinned: EdgeMap<Option<usize>>,
        hidden: Vec<usize>,
        /// Indices into [`LayoutSnapshot::windows`].
        windows: Vec<usize>,
        window: Option<usize>,
        default_dockable: Option<usize>,
    },
    Proportional {
        orientation: Orientation,
        auto_created: bool,
    },
    Tool {
        alignment: Alignment,
        auto_hide: bool,
    },
    Document {
        can_create_document: bool,
        next_document_serial: u64,
    },
    Pin {
        alignment: Alignment,
        is_expanded: bool,
    },
    Grid {
        rows: Vec<f32>,
        columns: Vec<f32>,
    },
    Stack {
        orientation: Orientation,
        spacing: f32,
    },
    Wrap {
        orientation: Orientation,
    },
    Overlay {
        next_z_index: i32,
    },
    OverlayPanel {
        rect: Rect,
        anchor: PanelAnchor,
        z_index: i32,
    },
    OverlaySplitterGroup {
        orientation: Orientation,
    },
    SplitView {
        pane_length: f32,
        is_pane_open: bool,
        display_mode: SplitViewMode,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WindowSnapshot {
    pub title: String,
    pub rect: Rect,
    /// The root dock the window lays out.
    pub layout: usize,
    /// The root dock that spawned the window.
    pub owner_root: usize,
}

// ----------------------------------------------------------------------------
// Capture

struct Indexer {
    nodes: BTreeMap<NodeId, usize>,
    windows: BTreeMap<WindowId, usize>,
}

impl Indexer {
    fn node(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(&id).copied()
    }

    fn nodes(&self, ids: &[NodeId]) -> Vec<usize> {
        ids.iter().filter_map(|&id| self.node(id)).collect()
    }

    fn window(&self, id: WindowId) -> Option<usize> {
        self.windows.get(&id).copied()
    }
}

fn snapshot_arrangement(arrangement: &Arrangement, ix: &Indexer) -> ArrangementSnapshot {
    match arrangement {
        Arrangement::Root(root) => ArrangementSnapshot::Root {
            pinned: EdgeMap {
                left: root.pinned.left.and_then(|id| ix.node(id)),
                right: root.pinned.right.and_then(|id| ix.node(id)),
                top: root.pinned.top.and_then(|id| ix.node(id)),
                bottom: root.pinned.bottom.and_then(|id| ix.node(id)),
            },
            hidden: ix.nodes(&root.hidden),
            windows: root.windows.iter().filter_map(|&w| ix.window(w)).collect(),
            window: root.window.and_then(|w| ix.window(w)),
            default_dockable: root.default_dockable.and_then(|id| ix.node(id)),
        },
        Arrangement::Proportional(p) => ArrangementSnapshot::Proportional {
            orientation: p.orientation,
            auto_created: p.auto_created,
        },
        Arrangement::Tool(t) => ArrangementSnapshot::Tool {
            alignment: t.alignment,
            auto_hide: t.auto_hide,
        },
        Arrangement::Document(d) => ArrangementSnapshot::Document {
            can_create_document: d.can_create_document,
            next_document_serial: d.next_document_serial,
        },
        Arrangement::Pin(p) => ArrangementSnapshot::Pin {
            alignment: p.alignment,
            is_expanded: p.is_expanded,
        },
        Arrangement::Grid(g) => ArrangementSnapshot::Grid {
            rows: g.rows.clone(),
            columns: g.columns.clone(),
        },
        Arrangement::Stack(s) => ArrangementSnapshot::Stack {
            orientation: s.orientation,
            spacing: s.spacing,
        },
        Arrangement::Wrap(w) => ArrangementSnapshot::Wrap {
            orientation: w.orientation,
        },
        Arrangement::Overlay(o) => ArrangementSnapshot::Overlay {
            next_z_index: o.next_z_index,
        },
        Arrangement::OverlayPanel(p) => ArrangementSnapshot::OverlayPanel {
            rect: p.rect,
            anchor: p.anchor,
            z_index: p.z_index,
        },
        Arrangement::OverlaySplitterGroup(g) => ArrangementSnapshot::OverlaySplitterGroup {
            orientation: g.orientation,
        },
        Arrangement::SplitView(s) => ArrangementSnapshot::SplitView {
            pane_length: s.pane_length,
            is_pane_open: s.is_pane_open,
            display_mode: s.display_mode,
        },
    }
}

fn snapshot_node(dockable: &Dockable, ix: &Indexer) -> NodeSnapshot {
    let kind = match &dockable.kind {
        DockableKind::Document => KindSnapshot::Document,
        DockableKind::Tool => KindSnapshot::Tool,
        DockableKind::Splitter(s) => KindSnapshot::Splitter(*s),
        DockableKind::OverlaySplitter(s) => KindSnapshot::OverlaySplitter(*s),
        DockableKind::Dock(dock) => KindSnapshot::Dock(DockSnapshot {
            visible: ix.nodes(&dock.visible),
            active: dock.active.and_then(|id| ix.node(id)),
            focused: dock.focused.and_then(|id| ix.node(id)),
            collapsable: dock.collapsable,
            arrangement: snapshot_arrangement(&dock.arrangement, ix),
        }),
    };
    NodeSnapshot {
        id: dockable.id.clone(),
        title: dockable.title.clone(),
        can_close: dockable.can_close,
        can_pin: dockable.can_pin,
        can_float: dockable.can_float,
        can_drag: dockable.can_drag,
        can_drop: dockable.can_drop,
        is_active: dockable.is_active,
        proportion: dockable.proportion,
        grid_cell: dockable.grid_cell,
        // An origin whose owner has since collapsed is dropped: putting the node back then
        // splits the root, which is what a stale origin does too.
        origin: dockable.origin.and_then(|o| {
            Some(OriginSnapshot {
                owner: ix.node(o.owner)?,
                index: o.index,
            })
        }),
        kind,
    }
}

// ----------------------------------------------------------------------------
// Rebuild

struct Resolver {
    node_count: usize,
    window_count: usize,
}

impl Resolver {
    fn node(&self, context: &'static str, index: usize) -> Result<NodeId, LayoutPersistenceError> {
        if index < self.node_count {
            Ok(NodeId(index as u64 + 1))
        } else {
            Err(LayoutPersistenceError::DanglingIndex { context, index })
        }
    }

    fn opt_node(
        &self,
        context: &'static str,
        index: Option<usize>,
    ) -> Result<Option<NodeId>, LayoutPersistenceError> {
        index.map(|i| self.node(context, i)).transpose()
    }

    fn nodes(
        &self,
        context: &'static str,
        indices: &[usize],
    ) -> Result<Vec<NodeId>, LayoutPersistenceError> {
        indices.iter().map(|&i| self.node(context, i)).collect()
    }

    fn window(
        &self,
        context: &'static str,
        index: usize,
    ) -> Result<WindowId, LayoutPersistenceError> {
        if index < self.window_count {
            Ok(WindowId(index as u64 + 1))
        } else {
            Err(LayoutPersistenceError::DanglingIndex { context, index })
        }
    }
}

fn restore_arrangement(
    snapshot: &ArrangementSnapshot,
    r: &Resolver,
) -> Result<Arrangement, LayoutPersistenceError> {
    Ok(match snapshot {
        ArrangementSnapshot::Root {
            pinned,
            hidden,
            windows,
            window,
            default_dockable,
        } => Arrangement::Root(RootDock {
            pinned: EdgeMap {
                left: r.opt_node("pin strip", pinned.left)?,
                right: r.opt_node("pin strip", pinned.right)?,
                top: r.opt_node("pin strip", pinned.top)?,
                bottom: r.opt_node("pin strip", pinned.bottom)?,
            },
            hidden: r.nodes("hidden", hidden)?,
            windows: windows
                .iter()
                .map(|&w| r.window("root window", w))
                .collect::<Result<_, _>>()?,
            window: window.map(|w| r.window("root layout window", w)).transpose()?,
            default_dockable: r.opt_node("default dockable", *default_dockable)?,
        }),
        ArrangementSnapshot::Proportional {
            orientation,
            auto_created,
        } => Arrangement::Proportional(ProportionalDock {
            orientation: *orientation,
            auto_created: *auto_created,
        }),
        ArrangementSnapshot::Tool {
            alignment,
            auto_hide,
        } => Arrangement::Tool(ToolDock {
            alignment: *alignment,
            auto_hide: *auto_hide,
        }),
        ArrangementSnapshot::Document {
            can_create_document,
            next_document_serial,
        } => Arrangement::Document(DocumentDock {
            can_create_document: *can_create_document,
            next_document_serial: *next_document_serial,
        }),
        ArrangementSnapshot::Pin {
            alignment,
            is_expanded,
        } => Arrangement::Pin(PinDock {
            alignment: *alignment,
            is_expanded: *is_expanded,
        }),
        ArrangementSnapshot::Grid { rows, columns } => Arrangement::Grid(GridDock {
            rows: rows.clone(),
            columns: columns.clone(),
        }),
        ArrangementSnapshot::Stack {
            orientation,
            spacing,
        } => Arrangement::Stack(StackDock {
            orientation: *orientation,
            spacing: *spacing,
        }),
        ArrangementSnapshot::Wrap { orientation } => Arrangement::Wrap(WrapDock {
            orientation: *orientation,
        }),
        ArrangementSnapshot::Overlay { next_z_index } => Arrangement::Overlay(OverlayDock {
            next_z_index: *next_z_index,
        }),
        ArrangementSnapshot::OverlayPanel {
            rect,
            anchor,
            z_index,
        } => Arrangement::OverlayPanel(OverlayPanel {
            rect: *rect,
            anchor: *anchor,
            z_index: *z_index,
        }),
        ArrangementSnapshot::OverlaySplitterGroup { orientation } => {
            Arrangement::OverlaySplitterGroup(OverlaySplitterGroup {
                orientation: *orientation,
            })
        }
        ArrangementSnapshot::SplitView {
            pane_length,
            is_pane_open,
            display_mode,
        } => Arrangement::SplitView(SplitViewDock {
            pane_length: *pane_length,
            is_pane_open: *is_pane_open,
            display_mode: *display_mode,
        }),
    })
}

fn restore_node(
    snapshot: &NodeSnapshot,
    r: &Resolver,
) -> Result<Dockable, LayoutPersistenceError> {
    let kind = match &snapshot.kind {
        KindSnapshot::Document => DockableKind::Document,
        KindSnapshot::Tool => DockableKind::Tool,
        KindSnapshot::Splitter(s) => DockableKind::Splitter(*s),
        KindSnapshot::OverlaySplitter(s) => DockableKind::OverlaySplitter(*s),
        KindSnapshot::Dock(dock) => {
            let mut restored = Dock::new(restore_arrangement(&dock.arrangement, r)?);
            restored.visible = r.nodes("visible child", &dock.visible)?;
            restored.active = r.opt_node("active child", dock.active)?;
            restored.focused = r.opt_node("focused child", dock.focused)?;
            restored.collapsable = dock.collapsable;
            DockableKind::Dock(restored)
        }
    };
    let origin = match snapshot.origin {
        Some(o) => Some(PinOrigin {
            owner: r.node("origin", o.owner)?,
            index: o.index,
        }),
        None => None,
    };
    Ok(Dockable {
        id: snapshot.id.clone(),
        title: snapshot.title.clone(),
        owner: None,
        origin,
        can_close: snapshot.can_close,
        can_pin: snapshot.can_pin,
        can_float: snapshot.can_float,
        can_drag: snapshot.can_drag,
        can_drop: snapshot.can_drop,
        is_active: snapshot.is_active,
        proportion: snapshot.proportion,
        grid_cell: snapshot.grid_cell,
        kind,
    })
}

impl Factory {
    /// Capture the whole layout, floating windows included.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let tree = self.tree();
        let ix = Indexer {
            nodes: tree
                .dockables()
                .enumerate()
                .map(|(i, (id, _))| (id, i))
                .collect(),
            windows: tree
                .windows()
                .enumerate()
                .map(|(i, w)| (w.id(), i))
                .collect(),
        };

        let nodes = tree
            .dockables()
            .map(|(_, dockable)| snapshot_node(dockable, &ix))
            .collect();
        let windows = tree
            .windows()
            .filter_map(|w| {
                Some(WindowSnapshot {
                    title: w.title.clone(),
                    rect: w.rect,
                    layout: ix.node(w.layout())?,
                    owner_root: ix.node(w.owner_root())?,
                })
            })
            .collect();

        LayoutSnapshot {
            version: LAYOUT_SNAPSHOT_VERSION,
            main_root: tree.main_root().and_then(|id| ix.node(id)),
            nodes,
            windows,
        }
    }

    /// Rebuild a factory from a snapshot, with default options.
    ///
    /// # Errors
    /// See [`Self::restore_with_options`].
    pub fn restore(snapshot: &LayoutSnapshot) -> Result<Self, LayoutPersistenceError> {
        Self::restore_with_options(snapshot, DockOptions::default())
    }

    /// Rebuild a factory from a snapshot.
    ///
    /// Restored windows are untracked; install a host window locator and call
    /// [`Self::present_windows`] to show them.
    ///
    /// # Errors
    /// Fails on an unknown snapshot version, duplicate string ids, indices pointing outside
    /// the snapshot, or a layout that breaks the tree's structural invariants.
    pub fn restore_with_options(
        snapshot: &LayoutSnapshot,
        options: DockOptions,
    ) -> Result<Self, LayoutPersistenceError> {
        if snapshot.version != LAYOUT_SNAPSHOT_VERSION {
            return Err(LayoutPersistenceError::UnsupportedVersion {
                found: snapshot.version,
                expected: LAYOUT_SNAPSHOT_VERSION,
            });
        }

        let r = Resolver {
            node_count: snapshot.nodes.len(),
            window_count: snapshot.windows.len(),
        };
        let mut tree = DockTree::default();

        for node in &snapshot.nodes {
            let dockable = restore_node(node, &r)?;
            if tree.insert(dockable).is_none() {
                return Err(LayoutPersistenceError::DuplicateId(node.id.clone()));
            }
        }

        // Owners are derived from the containers' member lists.
        let owned: Vec<(NodeId, NodeId)> = tree
            .dockables()
            .flat_map(|(id, _)| {
                tree.members_of(id)
                    .into_iter()
                    .map(move |child| (child, id))
            })
            .collect();
        for (child, owner) in owned {
            if let Some(d) = tree.get_mut(child) {
                d.owner = Some(owner);
            }
        }

        for (i, window) in snapshot.windows.iter().enumerate() {
            let id = tree.alloc_window_id();
            debug_assert_eq!(id, WindowId(i as u64 + 1), "window ids are dense");
            let layout = r.node("window layout", window.layout)?;
            let owner_root = r.node("window owner", window.owner_root)?;
            tree.windows.insert(
                id,
                DockWindow::new(id, window.title.clone(), window.rect, layout, owner_root),
            );
        }

        tree.main_root = match snapshot.main_root {
            Some(index) => {
                let root = r.node("main root", index)?;
                if tree.get(root).is_none_or(|d| !d.is_root()) {
                    return Err(LayoutPersistenceError::Integrity(vec![format!(
                        "main root {index} is not a root dock"
                    )]));
                }
                Some(root)
            }
            None => None,
        };

        let issues = tree.integrity_issues();
        if !issues.is_empty() {
            log::debug!("restore refused: {} integrity issue(s)", issues.len());
            return Err(LayoutPersistenceError::Integrity(issues));
        }

        Ok(Self::from_tree(tree, options))
    }
}
