//! The dock tree data model: dockables, dock arrangements, floating windows.
//!
//! Ownership flows one way: a [`Dock`] lists its children by [`NodeId`], and every
//! [`Dockable`] stores a non-owning back-reference to its owner. All dockables live in the
//! [`DockTree`] arena, and only the [`crate::Factory`] mutates structure.

use egui::Rect;

pub(crate) mod integrity;
mod tree;
mod window;

pub use tree::DockTree;
pub use window::{DockWindow, HostWindowLocator, WindowHost, WindowId};

/// Arena handle of a dockable inside a [`DockTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Layout axis of proportional, stack, wrap and splitter-group docks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Screen edge a tool dock (or pin strip) is logically attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Alignment {
    #[default]
    Unset,
    Left,
    Right,
    Top,
    Bottom,
}

impl Alignment {
    pub const EDGES: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    /// The edge itself, with `Unset` resolved to `Left`.
    pub fn edge(self) -> Self {
        match self {
            Self::Unset => Self::Left,
            edge => edge,
        }
    }

    pub fn split_operation(self) -> DockOperation {
        match self.edge() {
            Self::Right => DockOperation::Right,
            Self::Top => DockOperation::Top,
            Self::Bottom => DockOperation::Bottom,
            Self::Left | Self::Unset => DockOperation::Left,
        }
    }
}

/// The resolved drop zone of a drag gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DockOperation {
    #[default]
    Fill,
    Left,
    Right,
    Top,
    Bottom,
    Window,
}

impl DockOperation {
    pub fn is_edge(self) -> bool {
        matches!(self, Self::Left | Self::Right | Self::Top | Self::Bottom)
    }

    /// Orientation of the proportional dock an edge split creates.
    pub fn split_orientation(self) -> Option<Orientation> {
        match self {
            Self::Left | Self::Right => Some(Orientation::Horizontal),
            Self::Top | Self::Bottom => Some(Orientation::Vertical),
            Self::Fill | Self::Window => None,
        }
    }

    /// Whether the new dock goes before the target along the split axis.
    pub fn inserts_before(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    pub fn alignment(self) -> Alignment {
        match self {
            Self::Left => Alignment::Left,
            Self::Right => Alignment::Right,
            Self::Top => Alignment::Top,
            Self::Bottom => Alignment::Bottom,
            Self::Fill | Self::Window => Alignment::Unset,
        }
    }
}

/// The semantic intent of a drag gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DragAction {
    #[default]
    Move,
    Copy,
    /// Swap source and target.
    Link,
}

/// Cell placement of a child inside a [`GridDock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GridCell {
    pub row: u32,
    pub column: u32,
    pub row_span: u32,
    pub column_span: u32,
}

impl Default for GridCell {
    fn default() -> Self {
        Self {
            row: 0,
            column: 0,
            row_span: 1,
            column_span: 1,
        }
    }
}

/// Where a pinned or hidden dockable came from, so it can be put back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PinOrigin {
    pub owner: NodeId,
    pub index: usize,
}

/// The base unit placeable in the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Dockable {
    /// Unique within a loaded layout; survives persistence round trips.
    pub id: String,
    pub title: String,
    pub(crate) owner: Option<NodeId>,
    pub(crate) origin: Option<PinOrigin>,
    pub can_close: bool,
    pub can_pin: bool,
    pub can_float: bool,
    pub can_drag: bool,
    pub can_drop: bool,
    pub(crate) is_active: bool,

    /// Relative size inside a proportional owner. `None` means "share the rest evenly".
    pub proportion: Option<f32>,
    pub grid_cell: GridCell,
    pub kind: DockableKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DockableKind {
    Document,
    Tool,
    Splitter(ProportionalSplitter),
    OverlaySplitter(OverlaySplitter),
    Dock(Dock),
}

/// Leaf kinds, used by acceptance rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafKind {
    Document,
    Tool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProportionalSplitter {
    pub can_resize: bool,
    pub resize_preview: bool,
}

impl Default for ProportionalSplitter {
    fn default() -> Self {
        Self {
            can_resize: true,
            resize_preview: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct OverlaySplitter {
    pub thickness: f32,
}

impl Dockable {
    fn with_kind(id: impl Into<String>, title: impl Into<String>, kind: DockableKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            owner: None,
            origin: None,
            can_close: true,
            can_pin: true,
            can_float: true,
            can_drag: true,
            can_drop: true,
            is_active: false,
            proportion: None,
            grid_cell: GridCell::default(),
            kind,
        }
    }

    fn dock(id: impl Into<String>, arrangement: Arrangement) -> Self {
        let mut dockable = Self::with_kind(id, "", DockableKind::Dock(Dock::new(arrangement)));
        dockable.can_pin = false;
        dockable
    }

    pub fn document(id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut dockable = Self::with_kind(id, title, DockableKind::Document);
        dockable.can_pin = false;
        dockable
    }

    pub fn tool(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_kind(id, title, DockableKind::Tool)
    }

    pub fn splitter(id: impl Into<String>) -> Self {
        let mut dockable = Self::with_kind(
            id,
            "",
            DockableKind::Splitter(ProportionalSplitter::default()),
        );
        dockable.can_close = false;
        dockable.can_pin = false;
        dockable.can_float = false;
        dockable.can_drag = false;
        dockable.can_drop = false;
        dockable
    }

    pub fn overlay_splitter(id: impl Into<String>, thickness: f32) -> Self {
        let mut dockable = Self::splitter(id);
        dockable.kind = DockableKind::OverlaySplitter(OverlaySplitter { thickness });
        dockable
    }

    pub fn root(id: impl Into<String>) -> Self {
        let mut dockable = Self::dock(id, Arrangement::Root(RootDock::default()));
        dockable.can_close = false;
        dockable.can_float = false;
        dockable.can_drag = false;
        if let Some(dock) = dockable.as_dock_mut() {
            dock.collapsable = false;
        }
        dockable
    }

    pub fn proportional(id: impl Into<String>, orientation: Orientation) -> Self {
        Self::dock(
            id,
            Arrangement::Proportional(ProportionalDock {
                orientation,
                auto_created: false,
            }),
        )
    }

    /// The wrapper a split creates; it flattens back out once one child remains.
    pub(crate) fn split_wrapper(id: impl Into<String>, orientation: Orientation) -> Self {
        Self::dock(
            id,
            Arrangement::Proportional(ProportionalDock {
                orientation,
                auto_created: true,
            }),
        )
    }

    pub fn tool_dock(id: impl Into<String>, alignment: Alignment) -> Self {
        Self::dock(
            id,
            Arrangement::Tool(ToolDock {
                alignment,
                auto_hide: false,
            }),
        )
    }

    pub fn document_dock(id: impl Into<String>) -> Self {
        Self::dock(id, Arrangement::Document(DocumentDock::default()))
    }

    pub fn pin_dock(id: impl Into<String>, alignment: Alignment) -> Self {
        let mut dockable = Self::dock(
            id,
            Arrangement::Pin(PinDock {
                alignment,
                is_expanded: false,
            }),
        );
        dockable.can_drag = false;
        dockable.can_float = false;
        if let Some(dock) = dockable.as_dock_mut() {
            dock.collapsable = false;
        }
        dockable
    }

    pub fn grid(id: impl Into<String>, rows: Vec<f32>, columns: Vec<f32>) -> Self {
        Self::dock(id, Arrangement::Grid(GridDock { rows, columns }))
    }

    pub fn stack(id: impl Into<String>, orientation: Orientation) -> Self {
        Self::dock(
            id,
            Arrangement::Stack(StackDock {
                orientation,
                spacing: 0.0,
            }),
        )
    }

    pub fn wrap(id: impl Into<String>, orientation: Orientation) -> Self {
        Self::dock(id, Arrangement::Wrap(WrapDock { orientation }))
    }

    pub fn overlay(id: impl Into<String>) -> Self {
        Self::dock(id, Arrangement::Overlay(OverlayDock::default()))
    }

    pub fn overlay_panel(id: impl Into<String>, rect: Rect) -> Self {
        Self::dock(
            id,
            Arrangement::OverlayPanel(OverlayPanel {
                rect,
                anchor: PanelAnchor::TopLeft,
                z_index: 0,
            }),
        )
    }

    pub fn overlay_splitter_group(id: impl Into<String>, orientation: Orientation) -> Self {
        Self::dock(
            id,
            Arrangement::OverlaySplitterGroup(OverlaySplitterGroup { orientation }),
        )
    }

    pub fn split_view(id: impl Into<String>, pane_length: f32) -> Self {
        Self::dock(
            id,
            Arrangement::SplitView(SplitViewDock {
                pane_length,
                is_pane_open: true,
                display_mode: SplitViewMode::Inline,
            }),
        )
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_proportion(mut self, proportion: f32) -> Self {
        self.proportion = Some(proportion);
        self
    }

    #[must_use]
    pub fn with_collapsable(mut self, collapsable: bool) -> Self {
        if let Some(dock) = self.as_dock_mut() {
            dock.collapsable = collapsable;
        }
        self
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn origin(&self) -> Option<PinOrigin> {
        self.origin
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn as_dock(&self) -> Option<&Dock> {
        match &self.kind {
            DockableKind::Dock(dock) => Some(dock),
            _ => None,
        }
    }

    pub fn as_dock_mut(&mut self) -> Option<&mut Dock> {
        match &mut self.kind {
            DockableKind::Dock(dock) => Some(dock),
            _ => None,
        }
    }

    pub fn is_dock(&self) -> bool {
        matches!(self.kind, DockableKind::Dock(_))
    }

    pub fn is_splitter(&self) -> bool {
        matches!(
            self.kind,
            DockableKind::Splitter(_) | DockableKind::OverlaySplitter(_)
        )
    }

    pub fn leaf_kind(&self) -> Option<LeafKind> {
        match self.kind {
            DockableKind::Document => Some(LeafKind::Document),
            DockableKind::Tool => Some(LeafKind::Tool),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.as_dock()
            .is_some_and(|d| matches!(d.arrangement, Arrangement::Root(_)))
    }
}

/// Shared capability set of every container.
#[derive(Clone, Debug, PartialEq)]
pub struct Dock {
    /// Ordered children: tab order or split order.
    pub(crate) visible: Vec<NodeId>,
    pub(crate) active: Option<NodeId>,
    pub(crate) focused: Option<NodeId>,
    /// Whether the factory may remove this dock once it runs empty.
    pub collapsable: bool,
    pub arrangement: Arrangement,
}

impl Dock {
    pub fn new(arrangement: Arrangement) -> Self {
        Self {
            visible: Vec::new(),
            active: None,
            focused: None,
            collapsable: true,
            arrangement,
        }
    }

    pub fn visible(&self) -> &[NodeId] {
        &self.visible
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        self.visible.iter().position(|&c| c == child)
    }

    pub fn root(&self) -> Option<&RootDock> {
        match &self.arrangement {
            Arrangement::Root(root) => Some(root),
            _ => None,
        }
    }

    pub(crate) fn root_mut(&mut self) -> Option<&mut RootDock> {
        match &mut self.arrangement {
            Arrangement::Root(root) => Some(root),
            _ => None,
        }
    }
}

/// Closed set of container arrangements.
#[derive(Clone, Debug, PartialEq)]
pub enum Arrangement {
    Root(RootDock),
    Proportional(ProportionalDock),
    Tool(ToolDock),
    Document(DocumentDock),
    Pin(PinDock),
    Grid(GridDock),
    Stack(StackDock),
    Wrap(WrapDock),
    Overlay(OverlayDock),
    OverlayPanel(OverlayPanel),
    OverlaySplitterGroup(OverlaySplitterGroup),
    SplitView(SplitViewDock),
}

impl Arrangement {
    /// Whether a leaf may be dropped into this container's own collection with `Fill`.
    pub fn accepts(&self, leaf: LeafKind, child_count: usize) -> bool {
        match self {
            Self::Tool(_) => leaf == LeafKind::Tool,
            Self::Document(_) => leaf == LeafKind::Document,
            Self::Grid(_) | Self::Stack(_) | Self::Wrap(_) | Self::Overlay(_) => true,
            Self::SplitView(_) => child_count < 2,
            Self::Root(_)
            | Self::Proportional(_)
            | Self::Pin(_)
            | Self::OverlayPanel(_)
            | Self::OverlaySplitterGroup(_) => false,
        }
    }

    /// Whether this container is laid out with splitters between its children.
    pub fn uses_splitters(&self) -> bool {
        matches!(self, Self::Proportional(_) | Self::OverlaySplitterGroup(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Root(_) => "Root",
            Self::Proportional(_) => "Proportional",
            Self::Tool(_) => "Tool",
            Self::Document(_) => "Document",
            Self::Pin(_) => "Pin",
            Self::Grid(_) => "Grid",
            Self::Stack(_) => "Stack",
            Self::Wrap(_) => "Wrap",
            Self::Overlay(_) => "Overlay",
            Self::OverlayPanel(_) => "OverlayPanel",
            Self::OverlaySplitterGroup(_) => "OverlaySplitterGroup",
            Self::SplitView(_) => "SplitView",
        }
    }
}

/// Per-edge slots, used for a root's pin strips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EdgeMap<T> {
    pub left: T,
    pub right: T,
    pub top: T,
    pub bottom: T,
}

impl<T> EdgeMap<T> {
    pub fn get(&self, edge: Alignment) -> &T {
        match edge.edge() {
            Alignment::Right => &self.right,
            Alignment::Top => &self.top,
            Alignment::Bottom => &self.bottom,
            Alignment::Left | Alignment::Unset => &self.left,
        }
    }

    pub fn get_mut(&mut self, edge: Alignment) -> &mut T {
        match edge.edge() {
            Alignment::Right => &mut self.right,
            Alignment::Top => &mut self.top,
            Alignment::Bottom => &mut self.bottom,
            Alignment::Left | Alignment::Unset => &mut self.left,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Alignment, &T)> {
        [
            (Alignment::Left, &self.left),
            (Alignment::Right, &self.right),
            (Alignment::Top, &self.top),
            (Alignment::Bottom, &self.bottom),
        ]
        .into_iter()
    }
}

/// Top of a window's tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootDock {
    /// Pin strips, created lazily on first pin.
    pub(crate) pinned: EdgeMap<Option<NodeId>>,
    pub(crate) hidden: Vec<NodeId>,
    /// Floating windows spawned from this root.
    pub(crate) windows: Vec<WindowId>,
    /// The floating window this root lays out, if any.
    pub(crate) window: Option<WindowId>,
    /// Takes over the root's focus when the focused dockable leaves the layout. See
    /// [`crate::Factory::set_default_dockable`].
    pub default_dockable: Option<NodeId>,
}

impl RootDock {
    pub fn pinned(&self) -> &EdgeMap<Option<NodeId>> {
        &self.pinned
    }

    pub fn hidden(&self) -> &[NodeId] {
        &self.hidden
    }

    pub fn windows(&self) -> &[WindowId] {
        &self.windows
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProportionalDock {
    pub orientation: Orientation,
    /// Created by a split; collapses back out once a single child remains.
    pub auto_created: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolDock {
    pub alignment: Alignment,
    /// Presentation hint for the host (collapse the strip while unfocused). Persisted, never
    /// read by the factory; pinning stays an explicit operation.
    pub auto_hide: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentDock {
    pub can_create_document: bool,
    pub(crate) next_document_serial: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinDock {
    pub alignment: Alignment,
    pub is_expanded: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridDock {
    /// Row definitions as relative weights.
    pub rows: Vec<f32>,
    pub columns: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackDock {
    pub orientation: Orientation,
    pub spacing: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapDock {
    pub orientation: Orientation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayDock {
    pub(crate) next_z_index: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PanelAnchor {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

/// A free-floating, positioned child of an [`OverlayDock`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPanel {
    pub rect: Rect,
    pub anchor: PanelAnchor,
    pub z_index: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlaySplitterGroup {
    pub orientation: Orientation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SplitViewMode {
    #[default]
    Inline,
    Overlay,
    CompactInline,
    CompactOverlay,
}

/// Two-pane container: the first child is the pane, the second the content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitViewDock {
    pub pane_length: f32,
    pub is_pane_open: bool,
    pub display_mode: SplitViewMode,
}
