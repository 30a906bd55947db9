use crate::model::{DockOperation, NodeId, WindowId};

/// Tree-change notification, queued by the [`crate::Factory`] and drained by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum DockEvent {
    Added {
        dockable: NodeId,
        owner: NodeId,
    },
    Removed {
        dockable: NodeId,
        owner: NodeId,
    },
    Moved {
        dockable: NodeId,
        from: NodeId,
        to: NodeId,
        index: usize,
    },
    Swapped {
        first: NodeId,
        second: NodeId,
    },
    Split {
        target: NodeId,
        inserted: NodeId,
        container: NodeId,
        operation: DockOperation,
    },
    /// An emptied dock was removed, or a single-child wrapper was flattened.
    Collapsed {
        dock: NodeId,
    },
    Pinned {
        dockable: NodeId,
        pin_dock: NodeId,
    },
    Unpinned {
        dockable: NodeId,
        owner: NodeId,
    },
    Hidden {
        dockable: NodeId,
    },
    Restored {
        dockable: NodeId,
        owner: NodeId,
    },
    /// The dockable has been deleted from the tree.
    Closed {
        dockable: NodeId,
        id: String,
    },
    ActiveChanged {
        dock: NodeId,
        active: Option<NodeId>,
    },
    FocusChanged {
        root: NodeId,
        focused: Option<NodeId>,
    },
    Resized {
        dockable: NodeId,
    },
    WindowOpened {
        window: WindowId,
    },
    WindowClosed {
        window: WindowId,
    },
}
