//! Dockable-panel layout engine.
//!
//! A [`DockTree`] of documents, tools and containers, mutated only through the [`Factory`];
//! a [`DockManager`] that decides whether a drop is legal and performs it; and a pointer
//! state machine ([`DockControlState`]) that turns press/move/release events into previews
//! and drops. Rendering and platform windows stay with the host, behind the [`DockSurface`],
//! [`DockAdorner`] and [`WindowHost`] traits.

#![forbid(unsafe_code)]

mod debug;

pub mod builder;
pub mod drag;
pub mod factory;
pub mod manager;
pub mod model;
pub mod options;

#[cfg(feature = "serde")]
pub mod persistence;

#[cfg(test)]
mod test_support;

pub use builder::{DockBuilder, DockNodeId, SplitDirection};
pub use drag::{
    AreaMarker, DockAdorner, DockControlState, DockSurface, DockZones, DragContext, DragPhase,
    DragSession, HitElement, HitTestError, PointerEvent, PointerEventKind, SurfaceId,
};
pub use factory::{DockEvent, Factory};
pub use manager::DockManager;
pub use model::{
    Alignment, Arrangement, Dock, DockOperation, DockTree, DockWindow, Dockable, DockableKind,
    DragAction, HostWindowLocator, LeafKind, NodeId, Orientation, WindowHost, WindowId,
};
pub use options::DockOptions;

#[cfg(feature = "serde")]
pub use persistence::{LAYOUT_SNAPSHOT_VERSION, LayoutPersistenceError, LayoutSnapshot};
