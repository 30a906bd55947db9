use egui::{Pos2, Rect};

use super::zone::DockZones;
use crate::model::{DockOperation, NodeId};

/// Identifies one host surface (a main window, a floating window, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Which marker an element must carry to be returned by [`DockSurface::hit_test`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaMarker {
    /// Elements a drag may start from (tabs, title bars).
    DragArea,
    /// Elements that accept drops.
    DropArea,
}

/// The innermost marked element under a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitElement {
    /// The dockable the element presents.
    pub dockable: NodeId,
    /// Element bounds, in the surface's local coordinates.
    pub bounds: Rect,
    /// Drops are currently enabled on this element.
    pub drop_enabled: bool,
}

/// Why a hit test could not be answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HitTestError {
    /// The surface (or the element under the point) has been torn down.
    Disposed,
    Backend(String),
}

impl std::fmt::Display for HitTestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disposed => write!(f, "hit test on a disposed surface"),
            Self::Backend(msg) => write!(f, "hit test failed: {msg}"),
        }
    }
}

impl std::error::Error for HitTestError {}

/// A rendering surface the drag state machine can hit-test.
pub trait DockSurface {
    fn surface_id(&self) -> SurfaceId;

    /// The innermost element carrying `marker` at `local`, if any.
    fn hit_test(
        &self,
        local: Pos2,
        marker: AreaMarker,
    ) -> Result<Option<HitElement>, HitTestError>;

    fn screen_to_local(&self, screen: Pos2) -> Pos2;

    fn local_to_screen(&self, local: Pos2) -> Pos2;
}

/// Draws the drop preview for the current target.
///
/// The state machine adds exactly one adorner when it enters a target and removes it when it
/// leaves.
pub trait DockAdorner {
    fn add_adorner(&mut self, surface: SurfaceId, target: NodeId, bounds: Rect);

    fn remove_adorner(&mut self);

    /// Highlight `operation`; `valid` is false when the drop would be refused.
    fn show_preview(&mut self, operation: DockOperation, valid: bool);

    /// Which zone of the target at `bounds` the pointer at `local` is over.
    fn dock_operation(
        &self,
        local: Pos2,
        bounds: Rect,
        zones: &DockZones,
    ) -> Option<DockOperation> {
        zones.resolve(bounds, local)
    }
}
