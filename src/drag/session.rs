use egui::{Pos2, Vec2};

use super::surface::SurfaceId;
use crate::model::{DragAction, NodeId};

/// Per-gesture context: what is being dragged, from where, and whether it was dropped.
#[derive(Debug)]
pub struct DragSession {
    id: u64,
    source: NodeId,
    source_surface: SurfaceId,
    source_size: Option<Vec2>,
    origin: Pos2,
    action: DragAction,
    hovered_surface: Option<SurfaceId>,
    executed: bool,
}

impl DragSession {
    pub(crate) fn new(
        id: u64,
        source: NodeId,
        source_surface: SurfaceId,
        source_size: Option<Vec2>,
        origin: Pos2,
        action: DragAction,
    ) -> Self {
        Self {
            id,
            source,
            source_surface,
            source_size,
            origin,
            action,
            hovered_surface: Some(source_surface),
            executed: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn source_surface(&self) -> SurfaceId {
        self.source_surface
    }

    pub fn source_size(&self) -> Option<Vec2> {
        self.source_size
    }

    /// Screen position of the press that started the gesture.
    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn action(&self) -> DragAction {
        self.action
    }

    pub(crate) fn set_action(&mut self, action: DragAction) {
        self.action = action;
    }

    pub fn hovered_surface(&self) -> Option<SurfaceId> {
        self.hovered_surface
    }

    pub(crate) fn set_hovered_surface(&mut self, surface: Option<SurfaceId>) {
        if surface.is_some() {
            self.hovered_surface = surface;
        }
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Claim the single drop of this gesture. Only the first call returns true.
    pub fn try_execute(&mut self) -> bool {
        !std::mem::replace(&mut self.executed, true)
    }

    /// Re-arm the drop latch.
    pub fn cancel(&mut self) {
        self.executed = false;
    }

    /// Indices into `surfaces` in hit-test order: `hint` first, then the surface hovered last,
    /// then the rest in registration order.
    pub(crate) fn surface_order(
        &self,
        surfaces: &[SurfaceId],
        hint: Option<SurfaceId>,
    ) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::with_capacity(surfaces.len());
        for preferred in [hint, self.hovered_surface].into_iter().flatten() {
            if let Some(i) = surfaces.iter().position(|&s| s == preferred) {
                if !order.contains(&i) {
                    order.push(i);
                }
            }
        }
        let rest: Vec<usize> = (0..surfaces.len()).filter(|i| !order.contains(i)).collect();
        order.extend(rest);
        order
    }
}
