//! Pointer-driven drag and drop.
//!
//! [`DockControlState`] turns a stream of [`PointerEvent`]s into hover previews and, on release,
//! one [`DockManager::validate`] call with `execute == true`. It owns no tree state: the host
//! passes a [`DragContext`] with the factory, the manager, the registered surfaces and the
//! preview adorner on every event.
//!
//! Phases: `Idle` → (press on a drag area) `Pressed` → (moved past the drag threshold)
//! `Dragging` → (release or capture loss) `Idle`. Capture loss resets from any phase.

mod session;
mod surface;
mod zone;

#[cfg(test)]
mod drag_tests;

use egui::{Pos2, Rect, Vec2};

pub use session::DragSession;
pub use surface::{AreaMarker, DockAdorner, DockSurface, HitElement, HitTestError, SurfaceId};
pub use zone::DockZones;

use crate::factory::Factory;
use crate::manager::DockManager;
use crate::model::{DockOperation, DragAction, NodeId};

/// What one pointer event gets to work with.
pub struct DragContext<'a> {
    pub factory: &'a mut Factory,

    /// Validates and executes drops. Its options supply the drag threshold and drop zones.
    pub manager: &'a mut DockManager,

    /// Every registered host surface, in registration order.
    pub surfaces: &'a [&'a dyn DockSurface],

    pub adorner: &'a mut dyn DockAdorner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Press,
    Move,
    Release,
    /// The pointer capture was taken away. Always cancels.
    CaptureLost,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,

    /// Pointer position in screen coordinates.
    pub position: Pos2,

    /// The surface the host received the event on, if known. Required for presses.
    pub surface: Option<SurfaceId>,

    /// Intent the host derived from modifier keys.
    pub drag_action: DragAction,
}

impl PointerEvent {
    fn new(kind: PointerEventKind, position: Pos2) -> Self {
        Self {
            kind,
            position,
            surface: None,
            drag_action: DragAction::Move,
        }
    }

    pub fn press(surface: SurfaceId, position: Pos2) -> Self {
        Self::new(PointerEventKind::Press, position).on_surface(surface)
    }

    pub fn moved(position: Pos2) -> Self {
        Self::new(PointerEventKind::Move, position)
    }

    pub fn release(position: Pos2) -> Self {
        Self::new(PointerEventKind::Release, position)
    }

    pub fn capture_lost() -> Self {
        Self::new(PointerEventKind::CaptureLost, Pos2::ZERO)
    }

    #[inline]
    pub fn on_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }

    #[inline]
    pub fn with_action(mut self, action: DragAction) -> Self {
        self.drag_action = action;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Pressed,
    Dragging,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    source: NodeId,
    surface: SurfaceId,
    origin: Pos2,
    source_size: Vec2,
    action: DragAction,
}

/// The drop area the pointer is over, with its adorner shown.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DropTarget {
    surface: SurfaceId,
    dockable: NodeId,
    bounds: Rect,
    drop_enabled: bool,
    operation: DockOperation,
    valid: bool,
}

#[derive(Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Pressed(Press),
    Dragging {
        session: DragSession,
        target: Option<DropTarget>,
    },
}

#[derive(Clone, Copy, Debug)]
struct Pointer {
    local: Pos2,
    screen: Pos2,
}

/// Drag/drop state for one pointer device.
#[derive(Debug, Default)]
pub struct DockControlState {
    gesture: Gesture,
    last_session_id: u64,
}

impl DockControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        match self.gesture {
            Gesture::Idle => DragPhase::Idle,
            Gesture::Pressed(_) => DragPhase::Pressed,
            Gesture::Dragging { .. } => DragPhase::Dragging,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.gesture {
            Gesture::Dragging { session, .. } => Some(session),
            _ => None,
        }
    }

    /// The dockable being pressed or dragged.
    pub fn source(&self) -> Option<NodeId> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Pressed(press) => Some(press.source),
            Gesture::Dragging { session, .. } => Some(session.source()),
        }
    }

    /// The drop area currently hovered, if any.
    pub fn current_target(&self) -> Option<NodeId> {
        self.target().map(|t| t.dockable)
    }

    /// The operation the current preview shows, and whether the drop would be accepted.
    pub fn current_operation(&self) -> Option<(DockOperation, bool)> {
        self.target().map(|t| (t.operation, t.valid))
    }

    fn target(&self) -> Option<&DropTarget> {
        match &self.gesture {
            Gesture::Dragging { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Feed one pointer event. Returns true if the event executed a drop.
    pub fn process(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) -> bool {
        match event.kind {
            PointerEventKind::Press => {
                self.on_press(ctx, event);
                false
            }
            PointerEventKind::Move => {
                self.on_move(ctx, event);
                false
            }
            PointerEventKind::Release => self.on_release(ctx, event),
            PointerEventKind::CaptureLost => {
                self.cancel(ctx);
                false
            }
        }
    }

    /// Abandon the gesture from any phase: drop the preview and forget every reference.
    ///
    /// The tree is never touched.
    pub fn cancel(&mut self, ctx: &mut DragContext<'_>) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Pressed(press) => log::trace!("press on {:?} cancelled", press.source),
            Gesture::Dragging {
                mut session,
                target,
            } => {
                if target.is_some() {
                    ctx.adorner.remove_adorner();
                }
                session.cancel();
                ctx.factory
                    .debug_log_event(format!("session CANCEL id={}", session.id()));
            }
        }
    }

    fn on_press(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        if !matches!(self.gesture, Gesture::Idle) {
            log::debug!("press during an active gesture: restarting");
            self.cancel(ctx);
        }
        let Some(surface_id) = event.surface else {
            log::trace!("press without a surface ignored");
            return;
        };
        let Some(surface) = ctx.surfaces.iter().find(|s| s.surface_id() == surface_id) else {
            log::debug!("press on unregistered surface {surface_id:?}");
            return;
        };
        let local = surface.screen_to_local(event.position);
        let hit = match surface.hit_test(local, AreaMarker::DragArea) {
            Ok(hit) => hit,
            Err(err) => {
                log::warn!("drag hit test on {surface_id:?} failed: {err}");
                None
            }
        };
        let Some(hit) = hit else {
            return;
        };
        if !ctx
            .factory
            .tree()
            .get(hit.dockable)
            .is_some_and(|d| d.can_drag)
        {
            log::trace!("{:?} under the press cannot be dragged", hit.dockable);
            return;
        }
        self.gesture = Gesture::Pressed(Press {
            source: hit.dockable,
            surface: surface_id,
            origin: event.position,
            source_size: hit.bounds.size(),
            action: event.drag_action,
        });
    }

    fn on_move(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        if let Gesture::Pressed(press) = self.gesture {
            if !ctx
                .manager
                .options
                .exceeds_drag_threshold(event.position - press.origin)
            {
                return;
            }
            self.start_drag(ctx, press);
        }
        if matches!(self.gesture, Gesture::Dragging { .. }) {
            self.drag_over(ctx, event);
        }
    }

    fn start_drag(&mut self, ctx: &mut DragContext<'_>, press: Press) {
        self.last_session_id = self.last_session_id.saturating_add(1);
        let id = self.last_session_id;
        let session = DragSession::new(
            id,
            press.source,
            press.surface,
            Some(press.source_size),
            press.origin,
            press.action,
        );
        ctx.factory.debug_log_event(format!(
            "session START id={id} source={:?} surface={:?}",
            press.source, press.surface
        ));
        // Floating windows must be up to act as drop targets.
        ctx.factory.present_windows();
        self.gesture = Gesture::Dragging {
            session,
            target: None,
        };
    }

    /// One hover tick: hit-test, then Leave/Enter or Over, validating the candidate once.
    fn drag_over(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        let Gesture::Dragging { session, target } = &mut self.gesture else {
            return;
        };
        session.set_action(event.drag_action);
        let hit = find_drop_target(ctx, session, event);
        session.set_hovered_surface(hit.map(|(surface, ..)| surface));

        let Some((surface, element, local)) = hit else {
            if let Some(left) = target.take() {
                log::trace!("leave {:?}", left.dockable);
                ctx.adorner.remove_adorner();
            }
            return;
        };

        let same = target
            .as_ref()
            .is_some_and(|t| t.surface == surface && t.dockable == element.dockable);
        if !same {
            if let Some(left) = target.take() {
                log::trace!("leave {:?}", left.dockable);
                ctx.adorner.remove_adorner();
            }
            log::trace!("enter {:?}", element.dockable);
            ctx.adorner
                .add_adorner(surface, element.dockable, element.bounds);
        }

        let operation = resolve_operation(ctx, local, element.bounds).unwrap_or_default();
        let pointer = Pointer {
            local,
            screen: event.position,
        };
        let valid = element.drop_enabled
            && validate_drop(
                ctx,
                session,
                element.dockable,
                session.action(),
                operation,
                pointer,
                false,
            );
        ctx.adorner.show_preview(operation, valid);
        *target = Some(DropTarget {
            surface,
            dockable: element.dockable,
            bounds: element.bounds,
            drop_enabled: element.drop_enabled,
            operation,
            valid,
        });
    }

    fn on_release(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) -> bool {
        let (mut session, target) = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => return false,
            Gesture::Pressed(press) => {
                log::trace!("click on {:?}, no drag", press.source);
                return false;
            }
            Gesture::Dragging { session, target } => (session, target),
        };
        session.set_action(event.drag_action);

        let executed = match target {
            Some(t) if t.drop_enabled => {
                let local = ctx
                    .surfaces
                    .iter()
                    .find(|s| s.surface_id() == t.surface)
                    .map(|s| s.screen_to_local(event.position));
                let operation = local
                    .and_then(|local| resolve_operation(ctx, local, t.bounds))
                    .unwrap_or(t.operation);
                let pointer = Pointer {
                    local: local.unwrap_or(t.bounds.center()),
                    screen: event.position,
                };
                session.try_execute()
                    && validate_drop(
                        ctx,
                        &session,
                        t.dockable,
                        session.action(),
                        operation,
                        pointer,
                        true,
                    )
            }
            Some(t) => {
                log::trace!("release over {:?} with drops disabled", t.dockable);
                false
            }
            None if ctx.manager.options.float_on_release_outside => {
                let pointer = Pointer {
                    local: event.position,
                    screen: event.position,
                };
                session.try_execute()
                    && validate_drop(
                        ctx,
                        &session,
                        session.source(),
                        DragAction::Move,
                        DockOperation::Window,
                        pointer,
                        true,
                    )
            }
            None => false,
        };

        if target.is_some() {
            ctx.adorner.remove_adorner();
        }
        ctx.factory.debug_log_event(format!(
            "session END id={} executed={executed}",
            session.id()
        ));
        executed
    }
}

/// Hit-test the surfaces in priority order for a drop area under the pointer.
///
/// A surface whose hit test fails is skipped for this tick.
fn find_drop_target(
    ctx: &DragContext<'_>,
    session: &DragSession,
    event: PointerEvent,
) -> Option<(SurfaceId, HitElement, Pos2)> {
    let ids: Vec<SurfaceId> = ctx.surfaces.iter().map(|s| s.surface_id()).collect();
    for i in session.surface_order(&ids, event.surface) {
        let surface = ctx.surfaces[i];
        let local = surface.screen_to_local(event.position);
        match surface.hit_test(local, AreaMarker::DropArea) {
            Ok(Some(hit)) => return Some((ids[i], hit, local)),
            Ok(None) => {}
            Err(err) => log::warn!("drop hit test on {:?} failed: {err}", ids[i]),
        }
    }
    None
}

fn resolve_operation(ctx: &DragContext<'_>, local: Pos2, bounds: Rect) -> Option<DockOperation> {
    let zones = DockZones::from_options(&ctx.manager.options);
    ctx.adorner.dock_operation(local, bounds, &zones)
}

fn validate_drop(
    ctx: &mut DragContext<'_>,
    session: &DragSession,
    target: NodeId,
    action: DragAction,
    operation: DockOperation,
    pointer: Pointer,
    execute: bool,
) -> bool {
    ctx.manager.position = pointer.local;
    ctx.manager.screen_position = pointer.screen;
    ctx.manager.source_size = session.source_size();
    ctx.manager.validate(
        ctx.factory,
        session.source(),
        target,
        action,
        operation,
        execute,
    )
}
