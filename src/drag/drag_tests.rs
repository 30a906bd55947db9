use egui::{Pos2, Rect, Vec2, pos2, vec2};

use super::{
    AreaMarker, DockAdorner, DockControlState, DockSurface, DragContext, DragPhase, HitElement,
    HitTestError, PointerEvent, SurfaceId,
};
use crate::factory::{DockEvent, Factory};
use crate::manager::DockManager;
use crate::model::{Alignment, DockOperation, Dockable, DragAction, NodeId, Orientation};
use crate::test_support::{
    assert_tree_ok, fingerprint, make, make_in, strict_factory, visible_ids,
};

const SURFACE: SurfaceId = SurfaceId(1);
const OFFSET: Vec2 = Vec2::new(100.0, 100.0);

#[derive(Clone, Copy)]
struct Element {
    dockable: NodeId,
    bounds: Rect,
    drag: bool,
    drop: bool,
}

/// Elements are listed outermost first; the last match wins.
struct FakeSurface {
    id: SurfaceId,
    offset: Vec2,
    elements: Vec<Element>,
    failing: bool,
}

impl DockSurface for FakeSurface {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn hit_test(
        &self,
        local: Pos2,
        marker: AreaMarker,
    ) -> Result<Option<HitElement>, HitTestError> {
        if self.failing {
            return Err(HitTestError::Disposed);
        }
        Ok(self
            .elements
            .iter()
            .rev()
            .filter(|e| match marker {
                AreaMarker::DragArea => e.drag,
                AreaMarker::DropArea => e.drop,
            })
            .find(|e| e.bounds.contains(local))
            .map(|e| HitElement {
                dockable: e.dockable,
                bounds: e.bounds,
                drop_enabled: true,
            }))
    }

    fn screen_to_local(&self, screen: Pos2) -> Pos2 {
        screen - self.offset
    }

    fn local_to_screen(&self, local: Pos2) -> Pos2 {
        local + self.offset
    }
}

#[derive(Default)]
struct RecordingAdorner {
    shown: bool,
    added: usize,
    removed: usize,
    previews: Vec<(DockOperation, bool)>,
}

impl DockAdorner for RecordingAdorner {
    fn add_adorner(&mut self, _surface: SurfaceId, _target: NodeId, _bounds: Rect) {
        assert!(!self.shown, "adorner added twice");
        self.shown = true;
        self.added += 1;
    }

    fn remove_adorner(&mut self) {
        assert!(self.shown, "adorner removed without being added");
        self.shown = false;
        self.removed += 1;
    }

    fn show_preview(&mut self, operation: DockOperation, valid: bool) {
        assert!(self.shown);
        self.previews.push((operation, valid));
    }
}

struct Harness {
    factory: Factory,
    manager: DockManager,
    surfaces: Vec<FakeSurface>,
    adorner: RecordingAdorner,
    state: DockControlState,
    root: NodeId,
    docs: NodeId,
    tools: NodeId,
    a: NodeId,
    b: NodeId,
    x: NodeId,
}

impl Harness {
    /// `docs [a, b]` at local (0,0)-(400,300) and `tools [x]` at (400,0)-(600,300), side by side
    /// in one proportional dock, on a surface whose origin sits at screen (100,100).
    fn new() -> Self {
        let mut f = strict_factory();
        let root = make(&mut f, Dockable::root("root"));
        let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Horizontal));
        let docs = make_in(&mut f, main, Dockable::document_dock("docs"));
        make_in(&mut f, main, Dockable::splitter("s"));
        let tools = make_in(&mut f, main, Dockable::tool_dock("tools", Alignment::Right));
        let a = make_in(&mut f, docs, Dockable::document("a", "A"));
        let b = make_in(&mut f, docs, Dockable::document("b", "B"));
        let x = make_in(&mut f, tools, Dockable::tool("x", "X"));
        f.drain_events();

        let area = |dockable, min: Pos2, max: Pos2, drag| Element {
            dockable,
            bounds: Rect::from_min_max(min, max),
            drag,
            drop: true,
        };
        let elements = vec![
            area(docs, pos2(0.0, 0.0), pos2(400.0, 300.0), false),
            area(tools, pos2(400.0, 0.0), pos2(600.0, 300.0), false),
            area(a, pos2(0.0, 0.0), pos2(60.0, 20.0), true),
            area(b, pos2(60.0, 0.0), pos2(120.0, 20.0), true),
            area(x, pos2(400.0, 0.0), pos2(460.0, 20.0), true),
        ];
        Self {
            manager: DockManager::new(f.options.clone()),
            factory: f,
            surfaces: vec![FakeSurface {
                id: SURFACE,
                offset: OFFSET,
                elements,
                failing: false,
            }],
            adorner: RecordingAdorner::default(),
            state: DockControlState::new(),
            root,
            docs,
            tools,
            a,
            b,
            x,
        }
    }

    fn send(&mut self, event: PointerEvent) -> bool {
        let surfaces: Vec<&dyn DockSurface> = self
            .surfaces
            .iter()
            .map(|s| s as &dyn DockSurface)
            .collect();
        let mut ctx = DragContext {
            factory: &mut self.factory,
            manager: &mut self.manager,
            surfaces: &surfaces,
            adorner: &mut self.adorner,
        };
        self.state.process(&mut ctx, event)
    }

    /// Screen position of a point given in surface coordinates.
    fn at(local: Pos2) -> Pos2 {
        local + OFFSET
    }

    fn press(&mut self, local: Pos2) {
        self.send(PointerEvent::press(SURFACE, Self::at(local)));
    }

    fn move_to(&mut self, local: Pos2) {
        self.send(PointerEvent::moved(Self::at(local)).on_surface(SURFACE));
    }

    fn release_at(&mut self, local: Pos2) -> bool {
        self.send(PointerEvent::release(Self::at(local)).on_surface(SURFACE))
    }

    fn last_preview(&self) -> Option<(DockOperation, bool)> {
        self.adorner.previews.last().copied()
    }
}

const A_TAB: Pos2 = Pos2::new(30.0, 10.0);
const X_TAB: Pos2 = Pos2::new(430.0, 10.0);
const DOCS_CENTER: Pos2 = Pos2::new(200.0, 150.0);
const DOCS_RIGHT_BAND: Pos2 = Pos2::new(350.0, 150.0);
const TOOLS_CENTER: Pos2 = Pos2::new(500.0, 150.0);
const NOWHERE: Pos2 = Pos2::new(800.0, 800.0);

#[test]
fn press_then_small_moves_stay_pressed() {
    let mut h = Harness::new();
    h.press(A_TAB);
    assert_eq!(h.state.phase(), DragPhase::Pressed);
    assert_eq!(h.state.source(), Some(h.a));

    h.move_to(A_TAB + vec2(4.0, -4.0));
    assert_eq!(h.state.phase(), DragPhase::Pressed);
    assert!(h.state.session().is_none());

    h.move_to(A_TAB + vec2(0.0, 4.5));
    assert_eq!(h.state.phase(), DragPhase::Dragging);
    assert_eq!(h.state.session().map(|s| s.id()), Some(1));
}

#[test]
fn presses_off_drag_areas_are_ignored() {
    let mut h = Harness::new();
    h.press(DOCS_CENTER);
    assert_eq!(h.state.phase(), DragPhase::Idle);

    h.send(PointerEvent::press(SurfaceId(42), Harness::at(A_TAB)));
    assert_eq!(h.state.phase(), DragPhase::Idle);

    h.press(A_TAB);
    assert!(!h.release_at(A_TAB));
    assert_eq!(h.state.phase(), DragPhase::Idle);
}

#[test]
fn capture_lost_mid_drag_leaves_tree_untouched() {
    let mut h = Harness::new();
    let before = fingerprint(&h.factory);

    h.press(A_TAB);
    h.move_to(DOCS_CENTER);
    assert_eq!(h.state.current_target(), Some(h.docs));
    assert_eq!(h.adorner.added, 1);

    h.send(PointerEvent::capture_lost());

    assert_eq!(h.state.phase(), DragPhase::Idle);
    assert_eq!(h.state.current_target(), None);
    assert!(!h.adorner.shown);
    assert_eq!(h.adorner.removed, 1);
    assert_eq!(fingerprint(&h.factory), before);
    assert!(h.factory.drain_events().is_empty());

    // A new press starts a clean gesture.
    h.press(pos2(90.0, 10.0));
    assert_eq!(h.state.phase(), DragPhase::Pressed);
    assert_eq!(h.state.source(), Some(h.b));
    h.move_to(DOCS_CENTER);
    assert_eq!(h.state.session().map(|s| s.id()), Some(2));
    assert!(h.state.session().is_some_and(|s| !s.is_executed()));
}

#[test]
fn hover_validates_once_per_tick_and_reuses_the_adorner() {
    let mut h = Harness::new();
    h.press(A_TAB);
    h.move_to(DOCS_CENTER);
    assert_eq!(h.adorner.previews.len(), 1);
    assert_eq!(h.last_preview(), Some((DockOperation::Fill, true)));

    h.move_to(DOCS_CENTER + vec2(5.0, 5.0));
    h.move_to(DOCS_RIGHT_BAND);
    assert_eq!(h.adorner.previews.len(), 3);
    assert_eq!(h.adorner.added, 1);
    assert_eq!(h.last_preview(), Some((DockOperation::Right, true)));

    // Documents are refused by the tool dock.
    h.move_to(TOOLS_CENTER);
    assert_eq!(h.adorner.added, 2);
    assert_eq!(h.adorner.removed, 1);
    assert_eq!(h.state.current_target(), Some(h.tools));
    assert_eq!(h.last_preview(), Some((DockOperation::Fill, false)));

    h.move_to(NOWHERE);
    assert_eq!(h.adorner.previews.len(), 4);
    assert_eq!(h.adorner.removed, 2);
    assert!(!h.adorner.shown);
    assert_eq!(h.state.phase(), DragPhase::Dragging);
}

#[test]
fn release_over_edge_band_executes_exactly_once() {
    let mut h = Harness::new();
    h.press(A_TAB);
    h.move_to(DOCS_RIGHT_BAND);
    assert!(h.release_at(DOCS_RIGHT_BAND));
    assert_eq!(h.state.phase(), DragPhase::Idle);
    assert!(!h.adorner.shown);

    let after = fingerprint(&h.factory);
    assert!(!h.release_at(DOCS_RIGHT_BAND));
    assert_eq!(fingerprint(&h.factory), after);

    assert_eq!(visible_ids(&h.factory, h.docs), ["b"]);
    let new_owner = h.factory.tree().owner_of(h.a).expect("docked");
    assert_ne!(new_owner, h.docs);
    let splits = h
        .factory
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, DockEvent::Split { .. }))
        .count();
    assert_eq!(splits, 1);
    assert!(h.factory.debug_log_text().contains("session END id=1 executed=true"));
    assert_tree_ok(h.factory.tree());
}

#[test]
fn release_resolves_the_zone_at_the_release_point() {
    let mut h = Harness::new();
    h.press(pos2(90.0, 10.0));
    h.move_to(DOCS_RIGHT_BAND);
    assert!(h.release_at(pos2(2.0, 150.0)));

    // The margin ring floats.
    let window = h.factory.tree().window_of(h.b).expect("floating");
    let rect = h.factory.tree().window(window).expect("window").rect;
    assert_eq!(rect.min, Harness::at(pos2(2.0, 150.0)));
    assert_eq!(rect.size(), h.manager.options.minimum_window_size);
    assert_eq!(visible_ids(&h.factory, h.docs), ["a"]);
    assert_tree_ok(h.factory.tree());
}

#[test]
fn hit_test_failures_mean_no_target_for_that_tick() {
    let mut h = Harness::new();
    h.press(A_TAB);
    h.move_to(DOCS_CENTER);
    assert_eq!(h.state.current_target(), Some(h.docs));

    h.surfaces[0].failing = true;
    h.move_to(DOCS_CENTER + vec2(1.0, 0.0));
    assert_eq!(h.state.phase(), DragPhase::Dragging);
    assert_eq!(h.state.current_target(), None);
    assert!(!h.adorner.shown);

    h.surfaces[0].failing = false;
    h.move_to(DOCS_CENTER);
    assert_eq!(h.state.current_target(), Some(h.docs));
    assert!(h.adorner.shown);
}

#[test]
fn press_during_a_drag_restarts_the_gesture() {
    let mut h = Harness::new();
    h.press(A_TAB);
    h.move_to(DOCS_CENTER);
    assert!(h.adorner.shown);

    h.press(X_TAB);
    assert!(!h.adorner.shown);
    assert_eq!(h.state.phase(), DragPhase::Pressed);
    assert_eq!(h.state.source(), Some(h.x));

    h.move_to(TOOLS_CENTER);
    assert_eq!(h.state.session().map(|s| s.source()), Some(h.x));
    assert_eq!(h.state.session().map(|s| s.id()), Some(2));
}

#[test]
fn release_outside_targets_floats_only_when_enabled() {
    let mut h = Harness::new();
    let before = fingerprint(&h.factory);
    h.press(X_TAB);
    h.move_to(NOWHERE);
    assert!(!h.release_at(NOWHERE));
    assert_eq!(fingerprint(&h.factory), before);

    h.manager.options.float_on_release_outside = true;
    h.press(X_TAB);
    h.move_to(NOWHERE);
    assert!(h.release_at(NOWHERE));

    let window = h.factory.tree().window_of(h.x).expect("floating");
    let w = h.factory.tree().window(window).expect("window");
    assert_eq!(w.rect.min, Harness::at(NOWHERE));
    assert_eq!(w.owner_root(), h.root);
    assert!(!h.factory.tree().contains(h.tools));
    assert_tree_ok(h.factory.tree());
}

#[test]
fn modifier_action_reaches_the_manager() {
    let mut h = Harness::new();
    h.press(A_TAB);
    h.send(PointerEvent::moved(Harness::at(DOCS_CENTER)).with_action(DragAction::Copy));
    assert_eq!(h.last_preview(), Some((DockOperation::Fill, false)));

    h.send(PointerEvent::moved(Harness::at(pos2(90.0, 10.0))).with_action(DragAction::Link));
    assert_eq!(h.state.current_target(), Some(h.b));
    assert_eq!(h.last_preview(), Some((DockOperation::Fill, true)));
    assert!(h.send(PointerEvent::release(Harness::at(pos2(90.0, 10.0))).with_action(DragAction::Link)));
    assert_eq!(visible_ids(&h.factory, h.docs), ["b", "a"]);
}
