use egui::{pos2, vec2};

use super::DockManager;
use crate::factory::Factory;
use crate::model::{Alignment, Arrangement, DockOperation, Dockable, DragAction, NodeId, Orientation};
use crate::test_support::{
    Rng, assert_tree_ok, fingerprint, make, make_in, strict_factory, visible_ids,
};

fn arrangement_of(f: &Factory, id: NodeId) -> Option<&Arrangement> {
    f.tree().dock(id).map(|d| &d.arrangement)
}

const ACTIONS: [DragAction; 3] = [DragAction::Move, DragAction::Copy, DragAction::Link];
const OPERATIONS: [DockOperation; 6] = [
    DockOperation::Fill,
    DockOperation::Left,
    DockOperation::Right,
    DockOperation::Top,
    DockOperation::Bottom,
    DockOperation::Window,
];

#[test]
fn validate_without_execute_never_mutates() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Horizontal));
    let tools = make_in(&mut f, main, Dockable::tool_dock("tools", Alignment::Left));
    make_in(&mut f, main, Dockable::splitter("s"));
    let docs = make_in(&mut f, main, Dockable::document_dock("docs"));
    for id in ["x", "y"] {
        make_in(&mut f, tools, Dockable::tool(id, id));
    }
    for id in ["a", "b", "c"] {
        make_in(&mut f, docs, Dockable::document(id, id));
    }
    let y = f.tree().find("y").expect("y");
    assert!(f.pin_dockable(y));
    f.drain_events();

    let before = fingerprint(&f);
    let ids: Vec<NodeId> = f.tree().dockables().map(|(id, _)| id).collect();
    let manager = DockManager::default();
    let mut rng = Rng::new(7);
    let mut accepted = 0;
    for _ in 0..500 {
        let (Some(source), Some(target)) = (rng.pick(&ids), rng.pick(&ids)) else {
            continue;
        };
        let action = rng.pick(&ACTIONS).unwrap_or_default();
        let operation = rng.pick(&OPERATIONS).unwrap_or_default();
        if manager.validate(&mut f, source, target, action, operation, false) {
            accepted += 1;
        }
    }

    assert!(accepted > 0);
    assert_eq!(fingerprint(&f), before);
    assert!(f.drain_events().is_empty());
    assert!(f.tree().windows().next().is_none());
}

#[test]
fn edge_drop_of_floating_tool_splits_target() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let d = make_in(&mut f, root, Dockable::document_dock("D"));
    make_in(&mut f, d, Dockable::document("a", "A"));
    let x = make(&mut f, Dockable::tool("X", "X"));
    let tools = make_in(&mut f, root, Dockable::tool_dock("tools", Alignment::Left));
    assert!(f.add_dockable(tools, x));
    let window = f
        .float_dockable(x, egui::Rect::from_min_size(pos2(0.0, 0.0), vec2(300.0, 200.0)))
        .expect("floated");
    assert_eq!(visible_ids(&f, root), ["D"]);

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, x, d, DragAction::Move, DockOperation::Left, false));
    assert!(manager.validate(&mut f, x, d, DragAction::Move, DockOperation::Left, true));

    let [wrapper] = f.tree().visible_of(root) else {
        panic!("root should hold a single split");
    };
    let wrapper = *wrapper;
    assert!(matches!(
        arrangement_of(&f, wrapper),
        Some(Arrangement::Proportional(p)) if p.orientation == Orientation::Horizontal && p.auto_created
    ));
    let children = f.tree().visible_of(wrapper).to_vec();
    assert_eq!(children.len(), 3);
    assert_eq!(children[2], d);
    assert!(f.tree().get(children[1]).is_some_and(|s| s.is_splitter()));
    let new_tools = children[0];
    assert!(matches!(
        arrangement_of(&f, new_tools),
        Some(Arrangement::Tool(t)) if t.alignment == Alignment::Left
    ));
    assert_eq!(f.tree().visible_of(new_tools), &[x]);
    for id in [new_tools, d] {
        let p = f.tree().get(id).and_then(|d| d.proportion).expect("proportion");
        assert!((p - 0.5).abs() < 1e-6);
    }
    assert!(f.tree().window(window).is_none());
    assert_eq!(f.tree().root_of(x), Some(root));
    assert_tree_ok(f.tree());
}

#[test]
fn window_drop_floats_at_screen_position_with_minimum_size() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let docs = make_in(&mut f, root, Dockable::document_dock("docs"));
    let a = make_in(&mut f, docs, Dockable::document("a", "A"));
    make_in(&mut f, docs, Dockable::document("b", "B"));

    let manager = DockManager {
        screen_position: pos2(300.0, 200.0),
        source_size: Some(vec2(50.0, 20.0)),
        ..Default::default()
    };
    assert!(manager.validate(&mut f, a, a, DragAction::Move, DockOperation::Window, true));

    let window = f.tree().window_of(a).expect("floating");
    let rect = f.tree().window(window).expect("window").rect;
    assert_eq!(rect.min, pos2(300.0, 200.0));
    assert_eq!(rect.size(), vec2(200.0, 120.0));
    assert_eq!(visible_ids(&f, docs), ["b"]);
    assert_tree_ok(f.tree());
}

#[test]
fn copy_is_never_accepted() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let docs = make_in(&mut f, root, Dockable::document_dock("docs"));
    let a = make_in(&mut f, docs, Dockable::document("a", "A"));
    let b = make_in(&mut f, docs, Dockable::document("b", "B"));

    let manager = DockManager::default();
    for operation in OPERATIONS {
        assert!(!manager.validate(&mut f, a, b, DragAction::Copy, operation, false));
        assert!(!manager.validate(&mut f, a, b, DragAction::Copy, operation, true));
    }
    assert_eq!(visible_ids(&f, docs), ["a", "b"]);
    assert!(f.debug_log_text().contains("copy"));
}

#[test]
fn fill_on_sibling_tab_reorders() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let docs = make_in(&mut f, root, Dockable::document_dock("docs"));
    let [a, _b, c] = ["A", "B", "C"].map(|id| make_in(&mut f, docs, Dockable::document(id, id)));

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, a, c, DragAction::Move, DockOperation::Fill, true));
    assert_eq!(visible_ids(&f, docs), ["B", "C", "A"]);
    assert_eq!(f.tree().dock(docs).and_then(|d| d.active()), Some(a));
    assert_eq!(f.tree().dock(root).and_then(|d| d.focused()), Some(a));
    assert_tree_ok(f.tree());
}

#[test]
fn fill_on_container_moves_and_collapses_source() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Horizontal));
    let t1 = make_in(&mut f, main, Dockable::tool_dock("t1", Alignment::Left));
    make_in(&mut f, main, Dockable::splitter("s"));
    let t2 = make_in(&mut f, main, Dockable::tool_dock("t2", Alignment::Right));
    let x = make_in(&mut f, t1, Dockable::tool("x", "X"));

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, x, t2, DragAction::Move, DockOperation::Fill, true));

    assert_eq!(visible_ids(&f, t2), ["x"]);
    assert!(!f.tree().contains(t1));
    assert_eq!(visible_ids(&f, main), ["t2"]);
    assert_tree_ok(f.tree());
}

#[test]
fn fill_with_dock_source_merges_its_tabs() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Vertical));
    let t1 = make_in(&mut f, main, Dockable::tool_dock("t1", Alignment::Top));
    make_in(&mut f, main, Dockable::splitter("s"));
    let t2 = make_in(&mut f, main, Dockable::tool_dock("t2", Alignment::Bottom));
    for id in ["x", "y"] {
        make_in(&mut f, t1, Dockable::tool(id, id));
    }
    let z = make_in(&mut f, t2, Dockable::tool("z", "z"));

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, t1, z, DragAction::Move, DockOperation::Fill, true));

    assert_eq!(visible_ids(&f, t2), ["z", "x", "y"]);
    assert!(!f.tree().contains(t1));
    assert_tree_ok(f.tree());
}

#[test]
fn link_swaps_across_containers() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Horizontal));
    let left = make_in(&mut f, main, Dockable::document_dock("left"));
    make_in(&mut f, main, Dockable::splitter("s"));
    let right = make_in(&mut f, main, Dockable::document_dock("right"));
    let a = make_in(&mut f, left, Dockable::document("a", "A"));
    make_in(&mut f, left, Dockable::document("b", "B"));
    let c = make_in(&mut f, right, Dockable::document("c", "C"));

    let manager = DockManager::default();
    assert!(!manager.validate(&mut f, a, c, DragAction::Link, DockOperation::Left, false));
    assert!(manager.validate(&mut f, a, c, DragAction::Link, DockOperation::Fill, true));
    assert_eq!(visible_ids(&f, left), ["c", "b"]);
    assert_eq!(visible_ids(&f, right), ["a"]);
    assert_tree_ok(f.tree());
}

#[test]
fn illegal_drops_are_refused() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let main = make_in(&mut f, root, Dockable::proportional("main", Orientation::Horizontal));
    let tools = make_in(&mut f, main, Dockable::tool_dock("tools", Alignment::Left));
    let splitter = make_in(&mut f, main, Dockable::splitter("s"));
    let docs = make_in(&mut f, main, Dockable::document_dock("docs"));
    let x = make_in(&mut f, tools, Dockable::tool("x", "X"));
    let a = make_in(&mut f, docs, Dockable::document("a", "A"));
    let mut locked = Dockable::document("locked", "Locked");
    locked.can_drag = false;
    let locked = make_in(&mut f, docs, locked);
    let mut sealed = Dockable::document_dock("sealed");
    sealed.can_drop = false;
    let sealed = make(&mut f, sealed);

    let manager = DockManager::default();
    let mut check = |source, target, operation| {
        manager.validate(&mut f, source, target, DragAction::Move, operation, false)
    };
    // Wrong leaf kind for the container.
    assert!(!check(x, docs, DockOperation::Fill));
    assert!(!check(x, a, DockOperation::Fill));
    // Roots, splitters and locked leaves never drag.
    assert!(!check(root, docs, DockOperation::Left));
    assert!(!check(splitter, docs, DockOperation::Fill));
    assert!(!check(locked, a, DockOperation::Fill));
    // Self and descendant targets.
    assert!(!check(a, a, DockOperation::Fill));
    assert!(!check(docs, a, DockOperation::Left));
    assert!(!check(docs, a, DockOperation::Fill));
    // Target refuses drops.
    assert!(!check(a, sealed, DockOperation::Fill));
    // Splitting a dock with its own last tab.
    assert!(!check(x, tools, DockOperation::Right));
    // Splitters are no Fill target.
    assert!(!check(a, splitter, DockOperation::Fill));

    // A self target is fine for floating, and a second tab may split its own dock.
    assert!(check(a, a, DockOperation::Window));
    assert!(check(a, docs, DockOperation::Bottom));
    assert!(check(x, docs, DockOperation::Left));
    assert_tree_ok(f.tree());
}

#[test]
fn edge_drop_on_a_tab_splits_its_owner() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let docs = make_in(&mut f, root, Dockable::document_dock("docs"));
    let a = make_in(&mut f, docs, Dockable::document("a", "A"));
    let b = make_in(&mut f, docs, Dockable::document("b", "B"));

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, a, b, DragAction::Move, DockOperation::Right, true));

    let wrapper = f.tree().visible_of(root)[0];
    let children = f.tree().visible_of(wrapper).to_vec();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], docs);
    assert_eq!(visible_ids(&f, docs), ["b"]);
    assert!(matches!(
        arrangement_of(&f, children[2]),
        Some(Arrangement::Document(_))
    ));
    assert_eq!(f.tree().visible_of(children[2]), &[a]);
    assert_eq!(f.tree().dock(root).and_then(|d| d.focused()), Some(a));
    assert_tree_ok(f.tree());
}

#[test]
fn fill_on_overlay_opens_a_panel_at_the_pointer() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let overlay = make_in(&mut f, root, Dockable::overlay("overlay"));
    let tools = make_in(&mut f, root, Dockable::tool_dock("tools", Alignment::Right));
    let x = make_in(&mut f, tools, Dockable::tool("x", "X"));

    let manager = DockManager {
        position: pos2(30.0, 40.0),
        ..Default::default()
    };
    assert!(manager.validate(&mut f, x, overlay, DragAction::Move, DockOperation::Fill, true));

    let panel = f.tree().owner_of(x).expect("in a panel");
    assert_eq!(f.tree().owner_of(panel), Some(overlay));
    match arrangement_of(&f, panel) {
        Some(Arrangement::OverlayPanel(p)) => {
            assert_eq!(p.rect.min, pos2(30.0, 40.0));
            assert_eq!(p.rect.size(), manager.options.default_window_size);
        }
        other => panic!("expected an overlay panel, got {other:?}"),
    }
    assert!(!f.tree().contains(tools));
    assert_tree_ok(f.tree());
}

#[test]
fn unattached_leaf_can_be_dropped_from_a_palette() {
    let mut f = strict_factory();
    let root = make(&mut f, Dockable::root("root"));
    let tools = make_in(&mut f, root, Dockable::tool_dock("tools", Alignment::Left));
    let x = make_in(&mut f, tools, Dockable::tool("x", "X"));
    make_in(&mut f, tools, Dockable::tool("y", "Y"));
    let fresh = make(&mut f, Dockable::tool("fresh", "Fresh"));

    let manager = DockManager::default();
    assert!(manager.validate(&mut f, fresh, x, DragAction::Move, DockOperation::Fill, true));
    assert_eq!(visible_ids(&f, tools), ["x", "fresh", "y"]);
    assert_eq!(f.tree().dock(tools).and_then(|d| d.active()), Some(fresh));
    assert_tree_ok(f.tree());
}
