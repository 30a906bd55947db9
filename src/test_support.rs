use std::cell::RefCell;
use std::rc::Rc;

use egui::{Pos2, Vec2};

use crate::factory::Factory;
use crate::model::{DockTree, Dockable, NodeId, WindowHost};
use crate::options::DockOptions;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn assert_tree_ok(tree: &DockTree) {
    let issues = tree.integrity_issues();
    assert!(
        issues.is_empty(),
        "tree integrity failed:\n{}",
        issues.join("\n")
    );
}

/// No container laid out with splitters starts or ends with one, or lists two in a row.
pub(crate) fn assert_splitters_separate(tree: &DockTree) {
    for (id, dockable) in tree.dockables() {
        let Some(dock) = dockable.as_dock() else {
            continue;
        };
        if !dock.arrangement.uses_splitters() {
            continue;
        }
        let splitter: Vec<bool> = dock
            .visible()
            .iter()
            .map(|&c| tree.get(c).is_some_and(Dockable::is_splitter))
            .collect();
        assert!(
            splitter.first() != Some(&true) && splitter.last() != Some(&true),
            "{id:?} ({}) has an outer splitter: {splitter:?}",
            dockable.id
        );
        assert!(
            !splitter.windows(2).any(|pair| pair[0] && pair[1]),
            "{id:?} ({}) has doubled splitters: {splitter:?}",
            dockable.id
        );
    }
}

pub(crate) fn strict_factory() -> Factory {
    init_logging();
    let options = DockOptions {
        debug_integrity: true,
        debug_integrity_panic: true,
        debug_event_log: true,
        ..Default::default()
    };
    Factory::new_with_options(options)
}

pub(crate) fn make(f: &mut Factory, dockable: Dockable) -> NodeId {
    f.create(dockable).expect("unique id")
}

pub(crate) fn make_in(f: &mut Factory, dock: NodeId, dockable: Dockable) -> NodeId {
    let id = make(f, dockable);
    assert!(f.add_dockable(dock, id));
    id
}

pub(crate) fn visible_ids(f: &Factory, dock: NodeId) -> Vec<String> {
    f.tree()
        .visible_of(dock)
        .iter()
        .map(|&id| f.tree().get(id).expect("listed child exists").id.clone())
        .collect()
}

/// Owner, children and active child of every dockable, for before/after comparisons.
pub(crate) type Fingerprint = Vec<(NodeId, Option<NodeId>, Vec<NodeId>, Option<NodeId>)>;

pub(crate) fn fingerprint(f: &Factory) -> Fingerprint {
    f.tree()
        .dockables()
        .map(|(id, d)| {
            let dock = d.as_dock();
            (
                id,
                d.owner(),
                dock.map(|d| d.visible().to_vec()).unwrap_or_default(),
                dock.and_then(|d| d.active()),
            )
        })
        .collect()
}

#[derive(Clone)]
pub(crate) struct Rng(u64);

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed ^ 0xD0C3_D0C3_D0C3_D0C3)
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        // Simple LCG: deterministic, fast, no dependency.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005u64)
            .wrapping_add(1442695040888963407u64);
        self.0
    }

    pub(crate) fn next_usize(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() as usize) % upper
    }

    pub(crate) fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) != 0
    }

    pub(crate) fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.next_usize(items.len())])
    }
}

/// What a [`RecordingHost`] saw.
#[derive(Debug, Default)]
pub(crate) struct HostRecord {
    pub(crate) presented: usize,
    pub(crate) exited: bool,
    pub(crate) position: Pos2,
    pub(crate) size: Vec2,
    pub(crate) title: String,
    pub(crate) layout: Option<NodeId>,
}

pub(crate) struct RecordingHost(pub(crate) Rc<RefCell<HostRecord>>);

impl WindowHost for RecordingHost {
    fn present(&mut self, _is_dialog: bool) {
        self.0.borrow_mut().presented += 1;
    }

    fn exit(&mut self) {
        self.0.borrow_mut().exited = true;
    }

    fn set_position(&mut self, position: Pos2) {
        self.0.borrow_mut().position = position;
    }

    fn position(&self) -> Pos2 {
        self.0.borrow().position
    }

    fn set_size(&mut self, size: Vec2) {
        self.0.borrow_mut().size = size;
    }

    fn size(&self) -> Vec2 {
        self.0.borrow().size
    }

    fn set_title(&mut self, title: &str) {
        self.0.borrow_mut().title = title.to_owned();
    }

    fn set_layout(&mut self, layout: NodeId) {
        self.0.borrow_mut().layout = Some(layout);
    }
}
