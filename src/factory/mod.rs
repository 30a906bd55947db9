//! The structural factory: the only component that mutates the dock tree.
//!
//! Every public operation is fail-soft. Invalid requests (unknown ids, moving a dock into
//! itself, indices out of range, ...) are refused with a `debug!` log line and a `false`/`None`
//! return; they never panic.

use itertools::Itertools as _;

use crate::debug::DebugLog;
use crate::model::{
    Alignment, Arrangement, Dock, DockTree, Dockable, DockableKind, HostWindowLocator, NodeId,
    WindowId, integrity,
};
use crate::options::DockOptions;

mod events;
mod movement;
mod overlay;
mod pin;
mod split;
mod window;


pub use events::DockEvent;

/// Owns the [`DockTree`] and performs every structural mutation on it.
pub struct Factory {
    pub options: DockOptions,
    tree: DockTree,
    host_locator: Option<HostWindowLocator>,
    events: Vec<DockEvent>,
    debug_log: DebugLog,
    last_integrity_hash: u64,
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("options", &self.options)
            .field("tree", &self.tree)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

impl Factory {
    pub fn new() -> Self {
        Self::new_with_options(DockOptions::default())
    }

    pub fn new_with_options(options: DockOptions) -> Self {
        Self::from_tree(DockTree::default(), options)
    }

    pub(crate) fn from_tree(tree: DockTree, options: DockOptions) -> Self {
        Self {
            options,
            tree,
            host_locator: None,
            events: Vec::new(),
            debug_log: DebugLog::default(),
            last_integrity_hash: 0,
        }
    }

    pub fn tree(&self) -> &DockTree {
        &self.tree
    }

    /// Install the collaborator that creates platform windows for floated dockables.
    pub fn set_host_window_locator(&mut self, locator: HostWindowLocator) {
        self.host_locator = Some(locator);
    }

    /// Take every tree-change notification queued since the last call.
    pub fn drain_events(&mut self) -> Vec<DockEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn debug_log_text(&self) -> String {
        self.debug_log.text()
    }

    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }

    pub(crate) fn debug_log_event(&mut self, message: impl Into<String>) {
        if !self.options.debug_event_log {
            return;
        }
        self.debug_log
            .push(self.options.debug_event_log_capacity, message.into());
    }

    fn emit(&mut self, event: DockEvent) {
        self.events.push(event);
    }

    fn refused(op: &'static str, reason: impl std::fmt::Display) -> bool {
        log::debug!("{op} refused: {reason}");
        false
    }

    // ------------------------------------------------------------------------
    // Creation

    /// Put a new, unattached dockable into the arena.
    ///
    /// Returns `None` if its string id is already taken, or if it is a dock that already lists
    /// members (children, pins, hidden tools, windows). The first root created becomes the
    /// main root.
    pub fn create(&mut self, mut dockable: Dockable) -> Option<NodeId> {
        if let Some(dock) = dockable.as_dock() {
            let populated = !dock.visible.is_empty()
                || dock.root().is_some_and(|root| {
                    root.pinned.iter().any(|(_, pin)| pin.is_some())
                        || !root.hidden.is_empty()
                        || !root.windows.is_empty()
                        || root.window.is_some()
                });
            if populated {
                Self::refused(
                    "create",
                    format_args!("dock {:?} already has members", dockable.id),
                );
                return None;
            }
        }
        dockable.owner = None;
        dockable.origin = None;
        dockable.is_active = false;
        if let Some(dock) = dockable.as_dock_mut() {
            dock.active = None;
            dock.focused = None;
            if let Some(root) = dock.root_mut() {
                root.default_dockable = None;
            }
        }
        let is_root = dockable.is_root();
        let id = self.tree.insert(dockable)?;
        if is_root && self.tree.main_root.is_none() {
            self.tree.main_root = Some(id);
        }
        Some(id)
    }

    /// Create a dockable whose string id is generated from `prefix`.
    pub(crate) fn create_generated(
        &mut self,
        prefix: &str,
        make: impl FnOnce(String) -> Dockable,
    ) -> Option<NodeId> {
        let id = self.tree.unique_id(prefix);
        self.create(make(id))
    }

    pub fn set_main_root(&mut self, root: NodeId) -> bool {
        let ok = self.tree.get(root).is_some_and(|d| d.is_root() && d.owner.is_none());
        if !ok {
            return Self::refused("set_main_root", format_args!("{root:?} is not a free root"));
        }
        self.tree.main_root = Some(root);
        true
    }

    /// Create a new document inside a document dock that allows it, and activate it.
    pub fn create_document_in(&mut self, dock: NodeId) -> Option<NodeId> {
        let serial = match &mut self.tree.dock_mut(dock)?.arrangement {
            Arrangement::Document(document) if document.can_create_document => {
                document.next_document_serial = document.next_document_serial.saturating_add(1);
                document.next_document_serial
            }
            _ => {
                Self::refused(
                    "create_document_in",
                    format_args!("{dock:?} does not create documents"),
                );
                return None;
            }
        };

        let mut id = format!("Document{serial}");
        if self.tree.find(&id).is_some() {
            id = self.tree.unique_id("Document");
        }
        let title = format!("Document {serial}");
        let document = self.create(Dockable::document(id, title))?;
        if !self.add_dockable(dock, document) {
            self.tree.delete(document);
            return None;
        }
        self.activate(document);
        Some(document)
    }

    // ------------------------------------------------------------------------
    // Attach / detach primitives

    fn can_attach(&self, dock: NodeId, dockable: NodeId) -> bool {
        let Some(target) = self.tree.dock(dock) else {
            return Self::refused("attach", format_args!("{dock:?} is not a dock"));
        };
        let Some(child) = self.tree.get(dockable) else {
            return Self::refused("attach", format_args!("{dockable:?} does not exist"));
        };
        if let Some(owner) = child.owner {
            return Self::refused(
                "attach",
                format_args!("{dockable:?} is still owned by {owner:?}"),
            );
        }
        if dock == dockable || self.tree.is_descendant(dock, dockable) {
            return Self::refused(
                "attach",
                format_args!("{dock:?} lies inside {dockable:?}"),
            );
        }
        if child.is_root() {
            return Self::refused("attach", format_args!("{dockable:?} is a root"));
        }
        if matches!(target.arrangement, Arrangement::Pin(_)) && (!child.can_pin || child.is_dock())
        {
            return Self::refused(
                "attach",
                format_args!("{dockable:?} cannot be pinned"),
            );
        }
        true
    }

    /// Insert without validation. Returns the index used.
    fn attach(&mut self, dock: NodeId, index: Option<usize>, child: NodeId) -> usize {
        let is_splitter = self.tree.get(child).is_some_and(Dockable::is_splitter);
        let Some(d) = self.tree.dock_mut(dock) else {
            return 0;
        };
        let at = index.unwrap_or(d.visible.len()).min(d.visible.len());
        d.visible.insert(at, child);
        let auto_activate =
            d.active.is_none() && !is_splitter && !matches!(d.arrangement, Arrangement::Pin(_));
        if let Some(c) = self.tree.get_mut(child) {
            c.owner = Some(dock);
        }
        if auto_activate {
            self.set_active_internal(dock, Some(child));
        }
        at
    }

    /// Remove `child` from whichever collection of its owner lists it.
    ///
    /// Returns the owner and, for visible membership, the index it had.
    fn detach(&mut self, child: NodeId) -> Option<(NodeId, Option<usize>)> {
        let owner = self.tree.owner_of(child)?;
        let chain = self.tree.ancestors(child);
        let doomed = self.tree.subtree(child);

        let Some(dock) = self.tree.dock_mut(owner) else {
            log::debug!("detach: owner {owner:?} of {child:?} is not a dock");
            if let Some(c) = self.tree.get_mut(child) {
                c.owner = None;
            }
            return None;
        };
        let index = dock.index_of(child);
        if let Some(i) = index {
            dock.visible.remove(i);
        } else if let Some(root) = dock.root_mut() {
            root.hidden.retain(|&h| h != child);
            for edge in Alignment::EDGES {
                if *root.pinned.get(edge) == Some(child) {
                    *root.pinned.get_mut(edge) = None;
                }
            }
        } else {
            log::debug!("detach: {child:?} claims owner {owner:?} which does not list it");
        }

        if let Some(c) = self.tree.get_mut(child) {
            c.owner = None;
        }
        if let Some(i) = index {
            self.repair_active_after_removal(owner, child, i);
        }
        self.clear_focus_references(&chain, &doomed);
        Some((owner, index))
    }

    fn repair_active_after_removal(&mut self, owner: NodeId, removed: NodeId, index: usize) {
        let Some(dock) = self.tree.dock(owner) else {
            return;
        };
        if dock.active != Some(removed) {
            return;
        }
        let index = index.min(dock.visible.len());
        let next = dock.visible[..index]
            .iter()
            .rev()
            .chain(dock.visible[index..].iter())
            .copied()
            .find(|&c| self.tree.get(c).is_some_and(|d| !d.is_splitter()));
        self.set_active_internal(owner, next);
    }

    fn clear_focus_references(&mut self, chain: &[NodeId], doomed: &[NodeId]) {
        for &dock_id in chain {
            let focused = self.tree.dock(dock_id).and_then(|d| d.focused);
            let Some(focused) = focused.filter(|f| doomed.contains(f)) else {
                continue;
            };
            if let Some(dock) = self.tree.dock_mut(dock_id) {
                dock.focused = None;
            }
            if let Some(leaf) = self.tree.get_mut(focused) {
                leaf.is_active = false;
            }
            let is_root = self.tree.get(dock_id).is_some_and(Dockable::is_root);
            if is_root && !self.focus_default(dock_id, doomed) {
                self.emit(DockEvent::FocusChanged {
                    root: dock_id,
                    focused: None,
                });
            }
        }
    }

    /// Hand the focus of `root` to its default dockable, if that is still a visible leaf
    /// below it and not part of `doomed`.
    fn focus_default(&mut self, root: NodeId, doomed: &[NodeId]) -> bool {
        let Some(default) = self
            .tree
            .dock(root)
            .and_then(Dock::root)
            .and_then(|r| r.default_dockable)
        else {
            return false;
        };
        let usable = !doomed.contains(&default)
            && self.tree.get(default).is_some_and(|d| d.leaf_kind().is_some())
            && self.tree.index_of(default).is_some()
            && self.tree.root_of(default) == Some(root);
        match self.tree.owner_of(default) {
            Some(owner) if usable => self.set_focused_dockable(owner, Some(default)),
            _ => false,
        }
    }

    /// Swap `old` for `new` in `owner`'s visible collection, carrying the active pointer.
    fn replace_child(&mut self, owner: NodeId, old: NodeId, new: NodeId) -> bool {
        let Some(dock) = self.tree.dock_mut(owner) else {
            return false;
        };
        let Some(i) = dock.index_of(old) else {
            return false;
        };
        dock.visible[i] = new;
        if dock.active == Some(old) {
            dock.active = Some(new);
        }
        if let Some(o) = self.tree.get_mut(old) {
            o.owner = None;
        }
        if let Some(n) = self.tree.get_mut(new) {
            n.owner = Some(owner);
        }
        true
    }

    /// Point focus records of `dock` and its ancestors at `new` where they named `old`.
    fn retarget_focus(&mut self, dock: NodeId, old: NodeId, new: NodeId) {
        let mut chain = vec![dock];
        chain.extend(self.tree.ancestors(dock));
        for id in chain {
            if let Some(d) = self.tree.dock_mut(id) {
                if d.focused == Some(old) {
                    d.focused = Some(new);
                }
            }
        }
    }

    fn set_active_internal(&mut self, dock: NodeId, active: Option<NodeId>) {
        let Some(d) = self.tree.dock_mut(dock) else {
            return;
        };
        if d.active == active {
            return;
        }
        d.active = active;
        // A pin strip shows its overlay exactly while it has an active dockable.
        if let Arrangement::Pin(pin) = &mut d.arrangement {
            pin.is_expanded = active.is_some();
        }
        self.emit(DockEvent::ActiveChanged { dock, active });
    }

    // ------------------------------------------------------------------------
    // Add / remove

    /// Append `dockable` to `dock`'s visible collection.
    pub fn add_dockable(&mut self, dock: NodeId, dockable: NodeId) -> bool {
        self.insert_dockable_at(dock, None, dockable)
    }

    /// Insert `dockable` at `index` (clamped) in `dock`'s visible collection.
    pub fn insert_dockable(&mut self, dock: NodeId, index: usize, dockable: NodeId) -> bool {
        self.insert_dockable_at(dock, Some(index), dockable)
    }

    fn insert_dockable_at(&mut self, dock: NodeId, index: Option<usize>, dockable: NodeId) -> bool {
        if !self.can_attach(dock, dockable) {
            return false;
        }
        self.attach(dock, index, dockable);
        self.emit(DockEvent::Added {
            dockable,
            owner: dock,
        });
        self.after_mutation("add_dockable");
        true
    }

    /// Remove the child at `index` of `dock`, collapsing emptied containers.
    pub fn remove_dockable_at(&mut self, dock: NodeId, index: usize) -> Option<NodeId> {
        let child = self.tree.dock(dock)?.visible.get(index).copied()?;
        self.remove_dockable(child, true).then_some(child)
    }

    /// Detach `dockable` from its owner. It stays in the arena, unattached.
    pub fn remove_dockable(&mut self, dockable: NodeId, collapse: bool) -> bool {
        let Some((owner, _)) = self.detach(dockable) else {
            return Self::refused(
                "remove_dockable",
                format_args!("{dockable:?} is not attached"),
            );
        };
        if let Some(d) = self.tree.get_mut(dockable) {
            d.origin = None;
        }
        self.emit(DockEvent::Removed { dockable, owner });
        if collapse {
            self.collapse(owner);
        }
        self.after_mutation("remove_dockable");
        true
    }

    // ------------------------------------------------------------------------
    // Collapse

    /// Tidy `dock` after it lost a child: drop stray splitters, remove it if it ran empty,
    /// flatten a split wrapper left with one child.
    pub(crate) fn collapse(&mut self, dock_id: NodeId) {
        let uses_splitters = match self.tree.dock(dock_id) {
            Some(dock) => dock.arrangement.uses_splitters(),
            None => return,
        };
        if uses_splitters {
            self.clean_splitters(dock_id);
        }

        let Some(dock) = self.tree.dock(dock_id) else {
            return;
        };
        let owner = self.tree.owner_of(dock_id);
        let content = self.tree.content_children(dock_id);
        let collapsable = dock.collapsable;
        let flatten = matches!(dock.arrangement, Arrangement::Proportional(p) if p.auto_created);

        match &dock.arrangement {
            Arrangement::Root(root) => {
                let pins_empty = root
                    .pinned
                    .iter()
                    .filter_map(|(_, pin)| *pin)
                    .all(|pin| self.tree.visible_of(pin).is_empty());
                let window = root.window;
                if content.is_empty() && root.hidden.is_empty() && pins_empty {
                    if let Some(window) = window {
                        self.debug_log_event(format!(
                            "collapse: window {window:?} layout ran empty, closing"
                        ));
                        self.close_window(window);
                    }
                }
                return;
            }
            Arrangement::Pin(_) => return,
            _ => {}
        }

        let Some(owner) = owner else {
            return;
        };

        if content.is_empty() && collapsable {
            self.detach(dock_id);
            self.delete_subtree(dock_id);
            self.emit(DockEvent::Collapsed { dock: dock_id });
            self.collapse(owner);
        } else if flatten && collapsable && content.len() == 1 {
            self.flatten(dock_id, content[0]);
        }
    }

    fn flatten(&mut self, wrapper: NodeId, child: NodeId) {
        let Some(owner) = self.tree.owner_of(wrapper) else {
            return;
        };
        let proportion = self.tree.get(wrapper).and_then(|d| d.proportion);
        if let Some(d) = self.tree.dock_mut(wrapper) {
            d.visible.retain(|&c| c != child);
            if d.active == Some(child) {
                d.active = None;
            }
        }
        if let Some(c) = self.tree.get_mut(child) {
            c.owner = None;
            c.proportion = proportion;
        }
        self.replace_child(owner, wrapper, child);
        self.retarget_focus(owner, wrapper, child);
        self.delete_subtree(wrapper);
        self.emit(DockEvent::Collapsed { dock: wrapper });
    }

    /// Drop leading, trailing and doubled splitters.
    fn clean_splitters(&mut self, dock: NodeId) {
        let visible = self.tree.visible_of(dock).to_vec();
        let is_splitter = |id: NodeId| self.tree.get(id).is_some_and(Dockable::is_splitter);

        let kept: Vec<NodeId> = visible
            .iter()
            .copied()
            .dedup_by(|a, b| is_splitter(*a) && is_splitter(*b))
            .collect();
        let start = kept
            .iter()
            .position(|&c| !is_splitter(c))
            .unwrap_or(kept.len());
        let end = kept
            .iter()
            .rposition(|&c| !is_splitter(c))
            .map_or(start, |i| i + 1);
        let kept = kept[start..end.max(start)].to_vec();
        let removed: Vec<NodeId> = visible.into_iter().filter(|c| !kept.contains(c)).collect();
        if removed.is_empty() {
            return;
        }

        if let Some(d) = self.tree.dock_mut(dock) {
            d.visible = kept;
        }
        for splitter in removed {
            self.tree.delete(splitter);
        }
    }

    /// Re-lay `dock` as its content children separated by exactly one splitter each.
    ///
    /// Existing splitters are reused in order; missing ones are created, surplus ones deleted.
    fn normalize_splitters(&mut self, dock: NodeId) {
        let visible = self.tree.visible_of(dock).to_vec();
        let (splitters, content): (Vec<NodeId>, Vec<NodeId>) = visible
            .iter()
            .copied()
            .partition(|&c| self.tree.get(c).is_some_and(Dockable::is_splitter));
        let overlay = matches!(
            self.tree.dock(dock).map(|d| &d.arrangement),
            Some(Arrangement::OverlaySplitterGroup(_))
        );
        let thickness = splitters
            .iter()
            .find_map(|&s| match self.tree.get(s).map(|d| &d.kind) {
                Some(DockableKind::OverlaySplitter(splitter)) => Some(splitter.thickness),
                _ => None,
            })
            .unwrap_or_default();
        let mut spare = splitters.into_iter();

        let mut order = Vec::with_capacity(content.len() * 2);
        for (i, child) in content.into_iter().enumerate() {
            if i > 0 {
                let splitter = match spare.next() {
                    Some(splitter) => Some(splitter),
                    None if overlay => self.create_generated("OverlaySplitter", |id| {
                        Dockable::overlay_splitter(id, thickness)
                    }),
                    None => self.create_generated("Splitter", Dockable::splitter),
                };
                order.extend(splitter);
            }
            order.push(child);
        }
        let surplus: Vec<NodeId> = spare.collect();
        if order == visible && surplus.is_empty() {
            return;
        }

        for &child in &order {
            if let Some(c) = self.tree.get_mut(child) {
                c.owner = Some(dock);
            }
        }
        if let Some(d) = self.tree.dock_mut(dock) {
            d.visible = order;
        }
        for splitter in surplus {
            self.tree.delete(splitter);
        }
    }

    /// Delete `id` and its whole subtree from the arena, closing windows hosted below it.
    pub(crate) fn delete_subtree(&mut self, id: NodeId) {
        let nodes = self.tree.subtree(id);
        let windows: Vec<WindowId> = self
            .tree
            .windows()
            .filter(|w| nodes.contains(&w.layout) || nodes.contains(&w.owner_root))
            .map(|w| w.id)
            .collect();
        for window in windows {
            self.close_window(window);
        }
        for node in nodes {
            if let Some(dockable) = self.tree.delete(node) {
                self.events.push(DockEvent::Closed {
                    dockable: node,
                    id: dockable.id,
                });
            }
        }
        if self.tree.main_root == Some(id) {
            self.tree.main_root = None;
        }
    }

    // ------------------------------------------------------------------------
    // Active / focused

    /// Make `dockable` the shown child of its owner.
    pub fn set_active_dockable(&mut self, dockable: NodeId) -> bool {
        let Some(owner) = self.tree.owner_of(dockable) else {
            return Self::refused(
                "set_active_dockable",
                format_args!("{dockable:?} is not attached"),
            );
        };
        if self.tree.index_of(dockable).is_none() {
            return Self::refused(
                "set_active_dockable",
                format_args!("{dockable:?} is not visible in {owner:?}"),
            );
        }
        if self.tree.get(dockable).is_some_and(Dockable::is_splitter) {
            return Self::refused("set_active_dockable", "splitters cannot be active");
        }
        self.set_active_internal(owner, Some(dockable));
        self.after_mutation("set_active_dockable");
        true
    }

    pub fn clear_active_dockable(&mut self, dock: NodeId) -> bool {
        if self.tree.dock(dock).is_none() {
            return Self::refused("clear_active_dockable", format_args!("{dock:?} is not a dock"));
        }
        self.set_active_internal(dock, None);
        true
    }

    /// Record `dockable` as the most recently focused descendant of `dock` and of every
    /// ancestor up to the root, and move the `is_active` flag to it.
    pub fn set_focused_dockable(&mut self, dock: NodeId, dockable: Option<NodeId>) -> bool {
        if self.tree.dock(dock).is_none() {
            return Self::refused("set_focused_dockable", format_args!("{dock:?} is not a dock"));
        }
        if let Some(focused) = dockable {
            if focused != dock && !self.tree.is_descendant(focused, dock) {
                return Self::refused(
                    "set_focused_dockable",
                    format_args!("{focused:?} is not inside {dock:?}"),
                );
            }
        }

        let mut chain = vec![dock];
        chain.extend(self.tree.ancestors(dock));
        let root = chain
            .last()
            .copied()
            .filter(|&r| self.tree.get(r).is_some_and(Dockable::is_root));
        let previous = root.and_then(|r| self.tree.dock(r)).and_then(|d| d.focused);

        for &id in &chain {
            if let Some(d) = self.tree.dock_mut(id) {
                d.focused = dockable;
            }
        }

        if let Some(root) = root {
            if previous != dockable {
                if let Some(prev) = previous.and_then(|p| self.tree.get_mut(p)) {
                    prev.is_active = false;
                }
                if let Some(next) = dockable.and_then(|n| self.tree.get_mut(n)) {
                    next.is_active = true;
                }
                self.emit(DockEvent::FocusChanged {
                    root,
                    focused: dockable,
                });
            }
        }
        true
    }

    /// Name the leaf that takes over the focus of `root` when its focused dockable goes away.
    pub fn set_default_dockable(&mut self, root: NodeId, dockable: Option<NodeId>) -> bool {
        const OP: &str = "set_default_dockable";
        if !self.tree.get(root).is_some_and(Dockable::is_root) {
            return Self::refused(OP, format_args!("{root:?} is not a root"));
        }
        if let Some(leaf) = dockable {
            let below = self.tree.get(leaf).is_some_and(|d| d.leaf_kind().is_some())
                && self.tree.root_of(leaf) == Some(root);
            if !below {
                return Self::refused(OP, format_args!("{leaf:?} is not a leaf below {root:?}"));
            }
        }
        if let Some(r) = self.tree.dock_mut(root).and_then(Dock::root_mut) {
            r.default_dockable = dockable;
        }
        true
    }

    /// Show and focus `dockable`.
    pub fn activate(&mut self, dockable: NodeId) -> bool {
        if !self.set_active_dockable(dockable) {
            return false;
        }
        match self.tree.owner_of(dockable) {
            Some(owner) => self.set_focused_dockable(owner, Some(dockable)),
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Debug

    fn after_mutation(&mut self, op: &'static str) {
        if !self.options.debug_integrity {
            return;
        }
        let issues = self.tree.integrity_issues();
        if issues.is_empty() {
            self.last_integrity_hash = 0;
            return;
        }
        let hash = integrity::hash_issues(&issues);
        if hash != self.last_integrity_hash {
            for issue in &issues {
                log::debug!("after {op}: {issue}");
            }
            self.debug_log_event(format!("integrity after {op}: {} issue(s)", issues.len()));
        }
        self.last_integrity_hash = hash;
        if self.options.debug_integrity_panic && cfg!(debug_assertions) {
            panic!(
                "dock tree integrity failed after {op}:\n{}",
                issues.join("\n")
            );
        }
    }
}
