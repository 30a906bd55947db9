use egui::Rect;

use crate::model::{Alignment, DockWindow, Dockable, LeafKind, NodeId, WindowId};

use super::{DockEvent, Factory};

impl Factory {
    /// Detach `dockable` into a new floating window positioned at `rect`.
    ///
    /// Leaves are wrapped in a tool or document dock of their kind; either way the window
    /// lays out a fresh root. The window registers with the non-floating root the dockable
    /// ultimately comes from.
    pub fn float_dockable(&mut self, dockable: NodeId, rect: Rect) -> Option<WindowId> {
        const OP: &str = "float_dockable";
        if let Some(reason) = self.float_refusal(dockable) {
            Self::refused(OP, format_args!("{dockable:?}: {reason}"));
            return None;
        }
        let d = self.tree.get(dockable)?;
        let leaf = d.leaf_kind();
        let title = d.title.clone();
        let owner = self.tree.owner_of(dockable);
        let home = self
            .tree
            .root_of(dockable)
            .or(self.tree.main_root)
            .map(|root| self.home_root(root))?;

        let content = match leaf {
            Some(LeafKind::Tool) => self.create_generated("ToolDock", |id| {
                Dockable::tool_dock(id, Alignment::Unset)
            })?,
            Some(LeafKind::Document) => {
                self.create_generated("DocumentDock", Dockable::document_dock)?
            }
            None => dockable,
        };
        let Some(layout) = self.create_generated("Root", Dockable::root) else {
            if content != dockable {
                self.tree.delete(content);
            }
            return None;
        };

        if owner.is_some() {
            self.detach(dockable);
        }
        if content != dockable {
            self.attach(content, None, dockable);
        }
        self.attach(layout, None, content);

        let Some(window) = self.add_window(home, layout, title, rect) else {
            log::debug!("{OP}: window registration failed for {layout:?}");
            self.after_mutation(OP);
            return None;
        };
        if let Some(owner) = owner {
            self.collapse(owner);
        }
        if leaf.is_some() {
            self.set_focused_dockable(content, Some(dockable));
        }
        self.debug_log_event(format!("{OP}: {dockable:?} -> window {window:?}"));
        self.after_mutation(OP);
        Some(window)
    }

    /// Why `dockable` cannot be floated right now, if it cannot.
    pub(crate) fn float_refusal(&self, dockable: NodeId) -> Option<&'static str> {
        let Some(d) = self.tree.get(dockable) else {
            return Some("does not exist");
        };
        if !d.can_float || d.is_root() || d.is_splitter() {
            return Some("cannot float");
        }
        if d.owner.is_some() && self.tree.index_of(dockable).is_none() {
            return Some("is pinned or hidden");
        }
        if self.tree.root_of(dockable).or(self.tree.main_root).is_none() {
            return Some("no root to register the window with");
        }
        None
    }

    /// Register a floating window that lays out `layout`, spawned from `owner_root`.
    ///
    /// The host locator (if any) is asked for a platform window right away.
    pub fn add_window(
        &mut self,
        owner_root: NodeId,
        layout: NodeId,
        title: impl Into<String>,
        rect: Rect,
    ) -> Option<WindowId> {
        const OP: &str = "add_window";
        let owner_ok = self
            .tree
            .dock(owner_root)
            .and_then(|d| d.root())
            .is_some_and(|r| r.window.is_none());
        if !owner_ok {
            Self::refused(OP, format_args!("{owner_root:?} is not a docked root"));
            return None;
        }
        let layout_ok = layout != owner_root
            && Some(layout) != self.tree.main_root
            && self.tree.owner_of(layout).is_none()
            && self
                .tree
                .dock(layout)
                .and_then(|d| d.root())
                .is_some_and(|r| r.window.is_none());
        if !layout_ok {
            Self::refused(OP, format_args!("{layout:?} is not a free root"));
            return None;
        }

        let id = self.tree.alloc_window_id();
        let mut window = DockWindow::new(id, title.into(), rect, layout, owner_root);
        if let Some(locator) = &mut self.host_locator {
            match locator(&window) {
                Some(host) => window.attach_host(host),
                None => log::debug!("{OP}: no host for window {id:?}, leaving it untracked"),
            }
        }
        if let Some(root) = self.tree.dock_mut(layout).and_then(|d| d.root_mut()) {
            root.window = Some(id);
        }
        if let Some(root) = self.tree.dock_mut(owner_root).and_then(|d| d.root_mut()) {
            root.windows.push(id);
        }
        self.tree.windows.insert(id, window);
        self.emit(DockEvent::WindowOpened { window: id });
        self.after_mutation(OP);
        Some(id)
    }

    /// Exit a floating window: persist the host geometry, tear the host down, unregister it
    /// and delete its layout.
    pub fn close_window(&mut self, window: WindowId) -> Option<DockWindow> {
        let Some(mut closed) = self.tree.windows.remove(&window) else {
            Self::refused("close_window", format_args!("{window:?} does not exist"));
            return None;
        };
        closed.exit();
        if let Some(root) = self
            .tree
            .dock_mut(closed.owner_root)
            .and_then(|d| d.root_mut())
        {
            root.windows.retain(|&w| w != window);
        }
        if let Some(root) = self.tree.dock_mut(closed.layout).and_then(|d| d.root_mut()) {
            root.window = None;
        }
        self.emit(DockEvent::WindowClosed { window });
        self.delete_subtree(closed.layout);
        self.after_mutation("close_window");
        Some(closed)
    }

    /// Show every floating window, e.g. so they become drop targets while dragging.
    pub fn present_windows(&mut self) {
        for window in self.tree.windows.values_mut() {
            window.present();
        }
    }

    /// Follow floating layouts back to the docked root that spawned them.
    fn home_root(&self, root: NodeId) -> NodeId {
        let mut current = root;
        for _ in 0..=self.tree.windows.len() {
            let window = self
                .tree
                .dock(current)
                .and_then(|d| d.root())
                .and_then(|r| r.window)
                .and_then(|w| self.tree.window(w));
            match window {
                Some(window) => current = window.owner_root,
                None => break,
            }
        }
        current
    }
}
