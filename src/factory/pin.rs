use crate::model::{Alignment, Arrangement, Dockable, NodeId, PinOrigin};

use super::{DockEvent, Factory};

impl Factory {
    /// Collapse a tool onto its root's edge strip, remembering where it came from.
    pub fn pin_dockable(&mut self, dockable: NodeId) -> bool {
        const OP: &str = "pin_dockable";
        let Some(d) = self.tree.get(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} does not exist"));
        };
        if !d.can_pin || d.is_dock() {
            return Self::refused(OP, format_args!("{dockable:?} cannot be pinned"));
        }
        let (Some(owner), Some(index)) = (self.tree.owner_of(dockable), self.tree.index_of(dockable))
        else {
            return Self::refused(OP, format_args!("{dockable:?} is not visible"));
        };
        if self.is_pin_arrangement(owner) {
            return Self::refused(OP, format_args!("{dockable:?} is already pinned"));
        }
        let Some(root) = self.tree.root_of(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} is not under a root"));
        };
        let alignment = self.edge_for(owner);
        let Some(pin_dock) = self.ensure_pin_dock(root, alignment) else {
            return false;
        };

        self.detach(dockable);
        if let Some(d) = self.tree.get_mut(dockable) {
            d.origin = Some(PinOrigin { owner, index });
        }
        self.attach(pin_dock, None, dockable);
        self.emit(DockEvent::Pinned { dockable, pin_dock });
        self.collapse(owner);
        self.after_mutation(OP);
        true
    }

    /// Put a pinned dockable back into the layout.
    ///
    /// It returns to its former owner if that dock still lives under the same root; otherwise a
    /// new tool dock is split onto the root layout at the pin strip's edge.
    pub fn unpin_dockable(&mut self, dockable: NodeId) -> bool {
        const OP: &str = "unpin_dockable";
        let Some(pin) = self.tree.owner_of(dockable).filter(|&o| self.is_pin_arrangement(o)) else {
            return Self::refused(OP, format_args!("{dockable:?} is not pinned"));
        };
        let Some(root) = self.tree.root_of(pin) else {
            return false;
        };
        let alignment = self.edge_for(pin);
        let origin = self.tree.get(dockable).and_then(|d| d.origin);

        self.detach(dockable);
        let Some(owner) = self.reattach(root, dockable, origin, alignment) else {
            return false;
        };
        self.emit(DockEvent::Unpinned { dockable, owner });
        self.after_mutation(OP);
        true
    }

    pub fn toggle_pin(&mut self, dockable: NodeId) -> bool {
        let pinned = self
            .tree
            .owner_of(dockable)
            .is_some_and(|o| self.is_pin_arrangement(o));
        if pinned {
            self.unpin_dockable(dockable)
        } else {
            self.pin_dockable(dockable)
        }
    }

    /// Slide a pinned dockable's overlay out (its pin strip expands).
    pub fn preview_pinned(&mut self, dockable: NodeId) -> bool {
        let Some(pin) = self.tree.owner_of(dockable).filter(|&o| self.is_pin_arrangement(o)) else {
            return Self::refused(
                "preview_pinned",
                format_args!("{dockable:?} is not pinned"),
            );
        };
        self.set_active_internal(pin, Some(dockable));
        true
    }

    /// Retract every pinned overlay of `root`.
    pub fn hide_pinned_preview(&mut self, root: NodeId) -> bool {
        let Some(pins) = self.tree.dock(root).and_then(|d| d.root()).map(|r| r.pinned) else {
            return Self::refused(
                "hide_pinned_preview",
                format_args!("{root:?} is not a root"),
            );
        };
        for (_, pin) in pins.iter() {
            if let Some(pin) = *pin {
                self.set_active_internal(pin, None);
            }
        }
        true
    }

    /// Take a dockable out of the layout into its root's hidden list.
    pub fn hide_dockable(&mut self, dockable: NodeId) -> bool {
        const OP: &str = "hide_dockable";
        if self.tree.get(dockable).is_none_or(Dockable::is_splitter) {
            return Self::refused(OP, format_args!("{dockable:?} cannot be hidden"));
        }
        let (Some(owner), Some(index)) = (self.tree.owner_of(dockable), self.tree.index_of(dockable))
        else {
            return Self::refused(OP, format_args!("{dockable:?} is not visible"));
        };
        let Some(root) = self.tree.root_of(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} is not under a root"));
        };

        self.detach(dockable);
        if let Some(root_dock) = self.tree.dock_mut(root).and_then(|d| d.root_mut()) {
            root_dock.hidden.push(dockable);
        }
        if let Some(d) = self.tree.get_mut(dockable) {
            d.owner = Some(root);
            d.origin = Some(PinOrigin { owner, index });
        }
        self.emit(DockEvent::Hidden { dockable });
        self.collapse(owner);
        self.after_mutation(OP);
        true
    }

    /// Bring a hidden dockable back, the same way [`Self::unpin_dockable`] does.
    pub fn restore_dockable(&mut self, dockable: NodeId) -> bool {
        const OP: &str = "restore_dockable";
        let Some(root) = self.tree.owner_of(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} is not hidden"));
        };
        let hidden = self
            .tree
            .dock(root)
            .and_then(|d| d.root())
            .is_some_and(|r| r.hidden.contains(&dockable));
        if !hidden {
            return Self::refused(OP, format_args!("{dockable:?} is not hidden"));
        }
        let origin = self.tree.get(dockable).and_then(|d| d.origin);
        let alignment = origin.map_or(Alignment::Left, |o| self.edge_for(o.owner));

        self.detach(dockable);
        let Some(owner) = self.reattach(root, dockable, origin, alignment) else {
            return false;
        };
        self.emit(DockEvent::Restored { dockable, owner });
        self.after_mutation(OP);
        true
    }

    /// Remove a dockable for good, honouring `can_close`.
    pub fn close_dockable(&mut self, dockable: NodeId) -> bool {
        const OP: &str = "close_dockable";
        let Some(d) = self.tree.get(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} does not exist"));
        };
        if !d.can_close {
            return Self::refused(OP, format_args!("{dockable:?} cannot be closed"));
        }
        if d.is_root() {
            let window = d.as_dock().and_then(|dock| dock.root()).and_then(|r| r.window);
            return match window {
                Some(window) => self.close_window(window).is_some(),
                None => Self::refused(OP, "the main root cannot be closed"),
            };
        }

        let owner = self.tree.owner_of(dockable);
        if owner.is_some() {
            self.detach(dockable);
        }
        self.delete_subtree(dockable);
        if let Some(owner) = owner {
            self.collapse(owner);
        }
        self.after_mutation(OP);
        true
    }

    /// Edge associated with `dock`: its own alignment, or that of the nearest aligned ancestor.
    fn edge_for(&self, dock: NodeId) -> Alignment {
        std::iter::once(dock)
            .chain(self.tree.ancestors(dock))
            .find_map(|id| match self.tree.dock(id).map(|d| &d.arrangement) {
                Some(Arrangement::Tool(tool)) if tool.alignment != Alignment::Unset => {
                    Some(tool.alignment)
                }
                Some(Arrangement::Pin(pin)) => Some(pin.alignment),
                _ => None,
            })
            .unwrap_or(Alignment::Left)
    }

    fn ensure_pin_dock(&mut self, root: NodeId, alignment: Alignment) -> Option<NodeId> {
        let existing = *self.tree.dock(root)?.root()?.pinned.get(alignment);
        if let Some(pin) = existing {
            return Some(pin);
        }
        let edge = alignment.edge();
        let pin = self.create_generated("Pin", |id| Dockable::pin_dock(id, edge))?;
        match self.tree.dock_mut(root).and_then(|d| d.root_mut()) {
            Some(root_dock) => *root_dock.pinned.get_mut(edge) = Some(pin),
            None => {
                self.tree.delete(pin);
                return None;
            }
        }
        if let Some(p) = self.tree.get_mut(pin) {
            p.owner = Some(root);
        }
        Some(pin)
    }

    /// Attach a detached `dockable` under `root`: back into `origin` when it is still usable,
    /// else into a new tool dock split onto the root layout at `alignment`.
    fn reattach(
        &mut self,
        root: NodeId,
        dockable: NodeId,
        origin: Option<PinOrigin>,
        alignment: Alignment,
    ) -> Option<NodeId> {
        if let Some(d) = self.tree.get_mut(dockable) {
            d.origin = None;
        }
        if let Some(origin) = origin.filter(|o| self.origin_accepts(root, o.owner, dockable)) {
            self.attach(origin.owner, Some(origin.index), dockable);
            if !self.is_pin_arrangement(origin.owner) {
                self.set_active_internal(origin.owner, Some(dockable));
            }
            return Some(origin.owner);
        }

        let edge = alignment.edge();
        let is_dock = self.tree.get(dockable).is_some_and(Dockable::is_dock);
        let container = if is_dock {
            dockable
        } else {
            let tool_dock = self.create_generated("ToolDock", |id| Dockable::tool_dock(id, edge))?;
            self.attach(tool_dock, None, dockable);
            tool_dock
        };
        if !self.split_to_dock(root, container, edge.split_operation()) {
            log::debug!("reattach: could not split {root:?}, appending {container:?}");
            self.attach(root, None, container);
        }
        Some(container)
    }

    fn origin_accepts(&self, root: NodeId, owner: NodeId, dockable: NodeId) -> bool {
        let (Some(dock), Some(d)) = (self.tree.dock(owner), self.tree.get(dockable)) else {
            return false;
        };
        if self.tree.root_of(owner) != Some(root) {
            return false;
        }
        match (&dock.arrangement, d.leaf_kind()) {
            (Arrangement::Proportional(_), _) => false,
            (Arrangement::Root(_), _) => self.tree.content_children(owner).is_empty(),
            (Arrangement::Tool(_) | Arrangement::Document(_), Some(leaf)) => {
                dock.arrangement.accepts(leaf, 0)
            }
            _ => true,
        }
    }
}
