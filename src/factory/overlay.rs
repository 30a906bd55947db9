use egui::{Pos2, Rect, Vec2};

use crate::model::{Arrangement, Dockable, DockableKind, NodeId, OverlayPanel};

use super::{DockEvent, Factory};

impl Factory {
    /// Wrap `content` in a new panel floating over `overlay` at `rect`, on top of the others.
    pub fn add_overlay_panel(
        &mut self,
        overlay: NodeId,
        content: NodeId,
        rect: Rect,
    ) -> Option<NodeId> {
        const OP: &str = "add_overlay_panel";
        if !matches!(
            self.tree.dock(overlay).map(|d| &d.arrangement),
            Some(Arrangement::Overlay(_))
        ) {
            Self::refused(OP, format_args!("{overlay:?} is not an overlay dock"));
            return None;
        }
        if self.tree.get(content).is_none_or(|d| d.is_root() || d.is_splitter()) {
            Self::refused(OP, format_args!("{content:?} cannot go into a panel"));
            return None;
        }
        if !self.can_attach(overlay, content) {
            return None;
        }

        let z_index = self.next_z_index(overlay);
        let panel = self.create_generated("OverlayPanel", |id| Dockable::overlay_panel(id, rect))?;
        if let Some(p) = self.panel_mut(panel) {
            p.z_index = z_index;
        }
        self.attach(overlay, None, panel);
        self.attach(panel, None, content);
        self.set_active_internal(overlay, Some(panel));
        self.emit(DockEvent::Added {
            dockable: panel,
            owner: overlay,
        });
        self.after_mutation(OP);
        Some(panel)
    }

    /// Drop `source` (attached anywhere, or free) into `overlay` as a new panel at `rect`.
    pub fn move_into_overlay(
        &mut self,
        source: NodeId,
        overlay: NodeId,
        rect: Rect,
    ) -> Option<NodeId> {
        const OP: &str = "move_into_overlay";
        if let Some(reason) = self.overlay_refusal(source, overlay) {
            Self::refused(OP, format_args!("{source:?} -> {overlay:?}: {reason}"));
            return None;
        }
        let old_owner = self.tree.owner_of(source);
        let old_index = self.tree.index_of(source);
        if old_owner.is_some() {
            self.detach(source);
        }
        let Some(panel) = self.add_overlay_panel(overlay, source, rect) else {
            if let Some(owner) = old_owner {
                self.attach(owner, old_index, source);
            }
            return None;
        };
        if let Some(owner) = old_owner {
            self.collapse(owner);
        }
        self.after_mutation(OP);
        Some(panel)
    }

    /// Why `source` cannot be dropped into `overlay`, if it cannot.
    pub(crate) fn overlay_refusal(&self, source: NodeId, overlay: NodeId) -> Option<&'static str> {
        if !matches!(
            self.tree.dock(overlay).map(|d| &d.arrangement),
            Some(Arrangement::Overlay(_))
        ) {
            return Some("target is not an overlay dock");
        }
        let Some(dockable) = self.tree.get(source) else {
            return Some("source does not exist");
        };
        if dockable.is_root() || dockable.is_splitter() || self.is_pin_arrangement(source) {
            return Some("source never moves");
        }
        if dockable.owner.is_some() && self.tree.index_of(source).is_none() {
            return Some("source is pinned or hidden");
        }
        if overlay == source || self.tree.is_descendant(overlay, source) {
            return Some("target lies inside source");
        }
        None
    }

    pub fn move_overlay_panel(&mut self, panel: NodeId, position: Pos2) -> bool {
        let Some(p) = self.panel_mut(panel) else {
            return Self::refused(
                "move_overlay_panel",
                format_args!("{panel:?} is not an overlay panel"),
            );
        };
        p.rect = Rect::from_min_size(position, p.rect.size());
        self.emit(DockEvent::Resized { dockable: panel });
        true
    }

    /// Resize a panel, keeping its top-left corner. Sizes are clamped to be non-negative.
    pub fn resize_overlay_panel(&mut self, panel: NodeId, size: Vec2) -> bool {
        let Some(p) = self.panel_mut(panel) else {
            return Self::refused(
                "resize_overlay_panel",
                format_args!("{panel:?} is not an overlay panel"),
            );
        };
        p.rect = Rect::from_min_size(p.rect.min, size.max(Vec2::ZERO));
        self.emit(DockEvent::Resized { dockable: panel });
        true
    }

    /// Raise `panel` above every sibling panel.
    pub fn bring_panel_to_front(&mut self, panel: NodeId) -> bool {
        let Some(overlay) = self
            .tree
            .owner_of(panel)
            .filter(|_| self.tree.get(panel).is_some_and(is_panel))
        else {
            return Self::refused(
                "bring_panel_to_front",
                format_args!("{panel:?} is not an attached overlay panel"),
            );
        };
        let top = self
            .tree
            .visible_of(overlay)
            .iter()
            .filter(|&&sibling| sibling != panel)
            .filter_map(|&sibling| self.panel(sibling))
            .map(|p| p.z_index)
            .max();
        let current = self.panel(panel).map(|p| p.z_index);
        if top.is_some_and(|top| current.is_some_and(|z| z > top)) {
            return true;
        }

        let z_index = self.next_z_index(overlay);
        if let Some(p) = self.panel_mut(panel) {
            p.z_index = z_index;
        }
        self.set_active_internal(overlay, Some(panel));
        true
    }

    /// Move `delta` of proportion across an overlay splitter.
    pub fn resize_overlay_splitter(&mut self, splitter: NodeId, delta: f32) -> bool {
        let in_group = self.tree.owner_of(splitter).is_some_and(|owner| {
            matches!(
                self.tree.dock(owner).map(|d| &d.arrangement),
                Some(Arrangement::OverlaySplitterGroup(_))
            )
        });
        let is_overlay_splitter = matches!(
            self.tree.get(splitter).map(|d| &d.kind),
            Some(DockableKind::OverlaySplitter(_))
        );
        if !in_group || !is_overlay_splitter {
            return Self::refused(
                "resize_overlay_splitter",
                format_args!("{splitter:?} is not an overlay splitter in a group"),
            );
        }
        self.resize_neighbours("resize_overlay_splitter", splitter, delta)
    }

    fn next_z_index(&mut self, overlay: NodeId) -> i32 {
        match self.tree.dock_mut(overlay).map(|d| &mut d.arrangement) {
            Some(Arrangement::Overlay(o)) => {
                o.next_z_index = o.next_z_index.saturating_add(1);
                o.next_z_index
            }
            _ => 0,
        }
    }

    fn panel(&self, id: NodeId) -> Option<&OverlayPanel> {
        match &self.tree.dock(id)?.arrangement {
            Arrangement::OverlayPanel(panel) => Some(panel),
            _ => None,
        }
    }

    fn panel_mut(&mut self, id: NodeId) -> Option<&mut OverlayPanel> {
        match &mut self.tree.dock_mut(id)?.arrangement {
            Arrangement::OverlayPanel(panel) => Some(panel),
            _ => None,
        }
    }
}

fn is_panel(dockable: &Dockable) -> bool {
    matches!(
        dockable.as_dock().map(|d| &d.arrangement),
        Some(Arrangement::OverlayPanel(_))
    )
}
