use crate::model::{Arrangement, DockOperation, Dockable, DockableKind, LeafKind, NodeId};

use super::{DockEvent, Factory};

impl Factory {
    /// Split `target` on the `operation` edge, using [`crate::DockOptions::split_proportion`].
    pub fn split_to_dock(
        &mut self,
        target: NodeId,
        new_dock: NodeId,
        operation: DockOperation,
    ) -> bool {
        let proportion = self.options.clamped_split_proportion();
        self.split_to_dock_with(target, new_dock, operation, proportion)
    }

    /// Wrap `target` in a new auto-created proportional dock and put `new_dock` on the
    /// `operation` side, separated by one splitter.
    ///
    /// `new_dock` gets `proportion`, `target` the rest; the wrapper takes over `target`'s
    /// former proportion. Splitting a root splits its single layout child; an empty root just
    /// receives `new_dock`.
    pub fn split_to_dock_with(
        &mut self,
        target: NodeId,
        new_dock: NodeId,
        operation: DockOperation,
        proportion: f32,
    ) -> bool {
        const OP: &str = "split_to_dock";
        let Some(orientation) = operation.split_orientation() else {
            return Self::refused(OP, format_args!("{operation:?} is not an edge"));
        };
        let Some(target_dockable) = self.tree.get(target) else {
            return Self::refused(OP, format_args!("{target:?} does not exist"));
        };
        let target_is_root = target_dockable.is_root();
        match self.tree.get(new_dock) {
            None => return Self::refused(OP, format_args!("{new_dock:?} does not exist")),
            Some(d) if d.owner.is_some() || d.is_root() || d.is_splitter() => {
                return Self::refused(OP, format_args!("{new_dock:?} cannot be inserted"));
            }
            Some(_) => {}
        }
        if new_dock == target || self.tree.is_descendant(target, new_dock) {
            return Self::refused(OP, format_args!("{target:?} lies inside {new_dock:?}"));
        }

        let target = if target_is_root {
            match self.tree.content_children(target).as_slice() {
                [] => {
                    self.attach(target, None, new_dock);
                    self.emit(DockEvent::Added {
                        dockable: new_dock,
                        owner: target,
                    });
                    self.after_mutation(OP);
                    return true;
                }
                [layout] => *layout,
                _ => {
                    return Self::refused(
                        OP,
                        format_args!("root {target:?} has several layout children"),
                    );
                }
            }
        } else {
            target
        };

        let Some(owner) = self.tree.owner_of(target) else {
            return Self::refused(OP, format_args!("{target:?} is not attached"));
        };
        if self.tree.index_of(target).is_none() {
            return Self::refused(OP, format_args!("{target:?} is not visible"));
        }
        if matches!(
            self.tree.dock(owner).map(|d| &d.arrangement),
            Some(Arrangement::Pin(_))
        ) {
            return Self::refused(OP, "pinned dockables cannot be split");
        }

        let min = self.options.minimum_proportion.clamp(0.0, 0.5);
        let proportion = proportion.clamp(min, 1.0 - min);
        let target_proportion = self.tree.get(target).and_then(|d| d.proportion);

        let Some(wrapper) =
            self.create_generated("Proportional", |id| Dockable::split_wrapper(id, orientation))
        else {
            return false;
        };
        let Some(splitter) = self.create_generated("Splitter", Dockable::splitter) else {
            self.tree.delete(wrapper);
            return false;
        };

        self.replace_child(owner, target, wrapper);
        if let Some(w) = self.tree.get_mut(wrapper) {
            w.proportion = target_proportion;
        }
        if let Some(t) = self.tree.get_mut(target) {
            t.proportion = Some(1.0 - proportion);
        }
        if let Some(n) = self.tree.get_mut(new_dock) {
            n.proportion = Some(proportion);
        }

        let order = if operation.inserts_before() {
            [new_dock, splitter, target]
        } else {
            [target, splitter, new_dock]
        };
        for child in order {
            self.attach(wrapper, None, child);
        }

        self.emit(DockEvent::Split {
            target,
            inserted: new_dock,
            container: wrapper,
            operation,
        });
        self.after_mutation(OP);
        true
    }

    /// Edge-drop `source` onto `target`: take `source` out of its owner, wrap a leaf in a new
    /// tool or document dock, split the drop site with it, then tidy the old owner.
    ///
    /// A leaf target splits its owner dock; a root target splits its layout child.
    pub fn dock_into_split(
        &mut self,
        source: NodeId,
        target: NodeId,
        operation: DockOperation,
    ) -> bool {
        const OP: &str = "dock_into_split";
        if let Some(reason) = self.split_refusal(source, target, operation) {
            return Self::refused(OP, format_args!("{source:?} -> {target:?}: {reason}"));
        }
        let Some(site) = self.split_site(target) else {
            return false;
        };
        let leaf = self.tree.get(source).and_then(Dockable::leaf_kind);
        let old_owner = self.tree.owner_of(source);
        let old_index = self.tree.index_of(source);

        let alignment = operation.alignment();
        let inserted = match leaf {
            Some(LeafKind::Tool) => {
                self.create_generated("ToolDock", |id| Dockable::tool_dock(id, alignment))
            }
            Some(LeafKind::Document) => {
                self.create_generated("DocumentDock", Dockable::document_dock)
            }
            None => Some(source),
        };
        let Some(inserted) = inserted else {
            return false;
        };

        if old_owner.is_some() {
            self.detach(source);
        }
        if inserted != source {
            self.attach(inserted, None, source);
        }
        if !self.split_to_dock(site, inserted, operation) {
            if inserted != source {
                self.detach(source);
                self.tree.delete(inserted);
            }
            if let Some(owner) = old_owner {
                self.attach(owner, old_index, source);
            }
            self.after_mutation(OP);
            return false;
        }
        if let Some(owner) = old_owner {
            self.collapse(owner);
        }
        self.debug_log_event(format!("{OP}: {source:?} {operation:?} of {site:?}"));
        self.after_mutation(OP);
        true
    }

    /// The node an edge drop onto `target` splits: a leaf's owner, a root's single layout child
    /// (or the empty root itself), otherwise `target`.
    pub(crate) fn split_site(&self, target: NodeId) -> Option<NodeId> {
        let dockable = self.tree.get(target)?;
        let node = if dockable.leaf_kind().is_some() {
            self.tree.index_of(target)?;
            self.tree.owner_of(target)?
        } else {
            target
        };
        if self.tree.get(node)?.is_root() {
            return match self.tree.content_children(node).as_slice() {
                [] => Some(node),
                [only] => Some(*only),
                _ => None,
            };
        }
        Some(node)
    }

    /// Why an edge drop of `source` onto `target` is illegal, if it is.
    pub(crate) fn split_refusal(
        &self,
        source: NodeId,
        target: NodeId,
        operation: DockOperation,
    ) -> Option<&'static str> {
        if !operation.is_edge() {
            return Some("operation is not an edge");
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
        let Some(site) = self.split_site(target) else {
            return Some("no split site");
        };
        if site == source || self.tree.is_descendant(site, source) {
            return Some("target lies inside source");
        }
        let site_is_root = self.tree.get(site).is_some_and(Dockable::is_root);
        if !site_is_root {
            let Some(owner) = self.tree.owner_of(site) else {
                return Some("target is not attached");
            };
            if self.tree.index_of(site).is_none() || self.is_pin_arrangement(owner) {
                return Some("target is pinned or hidden");
            }
        }
        if self.is_pin_arrangement(site) {
            return Some("pin strips cannot be split");
        }
        let leaves = self.tree.visible_leaves(site);
        if !leaves.is_empty()
            && leaves
                .iter()
                .all(|&l| l == source || self.tree.is_descendant(l, source))
        {
            return Some("source is the target's only content");
        }
        None
    }

    pub(crate) fn is_pin_arrangement(&self, dock: NodeId) -> bool {
        matches!(
            self.tree.dock(dock).map(|d| &d.arrangement),
            Some(Arrangement::Pin(_))
        )
    }

    /// Move `delta` of proportion from the right/bottom neighbour of `splitter` to its
    /// left/top neighbour, keeping both above the minimum proportion.
    pub fn resize_splitter(&mut self, splitter: NodeId, delta: f32) -> bool {
        match self.tree.get(splitter).map(|d| &d.kind) {
            Some(DockableKind::Splitter(s)) if s.can_resize => {
                self.resize_neighbours("resize_splitter", splitter, delta)
            }
            _ => Self::refused(
                "resize_splitter",
                format_args!("{splitter:?} is not a resizable splitter"),
            ),
        }
    }

    pub(super) fn resize_neighbours(
        &mut self,
        op: &'static str,
        splitter: NodeId,
        delta: f32,
    ) -> bool {
        let (Some(owner), Some(index)) =
            (self.tree.owner_of(splitter), self.tree.index_of(splitter))
        else {
            return Self::refused(op, format_args!("{splitter:?} is not attached"));
        };
        let visible = self.tree.visible_of(owner);
        let (Some(&before), Some(&after)) = (
            index.checked_sub(1).and_then(|i| visible.get(i)),
            visible.get(index + 1),
        ) else {
            return Self::refused(op, format_args!("{splitter:?} lacks a neighbour"));
        };

        let even_share = 1.0 / self.tree.content_children(owner).len().max(1) as f32;
        let share = |id: NodeId| {
            self.tree
                .get(id)
                .and_then(|d| d.proportion)
                .unwrap_or(even_share)
        };
        let total = share(before) + share(after);
        let min = self.options.minimum_proportion.max(0.0);
        if total < 2.0 * min {
            return Self::refused(op, "neighbours are already at the minimum size");
        }
        let first = (share(before) + delta).clamp(min, total - min);

        if let Some(d) = self.tree.get_mut(before) {
            d.proportion = Some(first);
        }
        if let Some(d) = self.tree.get_mut(after) {
            d.proportion = Some(total - first);
        }
        self.emit(DockEvent::Resized { dockable: before });
        self.emit(DockEvent::Resized { dockable: after });
        true
    }
}
