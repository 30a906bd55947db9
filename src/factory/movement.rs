use crate::model::{Arrangement, Dockable, NodeId};

use super::{DockEvent, Factory};

impl Factory {
    /// Move `dockable` out of `source_owner` into `target_owner`, at `index` or at the end.
    ///
    /// Within one owner, `index` addresses the collection after `dockable` was taken out. A
    /// container laid out with splitters is re-laid afterwards so splitters only ever separate
    /// two content children.
    pub fn move_dockable(
        &mut self,
        source_owner: NodeId,
        target_owner: NodeId,
        dockable: NodeId,
        index: Option<usize>,
    ) -> bool {
        const OP: &str = "move_dockable";
        if self.tree.owner_of(dockable) != Some(source_owner) {
            return Self::refused(
                OP,
                format_args!("{dockable:?} is not owned by {source_owner:?}"),
            );
        }
        let Some(from) = self.tree.index_of(dockable) else {
            return Self::refused(OP, format_args!("{dockable:?} is not visible"));
        };
        if self.tree.get(dockable).is_some_and(Dockable::is_splitter) {
            return Self::refused(OP, "splitters only move with their container");
        }
        let Some(target) = self.tree.dock(target_owner) else {
            return Self::refused(OP, format_args!("{target_owner:?} is not a dock"));
        };
        if target_owner == dockable || self.tree.is_descendant(target_owner, dockable) {
            return Self::refused(
                OP,
                format_args!("{target_owner:?} lies inside {dockable:?}"),
            );
        }
        let into_pin = matches!(target.arrangement, Arrangement::Pin(_));
        let splits = target.arrangement.uses_splitters();
        if into_pin
            && self
                .tree
                .get(dockable)
                .is_some_and(|d| !d.can_pin || d.is_dock())
        {
            return Self::refused(OP, format_args!("{dockable:?} cannot be pinned"));
        }

        if source_owner == target_owner {
            let Some(dock) = self.tree.dock_mut(source_owner) else {
                return false;
            };
            let last = dock.visible.len().saturating_sub(1);
            let to = index.unwrap_or(last).min(last);
            if to != from {
                dock.visible.remove(from);
                dock.visible.insert(to, dockable);
                if splits {
                    self.normalize_splitters(source_owner);
                }
                let index = self.tree.index_of(dockable).unwrap_or(to);
                self.emit(DockEvent::Moved {
                    dockable,
                    from: source_owner,
                    to: target_owner,
                    index,
                });
            }
            if !into_pin {
                self.set_active_internal(target_owner, Some(dockable));
            }
            self.after_mutation(OP);
            return true;
        }

        self.detach(dockable);
        let mut at = self.attach(target_owner, index, dockable);
        if splits {
            self.normalize_splitters(target_owner);
            at = self.tree.index_of(dockable).unwrap_or(at);
        }
        if !into_pin {
            self.set_active_internal(target_owner, Some(dockable));
        }
        self.emit(DockEvent::Moved {
            dockable,
            from: source_owner,
            to: target_owner,
            index: at,
        });
        self.collapse(source_owner);
        self.after_mutation(OP);
        true
    }

    /// Drop `dockable` onto the sibling slot of `target`.
    ///
    /// Same owner: `dockable` is taken out, then inserted at `target`'s former index. Dragging
    /// the first of `[A, B, C]` onto `C` yields `[B, C, A]`; dragging `C` onto `A` yields
    /// `[C, A, B]`. Across owners it lands right after `target`.
    pub fn move_dockable_onto(&mut self, dockable: NodeId, target: NodeId) -> bool {
        if dockable == target {
            return Self::refused("move_dockable_onto", "source and target are identical");
        }
        let (Some(source_owner), Some(target_owner)) =
            (self.tree.owner_of(dockable), self.tree.owner_of(target))
        else {
            return Self::refused("move_dockable_onto", "source or target is not attached");
        };
        let Some(target_index) = self.tree.index_of(target) else {
            return Self::refused(
                "move_dockable_onto",
                format_args!("{target:?} is not visible"),
            );
        };
        let index = if source_owner == target_owner {
            target_index
        } else {
            target_index + 1
        };
        self.move_dockable(source_owner, target_owner, dockable, Some(index))
    }

    /// Exchange the child at `index_a` of `owner_a` with the child at `index_b` of `owner_b`.
    ///
    /// Proportions travel with the slot, not with the dockable.
    pub fn swap_dockable(
        &mut self,
        owner_a: NodeId,
        owner_b: NodeId,
        index_a: usize,
        index_b: usize,
    ) -> bool {
        const OP: &str = "swap_dockable";
        let a = self
            .tree
            .dock(owner_a)
            .and_then(|d| d.visible.get(index_a).copied());
        let b = self
            .tree
            .dock(owner_b)
            .and_then(|d| d.visible.get(index_b).copied());
        let (Some(a), Some(b)) = (a, b) else {
            return Self::refused(
                OP,
                format_args!("no child at {owner_a:?}[{index_a}] or {owner_b:?}[{index_b}]"),
            );
        };
        if let Some(reason) = self.swap_refusal(owner_a, owner_b, a, b) {
            return Self::refused(OP, format_args!("{a:?} <-> {b:?}: {reason}"));
        }

        if owner_a == owner_b {
            if let Some(dock) = self.tree.dock_mut(owner_a) {
                dock.visible.swap(index_a, index_b);
            }
        } else {
            let chain_a = self.tree.ancestors(a);
            let chain_b = self.tree.ancestors(b);
            let subtree_a = self.tree.subtree(a);
            let subtree_b = self.tree.subtree(b);
            self.clear_focus_references(&chain_a, &subtree_a);
            self.clear_focus_references(&chain_b, &subtree_b);

            for (owner, index, old, new) in [(owner_a, index_a, a, b), (owner_b, index_b, b, a)] {
                if let Some(dock) = self.tree.dock_mut(owner) {
                    dock.visible[index] = new;
                    if dock.active == Some(old) {
                        dock.active = Some(new);
                    }
                }
                if let Some(d) = self.tree.get_mut(new) {
                    d.owner = Some(owner);
                }
            }
        }

        let proportion_a = self.tree.get(a).and_then(|d| d.proportion);
        let proportion_b = self.tree.get(b).and_then(|d| d.proportion);
        if let Some(d) = self.tree.get_mut(a) {
            d.proportion = proportion_b;
        }
        if let Some(d) = self.tree.get_mut(b) {
            d.proportion = proportion_a;
        }

        self.emit(DockEvent::Swapped {
            first: a,
            second: b,
        });
        self.after_mutation(OP);
        true
    }

    /// Swap two attached, visible dockables (the Link drag action).
    pub fn swap_dockable_with(&mut self, dockable: NodeId, target: NodeId) -> bool {
        let slots = (
            self.tree.owner_of(dockable),
            self.tree.index_of(dockable),
            self.tree.owner_of(target),
            self.tree.index_of(target),
        );
        let (Some(owner_a), Some(index_a), Some(owner_b), Some(index_b)) = slots else {
            return Self::refused("swap_dockable_with", "source or target is not visible");
        };
        self.swap_dockable(owner_a, owner_b, index_a, index_b)
    }

    /// Why `a` (in `owner_a`) and `b` (in `owner_b`) cannot trade places, if they cannot.
    pub(crate) fn swap_refusal(
        &self,
        owner_a: NodeId,
        owner_b: NodeId,
        a: NodeId,
        b: NodeId,
    ) -> Option<&'static str> {
        if a == b {
            return Some("source and target are identical");
        }
        let splitter = |id: NodeId| self.tree.get(id).is_none_or(Dockable::is_splitter);
        if splitter(a) || splitter(b) {
            return Some("splitters cannot be swapped");
        }
        if owner_a == owner_b {
            return None;
        }
        if owner_b == a
            || owner_a == b
            || self.tree.is_descendant(owner_b, a)
            || self.tree.is_descendant(owner_a, b)
        {
            return Some("one side contains the other");
        }
        if !self.accepts_swap_in(owner_a, b) || !self.accepts_swap_in(owner_b, a) {
            return Some("an owner does not accept the other dockable");
        }
        None
    }

    fn accepts_swap_in(&self, owner: NodeId, incoming: NodeId) -> bool {
        let (Some(dock), Some(dockable)) = (self.tree.dock(owner), self.tree.get(incoming)) else {
            return false;
        };
        match (&dock.arrangement, dockable.leaf_kind()) {
            (Arrangement::Pin(_), _) => dockable.can_pin && !dockable.is_dock(),
            (Arrangement::Tool(_) | Arrangement::Document(_), Some(leaf)) => {
                dock.arrangement.accepts(leaf, 0)
            }
            (Arrangement::Tool(_) | Arrangement::Document(_), None) => false,
            _ => true,
        }
    }
}
