//! Drop legality and execution.
//!
//! [`DockManager::validate`] answers "may `source` be dropped on `target` with this action and
//! operation?" and, when asked to execute, performs the drop through the [`Factory`]. Hover
//! previews and the final drop use the same call, so they cannot disagree.

use egui::{Pos2, Rect, Vec2};

use crate::factory::Factory;
use crate::model::{Arrangement, DockOperation, DockTree, DragAction, LeafKind, NodeId};
use crate::options::DockOptions;

#[cfg(test)]
mod manager_tests;

/// Validates drops and delegates accepted ones to the [`Factory`].
///
/// Set [`Self::position`], [`Self::screen_position`] and [`Self::source_size`] before calling
/// [`Self::validate`]; they only matter for overlay and window drops.
#[derive(Clone, Debug, Default)]
pub struct DockManager {
    /// Pointer position, local to the target surface.
    pub position: Pos2,

    /// Pointer position in screen space. New floating windows open here.
    pub screen_position: Pos2,

    /// Size of the dragged element, if known.
    pub source_size: Option<Vec2>,

    pub options: DockOptions,
}

/// What an accepted drop does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DropPlan {
    /// Leaf onto a tab: sibling move.
    Reorder { source: NodeId, target: NodeId },

    /// Leaf into a container's own collection.
    MoveInto { source: NodeId, dock: NodeId },

    /// Every leaf of a dragged dock into a container.
    Merge { source: NodeId, dock: NodeId },

    IntoOverlay { source: NodeId, overlay: NodeId },

    Split {
        source: NodeId,
        target: NodeId,
        operation: DockOperation,
    },

    Swap { source: NodeId, target: NodeId },

    Float { source: NodeId },
}

impl DockManager {
    pub fn new(options: DockOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Decide whether dropping `source` on `target` is legal, and perform it if `execute`.
    ///
    /// With `execute == false` this never mutates the tree. Returns whether the drop is legal
    /// (and, when executing, whether it was carried out).
    pub fn validate(
        &self,
        factory: &mut Factory,
        source: NodeId,
        target: NodeId,
        action: DragAction,
        operation: DockOperation,
        execute: bool,
    ) -> bool {
        let plan = match plan_drop(factory, source, target, action, operation) {
            Ok(plan) => plan,
            Err(reason) => {
                log::trace!("validate {source:?} -> {target:?} {action:?} {operation:?}: {reason}");
                if execute {
                    factory.debug_log_event(format!(
                        "drop refused: {source:?} -> {target:?} {action:?} {operation:?}: {reason}"
                    ));
                }
                return false;
            }
        };
        if !execute {
            return true;
        }

        let done = self.apply(factory, plan);
        factory.debug_log_event(format!("drop {plan:?}: {}", if done { "ok" } else { "failed" }));
        if !done {
            log::debug!("accepted drop {plan:?} failed to apply");
        }
        done
    }

    fn apply(&self, factory: &mut Factory, plan: DropPlan) -> bool {
        match plan {
            DropPlan::Reorder { source, target } => {
                let done = if factory.tree().owner_of(source).is_some() {
                    factory.move_dockable_onto(source, target)
                } else {
                    let slot = (
                        factory.tree().owner_of(target),
                        factory.tree().index_of(target),
                    );
                    match slot {
                        (Some(owner), Some(index)) => {
                            factory.insert_dockable(owner, index + 1, source)
                        }
                        _ => false,
                    }
                };
                if done {
                    factory.activate(source);
                }
                done
            }
            DropPlan::MoveInto { source, dock } => {
                let done = match factory.tree().owner_of(source) {
                    Some(owner) => factory.move_dockable(owner, dock, source, None),
                    None => factory.add_dockable(dock, source),
                };
                if done {
                    factory.activate(source);
                }
                done
            }
            DropPlan::Merge { source, dock } => {
                let mut moved = false;
                for leaf in factory.tree().visible_leaves(source) {
                    if let Some(owner) = factory.tree().owner_of(leaf) {
                        moved |= factory.move_dockable(owner, dock, leaf, None);
                    }
                }
                moved
            }
            DropPlan::IntoOverlay { source, overlay } => {
                let size = self.source_size.unwrap_or(self.options.default_window_size);
                let rect = Rect::from_min_size(self.position, size);
                factory.move_into_overlay(source, overlay, rect).is_some()
            }
            DropPlan::Split {
                source,
                target,
                operation,
            } => {
                let done = factory.dock_into_split(source, target, operation);
                if done && is_leaf(factory.tree(), source) {
                    factory.activate(source);
                }
                done
            }
            DropPlan::Swap { source, target } => factory.swap_dockable_with(source, target),
            DropPlan::Float { source } => {
                let size = self.options.window_size_for(self.source_size);
                let rect = Rect::from_min_size(self.screen_position, size);
                factory.float_dockable(source, rect).is_some()
            }
        }
    }
}

/// The pure decision tree. Never mutates.
fn plan_drop(
    factory: &Factory,
    source: NodeId,
    target: NodeId,
    action: DragAction,
    operation: DockOperation,
) -> Result<DropPlan, &'static str> {
    let tree = factory.tree();
    let src = tree.get(source).ok_or("unknown source")?;
    let tgt = tree.get(target).ok_or("unknown target")?;
    if !src.can_drag {
        return Err("source cannot be dragged");
    }
    if src.is_root() || src.is_splitter() || factory.is_pin_arrangement(source) {
        return Err("roots, pin strips and splitters never drag");
    }

    match action {
        DragAction::Copy => Err("copy drags are not supported"),
        DragAction::Link => {
            if operation != DockOperation::Fill {
                return Err("swaps only use Fill");
            }
            check_target(tree, source, target, tgt.can_drop)?;
            let slots = (
                tree.owner_of(source),
                tree.index_of(source),
                tree.owner_of(target),
                tree.index_of(target),
            );
            let (Some(owner_a), Some(_), Some(owner_b), Some(_)) = slots else {
                return Err("swap sides must both be visible");
            };
            match factory.swap_refusal(owner_a, owner_b, source, target) {
                Some(reason) => Err(reason),
                None => Ok(DropPlan::Swap { source, target }),
            }
        }
        DragAction::Move => match operation {
            DockOperation::Window => match factory.float_refusal(source) {
                Some(reason) => Err(reason),
                None => Ok(DropPlan::Float { source }),
            },
            DockOperation::Fill => {
                check_target(tree, source, target, tgt.can_drop)?;
                plan_fill(factory, source, target)
            }
            DockOperation::Left
            | DockOperation::Right
            | DockOperation::Top
            | DockOperation::Bottom => {
                check_target(tree, source, target, tgt.can_drop)?;
                match factory.split_refusal(source, target, operation) {
                    Some(reason) => Err(reason),
                    None => Ok(DropPlan::Split {
                        source,
                        target,
                        operation,
                    }),
                }
            }
        },
    }
}

fn check_target(
    tree: &DockTree,
    source: NodeId,
    target: NodeId,
    can_drop: bool,
) -> Result<(), &'static str> {
    if source == target {
        return Err("source and target are identical");
    }
    if tree.is_descendant(target, source) {
        return Err("target lies inside source");
    }
    if !can_drop {
        return Err("target does not accept drops");
    }
    Ok(())
}

fn plan_fill(factory: &Factory, source: NodeId, target: NodeId) -> Result<DropPlan, &'static str> {
    let tree = factory.tree();
    if tree.owner_of(source).is_some() && tree.index_of(source).is_none() {
        return Err("source is pinned or hidden");
    }
    let src_leaf = tree.get(source).and_then(|d| d.leaf_kind());
    let tgt = tree.get(target).ok_or("unknown target")?;

    if tgt.leaf_kind().is_some() {
        let owner = tree.owner_of(target).ok_or("target is not attached")?;
        tree.index_of(target).ok_or("target is pinned or hidden")?;
        if factory.is_pin_arrangement(owner) {
            return Err("pinned tabs are not drop targets");
        }
        return match src_leaf {
            Some(leaf) => {
                accepts(tree, owner, leaf, source, 0)?;
                Ok(DropPlan::Reorder { source, target })
            }
            None => {
                accepts_all(tree, owner, source)?;
                Ok(DropPlan::Merge {
                    source,
                    dock: owner,
                })
            }
        };
    }

    let dock = tgt.as_dock().ok_or("splitters are not drop targets")?;
    if matches!(dock.arrangement, Arrangement::Overlay(_)) {
        return match factory.overlay_refusal(source, target) {
            Some(reason) => Err(reason),
            None => Ok(DropPlan::IntoOverlay {
                source,
                overlay: target,
            }),
        };
    }
    match src_leaf {
        Some(leaf) => {
            accepts(tree, target, leaf, source, 0)?;
            Ok(DropPlan::MoveInto {
                source,
                dock: target,
            })
        }
        None => {
            accepts_all(tree, target, source)?;
            Ok(DropPlan::Merge {
                source,
                dock: target,
            })
        }
    }
}

/// Would `dock` take a leaf of kind `leaf` (`source`) with `incoming` others arriving first?
fn accepts(
    tree: &DockTree,
    dock: NodeId,
    leaf: LeafKind,
    source: NodeId,
    incoming: usize,
) -> Result<(), &'static str> {
    let d = tree.dock(dock).ok_or("target owner is not a dock")?;
    let present = d.visible().iter().filter(|&&c| c != source).count();
    if d.arrangement.accepts(leaf, present + incoming) {
        Ok(())
    } else {
        Err("target does not accept this kind of dockable")
    }
}

fn accepts_all(tree: &DockTree, dock: NodeId, source: NodeId) -> Result<(), &'static str> {
    let leaves = tree.visible_leaves(source);
    if leaves.is_empty() {
        return Err("source has nothing to merge");
    }
    for (i, &leaf) in leaves.iter().enumerate() {
        let kind = tree
            .get(leaf)
            .and_then(|d| d.leaf_kind())
            .ok_or("unknown leaf")?;
        accepts(tree, dock, kind, leaf, i)?;
    }
    Ok(())
}

fn is_leaf(tree: &DockTree, id: NodeId) -> bool {
    tree.get(id).is_some_and(|d| d.leaf_kind().is_some())
}
