use std::collections::BTreeMap;
use std::hash::{Hash as _, Hasher as _};

use super::{Arrangement, DockTree, DockableKind, NodeId};

pub(crate) fn tree_integrity_issues(tree: &DockTree) -> Vec<String> {
    let mut issues: Vec<String> = Vec::new();

    // child -> containers listing it
    let mut listed_in: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

    for (id, dockable) in tree.dockables() {
        if tree.find(&dockable.id) != Some(id) {
            issues.push(format!(
                "integrity: id index for {:?} does not point at {id:?}",
                dockable.id
            ));
        }

        let Some(dock) = dockable.as_dock() else {
            continue;
        };

        if let Some(active) = dock.active {
            if !dock.visible.contains(&active) {
                issues.push(format!(
                    "integrity: dock {id:?} active {active:?} not in visible={:?}",
                    dock.visible
                ));
            }
        }

        let mut local: Vec<NodeId> = Vec::new();
        for &child in &tree.members_of(id) {
            if local.contains(&child) {
                issues.push(format!(
                    "integrity: dock {id:?} lists child {child:?} twice"
                ));
                continue;
            }
            local.push(child);
            if !tree.contains(child) {
                issues.push(format!(
                    "integrity: dock {id:?} references missing child {child:?}"
                ));
                continue;
            }
            listed_in.entry(child).or_default().push(id);
        }

        if let Arrangement::Pin(_) = dock.arrangement {
            for &child in &dock.visible {
                if tree.get(child).is_some_and(|c| !c.can_pin) {
                    issues.push(format!(
                        "integrity: pin dock {id:?} holds unpinnable {child:?}"
                    ));
                }
            }
        }

        if let Some(root) = dock.root() {
            for window_id in &root.windows {
                match tree.window(*window_id) {
                    Some(window) if window.owner_root != id => issues.push(format!(
                        "integrity: root {id:?} lists window {window_id:?} owned by {:?}",
                        window.owner_root
                    )),
                    Some(_) => {}
                    None => issues.push(format!(
                        "integrity: root {id:?} lists missing window {window_id:?}"
                    )),
                }
            }
        }
    }

    for (id, dockable) in tree.dockables() {
        let containers = listed_in.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        if containers.len() > 1 {
            issues.push(format!(
                "integrity: {id:?} listed in multiple containers {containers:?}"
            ));
        }
        match (dockable.owner, containers.first()) {
            (Some(owner), Some(&listed)) if owner != listed => issues.push(format!(
                "integrity: {id:?} owner={owner:?} but listed in {listed:?}"
            )),
            (Some(owner), None) => issues.push(format!(
                "integrity: {id:?} owner={owner:?} but not listed by it"
            )),
            (None, Some(&listed)) => issues.push(format!(
                "integrity: {id:?} has no owner but is listed in {listed:?}"
            )),
            _ => {}
        }
        if matches!(dockable.kind, DockableKind::Dock(_)) && tree.is_descendant(id, id) {
            issues.push(format!("integrity: {id:?} is its own ancestor"));
        }
    }

    for window in tree.windows() {
        let layout_ok = tree
            .dock(window.layout)
            .and_then(|d| d.root())
            .is_some_and(|r| r.window == Some(window.id));
        if !layout_ok {
            issues.push(format!(
                "integrity: window {:?} layout {:?} is not a root bound to it",
                window.id, window.layout
            ));
        }
        let registered = tree
            .dock(window.owner_root)
            .and_then(|d| d.root())
            .is_some_and(|r| r.windows.contains(&window.id));
        if !registered {
            issues.push(format!(
                "integrity: window {:?} not registered with owner root {:?}",
                window.id, window.owner_root
            ));
        }
    }

    issues
}

pub(crate) fn hash_issues(lines: &[String]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for line in lines {
        line.hash(&mut hasher);
    }
    hasher.finish()
}
