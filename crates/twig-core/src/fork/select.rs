//! Subtree selection strategies.
//!
//! Every selector returns messages parents-first: a selected message never
//! precedes its selected parent. `remap` depends on this to rebuild links.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use super::ForkOption;
use crate::conversation::Message;
use crate::tree::MessageTree;

/// Run the selector for `option` against `target_id`.
pub fn select<'a>(tree: &MessageTree<'a>, option: ForkOption, target_id: &str) -> Vec<&'a Message> {
    let selected = match option {
        ForkOption::DirectPath => direct_path(tree, target_id),
        ForkOption::IncludeBranches => include_branches(tree, target_id),
        ForkOption::TargetLevel => target_level(tree, target_id),
    };

    debug!(
        target: "twig::fork::select",
        option = %option,
        target_id,
        selected = selected.len(),
        total = tree.len(),
        "Selected messages for fork"
    );
    selected
}

/// The ancestor chain of `target_id`, root first, target last.
pub fn direct_path<'a>(tree: &MessageTree<'a>, target_id: &str) -> Vec<&'a Message> {
    let mut path = tree.lineage(target_id);
    path.reverse();
    path
}

/// The direct path plus all other children of every ancestor on it.
///
/// Siblings come without their own descendants, and nothing below the target
/// is included. Each path message is followed by all of its children in input
/// order.
pub fn include_branches<'a>(tree: &MessageTree<'a>, target_id: &str) -> Vec<&'a Message> {
    let path = direct_path(tree, target_id);
    let Some(&root) = path.first() else {
        warn!(target: "twig::fork::select", target_id, "Target message not found");
        return Vec::new();
    };

    let mut selected = vec![root];
    let mut seen = HashSet::from([root.id()]);
    for &ancestor in &path[..path.len() - 1] {
        for &child in tree.children(ancestor.id()) {
            if seen.insert(child.id()) {
                selected.push(child);
            }
        }
    }

    selected
}

/// Every message across the whole forest whose level is at most the target's.
///
/// Output is breadth-first from all roots. A target whose ancestry loops has no
/// level; in that case the target and everything reachable below it is
/// selected.
pub fn target_level<'a>(tree: &MessageTree<'a>, target_id: &str) -> Vec<&'a Message> {
    let lineage = tree.lineage(target_id);
    let Some(&top) = lineage.last() else {
        warn!(target: "twig::fork::select", target_id, "Target message not found");
        return Vec::new();
    };

    if !tree.is_root(top) {
        warn!(
            target: "twig::fork::select",
            target_id,
            "Target is not reachable from any root, selecting its subtree"
        );
        return lineage.first().map_or_else(Vec::new, |&target| subtree(tree, target));
    }

    let target_depth = lineage.len() - 1;
    let mut selected = Vec::new();
    let mut seen = HashSet::new();
    let mut level: Vec<&'a Message> = tree.roots().to_vec();

    for depth in 0..=target_depth {
        let mut next = Vec::new();
        for &message in &level {
            if !seen.insert(message.id()) {
                continue;
            }
            selected.push(message);
            if depth < target_depth {
                next.extend_from_slice(tree.children(message.id()));
            }
        }
        level = next;
    }

    selected
}

/// Every message at or below the target's level, across the whole forest.
///
/// Messages on the target's level are re-rooted (their parent is cleared), so
/// the result is a forest whose first generation is the target's generation.
/// Output is ordered by level, input order within a level. Messages with no
/// level (caught in a cycle) are left out.
pub fn split_at_target_level(tree: &MessageTree<'_>, target_id: &str) -> Vec<Message> {
    let levels = tree.levels();
    let Some(&split_level) = levels.get(target_id) else {
        warn!(
            target: "twig::fork::select",
            target_id,
            "Target level not found, nothing to split"
        );
        return Vec::new();
    };

    let mut ordered: Vec<(&Message, usize)> = tree
        .messages()
        .iter()
        .filter_map(|&m| levels.get(m.id()).map(|&level| (m, level)))
        .filter(|&(_, level)| level >= split_level)
        .collect();
    ordered.sort_by_key(|&(_, level)| level);

    ordered
        .into_iter()
        .map(|(message, level)| {
            let mut message = message.clone();
            if level == split_level {
                message.parent_message_id = None;
            }
            message
        })
        .collect()
}

/// `start` and everything reachable below it, breadth-first.
fn subtree<'a>(tree: &MessageTree<'a>, start: &'a Message) -> Vec<&'a Message> {
    let mut selected = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(message) = queue.pop_front() {
        if !seen.insert(message.id()) {
            continue;
        }
        selected.push(message);
        queue.extend(tree.children(message.id()).iter().copied());
    }

    selected
}
