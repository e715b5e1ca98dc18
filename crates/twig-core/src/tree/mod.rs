//! Parent-pointer index over a flat message list.
//!
//! Message sets come straight out of storage and are not validated: a parent id
//! may point nowhere, and parent links may loop. `MessageTree` indexes whatever
//! it is given and every walk it offers is bounded by a visited set.

mod render;

pub use render::render_tree;

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::conversation::Message;

#[derive(Debug, Clone)]
pub struct MessageTree<'a> {
    messages: Vec<&'a Message>,
    by_id: HashMap<&'a str, &'a Message>,
    children: HashMap<&'a str, Vec<&'a Message>>,
    roots: Vec<&'a Message>,
}

impl<'a> MessageTree<'a> {
    /// Index `messages`. When an id occurs more than once the first record wins
    /// and later ones are ignored.
    pub fn new(messages: &'a [Message]) -> Self {
        let mut by_id: HashMap<&'a str, &'a Message> = HashMap::with_capacity(messages.len());
        let mut indexed = Vec::with_capacity(messages.len());

        for message in messages {
            if by_id.contains_key(message.id()) {
                warn!(
                    target: "twig::tree",
                    message_id = message.id(),
                    "Duplicate message id, keeping first occurrence"
                );
                continue;
            }
            by_id.insert(message.id(), message);
            indexed.push(message);
        }

        let mut children: HashMap<&'a str, Vec<&'a Message>> = HashMap::new();
        let mut roots = Vec::new();
        for &message in &indexed {
            match message.parent_message_id() {
                Some(parent_id) if by_id.contains_key(parent_id) => {
                    children.entry(parent_id).or_default().push(message);
                }
                _ => roots.push(message),
            }
        }

        Self {
            messages: indexed,
            by_id,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Indexed messages in input order.
    pub fn messages(&self) -> &[&'a Message] {
        &self.messages
    }

    pub fn get(&self, message_id: &str) -> Option<&'a Message> {
        self.by_id.get(message_id).copied()
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.by_id.contains_key(message_id)
    }

    /// Direct children of `message_id`, in input order.
    pub fn children(&self, message_id: &str) -> &[&'a Message] {
        self.children
            .get(message_id)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Messages with no parent or whose parent is not part of the set.
    pub fn roots(&self) -> &[&'a Message] {
        &self.roots
    }

    pub fn is_root(&self, message: &Message) -> bool {
        message
            .parent_message_id()
            .is_none_or(|parent_id| !self.contains(parent_id))
    }

    /// Walk from `message_id` up through its parents.
    ///
    /// The result starts with the message itself and ends at its root, or at
    /// the last message before the walk would revisit one (a cycle). Empty if
    /// `message_id` is unknown.
    pub fn lineage(&self, message_id: &str) -> Vec<&'a Message> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(message_id);

        while let Some(id) = current {
            if !seen.insert(id) {
                warn!(target: "twig::tree", message_id = id, "Cycle detected in message tree");
                break;
            }
            let Some(message) = self.get(id) else {
                break;
            };
            chain.push(message);
            current = message.parent_message_id();
        }

        chain
    }

    /// Depth of every message reachable from a root (roots are level 0).
    ///
    /// Messages that sit on a parent cycle are unreachable from any root and
    /// have no entry.
    pub fn levels(&self) -> HashMap<&'a str, usize> {
        let mut levels = HashMap::with_capacity(self.len());
        let mut queue: VecDeque<(&'a Message, usize)> =
            self.roots.iter().map(|&root| (root, 0)).collect();

        while let Some((message, level)) = queue.pop_front() {
            if levels.contains_key(message.id()) {
                continue;
            }
            levels.insert(message.id(), level);
            for &child in self.children(message.id()) {
                queue.push_back((child, level + 1));
            }
        }

        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, parent: Option<&str>) -> Message {
        Message::new(id, parent)
    }

    fn ids(messages: &[&Message]) -> Vec<String> {
        messages.iter().map(|m| m.id().to_string()).collect()
    }

    #[test]
    fn test_children_keep_input_order() {
        let messages = vec![
            msg("1", None),
            msg("3", Some("1")),
            msg("2", Some("1")),
            msg("4", Some("2")),
        ];
        let tree = MessageTree::new(&messages);

        assert_eq!(ids(tree.children("1")), vec!["3", "2"]);
        assert_eq!(ids(tree.children("2")), vec!["4"]);
        assert!(tree.children("4").is_empty());
        assert!(tree.children("missing").is_empty());
    }

    #[test]
    fn test_dangling_parent_is_a_root() {
        let messages = vec![msg("0", None), msg("10", Some("3")), msg("11", Some("10"))];
        let tree = MessageTree::new(&messages);

        assert_eq!(ids(tree.roots()), vec!["0", "10"]);
        assert!(tree.is_root(&messages[1]));
        assert!(!tree.is_root(&messages[2]));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let messages = vec![
            msg("a", None).with_text("first"),
            msg("a", None).with_text("second"),
        ];
        let tree = MessageTree::new(&messages);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").and_then(Message::text), Some("first"));
    }

    #[test]
    fn test_lineage_stops_on_cycle() {
        let messages = vec![msg("1", Some("2")), msg("2", Some("3")), msg("3", Some("1"))];
        let tree = MessageTree::new(&messages);

        assert!(tree.roots().is_empty());
        assert_eq!(ids(&tree.lineage("1")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_lineage_of_unknown_id_is_empty() {
        let messages = vec![msg("1", None)];
        let tree = MessageTree::new(&messages);
        assert!(tree.lineage("nope").is_empty());
    }

    #[test]
    fn test_self_parent_is_not_a_root() {
        let messages = vec![msg("loop", Some("loop"))];
        let tree = MessageTree::new(&messages);

        assert!(tree.roots().is_empty());
        assert_eq!(ids(&tree.lineage("loop")), vec!["loop"]);
        assert!(tree.levels().is_empty());
    }

    #[test]
    fn test_levels_cover_forest() {
        let messages = vec![
            msg("7", None),
            msg("8", None),
            msg("5", Some("7")),
            msg("9", Some("8")),
            msg("10", Some("5")),
            msg("40", Some("41")),
            msg("41", Some("40")),
        ];
        let tree = MessageTree::new(&messages);
        let levels = tree.levels();

        assert_eq!(levels.get("7"), Some(&0));
        assert_eq!(levels.get("8"), Some(&0));
        assert_eq!(levels.get("5"), Some(&1));
        assert_eq!(levels.get("9"), Some(&1));
        assert_eq!(levels.get("10"), Some(&2));
        assert!(!levels.contains_key("40"));
        assert!(!levels.contains_key("41"));
    }
}
