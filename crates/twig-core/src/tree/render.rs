use std::collections::HashSet;

use super::MessageTree;
use crate::conversation::Message;

const PREVIEW_CHARS: usize = 60;

/// Render the forest as an indented ASCII tree, one message per line.
///
/// Roots come first in input order. Messages caught in a parent cycle are
/// unreachable from any root; each such group is rendered afterwards starting
/// from its first message in input order.
pub fn render_tree(tree: &MessageTree<'_>) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();

    render_group(tree, tree.roots(), &mut seen, &mut out);
    for &message in tree.messages() {
        if !seen.contains(message.id()) {
            render_group(tree, &[message], &mut seen, &mut out);
        }
    }

    out
}

/// Pre-order walk with an explicit stack of `(message, prefix, is_last)`.
fn render_group<'a>(
    tree: &MessageTree<'a>,
    start: &[&'a Message],
    seen: &mut HashSet<&'a str>,
    out: &mut String,
) {
    let mut stack: Vec<(&'a Message, String, bool)> = Vec::new();
    push_level(&mut stack, start, "", seen);

    while let Some((message, prefix, is_last)) = stack.pop() {
        if !seen.insert(message.id()) {
            continue;
        }
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!("{prefix}{connector}{}\n", label(message)));

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        push_level(&mut stack, tree.children(message.id()), &child_prefix, seen);
    }
}

/// Push one sibling list so the first sibling is popped first.
fn push_level<'a>(
    stack: &mut Vec<(&'a Message, String, bool)>,
    level: &[&'a Message],
    prefix: &str,
    seen: &HashSet<&'a str>,
) {
    let pending: Vec<&'a Message> = level
        .iter()
        .copied()
        .filter(|m| !seen.contains(m.id()))
        .collect();
    let last = pending.len().saturating_sub(1);

    for (index, message) in pending.into_iter().enumerate().rev() {
        stack.push((message, prefix.to_string(), index == last));
    }
}

fn label(message: &Message) -> String {
    let text = message.text().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return format!("[{}]", message.id());
    }

    let first_line = text.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        preview.push('…');
    }
    format!("[{}] {preview}", message.id())
}
